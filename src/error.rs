//! Fatal startup error taxonomy.
//!
//! Everything here aborts the daemon before it starts accepting
//! connections. Per-connection failures are never represented as errors at
//! this level; they are logged and contained by the task that hit them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    /// Raw L2CAP sockets can only be bound by root, regardless of whether
    /// the D-Bus registration succeeded.
    #[error("must run as root to bind raw Bluetooth sockets (effective uid {0})")]
    InsufficientPrivilege(u32),

    /// The embedded service record template lost its substitution point.
    #[error("service record template is missing the {0:?} substitution point")]
    MalformedTemplate(&'static str),

    /// An advertisement over zero HID-class functions would be a valid but
    /// empty record that no host can use.
    #[error("no HID-class functions configured; nothing to advertise")]
    NoHidFunctions,

    /// The configured service UUID override did not parse.
    #[error("invalid service UUID {uuid:?}")]
    InvalidServiceUuid {
        uuid: String,
        #[source]
        source: uuid::Error,
    },
}

//! Bluetooth Module
//!
//! Everything that touches the BlueZ stack:
//!
//! - [`advertisement`] - SDP record construction from the function registry
//! - [`registrar`] - D-Bus profile registration and adapter resolution
//! - [`acceptor`] - L2CAP control/interrupt accept loops
//! - [`broadcaster`] - per-client queues and frame fan-out
//!
//! Startup order matters: the registrar must have registered the
//! advertisement before the acceptors start listening, so remote hosts can
//! discover the service the moment the PSMs are bound.

pub mod acceptor;
pub mod advertisement;
pub mod broadcaster;
pub mod registrar;

pub use acceptor::{L2capAcceptor, PSM_HID_CONTROL, PSM_HID_INTERRUPT};
pub use broadcaster::Broadcaster;
pub use registrar::ProfileRegistrar;

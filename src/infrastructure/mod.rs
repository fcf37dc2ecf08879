//! Infrastructure layer: sockets, D-Bus, logging. All the I/O the domain
//! layer stays free of.

pub mod bluetooth;
pub mod ingest;
pub mod logging;

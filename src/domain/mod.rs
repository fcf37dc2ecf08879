//! Domain layer: configured device functions, report-id assignment, and
//! daemon settings. No I/O happens here.

pub mod functions;
pub mod registry;
pub mod settings;

pub use functions::{FunctionConfig, FunctionKind, HidFunction};
pub use registry::FunctionRegistry;
pub use settings::Settings;

pub mod config;
pub mod error;
pub mod registry;

pub use config::RelayConfig;
pub use error::GateError;
pub use registry::TemplateRegistry;

use thiserror::Error;

/// Unified error type for formgate.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Template load error: {0}")]
    TemplateLoad(String),

    #[error("unable to build template: {0}")]
    Render(String),

    #[error("unable to read log file {path}: {reason}")]
    PersistenceRead { path: String, reason: String },

    #[error("unable to write log file {path}: {reason}")]
    PersistenceWrite { path: String, reason: String },

    #[error("unable to send slack message: {0}")]
    Delivery(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("page not found: {0}")]
    RouteNotFound(String),

    #[error("unable to parse form body: {0}")]
    BadForm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl GateError {
    /// Map to HTTP status code.
    ///
    /// Startup-only variants (Config, TemplateLoad) never reach a response
    /// and fall into the 500 bucket.
    pub fn status_code(&self) -> u16 {
        match self {
            GateError::MethodNotAllowed => 405,
            GateError::RouteNotFound(_) => 404,
            _ => 500,
        }
    }
}

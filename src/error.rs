use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WireError>;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("There are more than one {type_name} ({candidates:?}), please name it")]
    AmbiguousBean {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("Factory method {method} returned {count} values, expected exactly one")]
    FactoryArity { method: String, count: usize },

    #[error("Factory method {method} did not produce a {expected}")]
    FactoryOutput { method: String, expected: String },

    #[error("Bean not found: {type_name} named {name:?}")]
    BeanNotFound {
        type_name: String,
        name: Option<String>,
    },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Dependency {type_name} is not wired or its container was dropped")]
    NotWired { type_name: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Collaborator failed: {0}")]
    Collaborator(#[source] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WireError {
    pub(crate) fn downcast<T: ?Sized>() -> Self {
        WireError::DowncastFailed {
            type_name: std::any::type_name::<T>().to_string(),
        }
    }

    /// Structural wiring bugs the top-level entry point treats as fatal.
    pub fn is_wiring_error(&self) -> bool {
        matches!(
            self,
            WireError::AmbiguousBean { .. }
                | WireError::FactoryArity { .. }
                | WireError::FactoryOutput { .. }
        )
    }
}

/// Errors raised while reading or parsing the backing config document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl axum::response::IntoResponse for WireError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            WireError::BeanNotFound { .. } | WireError::NotWired { .. } => {
                axum::http::StatusCode::SERVICE_UNAVAILABLE
            }
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

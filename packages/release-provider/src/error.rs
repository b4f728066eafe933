use serde::Serialize;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// A feed entry or manifest did not have the expected shape. `raw` holds
    /// the offending payload.
    #[error("{message}: {raw}")]
    MalformedInput { message: String, raw: String },

    #[error("{0}")]
    NotFound(String),

    #[error("Missing {0} parameter")]
    MissingParameter(&'static str),

    #[error("{message}")]
    Upstream {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Release feed not exhausted after {pages} pages{}", unresolved(.missing))]
    PageLimitExceeded { pages: usize, missing: Vec<String> },
}

fn unresolved(missing: &[String]) -> String {
    if missing.is_empty() {
        String::new()
    } else {
        format!(" (unresolved channels: {})", missing.join(", "))
    }
}

impl ResolveError {
    pub fn malformed<T: Serialize + std::fmt::Debug>(message: impl Into<String>, raw: &T) -> Self {
        let raw = serde_json::to_string(raw).unwrap_or_else(|_| format!("{:?}", raw));
        ResolveError::MalformedInput {
            message: message.into(),
            raw,
        }
    }

    pub fn upstream(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ResolveError::Upstream {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn upstream_msg(message: impl Into<String>) -> Self {
        ResolveError::Upstream {
            message: message.into(),
            source: None,
        }
    }

    /// HTTP status the error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            ResolveError::MissingParameter(_) => 400,
            ResolveError::NotFound(_) => 404,
            ResolveError::MalformedInput { .. }
            | ResolveError::Upstream { .. }
            | ResolveError::PageLimitExceeded { .. } => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;

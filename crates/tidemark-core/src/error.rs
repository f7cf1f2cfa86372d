//! Error taxonomy shared by the retrieval and shrink engines

/// Failures surfaced to callers of the engine.
///
/// Validation variants are raised before the store is touched. Store access
/// failures are carried through unchanged in `Store`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing required parameter `{0}`")]
    MissingParameter(String),

    #[error("invalid value for `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("no observation ids given")]
    EmptySelection,

    #[error("timeline anchor not found: {0}")]
    AnchorNotFound(String),

    #[error("no results for query \"{0}\"")]
    NoMatches(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl Error {
    pub fn missing(name: &str) -> Self {
        Error::MissingParameter(name.to_string())
    }

    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for failures caused by the caller's input rather than the store
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingParameter(_) | Error::InvalidParameter { .. } | Error::EmptySelection
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

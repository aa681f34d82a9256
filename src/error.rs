//! Error taxonomy for the query/edit facade.

/// Errors surfaced by [`QueryInfo`](crate::query::QueryInfo) and
/// [`EditResources`](crate::edit::EditResources).
#[derive(Debug, thiserror::Error)]
pub enum LabError {
    /// The configured workspace could not be resolved. Fatal at construction.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Anything the session collaborator reported, passed through unchanged.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl LabError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, LabError::Configuration(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, LabError::InvalidArgument(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LabError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, LabError>;

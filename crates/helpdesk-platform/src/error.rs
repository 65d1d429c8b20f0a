use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Platform unavailable: {0}")]
    Unavailable(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlatformError {
    /// Failures worth retrying once connectivity returns
    pub fn is_transient(&self) -> bool {
        matches!(self, PlatformError::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

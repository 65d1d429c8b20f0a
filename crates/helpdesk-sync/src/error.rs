use helpdesk_platform::PlatformError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Conversation is resolved: {0}")]
    ConversationResolved(String),

    #[error("No conversation selected")]
    NoActiveConversation,

    #[error("Missing component: {0}")]
    MissingComponent(String),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

pub mod config;
pub mod conversation;
pub mod message;

pub use config::SyncConfig;
pub use conversation::{Conversation, ConversationRecord, ConversationStatus, UnreadCount};
pub use message::{
    parse_timestamp, Message, MessageRecord, NewConversation, NewMessage, Participant, Sender,
};

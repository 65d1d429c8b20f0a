use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::ConversationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Admin,
}

impl Sender {
    pub fn is_admin(&self) -> bool {
        matches!(self, Sender::Admin)
    }

    /// The other side of the two-party conversation
    pub fn counterpart(&self) -> Sender {
        match self {
            Sender::User => Sender::Admin,
            Sender::Admin => Sender::User,
        }
    }
}

/// Parse an ISO-8601 timestamp as stored on messages
///
/// Values without an offset are taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// The local party the synchronizer acts for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub role: Sender,
}

impl Participant {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Sender::User,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Sender::Admin,
        }
    }
}

/// Message document as delivered by the platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: String,
    pub conversation_id: String,
    pub sender: Sender,
    pub sender_id: String,
    pub message: String,
    pub timestamp: String,
    #[serde(default)]
    pub read: bool,
}

/// Message as displayed, possibly a local placeholder awaiting its server echo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender: Sender,
    pub sender_id: String,
    pub message: String,
    /// ISO-8601; kept as delivered so malformed values survive to display
    pub timestamp: String,
    pub read: bool,
    #[serde(skip)]
    pub is_optimistic: bool,
}

impl Message {
    pub fn optimistic(
        id: impl Into<String>,
        conversation_id: impl Into<String>,
        author: &Participant,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            conversation_id: conversation_id.into(),
            sender: author.role,
            sender_id: author.id.clone(),
            message: text.into(),
            timestamp: timestamp.to_rfc3339(),
            read: false,
            is_optimistic: true,
        }
    }

    /// Whether `other` carries the same content from the same sender
    ///
    /// Timestamps are ignored: the server stamps its copy independently of the
    /// client clock.
    pub fn same_content(&self, other: &Message) -> bool {
        self.message == other.message && self.sender_id == other.sender_id
    }

    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    pub fn is_from(&self, participant: &Participant) -> bool {
        self.sender_id == participant.id
    }
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            conversation_id: record.conversation_id,
            sender: record.sender,
            sender_id: record.sender_id,
            message: record.message,
            timestamp: record.timestamp,
            read: record.read,
            is_optimistic: false,
        }
    }
}

/// Fields submitted to the platform when sending
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub conversation_id: String,
    pub sender: Sender,
    pub sender_id: String,
    pub message: String,
}

impl NewMessage {
    pub fn from_placeholder(placeholder: &Message) -> Self {
        Self {
            conversation_id: placeholder.conversation_id.clone(),
            sender: placeholder.sender,
            sender_id: placeholder.sender_id.clone(),
            message: placeholder.message.clone(),
        }
    }
}

/// Fields submitted to the platform when opening a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewConversation {
    pub user_id: String,
    pub subject: String,
    #[serde(default)]
    pub status: ConversationStatus,
}

impl NewConversation {
    pub fn new(user_id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            subject: subject.into(),
            status: ConversationStatus::Open,
        }
    }
}

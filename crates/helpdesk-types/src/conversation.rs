use serde::{Deserialize, Serialize};

use crate::message::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ConversationStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
}

/// Conversation document as delivered by the platform
///
/// Field names follow the stored documents, including the legacy
/// `unreadCount` counter that older conversations still carry instead of
/// `userUnreadCount`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub status: ConversationStatus,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_unread_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_unread_count: Option<u32>,
}

/// Per-party unread counters after normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnreadCount {
    /// Messages the end user has not viewed
    pub user: u32,
    /// Messages the admin side has not viewed
    pub admin: u32,
}

impl UnreadCount {
    pub fn new(user: u32, admin: u32) -> Self {
        Self { user, admin }
    }

    /// Count as seen by a reader acting in `role`
    pub fn for_reader(&self, role: Sender) -> u32 {
        match role {
            Sender::User => self.user,
            Sender::Admin => self.admin,
        }
    }

    pub fn clear(&mut self, role: Sender) {
        match role {
            Sender::User => self.user = 0,
            Sender::Admin => self.admin = 0,
        }
    }
}

/// Normalized conversation used by the synchronizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub subject: Option<String>,
    pub status: ConversationStatus,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
    pub unread: UnreadCount,
}

impl Conversation {
    pub fn is_resolved(&self) -> bool {
        self.status == ConversationStatus::Resolved
    }
}

impl From<ConversationRecord> for Conversation {
    fn from(record: ConversationRecord) -> Self {
        // `userUnreadCount` wins; `unreadCount` is only read from documents that predate it
        let user = record
            .user_unread_count
            .or(record.unread_count)
            .unwrap_or(0);

        Self {
            id: record.id,
            user_id: record.user_id,
            subject: record.subject,
            status: record.status,
            last_message: record.last_message,
            last_message_at: record.last_message_at,
            unread: UnreadCount::new(user, record.admin_unread_count.unwrap_or(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user: Option<u32>, legacy: Option<u32>) -> ConversationRecord {
        ConversationRecord {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            user_unread_count: user,
            unread_count: legacy,
            ..Default::default()
        }
    }

    #[test]
    fn test_primary_counter_preferred() {
        let conversation: Conversation = record(Some(2), Some(7)).into();
        assert_eq!(conversation.unread.user, 2);
    }

    #[test]
    fn test_legacy_counter_fallback() {
        let conversation: Conversation = record(None, Some(3)).into();
        assert_eq!(conversation.unread.user, 3);
    }

    #[test]
    fn test_missing_counters_are_zero() {
        let conversation: Conversation = record(None, None).into();
        assert_eq!(conversation.unread, UnreadCount::default());
    }

    #[test]
    fn test_status_wire_names() {
        let json = r#"{"id":"c1","userId":"u1","status":"in-progress","unreadCount":4}"#;
        let record: ConversationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, ConversationStatus::InProgress);
        assert_eq!(record.unread_count, Some(4));
        assert_eq!(record.user_unread_count, None);
    }

    #[test]
    fn test_unread_for_reader() {
        let mut unread = UnreadCount::new(2, 5);
        assert_eq!(unread.for_reader(Sender::User), 2);
        assert_eq!(unread.for_reader(Sender::Admin), 5);

        unread.clear(Sender::Admin);
        assert_eq!(unread, UnreadCount::new(2, 0));
    }
}

use helpdesk_types::{Conversation, Sender};

/// Sum of unread counters a reader in `role` would see
pub fn total_unread(conversations: &[Conversation], role: Sender) -> u32 {
    conversations
        .iter()
        .map(|c| c.unread.for_reader(role))
        .sum()
}

/// Conversation list plus the badge number derived from it
///
/// The total is only ever recomputed from the list; the single local
/// mutation is `clear`, applied after the platform confirmed a mark-read.
#[derive(Debug, Clone)]
pub struct UnreadTracker {
    reader: Sender,
    conversations: Vec<Conversation>,
    total: u32,
}

impl UnreadTracker {
    pub fn new(reader: Sender) -> Self {
        Self {
            reader,
            conversations: Vec::new(),
            total: 0,
        }
    }

    /// Replace the list with a fresh server view and return the new total
    pub fn replace(&mut self, conversations: Vec<Conversation>) -> u32 {
        self.conversations = conversations;
        self.recompute()
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, conversation_id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == conversation_id)
    }

    pub fn unread_for(&self, conversation_id: &str) -> u32 {
        self.conversation(conversation_id)
            .map(|c| c.unread.for_reader(self.reader))
            .unwrap_or(0)
    }

    /// Zero the reader's counter for one conversation and return the new total
    pub fn clear(&mut self, conversation_id: &str) -> u32 {
        let reader = self.reader;
        if let Some(conversation) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            conversation.unread.clear(reader);
        }
        self.recompute()
    }

    fn recompute(&mut self) -> u32 {
        self.total = total_unread(&self.conversations, self.reader);
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_types::ConversationRecord;

    fn conversations() -> Vec<Conversation> {
        vec![
            ConversationRecord {
                id: "c1".to_string(),
                user_unread_count: Some(2),
                admin_unread_count: Some(1),
                ..Default::default()
            },
            ConversationRecord {
                id: "c2".to_string(),
                unread_count: Some(3),
                ..Default::default()
            },
            ConversationRecord {
                id: "c3".to_string(),
                ..Default::default()
            },
        ]
        .into_iter()
        .map(Conversation::from)
        .collect()
    }

    #[test]
    fn test_total_with_legacy_fallback() {
        let mut tracker = UnreadTracker::new(Sender::User);
        assert_eq!(tracker.replace(conversations()), 5);
        assert_eq!(tracker.total(), 5);
    }

    #[test]
    fn test_admin_reader_counts_admin_side() {
        let mut tracker = UnreadTracker::new(Sender::Admin);
        assert_eq!(tracker.replace(conversations()), 1);
    }

    #[test]
    fn test_clear_recomputes_total() {
        let mut tracker = UnreadTracker::new(Sender::User);
        tracker.replace(conversations());

        assert_eq!(tracker.clear("c2"), 2);
        assert_eq!(tracker.unread_for("c2"), 0);
        assert_eq!(tracker.unread_for("c1"), 2);
    }

    #[test]
    fn test_clear_unknown_conversation_is_harmless() {
        let mut tracker = UnreadTracker::new(Sender::User);
        tracker.replace(conversations());
        assert_eq!(tracker.clear("missing"), 5);
    }

    #[test]
    fn test_replace_rederives_instead_of_accumulating() {
        let mut tracker = UnreadTracker::new(Sender::User);
        tracker.replace(conversations());
        tracker.replace(conversations());
        assert_eq!(tracker.total(), 5);
    }
}

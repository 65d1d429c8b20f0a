use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use helpdesk_types::{ConversationRecord, MessageRecord};

use crate::memory::MemoryPlatform;

/// Seeds a `MemoryPlatform` with existing documents
pub struct MemoryPlatformBuilder {
    conversations: Vec<ConversationRecord>,
    messages: Vec<MessageRecord>,
    reserved_ids: VecDeque<String>,
    offline: bool,
    ack_delay: Duration,
}

impl MemoryPlatformBuilder {
    pub fn new() -> Self {
        Self {
            conversations: Vec::new(),
            messages: Vec::new(),
            reserved_ids: VecDeque::new(),
            offline: false,
            ack_delay: Duration::ZERO,
        }
    }

    pub fn conversation(mut self, record: ConversationRecord) -> Self {
        self.conversations.push(record);
        self
    }

    pub fn message(mut self, record: MessageRecord) -> Self {
        self.messages.push(record);
        self
    }

    pub fn reserved_message_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// See `MemoryPlatform::set_ack_delay`
    pub fn ack_delay(mut self, delay: Duration) -> Self {
        self.ack_delay = delay;
        self
    }

    pub fn build(self) -> MemoryPlatform {
        let mut messages: HashMap<String, Vec<MessageRecord>> = HashMap::new();
        for record in self.messages {
            messages
                .entry(record.conversation_id.clone())
                .or_default()
                .push(record);
        }
        // Subscribers expect server ordering
        for records in messages.values_mut() {
            records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        }

        MemoryPlatform::from_parts(
            self.conversations,
            messages,
            self.reserved_ids,
            self.offline,
            self.ack_delay,
        )
    }
}

impl Default for MemoryPlatformBuilder {
    fn default() -> Self {
        Self::new()
    }
}

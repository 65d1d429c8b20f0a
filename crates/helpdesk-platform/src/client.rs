use async_trait::async_trait;
use futures::stream::BoxStream;
use helpdesk_types::{ConversationRecord, MessageRecord, NewConversation, NewMessage, Participant};

use crate::error::Result;

/// Stream of full collection snapshots
///
/// Every item is the complete current collection, never a delta. Dropping the
/// stream is the unsubscribe: no further snapshot is produced for it.
pub type SnapshotStream<T> = BoxStream<'static, Vec<T>>;

/// Capability the synchronizer needs from the hosting realtime platform
///
/// Implementations own authentication, storage and push delivery. The
/// synchronizer only ever sees snapshots and the outcome of writes.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Conversations visible to `participant`; users see their own, admins see all
    fn subscribe_conversations(&self, participant: &Participant) -> SnapshotStream<ConversationRecord>;

    /// Messages of one conversation, ordered by timestamp
    fn subscribe_messages(&self, conversation_id: &str) -> SnapshotStream<MessageRecord>;

    /// One-shot fetch of the same list `subscribe_conversations` delivers
    async fn list_conversations(&self, participant: &Participant) -> Result<Vec<ConversationRecord>>;

    /// Persist a message and return its server-assigned id
    async fn send_message(&self, message: NewMessage) -> Result<String>;

    /// Persist a conversation and return its assigned id
    async fn create_conversation(&self, conversation: NewConversation) -> Result<String>;

    /// Zero the reader's unread counter; `is_admin` selects which side is reading
    async fn mark_as_read(&self, conversation_id: &str, user_id: &str, is_admin: bool) -> Result<()>;
}

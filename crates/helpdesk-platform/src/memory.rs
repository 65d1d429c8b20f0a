use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use helpdesk_types::{
    ConversationRecord, ConversationStatus, MessageRecord, NewConversation, NewMessage, Participant,
    Sender,
};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::builder::MemoryPlatformBuilder;
use crate::client::{PlatformClient, SnapshotStream};
use crate::error::{PlatformError, Result};

type MessageChannel = Arc<watch::Sender<Vec<MessageRecord>>>;

/// In-process realtime platform
///
/// Holds every collection in a `watch` channel so subscribers always observe
/// the latest full snapshot, the way a hosted document store pushes them.
/// Cloning is cheap and every clone shares the same data.
#[derive(Clone)]
pub struct MemoryPlatform {
    inner: Arc<Inner>,
}

struct Inner {
    conversations: watch::Sender<Vec<ConversationRecord>>,
    messages: Mutex<HashMap<String, MessageChannel>>,
    reserved_ids: Mutex<VecDeque<String>>,
    offline: AtomicBool,
    ack_delay_ms: AtomicU64,
    send_calls: AtomicUsize,
    mark_read_calls: AtomicUsize,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        MemoryPlatformBuilder::new().build()
    }

    pub fn builder() -> MemoryPlatformBuilder {
        MemoryPlatformBuilder::new()
    }

    pub(crate) fn from_parts(
        conversations: Vec<ConversationRecord>,
        messages: HashMap<String, Vec<MessageRecord>>,
        reserved_ids: VecDeque<String>,
        offline: bool,
        ack_delay: Duration,
    ) -> Self {
        let (conversations, _) = watch::channel(conversations);
        let messages = messages
            .into_iter()
            .map(|(id, records)| (id, Arc::new(watch::channel(records).0)))
            .collect();

        Self {
            inner: Arc::new(Inner {
                conversations,
                messages: Mutex::new(messages),
                reserved_ids: Mutex::new(reserved_ids),
                offline: AtomicBool::new(offline),
                ack_delay_ms: AtomicU64::new(ack_delay.as_millis() as u64),
                send_calls: AtomicUsize::new(0),
                mark_read_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Make every write and fetch fail with `PlatformError::Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.inner.offline.load(Ordering::SeqCst)
    }

    /// Hold back the reply to writes after they have been applied
    ///
    /// Snapshots reflecting the write are pushed immediately, so subscribers
    /// can observe the change before the caller learns it succeeded.
    pub fn set_ack_delay(&self, delay: Duration) {
        self.inner
            .ack_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn acknowledge(&self) {
        let millis = self.inner.ack_delay_ms.load(Ordering::SeqCst);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    /// Ids handed out, in order, to the next sent messages before falling back to UUIDs
    pub fn reserve_message_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner
            .reserved_ids
            .lock()
            .extend(ids.into_iter().map(Into::into));
    }

    pub fn send_calls(&self) -> usize {
        self.inner.send_calls.load(Ordering::SeqCst)
    }

    pub fn mark_read_calls(&self) -> usize {
        self.inner.mark_read_calls.load(Ordering::SeqCst)
    }

    pub fn conversation(&self, conversation_id: &str) -> Option<ConversationRecord> {
        self.inner
            .conversations
            .borrow()
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned()
    }

    pub fn messages(&self, conversation_id: &str) -> Vec<MessageRecord> {
        self.inner.message_channel(conversation_id).borrow().clone()
    }

    /// Admin-side status change (e.g. resolving a ticket)
    pub fn set_status(&self, conversation_id: &str, status: ConversationStatus) -> Result<()> {
        self.update_conversation(conversation_id, |record| record.status = status)
    }

    fn ensure_online(&self, operation: &str) -> Result<()> {
        if self.is_offline() {
            warn!("Rejecting {} while offline", operation);
            return Err(PlatformError::Unavailable(format!(
                "{} failed: platform is offline",
                operation
            )));
        }
        Ok(())
    }

    fn update_conversation<F>(&self, conversation_id: &str, update: F) -> Result<()>
    where
        F: FnOnce(&mut ConversationRecord),
    {
        let found = self.inner.conversations.send_if_modified(|all| {
            match all.iter_mut().find(|c| c.id == conversation_id) {
                Some(record) => {
                    update(record);
                    true
                }
                None => false,
            }
        });

        if found {
            Ok(())
        } else {
            Err(PlatformError::ConversationNotFound(conversation_id.to_string()))
        }
    }
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn message_channel(&self, conversation_id: &str) -> MessageChannel {
        let mut channels = self.messages.lock();
        Arc::clone(
            channels
                .entry(conversation_id.to_string())
                .or_insert_with(|| Arc::new(watch::channel(Vec::new()).0)),
        )
    }

    fn next_message_id(&self) -> String {
        self.reserved_ids
            .lock()
            .pop_front()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }
}

fn visible_to(participant: &Participant, record: &ConversationRecord) -> bool {
    participant.role.is_admin() || record.user_id == participant.id
}

/// Turn a watch receiver into a snapshot stream, current value first
fn snapshot_stream<T, U, F>(mut rx: watch::Receiver<Vec<T>>, project: F) -> SnapshotStream<U>
where
    T: Send + Sync + 'static,
    U: Send + 'static,
    F: Fn(&[T]) -> Vec<U> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        loop {
            let snapshot = project(&rx.borrow_and_update());
            yield snapshot;

            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}

#[async_trait]
impl PlatformClient for MemoryPlatform {
    fn subscribe_conversations(&self, participant: &Participant) -> SnapshotStream<ConversationRecord> {
        let scope = participant.clone();
        snapshot_stream(self.inner.conversations.subscribe(), move |all| {
            all.iter()
                .filter(|record| visible_to(&scope, record))
                .cloned()
                .collect()
        })
    }

    fn subscribe_messages(&self, conversation_id: &str) -> SnapshotStream<MessageRecord> {
        let channel = self.inner.message_channel(conversation_id);
        snapshot_stream(channel.subscribe(), |all| all.to_vec())
    }

    async fn list_conversations(&self, participant: &Participant) -> Result<Vec<ConversationRecord>> {
        self.ensure_online("list_conversations")?;

        Ok(self
            .inner
            .conversations
            .borrow()
            .iter()
            .filter(|record| visible_to(participant, record))
            .cloned()
            .collect())
    }

    async fn send_message(&self, message: NewMessage) -> Result<String> {
        self.inner.send_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online("send_message")?;

        match self.conversation(&message.conversation_id) {
            None => return Err(PlatformError::ConversationNotFound(message.conversation_id)),
            Some(conversation) if conversation.status == ConversationStatus::Resolved => {
                warn!("Refusing message to resolved conversation {}", message.conversation_id);
                return Err(PlatformError::Rejected(format!(
                    "conversation {} is resolved",
                    message.conversation_id
                )));
            }
            Some(_) => {}
        }

        let id = self.inner.next_message_id();
        let timestamp = Utc::now().to_rfc3339();
        let record = MessageRecord {
            id: id.clone(),
            conversation_id: message.conversation_id.clone(),
            sender: message.sender,
            sender_id: message.sender_id,
            message: message.message,
            timestamp: timestamp.clone(),
            read: false,
        };
        let preview = record.message.clone();

        self.inner
            .message_channel(&message.conversation_id)
            .send_modify(|all| all.push(record));

        self.update_conversation(&message.conversation_id, |conversation| {
            conversation.last_message = Some(preview);
            conversation.last_message_at = Some(timestamp);

            match message.sender {
                Sender::User => {
                    conversation.admin_unread_count =
                        Some(conversation.admin_unread_count.unwrap_or(0) + 1);
                }
                Sender::Admin => {
                    let current = conversation
                        .user_unread_count
                        .or(conversation.unread_count)
                        .unwrap_or(0);
                    conversation.user_unread_count = Some(current + 1);
                }
            }
        })?;

        debug!(
            "Stored message {} in conversation {}",
            id, message.conversation_id
        );
        self.acknowledge().await;
        Ok(id)
    }

    async fn create_conversation(&self, conversation: NewConversation) -> Result<String> {
        self.ensure_online("create_conversation")?;

        if conversation.user_id.is_empty() {
            return Err(PlatformError::Rejected(
                "conversation requires a user id".to_string(),
            ));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let record = ConversationRecord {
            id: id.clone(),
            user_id: conversation.user_id,
            subject: Some(conversation.subject),
            status: conversation.status,
            last_message: None,
            last_message_at: None,
            created_at: Some(Utc::now().to_rfc3339()),
            user_unread_count: Some(0),
            unread_count: None,
            admin_unread_count: Some(0),
        };

        self.inner.conversations.send_modify(|all| all.push(record));
        debug!("Created conversation {}", id);
        Ok(id)
    }

    async fn mark_as_read(&self, conversation_id: &str, user_id: &str, is_admin: bool) -> Result<()> {
        self.inner.mark_read_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_online("mark_as_read")?;

        self.update_conversation(conversation_id, |conversation| {
            if is_admin {
                conversation.admin_unread_count = Some(0);
            } else {
                conversation.user_unread_count = Some(0);
                if conversation.unread_count.is_some() {
                    conversation.unread_count = Some(0);
                }
            }
        })?;

        // The reader has now seen everything the other side wrote
        let written_by = if is_admin { Sender::User } else { Sender::Admin };
        self.inner
            .message_channel(conversation_id)
            .send_if_modified(|all| {
                let mut changed = false;
                for record in all.iter_mut().filter(|m| m.sender == written_by && !m.read) {
                    record.read = true;
                    changed = true;
                }
                changed
            });

        debug!("{} marked conversation {} read", user_id, conversation_id);
        self.acknowledge().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn seeded() -> MemoryPlatform {
        MemoryPlatform::builder()
            .conversation(ConversationRecord {
                id: "c1".to_string(),
                user_id: "u1".to_string(),
                unread_count: Some(2),
                ..Default::default()
            })
            .conversation(ConversationRecord {
                id: "c2".to_string(),
                user_id: "u2".to_string(),
                ..Default::default()
            })
            .build()
    }

    #[tokio::test]
    async fn test_user_only_sees_own_conversations() {
        let platform = seeded();
        let mut feed = platform.subscribe_conversations(&Participant::user("u1"));

        let first = feed.next().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "c1");

        let all = platform
            .list_conversations(&Participant::admin("a1"))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_admin_message_bumps_user_counter() {
        let platform = seeded();
        platform.reserve_message_ids(["m1"]);

        let id = platform
            .send_message(NewMessage {
                conversation_id: "c1".to_string(),
                sender: Sender::Admin,
                sender_id: "a1".to_string(),
                message: "Checking now".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(id, "m1");

        let record = platform.conversation("c1").unwrap();
        // legacy counter carried forward into the primary one
        assert_eq!(record.user_unread_count, Some(3));
        assert_eq!(record.last_message.as_deref(), Some("Checking now"));
        assert!(record.last_message_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_read_clears_both_user_counters() {
        let platform = seeded();
        platform.mark_as_read("c1", "u1", false).await.unwrap();

        let record = platform.conversation("c1").unwrap();
        assert_eq!(record.user_unread_count, Some(0));
        assert_eq!(record.unread_count, Some(0));
        assert_eq!(platform.mark_read_calls(), 1);
    }

    #[tokio::test]
    async fn test_offline_rejects_writes() {
        let platform = seeded();
        platform.set_offline(true);

        let err = platform.mark_as_read("c1", "u1", false).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(platform.conversation("c1").unwrap().unread_count, Some(2));
    }

    #[tokio::test]
    async fn test_send_to_unknown_conversation() {
        let platform = seeded();
        let err = platform
            .send_message(NewMessage {
                conversation_id: "missing".to_string(),
                sender: Sender::User,
                sender_id: "u1".to_string(),
                message: "hello?".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, PlatformError::ConversationNotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn test_message_feed_pushes_full_snapshots() {
        let platform = seeded();
        let mut feed = platform.subscribe_messages("c1");
        assert!(feed.next().await.unwrap().is_empty());

        for text in ["one", "two"] {
            platform
                .send_message(NewMessage {
                    conversation_id: "c1".to_string(),
                    sender: Sender::User,
                    sender_id: "u1".to_string(),
                    message: text.to_string(),
                })
                .await
                .unwrap();
        }

        // Intermediate snapshots may coalesce; the latest one is always complete
        let latest = feed.next().await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[1].message, "two");
    }

    #[tokio::test]
    async fn test_send_to_resolved_conversation_is_rejected() {
        let platform = seeded();
        platform.set_status("c1", ConversationStatus::Resolved).unwrap();

        let err = platform
            .send_message(NewMessage {
                conversation_id: "c1".to_string(),
                sender: Sender::User,
                sender_id: "u1".to_string(),
                message: "one more thing".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PlatformError::Rejected(_)));
        assert!(platform.messages("c1").is_empty());
    }

    #[tokio::test]
    async fn test_ack_delay_pushes_snapshot_before_reply() {
        let platform = seeded();
        platform.set_ack_delay(Duration::from_millis(200));
        let mut feed = platform.subscribe_conversations(&Participant::user("u1"));
        assert_eq!(feed.next().await.unwrap()[0].unread_count, Some(2));

        let writer = platform.clone();
        let pending = tokio::spawn(async move { writer.mark_as_read("c1", "u1", false).await });

        let applied = tokio::time::timeout(Duration::from_millis(100), feed.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(applied[0].user_unread_count, Some(0));
        assert!(!pending.is_finished());

        pending.await.unwrap().unwrap();
    }
}

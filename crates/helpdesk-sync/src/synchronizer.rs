use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use helpdesk_platform::{PlatformClient, PlatformError, SnapshotStream};
use helpdesk_types::{
    Conversation, ConversationRecord, Message, MessageRecord, NewConversation, NewMessage,
    Participant, SyncConfig,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SyncError};
use crate::events::SyncUpdate;
use crate::merge::{has_pending_duplicate, merge_snapshot, newest_arrival, sort_by_timestamp};
use crate::scroll::{Arrival, ScrollAction, ScrollPolicy, ScrollState};
use crate::unread::UnreadTracker;
use crate::view::{Pane, WidgetView};

/// Outcome of a network call that ran off the synchronizer's task
enum Completion {
    Sent {
        temp_id: String,
        result: std::result::Result<String, PlatformError>,
    },
    MarkedRead {
        conversation_id: String,
        result: std::result::Result<(), PlatformError>,
    },
}

enum Inbound {
    Conversations(Vec<ConversationRecord>),
    Messages(Vec<MessageRecord>),
    Completed(Completion),
    ConversationFeedEnded,
    MessageFeedEnded,
}

struct MessageFeed {
    conversation_id: String,
    stream: SnapshotStream<MessageRecord>,
}

/// Help-chat state kept consistent with the platform's realtime snapshots
///
/// The synchronizer is the only writer of the message list and the
/// conversation list. Snapshots are consumed through `next_update`; network
/// writes run as spawned tasks whose results come back through the same
/// loop, so snapshots keep flowing while a send is pending.
///
/// Subscriptions live in fields only this type polls. Replacing or clearing a
/// feed drops it, which is the unsubscribe, so a snapshot for a conversation
/// that is no longer selected can never be applied.
///
/// Methods that start network work spawn onto the current Tokio runtime.
pub struct ChatSynchronizer {
    client: Arc<dyn PlatformClient>,
    participant: Participant,
    config: SyncConfig,
    view: WidgetView,
    conversation_feed: Option<SnapshotStream<ConversationRecord>>,
    message_feed: Option<MessageFeed>,
    active_conversation: Option<String>,
    messages: Vec<Message>,
    unread: UnreadTracker,
    scroll: ScrollPolicy,
    completions_tx: mpsc::Sender<Completion>,
    completions_rx: mpsc::Receiver<Completion>,
    in_flight: usize,
    marking_read: HashSet<String>,
    /// In-flight mark-reads overtaken by a snapshot that still shows unread messages
    mark_read_owed: HashSet<String>,
    last_temp_millis: i64,
}

impl ChatSynchronizer {
    pub fn new(client: Arc<dyn PlatformClient>, participant: Participant, config: SyncConfig) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel(config.completion_buffer.max(1));

        Self {
            client,
            unread: UnreadTracker::new(participant.role),
            scroll: ScrollPolicy::new(config.near_bottom_threshold_px),
            participant,
            config,
            view: WidgetView::default(),
            conversation_feed: None,
            message_feed: None,
            active_conversation: None,
            messages: Vec::new(),
            completions_tx,
            completions_rx,
            in_flight: 0,
            marking_read: HashSet::new(),
            mark_read_owed: HashSet::new(),
            last_temp_millis: 0,
        }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> crate::builder::ChatSynchronizerBuilder {
        crate::builder::ChatSynchronizerBuilder::new()
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub fn view(&self) -> WidgetView {
        self.view
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn conversations(&self) -> &[Conversation] {
        self.unread.conversations()
    }

    pub fn total_unread(&self) -> u32 {
        self.unread.total()
    }

    pub fn unread_for(&self, conversation_id: &str) -> u32 {
        self.unread.unread_for(conversation_id)
    }

    pub fn active_conversation_id(&self) -> Option<&str> {
        self.active_conversation.as_deref()
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active_conversation_id()
            .and_then(|id| self.unread.conversation(id))
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll.state()
    }

    pub fn new_messages_visible(&self) -> bool {
        self.scroll.new_messages_visible()
    }

    /// Whether the message input should be offered for the active conversation
    pub fn can_send(&self) -> bool {
        self.view.can_see_chat()
            && self.active_conversation_id().is_some()
            && !self.active_conversation().is_some_and(|c| c.is_resolved())
    }

    /// Open the widget and start listening to the conversation list
    pub fn open(&mut self) {
        self.view.open();
        if self.conversation_feed.is_none() {
            info!("Subscribing to conversations for {}", self.participant.id);
            self.conversation_feed = Some(self.client.subscribe_conversations(&self.participant));
        }
        self.mark_visible_read();
    }

    /// Close the widget and drop every subscription
    pub fn close(&mut self) {
        self.leave_conversation();
        if self.conversation_feed.take().is_some() {
            info!("Unsubscribed from conversations for {}", self.participant.id);
        }
        self.view.close();
    }

    pub fn minimize(&mut self) {
        self.view.minimize();
    }

    pub fn restore(&mut self) {
        self.view.restore();
        self.mark_visible_read();
    }

    /// Back to the conversation list; the message feed is dropped
    pub fn show_list(&mut self) {
        self.leave_conversation();
        self.view.show(Pane::List);
    }

    pub fn show_new_conversation(&mut self) {
        self.leave_conversation();
        self.view.show(Pane::NewConversation);
    }

    /// Switch the chat pane to `conversation_id`
    ///
    /// The previous message feed is torn down before the new one is created.
    pub fn select_conversation(&mut self, conversation_id: impl Into<String>) {
        let conversation_id = conversation_id.into();
        if !self.view.open {
            self.open();
        }

        self.leave_conversation();

        debug!("Subscribing to messages of {}", conversation_id);
        let stream = self.client.subscribe_messages(&conversation_id);
        self.message_feed = Some(MessageFeed {
            conversation_id: conversation_id.clone(),
            stream,
        });
        self.active_conversation = Some(conversation_id);
        self.view.show(Pane::Chat);
        self.mark_visible_read();
    }

    fn leave_conversation(&mut self) {
        if let Some(feed) = self.message_feed.take() {
            debug!("Unsubscribed from messages of {}", feed.conversation_id);
        }
        self.active_conversation = None;
        self.messages.clear();
        self.scroll.reset();
    }

    /// Report the message pane's distance from its bottom edge
    pub fn on_scroll(&mut self, distance_from_bottom: f64) -> ScrollState {
        self.scroll.on_scroll(distance_from_bottom)
    }

    /// The user followed the "new messages" affordance
    pub fn jump_to_bottom(&mut self) {
        self.scroll.jump_to_bottom();
    }

    /// Fetch the conversation list once and re-derive the unread total
    pub async fn reload_conversations(&mut self) -> Result<u32> {
        let records = self
            .client
            .list_conversations(&self.participant)
            .await
            .map_err(|e| {
                error!("Failed to reload conversations: {}", e);
                SyncError::from(e)
            })?;
        Ok(self.apply_conversations(records))
    }

    /// Show `text` immediately as a placeholder and send it in the background
    ///
    /// Returns the placeholder's temporary id. The placeholder is dropped once
    /// a snapshot carries the same text from the same sender. A failed send is
    /// reported as `SyncUpdate::SendFailed` and the placeholder is left in place.
    ///
    /// The resolved check uses the last conversation snapshot. Before the first
    /// one arrives the send goes out unchecked and the platform refuses it with
    /// `PlatformError::Rejected`.
    pub fn send_message(&mut self, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SyncError::EmptyMessage);
        }

        let conversation_id = self
            .active_conversation_id()
            .ok_or(SyncError::NoActiveConversation)?
            .to_string();
        if self.active_conversation().is_some_and(|c| c.is_resolved()) {
            return Err(SyncError::ConversationResolved(conversation_id));
        }

        let temp_id = self.next_temp_id();
        let placeholder = Message::optimistic(
            temp_id.clone(),
            conversation_id,
            &self.participant,
            text,
            Utc::now(),
        );
        let request = NewMessage::from_placeholder(&placeholder);

        if has_pending_duplicate(&self.messages, &placeholder) {
            // An identical placeholder would be confirmed by the same echo
            debug!("Identical message already pending; sending without a second placeholder");
        } else {
            self.messages.push(placeholder);
            sort_by_timestamp(&mut self.messages);
            self.scroll.on_arrival(Arrival::Own);
        }

        let client = Arc::clone(&self.client);
        let tx = self.completions_tx.clone();
        let id = temp_id.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = client.send_message(request).await;
            let _ = tx.send(Completion::Sent { temp_id: id, result }).await;
        });

        Ok(temp_id)
    }

    /// Create a conversation from the new-conversation form and send its first message
    ///
    /// Returns the new conversation's id.
    pub async fn start_conversation(&mut self, subject: &str, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(SyncError::EmptyMessage);
        }

        let conversation_id = self
            .client
            .create_conversation(NewConversation::new(self.participant.id.clone(), subject))
            .await
            .map_err(|e| {
                error!("Failed to create conversation: {}", e);
                SyncError::from(e)
            })?;
        info!("Created conversation {}", conversation_id);

        self.select_conversation(conversation_id.clone());
        self.send_message(text)?;
        Ok(conversation_id)
    }

    /// Mark the active conversation read for the local participant
    ///
    /// Returns whether a request was issued; see `mark_read`.
    pub fn mark_active_read(&mut self) -> bool {
        match self.active_conversation_id() {
            Some(id) => {
                let id = id.to_string();
                self.mark_read(&id)
            }
            None => false,
        }
    }

    /// Ask the platform to zero the local participant's unread counter
    ///
    /// Nothing is sent when the counter is already zero or a request for the
    /// same conversation is still in flight. The local count is only zeroed
    /// once the platform confirms.
    pub fn mark_read(&mut self, conversation_id: &str) -> bool {
        if self.unread.unread_for(conversation_id) == 0 {
            return false;
        }
        if !self.marking_read.insert(conversation_id.to_string()) {
            debug!("Mark-read already in flight for {}", conversation_id);
            return false;
        }

        let client = Arc::clone(&self.client);
        let tx = self.completions_tx.clone();
        let conversation_id = conversation_id.to_string();
        let user_id = self.participant.id.clone();
        let is_admin = self.participant.role.is_admin();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = client
                .mark_as_read(&conversation_id, &user_id, is_admin)
                .await;
            let _ = tx
                .send(Completion::MarkedRead {
                    conversation_id,
                    result,
                })
                .await;
        });

        true
    }

    fn mark_visible_read(&mut self) {
        if self.view.can_see_chat() {
            self.mark_active_read();
        }
    }

    /// Wait for the next snapshot or completed request and apply it
    ///
    /// Returns `None` once nothing is subscribed and nothing is in flight.
    pub async fn next_update(&mut self) -> Option<SyncUpdate> {
        loop {
            if self.conversation_feed.is_none() && self.message_feed.is_none() && self.in_flight == 0 {
                return None;
            }

            let inbound = tokio::select! {
                Some(done) = self.completions_rx.recv(), if self.in_flight > 0 => {
                    Inbound::Completed(done)
                }
                snapshot = next_conversations(&mut self.conversation_feed), if self.conversation_feed.is_some() => {
                    match snapshot {
                        Some(records) => Inbound::Conversations(records),
                        None => Inbound::ConversationFeedEnded,
                    }
                }
                snapshot = next_messages(&mut self.message_feed), if self.message_feed.is_some() => {
                    match snapshot {
                        Some(records) => Inbound::Messages(records),
                        None => Inbound::MessageFeedEnded,
                    }
                }
                else => return None,
            };

            match inbound {
                Inbound::Conversations(records) => {
                    let total_unread = self.apply_conversations(records);
                    self.mark_visible_read();
                    return Some(SyncUpdate::Conversations { total_unread });
                }
                Inbound::Messages(records) => {
                    let update = self.apply_messages(records);
                    self.mark_visible_read();
                    return Some(update);
                }
                Inbound::Completed(done) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    return Some(self.apply_completion(done));
                }
                Inbound::ConversationFeedEnded => {
                    warn!("Conversation feed ended");
                    self.conversation_feed = None;
                }
                Inbound::MessageFeedEnded => {
                    warn!("Message feed ended");
                    self.message_feed = None;
                }
            }
        }
    }

    fn apply_conversations(&mut self, records: Vec<ConversationRecord>) -> u32 {
        let conversations = records.into_iter().map(Conversation::from).collect();
        let total = self.unread.replace(conversations);

        // The pending request may have been applied before these messages arrived
        for id in &self.marking_read {
            if self.unread.unread_for(id) > 0 {
                self.mark_read_owed.insert(id.clone());
            }
        }
        debug!("Conversation snapshot applied, {} unread", total);
        total
    }

    fn apply_messages(&mut self, records: Vec<MessageRecord>) -> SyncUpdate {
        let conversation_id = self
            .active_conversation_id()
            .map(str::to_string)
            .unwrap_or_default();

        let authoritative = records.into_iter().map(Message::from).collect();
        let merged = merge_snapshot(&self.messages, authoritative);
        if merged == self.messages {
            return SyncUpdate::MessagesUnchanged { conversation_id };
        }

        // Decided against the scroll state from before this content is shown
        let scroll = if self.messages.is_empty() {
            self.scroll.on_arrival(Arrival::FirstLoad)
        } else {
            match newest_arrival(&self.messages, &merged) {
                Some(message) if message.is_from(&self.participant) => {
                    self.scroll.on_arrival(Arrival::Own)
                }
                Some(_) => self.scroll.on_arrival(Arrival::Remote),
                None => ScrollAction::Stay,
            }
        };

        self.messages = merged;
        debug!(
            "Message snapshot applied to {}, {} displayed",
            conversation_id,
            self.messages.len()
        );

        SyncUpdate::Messages {
            conversation_id,
            count: self.messages.len(),
            scroll,
        }
    }

    fn apply_completion(&mut self, done: Completion) -> SyncUpdate {
        match done {
            Completion::Sent { temp_id, result } => match result {
                Ok(message_id) => {
                    debug!("Message {} stored as {}", temp_id, message_id);
                    SyncUpdate::SendConfirmed {
                        temp_id,
                        message_id,
                    }
                }
                Err(error) => {
                    error!("Failed to send message {}: {}", temp_id, error);
                    SyncUpdate::SendFailed { temp_id, error }
                }
            },
            Completion::MarkedRead {
                conversation_id,
                result,
            } => {
                self.marking_read.remove(&conversation_id);
                let owed = self.mark_read_owed.remove(&conversation_id);
                match result {
                    Ok(()) if owed => {
                        // Keep the snapshot's count and ask again for what arrived meanwhile
                        debug!("Messages arrived in {} while marking read", conversation_id);
                        if self.active_conversation_id() == Some(conversation_id.as_str()) {
                            self.mark_visible_read();
                        }
                        SyncUpdate::MarkedRead {
                            total_unread: self.unread.total(),
                            conversation_id,
                        }
                    }
                    Ok(()) => {
                        let total_unread = self.unread.clear(&conversation_id);
                        debug!("Marked {} read, {} unread remain", conversation_id, total_unread);
                        SyncUpdate::MarkedRead {
                            conversation_id,
                            total_unread,
                        }
                    }
                    Err(error) => {
                        error!("Failed to mark {} read: {}", conversation_id, error);
                        SyncUpdate::MarkReadFailed {
                            conversation_id,
                            error,
                        }
                    }
                }
            }
        }
    }

    fn next_temp_id(&mut self) -> String {
        // Two sends within the same millisecond still get distinct ids
        let millis = Utc::now().timestamp_millis().max(self.last_temp_millis + 1);
        self.last_temp_millis = millis;
        format!("{}{}", self.config.temp_id_prefix, millis)
    }
}

async fn next_conversations(
    feed: &mut Option<SnapshotStream<ConversationRecord>>,
) -> Option<Vec<ConversationRecord>> {
    match feed {
        Some(stream) => stream.next().await,
        None => None,
    }
}

async fn next_messages(feed: &mut Option<MessageFeed>) -> Option<Vec<MessageRecord>> {
    match feed {
        Some(feed) => feed.stream.next().await,
        None => None,
    }
}

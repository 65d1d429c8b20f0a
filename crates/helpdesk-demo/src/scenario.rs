use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use helpdesk_platform::{MemoryPlatform, PlatformClient};
use helpdesk_sync::{format_timestamp, ChatSynchronizer, SyncUpdate};
use helpdesk_types::{Conversation, ConversationRecord, MessageRecord, NewMessage, Participant, Sender};

use crate::config::Config;

const CONVERSATION_ID: &str = "conv-1";
const CONFIRMED_ID: &str = "m42";

/// One rendered row of the chat pane
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptLine {
    pub sender: Sender,
    pub text: String,
    pub label: String,
    pub pending: bool,
}

#[derive(Debug, Clone)]
pub struct Transcript {
    pub conversation_id: String,
    pub lines: Vec<TranscriptLine>,
    pub total_unread: u32,
}

/// Drive a synchronizer through a full exchange against the in-memory platform
///
/// The configured participant opens the widget, reads the seeded greeting,
/// sends `demo.message`, and receives `demo.reply` from the other side.
pub async fn run(config: &Config) -> anyhow::Result<Transcript> {
    let local = config.participant.clone();
    let remote = counterpart(&local);
    let step = Duration::from_millis(config.demo.step_timeout_ms);

    let platform = seed_platform(config, &local, &remote);

    let mut sync = ChatSynchronizer::builder()
        .client(Arc::new(platform.clone()))
        .participant(local.clone())
        .config(config.sync.clone())
        .build()
        .context("Failed to build synchronizer")?;

    sync.open();
    pump_until(&mut sync, step, |s| !s.conversations().is_empty()).await?;
    info!("Widget open, {} unread", sync.total_unread());

    sync.select_conversation(CONVERSATION_ID);
    pump_until(&mut sync, step, |s| {
        !s.messages().is_empty() && s.unread_for(CONVERSATION_ID) == 0
    })
    .await?;
    info!("Greeting read, {} unread", sync.total_unread());

    let temp_id = sync.send_message(&config.demo.message)?;
    info!("Placeholder {} shown", temp_id);
    pump_until(&mut sync, step, |s| {
        s.messages()
            .iter()
            .any(|m| m.id == CONFIRMED_ID && !m.is_optimistic)
    })
    .await?;
    info!("Placeholder {} replaced by {}", temp_id, CONFIRMED_ID);

    platform
        .send_message(NewMessage {
            conversation_id: CONVERSATION_ID.to_string(),
            sender: remote.role,
            sender_id: remote.id.clone(),
            message: config.demo.reply.clone(),
        })
        .await
        .context("Counterpart reply was rejected")?;
    pump_until(&mut sync, step, |s| {
        s.messages().iter().any(|m| m.message == config.demo.reply)
            && s.unread_for(CONVERSATION_ID) == 0
            && stored_unread(&platform, local.role) == 0
    })
    .await?;

    let now = Utc::now();
    let transcript = Transcript {
        conversation_id: CONVERSATION_ID.to_string(),
        lines: sync
            .messages()
            .iter()
            .map(|m| TranscriptLine {
                sender: m.sender,
                text: m.message.clone(),
                label: format_timestamp(&m.timestamp, now),
                pending: m.is_optimistic,
            })
            .collect(),
        total_unread: sync.total_unread(),
    };

    sync.close();
    Ok(transcript)
}

/// Reader's counter as the platform holds it, which lags the reply until marked read
fn stored_unread(platform: &MemoryPlatform, reader: Sender) -> u32 {
    platform
        .conversation(CONVERSATION_ID)
        .map(|record| Conversation::from(record).unread.for_reader(reader))
        .unwrap_or(0)
}

fn counterpart(local: &Participant) -> Participant {
    let role = local.role.counterpart();
    let id = match role {
        Sender::Admin => "support-1",
        Sender::User => "dispatcher-7",
    };
    Participant {
        id: id.to_string(),
        role,
    }
}

fn seed_platform(config: &Config, local: &Participant, remote: &Participant) -> MemoryPlatform {
    let user_id = match local.role {
        Sender::User => local.id.clone(),
        Sender::Admin => remote.id.clone(),
    };
    let greeted_at = (Utc::now() - ChronoDuration::minutes(5))
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    // The greeting is unread by whoever the local participant is
    let (user_unread, admin_unread) = match local.role {
        Sender::User => (1, 0),
        Sender::Admin => (0, 1),
    };

    MemoryPlatform::builder()
        .conversation(ConversationRecord {
            id: CONVERSATION_ID.to_string(),
            user_id,
            subject: Some(config.demo.subject.clone()),
            last_message: Some("How can we help?".to_string()),
            last_message_at: Some(greeted_at.clone()),
            created_at: Some(greeted_at.clone()),
            user_unread_count: Some(user_unread),
            admin_unread_count: Some(admin_unread),
            ..Default::default()
        })
        .message(MessageRecord {
            id: "m1".to_string(),
            conversation_id: CONVERSATION_ID.to_string(),
            sender: remote.role,
            sender_id: remote.id.clone(),
            message: "How can we help?".to_string(),
            timestamp: greeted_at,
            read: false,
        })
        .reserved_message_ids([CONFIRMED_ID])
        .build()
}

async fn pump_until<F>(sync: &mut ChatSynchronizer, step: Duration, ready: F) -> anyhow::Result<()>
where
    F: Fn(&ChatSynchronizer) -> bool,
{
    while !ready(sync) {
        let update = tokio::time::timeout(step, sync.next_update())
            .await
            .map_err(|_| anyhow!("Timed out after {:?} waiting for the platform", step))?
            .ok_or_else(|| anyhow!("Synchronizer has nothing left to wait for"))?;
        log_update(&update);
    }
    Ok(())
}

fn log_update(update: &SyncUpdate) {
    match update {
        SyncUpdate::Conversations { total_unread } => {
            debug!("Conversations refreshed, {} unread", total_unread)
        }
        SyncUpdate::Messages {
            conversation_id,
            count,
            scroll,
        } => debug!("{}: {} messages, {:?}", conversation_id, count, scroll),
        SyncUpdate::MessagesUnchanged { conversation_id } => {
            debug!("{}: snapshot unchanged", conversation_id)
        }
        SyncUpdate::SendConfirmed {
            temp_id,
            message_id,
        } => debug!("Send {} acknowledged as {}", temp_id, message_id),
        SyncUpdate::SendFailed { temp_id, error } => {
            warn!("Send {} failed: {}", temp_id, error)
        }
        SyncUpdate::MarkedRead {
            conversation_id,
            total_unread,
        } => debug!("{} marked read, {} unread", conversation_id, total_unread),
        SyncUpdate::MarkReadFailed {
            conversation_id,
            error,
        } => warn!("Mark read on {} failed: {}", conversation_id, error),
    }
}

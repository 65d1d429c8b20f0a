use helpdesk_platform::PlatformError;

use crate::scroll::ScrollAction;

/// What changed after the synchronizer applied one inbound event
#[derive(Debug, Clone, PartialEq)]
pub enum SyncUpdate {
    /// Conversation list replaced by a snapshot or an explicit reload
    Conversations {
        total_unread: u32,
    },

    /// Displayed messages replaced by a merged snapshot
    Messages {
        conversation_id: String,
        count: usize,
        scroll: ScrollAction,
    },

    /// Snapshot matched what is already displayed; nothing re-rendered
    MessagesUnchanged {
        conversation_id: String,
    },

    SendConfirmed {
        temp_id: String,
        message_id: String,
    },

    /// The placeholder stays on screen; see `ChatSynchronizer::send_message`
    SendFailed {
        temp_id: String,
        error: PlatformError,
    },

    MarkedRead {
        conversation_id: String,
        total_unread: u32,
    },

    MarkReadFailed {
        conversation_id: String,
        error: PlatformError,
    },
}

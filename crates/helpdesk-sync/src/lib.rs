pub mod builder;
pub mod error;
pub mod events;
pub mod format;
pub mod merge;
pub mod scroll;
pub mod synchronizer;
pub mod unread;
pub mod view;

pub use builder::ChatSynchronizerBuilder;
pub use error::{Result, SyncError};
pub use events::SyncUpdate;
pub use format::format_timestamp;
pub use merge::{merge_snapshot, newest_arrival};
pub use scroll::{Arrival, ScrollAction, ScrollPolicy, ScrollState};
pub use synchronizer::ChatSynchronizer;
pub use unread::{total_unread, UnreadTracker};
pub use view::{Pane, WidgetView};

// Re-export the model and platform seams so callers need a single dependency
pub use helpdesk_platform::{MemoryPlatform, PlatformClient, PlatformError};
pub use helpdesk_types::{Conversation, Message, Participant, Sender, SyncConfig};

use std::sync::Arc;

use helpdesk_platform::PlatformClient;
use helpdesk_types::{Participant, SyncConfig};

use crate::error::{Result, SyncError};
use crate::synchronizer::ChatSynchronizer;

/// Builder for constructing a ChatSynchronizer
pub struct ChatSynchronizerBuilder {
    client: Option<Arc<dyn PlatformClient>>,
    participant: Option<Participant>,
    config: SyncConfig,
}

impl ChatSynchronizerBuilder {
    pub fn new() -> Self {
        Self {
            client: None,
            participant: None,
            config: SyncConfig::default(),
        }
    }

    /// Set the platform client
    pub fn client(mut self, client: Arc<dyn PlatformClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the local participant the widget acts for
    pub fn participant(mut self, participant: Participant) -> Self {
        self.participant = Some(participant);
        self
    }

    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<ChatSynchronizer> {
        let client = self
            .client
            .ok_or_else(|| SyncError::MissingComponent("platform client is required".to_string()))?;
        let participant = self
            .participant
            .ok_or_else(|| SyncError::MissingComponent("participant is required".to_string()))?;

        if participant.id.is_empty() {
            return Err(SyncError::MissingComponent("participant id is empty".to_string()));
        }

        Ok(ChatSynchronizer::new(client, participant, self.config))
    }
}

impl Default for ChatSynchronizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

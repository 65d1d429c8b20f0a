use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Distance from the bottom of the message pane, in pixels, still treated as "at bottom"
    pub near_bottom_threshold_px: f64,
    /// Capacity of the channel carrying finished network operations back to the synchronizer
    pub completion_buffer: usize,
    pub temp_id_prefix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            near_bottom_threshold_px: 100.0,
            completion_buffer: 64,
            temp_id_prefix: "temp-".to_string(),
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_near_bottom_threshold(mut self, px: f64) -> Self {
        self.near_bottom_threshold_px = px;
        self
    }

    pub fn with_completion_buffer(mut self, capacity: usize) -> Self {
        self.completion_buffer = capacity.max(1);
        self
    }

    pub fn with_temp_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_id_prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.near_bottom_threshold_px, 100.0);
        assert_eq!(config.completion_buffer, 64);
        assert_eq!(config.temp_id_prefix, "temp-");
    }

    #[test]
    fn test_completion_buffer_never_zero() {
        let config = SyncConfig::new().with_completion_buffer(0);
        assert_eq!(config.completion_buffer, 1);
    }
}

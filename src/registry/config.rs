//! Registry configuration

use std::time::Duration;

/// Default settings group the camera list is stored under
pub const DEFAULT_SETTINGS_GROUP: &str = "CameraManager";

/// Default key holding the serialized camera list
pub const DEFAULT_STREAMS_KEY: &str = "streams";

/// Default key holding the primary index
pub const DEFAULT_PRIMARY_KEY: &str = "primaryIndex";

/// Receiver start timeout used when the video settings report none
pub const DEFAULT_START_TIMEOUT_SECS: u32 = 3;

/// Registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Settings group (namespace) for the persisted record
    pub settings_group: String,

    /// Key of the serialized camera list within the group
    pub streams_key: String,

    /// Key of the primary index within the group
    pub primary_key: String,

    /// Start timeout in seconds when the video settings report 0
    pub default_start_timeout: u32,

    /// Delay before a stopped secondary stream is restarted
    pub restart_delay: Duration,

    /// Capacity of the change notification channel
    pub change_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            settings_group: DEFAULT_SETTINGS_GROUP.to_string(),
            streams_key: DEFAULT_STREAMS_KEY.to_string(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            default_start_timeout: DEFAULT_START_TIMEOUT_SECS,
            restart_delay: Duration::from_secs(1),
            change_capacity: 64,
        }
    }
}

impl RegistryConfig {
    /// Set the settings group
    pub fn settings_group(mut self, group: impl Into<String>) -> Self {
        self.settings_group = group.into();
        self
    }

    /// Set the fallback start timeout (0 is replaced by the built-in default)
    pub fn default_start_timeout(mut self, secs: u32) -> Self {
        self.default_start_timeout = if secs == 0 {
            DEFAULT_START_TIMEOUT_SECS
        } else {
            secs
        };
        self
    }

    /// Set the restart delay after a secondary stream stops
    pub fn restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// Set the change notification capacity
    pub fn change_capacity(mut self, capacity: usize) -> Self {
        self.change_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.settings_group, "CameraManager");
        assert_eq!(config.streams_key, "streams");
        assert_eq!(config.primary_key, "primaryIndex");
        assert_eq!(config.default_start_timeout, 3);
        assert_eq!(config.restart_delay, Duration::from_secs(1));
        assert_eq!(config.change_capacity, 64);
    }

    #[test]
    fn test_builder_zero_timeout_falls_back() {
        let config = RegistryConfig::default().default_start_timeout(0);

        assert_eq!(config.default_start_timeout, DEFAULT_START_TIMEOUT_SECS);
    }

    #[test]
    fn test_builder_change_capacity_minimum() {
        // broadcast channels panic on zero capacity
        let config = RegistryConfig::default().change_capacity(0);

        assert_eq!(config.change_capacity, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .settings_group("Console")
            .default_start_timeout(10)
            .restart_delay(Duration::from_millis(250))
            .change_capacity(8);

        assert_eq!(config.settings_group, "Console");
        assert_eq!(config.default_start_timeout, 10);
        assert_eq!(config.restart_delay, Duration::from_millis(250));
        assert_eq!(config.change_capacity, 8);
    }
}

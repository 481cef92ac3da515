//! Cache tier configuration.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_OP_TIMEOUT_MS: u64 = 250;
const DEFAULT_TOTAL_COUNT_TTL_SECS: u64 = 60;

/// Knobs for the catalog cache tier.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Upper bound for a single index-store round-trip, in milliseconds.
    /// A timed-out read counts as a miss; a timed-out write surfaces.
    pub op_timeout_ms: u64,
    /// How long the cached total item count stays fresh, in seconds.
    pub total_count_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            op_timeout_ms: DEFAULT_OP_TIMEOUT_MS,
            total_count_ttl_secs: DEFAULT_TOTAL_COUNT_TTL_SECS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            op_timeout_ms: settings.op_timeout_ms,
            total_count_ttl_secs: settings.total_count_ttl_secs,
        }
    }
}

impl CacheConfig {
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms.max(1))
    }

    pub fn total_count_ttl(&self) -> Duration {
        Duration::from_secs(self.total_count_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.op_timeout_ms, 250);
        assert_eq!(config.total_count_ttl_secs, 60);
    }

    #[test]
    fn zero_timeout_clamps_to_one_millisecond() {
        let config = CacheConfig {
            op_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.op_timeout(), Duration::from_millis(1));
    }
}

use git2::Config;

use crate::error::CoreError;

/// Settings read from the repo's .git/config [engram] section.
#[derive(Debug, Clone)]
pub struct EngramConfig {
    pub enabled: bool,
    pub default_agent: Option<String>,
    /// When set, relationship creation against a missing endpoint is fatal
    /// instead of skip-and-warn.
    pub strict_relationships: bool,
    /// Wall-clock limit for a single quality-gate command.
    pub gate_timeout_secs: u64,
    /// Bounded retry count for compare-and-swap ref updates.
    pub cas_retries: u32,
}

impl Default for EngramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            default_agent: None,
            strict_relationships: false,
            gate_timeout_secs: 300,
            cas_retries: 5,
        }
    }
}

impl EngramConfig {
    pub fn load(config: &Config) -> Result<Self, CoreError> {
        let defaults = Self::default();
        Ok(Self {
            enabled: config.get_bool("engram.enabled").unwrap_or(false),
            default_agent: config.get_string("engram.defaultAgent").ok(),
            strict_relationships: config
                .get_bool("engram.strictRelationships")
                .unwrap_or(defaults.strict_relationships),
            gate_timeout_secs: config
                .get_i64("engram.gateTimeoutSecs")
                .ok()
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(defaults.gate_timeout_secs),
            cas_retries: config
                .get_i32("engram.casRetries")
                .ok()
                .and_then(|v| u32::try_from(v).ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.cas_retries),
        })
    }

    pub fn save(&self, config: &mut Config) -> Result<(), CoreError> {
        config
            .set_bool("engram.enabled", self.enabled)
            .map_err(CoreError::Git)?;
        if let Some(agent) = &self.default_agent {
            config
                .set_str("engram.defaultAgent", agent)
                .map_err(CoreError::Git)?;
        }
        config
            .set_bool("engram.strictRelationships", self.strict_relationships)
            .map_err(CoreError::Git)?;
        config
            .set_i64("engram.gateTimeoutSecs", self.gate_timeout_secs as i64)
            .map_err(CoreError::Git)?;
        config
            .set_i32("engram.casRetries", self.cas_retries as i32)
            .map_err(CoreError::Git)?;
        Ok(())
    }

    /// Default config written by `engram init`.
    pub fn default_init() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }
}

use chronon_core::NodeId;
use chronon_ports::{ClockError, ClockResult};
use serde::{Deserialize, Serialize};

/// Engine construction options
///
/// All fields have defaults, so an empty config is valid. Deserializable so
/// host applications can load it alongside their own configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Node identifier; a fresh random id is generated when absent
    #[serde(default)]
    pub node_id: Option<NodeId>,
    /// Maximum tolerated absolute difference between local and external
    /// physical time, in seconds, before synchronization is rejected
    #[serde(default = "EngineConfig::default_max_drift_seconds")]
    pub max_drift_seconds: f64,
}

impl EngineConfig {
    /// Check the configuration; a negative or non-finite drift bound is
    /// rejected at construction so the engine can never run with one.
    pub fn validate(&self) -> ClockResult<()> {
        if !self.max_drift_seconds.is_finite() || self.max_drift_seconds < 0.0 {
            return Err(ClockError::InvalidConfiguration(format!(
                "max_drift_seconds must be a non-negative finite number, got {}",
                self.max_drift_seconds
            )));
        }
        Ok(())
    }

    fn default_max_drift_seconds() -> f64 {
        60.0
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            max_drift_seconds: Self::default_max_drift_seconds(),
        }
    }
}

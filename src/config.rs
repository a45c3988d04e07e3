//! Engine configuration supplied by the hosting application.

use serde::Deserialize;

use crate::sync::SynchronizationTimeout;

/// Settings for the projection engine.
///
/// Arrives already deserialized from whatever configuration surface the
/// hosting application exposes.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectionSettings {
    /// Wait-for-version timeout in milliseconds.
    #[serde(default = "default_synchronization_timeout_ms")]
    pub synchronization_timeout_ms: u64,
}

fn default_synchronization_timeout_ms() -> u64 {
    2_000
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            synchronization_timeout_ms: default_synchronization_timeout_ms(),
        }
    }
}

impl ProjectionSettings {
    /// Validate the configured timeout into the engine's newtype.
    pub fn synchronization_timeout(&self) -> std::io::Result<SynchronizationTimeout> {
        SynchronizationTimeout::from_millis(self.synchronization_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_field_falls_back_to_default_timeout() {
        let settings: ProjectionSettings = serde_json::from_value(serde_json::json!({})).unwrap();

        assert_eq!(settings.synchronization_timeout_ms, 2_000);
        assert_eq!(
            settings.synchronization_timeout().unwrap().as_duration(),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn configured_timeout_is_validated() {
        let settings: ProjectionSettings =
            serde_json::from_value(serde_json::json!({ "synchronization_timeout_ms": 50 }))
                .unwrap();
        assert_eq!(
            settings.synchronization_timeout().unwrap().as_duration(),
            Duration::from_millis(50)
        );

        let settings: ProjectionSettings =
            serde_json::from_value(serde_json::json!({ "synchronization_timeout_ms": 0 }))
                .unwrap();
        assert!(settings.synchronization_timeout().is_err());
    }
}

//! Synchronization timeout for wait-for-version requests.

use std::time::Duration;

/// Bound on how long a wait-for-version request stays outstanding before it
/// resolves `false`.
///
/// # Valid Range
///
/// - Must be non-zero (a zero timeout would fail every wait immediately)
/// - Maximum: 60 seconds (bounds caller wait time on a stalled edit pipeline)
/// - Default: 2 seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynchronizationTimeout(Duration);

impl SynchronizationTimeout {
    /// Default timeout: 2 seconds
    const DEFAULT_MILLIS: u64 = 2_000;

    /// Maximum valid timeout: 60 seconds
    const MAX_SECS: u64 = 60;

    /// Create a new SynchronizationTimeout with validation.
    ///
    /// # Returns
    /// - `Ok(SynchronizationTimeout)` if duration is non-zero and at most 60s
    /// - `Err(io::Error)` with InvalidInput kind otherwise
    ///
    /// # Boundary Behavior
    ///
    /// `60.0s` exactly is accepted; `60s + 1ns` is rejected. The ceiling is
    /// strict because it bounds user-visible wait time.
    pub fn new(duration: Duration) -> std::io::Result<Self> {
        if duration.is_zero() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Synchronization timeout must be non-zero",
            ));
        }

        if duration > Duration::from_secs(Self::MAX_SECS) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "Synchronization timeout must be at most {}s, got {:?}",
                    Self::MAX_SECS,
                    duration
                ),
            ));
        }

        Ok(Self(duration))
    }

    /// Create from a millisecond count, with the same validation as `new`.
    pub fn from_millis(millis: u64) -> std::io::Result<Self> {
        Self::new(Duration::from_millis(millis))
    }

    /// Get the inner Duration value.
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for SynchronizationTimeout {
    fn default() -> Self {
        Self(Duration::from_millis(Self::DEFAULT_MILLIS))
    }
}

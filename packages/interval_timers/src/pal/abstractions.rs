//! Platform abstraction trait definitions.

use std::fmt::Debug;

/// Provides the timestamps recorded by every timer backend.
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Current wall-clock reading as signed nanoseconds since the Unix epoch.
    ///
    /// Monotonicity is whatever the host clock provides. Readings before the epoch are negative.
    fn now_nanos(&self) -> i64;
}

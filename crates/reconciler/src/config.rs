use std::time::Duration;

/// Configuration for the work loop.
#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    /// Yield once the current slice has less than this much time left.
    pub yield_threshold: Duration,
    /// Hard cap on units of work per slice, independent of the deadline.
    pub max_units_per_slice: Option<usize>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            max_units_per_slice: None,
        }
    }
}

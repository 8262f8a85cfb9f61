use std::time::Duration;

/// Knobs for one round of connection racing.
///
/// Built once by the caller and threaded down explicitly; nothing in the
/// racing path consults ambient state.
#[derive(Clone, Debug)]
pub struct RaceConfig {
    /// Candidates attempted concurrently per batch.
    pub batch_size: usize,
    /// Any-of window for a batch's connection attempts. Attempts still
    /// pending when it elapses are canceled.
    pub connect_timeout: Duration,
    /// Deadline for a single ping request/response exchange.
    pub attempt_timeout: Duration,
    /// Stop racing further batches once one usable response arrived.
    pub eager: bool,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            connect_timeout: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(1),
            eager: false,
        }
    }
}

//! Progress reporting for the monthly aggregation runs.
//!
//! [`ProgressCallback`] keeps month scheduling independent of how progress
//! is rendered. The CLI plugs in `indicatif` bars.

/// Receives progress updates from a long-running aggregation.
///
/// Implementations must be `Send + Sync` because months run on separate
/// blocking tasks that share one reporter.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work (enables percentage/ETA).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

//! Statistics collection and reporting module
//!
//! This module turns raw worker output into statistics and distributes them:
//! - Parsing of worker console lines into telemetry events
//! - Share, hashrate, difficulty and uptime aggregation
//! - Fan-out of the latest snapshot to observers
//! - Periodic status notifications
//!

/// Line-by-line parser for the worker's console output
pub mod parser;

/// Aggregation of telemetry events into [`MiningStats`]
pub mod aggregator;

/// Publish/subscribe distribution of state snapshots
///
/// Every observer gets the current snapshot on registration and every
/// later update in order.
pub mod broadcaster;

/// Status notification sink used while a worker runs
pub mod notifier;

// Re-export main components
pub use aggregator::{MiningStats, StatsAggregator};
pub use broadcaster::{Snapshot, StateBroadcaster, Subscription};
pub use notifier::{LogNotifier, NotificationSink, format_hashrate, format_uptime};
pub use parser::parse_line;

// src/stats/notifier.rs
use crate::stats::broadcaster::Snapshot;
use std::time::Duration;

/// Receives periodic status updates while a worker runs
///
/// Called once when a worker starts and then on every uptime tick, so
/// implementations must return quickly and must not fail.
pub trait NotificationSink: Send + Sync {
    /// Shows the current state somewhere (status bar, log, ...)
    fn notify(&self, snapshot: &Snapshot);
}

/// Notification sink that writes a status line to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, snapshot: &Snapshot) {
        if snapshot.running {
            log::info!("{}", status_line(snapshot));
        } else {
            log::info!("Mining stopped");
        }
    }
}

/// One-line summary:
/// `<hashrate> | Accepted: <n> | Rejected: <n> | Diff: <d> | Uptime: HH:MM:SS`
pub fn status_line(snapshot: &Snapshot) -> String {
    let stats = &snapshot.stats;
    format!(
        "{} | Accepted: {} | Rejected: {} | Diff: {} | Uptime: {}",
        format_hashrate(stats.hashrate),
        stats.accepted_shares,
        stats.rejected_shares,
        stats.difficulty,
        format_uptime(stats.uptime)
    )
}

/// Formats an uptime as `HH:MM:SS`; hours keep counting past 99
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Formats a hashrate with the largest unit that keeps it at or above 1
///
/// `1_500_000.0` becomes `"1.50 MH/s"`, `2_500.0` becomes `"2.50 KH/s"`.
pub fn format_hashrate(hashrate: f64) -> String {
    if hashrate >= 1_000_000.0 {
        format!("{:.2} MH/s", hashrate / 1_000_000.0)
    } else if hashrate >= 1_000.0 {
        format!("{:.2} KH/s", hashrate / 1_000.0)
    } else {
        format!("{:.2} H/s", hashrate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::aggregator::MiningStats;

    #[test]
    fn test_format_hashrate_thresholds() {
        assert_eq!(format_hashrate(0.0), "0.00 H/s");
        assert_eq!(format_hashrate(999.5), "999.50 H/s");
        assert_eq!(format_hashrate(1_000.0), "1.00 KH/s");
        assert_eq!(format_hashrate(2_500.0), "2.50 KH/s");
        assert_eq!(format_hashrate(1_500_000.0), "1.50 MH/s");
    }

    #[test]
    fn test_status_line() {
        let snapshot = Snapshot {
            running: true,
            stats: MiningStats {
                hashrate: 12_340.0,
                accepted_shares: 4,
                rejected_shares: 1,
                difficulty: 256.0,
                uptime: Duration::from_secs(3_725),
                ..MiningStats::default()
            },
        };
        assert_eq!(
            status_line(&snapshot),
            "12.34 KH/s | Accepted: 4 | Rejected: 1 | Diff: 256 | Uptime: 01:02:05"
        );
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::ZERO), "00:00:00");
        assert_eq!(format_uptime(Duration::from_millis(59_999)), "00:00:59");
        assert_eq!(format_uptime(Duration::from_secs(3_600)), "01:00:00");
        assert_eq!(format_uptime(Duration::from_secs(100 * 3_600 + 61)), "100:01:01");
    }
}

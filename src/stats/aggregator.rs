// src/stats/aggregator.rs
use crate::types::TelemetryEvent;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Statistics of the current worker run
///
/// `Default` is the zero value every run starts from and returns to.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MiningStats {
    /// Last reported hashrate (hashes per second)
    pub hashrate: f64,
    /// Number of shares accepted by the pool during this run
    pub accepted_shares: u64,
    /// Number of shares rejected by the pool during this run
    pub rejected_shares: u64,
    /// Last reported share difficulty
    pub difficulty: f64,
    /// Time since the worker was spawned
    pub uptime: Duration,
    /// CPU temperature in Celsius, when a sensor is available
    pub temperature: Option<f32>,
}

/// Folds telemetry events and clock ticks into [`MiningStats`]
///
/// Holds the uptime clock of the active run. Callers serialize access; the
/// aggregator itself is plain data.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    stats: MiningStats,
    run_start: Option<Instant>,
}

impl StatsAggregator {
    /// Creates an aggregator holding zeroed stats and no running clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a new run at `now` from zeroed stats
    pub fn start(&mut self, now: Instant) {
        self.reset();
        self.run_start = Some(now);
    }

    /// Applies one telemetry event
    ///
    /// Share counters only ever grow; hashrate and difficulty keep their
    /// last positive sample.
    pub fn apply(&mut self, event: &TelemetryEvent) {
        match *event {
            TelemetryEvent::ShareAccepted => {
                self.stats.accepted_shares += 1;
                log::debug!("Share accepted, total {}", self.stats.accepted_shares);
            }
            TelemetryEvent::ShareRejected => {
                self.stats.rejected_shares += 1;
                log::debug!("Share rejected, total {}", self.stats.rejected_shares);
            }
            TelemetryEvent::HashrateSample(value) if value > 0.0 => {
                self.stats.hashrate = value;
                log::debug!("Hashrate: {:.2} H/s", value);
            }
            TelemetryEvent::DifficultySample(value) if value > 0.0 => {
                self.stats.difficulty = value;
                log::debug!("Difficulty: {}", value);
            }
            TelemetryEvent::HashrateSample(_)
            | TelemetryEvent::DifficultySample(_)
            | TelemetryEvent::Unrecognized => {}
        }
    }

    /// Recomputes uptime as `now - run start`
    ///
    /// Does nothing when no run has been started.
    pub fn tick(&mut self, now: Instant) {
        if let Some(start) = self.run_start {
            self.stats.uptime = now.saturating_duration_since(start);
        }
    }

    /// Stores the latest temperature reading
    pub fn record_temperature(&mut self, celsius: Option<f32>) {
        self.stats.temperature = celsius;
    }

    /// Returns every field to its zero value and stops the clock
    pub fn reset(&mut self) {
        self.stats = MiningStats::default();
        self.run_start = None;
    }

    /// Copy of the current statistics
    pub fn stats(&self) -> MiningStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::parser::parse_line;

    fn feed(agg: &mut StatsAggregator, lines: &[&str]) {
        for line in lines {
            agg.apply(&parse_line(line));
        }
    }

    #[test]
    fn test_accepted_line_only_counts_share() {
        let mut agg = StatsAggregator::new();
        feed(&mut agg, &["accepted share at diff 256 (123.45 MH/s)"]);

        let stats = agg.stats();
        assert_eq!(stats.accepted_shares, 1);
        assert_eq!(stats.hashrate, 0.0);
        assert_eq!(stats.difficulty, 0.0);
    }

    #[test]
    fn test_hashrate_line_does_not_touch_difficulty() {
        let mut agg = StatsAggregator::new();
        feed(&mut agg, &["2.50 KH/s, diff 128"]);

        let stats = agg.stats();
        assert_eq!(stats.hashrate, 2500.0);
        assert_eq!(stats.difficulty, 0.0);
    }

    #[test]
    fn test_rejected_and_malformed_lines() {
        let mut agg = StatsAggregator::new();
        feed(&mut agg, &["yay rejected!", "123 XH/s"]);

        let stats = agg.stats();
        assert_eq!(stats.rejected_shares, 1);
        assert_eq!(
            stats,
            MiningStats {
                rejected_shares: 1,
                ..MiningStats::default()
            }
        );
    }

    #[test]
    fn test_non_positive_samples_are_ignored() {
        let mut agg = StatsAggregator::new();
        agg.apply(&TelemetryEvent::HashrateSample(1_000.0));
        agg.apply(&TelemetryEvent::DifficultySample(64.0));
        agg.apply(&TelemetryEvent::HashrateSample(0.0));
        agg.apply(&TelemetryEvent::DifficultySample(-1.0));

        let stats = agg.stats();
        assert_eq!(stats.hashrate, 1_000.0);
        assert_eq!(stats.difficulty, 64.0);
    }

    #[test]
    fn test_tick_measures_uptime_from_run_start() {
        let mut agg = StatsAggregator::new();
        let start = Instant::now();
        agg.tick(start + Duration::from_secs(5));
        assert_eq!(agg.stats().uptime, Duration::ZERO);

        agg.start(start);
        agg.tick(start + Duration::from_secs(3));
        assert_eq!(agg.stats().uptime, Duration::from_secs(3));
    }

    #[test]
    fn test_reset_and_restart_zero_everything() {
        let mut agg = StatsAggregator::new();
        let start = Instant::now();
        agg.start(start);
        feed(&mut agg, &["accepted", "accepted", "5 H/s", "diff 3"]);
        agg.record_temperature(Some(51.5));
        agg.tick(start + Duration::from_secs(9));

        agg.start(Instant::now());
        assert_eq!(agg.stats(), MiningStats::default());

        agg.apply(&TelemetryEvent::ShareAccepted);
        agg.reset();
        assert_eq!(agg.stats(), MiningStats::default());
    }
}

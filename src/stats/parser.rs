// src/stats/parser.rs
//! Worker output parser
//!
//! Turns one line of the worker's free-form console output into at most one
//! [`TelemetryEvent`]. The worker's output is not a format we control, so
//! anything unexpected maps to [`TelemetryEvent::Unrecognized`] instead of
//! an error.
//!
//! Classification is a case-insensitive substring match, first hit wins:
//!
//! | Substring  | Event                                  |
//! |------------|----------------------------------------|
//! | `accepted` | [`TelemetryEvent::ShareAccepted`]      |
//! | `rejected` | [`TelemetryEvent::ShareRejected`]      |
//! | `h/s`      | [`TelemetryEvent::HashrateSample`]     |
//! | `diff`     | [`TelemetryEvent::DifficultySample`]   |

use crate::types::TelemetryEvent;

/// Hashrate units, longest first so `KH/s` is not read as `H/s`
const HASHRATE_UNITS: [(&str, f64); 3] = [("mh/s", 1_000_000.0), ("kh/s", 1_000.0), ("h/s", 1.0)];

/// Classifies a single line of worker output
///
/// A line that falls into the hashrate or difficulty category but carries
/// no readable number yields `Unrecognized`.
pub fn parse_line(line: &str) -> TelemetryEvent {
    let lower = line.to_ascii_lowercase();

    if lower.contains("accepted") {
        TelemetryEvent::ShareAccepted
    } else if lower.contains("rejected") {
        TelemetryEvent::ShareRejected
    } else if lower.contains("h/s") {
        extract_hashrate(&lower)
            .map(TelemetryEvent::HashrateSample)
            .unwrap_or(TelemetryEvent::Unrecognized)
    } else if lower.contains("diff") {
        extract_difficulty(&lower)
            .map(TelemetryEvent::DifficultySample)
            .unwrap_or(TelemetryEvent::Unrecognized)
    } else {
        TelemetryEvent::Unrecognized
    }
}

/// Finds the first `<number> <unit>` pair and scales it to H/s
///
/// `line` must already be ASCII-lowercased.
fn extract_hashrate(line: &str) -> Option<f64> {
    let bytes = line.as_bytes();

    (0..bytes.len())
        .filter(|&i| bytes[i].is_ascii_digit())
        .find_map(|start| {
            let end = number_end(bytes, start);
            let rest = line[end..].trim_start_matches(|c: char| c.is_ascii_whitespace());
            let (_, scale) = HASHRATE_UNITS
                .iter()
                .find(|(unit, _)| rest.starts_with(unit))?;
            parse_number(&line[start..end]).map(|value| value * scale)
        })
}

/// Reads the first number after the first `diff`
///
/// `line` must already be ASCII-lowercased.
fn extract_difficulty(line: &str) -> Option<f64> {
    let after = &line[line.find("diff")? + "diff".len()..];
    let start = after.find(|c: char| c.is_ascii_digit())?;
    let end = number_end(after.as_bytes(), start);
    parse_number(&after[start..end])
}

/// End of the `\d+(\.\d*)?` run starting at `start`
fn number_end(bytes: &[u8], start: usize) -> usize {
    let digits = |from: usize| {
        from + bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let end = digits(start);
    if bytes.get(end) == Some(&b'.') {
        digits(end + 1)
    } else {
        end
    }
}

fn parse_number(token: &str) -> Option<f64> {
    token
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_wins_over_everything_else() {
        assert_eq!(
            parse_line("accepted share at diff 256 (123.45 MH/s)"),
            TelemetryEvent::ShareAccepted
        );
        assert_eq!(
            parse_line("[2024-05-01 10:00:00] ACCEPTED: 3/3 (diff 0.002), 1.20 MH/s yes!"),
            TelemetryEvent::ShareAccepted
        );
    }

    #[test]
    fn test_rejected_share() {
        assert_eq!(parse_line("yay rejected!"), TelemetryEvent::ShareRejected);
        assert_eq!(
            parse_line("Rejected: low difficulty share 12 H/s"),
            TelemetryEvent::ShareRejected
        );
    }

    #[test]
    fn test_hashrate_units_are_scaled() {
        assert_eq!(
            parse_line("CPU T0: 850 H/s"),
            TelemetryEvent::HashrateSample(850.0)
        );
        assert_eq!(
            parse_line("Total: 2.50 kh/s"),
            TelemetryEvent::HashrateSample(2_500.0)
        );
        assert_eq!(
            parse_line("GPU #0: 1.5MH/s"),
            TelemetryEvent::HashrateSample(1_500_000.0)
        );
    }

    #[test]
    fn test_hashrate_wins_over_difficulty() {
        assert_eq!(
            parse_line("2.50 KH/s, diff 128"),
            TelemetryEvent::HashrateSample(2_500.0)
        );
    }

    #[test]
    fn test_hashrate_takes_first_number_with_unit() {
        assert_eq!(
            parse_line("thread 3 of 8: 42.0 H/s, total 336 H/s"),
            TelemetryEvent::HashrateSample(42.0)
        );
    }

    #[test]
    fn test_unknown_unit_yields_nothing() {
        assert_eq!(parse_line("123 XH/s"), TelemetryEvent::Unrecognized);
        assert_eq!(parse_line("hashrate: n/a H/s"), TelemetryEvent::Unrecognized);
    }

    #[test]
    fn test_difficulty_skips_to_first_number() {
        assert_eq!(
            parse_line("Stratum difficulty set to 0.05"),
            TelemetryEvent::DifficultySample(0.05)
        );
        assert_eq!(
            parse_line("new DIFF: 1024"),
            TelemetryEvent::DifficultySample(1024.0)
        );
        assert_eq!(parse_line("diff unknown"), TelemetryEvent::Unrecognized);
    }

    #[test]
    fn test_other_lines_are_unrecognized() {
        assert_eq!(parse_line(""), TelemetryEvent::Unrecognized);
        assert_eq!(
            parse_line("Starting Stratum on stratum+tcp://na.vipor.net:5040"),
            TelemetryEvent::Unrecognized
        );
    }

    #[test]
    fn test_parser_is_deterministic() {
        let line = "3.25 MH/s";
        assert_eq!(parse_line(line), parse_line(line));
    }
}

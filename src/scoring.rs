//! Debate-shape confidence scoring.
//!
//! The score measures how thoroughly and evenly each factor was argued. It is
//! computed only from argument counts, never from argument content; the
//! constants are part of the output contract and must stay as they are.

use crate::schema::DebateTrace;

/// Total argument count at which richness saturates.
pub const RICHNESS_SATURATION: f64 = 6.0;
/// Maximum richness points per trace.
pub const RICHNESS_MAX: f64 = 50.0;
/// Maximum balance points per trace.
pub const BALANCE_MAX: f64 = 30.0;
/// Depth points when both sides argued.
pub const DEPTH_ENGAGED: f64 = 20.0;
/// Depth points when at least one side was empty.
pub const DEPTH_ONE_SIDED: f64 = 10.0;

/// Per-trace score breakdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceScore {
    pub richness: f64,
    pub balance: f64,
    pub depth: f64,
}

impl TraceScore {
    pub fn total(&self) -> f64 {
        self.richness + self.balance + self.depth
    }
}

/// Score a single debate trace.
pub fn score_trace(trace: &DebateTrace) -> TraceScore {
    score_counts(trace.support_count(), trace.opposition_count())
}

fn score_counts(support: usize, opposition: usize) -> TraceScore {
    let (s, o) = (support as f64, opposition as f64);
    let engaged = support > 0 && opposition > 0;

    let richness = ((s + o) / RICHNESS_SATURATION * RICHNESS_MAX).min(RICHNESS_MAX);
    let balance = if engaged {
        s.min(o) / s.max(o) * BALANCE_MAX
    } else {
        0.0
    };
    let depth = if engaged { DEPTH_ENGAGED } else { DEPTH_ONE_SIDED };

    TraceScore {
        richness,
        balance,
        depth,
    }
}

/// Confidence score for a run: the mean per-trace total, clamped to 100 and
/// rounded to one decimal. An empty sequence scores 0.0.
pub fn confidence_score(traces: &[DebateTrace]) -> f64 {
    if traces.is_empty() {
        return 0.0;
    }

    let total: f64 = traces.iter().map(|t| score_trace(t).total()).sum();
    let average = total / traces.len() as f64;

    round_one_decimal(average.min(100.0))
}

/// Round to one decimal, ties to even on the exact binary value.
fn round_one_decimal(value: f64) -> f64 {
    let scaled = value * 10.0;
    let floor = scaled.floor();
    if scaled - floor != 0.5 {
        return scaled.round() / 10.0;
    }

    // `scaled` landed on a tie; the product error says which side `value` is on
    let error = value.mul_add(10.0, -scaled);
    let rounded = if error > 0.0 {
        floor + 1.0
    } else if error < 0.0 || floor % 2.0 == 0.0 {
        floor
    } else {
        floor + 1.0
    };
    rounded / 10.0
}

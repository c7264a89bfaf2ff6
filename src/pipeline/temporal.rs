use chrono::{DateTime, Utc};

use crate::types::activity::Track;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimingSummary {
    pub duration_seconds: f64,
    pub average_cadence: f64,
}

/// Walks every point in track order, accumulating elapsed time between
/// consecutive timestamped points and averaging step samples.
///
/// Timestamps are not assumed to be ordered: a regressing timestamp subtracts
/// from the running total. Only the final total is floored at zero.
pub fn summarize_timing(track: &Track) -> TimingSummary {
    let mut elapsed_ms: i64 = 0;
    let mut prev_time: Option<DateTime<Utc>> = None;
    let mut step_total: u64 = 0;
    let mut step_samples: u64 = 0;

    for point in track.points() {
        if let Some(time) = point.time {
            if let Some(prev) = prev_time {
                elapsed_ms += (time - prev).num_milliseconds();
            }
            prev_time = Some(time);
        }

        // A zero reading is indistinguishable from a missing one.
        if let Some(steps) = point.steps.filter(|s| *s > 0) {
            step_total += u64::from(steps);
            step_samples += 1;
        }
    }

    let average_cadence = if step_samples > 0 {
        step_total as f64 / step_samples as f64
    } else {
        0.0
    };

    TimingSummary {
        duration_seconds: (elapsed_ms as f64 / 1000.0).max(0.0),
        average_cadence,
    }
}

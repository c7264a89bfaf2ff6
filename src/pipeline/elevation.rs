use crate::types::activity::{Segment, TrackPoint};

/// Total ascent in meters. Descents are ignored, and a pair is skipped when
/// either side has no elevation.
pub fn segment_elevation_gain(segment: &[TrackPoint]) -> f64 {
    segment
        .windows(2)
        .filter_map(|pair| match (pair[0].elevation, pair[1].elevation) {
            (Some(prev), Some(curr)) => Some(curr - prev),
            _ => None,
        })
        .filter(|delta| *delta > 0.0)
        .sum()
}

pub fn track_elevation_gain(segments: &[Segment]) -> f64 {
    segments
        .iter()
        .map(|segment| segment_elevation_gain(segment))
        .sum()
}

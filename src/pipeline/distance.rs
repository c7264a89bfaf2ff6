use crate::types::activity::{Segment, TrackPoint};

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points (haversine).
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

pub fn point_distance(a: &TrackPoint, b: &TrackPoint) -> f64 {
    haversine_distance(a.lat, a.lon, b.lat, b.lon)
}

/// Raw accumulated distance along a segment. No smoothing is applied, so GPS
/// jitter adds to the total.
pub fn segment_distance(segment: &[TrackPoint]) -> f64 {
    segment
        .windows(2)
        .map(|pair| point_distance(&pair[0], &pair[1]))
        .sum()
}

pub fn track_distance(segments: &[Segment]) -> f64 {
    segments.iter().map(|segment| segment_distance(segment)).sum()
}

use crate::error::SummarizeError;
use crate::pipeline::calories::EnergyModel;
use crate::pipeline::{distance, elevation, temporal};
use crate::types::activity::{Activity, ActivityType, Coordinate, Track};

/// Builds the activity record for a decoded file. Only the first track is
/// summarized; any further tracks are ignored.
pub fn summarize(tracks: &[Track], energy: &EnergyModel) -> Result<Activity, SummarizeError> {
    let track = match tracks.first() {
        Some(track) if !track.segments.is_empty() => track,
        _ => return Err(SummarizeError::EmptyTrack),
    };

    let date = track
        .segments
        .first()
        .and_then(|segment| segment.first())
        .and_then(|point| point.time);

    let timing = temporal::summarize_timing(track);

    let coordinates = track
        .points()
        .map(|p| Coordinate { lat: p.lat, lon: p.lon })
        .collect();

    Ok(Activity {
        id: None,
        name: track.name.clone(),
        date,
        distance: distance::track_distance(&track.segments),
        total_time: timing.duration_seconds,
        elevation_change: elevation::track_elevation_gain(&track.segments),
        average_heart_rate: 0.0,
        total_calories: energy.calories(timing.duration_seconds),
        average_cadence: timing.average_cadence,
        activity_type: ActivityType::Running,
        coordinates,
    })
}

use std::sync::Arc;

use crate::error::AppError;
use crate::pipeline::calories::EnergyModel;
use crate::pipeline::parse::{GpxParser, Parser};
use crate::pipeline::summarize;
use crate::store::ActivityStore;
use crate::types::activity::{Activity, ActivityId};

/// The operations exposed to the transport layer: ingest, list and delete.
#[derive(Clone)]
pub struct ActivityService {
    parser: Arc<dyn Parser>,
    store: Arc<dyn ActivityStore>,
    energy: EnergyModel,
}

impl ActivityService {
    pub fn new(store: Arc<dyn ActivityStore>, energy: EnergyModel) -> Self {
        Self {
            parser: Arc::new(GpxParser),
            store,
            energy,
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn Parser>) -> Self {
        self.parser = parser;
        self
    }

    /// Decodes, summarizes and stores one track file. Nothing is written
    /// unless decoding and summarizing both succeed.
    pub async fn ingest(&self, bytes: &[u8]) -> Result<Activity, AppError> {
        let tracks = self.parser.parse(bytes)?;
        let activity = summarize::summarize(&tracks, &self.energy)?;

        tracing::debug!(
            name = %activity.name,
            date = ?activity.date,
            distance_m = activity.distance,
            total_time_s = activity.total_time,
            elevation_gain_m = activity.elevation_change,
            calories = activity.total_calories,
            cadence = activity.average_cadence,
            "Summarized track"
        );

        let id = self.store.insert(activity.clone()).await?;

        tracing::info!(
            "Stored activity {} '{}' ({} points, {:.2} km)",
            id,
            activity.name,
            activity.coordinates.len(),
            activity.distance / 1000.0
        );

        Ok(activity.with_id(id))
    }

    /// All activities, or only those whose name contains `name_query`.
    pub async fn list(&self, name_query: Option<&str>) -> Result<Vec<Activity>, AppError> {
        let activities = match name_query.filter(|q| !q.is_empty()) {
            Some(query) => self.store.find_by_name(query).await?,
            None => self.store.list_all().await?,
        };
        Ok(activities)
    }

    pub async fn delete(&self, id: &ActivityId) -> Result<(), AppError> {
        if self.store.delete_by_id(id).await? {
            tracing::info!("Deleted activity {}", id);
            Ok(())
        } else {
            tracing::warn!("Delete requested for unknown activity {}", id);
            Err(AppError::NotFound(id.to_string()))
        }
    }
}

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{name_matches, ActivityStore};
use crate::error::StoreError;
use crate::types::activity::{Activity, ActivityId};

/// In-process store. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    activities: Arc<DashMap<ActivityId, StoredActivity>>,
    next_seq: Arc<AtomicU64>,
}

struct StoredActivity {
    seq: u64,
    activity: Activity,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    fn collect_where(&self, keep: impl Fn(&Activity) -> bool) -> Vec<Activity> {
        let mut matched: Vec<(u64, Activity)> = self
            .activities
            .iter()
            .filter(|entry| keep(&entry.activity))
            .map(|entry| (entry.seq, entry.activity.clone()))
            .collect();
        matched.sort_by_key(|(seq, _)| *seq);
        matched.into_iter().map(|(_, activity)| activity).collect()
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn insert(&self, activity: Activity) -> Result<ActivityId, StoreError> {
        let id = ActivityId::generate();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.activities.insert(
            id.clone(),
            StoredActivity {
                seq,
                activity: activity.with_id(id.clone()),
            },
        );
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<Activity>, StoreError> {
        Ok(self.collect_where(|_| true))
    }

    async fn find_by_name(&self, query: &str) -> Result<Vec<Activity>, StoreError> {
        Ok(self.collect_where(|activity| name_matches(&activity.name, query)))
    }

    async fn delete_by_id(&self, id: &ActivityId) -> Result<bool, StoreError> {
        Ok(self.activities.remove(id).is_some())
    }
}

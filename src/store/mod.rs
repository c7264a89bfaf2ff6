//! Activity persistence.
//!
//! Backends assign identifiers on insert and never update a stored record.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::activity::{Activity, ActivityId};

#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Persists `activity` under a freshly assigned identifier. Any id already
    /// set on the input is ignored.
    async fn insert(&self, activity: Activity) -> Result<ActivityId, StoreError>;

    /// Every stored activity, in insertion order.
    async fn list_all(&self) -> Result<Vec<Activity>, StoreError>;

    /// Activities whose name contains `query`, ignoring case. An empty query
    /// matches everything.
    async fn find_by_name(&self, query: &str) -> Result<Vec<Activity>, StoreError>;

    /// Returns `false` when no activity had this id.
    async fn delete_by_id(&self, id: &ActivityId) -> Result<bool, StoreError>;
}

pub(crate) fn name_matches(name: &str, query: &str) -> bool {
    query.is_empty() || name.to_lowercase().contains(&query.to_lowercase())
}

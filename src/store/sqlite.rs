use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

use super::{name_matches, ActivityStore};
use crate::error::StoreError;
use crate::types::activity::{Activity, ActivityId, ActivityType, Coordinate};

/// Durable store backed by a single SQLite table.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `database_url` and makes
    /// sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| StoreError::Backend(format!("Invalid database URL: {e}")))?
            .create_if_missing(true);

        // Every connection to `:memory:` is its own database, so pin one.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(Option::<Duration>::None)
                .max_lifetime(Option::<Duration>::None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("Failed to connect", e))?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::info!("SQLite activity store ready at {}", database_url);
        Ok(store)
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:").await
    }

    /// Closes every pooled connection. Later calls fail as unavailable.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS activities (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                date TEXT,
                distance REAL NOT NULL,
                total_time REAL NOT NULL,
                elevation_change REAL NOT NULL,
                average_heart_rate REAL NOT NULL,
                total_calories REAL NOT NULL,
                average_cadence REAL NOT NULL,
                activity_type TEXT NOT NULL,
                coordinates TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to create activities table", e))?;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<Activity>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, date, distance, total_time, elevation_change,
                   average_heart_rate, total_calories, average_cadence,
                   activity_type, coordinates
            FROM activities
            ORDER BY seq ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to list activities", e))?;

        rows.iter().map(row_to_activity).collect()
    }
}

#[async_trait]
impl ActivityStore for SqliteStore {
    async fn insert(&self, activity: Activity) -> Result<ActivityId, StoreError> {
        let id = ActivityId::generate();
        let coordinates = serde_json::to_string(&activity.coordinates)
            .map_err(|e| StoreError::Backend(format!("Failed to encode coordinates: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO activities (
                id, name, date, distance, total_time, elevation_change,
                average_heart_rate, total_calories, average_cadence,
                activity_type, coordinates, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(id.as_str())
        .bind(&activity.name)
        .bind(activity.date.map(|d| d.to_rfc3339()))
        .bind(activity.distance)
        .bind(activity.total_time)
        .bind(activity.elevation_change)
        .bind(activity.average_heart_rate)
        .bind(activity.total_calories)
        .bind(activity.average_cadence)
        .bind(activity.activity_type.as_str())
        .bind(&coordinates)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert activity", e))?;

        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<Activity>, StoreError> {
        self.fetch_all().await
    }

    async fn find_by_name(&self, query: &str) -> Result<Vec<Activity>, StoreError> {
        // SQLite's lower() only folds ASCII, so match in Rust.
        let mut activities = self.fetch_all().await?;
        activities.retain(|activity| name_matches(&activity.name, query));
        Ok(activities)
    }

    async fn delete_by_id(&self, id: &ActivityId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM activities WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete activity", e))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_activity(row: &SqliteRow) -> Result<Activity, StoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("Failed to decode activity row", e);

    let date = row
        .try_get::<Option<String>, _>("date")
        .map_err(decode)?
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| StoreError::Backend(format!("Invalid stored date {raw:?}: {e}")))
        })
        .transpose()?;

    let activity_type: String = row.try_get("activity_type").map_err(decode)?;
    let activity_type = ActivityType::from_str(&activity_type).ok_or_else(|| {
        StoreError::Backend(format!("Unknown stored activity type {activity_type:?}"))
    })?;

    let coordinates: String = row.try_get("coordinates").map_err(decode)?;
    let coordinates: Vec<Coordinate> = serde_json::from_str(&coordinates)
        .map_err(|e| StoreError::Backend(format!("Invalid stored coordinates: {e}")))?;

    Ok(Activity {
        id: Some(ActivityId::new(row.try_get::<String, _>("id").map_err(decode)?)),
        name: row.try_get("name").map_err(decode)?,
        date,
        distance: row.try_get("distance").map_err(decode)?,
        total_time: row.try_get("total_time").map_err(decode)?,
        elevation_change: row.try_get("elevation_change").map_err(decode)?,
        average_heart_rate: row.try_get("average_heart_rate").map_err(decode)?,
        total_calories: row.try_get("total_calories").map_err(decode)?,
        average_cadence: row.try_get("average_cadence").map_err(decode)?,
        activity_type,
        coordinates,
    })
}

fn map_sqlx_error(context: &str, err: sqlx::Error) -> StoreError {
    let transient = match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db.code().is_some_and(|code| is_busy_code(&code)),
        _ => false,
    };

    if transient {
        StoreError::Unavailable(format!("{context}: {err}"))
    } else {
        StoreError::Backend(format!("{context}: {err}"))
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes.
fn is_busy_code(code: &str) -> bool {
    code.parse::<i32>()
        .map(|code| matches!(code & 0xff, 5 | 6))
        .unwrap_or(false)
}

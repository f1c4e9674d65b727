use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted, immutable generation result.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItineraryRecord {
    pub id: i64,
    pub user_id: Uuid,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

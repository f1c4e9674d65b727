//! Persistence contract for the itinerary pipeline.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::TripwiseError;
use crate::models::{ItineraryRecord, PreferenceAudit, PreferenceInput};

#[async_trait]
pub trait ItineraryStore: Send + Sync {
    /// Write the audit copy of a validated submission.
    async fn record_preferences(
        &self,
        user_id: Uuid,
        input: &PreferenceInput,
    ) -> Result<PreferenceAudit, TripwiseError>;

    /// Persist a parsed generation payload.
    async fn insert_itinerary(
        &self,
        user_id: Uuid,
        payload: serde_json::Value,
    ) -> Result<ItineraryRecord, TripwiseError>;

    /// Most recently created itinerary for the user, if any.
    async fn latest_itinerary(&self, user_id: Uuid)
        -> Result<Option<ItineraryRecord>, TripwiseError>;
}

/// Postgres-backed store. Each call is a single-row insert or select.
#[derive(Debug, Clone)]
pub struct PgItineraryStore {
    pool: PgPool,
}

impl PgItineraryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Both tables reference `users`; a dangling user id is the caller's mistake.
fn user_scoped(user_id: Uuid, e: sqlx::Error) -> TripwiseError {
    match e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            TripwiseError::UnknownUser(user_id)
        }
        other => TripwiseError::Database(other),
    }
}

#[async_trait]
impl ItineraryStore for PgItineraryStore {
    async fn record_preferences(
        &self,
        user_id: Uuid,
        input: &PreferenceInput,
    ) -> Result<PreferenceAudit, TripwiseError> {
        let place_types: Vec<String> = input.place_types.iter().cloned().collect();
        let cuisines: Vec<String> = input.cuisines.iter().cloned().collect();

        let audit = sqlx::query_as::<_, PreferenceAudit>(
            r#"
            INSERT INTO preferences (user_id, budget, age, place_types, location, cuisines)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, budget, age, place_types, location, cuisines, created_at
            "#,
        )
        .bind(user_id)
        .bind(i64::from(input.budget))
        .bind(i64::from(input.age))
        .bind(Json(place_types))
        .bind(&input.location)
        .bind(Json(cuisines))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| user_scoped(user_id, e))?;

        Ok(audit)
    }

    async fn insert_itinerary(
        &self,
        user_id: Uuid,
        payload: serde_json::Value,
    ) -> Result<ItineraryRecord, TripwiseError> {
        let record = sqlx::query_as::<_, ItineraryRecord>(
            r#"
            INSERT INTO itineraries (user_id, payload)
            VALUES ($1, $2)
            RETURNING id, user_id, payload, created_at
            "#,
        )
        .bind(user_id)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| user_scoped(user_id, e))?;

        Ok(record)
    }

    async fn latest_itinerary(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ItineraryRecord>, TripwiseError> {
        let record = sqlx::query_as::<_, ItineraryRecord>(
            r#"
            SELECT id, user_id, payload, created_at
            FROM itineraries
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}

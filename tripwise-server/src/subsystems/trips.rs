use sqlx::PgPool;
use thiserror::Error;
use tripwise_core::models::{NewTrip, Trip};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TripError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid trip: {0}")]
    Invalid(String),

    #[error("Unknown user: {0}")]
    UnknownUser(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A `NewTrip` whose required fields have been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidTrip {
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub budget: i64,
    pub cover_image: Option<String>,
    pub is_public: bool,
}

pub fn validate_trip(trip: NewTrip) -> Result<ValidTrip, TripError> {
    let mut missing = Vec::new();
    if trip.user_id.is_none() {
        missing.push("userId".to_string());
    }
    let name = trip
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    if name.is_none() {
        missing.push("name".to_string());
    }
    if trip.start_date.is_none() {
        missing.push("startDate".to_string());
    }
    if trip.end_date.is_none() {
        missing.push("endDate".to_string());
    }

    let (Some(user_id), Some(name), Some(start_date), Some(end_date)) =
        (trip.user_id, name, trip.start_date, trip.end_date)
    else {
        return Err(TripError::MissingFields(missing));
    };

    if end_date < start_date {
        return Err(TripError::Invalid("endDate is before startDate".to_string()));
    }
    if trip.budget < 0 {
        return Err(TripError::Invalid("budget must not be negative".to_string()));
    }

    Ok(ValidTrip {
        user_id,
        name,
        description: trip.description,
        start_date,
        end_date,
        budget: trip.budget,
        cover_image: trip.cover_image.filter(|c| !c.trim().is_empty()),
        is_public: trip.is_public,
    })
}

pub async fn create_trip(pool: &PgPool, trip: NewTrip) -> Result<Trip, TripError> {
    let trip = validate_trip(trip)?;

    let created = sqlx::query_as::<_, Trip>(
        r#"
        INSERT INTO trips (user_id, name, description, start_date, end_date, budget, cover_image, is_public)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, user_id, name, description, start_date, end_date, budget, cover_image, is_public, created_at
        "#,
    )
    .bind(trip.user_id)
    .bind(&trip.name)
    .bind(&trip.description)
    .bind(trip.start_date)
    .bind(trip.end_date)
    .bind(trip.budget)
    .bind(&trip.cover_image)
    .bind(trip.is_public)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            TripError::UnknownUser(trip.user_id)
        }
        other => TripError::Database(other),
    })?;

    tracing::info!(trip_id = %created.id, user_id = %created.user_id, "Created trip");
    Ok(created)
}

pub async fn list_trips(pool: &PgPool, user_id: Uuid) -> Result<Vec<Trip>, TripError> {
    let trips = sqlx::query_as::<_, Trip>(
        r#"
        SELECT id, user_id, name, description, start_date, end_date, budget, cover_image, is_public, created_at
        FROM trips
        WHERE user_id = $1
        ORDER BY start_date ASC, created_at ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(trips)
}

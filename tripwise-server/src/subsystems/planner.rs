//! Planner subsystem — turns travel preferences into a stored itinerary
//!
//! Pipeline per submission: validate → audit row → prompt → generate →
//! sanitize → parse → itinerary row. The audit row is written for every
//! validated submission; the itinerary row only when the model output parses.

use std::sync::Arc;

use thiserror::Error;
use tripwise_core::models::{ItineraryRecord, PreferenceDraft};
use tripwise_core::{
    build_prompt, sanitize_response, GenerationBackend, GenerationError, ItineraryStore,
    TripwiseError,
};
use uuid::Uuid;

/// Maximum characters of sanitized output echoed back in a parse failure.
pub const EXCERPT_CHARS: usize = 200;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Missing required fields: {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("Itinerary generation is not configured")]
    GenerationUnavailable,

    #[error("Itinerary generation failed: {0}")]
    Generation(String),

    #[error("Generated itinerary was not valid JSON")]
    MalformedOutput { excerpt: String },

    #[error("No itinerary found")]
    NotFound,

    #[error("Unknown user: {0}")]
    UnknownUser(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[source] TripwiseError),
}

impl PlannerError {
    /// Stable machine-readable error kind for HTTP bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PlannerError::Validation { .. } => "validation",
            PlannerError::GenerationUnavailable => "generation_unavailable",
            PlannerError::Generation(_) => "generation_failed",
            PlannerError::MalformedOutput { .. } => "malformed_output",
            PlannerError::NotFound | PlannerError::UnknownUser(_) => "not_found",
            PlannerError::Storage(_) => "storage",
        }
    }
}

impl From<TripwiseError> for PlannerError {
    fn from(e: TripwiseError) -> Self {
        match e {
            TripwiseError::UnknownUser(id) => PlannerError::UnknownUser(id),
            other => PlannerError::Storage(other),
        }
    }
}

impl From<GenerationError> for PlannerError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::MissingApiKey => PlannerError::GenerationUnavailable,
            other => PlannerError::Generation(other.to_string()),
        }
    }
}

/// Orchestrates the preference-to-itinerary pipeline over pluggable
/// generation and persistence backends.
#[derive(Clone)]
pub struct Planner {
    store: Arc<dyn ItineraryStore>,
    generator: Arc<dyn GenerationBackend>,
    result_count: u32,
}

impl Planner {
    pub fn new(
        store: Arc<dyn ItineraryStore>,
        generator: Arc<dyn GenerationBackend>,
        result_count: u32,
    ) -> Self {
        Self {
            store,
            generator,
            result_count,
        }
    }

    pub async fn submit_preferences(
        &self,
        user_id: Uuid,
        draft: PreferenceDraft,
    ) -> Result<ItineraryRecord, PlannerError> {
        let input = draft
            .validate()
            .map_err(|missing| PlannerError::Validation { missing })?;

        let audit = self.store.record_preferences(user_id, &input).await?;
        tracing::info!(user_id = %user_id, audit_id = audit.id, "Recorded preferences");

        let prompt = build_prompt(&input, self.result_count);
        let raw = self.generator.generate(&prompt).await.map_err(|e| {
            tracing::debug!(
                user_id = %user_id,
                backend = self.generator.name(),
                error = %e,
                "Itinerary generation failed"
            );
            PlannerError::from(e)
        })?;

        let cleaned = sanitize_response(raw.as_deref());
        let payload: serde_json::Value = match serde_json::from_str(&cleaned) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    chars = cleaned.len(),
                    "Discarding unparseable generation output"
                );
                return Err(PlannerError::MalformedOutput {
                    excerpt: excerpt(&cleaned),
                });
            }
        };

        let record = self.store.insert_itinerary(user_id, payload).await?;
        tracing::info!(user_id = %user_id, itinerary_id = record.id, "Stored itinerary");

        Ok(record)
    }

    pub async fn latest_itinerary(&self, user_id: Uuid) -> Result<ItineraryRecord, PlannerError> {
        self.store
            .latest_itinerary(user_id)
            .await?
            .ok_or(PlannerError::NotFound)
    }
}

/// First [`EXCERPT_CHARS`] characters, cut on a char boundary.
pub fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

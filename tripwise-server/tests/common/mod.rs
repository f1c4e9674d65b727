//! Deterministic stand-ins for the generation API and the database.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tripwise_core::models::{ItineraryRecord, PreferenceAudit, PreferenceInput};
use tripwise_core::{GenerationBackend, GenerationError, ItineraryStore, TripwiseError};
use tripwise_server::subsystems::planner::Planner;
use uuid::Uuid;

pub const GOA_RESPONSE: &str = "```json\n[{\"place_name\":\"Goa\",\"budget\":5000,\"description\":\"Beach\",\"image_url\":\"http://x\",\"itinerary\":[\"Day 1: arrive\"]}]\n```";

#[derive(Debug, Clone)]
enum StubReply {
    Text(Option<String>),
    MissingKey,
    Api(u16, String),
    Timeout,
    Slow(std::time::Duration, String),
}

/// Generation backend that returns a fixed reply and counts calls.
#[derive(Debug)]
pub struct StubGenerator {
    reply: StubReply,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    fn with(reply: StubReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn text(text: &str) -> Arc<Self> {
        Self::with(StubReply::Text(Some(text.to_string())))
    }

    pub fn empty() -> Arc<Self> {
        Self::with(StubReply::Text(None))
    }

    pub fn missing_key() -> Arc<Self> {
        Self::with(StubReply::MissingKey)
    }

    pub fn api_error(code: u16, message: &str) -> Arc<Self> {
        Self::with(StubReply::Api(code, message.to_string()))
    }

    pub fn timeout() -> Arc<Self> {
        Self::with(StubReply::Timeout)
    }

    /// Answers with `text` only after `delay`.
    pub fn slow(delay: std::time::Duration, text: &str) -> Arc<Self> {
        Self::with(StubReply::Slow(delay, text.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerationBackend for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            StubReply::Text(t) => Ok(t.clone()),
            StubReply::MissingKey => Err(GenerationError::MissingApiKey),
            StubReply::Api(code, message) => Err(GenerationError::Api {
                code: *code,
                message: message.clone(),
            }),
            StubReply::Timeout => Err(GenerationError::Timeout { seconds: 60 }),
            StubReply::Slow(delay, text) => {
                tokio::time::sleep(*delay).await;
                Ok(Some(text.clone()))
            }
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// In-memory `ItineraryStore` that records every write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    audits: Mutex<Vec<PreferenceAudit>>,
    itineraries: Mutex<Vec<ItineraryRecord>>,
    // None accepts any user id
    users: Option<HashSet<Uuid>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store that rejects writes for ids outside `users`, like the
    /// foreign key on the real tables.
    pub fn with_users(users: &[Uuid]) -> Arc<Self> {
        Arc::new(Self {
            users: Some(users.iter().copied().collect()),
            ..Self::default()
        })
    }

    fn check_user(&self, user_id: Uuid) -> Result<(), TripwiseError> {
        match &self.users {
            Some(users) if !users.contains(&user_id) => Err(TripwiseError::UnknownUser(user_id)),
            _ => Ok(()),
        }
    }

    pub fn audit_count(&self) -> usize {
        self.audits.lock().unwrap().len()
    }

    pub fn audits(&self) -> Vec<PreferenceAudit> {
        self.audits.lock().unwrap().clone()
    }

    pub fn itinerary_count(&self) -> usize {
        self.itineraries.lock().unwrap().len()
    }

    /// Insert an itinerary with an explicit creation time.
    pub fn insert_at(&self, user_id: Uuid, payload: serde_json::Value, created_at: DateTime<Utc>) {
        let mut rows = self.itineraries.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(ItineraryRecord {
            id,
            user_id,
            payload,
            created_at,
        });
    }
}

#[async_trait]
impl ItineraryStore for MemoryStore {
    async fn record_preferences(
        &self,
        user_id: Uuid,
        input: &PreferenceInput,
    ) -> Result<PreferenceAudit, TripwiseError> {
        self.check_user(user_id)?;
        let mut rows = self.audits.lock().unwrap();
        let audit = PreferenceAudit {
            id: rows.len() as i64 + 1,
            user_id,
            budget: i64::from(input.budget),
            age: i64::from(input.age),
            place_types: Json(input.place_types.iter().cloned().collect()),
            location: input.location.clone(),
            cuisines: Json(input.cuisines.iter().cloned().collect()),
            created_at: Utc::now(),
        };
        rows.push(audit.clone());
        Ok(audit)
    }

    async fn insert_itinerary(
        &self,
        user_id: Uuid,
        payload: serde_json::Value,
    ) -> Result<ItineraryRecord, TripwiseError> {
        self.check_user(user_id)?;
        let mut rows = self.itineraries.lock().unwrap();
        let record = ItineraryRecord {
            id: rows.len() as i64 + 1,
            user_id,
            payload,
            created_at: Utc::now(),
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn latest_itinerary(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ItineraryRecord>, TripwiseError> {
        let rows = self.itineraries.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.user_id == user_id)
            .max_by_key(|r| (r.created_at, r.id))
            .cloned())
    }
}

pub fn planner(store: Arc<MemoryStore>, generator: Arc<StubGenerator>) -> Planner {
    Planner::new(store, generator, tripwise_core::DEFAULT_RESULT_COUNT)
}

pub fn valid_preferences() -> serde_json::Value {
    serde_json::json!({
        "budget": 50000,
        "age": 27,
        "place_types": ["beach", "heritage"],
        "location": "Mumbai",
        "cuisines": ["seafood", "street food"]
    })
}

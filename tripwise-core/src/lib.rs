pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod models;
pub mod prompt;
pub mod sanitize;
pub mod store;

pub use config::{ApiKey, TripwiseConfig};
pub use error::TripwiseError;
pub use generation::{
    GeminiGenerationClient, GenerationBackend, GenerationConfig, GenerationError,
};
pub use prompt::{build_prompt, DEFAULT_RESULT_COUNT};
pub use sanitize::sanitize_response;
pub use store::{ItineraryStore, PgItineraryStore};

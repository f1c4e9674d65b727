use std::fmt;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Environment variable holding the generation API credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Legacy name accepted when `GEMINI_API_KEY` is unset.
pub const API_KEY_ENV_FALLBACK: &str = "GOOGLE_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct TripwiseConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Tunables for the itinerary generation call. The credential is deliberately
/// not part of this struct; see [`ApiKey::from_env`].
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub result_count: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_seconds: 60,
            result_count: crate::prompt::DEFAULT_RESULT_COUNT,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_seconds: 120,
        }
    }
}

impl TripwiseConfig {
    /// Load from a TOML file, then overlay `TRIPWISE__SECTION__KEY` env vars.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?;
        s.try_deserialize()
    }

    /// Parse a config from an in-memory TOML document (no env overlay).
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        s.try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("TRIPWISE")
        .separator("__")
        .try_parsing(true)
}

/// Generation API credential. `Debug` and `Display` never print the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for an empty or whitespace-only value.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Read the credential once from the process environment.
    pub fn from_env() -> Option<Self> {
        std::env::var(API_KEY_ENV)
            .ok()
            .and_then(Self::new)
            .or_else(|| std::env::var(API_KEY_ENV_FALLBACK).ok().and_then(Self::new))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

/// Validated travel preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferenceInput {
    pub budget: u32,
    pub age: u32,
    pub place_types: BTreeSet<String>,
    pub location: String,
    pub cuisines: BTreeSet<String>,
}

/// A number that web clients may send either as JSON number or as a string
/// copied straight from a form field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberField {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumberField {
    fn positive_u32(&self) -> Option<u32> {
        let value = match self {
            NumberField::Int(n) => *n,
            NumberField::Float(f) if f.fract() == 0.0 => *f as i64,
            NumberField::Float(_) => return None,
            NumberField::Text(s) => s.trim().parse::<i64>().ok()?,
        };
        u32::try_from(value).ok().filter(|v| *v > 0)
    }
}

/// Unvalidated preference payload as received over HTTP.
///
/// Deserialization never fails on a field's value: `null` or a value of the
/// wrong JSON type reads as absent, so `validate` can report it by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferenceDraft {
    #[serde(default, deserialize_with = "lenient_number")]
    pub budget: Option<NumberField>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub age: Option<NumberField>,
    #[serde(default, alias = "placeTypes", deserialize_with = "lenient_list")]
    pub place_types: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub cuisines: Vec<String>,
}

fn lenient_number<'de, D>(de: D) -> Result<Option<NumberField>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

// Non-string elements are dropped; a non-array value is an empty list.
fn lenient_list<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_text<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

impl PreferenceDraft {
    /// Validate every field, collecting the names of all that are missing or
    /// unusable rather than stopping at the first.
    pub fn validate(&self) -> Result<PreferenceInput, Vec<String>> {
        let mut missing = Vec::new();

        let budget = self.budget.as_ref().and_then(NumberField::positive_u32);
        if budget.is_none() {
            missing.push("budget".to_string());
        }

        let age = self.age.as_ref().and_then(NumberField::positive_u32);
        if age.is_none() {
            missing.push("age".to_string());
        }

        let place_types = non_blank_set(&self.place_types);
        if place_types.is_empty() {
            missing.push("place_types".to_string());
        }

        let location = self
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        if location.is_none() {
            missing.push("location".to_string());
        }

        let cuisines = non_blank_set(&self.cuisines);
        if cuisines.is_empty() {
            missing.push("cuisines".to_string());
        }

        match (budget, age, location) {
            (Some(budget), Some(age), Some(location)) if missing.is_empty() => {
                Ok(PreferenceInput {
                    budget,
                    age,
                    place_types,
                    location,
                    cuisines,
                })
            }
            _ => Err(missing),
        }
    }
}

fn non_blank_set(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Audit copy of a submission, written whether or not generation succeeds.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PreferenceAudit {
    pub id: i64,
    pub user_id: Uuid,
    pub budget: i64,
    pub age: i64,
    pub place_types: Json<Vec<String>>,
    pub location: String,
    pub cuisines: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct City {
    pub id: Uuid,
    pub name: String,
    pub country: String,
    pub description: String,
    pub image_url: Option<String>,
    pub popularity: i32,
    pub cost_index: i32,
}

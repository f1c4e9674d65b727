use sqlx::PgPool;
use thiserror::Error;
use tripwise_core::models::City;

pub const DEFAULT_COUNTRY: &str = "India";
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;

#[derive(Error, Debug)]
pub enum CityError {
    #[error("query parameter q is required")]
    EmptyQuery,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

pub async fn popular_cities(
    pool: &PgPool,
    country: Option<&str>,
    limit: Option<i64>,
) -> Result<Vec<City>, CityError> {
    let country = country
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_COUNTRY);

    let cities = sqlx::query_as::<_, City>(
        r#"
        SELECT id, name, country, description, image_url, popularity, cost_index
        FROM cities
        WHERE lower(country) = lower($1)
        ORDER BY popularity DESC, name ASC
        LIMIT $2
        "#,
    )
    .bind(country)
    .bind(clamp_limit(limit))
    .fetch_all(pool)
    .await?;

    Ok(cities)
}

pub async fn search_cities(
    pool: &PgPool,
    query: &str,
    limit: Option<i64>,
) -> Result<Vec<City>, CityError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CityError::EmptyQuery);
    }

    let pattern = format!("%{}%", escape_like(query));
    let cities = sqlx::query_as::<_, City>(
        r#"
        SELECT id, name, country, description, image_url, popularity, cost_index
        FROM cities
        WHERE name ILIKE $1 ESCAPE '\' OR country ILIKE $1 ESCAPE '\'
        ORDER BY popularity DESC, name ASC
        LIMIT $2
        "#,
    )
    .bind(pattern)
    .bind(clamp_limit(limit))
    .fetch_all(pool)
    .await?;

    Ok(cities)
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

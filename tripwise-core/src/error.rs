use thiserror::Error;

#[derive(Error, Debug)]
pub enum TripwiseError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown user: {0}")]
    UnknownUser(uuid::Uuid),

    #[error("Other error: {0}")]
    Other(String),
}

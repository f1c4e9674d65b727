use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};
use tripwise_core::{
    ApiKey, GeminiGenerationClient, GenerationConfig, PgItineraryStore, TripwiseConfig,
};

use tripwise_server::http::{self, HttpState};
use tripwise_server::subsystems::planner::Planner;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "tripwise.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Check database connectivity and schema version
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match TripwiseConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    // Connect to DB
    let pool = match tripwise_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    match args.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            tripwise_core::db::run_migrations(&pool).await?;
            println!("✅ Tripwise migrations applied");
            return Ok(());
        }
        Command::Health => {
            match tripwise_core::db::health_check(&pool).await {
                Ok(v) => println!("✅ PostgreSQL connected: {}", v),
                Err(e) => {
                    println!("❌ PostgreSQL connection failed: {}", e);
                    std::process::exit(1);
                }
            }

            match tripwise_core::db::schema_version(&pool).await {
                Ok(Some(v)) => println!("✅ Schema version: {}", v),
                Ok(None) | Err(_) => {
                    println!("❌ Schema not migrated — run `tripwise-server migrate`");
                    std::process::exit(1);
                }
            }

            if ApiKey::from_env().is_some() {
                println!("✅ Generation credential present");
            } else {
                println!("⚠️  No generation credential — itinerary generation will be unavailable");
            }
            return Ok(());
        }
        Command::Serve => {}
    }

    // Credential is read once here and never logged
    let api_key = ApiKey::from_env();
    if api_key.is_none() {
        tracing::warn!(
            "No {} set — preference submissions will fail with generation_unavailable",
            tripwise_core::config::API_KEY_ENV
        );
    }

    let generator = GeminiGenerationClient::new(GenerationConfig::new(api_key, &config.generation))?;
    let planner = Planner::new(
        Arc::new(PgItineraryStore::new(pool.clone())),
        Arc::new(generator),
        config.generation.result_count,
    );

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let state = HttpState {
        pool,
        config,
        planner,
    };
    http::start_http_server(state, tx.subscribe()).await?;

    Ok(())
}

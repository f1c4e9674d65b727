//! tripwise-cli — command-line frontend for the Tripwise HTTP API
//!
//! # Subcommands
//! - `plan --user <id> --budget <n> --age <n> --place-type <t>... --location <l> --cuisine <c>...`
//!   — submit preferences and print the generated itinerary
//! - `itinerary <user_id> [--json]` — print the latest itinerary's destinations
//! - `status`                       — show server health

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "tripwise-cli",
    version,
    about = "Tripwise travel planner — submit preferences and read itineraries"
)]
struct Cli {
    /// Tripwise HTTP server URL (overrides TRIPWISE_HTTP_URL env var)
    #[arg(long, env = "TRIPWISE_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Submit travel preferences and generate an itinerary
    Plan {
        /// User id (UUID) the preferences belong to
        #[arg(long)]
        user: String,

        /// Total budget
        #[arg(long)]
        budget: u32,

        /// Traveller age
        #[arg(long)]
        age: u32,

        /// Preferred kind of place; repeat or comma-separate
        #[arg(long = "place-type", required = true, value_delimiter = ',')]
        place_types: Vec<String>,

        /// Starting location
        #[arg(long)]
        location: String,

        /// Preferred cuisine; repeat or comma-separate
        #[arg(long = "cuisine", required = true, value_delimiter = ',')]
        cuisines: Vec<String>,

        /// Print the raw itinerary JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Show the most recent itinerary for a user
    Itinerary {
        /// User id (UUID)
        user: String,

        /// Print the raw itinerary JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Show Tripwise server status
    Status,
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct PreferenceBody<'a> {
    user_id: &'a str,
    budget: u32,
    age: u32,
    place_types: &'a [String],
    location: &'a str,
    cuisines: &'a [String],
}

/// Stored itinerary as returned by a submission
#[derive(Debug, Deserialize)]
pub struct ItineraryRecord {
    pub id: i64,
    pub user_id: String,
    pub payload: serde_json::Value,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    itinerary: ItineraryRecord,
}

/// One suggested destination inside an itinerary payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceSuggestion {
    pub place_name: String,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub itinerary: Vec<String>,
}

// ============================================================================
// Rendering
// ============================================================================

/// Human-readable summary of an itinerary payload. Elements that do not look
/// like place suggestions are printed as compact JSON.
pub fn render_payload(payload: &serde_json::Value) -> String {
    let items = match payload.as_array() {
        Some(items) => items,
        None => return payload.to_string(),
    };
    if items.is_empty() {
        return "No destinations in this itinerary.".to_string();
    }

    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        match serde_json::from_value::<PlaceSuggestion>(item.clone()) {
            Ok(place) => {
                let cost = place
                    .budget
                    .map(|b| format!(" (₹{:.0})", b))
                    .unwrap_or_default();
                out.push_str(&format!("{}. {}{}\n", i + 1, place.place_name, cost));
                if !place.description.is_empty() {
                    out.push_str(&format!("   {}\n", place.description));
                }
                for day in &place.itinerary {
                    out.push_str(&format!("   - {}\n", day));
                }
            }
            Err(_) => out.push_str(&format!("{}. {}\n", i + 1, item)),
        }
    }
    out
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

fn print_payload(heading: &str, payload: &serde_json::Value, json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(payload)?);
    } else {
        println!("{}\n", heading);
        print!("{}", render_payload(payload));
    }
    Ok(())
}

fn fail_with_body(url: &str, resp: reqwest::blocking::Response) -> ! {
    let status = resp.status();
    let body: serde_json::Value = resp.json().unwrap_or_default();
    let message = body["error"].as_str().unwrap_or("unknown error");
    match body["kind"].as_str() {
        Some(kind) => eprintln!("tripwise-cli: {} returned {} [{}]: {}", url, status, kind, message),
        None => eprintln!("tripwise-cli: {} returned {}: {}", url, status, message),
    }
    if let Some(excerpt) = body["excerpt"].as_str() {
        eprintln!("  model output began: {}", excerpt);
    }
    std::process::exit(1);
}

fn do_plan(server: &str, body: &PreferenceBody<'_>, json_output: bool) -> anyhow::Result<()> {
    // generation can take a while; the server bounds it separately
    let client = client(180)?;
    let url = format!("{}/api/preferences", server);

    let resp = match client.post(&url).json(body).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("tripwise-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        fail_with_body(&url, resp);
    }

    let SubmitResponse { itinerary: record } = resp.json()?;
    let heading = format!(
        "Itinerary #{} for {} ({})",
        record.id, record.user_id, record.created_at
    );
    print_payload(&heading, &record.payload, json_output)
}

fn do_itinerary(server: &str, user: &str, json_output: bool) -> anyhow::Result<()> {
    let client = client(30)?;
    let url = format!("{}/api/itineraries/{}", server, user);

    let resp = match client.get(&url).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("tripwise-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        eprintln!("No itinerary found for {}", user);
        return Ok(());
    }
    if !resp.status().is_success() {
        fail_with_body(&url, resp);
    }

    // the server answers with the bare destination array
    let payload: serde_json::Value = resp.json()?;
    print_payload(&format!("Latest itinerary for {}", user), &payload, json_output)
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = client(10)?;
    let url = format!("{}/health", server);

    match client.get(&url).send() {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Tripwise server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:         {}", body["version"].as_str().unwrap_or("?"));
            println!("PostgreSQL:      {}", body["postgresql"].as_str().unwrap_or("?"));
            println!("Schema:          {}", body["schema_version"]);
        }
        Ok(r) => {
            eprintln!("tripwise-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("tripwise-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Plan {
            user,
            budget,
            age,
            place_types,
            location,
            cuisines,
            json,
        } => {
            let body = PreferenceBody {
                user_id: &user,
                budget,
                age,
                place_types: &place_types,
                location: &location,
                cuisines: &cuisines,
            };
            do_plan(&server, &body, json)
        }
        Commands::Itinerary { user, json } => do_itinerary(&server, &user, json),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("tripwise-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Command-line interface for Agrirelay
//!
//! Provides argument parsing and subcommand handling for the Agrirelay binary.

use clap::{Parser, Subcommand};

/// Chat relay and crop advisor backend for a farmer dashboard
#[derive(Parser)]
#[command(name = "agrirelay")]
#[command(version)]
#[command(about = "Chat relay and crop advisor backend for a farmer dashboard")]
#[command(
    long_about = "Agrirelay streams farmer chat answers from a local text-generation \
    endpoint and serves crop predictions from soil, weather and an external classifier."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Agrirelay Configuration
# ========================
#
# This file configures the HTTP server, the generation endpoint used for chat
# and explanations, the crop classifier, the weather lookup, the market
# price report, and logging.
#
# Environment variables override file values:
#   GENERATION_BASE_URL, GENERATION_MODEL, CROP_MODEL_URL, OPENWEATHER_API_KEY
# RUST_LOG overrides observability.log_level.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# ─────────────────────────────────────────────────────────────────────────────
# GENERATION ENDPOINT
# ─────────────────────────────────────────────────────────────────────────────
#
# An Ollama-compatible server. Chat answers are streamed from
# {base_url}/api/generate as newline-delimited JSON.

[generation]
base_url = "http://localhost:11434"
model = "llama3"

# Time allowed to connect to the endpoint
connect_timeout_seconds = 5

# Total time for non-streaming generations (crop explanations).
# Streaming chat relays are not bounded by this.
request_timeout_seconds = 60

# ─────────────────────────────────────────────────────────────────────────────
# CROP CLASSIFIER
# ─────────────────────────────────────────────────────────────────────────────

[crop]
# Full URL of the classifier. Receives {"N","P","K","TEMP","PH","RAINFALL"}
# and answers {"predicted_crop": "..."}. /predict-crop fails while unset.
# model_url = "http://localhost:5000/predict"
timeout_seconds = 10

# ─────────────────────────────────────────────────────────────────────────────
# WEATHER
# ─────────────────────────────────────────────────────────────────────────────

[weather]
# OpenWeatherMap-compatible API. Without a key, a random temperature is used
# when the caller does not send one.
base_url = "https://api.openweathermap.org/data/2.5"
# api_key = "your-openweather-key"
timeout_seconds = 5

# ─────────────────────────────────────────────────────────────────────────────
# MANDI PRICES
# ─────────────────────────────────────────────────────────────────────────────

[mandi]
# Datewise commodity price report queried by GET /mandi-prices
price_url = "https://agmarknet.gov.in/PriceAndArrivals/DatewiseCommodityReport.aspx/GetPriceData"
timeout_seconds = 15

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}

//! CLI mode implementation
//!
//! Provides command-line access to the suggestion engine

use crate::geocoding::ProviderKind;
use clap::{Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Wayfarer CLI
#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(about = "Address autocomplete for travel-group planning", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Geocoding provider (maps-co, google, mapbox); overrides config and environment
    #[arg(long, global = true)]
    pub provider: Option<ProviderKind>,

    /// Path to a JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Query the geocoding provider directly
    Search(GeocodeArgs),
    /// Show the suggestion list for a query, with local fallbacks
    Suggest(SuggestArgs),
    /// Interactive session: each input line replaces the address text
    Session(SessionArgs),
    /// Print the resolved configuration (credentials redacted)
    Config,
}

/// Geocode tool arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct GeocodeArgs {
    /// Free-text address or place name
    #[arg(short = 'q', long)]
    #[schemars(description = "Free-text address or place name")]
    pub query: String,

    /// Print raw JSON instead of markdown
    #[arg(long)]
    #[serde(default)]
    #[schemars(description = "Return JSON instead of markdown")]
    pub json: bool,
}

/// Suggest tool arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct SuggestArgs {
    /// Text typed so far
    #[arg(short = 'q', long)]
    #[schemars(description = "Text typed into the address field so far")]
    pub query: String,

    /// Print raw JSON instead of markdown
    #[arg(long)]
    #[serde(default)]
    #[schemars(description = "Return JSON instead of markdown")]
    pub json: bool,
}

/// Interactive session arguments
#[derive(Parser, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Initial text of the field
    #[arg(long)]
    pub value: Option<String>,

    /// Placeholder shown while the field is empty
    #[arg(long)]
    pub placeholder: Option<String>,
}

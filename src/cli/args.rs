//! Command-line argument parsing

use crate::api::markets::{DEFAULT_ASSET_LIMIT, DEFAULT_CANDLE_LIMIT, DEFAULT_MARKET_TYPE, DEFAULT_TIMESPAN};
use crate::error::{ClientError, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "market-client")]
#[command(about = "Session-aware client for the market data dashboard API")]
#[command(version, author)]
pub struct Args {
    /// API base URL
    #[arg(
        long = "base-url",
        short = 'b',
        help = "API base URL (defaults to MARKET_API_BASE_URL, then MARKET_API_URL)"
    )]
    pub base_url: Option<String>,

    /// Session storage directory
    #[arg(
        long = "session-dir",
        help = "Directory holding the stored session credential"
    )]
    pub session_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    /// Quiet mode
    #[arg(
        long = "quiet",
        short = 'q',
        conflicts_with = "verbose",
        help = "Only print results and errors"
    )]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start a session with username and password
    Login {
        #[arg(long = "username", short = 'u', help = "Account email or username")]
        username: String,
        #[arg(long = "password", short = 'p', help = "Account password")]
        password: String,
    },
    /// Create an account and start a session
    Register {
        #[arg(long = "username", short = 'u', help = "Account email")]
        username: String,
        #[arg(long = "password", short = 'p', help = "Account password")]
        password: String,
        #[arg(
            long = "field",
            short = 'f',
            value_parser = parse_field,
            help = "Extra profile field as key=value (value may be JSON)"
        )]
        fields: Vec<(String, Value)>,
    },
    /// Show the identity behind the stored session
    Whoami,
    /// End the current session
    Logout,
    /// Show whether a session credential is stored
    Status,
    /// List available markets
    Markets,
    /// Show a market overview
    Overview {
        #[arg(default_value = DEFAULT_MARKET_TYPE)]
        market_type: String,
    },
    /// List assets of a market
    Assets {
        #[arg(default_value = DEFAULT_MARKET_TYPE)]
        market_type: String,
        #[arg(long = "limit", default_value_t = DEFAULT_ASSET_LIMIT)]
        limit: u32,
        #[arg(long = "offset", default_value_t = 0)]
        offset: u32,
    },
    /// Show details of one asset
    Asset { symbol: String },
    /// Fetch price candles for an asset
    Candles {
        symbol: String,
        #[arg(long = "timespan", default_value = DEFAULT_TIMESPAN)]
        timespan: String,
        #[arg(long = "multiplier", default_value_t = 1)]
        multiplier: u32,
        #[arg(long = "limit", default_value_t = DEFAULT_CANDLE_LIMIT)]
        limit: u32,
        #[arg(long = "start-date", help = "Range start, e.g. 2024-01-01")]
        start_date: Option<String>,
        #[arg(long = "end-date", help = "Range end, e.g. 2024-01-31")]
        end_date: Option<String>,
    },
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        match &self.command {
            Command::Login { username, password } | Command::Register { username, password, .. } => {
                if username.trim().is_empty() {
                    return Err(ClientError::Configuration(
                        "Username cannot be empty".to_string(),
                    ));
                }
                if password.is_empty() {
                    return Err(ClientError::Configuration(
                        "Password cannot be empty".to_string(),
                    ));
                }
            }
            Command::Asset { symbol } | Command::Candles { symbol, .. } if symbol.trim().is_empty() => {
                return Err(ClientError::Configuration(
                    "Symbol cannot be empty".to_string(),
                ));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Parse `key=value`, keeping the value as JSON when it parses as such
fn parse_field(raw: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("field name cannot be empty".to_string());
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

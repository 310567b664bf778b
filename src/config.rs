//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured through `dotenvy`
//! before the variables are read.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_BALANCE: f64 = 20000.0;

const DEFAULT_PAYMENT_METHODS: &str = "Efectivo,Tarjeta de Crédito,Tarjeta de Débito,Transferencia";

/// Settings shared by the web server and the terminal client
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the CSV worksheets
    pub data_dir: PathBuf,
    /// Address the web server listens on
    pub bind: String,
    pub ledger_sheet: String,
    pub config_sheet: String,
    /// Base balance used when the configuration worksheet is unusable
    pub default_base_balance: f64,
    pub cache_ttl: Duration,
    /// People who can be marked responsible for an entry
    pub members: Vec<String>,
    pub payment_methods: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            bind: "127.0.0.1:3000".to_string(),
            ledger_sheet: "Movimientos".to_string(),
            config_sheet: "Config".to_string(),
            default_base_balance: DEFAULT_BASE_BALANCE,
            cache_ttl: Duration::ZERO,
            members: Vec::new(),
            payment_methods: split_list(DEFAULT_PAYMENT_METHODS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Self {
            data_dir: env::var("BITACORA_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            bind: env::var("BITACORA_BIND").unwrap_or(defaults.bind),
            ledger_sheet: env::var("BITACORA_LEDGER_SHEET").unwrap_or(defaults.ledger_sheet),
            config_sheet: env::var("BITACORA_CONFIG_SHEET").unwrap_or(defaults.config_sheet),
            default_base_balance: env::var("BITACORA_DEFAULT_BASE_BALANCE")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.default_base_balance),
            cache_ttl: env::var("BITACORA_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            members: env::var("BITACORA_MEMBERS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.members),
            payment_methods: env::var("BITACORA_PAYMENT_METHODS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.payment_methods),
        }
    }
}

/// Splits a comma separated list, dropping blank items
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

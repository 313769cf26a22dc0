//! Runtime configuration read from the environment

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_DATASET: &str = "q-fastapi-llm-query.json";
pub const DEFAULT_CONTACT: &str = "salesq@example.com";

/// Header attached to every response
pub const CONTACT_HEADER: &str = "x-email";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address
    pub addr: SocketAddr,
    /// Dataset file, JSON or Parquet
    pub dataset_path: PathBuf,
    /// Value of the [`CONTACT_HEADER`] response header
    pub contact: String,
    /// Whether permissive CORS headers are added to responses
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            contact: DEFAULT_CONTACT.to_string(),
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    /// Read `SALESQ_ADDR`, `SALESQ_DATASET`, `SALESQ_CONTACT` and `SALESQ_ENABLE_CORS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let addr = parse_socket_addr(lookup("SALESQ_ADDR"), DEFAULT_ADDR)?;
        let dataset_path = lookup("SALESQ_DATASET")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET));
        let contact = lookup("SALESQ_CONTACT").unwrap_or_else(|| DEFAULT_CONTACT.to_string());
        let enable_cors = parse_bool(lookup("SALESQ_ENABLE_CORS"), true)?;

        Ok(Self {
            addr,
            dataset_path,
            contact,
            enable_cors,
        })
    }
}

fn parse_socket_addr(value: Option<String>, default_addr: &str) -> Result<SocketAddr> {
    let raw = value.unwrap_or_else(|| default_addr.to_string());
    raw.parse::<SocketAddr>()
        .with_context(|| format!("invalid socket address: {raw}"))
}

fn parse_bool(value: Option<String>, default_value: bool) -> Result<bool> {
    match value {
        Some(raw) => raw
            .parse::<bool>()
            .with_context(|| format!("invalid bool value: {raw}")),
        None => Ok(default_value),
    }
}

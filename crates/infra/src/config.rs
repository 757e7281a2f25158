//! Store configuration loaded from the environment.

use anyhow::{Context, Result, bail};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./database/database.sqlite";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl StoreConfig {
    /// Read `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS`, falling back to
    /// the defaults when unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS must be an integer, got {raw:?}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        if max_connections == 0 {
            bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Shard id baked into generated ids; one value per process.
    pub shard_id: u16,
    pub feed_page_size: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/social_graph.db".to_string()),
            },
            graph: GraphConfig {
                shard_id: env::var("SHARD_ID")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()
                    .unwrap_or(0),
                feed_page_size: env::var("FEED_PAGE_SIZE")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_is_unset() {
        env::remove_var("DATABASE_URL");
        env::remove_var("SHARD_ID");
        env::remove_var("FEED_PAGE_SIZE");

        let config = Config::from_env().unwrap();
        assert_eq!(config.database.url, "sqlite:data/social_graph.db");
        assert_eq!(config.graph.shard_id, 0);
        assert_eq!(config.graph.feed_page_size, 30);
    }
}

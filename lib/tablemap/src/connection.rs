//! Connection configuration shared by the backends.

use async_trait::async_trait;

use crate::DaoError;

/// Pool size used when the configuration does not name one.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 16;

/// Connection configuration for database backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionConfig {
    /// Connect using a database URL string.
    Url(String),
    /// Connect using a URL and an explicit pool size.
    Pool { url: String, max_connections: u32 },
}

impl ConnectionConfig {
    pub fn url(&self) -> &str {
        match self {
            ConnectionConfig::Url(url) | ConnectionConfig::Pool { url, .. } => url,
        }
    }

    pub fn max_connections(&self) -> u32 {
        match self {
            ConnectionConfig::Url(_) => DEFAULT_MAX_CONNECTIONS,
            ConnectionConfig::Pool {
                max_connections, ..
            } => (*max_connections).max(1),
        }
    }
}

impl From<&str> for ConnectionConfig {
    fn from(url: &str) -> Self {
        ConnectionConfig::Url(url.to_string())
    }
}

impl From<String> for ConnectionConfig {
    fn from(url: String) -> Self {
        ConnectionConfig::Url(url)
    }
}

impl From<&String> for ConnectionConfig {
    fn from(url: &String) -> Self {
        ConnectionConfig::Url(url.clone())
    }
}

/// Trait for building an executor from configuration.
#[async_trait]
pub trait Connect: Sized + Send + Sync {
    /// Connect to the database using the provided configuration.
    async fn connect(config: impl Into<ConnectionConfig> + Send) -> Result<Self, DaoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_config_uses_default_pool_size() {
        let config = ConnectionConfig::from("sqlite::memory:");
        assert_eq!(config.url(), "sqlite::memory:");
        assert_eq!(config.max_connections(), DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn pool_config_never_drops_below_one() {
        let config = ConnectionConfig::Pool {
            url: "postgres://localhost/shop".to_string(),
            max_connections: 0,
        };
        assert_eq!(config.max_connections(), 1);
    }
}

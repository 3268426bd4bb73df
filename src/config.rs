//! Configuration handling for firebird-query.
//!
//! Configuration is an explicit struct handed to [`Pool::new`](crate::pool::Pool::new)
//! or [`Client::new`](crate::client::Client::new). Reading environment variables
//! or CLI flags is the embedding application's job, not this crate's.

pub const DEFAULT_PORT: u16 = 3050;
pub const DEFAULT_USER: &str = "SYSDBA";

// Pool configuration defaults
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Connection and pool configuration for a Firebird database.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Database server host.
    pub host: String,
    /// Database server port (default: 3050).
    pub port: u16,
    /// Database path or alias on the server.
    pub database: String,
    /// User name (default: "SYSDBA").
    pub user: String,
    /// Password (sensitive - never logged).
    pub password: String,
    /// Maximum concurrent physical connections (default: 10).
    pub max_connections: u32,
    /// Log every statement at debug level before dispatch (default: false).
    pub log_queries: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            database: String::new(),
            user: DEFAULT_USER.to_string(),
            password: String::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            log_queries: false,
        }
    }
}

impl Config {
    /// Create a configuration for the given host and database, with defaults
    /// for everything else.
    pub fn new(host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("host must not be empty".to_string());
        }
        if self.database.is_empty() {
            return Err("database path or alias must not be empty".to_string());
        }
        if self.max_connections == 0 {
            return Err("max_connections must be greater than 0".to_string());
        }
        Ok(())
    }
}

use std::fmt;

use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

const DATABASE_KEYS: [&str; 5] = ["DB_USER", "DB_PASSWORD", "DB_NAME", "DB_HOST", "DB_PORT"];

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub host: String,
    pub port: u16,
}

/// Raw connection parameters. Values are passed through untouched; a bad
/// port only surfaces once connection options are assembled.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    pub name: String,
    pub host: String,
    pub port: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Fails only when no database key is present at all. A single unset
    /// key reads as an empty string, same as an explicitly empty one.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if DATABASE_KEYS.iter().all(|key| lookup(key).is_none()) {
            anyhow::bail!(
                "no database configuration found: set {} or provide a .env file",
                DATABASE_KEYS.join(", ")
            );
        }
        let value = |key: &str| lookup(key).unwrap_or_default();

        Ok(Self {
            database: DatabaseConfig {
                user: value("DB_USER"),
                password: value("DB_PASSWORD"),
                name: value("DB_NAME"),
                host: value("DB_HOST"),
                port: value("DB_PORT"),
            },
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
        })
    }
}

impl DatabaseConfig {
    /// Plain-text credentials, TLS disabled.
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        let port: u16 = self
            .port
            .parse()
            .with_context(|| format!("DB_PORT {:?} is not a valid port", self.port))?;

        Ok(PgConnectOptions::new()
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .host(&self.host)
            .port(port)
            .ssl_mode(PgSslMode::Disable))
    }
}

// Never print the password.
impl fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.name)
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

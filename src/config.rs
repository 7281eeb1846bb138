use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use snafu::{ResultExt, Snafu};
use url::Url;

use crate::database::{Credentials, DatabaseConfig, RetryPolicy};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("invalid environment configuration: {source}"))]
    Environment { source: envy::Error },
    #[snafu(display("`{endpoint}` is not a valid database endpoint: {source}"))]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },
}

/// Process configuration, read once at startup.
#[derive(Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address", default = "default_host")]
    pub host: SocketAddr,

    pub db_host: String,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    #[serde(default = "default_namespace")]
    pub db_namespace: String,

    #[serde(default = "default_attempts")]
    pub db_connect_attempts: u32,
    #[serde(default = "default_delay", deserialize_with = "human_duration")]
    pub db_connect_delay: Duration,

    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        envy::from_env::<Config>().context(EnvironmentSnafu)
    }

    pub fn from_vars<I>(vars: I) -> Result<Config, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).context(EnvironmentSnafu)
    }

    /// Bare `host:port` values are treated as `http://host:port`.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let endpoint = if self.db_host.contains("://") {
            self.db_host.clone()
        } else {
            format!("http://{}", self.db_host)
        };

        Url::parse(&endpoint).context(InvalidEndpointSnafu { endpoint })
    }

    pub fn database(&self) -> Result<DatabaseConfig, ConfigError> {
        Ok(DatabaseConfig {
            endpoint: self.endpoint()?,
            namespace: self.db_namespace.clone(),
            database: self.db_name.clone(),
            credentials: Credentials::new(self.db_user.clone(), self.db_password.clone()),
            retry: RetryPolicy::new(self.db_connect_attempts, self.db_connect_delay),
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("db_host", &self.db_host)
            .field("db_user", &self.db_user)
            .field("db_password", &"[REDACTED]")
            .field("db_name", &self.db_name)
            .field("db_namespace", &self.db_namespace)
            .field("db_connect_attempts", &self.db_connect_attempts)
            .field("db_connect_delay", &self.db_connect_delay)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

fn default_host() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5005))
}

fn default_namespace() -> String {
    "views".to_string()
}

fn default_attempts() -> u32 {
    RetryPolicy::default().attempts
}

fn default_delay() -> Duration {
    RetryPolicy::default().delay
}

fn human_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

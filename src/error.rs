use std::net::SocketAddr;

use snafu::{Location, Snafu};

use crate::config::ConfigError;
use crate::database::DatabaseError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApplicationError {
    /// could not read the configuration from the environment
    ConfigLoad {
        source: ConfigError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not initialize the logger
    InitializeLogger {
        source: tracing::subscriber::SetGlobalDefaultError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not reach the database during startup
    ConnectDatabase {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not create the tables
    InitSchema {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not bind to the given address, check if it's already in use
    BindAddress {
        address: SocketAddr,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not serve the application
    WebServer {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

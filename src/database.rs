use derive_new::new;
use snafu::{Location, ResultExt as _, Snafu};
use surrealdb::{
    engine::any::{self, Any},
    opt::auth::{self, Jwt, Signin},
    Surreal,
};
use tracing::instrument;
use url::Url;

/// Query builder over a [Connection].
pub mod query;

/// Bounded retry with a fixed delay.
pub mod retry;

/// Table definitions applied at startup.
pub mod schema;

pub use query::Query;
pub use retry::{retry, RetryPolicy};

pub type Result<T, E = DatabaseError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DatabaseError {
    #[snafu(display("cannot connect to the database `{endpoint}` at {location}: {source}"))]
    Connect {
        endpoint: Url,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("cannot sign in to the database as `{username}` at {location}: {source}"))]
    SignIn {
        username: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("cannot select `{namespace}/{database}` at {location}: {source}"))]
    UseNamespace {
        namespace: String,
        database: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("unable to connect to the database after {attempts} attempts: {source}"))]
    Unavailable {
        attempts: u32,
        #[snafu(source(from(DatabaseError, Box::new)))]
        source: Box<DatabaseError>,
    },
    #[snafu(display("failed to query the database at {location}: {source}"))]
    DatabaseQuery {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to deserialize the database response at {location}: {source}"))]
    DatabaseDeserialize {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

impl DatabaseError {
    /// The backend could not be reached at all, as opposed to a statement failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DatabaseError::Unavailable { .. })
    }
}

/// User and password used to sign in to a remote database.
#[derive(Clone, PartialEq, Eq, new)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub endpoint: Url,
    pub namespace: String,
    pub database: String,
    pub credentials: Credentials,
    pub retry: RetryPolicy,
}

impl DatabaseConfig {
    /// An in-process `mem://` database, used by tests and local runs.
    pub fn embedded(database: impl Into<String>) -> DatabaseConfig {
        DatabaseConfig {
            endpoint: Url::parse("mem://").expect("`mem://` is a valid url"),
            namespace: "views".to_string(),
            database: database.into(),
            credentials: Credentials::new(String::new(), String::new()),
            retry: RetryPolicy::default(),
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.endpoint.scheme() == "mem"
    }

    fn auth(&self) -> impl auth::Credentials<Signin, Jwt> + '_ {
        auth::Database {
            namespace: &self.namespace,
            database: &self.database,
            username: &self.credentials.username,
            password: &self.credentials.password,
        }
    }
}

#[derive(Debug, Clone)]
enum Backend {
    /// Every connection is a new client to a database server.
    Remote,
    /// An in-memory datastore is lost once its last handle is dropped, so it is opened once and shared.
    Embedded(Surreal<Any>),
}

/// Hands out one [Connection] per request.
#[derive(Debug, Clone)]
pub struct Connector {
    config: DatabaseConfig,
    backend: Backend,
}

impl Connector {
    pub async fn open(config: DatabaseConfig) -> Result<Connector> {
        let backend = if config.is_embedded() {
            let client = establish_embedded(&config).await?;
            Backend::Embedded(client)
        } else {
            Backend::Remote
        };

        Ok(Connector { config, backend })
    }

    /// Opens a connection, retrying according to the configured [RetryPolicy]. Each failed attempt is logged.
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint))]
    pub async fn connect(&self) -> Result<Connection> {
        let client = match &self.backend {
            Backend::Embedded(client) => client.clone(),
            Backend::Remote => {
                let policy = &self.config.retry;
                retry(policy, || establish_remote(&self.config))
                    .await
                    .context(UnavailableSnafu {
                        attempts: policy.attempts(),
                    })?
            }
        };

        tracing::trace!("acquired database connection");
        Ok(Connection::new(client))
    }
}

async fn establish_remote(config: &DatabaseConfig) -> Result<Surreal<Any>> {
    let client = any::connect(config.endpoint.as_str())
        .await
        .context(ConnectSnafu {
            endpoint: config.endpoint.clone(),
        })?;

    client.signin(config.auth()).await.context(SignInSnafu {
        username: config.credentials.username.clone(),
    })?;

    use_namespace(&client, config).await?;
    Ok(client)
}

async fn establish_embedded(config: &DatabaseConfig) -> Result<Surreal<Any>> {
    let client = any::connect(config.endpoint.as_str())
        .await
        .context(ConnectSnafu {
            endpoint: config.endpoint.clone(),
        })?;

    use_namespace(&client, config).await?;
    Ok(client)
}

async fn use_namespace(client: &Surreal<Any>, config: &DatabaseConfig) -> Result<()> {
    client
        .use_ns(&config.namespace)
        .use_db(&config.database)
        .await
        .context(UseNamespaceSnafu {
            namespace: config.namespace.clone(),
            database: config.database.clone(),
        })
}

/// A request-scoped database handle. The underlying client is closed when the last handle is dropped.
#[derive(Debug, new)]
pub struct Connection {
    client: Surreal<Any>,
}

impl Connection {
    /// Create a builder to execute SurrealQL on the database.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let counts: Vec<u64> = connection
    ///     .sql("SELECT VALUE view_count FROM views WHERE view_count > $min")
    ///     .bind(("min", 10))
    ///     .fetch()
    ///     .await?;
    /// ```
    pub fn sql(&self, query: &str) -> Query<'_> {
        Query::new(self.client.query(query))
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        tracing::trace!("released database connection");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn embedded_connections_share_data() {
        let connector = Connector::open(DatabaseConfig::embedded("shared"))
            .await
            .unwrap();

        let first = connector.connect().await.unwrap();
        first
            .sql("CREATE counters:one SET value = 1")
            .execute()
            .await
            .unwrap();
        drop(first);

        let second = connector.connect().await.unwrap();
        let values: Vec<i64> = second
            .sql("SELECT VALUE value FROM counters")
            .fetch()
            .await
            .unwrap();
        assert_eq!(values, vec![1]);
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        let config = DatabaseConfig {
            endpoint: Url::parse("http://127.0.0.1:1").unwrap(),
            namespace: "views".to_string(),
            database: "test".to_string(),
            credentials: Credentials::new("viewer".to_string(), "secret".to_string()),
            retry: RetryPolicy::new(2, Duration::from_millis(10)),
        };
        let connector = Connector::open(config).await.unwrap();

        let error = connector.connect().await.unwrap_err();
        assert!(error.is_unavailable(), "unexpected error: {error}");
        assert!(matches!(error, DatabaseError::Unavailable { attempts: 2, .. }));
    }

    #[test]
    fn credentials_hide_password() {
        let credentials = Credentials::new("viewer".to_string(), "hunter2".to_string());
        assert!(!format!("{credentials:?}").contains("hunter2"));
    }
}

use dotenvy::dotenv;
use snafu::ResultExt;
use tokio::net::TcpListener;

use view_counter::api::{create_router, App};
use view_counter::config::Config;
use view_counter::database::{schema, Connector};
use view_counter::error::*;
use view_counter::logger;

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = Config::from_env().context(ConfigLoadSnafu)?;
    let database = config.database().context(ConfigLoadSnafu)?;

    let _guard = logger::init(&config)?;
    tracing::info!(?config, "starting view counter");

    let connector = Connector::open(database)
        .await
        .context(ConnectDatabaseSnafu)?;
    {
        let connection = connector.connect().await.context(ConnectDatabaseSnafu)?;
        schema::init(&connection).await.context(InitSchemaSnafu)?;
    }

    let router = create_router(App::new(connector));

    let listener = TcpListener::bind(config.host)
        .await
        .context(BindAddressSnafu {
            address: config.host,
        })?;
    tracing::info!("listening on {}", config.host);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context(WebServerSnafu)
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "cannot listen for the shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutting down");
}

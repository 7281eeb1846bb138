use derive_new::new;

use crate::database::{self, Connection, Connector};

/// Shared state of the HTTP handlers.
#[derive(Debug, Clone, new)]
pub struct App {
    connector: Connector,
}

impl App {
    /// A connection for the current request. It is released when the handler drops it.
    pub async fn connect(&self) -> database::Result<Connection> {
        self.connector.connect().await
    }
}

use serde::de::DeserializeOwned;
use snafu::ResultExt;
use surrealdb::{engine::any::Any, opt::QueryResult};

use super::*;

/// Pending SurrealQL statements. Parameters can be bound using the [bind](Query::bind) method which takes any serializable data structure.
#[derive(Debug, new)]
pub struct Query<'a> {
    query: surrealdb::method::Query<'a, Any>,
}

impl Query<'_> {
    pub fn bind(mut self, params: impl serde::Serialize) -> Self {
        let query = self.query;
        self.query = query.bind(params);
        self
    }

    /// Execute the statements and fail if any of them failed.
    ///
    /// When the statements are wrapped in a transaction, a failure of one statement cancels the others.
    pub async fn execute(self) -> Result<surrealdb::Response> {
        let response = self.query.await.context(DatabaseQuerySnafu)?;
        let response = response.check().context(DatabaseQuerySnafu)?;
        tracing::debug!(statements = response.num_statements(), "executed query");
        Ok(response)
    }

    /// Execute the statements and deserialize the result of the first one.
    ///
    /// `T` can be either a single value (`Option<T>`) or a collection of values (`Vec<T>`).
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<T>
    where
        usize: QueryResult<T>,
    {
        let mut response = self.execute().await?;
        let result = response.take::<T>(0).context(DatabaseDeserializeSnafu)?;
        Ok(result)
    }
}

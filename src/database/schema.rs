use tracing::instrument;

use super::*;

const SCHEMA: &str = include_str!("../../schema.surrealql");

/// Defines the `videos` and `views` tables. Running it against an initialized database changes nothing.
#[instrument(skip_all)]
pub async fn init(connection: &Connection) -> Result<()> {
    connection.sql(SCHEMA).execute().await?;
    tracing::info!("database schema is ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connection() -> Connection {
        let connector = Connector::open(DatabaseConfig::embedded("schema"))
            .await
            .unwrap();
        connector.connect().await.unwrap()
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let connection = connection().await;

        init(&connection).await.unwrap();
        init(&connection).await.unwrap();
    }

    #[tokio::test]
    async fn keeps_existing_rows() {
        let connection = connection().await;
        init(&connection).await.unwrap();

        connection
            .sql("CREATE videos:intro SET title = 'Intro'")
            .execute()
            .await
            .unwrap();
        init(&connection).await.unwrap();

        let titles: Vec<String> = connection
            .sql("SELECT VALUE title FROM videos")
            .fetch()
            .await
            .unwrap();
        assert_eq!(titles, vec!["Intro".to_string()]);
    }

    #[tokio::test]
    async fn rejects_empty_titles() {
        let connection = connection().await;
        init(&connection).await.unwrap();

        let result = connection
            .sql("CREATE videos:blank SET title = ''")
            .execute()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn rejects_negative_counts() {
        let connection = connection().await;
        init(&connection).await.unwrap();

        connection
            .sql("CREATE videos:intro SET title = 'Intro'")
            .execute()
            .await
            .unwrap();
        let result = connection
            .sql("CREATE views SET video_id = videos:intro, view_count = -1")
            .execute()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn rejects_counters_of_missing_videos() {
        let connection = connection().await;
        init(&connection).await.unwrap();

        let result = connection
            .sql("CREATE views SET video_id = videos:ghost, view_count = 0")
            .execute()
            .await;
        assert!(result.is_err());

        let counters: Vec<u64> = connection
            .sql("SELECT VALUE view_count FROM views")
            .fetch()
            .await
            .unwrap();
        assert!(counters.is_empty());
    }
}

use serde::Deserialize;
use snafu::{Location, OptionExt as _, ResultExt as _, Snafu};
use tracing::instrument;

use crate::database::{Connection, DatabaseError};
use crate::model::{Video, VideoId, ViewRecord, Viewed};

pub type Result<T, E = VideoError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum VideoError {
    #[snafu(display("Video ID and title are required"))]
    InvalidInput {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Video not found"))]
    NotFound {
        video_id: String,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("database operation failed at {location}: {source}"))]
    Backend {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },
}

/// A validated registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVideo {
    pub id: VideoId,
    pub title: String,
}

impl NewVideo {
    /// Both fields must be present and non-empty.
    pub fn parse(video_id: Option<&str>, title: Option<&str>) -> Result<NewVideo> {
        let id = video_id
            .and_then(|id| id.parse::<VideoId>().ok())
            .context(InvalidInputSnafu)?;
        let title = title
            .filter(|title| !title.is_empty())
            .context(InvalidInputSnafu)?;

        Ok(NewVideo {
            id,
            title: title.to_string(),
        })
    }
}

const REGISTER: &str = "
    BEGIN TRANSACTION;
    CREATE type::thing('videos', $id) SET title = $title;
    CREATE views SET video_id = type::thing('videos', $id), view_count = 0;
    COMMIT TRANSACTION;
";

/// Creates the video together with a zeroed view counter. Either both rows are written or neither is.
///
/// Registering an id twice fails with [VideoError::Backend].
#[instrument(skip(db))]
pub async fn register(video: NewVideo, db: &Connection) -> Result<VideoId> {
    db.sql(REGISTER)
        .bind(("id", video.id.as_str()))
        .bind(("title", video.title.as_str()))
        .execute()
        .await
        .context(BackendSnafu)?;

    tracing::info!(video_id = %video.id, "registered video");
    Ok(video.id)
}

#[derive(Debug, Deserialize)]
struct Counter {
    view_count: u64,
}

/// Adds one view and returns the counter as left by this increment.
///
/// The increment and the read are the same statement, so a concurrent view of the same video is never
/// included in the returned count, although it is in the stored one.
#[instrument(skip(db))]
pub async fn record_view(video_id: &VideoId, db: &Connection) -> Result<Viewed> {
    let title: Option<String> = db
        .sql("SELECT VALUE title FROM type::thing('videos', $id)")
        .bind(("id", video_id.as_str()))
        .fetch()
        .await
        .context(BackendSnafu)?;

    let title = title.context(NotFoundSnafu {
        video_id: video_id.as_str(),
    })?;

    let counter: Option<Counter> = db
        .sql("UPDATE views SET view_count += 1 WHERE video_id = type::thing('videos', $id) RETURN AFTER")
        .bind(("id", video_id.as_str()))
        .fetch()
        .await
        .context(BackendSnafu)?;

    let views = counter
        .context(NotFoundSnafu {
            video_id: video_id.as_str(),
        })?
        .view_count;

    tracing::debug!(%video_id, views, "recorded view");
    Ok(Viewed { title, views })
}

/// Every registered video, in whatever order the database returns them.
#[instrument(skip(db))]
pub async fn list_videos(db: &Connection) -> Result<Vec<Video>> {
    db.sql("SELECT meta::id(id) AS id, title FROM videos")
        .fetch()
        .await
        .context(BackendSnafu)
}

#[instrument(skip(db))]
pub async fn get_views(video_id: &VideoId, db: &Connection) -> Result<ViewRecord> {
    let view_count: Option<u64> = db
        .sql("SELECT VALUE view_count FROM views WHERE video_id = type::thing('videos', $id)")
        .bind(("id", video_id.as_str()))
        .fetch()
        .await
        .context(BackendSnafu)?;

    let view_count = view_count.context(NotFoundSnafu {
        video_id: video_id.as_str(),
    })?;

    Ok(ViewRecord {
        video_id: video_id.clone(),
        view_count,
    })
}

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use snafu::OptionExt as _;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::model::VideoId;
use crate::service::video::{self, NewVideo, NotFoundSnafu, VideoError};

mod error;
mod state;

pub use error::*;
pub use state::*;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

pub fn create_router(app: App) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .route("/view/:video_id", post(view))
        .route("/videos", get(videos))
        .route("/views/:video_id", get(views))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

#[derive(Debug, Deserialize)]
pub struct UploadForm {
    pub video_id: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Uploaded {
    pub message: String,
    pub video_id: VideoId,
}

#[instrument(skip(app))]
async fn upload(
    State(app): State<App>, Form(form): Form<UploadForm>,
) -> Result<(StatusCode, Json<Uploaded>)> {
    let video = NewVideo::parse(form.video_id.as_deref(), form.title.as_deref())?;

    let db = app.connect().await?;
    let video_id = video::register(video, &db).await?;

    let body = Uploaded {
        message: "Video uploaded successfully".to_string(),
        video_id,
    };
    Ok((StatusCode::CREATED, Json(body)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewResponse {
    pub message: String,
    pub views: u64,
}

#[instrument(skip(app))]
async fn view(State(app): State<App>, Path(video_id): Path<String>) -> Result<Json<ViewResponse>> {
    let video_id = lookup_id(&video_id)?;

    let db = app.connect().await?;
    let viewed = video::record_view(&video_id, &db).await?;

    Ok(Json(ViewResponse {
        message: format!("Video '{}' viewed", viewed.title),
        views: viewed.views,
    }))
}

#[instrument(skip(app))]
async fn videos(State(app): State<App>) -> Result<Json<Vec<(VideoId, String)>>> {
    let db = app.connect().await?;
    let videos = video::list_videos(&db).await?;

    Ok(Json(videos.into_iter().map(|video| video.into_pair()).collect()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewsResponse {
    pub video_id: VideoId,
    pub views: u64,
}

#[instrument(skip(app))]
async fn views(State(app): State<App>, Path(video_id): Path<String>) -> Result<Json<ViewsResponse>> {
    let video_id = lookup_id(&video_id)?;

    let db = app.connect().await?;
    let record = video::get_views(&video_id, &db).await?;

    Ok(Json(ViewsResponse {
        video_id: record.video_id,
        views: record.view_count,
    }))
}

/// An id that cannot be parsed cannot have been registered either.
fn lookup_id(video_id: &str) -> Result<VideoId, VideoError> {
    video_id.parse().ok().context(NotFoundSnafu { video_id })
}

use crate::jobs::{spawn_worker, JobRequest, JobStatus, JobTable};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path as AxumPath, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use image_processing::ProcessOptions;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

/// Upload size limit.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const ENDPOINTS: [&str; 5] = [
    "/api/upload",
    "/api/process",
    "/api/status/{jobId}",
    "/api/jobs",
    "/api/download/{filename}",
];

#[derive(Clone)]
pub struct AppState {
    pub jobs: JobTable,
    queue: mpsc::UnboundedSender<JobRequest>,
    uploads_dir: PathBuf,
    light_delay: Duration,
    heavy_delay: Duration,
}

impl AppState {
    /// Build the state and start the single processing worker. Needs a Tokio runtime.
    pub fn new(uploads_dir: PathBuf, light_delay: Duration, heavy_delay: Duration) -> Self {
        let jobs = JobTable::default();
        let (queue, rx) = mpsc::unbounded_channel();
        spawn_worker(jobs.clone(), rx);
        Self {
            jobs,
            queue,
            uploads_dir,
            light_delay,
            heavy_delay,
        }
    }
}

/// Accept only bare file names so requests cannot leave the uploads directory.
fn plain_file_name(name: &str) -> Option<&str> {
    match Path::new(name).file_name() {
        Some(n) if n == name => Some(name),
        _ => None,
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn get_root() -> impl IntoResponse {
    Json(json!({ "status": "ok", "message": "Image Processing API" }))
}

async fn get_api() -> impl IntoResponse {
    Json(json!({ "status": "ok", "endpoints": ENDPOINTS }))
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_id: String,
    pub image_name: String,
    pub filename: String,
    pub path: String,
}

async fn post_upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Response {
    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    }

    let filename = params.filename.unwrap_or_default();
    let ext = Path::new(&filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let image_id = Uuid::new_v4().to_string();
    let image_name = format!("{image_id}{ext}");
    let path = state.uploads_dir.join(&image_name);

    if let Err(e) = tokio::fs::write(&path, &body).await {
        log::error!("upload: failed to store {}: {e}", path.display());
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store upload");
    }
    log::info!("upload: stored {} ({} bytes)", path.display(), body.len());

    (
        StatusCode::OK,
        Json(UploadResponse {
            image_id,
            image_name,
            filename,
            path: path.display().to_string(),
        }),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub image_id: String,
    #[serde(default)]
    pub light: bool,
    #[serde(default)]
    pub heavy: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub job_id: String,
    pub status: JobStatus,
}

async fn post_process(State(state): State<AppState>, Json(req): Json<ProcessRequest>) -> Response {
    let Some(name) = plain_file_name(&req.image_id) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid image id");
    };

    let image_path = state.uploads_dir.join(name);
    if !tokio::fs::try_exists(&image_path).await.unwrap_or(false) {
        return error_response(StatusCode::NOT_FOUND, "Image not found");
    }

    let job_id = Uuid::new_v4().to_string();
    let job = state.jobs.start(&job_id).await;

    let request = JobRequest {
        id: job_id.clone(),
        image_path,
        options: ProcessOptions {
            light: req.light,
            heavy: req.heavy,
            light_delay: state.light_delay,
            heavy_delay: state.heavy_delay,
        },
    };
    if state.queue.send(request).is_err() {
        let message = "Processing worker is not running";
        state.jobs.fail(&job_id, message.into()).await;
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, message);
    }
    log::info!(
        "process: queued job {job_id} for {name} (light={}, heavy={})",
        req.light,
        req.heavy
    );

    (
        StatusCode::OK,
        Json(ProcessResponse {
            job_id,
            status: job.status,
        }),
    )
        .into_response()
}

async fn get_status(State(state): State<AppState>, AxumPath(job_id): AxumPath<String>) -> Response {
    match state.jobs.get(&job_id).await {
        Some(job) => (StatusCode::OK, Json(job)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Job not found"),
    }
}

async fn get_jobs(State(state): State<AppState>) -> Response {
    (StatusCode::OK, Json(state.jobs.list().await)).into_response()
}

async fn get_download(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Response {
    let Some(name) = plain_file_name(&filename) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid file name");
    };

    let path = state.uploads_dir.join(name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return error_response(StatusCode::NOT_FOUND, "File not found");
        }
        Err(e) => {
            log::error!("download: failed to read {}: {e}", path.display());
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file");
        }
    };

    let content_type = image::ImageFormat::from_path(&path)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/", get(get_root))
        .route("/api", get(get_api))
        .route("/api/upload", post(post_upload))
        .route("/api/process", post(post_process))
        .route("/api/status/{job_id}", get(get_status))
        .route("/api/jobs", get(get_jobs))
        .route("/api/download/{filename}", get(get_download))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
}

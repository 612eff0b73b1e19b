//! HTTP boundary. Handlers stay thin: parse the request body, run the
//! extraction engine, shape the JSON or stream the bytes. All duration
//! formatting and variant defaulting happens here, not in the pipeline.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

use crate::core::{
    format_duration, ExtractError, ExtractorEngine, FileFetcher, Platform, TempVideo,
    VariantUrls, VideoRecord,
};
use crate::utils::attachment_filename;

pub struct AppState {
    pub engine: ExtractorEngine,
    pub fetcher: FileFetcher,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/video-info", post(video_info))
        .route("/api/download", post(download))
        .route("/api/proxy-video", post(proxy_video))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    info!("listening on {host}:{port}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => error!(%err, "failed to install signal handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}

// Wraps the pipeline error so axum knows how to render it.
#[derive(Debug)]
struct HttpError(ExtractError);

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            debug!(error = %self.0, "request rejected");
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self.0, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<ExtractError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Deserialize)]
struct VideoInfoRequest {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct DownloadRequest {
    #[serde(default)]
    url: String,
    quality: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProxyRequest {
    #[serde(default)]
    url: String,
}

async fn video_info(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VideoInfoRequest>,
) -> Result<Json<Value>, HttpError> {
    let (platform, record) = state.engine.extract(&payload.url).await?;
    Ok(Json(json!({
        "success": true,
        "platform": platform.as_str(),
        "data": format_video_response(&record),
    })))
}

async fn download(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DownloadRequest>,
) -> Result<Response, HttpError> {
    let (platform, record) = state.engine.extract(&payload.url).await?;

    let quality = payload.quality.unwrap_or_else(|| {
        match platform {
            Platform::Tiktok => "no_watermark",
            Platform::Facebook => "auto",
        }
        .to_string()
    });
    let video_url = record.urls.select_variant(&quality)?.to_string();

    let temp = state
        .fetcher
        .download_to_temp(&video_url, platform.referer())
        .await?;
    let filename = attachment_filename(platform, &record.video_id, &quality);
    info!(platform = %platform, video_id = record.video_id, quality, "serving download");

    let TempVideo { file, path, size } = temp;
    // Moving the TempPath into the stream keeps the file on disk until the
    // client has consumed the body, then deletes it.
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _held = &path;
        chunk
    });

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::CONTENT_LENGTH, size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|err| ExtractError::Internal(anyhow::Error::new(err)))?;
    Ok(response)
}

/// Streams a resolved media URL back inline, for the preview player. The
/// body bytes pass through without buffering to disk.
async fn proxy_video(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProxyRequest>,
) -> Result<Response, HttpError> {
    let url = payload.url.trim();
    if url.is_empty() {
        return Err(ExtractError::InvalidInput("URL is required".to_string()).into());
    }

    let referer = Platform::detect(url)
        .unwrap_or(Platform::Tiktok)
        .referer();
    let upstream = state.fetcher.open_stream(url, referer).await?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "video/mp4")
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|err| ExtractError::Internal(anyhow::Error::new(err)))?;
    Ok(response)
}

async fn health() -> Json<Value> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": timestamp,
        "supported_platforms": ["tiktok", "facebook"],
    }))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "endpoint not found" })),
    )
}

/// Client-facing record shape. Durations become "m:ss" strings here and
/// nowhere else.
fn format_video_response(record: &VideoRecord) -> Value {
    let urls = match &record.urls {
        VariantUrls::Tiktok {
            no_watermark,
            watermark,
            preview,
        } => json!({
            "no_watermark": no_watermark,
            "watermark": watermark,
            "preview": preview,
        }),
        VariantUrls::Facebook { hd, sd, auto } => json!({
            "hd": hd,
            "sd": sd,
            "auto": auto,
            "preview": auto,
        }),
    };

    let available: serde_json::Map<String, Value> = record
        .urls
        .available_formats()
        .into_iter()
        .map(|(name, present)| (name.to_string(), Value::Bool(present)))
        .collect();

    json!({
        "video_id": record.video_id,
        "title": record.title,
        "author": record.author,
        "duration": format_duration(record.duration_ms),
        "thumbnail": record.thumbnail,
        "width": record.width,
        "height": record.height,
        "urls": urls,
        "available_formats": available,
        "stats": {
            "views": record.views,
            "likes": record.likes,
            "shares": record.shares,
        },
    })
}

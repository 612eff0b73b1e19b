use std::io::SeekFrom;
use std::time::Duration;

use anyhow::Context;
use futures::StreamExt;
use reqwest::header;
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info};

use crate::core::ExtractError;

const VIDEO_ACCEPT: &str =
    "video/webm,video/ogg,video/*;q=0.9,application/ogg;q=0.7,audio/*;q=0.6,*/*;q=0.5";

/// A downloaded video held in a response-scoped temporary file.
///
/// The file on disk lives exactly as long as the `TempPath`: the serving
/// layer moves `path` into the response body stream, so the file is deleted
/// when the body is dropped, whether or not the client read it to the end.
#[derive(Debug)]
pub struct TempVideo {
    pub file: File,
    pub path: TempPath,
    pub size: u64,
}

/// Streams resolved media URLs, either to a temporary file for attachment
/// downloads or straight through as a proxy response.
pub struct FileFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl FileFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetch a resolved video URL into a fresh temporary file, claiming the
    /// platform's own site as referer. The returned handle is rewound so
    /// the caller can stream it back immediately.
    pub async fn download_to_temp(
        &self,
        video_url: &str,
        referer: &str,
    ) -> Result<TempVideo, ExtractError> {
        let response = self
            .client
            .get(video_url)
            .header(header::REFERER, referer)
            .header(header::ACCEPT, VIDEO_ACCEPT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| ExtractError::DownloadFailed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::DownloadFailed(format!(
                "upstream returned HTTP {status}"
            )));
        }

        let temp = tempfile::Builder::new()
            .prefix("grab-")
            .suffix(".mp4")
            .tempfile()
            .context("failed to create temporary file")?;
        let (std_file, path) = temp.into_parts();
        let mut file = File::from_std(std_file);

        let mut size: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| ExtractError::DownloadFailed(err.to_string()))?;
            size += chunk.len() as u64;
            file.write_all(&chunk)
                .await
                .context("failed to write video chunk to disk")?;
        }
        file.flush().await.context("failed to flush video file")?;
        file.seek(SeekFrom::Start(0))
            .await
            .context("failed to rewind video file")?;

        info!(url = video_url, size, path = %path.display(), "video downloaded to temp file");
        Ok(TempVideo { file, path, size })
    }

    /// Open a streaming response for inline preview without touching disk.
    /// The caller pipes `bytes_stream()` straight into the HTTP response.
    pub async fn open_stream(
        &self,
        video_url: &str,
        referer: &str,
    ) -> Result<reqwest::Response, ExtractError> {
        let response = self
            .client
            .get(video_url)
            .header(header::REFERER, referer)
            .header(header::ACCEPT, VIDEO_ACCEPT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| ExtractError::DownloadFailed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::DownloadFailed(format!(
                "upstream returned HTTP {status}"
            )));
        }

        debug!(url = video_url, "proxying video stream");
        Ok(response)
    }
}

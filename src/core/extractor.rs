use async_trait::async_trait;

use crate::core::{ExtractError, Platform, VideoRecord};

/// Capability set every platform scraper implements. Each implementation
/// sequences its own pipeline (normalize, ID extraction, primary tier,
/// webpage fallback); the engine only sees this surface plus a
/// suitability check.
#[async_trait]
pub trait PlatformExtractor: Send + Sync {
    fn platform(&self) -> Platform;

    /// Whether this extractor handles the given raw URL.
    fn suitable(&self, url: &str) -> bool;

    /// Run the full pipeline for one URL and return the fresh record.
    async fn extract(&self, url: &str) -> Result<VideoRecord, ExtractError>;
}

/// Dispatches an incoming URL to the first suitable platform extractor.
pub struct ExtractorEngine {
    extractors: Vec<Box<dyn PlatformExtractor>>,
}

impl ExtractorEngine {
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    pub fn register_extractor(&mut self, extractor: Box<dyn PlatformExtractor>) {
        self.extractors.push(extractor);
    }

    pub async fn extract(&self, url: &str) -> Result<(Platform, VideoRecord), ExtractError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ExtractError::InvalidInput("URL is required".to_string()));
        }

        let Some(extractor) = self.extractors.iter().find(|e| e.suitable(url)) else {
            return Err(ExtractError::InvalidInput(
                "unsupported platform, please use TikTok or Facebook URLs".to_string(),
            ));
        };

        tracing::info!(platform = %extractor.platform(), url, "extracting video data");
        let record = extractor.extract(url).await?;
        Ok((extractor.platform(), record))
    }
}

impl Default for ExtractorEngine {
    fn default() -> Self {
        Self::new()
    }
}

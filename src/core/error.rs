use thiserror::Error;

/// Terminal outcomes of the extraction pipeline.
///
/// Inner stages never surface these directly — they soften their own
/// failures into `None` so the orchestrator can fall through to the next
/// tier. Only the orchestrator's final verdict crosses the HTTP boundary.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Missing/empty URL, or a URL for a platform we do not handle.
    #[error("{0}")]
    InvalidInput(String),

    /// The normalized URL did not match any known video ID pattern.
    #[error("could not extract a video ID from the URL, please check the URL format")]
    IdNotFound,

    /// Both the API tier and the webpage tier failed to produce a playable URL.
    #[error("could not extract video data from the upstream platform")]
    UpstreamUnavailable,

    /// Extraction succeeded but the requested quality variant is absent.
    #[error("video URL not available for the {0} variant")]
    NoUrlForVariant(String),

    /// The resolved media URL could not be fetched.
    #[error("failed to download video: {0}")]
    DownloadFailed(String),

    /// Anything unexpected, caught broadly at the boundary.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ExtractError {
    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::IdNotFound
                | Self::UpstreamUnavailable
                | Self::NoUrlForVariant(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(ExtractError::IdNotFound.is_client_error());
        assert!(ExtractError::InvalidInput("no url".into()).is_client_error());
        assert!(ExtractError::UpstreamUnavailable.is_client_error());
        assert!(ExtractError::NoUrlForVariant("hd".into()).is_client_error());
        assert!(!ExtractError::DownloadFailed("timeout".into()).is_client_error());
        assert!(!ExtractError::Internal(anyhow::anyhow!("boom")).is_client_error());
    }

    #[test]
    fn test_variant_error_message_names_variant() {
        let err = ExtractError::NoUrlForVariant("no_watermark".into());
        assert_eq!(
            err.to_string(),
            "video URL not available for the no_watermark variant"
        );
    }
}

use serde::{Deserialize, Serialize};

use crate::core::ExtractError;

/// Supported upstream platforms, used as a variant tag throughout the
/// pipeline: URL dispatch, response shaping and download filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Tiktok,
    Facebook,
}

impl Platform {
    /// Detect the platform from a raw URL by host substring, mirroring the
    /// dispatch the HTTP layer performs before any normalization.
    pub fn detect(url: &str) -> Option<Self> {
        if url.contains("tiktok.com") {
            Some(Self::Tiktok)
        } else if url.contains("facebook.com") || url.contains("fb.watch") {
            Some(Self::Facebook)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tiktok => "tiktok",
            Self::Facebook => "facebook",
        }
    }

    /// Placeholder title when the upstream item carries none.
    pub fn placeholder_title(&self) -> &'static str {
        match self {
            Self::Tiktok => "TikTok Video",
            Self::Facebook => "Facebook Video",
        }
    }

    /// Referer claimed when fetching media bytes from the platform CDN.
    pub fn referer(&self) -> &'static str {
        match self {
            Self::Tiktok => "https://www.tiktok.com/",
            Self::Facebook => "https://www.facebook.com/",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-platform set of resolved media URLs.
///
/// Every URL is independently optional: absence is a representable state,
/// distinct from an extraction error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariantUrls {
    Tiktok {
        no_watermark: Option<String>,
        watermark: Option<String>,
        preview: Option<String>,
    },
    Facebook {
        hd: Option<String>,
        sd: Option<String>,
        auto: Option<String>,
    },
}

impl VariantUrls {
    pub fn empty_tiktok() -> Self {
        Self::Tiktok {
            no_watermark: None,
            watermark: None,
            preview: None,
        }
    }

    pub fn empty_facebook() -> Self {
        Self::Facebook {
            hd: None,
            sd: None,
            auto: None,
        }
    }

    /// Whether any downloadable variant resolved. Preview-only records do
    /// not count: an API response with metadata but no playable URL must
    /// push the orchestrator into the webpage fallback.
    pub fn has_playable_url(&self) -> bool {
        match self {
            Self::Tiktok {
                no_watermark,
                watermark,
                ..
            } => no_watermark.is_some() || watermark.is_some(),
            Self::Facebook { hd, sd, auto } => {
                hd.is_some() || sd.is_some() || auto.is_some()
            }
        }
    }

    /// Availability map surfaced to clients as `available_formats`.
    pub fn available_formats(&self) -> Vec<(&'static str, bool)> {
        match self {
            Self::Tiktok {
                no_watermark,
                watermark,
                ..
            } => vec![
                ("no_watermark", no_watermark.is_some()),
                ("watermark", watermark.is_some()),
            ],
            Self::Facebook { hd, sd, auto } => vec![
                ("hd", hd.is_some()),
                ("sd", sd.is_some()),
                ("auto", auto.is_some()),
            ],
        }
    }

    /// URL used for inline preview playback.
    pub fn preview(&self) -> Option<&str> {
        match self {
            Self::Tiktok { preview, .. } => preview.as_deref(),
            Self::Facebook { auto, .. } => auto.as_deref(),
        }
    }

    /// Resolve a requested quality variant to a concrete URL.
    ///
    /// TikTok accepts `no_watermark` (the default) or `watermark`. Facebook
    /// accepts `hd`/`sd`/`auto`; a missing `hd`/`sd` falls back to `auto`.
    pub fn select_variant(&self, quality: &str) -> Result<&str, ExtractError> {
        let url = match self {
            Self::Tiktok {
                no_watermark,
                watermark,
                ..
            } => match quality {
                "watermark" => watermark.as_deref(),
                _ => no_watermark.as_deref(),
            },
            Self::Facebook { hd, sd, auto } => match quality {
                "hd" if hd.is_some() => hd.as_deref(),
                "sd" if sd.is_some() => sd.as_deref(),
                _ => auto.as_deref(),
            },
        };

        url.ok_or_else(|| ExtractError::NoUrlForVariant(quality.to_string()))
    }
}

/// The one entity the pipeline produces: a flat, per-request snapshot of a
/// single video. Never cached, never persisted.
///
/// Durations are canonical integer milliseconds; the "m:ss" string clients
/// see is produced at the HTTP boundary only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub duration_ms: u64,
    pub thumbnail: String,
    pub width: u32,
    pub height: u32,
    pub urls: VariantUrls,
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub shares: Option<u64>,
}

impl VideoRecord {
    /// An empty record for the given platform, fields at their documented
    /// defaults. Extraction paths fill in whatever the upstream provides.
    pub fn empty(platform: Platform) -> Self {
        let urls = match platform {
            Platform::Tiktok => VariantUrls::empty_tiktok(),
            Platform::Facebook => VariantUrls::empty_facebook(),
        };
        Self {
            video_id: String::new(),
            title: platform.placeholder_title().to_string(),
            author: "Unknown".to_string(),
            duration_ms: 0,
            thumbnail: String::new(),
            width: 0,
            height: 0,
            urls,
            views: None,
            likes: None,
            shares: None,
        }
    }
}

/// Format a millisecond duration as "minutes:seconds" for response bodies.
pub fn format_duration(duration_ms: u64) -> String {
    let total_seconds = duration_ms / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

//! Facebook extraction pipeline. There is no usable private API here: the
//! primary tier reads the structured `ld+json` VideoObject the watch page
//! embeds for crawlers, and the fallback tier regex-scans the page for the
//! inline hd/sd source fields.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::{ExtractError, Platform, PlatformExtractor, VariantUrls, VideoRecord};
use crate::extractors::{
    first_id_match, normalize_url, unescape_embedded_url, NormalizeRules,
};

const NORMALIZE_RULES: NormalizeRules = NormalizeRules {
    short_link_hosts: &["fb.watch"],
    host_rewrites: &[
        ("m.facebook.com", "www.facebook.com"),
        ("mbasic.facebook.com", "www.facebook.com"),
        ("web.facebook.com", "www.facebook.com"),
    ],
    // Watch URLs keep the video ID in the `v` query parameter.
    strip_query: false,
};

static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"/videos/(\d+)",
        r"/video\.php\?v=(\d+)",
        r"/watch/?\?v=(\d+)",
        r"[?&]v=(\d+)",
        r"/reel/(\d+)",
        r"fb\.watch/([\w-]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static LD_JSON_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script type="application/ld\+json"[^>]*>(.*?)</script>"#).unwrap()
});

/// Inline source fields, current spelling first; both quoted-JSON and bare
/// JS-object forms occur in the wild.
static HD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""browser_native_hd_url":"([^"]+)""#,
        r#""playable_url_quality_hd":"([^"]+)""#,
        r#""?hd_src_no_ratelimit"?:"([^"]+)""#,
        r#""?hd_src"?:"([^"]+)""#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static SD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""browser_native_sd_url":"([^"]+)""#,
        r#""playable_url":"([^"]+)""#,
        r#""?sd_src_no_ratelimit"?:"([^"]+)""#,
        r#""?sd_src"?:"([^"]+)""#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static TITLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title[^>]*>(.*?)</title>").unwrap());
static OWNER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""ownerName":"([^"]+)""#,
        r#""owner":\{"__typename":"[^"]*","name":"([^"]+)""#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});
static VIEW_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r#""video_view_count":(\d+)"#, r#""viewCount":"?(\d+)"?"#]
        .iter()
        .map(|pattern| Regex::new(pattern).unwrap())
        .collect()
});
static DURATION_MS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""playable_duration_in_ms":(\d+)"#).unwrap());
static DURATION_S_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""length_in_second":(\d+)"#).unwrap());
static ISO_DURATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").unwrap());

pub struct FacebookExtractor {
    client: reqwest::Client,
    config: Config,
}

impl FacebookExtractor {
    pub fn new(client: reqwest::Client, config: Config) -> Self {
        Self { client, config }
    }

    async fn fetch_from_page(&self, url: &str) -> Result<VideoRecord, ExtractError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .timeout(self.config.page_timeout)
            .send()
            .await
            .map_err(|err| {
                warn!(%err, "watch page fetch failed");
                ExtractError::UpstreamUnavailable
            })?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "watch page returned error status");
            return Err(ExtractError::UpstreamUnavailable);
        }

        let html = response
            .text()
            .await
            .map_err(|_| ExtractError::UpstreamUnavailable)?;

        Self::record_from_html(&html).ok_or(ExtractError::UpstreamUnavailable)
    }

    fn record_from_html(html: &str) -> Option<VideoRecord> {
        for captures in LD_JSON_PATTERN.captures_iter(html) {
            let raw = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let Ok(data) = serde_json::from_str::<Value>(raw) else {
                debug!("ld+json blob failed to parse, trying next");
                continue;
            };
            if let Some(record) = Self::record_from_ld_json(&data) {
                if record.urls.has_playable_url() {
                    debug!(tier = "ld+json", "usable VideoObject found");
                    return Some(record);
                }
            }
        }

        debug!(tier = "regex", "no usable ld+json, scanning inline source fields");
        Self::record_from_raw_fields(html)
    }

    /// Known VideoObject locations: the blob itself, the first element of a
    /// top-level array, or nested under `video`. A path that does not
    /// resolve is simply not applicable.
    fn record_from_ld_json(data: &Value) -> Option<VideoRecord> {
        let paths: [fn(&Value) -> Option<&Value>; 3] = [
            |d| d.as_object().map(|_| d),
            |d| d.as_array()?.first(),
            |d| d.get("video"),
        ];

        paths
            .iter()
            .filter_map(|path| path(data))
            .filter(|candidate| {
                candidate.get("@type").and_then(Value::as_str) == Some("VideoObject")
            })
            .find_map(Self::record_from_video_object)
    }

    fn record_from_video_object(object: &Value) -> Option<VideoRecord> {
        let content_url = object
            .get("contentUrl")
            .and_then(Value::as_str)
            .map(unescape_embedded_url)?;

        let mut record = VideoRecord::empty(Platform::Facebook);
        if let Some(name) = object.get("name").and_then(Value::as_str) {
            if !name.is_empty() {
                record.title = name.to_string();
            }
        }
        if let Some(author) = object.get("author") {
            // Either an object with a name, a list of them, or a bare string.
            let name = author
                .get("name")
                .and_then(Value::as_str)
                .or_else(|| author.get(0)?.get("name")?.as_str())
                .or_else(|| author.as_str());
            if let Some(name) = name {
                record.author = name.to_string();
            }
        }
        if let Some(thumbnail) = object.get("thumbnailUrl") {
            let url = thumbnail
                .as_str()
                .or_else(|| thumbnail.get(0)?.as_str());
            record.thumbnail = url.map(unescape_embedded_url).unwrap_or_default();
        }
        if let Some(duration) = object.get("duration").and_then(Value::as_str) {
            record.duration_ms = parse_iso8601_duration_ms(duration).unwrap_or(0);
        }
        record.width = object.get("width").and_then(Value::as_u64).unwrap_or(0) as u32;
        record.height = object.get("height").and_then(Value::as_u64).unwrap_or(0) as u32;
        record.views = interaction_count(object);

        record.urls = VariantUrls::Facebook {
            hd: None,
            sd: None,
            auto: Some(content_url),
        };
        Some(record)
    }

    /// Last tier: independent best-effort regexes per field, each trying
    /// its known spellings in fixed priority.
    fn record_from_raw_fields(html: &str) -> Option<VideoRecord> {
        let hd = first_url_match(&HD_PATTERNS, html);
        let sd = first_url_match(&SD_PATTERNS, html);
        if hd.is_none() && sd.is_none() {
            return None;
        }
        let auto = sd.clone().or_else(|| hd.clone());

        let mut record = VideoRecord::empty(Platform::Facebook);
        if let Some(title) = TITLE_PATTERN.captures(html) {
            let title = title[1].trim().trim_end_matches(" | Facebook").trim();
            if !title.is_empty() {
                record.title = title.to_string();
            }
        }
        if let Some(owner) = OWNER_PATTERNS.iter().find_map(|p| p.captures(html)) {
            record.author = owner[1].to_string();
        }
        record.views = VIEW_PATTERNS
            .iter()
            .find_map(|p| p.captures(html))
            .and_then(|m| m[1].parse().ok())
            .filter(|&count: &u64| count > 0);
        record.duration_ms = DURATION_MS_PATTERN
            .captures(html)
            .and_then(|m| m[1].parse().ok())
            .or_else(|| {
                DURATION_S_PATTERN
                    .captures(html)
                    .and_then(|m| m[1].parse::<u64>().ok())
                    .map(|seconds| seconds * 1000)
            })
            .unwrap_or(0);

        record.urls = VariantUrls::Facebook { hd, sd, auto };
        Some(record)
    }
}

#[async_trait]
impl PlatformExtractor for FacebookExtractor {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    fn suitable(&self, url: &str) -> bool {
        url.contains("facebook.com") || url.contains("fb.watch")
    }

    async fn extract(&self, url: &str) -> Result<VideoRecord, ExtractError> {
        let normalized = normalize_url(
            &self.client,
            &NORMALIZE_RULES,
            self.config.redirect_timeout,
            url,
        )
        .await;

        let Some(video_id) = first_id_match(&ID_PATTERNS, &normalized) else {
            debug!(url = normalized, "no video ID pattern matched");
            return Err(ExtractError::IdNotFound);
        };

        info!(stage = "webpage", video_id, "fetching watch page");
        let mut record = self.fetch_from_page(&normalized).await?;
        if !record.urls.has_playable_url() {
            return Err(ExtractError::UpstreamUnavailable);
        }
        info!(stage = "webpage", outcome = "success", video_id, "extracted from watch page");
        record.video_id = video_id;
        Ok(record)
    }
}

fn first_url_match(patterns: &[Regex], html: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|pattern| pattern.captures(html))
        .map(|captures| unescape_embedded_url(&captures[1]))
}

/// Schema.org durations come as "PT1M30S"; anything fancier is ignored.
fn parse_iso8601_duration_ms(value: &str) -> Option<u64> {
    let captures = ISO_DURATION_PATTERN.captures(value)?;
    let part = |index: usize| {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    Some((part(1) * 3600 + part(2) * 60 + part(3)) * 1000)
}

fn interaction_count(object: &Value) -> Option<u64> {
    match object.get("interactionStatistic")? {
        Value::Array(entries) => entries
            .iter()
            .find_map(|entry| entry.get("userInteractionCount").and_then(Value::as_u64)),
        entry => entry.get("userInteractionCount").and_then(Value::as_u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_id(url: &str) -> Option<String> {
        first_id_match(&ID_PATTERNS, url)
    }

    #[test]
    fn test_id_patterns() {
        assert_eq!(
            extract_id("https://www.facebook.com/someone/videos/1234567890"),
            Some("1234567890".to_string())
        );
        assert_eq!(
            extract_id("https://www.facebook.com/watch/?v=987654"),
            Some("987654".to_string())
        );
        assert_eq!(
            extract_id("https://www.facebook.com/video.php?v=555"),
            Some("555".to_string())
        );
        assert_eq!(
            extract_id("https://www.facebook.com/reel/777888"),
            Some("777888".to_string())
        );
        assert_eq!(
            extract_id("https://fb.watch/aBc-123/"),
            Some("aBc-123".to_string())
        );
        assert_eq!(extract_id("https://www.facebook.com/someone/photos/1"), None);
    }

    #[test]
    fn test_ld_json_video_object() {
        let html = concat!(
            r#"<html><script type="application/ld+json">"#,
            r#"{"@type":"VideoObject","name":"Cooking stream","#,
            r#""author":{"name":"Chef Page"},"#,
            r#""contentUrl":"https://video.example/auto.mp4","#,
            r#""thumbnailUrl":"https://img.example/t.jpg","#,
            r#""duration":"PT1M5S","#,
            r#""interactionStatistic":[{"userInteractionCount":4200}]}"#,
            r#"</script></html>"#
        );
        let record = FacebookExtractor::record_from_html(html).unwrap();
        assert_eq!(record.title, "Cooking stream");
        assert_eq!(record.author, "Chef Page");
        assert_eq!(record.thumbnail, "https://img.example/t.jpg");
        assert_eq!(record.duration_ms, 65_000);
        assert_eq!(record.views, Some(4200));
        let VariantUrls::Facebook { hd, sd, auto } = record.urls else {
            panic!("expected facebook urls");
        };
        assert_eq!(auto.as_deref(), Some("https://video.example/auto.mp4"));
        assert!(hd.is_none() && sd.is_none());
    }

    #[test]
    fn test_ld_json_without_content_url_falls_to_regex_tier() {
        let html = concat!(
            r#"<script type="application/ld+json">{"@type":"VideoObject","name":"x"}</script>"#,
            r#"<script>var data = {"browser_native_sd_url":"https:\/\/video.example\/sd.mp4"};</script>"#
        );
        let record = FacebookExtractor::record_from_html(html).unwrap();
        let VariantUrls::Facebook { sd, auto, .. } = record.urls else {
            panic!("expected facebook urls");
        };
        assert_eq!(sd.as_deref(), Some("https://video.example/sd.mp4"));
        assert_eq!(auto, sd);
    }

    #[test]
    fn test_raw_fields_hd_priority_order() {
        // browser_native_hd_url must shadow the legacy hd_src spelling.
        let html = concat!(
            r#"hd_src:"https://video.example/legacy-hd.mp4","#,
            r#""browser_native_hd_url":"https://video.example/hd.mp4""#
        );
        let record = FacebookExtractor::record_from_raw_fields(html).unwrap();
        let VariantUrls::Facebook { hd, .. } = record.urls else {
            panic!("expected facebook urls");
        };
        assert_eq!(hd.as_deref(), Some("https://video.example/hd.mp4"));
    }

    #[test]
    fn test_raw_fields_title_author_views() {
        let html = concat!(
            "<title>Great video | Facebook</title>",
            r#""ownerName":"Some Page","#,
            r#""video_view_count":1234,"#,
            r#"sd_src:"https://video.example/sd.mp4""#
        );
        let record = FacebookExtractor::record_from_raw_fields(html).unwrap();
        assert_eq!(record.title, "Great video");
        assert_eq!(record.author, "Some Page");
        assert_eq!(record.views, Some(1234));
    }

    #[test]
    fn test_raw_fields_view_count_current_spelling() {
        let html = r#"sd_src:"https://v.example/s.mp4" "viewCount":"77""#;
        let record = FacebookExtractor::record_from_raw_fields(html).unwrap();
        assert_eq!(record.views, Some(77));
    }

    #[test]
    fn test_duration_fields() {
        let html = r#"sd_src:"https://v.example/s.mp4" "playable_duration_in_ms":93500"#;
        let record = FacebookExtractor::record_from_raw_fields(html).unwrap();
        assert_eq!(record.duration_ms, 93_500);

        let html = r#"sd_src:"https://v.example/s.mp4" "length_in_second":62"#;
        let record = FacebookExtractor::record_from_raw_fields(html).unwrap();
        assert_eq!(record.duration_ms, 62_000);
    }

    #[test]
    fn test_no_source_fields_yields_nothing() {
        assert!(FacebookExtractor::record_from_html("<html>no videos here</html>").is_none());
    }

    #[test]
    fn test_parse_iso8601_duration() {
        assert_eq!(parse_iso8601_duration_ms("PT15S"), Some(15_000));
        assert_eq!(parse_iso8601_duration_ms("PT1M5S"), Some(65_000));
        assert_eq!(parse_iso8601_duration_ms("PT2H"), Some(7_200_000));
        assert_eq!(parse_iso8601_duration_ms("1:05"), None);
    }
}

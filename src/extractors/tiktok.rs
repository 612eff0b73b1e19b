//! TikTok extraction pipeline: private mobile feed API first, embedded
//! page-state blobs second, raw URL regexes as the last tier.

use std::cmp::Reverse;
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use regex::Regex;
use reqwest::header;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::{ExtractError, Platform, PlatformExtractor, VariantUrls, VideoRecord};
use crate::extractors::watermark::rewrite_watermark_url;
use crate::extractors::{
    first_id_match, normalize_url, pick_counter, unescape_embedded_url, NormalizeRules,
};

/// Undocumented feed endpoint normally used only by the mobile app.
const FEED_API_URL: &str = "https://api22-normal-c-alisg.tiktokv.com/aweme/v1/feed/";

/// Mobile-app user agent, distinct from the browser profile used for page
/// fetches. The endpoint rejects browser user agents.
const APP_USER_AGENT: &str = "com.ss.android.ugc.trill/2018022632 (Linux; U; Android 10; \
     en_US; SM-G973F; Build/QP1A.190711.020; Cronet/TTNetVersion:368b3e98 2020-03-26 \
     QuicVersion:0144d358 2020-03-24)";

const NORMALIZE_RULES: NormalizeRules = NormalizeRules {
    short_link_hosts: &["vm.tiktok.com", "vt.tiktok.com"],
    host_rewrites: &[("m.tiktok.com", "www.tiktok.com")],
    strip_query: true,
};

/// Known URL shapes, most specific first. Reference data: TikTok changes
/// these over time.
static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"/video/(\d+)",
        r"/v/(\d+)",
        r"tiktok\.com/.*?/video/(\d+)",
        r"tiktok\.com/@[\w.-]+/video/(\d+)",
        r"tiktok\.com/t/(\w+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Embedded page-state markers in priority order: script tags by known ID,
/// then known global-variable assignments.
static STATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?s)<script id="__UNIVERSAL_DATA_FOR_REHYDRATION__" type="application/json">(.*?)</script>"#,
        r#"(?s)<script id="SIGI_STATE" type="application/json">(.*?)</script>"#,
        r#"(?s)<script id="__NEXT_DATA__" type="application/json">(.*?)</script>"#,
        r"(?s)window\.__INITIAL_STATE__\s*=\s*(\{.*?\});",
        r"(?s)window\.__DATA__\s*=\s*(\{.*?\});",
        r#"(?s)window\["SIGI_STATE"\]\s*=\s*(\{.*?\});"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Last-tier raw URL fields, both naming conventions.
static RAW_URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""playAddr":"([^"]+)""#,
        r#""downloadAddr":"([^"]+)""#,
        r#""play_addr":\s*\{\s*"url_list":\s*\[\s*"([^"]+)""#,
        r#""download_addr":\s*\{\s*"url_list":\s*\[\s*"([^"]+)""#,
        r#""playApi":"([^"]+)""#,
        r#""downloadApi":"([^"]+)""#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static DESC_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""desc":"([^"]+)""#).unwrap());
static NICKNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""nickname":"([^"]+)""#).unwrap());

pub struct TikTokExtractor {
    client: reqwest::Client,
    config: Config,
    api_url: String,
}

impl TikTokExtractor {
    pub fn new(client: reqwest::Client, config: Config) -> Self {
        Self::with_api_url(client, config, FEED_API_URL)
    }

    /// Point the private-API tier somewhere else, mainly for tests.
    pub fn with_api_url(
        client: reqwest::Client,
        config: Config,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            config,
            api_url: api_url.into(),
        }
    }

    /// Static device-spoofing parameters plus the current epoch timestamp.
    /// These identify every request as the same single handset; that is a
    /// known fragility of the approach, not something to randomize away.
    fn api_query(video_id: &str) -> Vec<(&'static str, String)> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);

        vec![
            ("aweme_id", video_id.to_string()),
            ("version_name", "26.2.0".to_string()),
            ("version_code", "2018022632".to_string()),
            ("build_number", "26.2.0".to_string()),
            ("manifest_version_code", "2018022632".to_string()),
            ("update_version_code", "2018022632".to_string()),
            ("openudid", "0cf407a766c9c4ad".to_string()),
            ("uuid", "6".to_string()),
            ("region", "US".to_string()),
            ("ts", ts.to_string()),
            ("device_type", "SM-G973F".to_string()),
            ("device_brand", "samsung".to_string()),
            ("device_id", "7318518857994389254".to_string()),
            ("resolution", "900*1600".to_string()),
            ("dpi", "300".to_string()),
            ("os_version", "10".to_string()),
            ("version", "9".to_string()),
            ("app_name", "trill".to_string()),
            ("app_version", "26.2.0".to_string()),
        ]
    }

    /// Soft tier: any failure (transport, status, JSON shape) is `None` so
    /// the orchestrator can fall through to webpage scraping.
    async fn fetch_from_api(&self, video_id: &str) -> Option<VideoRecord> {
        let response = match self
            .client
            .get(&self.api_url)
            .query(&Self::api_query(video_id))
            .header(header::USER_AGENT, APP_USER_AGENT)
            .header(header::ACCEPT_ENCODING, "gzip, deflate")
            .timeout(self.config.api_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "feed API request failed");
                return None;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            debug!(status = %response.status(), "feed API returned non-200");
            return None;
        }

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(err) => {
                debug!(%err, "feed API returned invalid JSON");
                return None;
            }
        };

        let aweme = data.get("aweme_list")?.get(0)?;
        Some(Self::record_from_api_item(aweme))
    }

    /// Normalize one snake_case feed item into the common record shape.
    fn record_from_api_item(aweme: &Value) -> VideoRecord {
        let null = Value::Null;
        let video = aweme.get("video").unwrap_or(&null);

        let watermark = first_list_url(video, "play_addr");
        let preview = watermark.clone();

        // Prefer the explicit download rendition; otherwise take the
        // highest-bitrate play variant and scrub its watermark markers.
        let mut no_watermark = first_list_url(video, "download_addr");
        if no_watermark.is_none() {
            if let Some(bit_rates) = video.get("bit_rate").and_then(Value::as_array) {
                let mut ranked: Vec<&Value> = bit_rates.iter().collect();
                ranked.sort_by_key(|entry| {
                    Reverse(entry.get("bit_rate").and_then(Value::as_i64).unwrap_or(0))
                });
                no_watermark = ranked
                    .iter()
                    .find_map(|entry| first_list_url(entry, "play_addr"))
                    .map(|url| rewrite_watermark_url(&url));
            }
        }
        if no_watermark.is_none() {
            no_watermark = watermark.as_deref().map(rewrite_watermark_url);
        }

        let thumbnail = first_list_url(video, "cover")
            .or_else(|| first_list_url(video, "origin_cover"))
            .or_else(|| first_list_url(video, "dynamic_cover"))
            .unwrap_or_default();

        let mut record = VideoRecord::empty(Platform::Tiktok);
        if let Some(desc) = aweme.get("desc").and_then(Value::as_str) {
            if !desc.is_empty() {
                record.title = desc.to_string();
            }
        }
        if let Some(nickname) = aweme
            .get("author")
            .and_then(|author| author.get("nickname"))
            .and_then(Value::as_str)
        {
            record.author = nickname.to_string();
        }
        record.duration_ms = video.get("duration").and_then(Value::as_u64).unwrap_or(0);
        record.thumbnail = thumbnail;
        record.width = video.get("width").and_then(Value::as_u64).unwrap_or(0) as u32;
        record.height = video.get("height").and_then(Value::as_u64).unwrap_or(0) as u32;

        let stats = aweme.get("statistics").unwrap_or(&null);
        record.views = pick_counter(stats, &["play_count", "playCount"]);
        record.likes = pick_counter(stats, &["digg_count", "diggCount"]);
        record.shares = pick_counter(stats, &["share_count", "shareCount"]);

        record.urls = VariantUrls::Tiktok {
            no_watermark,
            watermark,
            preview,
        };
        record
    }

    /// Hard tier: when this fails there is nothing left to try.
    async fn fetch_from_page(&self, url: &str) -> Result<VideoRecord, ExtractError> {
        let response = self
            .client
            .get(url)
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(header::CACHE_CONTROL, "no-cache")
            .timeout(self.config.page_timeout)
            .send()
            .await
            .map_err(|err| {
                warn!(%err, "webpage fetch failed");
                ExtractError::UpstreamUnavailable
            })?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "webpage fetch returned error status");
            return Err(ExtractError::UpstreamUnavailable);
        }

        let html = response
            .text()
            .await
            .map_err(|_| ExtractError::UpstreamUnavailable)?;

        Self::record_from_html(&html).ok_or(ExtractError::UpstreamUnavailable)
    }

    /// Two scraping tiers over the page body: embedded state blobs, then
    /// raw URL regexes with independent best-effort title/author matches.
    fn record_from_html(html: &str) -> Option<VideoRecord> {
        for pattern in STATE_PATTERNS.iter() {
            let Some(captures) = pattern.captures(html) else {
                continue;
            };
            let raw = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            // Some render versions double-escape the blob.
            let data = serde_json::from_str::<Value>(raw)
                .or_else(|_| serde_json::from_str(&raw.replace("\\\"", "\"").replace("\\/", "/")));
            let Ok(data) = data else {
                debug!("embedded state blob failed to parse, trying next marker");
                continue;
            };
            if let Some(record) = Self::record_from_state_blob(&data) {
                if record.urls.has_playable_url() {
                    return Some(record);
                }
            }
        }

        for pattern in RAW_URL_PATTERNS.iter() {
            let Some(captures) = pattern.captures(html) else {
                continue;
            };
            let video_url = unescape_embedded_url(captures.get(1)?.as_str());

            let mut record = VideoRecord::empty(Platform::Tiktok);
            if let Some(desc) = DESC_PATTERN.captures(html) {
                record.title = desc[1].to_string();
            }
            if let Some(nickname) = NICKNAME_PATTERN.captures(html) {
                record.author = nickname[1].to_string();
            }
            record.urls = VariantUrls::Tiktok {
                no_watermark: Some(rewrite_watermark_url(&video_url)),
                watermark: Some(video_url.clone()),
                preview: Some(video_url),
            };
            return Some(record);
        }

        None
    }

    /// Try the known item locations used by different page-render versions,
    /// in fixed order. A path that does not resolve is "not applicable",
    /// never an error.
    fn record_from_state_blob(data: &Value) -> Option<VideoRecord> {
        let paths: [fn(&Value) -> Option<&Value>; 3] = [
            |d| {
                d.get("__DEFAULT_SCOPE__")?
                    .get("webapp.video-detail")?
                    .get("itemInfo")?
                    .get("itemStruct")
            },
            |d| {
                let module = d.get("ItemModule")?.as_object()?;
                module
                    .iter()
                    .find(|(key, _)| !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()))
                    .map(|(_, item)| item)
            },
            |d| d.get("props")?.get("pageProps")?.get("itemInfo")?.get("itemStruct"),
        ];

        paths
            .iter()
            .filter_map(|path| path(data))
            .find_map(Self::record_from_item_struct)
    }

    /// Normalize one camelCase web item into the common record shape.
    fn record_from_item_struct(item: &Value) -> Option<VideoRecord> {
        let video = item.get("video")?;

        let watermark = video
            .get("playAddr")
            .and_then(Value::as_str)
            .map(str::to_string);
        let preview = watermark.clone();
        let no_watermark = video
            .get("downloadAddr")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| watermark.as_deref().map(rewrite_watermark_url));

        let thumbnail = ["cover", "originCover", "dynamicCover"]
            .iter()
            .filter_map(|key| video.get(*key).and_then(Value::as_str))
            .find(|cover| !cover.is_empty())
            .unwrap_or_default()
            .to_string();

        let mut record = VideoRecord::empty(Platform::Tiktok);
        if let Some(desc) = item.get("desc").and_then(Value::as_str) {
            if !desc.is_empty() {
                record.title = desc.to_string();
            }
        }
        // The author is an object with a nickname on detail pages but a bare
        // username string inside ItemModule.
        if let Some(author) = item.get("author") {
            if let Some(nickname) = author.get("nickname").and_then(Value::as_str) {
                record.author = nickname.to_string();
            } else if let Some(name) = author.as_str() {
                record.author = name.to_string();
            }
        }
        // Web items report seconds, unlike the feed API's milliseconds.
        record.duration_ms = video
            .get("duration")
            .and_then(Value::as_u64)
            .unwrap_or(0)
            .saturating_mul(1000);
        record.thumbnail = thumbnail;
        record.width = video.get("width").and_then(Value::as_u64).unwrap_or(0) as u32;
        record.height = video.get("height").and_then(Value::as_u64).unwrap_or(0) as u32;

        let null = Value::Null;
        let stats = item.get("stats").unwrap_or(&null);
        record.views = pick_counter(stats, &["playCount", "play_count"]);
        record.likes = pick_counter(stats, &["diggCount", "digg_count"]);
        record.shares = pick_counter(stats, &["shareCount", "share_count"]);

        record.urls = VariantUrls::Tiktok {
            no_watermark,
            watermark,
            preview,
        };
        Some(record)
    }
}

#[async_trait]
impl PlatformExtractor for TikTokExtractor {
    fn platform(&self) -> Platform {
        Platform::Tiktok
    }

    fn suitable(&self, url: &str) -> bool {
        url.contains("tiktok.com")
    }

    async fn extract(&self, url: &str) -> Result<VideoRecord, ExtractError> {
        let normalized = normalize_url(
            &self.client,
            &NORMALIZE_RULES,
            self.config.redirect_timeout,
            url,
        )
        .await;

        // No recognizable ID means no network stage runs at all.
        let Some(video_id) = first_id_match(&ID_PATTERNS, &normalized) else {
            debug!(url = normalized, "no video ID pattern matched");
            return Err(ExtractError::IdNotFound);
        };

        info!(stage = "api", video_id, "trying private feed API");
        match self.fetch_from_api(&video_id).await {
            Some(mut record) if record.urls.has_playable_url() => {
                info!(stage = "api", outcome = "success", video_id, "extracted from feed API");
                record.video_id = video_id;
                return Ok(record);
            }
            Some(_) => {
                debug!(stage = "api", outcome = "no playable URL", "falling back to webpage");
            }
            None => {
                debug!(stage = "api", outcome = "no result", "falling back to webpage");
            }
        }

        info!(stage = "webpage", video_id, "trying webpage fallback");
        let mut record = self.fetch_from_page(&normalized).await?;
        if !record.urls.has_playable_url() {
            return Err(ExtractError::UpstreamUnavailable);
        }
        info!(stage = "webpage", outcome = "success", video_id, "extracted from webpage");
        record.video_id = video_id;
        Ok(record)
    }
}

fn first_list_url(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)?
        .get("url_list")?
        .get(0)?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract_id(url: &str) -> Option<String> {
        first_id_match(&ID_PATTERNS, url)
    }

    #[test]
    fn test_id_patterns() {
        assert_eq!(
            extract_id("https://www.tiktok.com/@some.user/video/7318518857994389254"),
            Some("7318518857994389254".to_string())
        );
        assert_eq!(
            extract_id("https://www.tiktok.com/v/12345"),
            Some("12345".to_string())
        );
        assert_eq!(
            extract_id("https://www.tiktok.com/t/ZTabcDEF1"),
            Some("ZTabcDEF1".to_string())
        );
        assert_eq!(extract_id("https://www.tiktok.com/@some.user"), None);
        assert_eq!(extract_id("https://www.tiktok.com/explore"), None);
    }

    #[test]
    fn test_api_item_prefers_download_addr() {
        let aweme = json!({
            "desc": "my clip",
            "author": {"nickname": "maker"},
            "video": {
                "duration": 13_000,
                "width": 576,
                "height": 1024,
                "play_addr": {"url_list": ["https://cdn.example/play.mp4?watermark=1"]},
                "download_addr": {"url_list": ["https://cdn.example/clean.mp4"]},
                "cover": {"url_list": ["https://cdn.example/cover.jpg"]}
            },
            "statistics": {"play_count": 100, "digg_count": 5, "share_count": 0}
        });

        let record = TikTokExtractor::record_from_api_item(&aweme);
        let VariantUrls::Tiktok {
            no_watermark,
            watermark,
            preview,
        } = record.urls
        else {
            panic!("expected tiktok urls");
        };
        assert_eq!(no_watermark.as_deref(), Some("https://cdn.example/clean.mp4"));
        assert_eq!(
            watermark.as_deref(),
            Some("https://cdn.example/play.mp4?watermark=1")
        );
        assert_eq!(preview, watermark);
        assert_eq!(record.title, "my clip");
        assert_eq!(record.author, "maker");
        assert_eq!(record.duration_ms, 13_000);
        assert_eq!((record.width, record.height), (576, 1024));
        assert_eq!(record.thumbnail, "https://cdn.example/cover.jpg");
        assert_eq!(record.views, Some(100));
        assert_eq!(record.likes, Some(5));
        assert_eq!(record.shares, None);
    }

    #[test]
    fn test_api_item_picks_highest_bitrate_and_rewrites() {
        let aweme = json!({
            "video": {
                "play_addr": {"url_list": ["https://cdn.example/play/wm.mp4"]},
                "bit_rate": [
                    {"bit_rate": 500_000,
                     "play_addr": {"url_list": ["https://cdn.example/play/low.mp4"]}},
                    {"bit_rate": 2_000_000,
                     "play_addr": {"url_list": ["https://cdn.example/play/high.mp4"]}}
                ]
            }
        });

        let record = TikTokExtractor::record_from_api_item(&aweme);
        let VariantUrls::Tiktok { no_watermark, .. } = record.urls else {
            panic!("expected tiktok urls");
        };
        assert_eq!(
            no_watermark.as_deref(),
            Some("https://cdn.example/download/high.mp4")
        );
    }

    #[test]
    fn test_api_item_rewrites_watermark_url_as_last_resort() {
        let aweme = json!({
            "video": {
                "play_addr": {"url_list": ["https://cdn.example/play/clip.mp4?watermark=1"]}
            }
        });

        let record = TikTokExtractor::record_from_api_item(&aweme);
        let VariantUrls::Tiktok { no_watermark, .. } = record.urls else {
            panic!("expected tiktok urls");
        };
        assert_eq!(
            no_watermark.as_deref(),
            Some("https://cdn.example/download/clip.mp4?watermark=0")
        );
    }

    #[test]
    fn test_api_item_cover_priority() {
        let aweme = json!({
            "video": {
                "origin_cover": {"url_list": ["https://cdn.example/origin.jpg"]},
                "dynamic_cover": {"url_list": ["https://cdn.example/dynamic.jpg"]}
            }
        });
        let record = TikTokExtractor::record_from_api_item(&aweme);
        assert_eq!(record.thumbnail, "https://cdn.example/origin.jpg");
    }

    #[test]
    fn test_api_item_with_no_urls_is_not_playable() {
        let aweme = json!({"desc": "metadata only", "video": {}});
        let record = TikTokExtractor::record_from_api_item(&aweme);
        assert!(!record.urls.has_playable_url());
    }

    #[test]
    fn test_state_blob_sigi_item_module() {
        let html = concat!(
            r#"<html><script id="SIGI_STATE" type="application/json">"#,
            r#"{"ItemModule":{"123":{"desc":"hi","video":{"playAddr":"https://x/p.mp4"}}}}"#,
            r#"</script></html>"#
        );
        let record = TikTokExtractor::record_from_html(html).unwrap();
        assert_eq!(record.title, "hi");
        let VariantUrls::Tiktok { watermark, .. } = record.urls else {
            panic!("expected tiktok urls");
        };
        assert_eq!(watermark.as_deref(), Some("https://x/p.mp4"));
    }

    // Path templates must be tried in fixed order; a document resolving
    // only at a later template still extracts, and an earlier template
    // shadows later ones when both apply.
    #[test]
    fn test_state_blob_template_order() {
        let late_only = json!({
            "props": {"pageProps": {"itemInfo": {"itemStruct": {
                "desc": "from next-data",
                "video": {"playAddr": "https://x/next.mp4"}
            }}}}
        });
        let record = TikTokExtractor::record_from_state_blob(&late_only).unwrap();
        assert_eq!(record.title, "from next-data");

        let both = json!({
            "__DEFAULT_SCOPE__": {"webapp.video-detail": {"itemInfo": {"itemStruct": {
                "desc": "from universal",
                "video": {"playAddr": "https://x/universal.mp4"}
            }}}},
            "props": {"pageProps": {"itemInfo": {"itemStruct": {
                "desc": "from next-data",
                "video": {"playAddr": "https://x/next.mp4"}
            }}}}
        });
        let record = TikTokExtractor::record_from_state_blob(&both).unwrap();
        assert_eq!(record.title, "from universal");
    }

    #[test]
    fn test_state_blob_skips_inapplicable_templates_without_error() {
        let data = json!({"__DEFAULT_SCOPE__": {"something.else": 1}, "ItemModule": "bogus"});
        assert!(TikTokExtractor::record_from_state_blob(&data).is_none());
    }

    #[test]
    fn test_item_struct_web_duration_is_seconds() {
        let item = json!({
            "desc": "d",
            "video": {"playAddr": "https://x/p.mp4", "duration": 13}
        });
        let record = TikTokExtractor::record_from_item_struct(&item).unwrap();
        assert_eq!(record.duration_ms, 13_000);
    }

    #[test]
    fn test_item_struct_author_as_bare_string() {
        let item = json!({
            "video": {"playAddr": "https://x/p.mp4"},
            "author": "someuser"
        });
        let record = TikTokExtractor::record_from_item_struct(&item).unwrap();
        assert_eq!(record.author, "someuser");
    }

    #[test]
    fn test_raw_regex_tier_unescapes_url() {
        let html = r#"<html>"nickname":"maker","desc":"clip title",
            "playAddr":"https:\/\/cdn.example\/play\/v.mp4?a=1&b=2"</html>"#;
        let record = TikTokExtractor::record_from_html(html).unwrap();
        assert_eq!(record.title, "clip title");
        assert_eq!(record.author, "maker");
        let VariantUrls::Tiktok {
            watermark,
            no_watermark,
            ..
        } = record.urls
        else {
            panic!("expected tiktok urls");
        };
        assert_eq!(
            watermark.as_deref(),
            Some("https://cdn.example/play/v.mp4?a=1&b=2")
        );
        assert_eq!(
            no_watermark.as_deref(),
            Some("https://cdn.example/download/v.mp4?a=1&b=2")
        );
    }

    #[test]
    fn test_html_without_any_marker_yields_nothing() {
        assert!(TikTokExtractor::record_from_html("<html><body>nope</body></html>").is_none());
    }

    // Nothing listens on port 1: reaching any network stage would fail
    // with a different error, so IdNotFound proves the short-circuit.
    #[tokio::test]
    async fn test_unrecognizable_id_short_circuits_before_network() {
        let extractor = TikTokExtractor::with_api_url(
            reqwest::Client::new(),
            Config::default(),
            "http://127.0.0.1:1/feed",
        );
        let err = extractor
            .extract("https://www.tiktok.com/explore")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::IdNotFound));
    }

    // A 200 API response carrying only metadata must not terminate
    // extraction; the webpage tier still runs.
    #[tokio::test]
    async fn test_api_record_without_urls_falls_back_to_webpage() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "aweme_list": [{"desc": "metadata only", "video": {}}]
            })))
            .mount(&server)
            .await;

        let html = concat!(
            r#"<script id="SIGI_STATE" type="application/json">"#,
            r#"{"ItemModule":{"55":{"desc":"from page","video":{"playAddr":"https://x/p.mp4"}}}}"#,
            r#"</script>"#
        );
        Mock::given(method("GET"))
            .and(path("/tiktok.com/@user/video/55"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let extractor = TikTokExtractor::with_api_url(
            reqwest::Client::new(),
            Config::default(),
            format!("{}/feed", server.uri()),
        );
        let record = extractor
            .extract(&format!("{}/tiktok.com/@user/video/55", server.uri()))
            .await
            .unwrap();
        assert_eq!(record.title, "from page");
        assert_eq!(record.video_id, "55");
    }
}

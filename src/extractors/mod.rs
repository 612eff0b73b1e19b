pub mod facebook;
pub mod tiktok;
pub mod watermark;

pub use facebook::FacebookExtractor;
pub use tiktok::TikTokExtractor;

use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Per-platform URL canonicalization table. The normalizer is configuration
/// plus one shared routine, not per-platform logic.
pub(crate) struct NormalizeRules {
    /// Hosts that only serve redirects to the canonical page.
    pub short_link_hosts: &'static [&'static str],
    /// Mobile host -> canonical desktop host.
    pub host_rewrites: &'static [(&'static str, &'static str)],
    /// Whether the query string is dead weight on this platform. Facebook
    /// keeps it: watch URLs carry the video ID in the `v` parameter.
    pub strip_query: bool,
}

/// Canonicalize a platform URL. Follows short-link redirects with a bounded
/// timeout, rewrites mobile hosts, optionally strips the query string.
/// Never fails: any network or parse trouble returns the best form so far.
pub(crate) async fn normalize_url(
    client: &reqwest::Client,
    rules: &NormalizeRules,
    timeout: Duration,
    raw: &str,
) -> String {
    let mut url = raw.to_string();

    let host = Url::parse(&url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));

    // HEAD is enough to follow the redirect chain; the page body is never
    // wanted here.
    if let Some(host) = host.as_deref() {
        if rules.short_link_hosts.contains(&host) {
            match client.head(&url).timeout(timeout).send().await {
                Ok(response) => url = response.url().to_string(),
                Err(err) => {
                    warn!(url, %err, "short-link resolution failed, keeping original URL");
                }
            }
        }
    }

    if let Ok(mut parsed) = Url::parse(&url) {
        let rewrite = parsed.host_str().and_then(|current| {
            rules
                .host_rewrites
                .iter()
                .find(|(mobile, _)| *mobile == current)
                .map(|(_, canonical)| *canonical)
        });
        if let Some(canonical) = rewrite {
            if parsed.set_host(Some(canonical)).is_ok() {
                url = parsed.to_string();
            }
        }
    }

    if rules.strip_query {
        if let Some(idx) = url.find('?') {
            url.truncate(idx);
        }
    }

    debug!(raw, normalized = url, "normalized URL");
    url
}

/// First capture of the first matching pattern wins; ordering resolves
/// ambiguous overlap.
pub(crate) fn first_id_match(patterns: &[Regex], url: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

/// Pick a numeric counter that upstream spells two ways (legacy snake_case
/// vs current camelCase). First listed name wins; zeros are treated as
/// "not reported".
pub(crate) fn pick_counter(stats: &Value, names: &[&str]) -> Option<u64> {
    names
        .iter()
        .filter_map(|name| stats.get(*name).and_then(Value::as_u64))
        .find(|&count| count > 0)
}

/// Undo the escaping upstream applies to URLs embedded in JSON or HTML
/// (unicode escapes, backslashed slashes, entity-encoded ampersands),
/// then percent-decode.
pub(crate) fn unescape_embedded_url(raw: &str) -> String {
    let unescaped = raw
        .replace("\\u002F", "/")
        .replace("\\/", "/")
        .replace("\\u0026", "&")
        .replace("&amp;", "&");
    urlencoding::decode(&unescaped)
        .map(|s| s.into_owned())
        .unwrap_or(unescaped)
}

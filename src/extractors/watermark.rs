//! Heuristic rewrite of a with-watermark play URL into its no-watermark
//! download equivalent. Pure string surgery against known CDN conventions;
//! there is no guarantee the result is actually watermark-free.

use url::Url;

/// Ordered substring substitutions. Each flips a watermark-indicating token
/// or path segment to its clean counterpart; order matters on overlap.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("watermark=1", "watermark=0"),
    ("/watermark/", "/nowatermark/"),
    ("wm=1", "wm=0"),
    ("&watermark=1", ""),
    ("?watermark=1", ""),
    ("play_addr", "download_addr"),
    ("playAddr", "downloadAddr"),
    ("/play/", "/download/"),
    ("_watermark", "_nowatermark"),
    ("watermark%3D1", "watermark%3D0"),
    ("&wm=1", ""),
    ("?wm=1", ""),
    ("/play_", "/download_"),
];

/// CDN hosts that honor explicit removal of watermark query parameters.
const CDN_HOSTS: &[&str] = &["muscdn.com", "byteoversea.com", "tiktokcdn.com"];

const STRIPPED_PARAMS: &[&str] = &["watermark", "wm"];

/// Rewrite `url` towards its no-watermark form. Idempotent and infallible:
/// unknown URLs pass through unchanged.
pub fn rewrite_watermark_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }

    let decoded = urlencoding::decode(url)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| url.to_string());

    let mut clean = decoded;
    for (from, to) in REPLACEMENTS {
        clean = clean.replace(from, to);
    }

    if CDN_HOSTS.iter().any(|host| clean.contains(host)) {
        if let Some(stripped) = strip_watermark_params(&clean) {
            clean = stripped;
        }
    }

    clean
}

/// Re-parse a CDN URL and drop `watermark`/`wm` query parameters, rebuilding
/// scheme+host+path+remaining query. Returns `None` when the URL does not
/// parse or carries no query at all.
fn strip_watermark_params(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.query()?;

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !STRIPPED_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let host = parsed.host_str()?;
    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let mut rebuilt = format!("{}://{}{}", parsed.scheme(), authority, parsed.path());
    if !kept.is_empty() {
        let query = kept
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        rebuilt.push('?');
        rebuilt.push_str(&query);
    }
    Some(rebuilt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flips_watermark_flag() {
        assert_eq!(
            rewrite_watermark_url("https://v.example/play/video.mp4?watermark=1&id=7"),
            "https://v.example/download/video.mp4?watermark=0&id=7"
        );
    }

    #[test]
    fn test_rewrites_addr_field_tokens() {
        assert_eq!(
            rewrite_watermark_url("https://v.example/api?field=play_addr"),
            "https://v.example/api?field=download_addr"
        );
        assert_eq!(
            rewrite_watermark_url("https://v.example/api?field=playAddr"),
            "https://v.example/api?field=downloadAddr"
        );
    }

    #[test]
    fn test_percent_decodes_before_rewriting() {
        assert_eq!(
            rewrite_watermark_url("https://v.example%2Fplay%2Fvideo.mp4"),
            "https://v.example/download/video.mp4"
        );
    }

    #[test]
    fn test_strips_watermark_params_on_cdn_hosts() {
        assert_eq!(
            rewrite_watermark_url("https://v16.tiktokcdn.com/video/?wm=2&bitrate=5"),
            "https://v16.tiktokcdn.com/video/?bitrate=5"
        );
        // Query separator disappears entirely when nothing survives.
        assert_eq!(
            rewrite_watermark_url("https://storage.muscdn.com/clip.mp4?wm=2"),
            "https://storage.muscdn.com/clip.mp4"
        );
    }

    #[test]
    fn test_keeps_params_on_unknown_hosts() {
        assert_eq!(
            rewrite_watermark_url("https://cdn.other.com/clip.mp4?wm=2&x=1"),
            "https://cdn.other.com/clip.mp4?wm=2&x=1"
        );
    }

    #[test]
    fn test_empty_input_passes_through() {
        assert_eq!(rewrite_watermark_url(""), "");
    }

    // Applying the rewriter to its own output must be a no-op for every
    // fixture in the replacement table.
    #[test]
    fn test_idempotent_over_fixture_table() {
        let fixtures = [
            "https://v.example/play/video.mp4?watermark=1",
            "https://v.example/play_720.mp4",
            "https://v.example/watermark/clip.mp4",
            "https://v.example/clip_watermark.mp4",
            "https://v.example/api?field=play_addr&wm=1",
            "https://v.example/api?field=playAddr",
            "https://v16.tiktokcdn.com/video/?watermark=1&bitrate=5",
            "https://storage.byteoversea.com/clip.mp4?wm=1",
            "https://storage.muscdn.com/clip.mp4?watermark=1&tk=abc",
            "https://v.example/clip.mp4?x=watermark%3D1",
        ];

        for fixture in fixtures {
            let once = rewrite_watermark_url(fixture);
            let twice = rewrite_watermark_url(&once);
            assert_eq!(once, twice, "rewriter not idempotent for {fixture}");
        }
    }
}

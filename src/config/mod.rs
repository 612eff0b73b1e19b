use std::time::Duration;

/// Desktop-browser profile used for page fetches and media downloads. The
/// private API tier uses its own mobile-app user agent instead.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Static service configuration. There is no config file: everything the
/// service needs at runtime is an in-code constant, overridden only by the
/// CLI flags for the bind address.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Short-link redirect resolution.
    pub redirect_timeout: Duration,
    /// Private mobile API calls.
    pub api_timeout: Duration,
    /// Public webpage fetches for the fallback scraper.
    pub page_timeout: Duration,
    /// Streaming media downloads and proxying.
    pub download_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redirect_timeout: Duration::from_secs(10),
            api_timeout: Duration::from_secs(15),
            page_timeout: Duration::from_secs(20),
            download_timeout: Duration::from_secs(60),
        }
    }
}

/// Build the shared outbound HTTP client. `reqwest::Client` is cheap to
/// clone and safe for concurrent use, so one instance serves every request;
/// per-call timeouts come from [`Config`] at the call sites.
pub fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
}

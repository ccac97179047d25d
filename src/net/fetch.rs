use thiserror::Error;
use url::Url;

/// Result of fetching a URL
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub html: String,
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub content_type: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server answered HTTP {0}")]
    Status(u16),
}

pub(crate) const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; ALICE-Spatial/",
    env!("CARGO_PKG_VERSION"),
    "; +https://github.com/ext-sakamoro/ALICE-Spatial)"
);

/// Add a scheme to bare hosts: `example.com` → `https://example.com`.
pub fn normalize_url(url_str: &str) -> Result<Url, FetchError> {
    let trimmed = url_str.trim();
    let url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    Ok(Url::parse(&url)?)
}

/// Fetch a URL and return the HTML content (blocking).
pub fn fetch_url(url_str: &str) -> Result<FetchResult, FetchError> {
    let parsed = normalize_url(url_str)?;

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(15))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;

    let response = client
        .get(parsed.as_str())
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    let final_url = response.url().to_string();
    let html = response.text()?;
    log::info!("fetched {} ({} bytes, {})", final_url, html.len(), content_type);

    Ok(FetchResult {
        html,
        url: final_url,
        status: status.as_u16(),
        content_type,
    })
}

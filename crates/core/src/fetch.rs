//! Page loading from URLs, files, and stdin.
//!
//! [`load_page`] picks the source from the input string: `-` reads stdin, an
//! `http(s)://` URL is fetched (feature `fetch`), anything else is a file path.

use std::fs;
use std::path::PathBuf;

use url::Url;

use crate::{PagesenseError, Result};

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: "Mozilla/5.0 (compatible; Pagesense/0.1)".to_string() }
    }
}

/// HTML plus the URL it was served from, when it came from the network.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub html: String,
    /// Final URL after redirects.
    pub url: Option<Url>,
}

/// Loads `input` from stdin, the network or disk.
pub async fn load_page(input: &str, config: &FetchConfig) -> Result<LoadedPage> {
    if input == "-" {
        return Ok(LoadedPage { html: fetch_stdin()?, url: None });
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        return fetch_page(input, config).await;
    }

    Ok(LoadedPage { html: fetch_file(input)?, url: None })
}

/// Fetches a page, keeping the final URL.
#[cfg(feature = "fetch")]
pub async fn fetch_page(url: &str, config: &FetchConfig) -> Result<LoadedPage> {
    use std::time::Duration;

    let parsed_url = Url::parse(url).map_err(|e| PagesenseError::InvalidUrl(e.to_string()))?;
    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(PagesenseError::InvalidUrl(format!("unsupported scheme: {}", parsed_url.scheme())));
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()?;

    tracing::debug!(url = %parsed_url, "fetching page");
    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| if e.is_timeout() { PagesenseError::Timeout { timeout: config.timeout } } else { e.into() })?;

    let final_url = response.url().clone();
    let html = response.text().await?;

    Ok(LoadedPage { html, url: Some(final_url) })
}

#[cfg(not(feature = "fetch"))]
pub async fn fetch_page(url: &str, _config: &FetchConfig) -> Result<LoadedPage> {
    Err(PagesenseError::InvalidUrl(format!("{} (built without URL fetching)", url)))
}

/// Fetches HTML content from a URL.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    Ok(fetch_page(url, config).await?.html)
}

/// Reads HTML content from a local file.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(PagesenseError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(PagesenseError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

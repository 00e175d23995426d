//! Fetching widget data files.
//!
//! Widgets resolve their JSON path against the page base URL, set a `_ts`
//! cache-busting parameter and fetch with no-store semantics so CDN layers in
//! front of the static site never serve a stale snapshot.

use reqwest::Client;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde_json::Value;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Query parameter carrying the cache-busting token.
pub const CACHE_BUST_PARAM: &str = "_ts";

/// Status and body of a fetched data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can serve the site's data files.
pub trait JsonSource {
    /// Fetch `url` bypassing every cache. Transport failures are errors;
    /// HTTP error statuses are returned as responses.
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Box<dyn Error>>;
}

/// Resolve `relative` against `base` and set the cache-busting parameter,
/// replacing any earlier value.
pub fn cache_busted_url(base: &Url, relative: &str, token: i64) -> Result<Url, url::ParseError> {
    let mut url = base.join(relative)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != CACHE_BUST_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(CACHE_BUST_PARAM, &token.to_string());
    Ok(url)
}

/// Fetch and parse a data file.
///
/// # Errors
///
/// Returns an error for transport failures, non-success statuses, and bodies
/// that are not JSON. Callers in the widgets treat all three the same way.
#[instrument(level = "debug", skip(source), fields(url = %url))]
pub async fn fetch_json<S: JsonSource>(source: &S, url: &Url) -> Result<Value, Box<dyn Error>> {
    let res = source.fetch(url).await?;
    if !res.is_success() {
        return Err(format!("HTTP {} for {url}", res.status).into());
    }
    debug!(bytes = res.body.len(), "Fetched data file");
    Ok(serde_json::from_str(&res.body)?)
}

/// Serves data files over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpJsonSource {
    client: Client,
}

impl HttpJsonSource {
    pub fn new(timeout: Duration) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl JsonSource for HttpJsonSource {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Box<dyn Error>> {
        let res = self
            .client
            .get(url.clone())
            .header(CACHE_CONTROL, "no-store, no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;
        let status = res.status().as_u16();
        let body = res.text().await?;
        Ok(FetchResponse { status, body })
    }
}

/// Serves data files from a local checkout of the site, for previews.
///
/// Only `file:` URLs are served; a missing file is a 404.
#[derive(Debug, Clone)]
pub struct DirJsonSource {
    root: PathBuf,
}

impl DirJsonSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The `file:` base URL for the site root.
    pub fn base_url(&self) -> Result<Url, Box<dyn Error>> {
        let root = std::fs::canonicalize(&self.root)?;
        Url::from_directory_path(&root)
            .map_err(|_| format!("not an absolute directory: {}", root.display()).into())
    }
}

impl JsonSource for DirJsonSource {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Box<dyn Error>> {
        if url.scheme() != "file" {
            return Err(format!("unsupported scheme for local site: {url}").into());
        }
        let path = url
            .to_file_path()
            .map_err(|_| format!("not a local path: {url}"))?;

        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(FetchResponse { status: 200, body }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FetchResponse {
                status: 404,
                body: String::new(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Either source, chosen at startup.
#[derive(Debug, Clone)]
pub enum SiteSource {
    Http(HttpJsonSource),
    Dir(DirJsonSource),
}

impl JsonSource for SiteSource {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Box<dyn Error>> {
        match self {
            SiteSource::Http(source) => source.fetch(url).await,
            SiteSource::Dir(source) => source.fetch(url).await,
        }
    }
}

//! Canonicalization of Instagram post links.
//!
//! Profile pages link to posts in several shapes:
//! - `/p/<code>/` and `/reel/<code>/`
//! - `/<username>/p/<code>/`
//! - absolute URLs with query strings or fragments attached
//!
//! All of them reduce to `https://www.instagram.com/{p|reel}/{code}/`.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Origin used for canonical URLs and for resolving relative hrefs.
pub const INSTAGRAM_ORIGIN: &str = "https://www.instagram.com/";

/// Bare or profile-qualified post path, optional trailing slash.
static POST_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/(?:[^/]+/)?(p|reel)/([^/]+)/?$").unwrap());

static ORIGIN: Lazy<Url> = Lazy::new(|| Url::parse(INSTAGRAM_ORIGIN).unwrap());

/// Map a raw anchor href to its canonical post URL.
///
/// Relative hrefs are resolved against [`INSTAGRAM_ORIGIN`]. Query and
/// fragment are ignored. Returns `None` for anything that is not a post or
/// reel link, including input that does not parse as a URL.
pub fn normalize_post_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => ORIGIN.join(raw).ok()?,
        Err(_) => return None,
    };

    let caps = POST_PATH.captures(parsed.path())?;
    let kind = caps.get(1)?.as_str();
    let code = caps.get(2)?.as_str();
    Some(format!("{INSTAGRAM_ORIGIN}{kind}/{code}/"))
}

//! Page harvesters that collect raw post links from the Instagram profile.
//!
//! Every harvester implements [`Harvester`] and returns raw href strings in
//! page order. Results may contain duplicates and unrelated links;
//! normalization and deduplication happen in the
//! [`pipeline`](crate::pipeline).
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Rendered profile page | [`webdriver`] | Headless Chrome | Needs a running chromedriver |
//! | Profile info endpoint | [`profile_api`] | JSON API | No browser; rate-limited aggressively |
//!
//! # Failure Modes
//!
//! - Navigation or request failure is fatal and propagates as an error
//! - A page with no matching anchors (or a login wall) is an empty list, not
//!   an error; the pipeline's safety gate decides what to do with it

use std::error::Error;

pub mod profile_api;
pub mod webdriver;

/// Realistic desktop user agent sent by both harvesters.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122 Safari/537.36";

/// A source of raw anchor hrefs for a profile page.
pub trait Harvester {
    /// Collect every candidate link for `profile_url`, in discovery order.
    async fn harvest(&self, profile_url: &str) -> Result<Vec<String>, Box<dyn Error>>;
}

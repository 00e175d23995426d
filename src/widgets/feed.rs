//! Instagram feed renderer for the homepage.
//!
//! Loads `data/instagram.json`, renders up to two (narrow viewport) or four
//! embed placeholders into `#insta-latest`, and writes plain fallback links
//! into `#insta-fallback-links` for visitors whose privacy tools block the
//! embed script. Every failure degrades to a static message; nothing is
//! surfaced to the caller.

use super::dom::{Dom, Element};
use super::embed::{EmbedRuntime, ExternalScript};
use super::fetch::{JsonSource, cache_busted_url, fetch_json};
use crate::utils::{epoch_millis, html_escape};
use chrono::DateTime;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Widths at or below this many CSS pixels count as narrow.
pub const NARROW_BREAKPOINT_PX: u32 = 980;
pub const NARROW_MAX_POSTS: usize = 2;
pub const WIDE_MAX_POSTS: usize = 4;

pub const FEED_SNAPSHOT_PATH: &str = "data/instagram.json";
pub const UNAVAILABLE_MESSAGE: &str = "Instagram feed temporarily unavailable.";
pub const NO_POSTS_MESSAGE: &str = "No posts loaded yet. Check back soon.";

/// Responsive cap on rendered posts.
pub fn max_posts_for_width(width: u32) -> usize {
    if width <= NARROW_BREAKPOINT_PX {
        NARROW_MAX_POSTS
    } else {
        WIDE_MAX_POSTS
    }
}

/// Element ids the feed renders into.
#[derive(Debug, Clone)]
pub struct FeedIds {
    pub container: String,
    pub fallback: String,
    pub updated_at: String,
}

impl Default for FeedIds {
    fn default() -> Self {
        Self {
            container: "insta-latest".to_string(),
            fallback: "insta-fallback-links".to_string(),
            updated_at: "insta-updated-at".to_string(),
        }
    }
}

/// What a load left on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRender {
    /// The page has no feed container.
    NoContainer,
    Unavailable,
    NoPosts,
    Embeds(usize),
}

/// Feed widget state for one page view.
#[derive(Debug, Clone)]
pub struct FeedWidget {
    ids: FeedIds,
    base_url: Url,
    snapshot_path: String,
    last_cap: Option<usize>,
    script: ExternalScript,
}

impl FeedWidget {
    pub fn new(base_url: Url) -> Self {
        Self {
            ids: FeedIds::default(),
            base_url,
            snapshot_path: FEED_SNAPSHOT_PATH.to_string(),
            last_cap: None,
            script: ExternalScript::instagram_embed(),
        }
    }

    pub fn with_snapshot_path(mut self, path: &str) -> Self {
        self.snapshot_path = path.to_string();
        self
    }

    /// Cap used by the most recent load.
    pub fn last_cap(&self) -> Option<usize> {
        self.last_cap
    }

    /// Fetch the snapshot and render it for a viewport `width` pixels wide.
    #[instrument(level = "info", skip_all, fields(width = width))]
    pub async fn load<D, S, R>(
        &mut self,
        dom: &mut D,
        source: &S,
        runtime: &mut R,
        width: u32,
    ) -> FeedRender
    where
        D: Dom,
        S: JsonSource,
        R: EmbedRuntime,
    {
        let cap = max_posts_for_width(width);
        self.last_cap = Some(cap);

        if !dom.exists(&self.ids.container) {
            debug!("No feed container on this page");
            return FeedRender::NoContainer;
        }

        let data = match cache_busted_url(&self.base_url, &self.snapshot_path, epoch_millis()) {
            Ok(url) => fetch_json(source, &url).await,
            Err(e) => Err(e.into()),
        };
        let data = match data {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Feed snapshot unavailable");
                self.show_message(dom, UNAVAILABLE_MESSAGE);
                return FeedRender::Unavailable;
            }
        };

        let mut urls = post_urls_from_snapshot(&data);
        urls.truncate(cap);

        if dom.exists(&self.ids.updated_at) {
            dom.set_text(&self.ids.updated_at, &updated_label(&data));
        }

        if urls.is_empty() {
            self.show_message(dom, NO_POSTS_MESSAGE);
            return FeedRender::NoPosts;
        }

        dom.set_inner_html(&self.ids.container, "");
        for url in &urls {
            dom.append_child(&self.ids.container, embed_placeholder(url));
        }
        dom.set_inner_html(&self.ids.fallback, &fallback_links_html(&urls));

        self.script.request(dom, runtime);

        info!(count = urls.len(), cap, "Rendered feed placeholders");
        FeedRender::Embeds(urls.len())
    }

    /// Re-run the load when a resize moves the viewport across the breakpoint.
    ///
    /// Returns `None` when the cap is unchanged and nothing was re-rendered.
    pub async fn on_resize<D, S, R>(
        &mut self,
        dom: &mut D,
        source: &S,
        runtime: &mut R,
        width: u32,
    ) -> Option<FeedRender>
    where
        D: Dom,
        S: JsonSource,
        R: EmbedRuntime,
    {
        if self.last_cap == Some(max_posts_for_width(width)) {
            return None;
        }
        Some(self.load(dom, source, runtime, width).await)
    }

    /// The host reports that the embed script has loaded.
    pub fn on_embed_script_loaded<R: EmbedRuntime>(&mut self, runtime: &mut R) {
        self.script.on_load(runtime);
    }

    fn show_message<D: Dom>(&self, dom: &mut D, message: &str) {
        dom.set_inner_html(
            &self.ids.container,
            &format!("<div class=\"small\">{message}</div>"),
        );
        dom.set_inner_html(&self.ids.fallback, "");
    }
}

/// Trimmed, non-empty post URLs in snapshot order.
///
/// A missing or non-array `posts` field is an empty list; entries without a
/// string `url` are dropped.
pub fn post_urls_from_snapshot(data: &Value) -> Vec<String> {
    data.get("posts")
        .and_then(Value::as_array)
        .map(|posts| {
            posts
                .iter()
                .filter_map(|post| post.get("url")?.as_str())
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `Updated: 2026-02-07 12:34 UTC`, or empty when `updated_at` is missing or invalid.
pub fn updated_label(data: &Value) -> String {
    data.get("updated_at")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|ts| {
            format!(
                "Updated: {}",
                ts.with_timezone(&chrono::Utc).format("%Y-%m-%d %H:%M UTC")
            )
        })
        .unwrap_or_default()
}

fn embed_placeholder(url: &str) -> Element {
    Element::new("blockquote")
        .attr("class", "instagram-media")
        .attr("data-instgrm-permalink", url)
        .attr("data-instgrm-version", "14")
}

fn fallback_links_html(urls: &[String]) -> String {
    urls.iter()
        .enumerate()
        .map(|(i, url)| {
            format!(
                "<div><a href=\"{}\" target=\"_blank\" rel=\"noopener\">\
                 Instagram post {}</a></div>",
                html_escape(url),
                i + 1
            )
        })
        .collect()
}

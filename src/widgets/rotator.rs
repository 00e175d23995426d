//! Homepage photo rotator.
//!
//! Two independent steps:
//! 1. [`load_gallery_slides`] fetches `data/gallery.json` and writes slide
//!    nodes into `#hero-rotator-slides`, or hides the photo sections when
//!    there is nothing to show.
//! 2. [`RotationController`] reads whatever slide nodes are in the page
//!    (fetched or statically authored) and cycles through them.

use super::dom::{Dom, Element};
use super::fetch::{JsonSource, cache_busted_url, fetch_json};
use crate::models::{GalleryImage, Slide};
use crate::utils::epoch_millis;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const GALLERY_SNAPSHOT_PATH: &str = "data/gallery.json";
pub const MAX_SLIDES: usize = 20;
pub const ROTATE_INTERVAL: Duration = Duration::from_secs(4);

pub const ROTATOR_SECTION: &str = "section.photo-rotator";
pub const HIGHLIGHTS_CARD: &str = ".card.photo-highlights";

const DATA_IMAGE_URL: &str = "data-image-url";
const DATA_CAPTION: &str = "data-caption";

/// Element ids the rotator uses.
#[derive(Debug, Clone)]
pub struct RotatorIds {
    pub image: String,
    pub slides: String,
    pub caption: String,
    pub prev: String,
    pub next: String,
}

impl Default for RotatorIds {
    fn default() -> Self {
        Self {
            image: "hero-rotator-image".to_string(),
            slides: "hero-rotator-slides".to_string(),
            caption: "hero-rotator-caption".to_string(),
            prev: "hero-rotator-prev".to_string(),
            next: "hero-rotator-next".to_string(),
        }
    }
}

/// What the gallery load did to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryLoad {
    /// The page lacks the rotator markup.
    NoRotator,
    /// No usable images; both photo sections are hidden.
    Hidden,
    Shown(usize),
}

/// Usable slides from a gallery snapshot, in file order.
///
/// Entries that are not objects or lack a non-empty string `url` are skipped.
/// Other fields are optional and any type is tolerated.
pub fn slides_from_gallery(data: &Value) -> Vec<Slide> {
    let Some(images) = data.get("images").and_then(Value::as_array) else {
        return Vec::new();
    };

    images
        .iter()
        .filter_map(|image| serde_json::from_value::<GalleryImage>(image.clone()).ok())
        .map(|image| Slide::from(&image))
        .filter(|slide| !slide.url.is_empty())
        .collect()
}

/// Fetch the gallery snapshot and populate the slide nodes.
#[instrument(level = "info", skip_all)]
pub async fn load_gallery_slides<D, S>(
    dom: &mut D,
    source: &S,
    base_url: &Url,
    gallery_path: &str,
    ids: &RotatorIds,
) -> GalleryLoad
where
    D: Dom,
    S: JsonSource,
{
    if !dom.exists(&ids.slides) || !dom.exists(&ids.image) {
        debug!("No rotator on this page");
        return GalleryLoad::NoRotator;
    }

    let data = match cache_busted_url(base_url, gallery_path, epoch_millis()) {
        Ok(url) => fetch_json(source, &url).await,
        Err(e) => Err(e.into()),
    };
    let slides = match data {
        Ok(data) => slides_from_gallery(&data),
        Err(e) => {
            warn!(error = %e, "Gallery snapshot unavailable");
            Vec::new()
        }
    };

    if slides.is_empty() {
        set_photo_sections_hidden(dom, true);
        return GalleryLoad::Hidden;
    }
    set_photo_sections_hidden(dom, false);

    dom.set_inner_html(&ids.slides, "");
    for slide in slides.iter().take(MAX_SLIDES) {
        dom.append_child(
            &ids.slides,
            Element::new("div")
                .attr(DATA_IMAGE_URL, &slide.url)
                .attr(DATA_CAPTION, slide.display_caption()),
        );
    }

    let first = &slides[0];
    dom.set_text(&ids.caption, first.display_caption());
    dom.set_attribute(&ids.image, "src", &first.url);
    dom.set_attribute(&ids.image, "alt", first.display_caption());

    let shown = slides.len().min(MAX_SLIDES);
    info!(available = slides.len(), shown, "Loaded gallery slides");
    GalleryLoad::Shown(shown)
}

fn set_photo_sections_hidden<D: Dom>(dom: &mut D, hidden: bool) {
    dom.set_hidden(ROTATOR_SECTION, hidden);
    dom.set_hidden(HIGHLIGHTS_CARD, hidden);
}

/// Cycles the hero image through the slides present in the page.
#[derive(Debug, Clone)]
pub struct RotationController {
    ids: RotatorIds,
    slides: Vec<Slide>,
    index: usize,
    has_prev: bool,
    has_next: bool,
}

impl RotationController {
    /// Read slide nodes from the page and show the first one.
    ///
    /// Returns `None` when the rotator markup is missing or no slide has an
    /// image URL.
    pub fn from_dom<D: Dom>(dom: &mut D, ids: RotatorIds) -> Option<Self> {
        if !dom.exists(&ids.image) || !dom.exists(&ids.slides) {
            return None;
        }

        let slides: Vec<Slide> = dom
            .children(&ids.slides)
            .iter()
            .map(|el| Slide {
                url: el.get_attr(DATA_IMAGE_URL).unwrap_or_default().trim().to_string(),
                caption: el.get_attr(DATA_CAPTION).unwrap_or_default().trim().to_string(),
            })
            .filter(|s| !s.url.is_empty())
            .collect();
        if slides.is_empty() {
            return None;
        }

        let controller = Self {
            has_prev: dom.exists(&ids.prev),
            has_next: dom.exists(&ids.next),
            ids,
            slides,
            index: 0,
        };
        controller.render(dom);
        Some(controller)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn current(&self) -> &Slide {
        &self.slides[self.index]
    }

    /// Auto-advance only makes sense with more than one slide.
    pub fn autoplays(&self) -> bool {
        self.slides.len() > 1
    }

    /// Move `delta` slides, wrapping at both ends.
    pub fn step<D: Dom>(&mut self, dom: &mut D, delta: isize) {
        let len = self.slides.len() as isize;
        self.index = (self.index as isize + delta).rem_euclid(len) as usize;
        self.render(dom);
    }

    pub fn next<D: Dom>(&mut self, dom: &mut D) {
        self.step(dom, 1);
    }

    pub fn prev<D: Dom>(&mut self, dom: &mut D) {
        self.step(dom, -1);
    }

    /// Dispatch a click on `element_id`. Returns whether a control handled it.
    pub fn on_click<D: Dom>(&mut self, dom: &mut D, element_id: &str) -> bool {
        if self.has_prev && element_id == self.ids.prev {
            self.prev(dom);
            true
        } else if self.has_next && element_id == self.ids.next {
            self.next(dom);
            true
        } else {
            false
        }
    }

    /// Advance every [`ROTATE_INTERVAL`]. Runs forever when `ticks` is `None`.
    pub async fn autoplay<D: Dom>(&mut self, dom: &mut D, ticks: Option<u64>) {
        if !self.autoplays() {
            return;
        }
        let mut interval = interval_at(Instant::now() + ROTATE_INTERVAL, ROTATE_INTERVAL);
        let mut done = 0u64;
        while ticks.is_none_or(|limit| done < limit) {
            interval.tick().await;
            self.next(dom);
            done += 1;
        }
    }

    fn render<D: Dom>(&self, dom: &mut D) {
        let active = self.current();
        dom.set_attribute(&self.ids.image, "src", &active.url);
        if !active.caption.is_empty() {
            dom.set_attribute(&self.ids.image, "alt", &active.caption);
        }
        dom.set_text(&self.ids.caption, active.display_caption());
    }
}

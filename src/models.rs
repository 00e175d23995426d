//! Data models for the feed and gallery snapshots.
//!
//! This module defines the structures exchanged through the file contract
//! between the scraper and the homepage widgets:
//! - [`PostRecord`]: A single canonical Instagram post or reel URL
//! - [`FeedSnapshot`]: The full `instagram.json` document written by the scraper
//! - [`GalleryImage`]: One entry of the externally produced `gallery.json`
//! - [`Slide`]: A rotator slide derived from a gallery image or a static slide node
//!
//! The gallery structures use camelCase field names to match the JSON produced
//! by the gallery updater, hence the `#[serde(rename)]` attributes.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Caption shown when a slide or gallery image has none.
pub const DEFAULT_CAPTION: &str = "Featured photo";

/// A canonical Instagram post URL.
///
/// When produced by the scrape pipeline, `url` always has the shape
/// `https://www.instagram.com/{p|reel}/{code}/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostRecord {
    pub url: String,
}

/// The latest known good state of the Instagram feed.
///
/// Each successful scrape replaces the whole file; snapshots are never
/// merged. `posts` keeps the discovery order from the profile page, which is
/// most recent first.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeedSnapshot {
    /// The profile URL that was scraped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// RFC 3339 UTC timestamp of the scrape.
    pub updated_at: String,
    /// Number of posts in this snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub posts: Vec<PostRecord>,
}

impl FeedSnapshot {
    /// Build a snapshot from canonical URLs, keeping their order.
    pub fn new(source: Option<String>, updated_at: String, urls: Vec<String>) -> Self {
        let posts: Vec<PostRecord> = urls.into_iter().map(|url| PostRecord { url }).collect();
        Self {
            source,
            updated_at,
            count: Some(posts.len()),
            posts,
        }
    }
}

/// One image entry from `gallery.json`.
///
/// Every field is optional on read, and a field that is not a string
/// (`null`, a number) reads as empty. The rotator drops entries without a
/// usable `url`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GalleryImage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub caption: String,
    #[serde(
        default,
        rename = "webViewLink",
        deserialize_with = "lenient_string"
    )]
    pub web_view_link: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string).unwrap_or_default())
}

/// A single slide shown by the photo rotator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub url: String,
    pub caption: String,
}

impl Slide {
    /// The caption to display, falling back to [`DEFAULT_CAPTION`].
    pub fn display_caption(&self) -> &str {
        if self.caption.is_empty() {
            DEFAULT_CAPTION
        } else {
            &self.caption
        }
    }
}

impl From<&GalleryImage> for Slide {
    fn from(image: &GalleryImage) -> Self {
        Slide {
            url: image.url.trim().to_string(),
            caption: image.caption.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_snapshot_new_sets_count() {
        let snapshot = FeedSnapshot::new(
            Some("https://www.instagram.com/newyorkromaniangroup/".to_string()),
            "2026-02-07T12:34:56Z".to_string(),
            vec![
                "https://www.instagram.com/p/A/".to_string(),
                "https://www.instagram.com/reel/B/".to_string(),
            ],
        );

        assert_eq!(snapshot.count, Some(2));
        assert_eq!(snapshot.posts[0].url, "https://www.instagram.com/p/A/");
        assert_eq!(snapshot.posts[1].url, "https://www.instagram.com/reel/B/");
    }

    #[test]
    fn test_feed_snapshot_deserialization_without_optional_fields() {
        let json = r#"{
            "updated_at": "2026-02-07T12:34:56Z",
            "posts": [{ "url": "https://www.instagram.com/p/POST_ID/" }]
        }"#;

        let snapshot: FeedSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.source, None);
        assert_eq!(snapshot.count, None);
        assert_eq!(snapshot.posts.len(), 1);
    }

    #[test]
    fn test_feed_snapshot_serialization_skips_missing_source() {
        let snapshot = FeedSnapshot {
            source: None,
            updated_at: "2026-02-07T12:34:56Z".to_string(),
            count: None,
            posts: vec![],
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("source"));
        assert!(!json.contains("count"));
        assert!(json.contains("\"posts\":[]"));
    }

    #[test]
    fn test_gallery_image_camel_case_link() {
        let json = r#"{
            "url": " https://drive.google.com/uc?id=1 ",
            "webViewLink": "https://drive.google.com/file/d/1/view"
        }"#;
        let image: GalleryImage = serde_json::from_str(json).unwrap();
        assert_eq!(image.web_view_link, "https://drive.google.com/file/d/1/view");
        assert_eq!(image.caption, "");

        let slide = Slide::from(&image);
        assert_eq!(slide.url, "https://drive.google.com/uc?id=1");
        assert_eq!(slide.display_caption(), DEFAULT_CAPTION);
    }

    #[test]
    fn test_gallery_image_tolerates_wrong_field_types() {
        let json = r#"{ "url": "https://img.example/a.jpg", "caption": null, "webViewLink": 7 }"#;
        let image: GalleryImage = serde_json::from_str(json).unwrap();
        assert_eq!(image.url, "https://img.example/a.jpg");
        assert_eq!(image.caption, "");
        assert_eq!(image.web_view_link, "");

        let image: GalleryImage = serde_json::from_str(r#"{ "url": 3 }"#).unwrap();
        assert_eq!(image.url, "");
    }
}

//! Browserless harvester using Instagram's `web_profile_info` endpoint.
//!
//! The endpoint returns the profile's most recent timeline media as JSON.
//! Each node's shortcode is turned into a post href so the result flows
//! through the same normalization as anchors scraped from a rendered page.

use super::{DESKTOP_USER_AGENT, Harvester};
use crate::normalize::INSTAGRAM_ORIGIN;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde_json::Value;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

const PROFILE_INFO_ENDPOINT: &str = "https://i.instagram.com/api/v1/users/web_profile_info/";

/// App id the public web client sends with profile requests.
const WEB_APP_ID: &str = "936619743392459";

/// Harvests post links from the JSON profile endpoint.
#[derive(Debug, Clone)]
pub struct ProfileApiHarvester {
    client: Client,
    endpoint: String,
}

impl ProfileApiHarvester {
    pub fn new(timeout: Duration) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .user_agent(DESKTOP_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: PROFILE_INFO_ENDPOINT.to_string(),
        })
    }
}

impl Harvester for ProfileApiHarvester {
    #[instrument(level = "info", skip(self))]
    async fn harvest(&self, profile_url: &str) -> Result<Vec<String>, Box<dyn Error>> {
        let username = username_from_profile_url(profile_url)
            .ok_or_else(|| format!("cannot derive a username from {profile_url}"))?;

        let res = self
            .client
            .get(&self.endpoint)
            .query(&[("username", username.as_str())])
            .header("accept", "*/*")
            .header("accept-language", "en-US,en;q=0.9")
            .header("x-ig-app-id", WEB_APP_ID)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(format!(
                "profile request failed: {status}\n{}",
                truncate_for_log(&body, 300)
            )
            .into());
        }

        let data: Value = serde_json::from_str(&body)?;
        let hrefs = hrefs_from_profile_info(&data);
        info!(%username, count = hrefs.len(), "Collected timeline shortcodes");
        debug!(hrefs = ?hrefs, "Profile API hrefs");
        Ok(hrefs)
    }
}

/// First path segment of a profile URL, e.g. `newyorkromaniangroup`.
pub fn username_from_profile_url(profile_url: &str) -> Option<String> {
    let url = Url::parse(profile_url).ok()?;
    url.path_segments()?
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Build post hrefs from a `web_profile_info` response.
///
/// Nodes without a shortcode are skipped; a response without the expected
/// shape yields an empty list.
pub fn hrefs_from_profile_info(data: &Value) -> Vec<String> {
    let Some(edges) = data
        .pointer("/data/user/edge_owner_to_timeline_media/edges")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    edges
        .iter()
        .filter_map(|edge| edge.get("node"))
        .filter_map(|node| {
            let shortcode = node.get("shortcode")?.as_str()?.trim();
            if shortcode.is_empty() {
                return None;
            }
            let kind = match node.get("product_type").and_then(Value::as_str) {
                Some("clips") => "reel",
                _ => "p",
            };
            Some(format!("{INSTAGRAM_ORIGIN}{kind}/{shortcode}/"))
        })
        .collect()
}

//! The scrape pipeline: harvest, normalize, dedupe, truncate, gate, persist.
//!
//! A single run either produces a complete snapshot or leaves the existing
//! file exactly as it was. Nothing is retried; recovery is running again
//! later from the scheduler.

use crate::models::FeedSnapshot;
use crate::normalize::normalize_post_url;
use crate::outputs::json::write_snapshot;
use crate::scrapers::Harvester;
use crate::utils::utc_now_rfc3339;
use itertools::Itertools;
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

/// Number of posts a complete snapshot holds.
pub const DEFAULT_LIMIT: usize = 3;

/// Inputs for one scrape run.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub profile_url: String,
    pub limit: usize,
    pub json_path: PathBuf,
}

/// What a scrape run did with the snapshot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// A new snapshot with `count` posts replaced the file.
    Written { count: usize },
    /// Too few posts were found; the file was left untouched.
    Skipped { found: usize, limit: usize },
}

/// Normalize raw hrefs, drop non-posts and duplicates, keep the first `limit`.
pub fn select_post_urls<I, S>(hrefs: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    hrefs
        .into_iter()
        .filter_map(|href| normalize_post_url(href.as_ref()))
        .unique()
        .take(limit)
        .collect()
}

/// Run one scrape against `harvester` and persist the result if it is complete.
///
/// # Errors
///
/// Harvest failures (navigation timeout, request errors) and write failures
/// propagate. In both cases no partial file is written.
#[instrument(
    level = "info",
    skip_all,
    fields(profile = %options.profile_url, limit = options.limit)
)]
pub async fn run_scrape<H: Harvester>(
    harvester: &H,
    options: &ScrapeOptions,
) -> Result<ScrapeOutcome, Box<dyn Error>> {
    let limit = options.limit.max(1);

    let hrefs = harvester.harvest(&options.profile_url).await?;
    debug!(raw = hrefs.len(), "Harvested raw hrefs");

    let urls = select_post_urls(&hrefs, limit);
    info!(found = urls.len(), "Normalized post URLs");

    if urls.len() < limit {
        warn!(
            found = urls.len(),
            limit,
            path = %options.json_path.display(),
            "Too few post URLs; likely blocked or posts did not load. Keeping existing snapshot"
        );
        return Ok(ScrapeOutcome::Skipped {
            found: urls.len(),
            limit,
        });
    }

    let count = urls.len();
    let snapshot = FeedSnapshot::new(Some(options.profile_url.clone()), utc_now_rfc3339(), urls);
    write_snapshot(&snapshot, &options.json_path).await?;
    info!(count, path = %options.json_path.display(), "Snapshot updated");

    Ok(ScrapeOutcome::Written { count })
}

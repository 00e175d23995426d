//! JSON snapshot persistence.
//!
//! The feed snapshot is a single file that each successful scrape replaces in
//! full. Writes go to a sibling `.tmp` file first and are then renamed over
//! the destination, so readers only ever see the previous or the new
//! snapshot, never a partial one.

use crate::models::FeedSnapshot;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, instrument};

/// Write a [`FeedSnapshot`] to `path`, replacing any existing file.
///
/// Creates the parent directory if it is missing. The JSON is pretty-printed
/// with a trailing newline so diffs of the committed file stay readable.
#[instrument(
    level = "info",
    skip_all,
    fields(path = %path.display(), posts = snapshot.posts.len())
)]
pub async fn write_snapshot(snapshot: &FeedSnapshot, path: &Path) -> Result<(), Box<dyn Error>> {
    let mut json = serde_json::to_string_pretty(snapshot)?;
    json.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create snapshot dir");
            return Err(e.into());
        }
    }

    let tmp = tmp_path(path);
    debug!(tmp = %tmp.display(), "Writing temporary snapshot");
    fs::write(&tmp, json).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        error!(error = %e, "Failed to replace snapshot");
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    info!("Wrote feed snapshot");
    Ok(())
}

/// Read a previously written snapshot.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn read_snapshot(path: &Path) -> Result<FeedSnapshot, Box<dyn Error>> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(urls: &[&str]) -> FeedSnapshot {
        FeedSnapshot::new(
            None,
            "2026-02-07T12:34:56Z".to_string(),
            urls.iter().map(|u| u.to_string()).collect(),
        )
    }

    #[tokio::test]
    async fn test_write_creates_parent_dir_and_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data").join("instagram.json");

        let written = snapshot(&["https://www.instagram.com/p/A/"]);
        write_snapshot(&written, &path).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with("}\n"));
        assert_eq!(read_snapshot(&path).await.unwrap(), written);
        assert!(!tmp.path().join("data").join("instagram.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_replaces_instead_of_merging() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("instagram.json");

        let old = snapshot(&[
            "https://www.instagram.com/p/OLD1/",
            "https://www.instagram.com/p/OLD2/",
        ]);
        write_snapshot(&old, &path).await.unwrap();
        write_snapshot(&snapshot(&["https://www.instagram.com/p/NEW/"]), &path)
            .await
            .unwrap();

        let read = read_snapshot(&path).await.unwrap();
        assert_eq!(read.posts.len(), 1);
        assert_eq!(read.posts[0].url, "https://www.instagram.com/p/NEW/");
    }

    #[test]
    fn test_tmp_path_is_sibling() {
        assert_eq!(
            tmp_path(Path::new("assets/instagram.json")),
            PathBuf::from("assets/instagram.json.tmp")
        );
    }
}

//! Utility functions for timestamps, string handling, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - UTC timestamps for snapshots and cache busting
//! - String truncation for logging response previews
//! - HTML escaping for markup built from snapshot data
//! - A side-effect-free writability check for the snapshot directory

use chrono::{SecondsFormat, Utc};
use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Current UTC time as RFC 3339 with second precision, e.g. `2026-02-07T12:34:56Z`.
pub fn utc_now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Milliseconds since the Unix epoch, used as the cache-busting token.
pub fn epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Escape text for use inside HTML content or a quoted attribute value.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Check that `path`, or its nearest existing ancestor, is a writable directory.
///
/// Nothing is created or written: missing directories are made by the
/// snapshot writer, and only when a snapshot is actually written. Writability
/// is judged from the permission bits.
///
/// # Errors
///
/// Returns an error if:
/// - The nearest existing ancestor is not a directory
/// - That directory is read-only
/// - Its metadata cannot be read (other than not existing)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn check_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    let mut candidate = path;
    loop {
        match fs::metadata(candidate).await {
            Ok(meta) if !meta.is_dir() => {
                return Err(format!("{} is not a directory", candidate.display()).into());
            }
            Ok(meta) if meta.permissions().readonly() => {
                return Err(format!("{} is read-only", candidate.display()).into());
            }
            Ok(_) => {
                info!(checked = %candidate.display(), "Snapshot directory is writable");
                return Ok(());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                candidate = match candidate.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent,
                    Some(_) => Path::new("."),
                    None => return Err(e.into()),
                };
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "ăăăă";
        let result = truncate_for_log(s, 3);
        assert!(result.starts_with("ă…"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"https://x/?a=1&b="2"<script>"#),
            "https://x/?a=1&amp;b=&quot;2&quot;&lt;script&gt;"
        );
        assert_eq!(html_escape("plain"), "plain");
    }

    #[test]
    fn test_utc_now_rfc3339_shape() {
        let now = utc_now_rfc3339();
        assert!(now.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok());
    }

    #[tokio::test]
    async fn test_check_writable_dir_does_not_create_missing_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("assets").join("data");
        check_writable_dir(&nested).await.unwrap();
        assert!(!tmp.path().join("assets").exists());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_check_writable_dir_rejects_file_ancestor() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("data");
        std::fs::write(&file, "not a dir").unwrap();
        assert!(check_writable_dir(&file.join("nested")).await.is_err());
    }

    #[tokio::test]
    async fn test_check_writable_dir_rejects_read_only_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let locked = tmp.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        let mut perms = std::fs::metadata(&locked).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&locked, perms.clone()).unwrap();

        let result = check_writable_dir(&locked.join("data")).await;

        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        std::fs::set_permissions(&locked, perms).unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_check_writable_dir_relative_path() {
        check_writable_dir(Path::new("no-such-dir-for-nyrg/data"))
            .await
            .unwrap();
    }
}

//! Output generation for the feed snapshot.
//!
//! # Submodules
//!
//! - [`json`]: Writes [`FeedSnapshot`](crate::models::FeedSnapshot) data to
//!   `instagram.json`, replacing any previous snapshot atomically
//!
//! # Output Structure
//!
//! ```text
//! assets/
//! └── data/
//!     └── instagram.json
//! ```

pub mod json;

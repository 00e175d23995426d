//! # nyrg_site
//!
//! Keeps the community homepage's Instagram preview fresh and implements the
//! homepage widgets that consume it.
//!
//! ## Architecture
//!
//! The crate has two halves that share nothing but a file contract:
//! 1. **Scraping**: harvest anchors from the public profile ([`scrapers`]),
//!    canonicalize them ([`normalize`]), and write `instagram.json` only when
//!    the result is complete ([`pipeline`], [`outputs`])
//! 2. **Widgets**: the feed renderer and photo rotator ([`widgets`]), written
//!    against an abstract page so they can run anywhere a [`widgets::dom::Dom`]
//!    exists

pub mod cli;
pub mod config;
pub mod models;
pub mod normalize;
pub mod outputs;
pub mod pipeline;
pub mod scrapers;
pub mod utils;
pub mod widgets;

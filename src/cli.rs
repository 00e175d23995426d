//! Command-line interface definitions.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Scrape options can also be provided via environment variables, which is
//! how the scheduled workflow configures them.

use crate::config::HarvestSource;
use clap::builder::BoolishValueParser;
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

/// Regenerate and preview the homepage Instagram feed.
///
/// # Examples
///
/// ```sh
/// # Scrape with chromedriver listening on :9515
/// nyrg_site scrape -j assets/data/instagram.json
///
/// # Scrape without a browser
/// nyrg_site scrape --source profile-api
///
/// # Preview the widgets against a local checkout at phone width
/// nyrg_site render --site-root ./site --width 390
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, global = true, env = "NYRG_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape the profile and update the feed snapshot if the result is complete
    Scrape(ScrapeArgs),
    /// Run the homepage widgets against a published or local site and print the markup
    Render(RenderArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScrapeArgs {
    /// Public profile page to scrape
    #[arg(long, env = "NYRG_IG_PROFILE_URL")]
    pub profile_url: Option<String>,

    /// Number of posts a complete snapshot holds
    #[arg(short, long, env = "NYRG_IG_LIMIT")]
    pub limit: Option<usize>,

    /// Snapshot file to write
    #[arg(short, long, env = "NYRG_IG_JSON_PATH")]
    pub json_path: Option<PathBuf>,

    /// Harvester to use
    #[arg(long, value_enum, env = "NYRG_IG_SOURCE")]
    pub source: Option<HarvestSource>,

    /// WebDriver endpoint (chromedriver)
    #[arg(long, env = "NYRG_WEBDRIVER_URL")]
    pub webdriver_url: Option<String>,

    /// Run Chrome headless (1/0, yes/no, true/false)
    #[arg(long, env = "NYRG_IG_HEADLESS", value_parser = BoolishValueParser::new())]
    pub headless: Option<bool>,

    /// Seconds to wait for the profile page to render
    #[arg(long)]
    pub settle_secs: Option<u64>,

    /// Log the visited page and save screenshots (1/0)
    #[arg(long, env = "NYRG_IG_DEBUG", value_parser = BoolishValueParser::new())]
    pub debug: Option<bool>,
}

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("site").required(true).args(["base_url", "site_root"])))]
pub struct RenderArgs {
    /// Base URL of the published site, e.g. https://example.github.io/site/
    #[arg(long)]
    pub base_url: Option<Url>,

    /// Local directory containing the site's data/ folder
    #[arg(long)]
    pub site_root: Option<PathBuf>,

    /// Viewport width in CSS pixels
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Advance the photo rotator this many slides after loading
    #[arg(long, default_value_t = 0)]
    pub rotate: u32,
}

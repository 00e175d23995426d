//! Configuration file support.
//!
//! Settings come from three layers, highest precedence first:
//! 1. Command-line flags and their environment variables (see [`crate::cli`])
//! 2. An optional `config.yaml`
//! 3. Built-in defaults
//!
//! ```yaml
//! profile_url: https://www.instagram.com/newyorkromaniangroup/
//! limit: 3
//! json_path: assets/data/instagram.json
//! source: webdriver
//! webdriver:
//!   server_url: http://localhost:9515
//!   headless: true
//!   settle_secs: 5
//!   debug: false
//!   debug_dir: debug
//! site:
//!   feed_path: data/instagram.json
//!   gallery_path: data/gallery.json
//! ```

use crate::cli::ScrapeArgs;
use crate::pipeline::DEFAULT_LIMIT;
use crate::scrapers::DESKTOP_USER_AGENT;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const DEFAULT_PROFILE_URL: &str = "https://www.instagram.com/newyorkromaniangroup/";

/// Which harvester a scrape uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HarvestSource {
    /// Rendered profile page through headless Chrome.
    #[default]
    Webdriver,
    /// The JSON profile endpoint, no browser.
    ProfileApi,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WebDriverConfig {
    pub server_url: String,
    pub headless: bool,
    pub user_agent: String,
    pub settle_secs: u64,
    pub page_load_timeout_secs: u64,
    pub anchor_wait_secs: u64,
    /// Headed runs only: time to log in by hand at the login wall.
    pub login_wait_secs: u64,
    pub user_data_dir: Option<PathBuf>,
    /// Extra logging plus screenshots in `debug_dir`.
    pub debug: bool,
    pub debug_dir: PathBuf,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:9515".to_string(),
            headless: true,
            user_agent: DESKTOP_USER_AGENT.to_string(),
            settle_secs: 5,
            page_load_timeout_secs: 30,
            anchor_wait_secs: 15,
            login_wait_secs: 60,
            user_data_dir: None,
            debug: false,
            debug_dir: PathBuf::from("debug"),
        }
    }
}

/// Where the widgets find their data files, relative to the page base URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub feed_path: String,
    pub gallery_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            feed_path: crate::widgets::feed::FEED_SNAPSHOT_PATH.to_string(),
            gallery_path: crate::widgets::rotator::GALLERY_SNAPSHOT_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub profile_url: String,
    pub limit: usize,
    pub json_path: PathBuf,
    pub source: HarvestSource,
    pub request_timeout_secs: u64,
    pub webdriver: WebDriverConfig,
    pub site: SiteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile_url: DEFAULT_PROFILE_URL.to_string(),
            limit: DEFAULT_LIMIT,
            json_path: PathBuf::from("data/instagram.json"),
            source: HarvestSource::default(),
            request_timeout_secs: 30,
            webdriver: WebDriverConfig::default(),
            site: SiteConfig::default(),
        }
    }
}

impl Config {
    /// Layer command-line values over this configuration.
    pub fn apply_scrape_args(&mut self, args: &ScrapeArgs) {
        if let Some(profile_url) = &args.profile_url {
            self.profile_url = profile_url.trim().to_string();
        }
        if let Some(limit) = args.limit {
            self.limit = limit;
        }
        if let Some(json_path) = &args.json_path {
            self.json_path = json_path.clone();
        }
        if let Some(source) = args.source {
            self.source = source;
        }
        if let Some(server_url) = &args.webdriver_url {
            self.webdriver.server_url = server_url.clone();
        }
        if let Some(headless) = args.headless {
            self.webdriver.headless = headless;
        }
        if let Some(settle_secs) = args.settle_secs {
            self.webdriver.settle_secs = settle_secs;
        }
        if let Some(debug) = args.debug {
            self.webdriver.debug = debug;
        }
        self.limit = self.limit.max(1);
    }
}

/// Load a YAML configuration file. Missing keys take their defaults.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<Config, Box<dyn Error>> {
    let raw = std::fs::read_to_string(path)?;
    let config: Config = serde_yaml::from_str(&raw)?;
    info!("Loaded configuration");
    Ok(config)
}

/// Load `path` if given, else defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, Box<dyn Error>> {
    match path {
        Some(path) => load_config(path),
        None => Ok(Config::default()),
    }
}

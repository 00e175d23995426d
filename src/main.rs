//! # nyrg_site
//!
//! Scrapes the latest post links from a public Instagram profile into the
//! homepage's `instagram.json`, and previews the homepage widgets.
//!
//! ## Usage
//!
//! ```sh
//! nyrg_site scrape -j ./data/instagram.json
//! nyrg_site render --site-root . --width 390
//! ```
//!
//! ## Exit codes
//!
//! `0` on success or when a partial scrape was skipped, `1` on any error.

use clap::Parser;
use nyrg_site::cli::{Cli, Command, RenderArgs};
use nyrg_site::config::{Config, HarvestSource, load_or_default};
use nyrg_site::pipeline::{ScrapeOptions, ScrapeOutcome, run_scrape};
use nyrg_site::scrapers::profile_api::ProfileApiHarvester;
use nyrg_site::scrapers::webdriver::WebDriverHarvester;
use nyrg_site::utils::check_writable_dir;
use nyrg_site::widgets::dom::MemoryDom;
use nyrg_site::widgets::embed::DetachedRuntime;
use nyrg_site::widgets::feed::{FeedIds, FeedWidget};
use nyrg_site::widgets::fetch::{DirJsonSource, HttpJsonSource, SiteSource};
use nyrg_site::widgets::rotator::{
    HIGHLIGHTS_CARD, ROTATOR_SECTION, RotationController, RotatorIds, load_gallery_slides,
};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = load_or_default(args.config.as_deref())?;

    let result = match args.command {
        Command::Scrape(scrape_args) => {
            let mut config = config;
            config.apply_scrape_args(&scrape_args);
            scrape(&config).await
        }
        Command::Render(render_args) => render(&config, &render_args).await,
    };

    let elapsed = start_time.elapsed();
    match &result {
        Ok(()) => info!(?elapsed, "Execution complete"),
        Err(e) => error!(?elapsed, error = %e, "Execution failed"),
    }
    result
}

#[instrument(
    level = "info",
    skip_all,
    fields(source = ?config.source, path = %config.json_path.display())
)]
async fn scrape(config: &Config) -> Result<(), Box<dyn Error>> {
    // Early check: the snapshot directory must be writable before we spend a browser session.
    // Nothing is created here; a skipped run leaves the filesystem as it was.
    if let Some(dir) = config.json_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = check_writable_dir(dir).await {
            error!(
                dir = %dir.display(),
                error = %e,
                "Snapshot directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let options = ScrapeOptions {
        profile_url: config.profile_url.clone(),
        limit: config.limit,
        json_path: config.json_path.clone(),
    };

    let outcome = match config.source {
        HarvestSource::Webdriver => {
            let harvester = WebDriverHarvester::from(&config.webdriver);
            run_scrape(&harvester, &options).await?
        }
        HarvestSource::ProfileApi => {
            let timeout = Duration::from_secs(config.request_timeout_secs);
            let harvester = ProfileApiHarvester::new(timeout)?;
            run_scrape(&harvester, &options).await?
        }
    };

    match outcome {
        ScrapeOutcome::Written { count } => info!(count, "Feed snapshot replaced"),
        ScrapeOutcome::Skipped { found, limit } => {
            warn!(found, limit, "Feed snapshot not updated")
        }
    }
    Ok(())
}

#[instrument(level = "info", skip_all, fields(width = args.width))]
async fn render(config: &Config, args: &RenderArgs) -> Result<(), Box<dyn Error>> {
    let (source, base_url) = match (&args.base_url, &args.site_root) {
        (Some(base_url), _) => {
            let http = HttpJsonSource::new(Duration::from_secs(config.request_timeout_secs))?;
            (SiteSource::Http(http), base_url.clone())
        }
        (None, Some(root)) => {
            let dir = DirJsonSource::new(root);
            let base_url = dir.base_url()?;
            (SiteSource::Dir(dir), base_url)
        }
        (None, None) => return Err("either --base-url or --site-root is required".into()),
    };
    info!(%base_url, "Rendering widgets");

    let feed_ids = FeedIds::default();
    let rotator_ids = RotatorIds::default();
    let mut dom = MemoryDom::with_ids(&[
        feed_ids.container.as_str(),
        feed_ids.fallback.as_str(),
        feed_ids.updated_at.as_str(),
        rotator_ids.image.as_str(),
        rotator_ids.slides.as_str(),
        rotator_ids.caption.as_str(),
        rotator_ids.prev.as_str(),
        rotator_ids.next.as_str(),
    ])
    .with_section(ROTATOR_SECTION)
    .with_section(HIGHLIGHTS_CARD);

    let mut feed = FeedWidget::new(base_url.clone()).with_snapshot_path(&config.site.feed_path);
    let feed_render = feed.load(&mut dom, &source, &mut DetachedRuntime, args.width).await;
    info!(?feed_render, "Feed rendered");

    let gallery = load_gallery_slides(
        &mut dom,
        &source,
        &base_url,
        &config.site.gallery_path,
        &rotator_ids,
    )
    .await;
    info!(?gallery, "Gallery loaded");

    for id in [&feed_ids.updated_at, &feed_ids.container, &feed_ids.fallback] {
        println!("<!-- #{id} -->\n{}", dom.inner_html(id).unwrap_or_default());
    }

    match RotationController::from_dom(&mut dom, rotator_ids.clone()) {
        Some(mut rotator) => {
            for _ in 0..args.rotate {
                rotator.next(&mut dom);
            }
            let slide = rotator.current();
            println!(
                "<!-- #{} slide {}/{} -->\n{} ({})",
                rotator_ids.image,
                rotator.index() + 1,
                rotator.slide_count(),
                slide.url,
                slide.display_caption()
            );
        }
        None => println!("<!-- #{} hidden -->", rotator_ids.image),
    }

    Ok(())
}

//! Headless Chrome harvester.
//!
//! Drives a Chrome session through a WebDriver endpoint (usually
//! `chromedriver --port=9515`), lets the profile page render, then collects
//! the `href` of every anchor in the rendered source.
//!
//! # Visit Sequence
//!
//! 1. Navigate to the profile page
//! 2. Check for the login wall. Headless runs give up with no links; headed
//!    runs wait once for a manual login
//! 3. Dismiss consent banners and overlays (best-effort)
//! 4. Wait for anchors to appear (best-effort), then the settle period
//! 5. Read the page source and extract anchors
//!
//! With `debug` on, the current URL is logged and screenshots are saved after
//! navigation and before the source is read. Screenshot failures only warn.
//!
//! The session is opened per harvest and always closed again, whether the
//! harvest succeeded or not.

use super::{DESKTOP_USER_AGENT, Harvester};
use crate::config::WebDriverConfig;
use scraper::{Html, Selector};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thirtyfour::ChromeCapabilities;
use thirtyfour::prelude::*;
use tracing::{debug, info, instrument, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// An element lookup, independent of the WebDriver client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    XPath(&'static str),
    Css(&'static str),
}

impl From<Locator> for By {
    fn from(locator: Locator) -> Self {
        match locator {
            Locator::XPath(xpath) => By::XPath(xpath),
            Locator::Css(css) => By::Css(css),
        }
    }
}

/// Consent and overlay buttons tried in order, each with its own wait.
pub const OVERLAY_DISMISSERS: [(Locator, Duration); 4] = [
    (
        Locator::XPath("//button[contains(., 'Allow all')]"),
        Duration::from_secs(3),
    ),
    (
        Locator::XPath("//button[contains(., 'Accept all')]"),
        Duration::from_secs(3),
    ),
    (
        Locator::XPath("//button[contains(., 'Accept')]"),
        Duration::from_secs(2),
    ),
    (Locator::Css("svg[aria-label='Close']"), Duration::from_secs(2)),
];

/// Present once the profile grid (or anything else) has rendered links.
pub const ANCHOR_LOCATOR: Locator = Locator::Css("a[href]");

/// The browser operations a harvest needs.
pub trait BrowserSession {
    async fn goto(&self, url: &str) -> Result<(), Box<dyn Error>>;
    async fn current_url(&self) -> Result<String, Box<dyn Error>>;
    /// Wait up to `timeout` for a clickable match, then click it.
    async fn click(&self, locator: Locator, timeout: Duration) -> Result<(), Box<dyn Error>>;
    /// Wait up to `timeout` for at least one match.
    async fn wait_for(&self, locator: Locator, timeout: Duration) -> Result<(), Box<dyn Error>>;
    async fn source(&self) -> Result<String, Box<dyn Error>>;
    async fn screenshot(&self, path: &Path) -> Result<(), Box<dyn Error>>;
    async fn quit(self) -> Result<(), Box<dyn Error>>;
}

/// A live Chrome session on a WebDriver server.
pub struct ChromeSession {
    driver: WebDriver,
}

impl BrowserSession for ChromeSession {
    async fn goto(&self, url: &str) -> Result<(), Box<dyn Error>> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn click(&self, locator: Locator, timeout: Duration) -> Result<(), Box<dyn Error>> {
        let element = self
            .driver
            .query(locator.into())
            .wait(timeout, POLL_INTERVAL)
            .first()
            .await?;
        element
            .wait_until()
            .wait(timeout, POLL_INTERVAL)
            .clickable()
            .await?;
        element.click().await?;
        Ok(())
    }

    async fn wait_for(&self, locator: Locator, timeout: Duration) -> Result<(), Box<dyn Error>> {
        self.driver
            .query(locator.into())
            .wait(timeout, POLL_INTERVAL)
            .first()
            .await?;
        Ok(())
    }

    async fn source(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.driver.source().await?)
    }

    async fn screenshot(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        self.driver.screenshot(path).await?;
        Ok(())
    }

    async fn quit(self) -> Result<(), Box<dyn Error>> {
        self.driver.quit().await?;
        Ok(())
    }
}

/// Harvests anchors from the rendered profile page with headless Chrome.
#[derive(Debug, Clone)]
pub struct WebDriverHarvester {
    /// WebDriver server URL, e.g. `http://localhost:9515`.
    pub server_url: String,
    /// Run Chrome without a window.
    pub headless: bool,
    pub user_agent: String,
    /// Fixed wait after navigation for client-side rendering.
    pub settle: Duration,
    pub page_load_timeout: Duration,
    /// Upper bound on waiting for the first anchor.
    pub anchor_wait: Duration,
    /// Time given to log in by hand when a headed run hits the login wall.
    pub login_wait: Duration,
    /// Persistent Chrome profile, so a manual login survives between runs.
    pub user_data_dir: Option<PathBuf>,
    pub debug: bool,
    /// Where debug screenshots go.
    pub debug_dir: PathBuf,
}

impl Default for WebDriverHarvester {
    fn default() -> Self {
        Self::from(&WebDriverConfig::default())
    }
}

impl From<&WebDriverConfig> for WebDriverHarvester {
    fn from(config: &WebDriverConfig) -> Self {
        Self {
            server_url: config.server_url.clone(),
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            settle: Duration::from_secs(config.settle_secs),
            page_load_timeout: Duration::from_secs(config.page_load_timeout_secs),
            anchor_wait: Duration::from_secs(config.anchor_wait_secs),
            login_wait: Duration::from_secs(config.login_wait_secs),
            user_data_dir: config.user_data_dir.clone(),
            debug: config.debug,
            debug_dir: config.debug_dir.clone(),
        }
    }
}

impl WebDriverHarvester {
    /// Command-line switches passed to Chrome.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if let Some(dir) = &self.user_data_dir {
            args.push(format!("--user-data-dir={}", dir.display()));
            args.push("--profile-directory=Default".to_string());
        }
        args.extend(
            [
                "--disable-notifications",
                "--lang=en-US",
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--window-size=1200,900",
                "--disable-blink-features=AutomationControlled",
            ]
            .map(String::from),
        );
        args.push(format!("--user-agent={}", self.user_agent));
        args
    }

    pub fn chrome_capabilities(&self) -> WebDriverResult<ChromeCapabilities> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in self.chrome_args() {
            caps.add_arg(&arg)?;
        }
        Ok(caps)
    }

    async fn launch(&self) -> Result<ChromeSession, Box<dyn Error>> {
        let driver = WebDriver::new(self.server_url.as_str(), self.chrome_capabilities()?).await?;
        let session = ChromeSession { driver };
        if let Err(e) = session
            .driver
            .set_page_load_timeout(self.page_load_timeout)
            .await
        {
            if let Err(quit_err) = session.quit().await {
                warn!(error = %quit_err, "Failed to close WebDriver session");
            }
            return Err(e.into());
        }
        Ok(session)
    }

    /// Visit `profile_url` in `session`, then close it regardless of outcome.
    pub async fn harvest_session<S: BrowserSession>(
        &self,
        session: S,
        profile_url: &str,
    ) -> Result<Vec<String>, Box<dyn Error>> {
        let result = self.visit(&session, profile_url).await;

        if let Err(e) = session.quit().await {
            warn!(error = %e, "Failed to close WebDriver session");
        }

        if let Ok(hrefs) = &result {
            info!(count = hrefs.len(), "Collected anchor hrefs");
        }
        result
    }

    async fn visit<S: BrowserSession>(
        &self,
        session: &S,
        profile_url: &str,
    ) -> Result<Vec<String>, Box<dyn Error>> {
        session.goto(profile_url).await?;

        let mut current = session.current_url().await?;
        if is_login_wall(&current) {
            if self.headless {
                warn!(
                    current_url = %current,
                    "Login wall detected in headless mode; returning no links"
                );
                return Ok(Vec::new());
            }
            warn!(
                wait = ?self.login_wait,
                "Login page detected; log in manually in the browser window"
            );
            tokio::time::sleep(self.login_wait).await;
            current = session.current_url().await?;
            if is_login_wall(&current) {
                warn!(current_url = %current, "Still on the login page; returning no links");
                return Ok(Vec::new());
            }
        }

        if self.debug {
            info!(current_url = %current, "Profile page loaded");
        }
        self.debug_screenshot(session, "initial").await;

        self.dismiss_overlays(session).await;
        if let Err(e) = session.wait_for(ANCHOR_LOCATOR, self.anchor_wait).await {
            warn!(error = %e, "No anchors appeared; reading the page anyway");
        }

        tokio::time::sleep(self.settle).await;

        let source = session.source().await?;
        self.debug_screenshot(session, "after_settle").await;

        let hrefs = collect_anchor_hrefs(&source);
        debug!(bytes = source.len(), "Read rendered page source");
        Ok(hrefs)
    }

    async fn dismiss_overlays<S: BrowserSession>(&self, session: &S) {
        for (locator, timeout) in OVERLAY_DISMISSERS {
            match session.click(locator, timeout).await {
                Ok(()) => info!(?locator, "Dismissed overlay"),
                Err(e) => debug!(?locator, error = %e, "Overlay not present"),
            }
        }
    }

    async fn debug_screenshot<S: BrowserSession>(&self, session: &S, label: &str) {
        if !self.debug {
            return;
        }
        let path = self.debug_dir.join(format!("debug_instagram_{label}.png"));
        if let Err(e) = tokio::fs::create_dir_all(&self.debug_dir).await {
            warn!(
                dir = %self.debug_dir.display(),
                error = %e,
                "Cannot create screenshot directory"
            );
            return;
        }
        match session.screenshot(&path).await {
            Ok(()) => info!(path = %path.display(), label, "Saved screenshot"),
            Err(e) => warn!(label, error = %e, "Screenshot failed"),
        }
    }
}

impl Harvester for WebDriverHarvester {
    #[instrument(
        level = "info",
        skip(self),
        fields(server = %self.server_url, headless = self.headless)
    )]
    async fn harvest(&self, profile_url: &str) -> Result<Vec<String>, Box<dyn Error>> {
        let session = self.launch().await?;
        self.harvest_session(session, profile_url).await
    }
}

/// Instagram redirects anonymous sessions it distrusts to its login page.
pub fn is_login_wall(current_url: &str) -> bool {
    current_url.contains("accounts/login")
}

/// Extract the `href` of every anchor in `html`, in document order.
pub fn collect_anchor_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a[href]").unwrap();

    document
        .select(&anchor_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ScrapeOptions, ScrapeOutcome, run_scrape};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    const PROFILE_URL: &str = "https://www.instagram.com/newyorkromaniangroup/";
    const LOGIN_URL: &str =
        "https://www.instagram.com/accounts/login/?next=%2Fnewyorkromaniangroup%2F";

    const PROFILE_HTML: &str = r#"
        <html><body>
          <header><a href="/newyorkromaniangroup/">profile</a></header>
          <main>
            <a href="/newyorkromaniangroup/p/AAA/"><img></a>
            <a href="/p/BBB/?img_index=1"><img></a>
            <a href="/newyorkromaniangroup/p/AAA/"><img></a>
            <a href="https://www.instagram.com/reel/CCC/">reel</a>
            <a>no href</a>
            <a href="">empty</a>
          </main>
        </body></html>
    "#;

    /// Scripted session that records every call it receives.
    #[derive(Default)]
    struct StubSession {
        calls: Rc<RefCell<Vec<String>>>,
        /// Answers to `current_url`, in order; the last one repeats.
        urls: RefCell<VecDeque<String>>,
        html: String,
        fail_goto: bool,
        overlay_present: bool,
    }

    impl StubSession {
        fn on_page(urls: &[&str], html: &str) -> Self {
            Self {
                urls: RefCell::new(urls.iter().map(|u| u.to_string()).collect()),
                html: html.to_string(),
                ..Self::default()
            }
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.borrow_mut().push(call.into());
        }
    }

    impl BrowserSession for StubSession {
        async fn goto(&self, url: &str) -> Result<(), Box<dyn Error>> {
            self.record(format!("goto {url}"));
            if self.fail_goto {
                return Err("page load timeout".into());
            }
            Ok(())
        }

        async fn current_url(&self) -> Result<String, Box<dyn Error>> {
            self.record("current_url");
            let mut urls = self.urls.borrow_mut();
            let url = if urls.len() > 1 {
                urls.pop_front()
            } else {
                urls.front().cloned()
            };
            Ok(url.unwrap_or_else(|| PROFILE_URL.to_string()))
        }

        async fn click(&self, locator: Locator, _timeout: Duration) -> Result<(), Box<dyn Error>> {
            self.record(format!("click {locator:?}"));
            if self.overlay_present && matches!(locator, Locator::Css(_)) {
                return Ok(());
            }
            Err("no such element".into())
        }

        async fn wait_for(
            &self,
            _locator: Locator,
            _timeout: Duration,
        ) -> Result<(), Box<dyn Error>> {
            self.record("wait_for");
            Err("timed out".into())
        }

        async fn source(&self) -> Result<String, Box<dyn Error>> {
            self.record("source");
            Ok(self.html.clone())
        }

        async fn screenshot(&self, path: &Path) -> Result<(), Box<dyn Error>> {
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            self.record(format!("screenshot {name}"));
            Err("no display".into())
        }

        async fn quit(self) -> Result<(), Box<dyn Error>> {
            self.record("quit");
            Ok(())
        }
    }

    /// Hands one scripted session to the harvester in place of a real Chrome.
    struct ScriptedBrowser {
        harvester: WebDriverHarvester,
        session: RefCell<Option<StubSession>>,
    }

    impl Harvester for ScriptedBrowser {
        async fn harvest(&self, profile_url: &str) -> Result<Vec<String>, Box<dyn Error>> {
            let session = self
                .session
                .borrow_mut()
                .take()
                .ok_or("session already used")?;
            self.harvester.harvest_session(session, profile_url).await
        }
    }

    fn quick_harvester() -> WebDriverHarvester {
        WebDriverHarvester {
            settle: Duration::ZERO,
            login_wait: Duration::ZERO,
            ..WebDriverHarvester::default()
        }
    }

    #[test]
    fn test_collect_anchor_hrefs_keeps_order_and_duplicates() {
        let hrefs = collect_anchor_hrefs(PROFILE_HTML);
        assert_eq!(
            hrefs,
            vec![
                "/newyorkromaniangroup/",
                "/newyorkromaniangroup/p/AAA/",
                "/p/BBB/?img_index=1",
                "/newyorkromaniangroup/p/AAA/",
                "https://www.instagram.com/reel/CCC/",
            ]
        );
    }

    #[test]
    fn test_collect_anchor_hrefs_empty_page() {
        assert!(collect_anchor_hrefs("<html><body><p>blocked</p></body></html>").is_empty());
    }

    #[test]
    fn test_is_login_wall() {
        assert!(is_login_wall(LOGIN_URL));
        assert!(!is_login_wall(PROFILE_URL));
    }

    #[test]
    fn test_chrome_args_headless_toggle() {
        let mut harvester = WebDriverHarvester::default();
        assert_eq!(harvester.chrome_args()[0], "--headless=new");

        harvester.headless = false;
        assert!(
            !harvester
                .chrome_args()
                .iter()
                .any(|a| a.starts_with("--headless"))
        );
    }

    #[test]
    fn test_chrome_capabilities_carry_args() {
        let caps = WebDriverHarvester::default().chrome_capabilities().unwrap();
        let args = caps.args();
        assert!(args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&format!("--user-agent={DESKTOP_USER_AGENT}")));
        assert!(!args.iter().any(|a| a.starts_with("--user-data-dir")));

        let harvester = WebDriverHarvester {
            headless: false,
            user_data_dir: Some(PathBuf::from("/home/ci/.config/chrome-nyrg")),
            ..WebDriverHarvester::default()
        };
        let args = harvester.chrome_capabilities().unwrap().args();
        assert!(!args.contains(&"--headless=new".to_string()));
        assert!(args.contains(&"--user-data-dir=/home/ci/.config/chrome-nyrg".to_string()));
        assert!(args.contains(&"--profile-directory=Default".to_string()));
    }

    #[tokio::test]
    async fn test_harvest_reads_rendered_page_and_quits() {
        let session = StubSession::on_page(&[PROFILE_URL], PROFILE_HTML);
        let calls = session.calls.clone();

        let hrefs = quick_harvester()
            .harvest_session(session, PROFILE_URL)
            .await
            .unwrap();

        assert_eq!(hrefs.len(), 5);
        let calls = calls.borrow();
        assert_eq!(calls[0], format!("goto {PROFILE_URL}"));
        assert!(calls.contains(&"source".to_string()));
        assert_eq!(calls.last().map(String::as_str), Some("quit"));
    }

    #[tokio::test]
    async fn test_navigation_error_still_quits() {
        let session = StubSession {
            fail_goto: true,
            ..StubSession::default()
        };
        let calls = session.calls.clone();

        let err = quick_harvester()
            .harvest_session(session, PROFILE_URL)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "page load timeout");
        assert_eq!(
            *calls.borrow(),
            vec![format!("goto {PROFILE_URL}"), "quit".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_overlays_and_anchors_do_not_fail() {
        let session = StubSession::on_page(&[PROFILE_URL], PROFILE_HTML);
        let calls = session.calls.clone();

        let hrefs = quick_harvester()
            .harvest_session(session, PROFILE_URL)
            .await
            .unwrap();

        assert!(!hrefs.is_empty());
        let clicks = calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with("click"))
            .count();
        assert_eq!(clicks, OVERLAY_DISMISSERS.len());
        assert!(calls.borrow().contains(&"wait_for".to_string()));
    }

    #[tokio::test]
    async fn test_headless_login_wall_skips_and_leaves_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let json_path = tmp.path().join("data").join("instagram.json");
        std::fs::create_dir_all(json_path.parent().unwrap()).unwrap();
        let previous = b"{\n  \"updated_at\": \"2026-01-01T00:00:00Z\",\n  \"posts\": []\n}\n";
        std::fs::write(&json_path, previous).unwrap();

        let session = StubSession::on_page(&[LOGIN_URL], PROFILE_HTML);
        let calls = session.calls.clone();
        let browser = ScriptedBrowser {
            harvester: quick_harvester(),
            session: RefCell::new(Some(session)),
        };
        let options = ScrapeOptions {
            profile_url: PROFILE_URL.to_string(),
            limit: 3,
            json_path: json_path.clone(),
        };

        let outcome = run_scrape(&browser, &options).await.unwrap();

        assert_eq!(outcome, ScrapeOutcome::Skipped { found: 0, limit: 3 });
        assert_eq!(std::fs::read(&json_path).unwrap(), previous);
        let calls = calls.borrow();
        assert!(!calls.contains(&"source".to_string()));
        assert_eq!(calls.last().map(String::as_str), Some("quit"));
    }

    #[tokio::test]
    async fn test_headed_login_wall_waits_for_manual_login() {
        let session = StubSession::on_page(&[LOGIN_URL, PROFILE_URL], PROFILE_HTML);
        let harvester = WebDriverHarvester {
            headless: false,
            ..quick_harvester()
        };

        let hrefs = harvester
            .harvest_session(session, PROFILE_URL)
            .await
            .unwrap();
        assert_eq!(hrefs.len(), 5);
    }

    #[tokio::test]
    async fn test_headed_login_wall_gives_up_when_still_blocked() {
        let session = StubSession::on_page(&[LOGIN_URL], PROFILE_HTML);
        let calls = session.calls.clone();
        let harvester = WebDriverHarvester {
            headless: false,
            ..quick_harvester()
        };

        let hrefs = harvester
            .harvest_session(session, PROFILE_URL)
            .await
            .unwrap();
        assert!(hrefs.is_empty());
        assert!(!calls.borrow().contains(&"source".to_string()));
    }

    #[tokio::test]
    async fn test_debug_screenshots_are_best_effort() {
        let tmp = tempfile::tempdir().unwrap();
        let session = StubSession {
            overlay_present: true,
            ..StubSession::on_page(&[PROFILE_URL], PROFILE_HTML)
        };
        let calls = session.calls.clone();
        let harvester = WebDriverHarvester {
            debug: true,
            debug_dir: tmp.path().join("debug"),
            ..quick_harvester()
        };

        let hrefs = harvester
            .harvest_session(session, PROFILE_URL)
            .await
            .unwrap();

        assert_eq!(hrefs.len(), 5);
        assert!(tmp.path().join("debug").is_dir());
        let shots: Vec<_> = calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with("screenshot"))
            .cloned()
            .collect();
        assert_eq!(
            shots,
            vec![
                "screenshot debug_instagram_initial.png",
                "screenshot debug_instagram_after_settle.png",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_screenshots_without_debug() {
        let session = StubSession::on_page(&[PROFILE_URL], PROFILE_HTML);
        let calls = session.calls.clone();

        quick_harvester()
            .harvest_session(session, PROFILE_URL)
            .await
            .unwrap();
        assert!(!calls.borrow().iter().any(|c| c.starts_with("screenshot")));
    }
}

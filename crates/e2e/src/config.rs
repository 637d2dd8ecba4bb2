//! Suite configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::pages::locators::Locators;
use crate::playwright::Browser;

/// Top-level configuration for a suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Homepage the scenarios start from
    pub base_url: String,

    /// Browser engine to launch
    pub browser: Browser,

    /// Run without a visible window
    pub headless: bool,

    /// Viewport size for the page
    pub viewport: Viewport,

    /// Node executable used to host the Playwright driver
    pub node_binary: String,

    /// Where failure screenshots land
    pub artifacts_dir: PathBuf,

    pub timeouts: TimeoutConfig,

    /// Dropdown re-scan budget for location autocomplete
    pub location_retry: RetryConfig,

    pub calendar: CalendarConfig,

    /// Regex the post-search URL must match
    pub results_url_pattern: String,

    pub locators: Locators,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.kiwi.com/en/".to_string(),
            browser: Browser::Chromium,
            headless: true,
            viewport: Viewport::default(),
            node_binary: "node".to_string(),
            artifacts_dir: PathBuf::from("test-results"),
            timeouts: TimeoutConfig::default(),
            location_retry: RetryConfig::default(),
            calendar: CalendarConfig::default(),
            results_url_pattern: "/search/results".to_string(),
            locators: Locators::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport { width: 1280, height: 720 }
    }
}

/// Upper bounds for every wait, in milliseconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Element waits, clicks and typing
    pub default_ms: u64,

    /// Page loads
    pub navigation_ms: u64,

    /// Landing on the search results after submitting
    pub results_ms: u64,

    /// Slack on top of a driver-side timeout before the bridge itself gives up
    pub bridge_grace_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_ms: 30_000,
            navigation_ms: 60_000,
            results_ms: 60_000,
            bridge_grace_ms: 5_000,
        }
    }
}

impl TimeoutConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn results(&self) -> Duration {
        Duration::from_millis(self.results_ms)
    }

    pub fn bridge_grace(&self) -> Duration {
        Duration::from_millis(self.bridge_grace_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: usize,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 250,
        }
    }
}

/// Safety bounds for calendar pagination
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Month advances allowed before the offset is declared unreachable
    pub max_pages: usize,

    /// Reloads after a next-month click before the calendar counts as stuck
    pub stall_retries: usize,

    /// Pause between those reloads
    pub render_poll_ms: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            max_pages: 24,
            stall_retries: 3,
            render_poll_ms: 200,
        }
    }
}

impl CalendarConfig {
    pub fn render_poll(&self) -> Duration {
        Duration::from_millis(self.render_poll_ms)
    }
}

impl SuiteConfig {
    /// Load configuration from a YAML file, falling back to defaults when absent
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            debug!("Loading suite config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            Self::from_yaml(&content)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FLIGHT_E2E_*` environment overrides
    pub fn apply_env(&mut self) -> E2eResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> E2eResult<()> {
        if let Some(url) = lookup("FLIGHT_E2E_BASE_URL") {
            self.base_url = url;
        }
        if let Some(browser) = lookup("FLIGHT_E2E_BROWSER") {
            self.browser = browser.parse().map_err(E2eError::Config)?;
        }
        if let Some(headless) = lookup("FLIGHT_E2E_HEADLESS") {
            self.headless = !matches!(headless.as_str(), "0" | "false" | "no" | "off");
        }
        if let Some(ms) = lookup("FLIGHT_E2E_TIMEOUT_MS") {
            self.timeouts.default_ms = ms
                .parse()
                .map_err(|e| E2eError::Config(format!("FLIGHT_E2E_TIMEOUT_MS={}: {}", ms, e)))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.location_retry.attempts == 0 {
            return Err(E2eError::Config("location_retry.attempts must be at least 1".to_string()));
        }
        if self.calendar.max_pages == 0 {
            return Err(E2eError::Config("calendar.max_pages must be at least 1".to_string()));
        }
        if self.timeouts.default_ms == 0 {
            return Err(E2eError::Config("timeouts.default_ms must be positive".to_string()));
        }
        regex::Regex::new(&self.results_url_pattern)?;
        Ok(())
    }

    /// Directory failure screenshots are written to
    pub fn screenshot_dir(&self) -> PathBuf {
        self.artifacts_dir.join("screenshots")
    }
}

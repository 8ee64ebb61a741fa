//! Harness configuration
//!
//! Loaded from a TOML file when present, then overridden from the
//! environment (`FLOWCHECK_BASE_URL`, `FLOWCHECK_WAIT_MS`,
//! `FLOWCHECK_BROWSER`, `FLOWCHECK_HEADLESS`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{FlowError, FlowResult};
use crate::runner::DEFAULT_WAIT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Base URL of the application under test
    pub base_url: String,

    /// Bounded wait for each step, in milliseconds
    pub wait_ms: u64,

    /// Directory holding YAML flow documents
    pub flows_dir: PathBuf,

    /// Directory reports are written to
    pub output_dir: PathBuf,

    /// How long to wait for the base URL to answer before running anything
    pub preflight_timeout_secs: u64,

    pub browser: BrowserConfig,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            wait_ms: DEFAULT_WAIT.as_millis() as u64,
            flows_dir: PathBuf::from("flows"),
            output_dir: PathBuf::from("flow-results"),
            preflight_timeout_secs: 30,
            browser: BrowserConfig::default(),
        }
    }
}

/// Browser engine settings for the Playwright bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub engine: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Node.js executable hosting the bridge
    pub node_binary: PathBuf,

    /// Directory whose node_modules provides `playwright`
    pub project_dir: PathBuf,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            engine: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: PathBuf::from("node"),
            project_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = FlowError;

    fn from_str(s: &str) -> FlowResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(FlowError::InvalidConfig(format!("unknown browser: {}", other))),
        }
    }
}

impl FlowConfig {
    /// Load configuration from file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> FlowResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `FLOWCHECK_*` environment overrides
    pub fn apply_env(&mut self) -> FlowResult<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> FlowResult<()> {
        if let Some(url) = var("FLOWCHECK_BASE_URL") {
            self.base_url = url;
        }
        if let Some(ms) = var("FLOWCHECK_WAIT_MS") {
            self.wait_ms = ms
                .trim()
                .parse()
                .map_err(|_| FlowError::InvalidConfig(format!("FLOWCHECK_WAIT_MS: {:?}", ms)))?;
        }
        if let Some(engine) = var("FLOWCHECK_BROWSER") {
            self.browser.engine = engine.parse()?;
        }
        if let Some(headless) = var("FLOWCHECK_HEADLESS") {
            self.browser.headless = matches!(headless.trim(), "1" | "true" | "yes");
        }
        self.validate()
    }

    pub fn validate(&self) -> FlowResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(FlowError::InvalidConfig(format!(
                "base_url must be an http(s) URL: {}",
                self.base_url
            )));
        }
        if self.wait_ms == 0 {
            return Err(FlowError::InvalidConfig("wait_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn preflight_timeout(&self) -> Duration {
        Duration::from_secs(self.preflight_timeout_secs)
    }
}

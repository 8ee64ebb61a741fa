//! Error types for flow runs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    /// Target element missing or not actionable within the wait window
    #[error("Interaction failed on {target}: {reason}")]
    Interaction { target: String, reason: String },

    /// Observed page value did not meet the expected condition
    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Browser bridge error: {0}")]
    Bridge(String),

    #[error("Flow parse error: {0}")]
    FlowParse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Base URL {url} unreachable after {attempts} attempts")]
    Unreachable { url: String, attempts: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type FlowResult<T> = Result<T, FlowError>;

impl FlowError {
    /// Create an interaction error against a selector or URL
    pub fn interaction(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Interaction {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create an assertion error
    pub fn assertion(msg: impl Into<String>) -> Self {
        Self::Assertion(msg.into())
    }

    pub fn bridge(msg: impl Into<String>) -> Self {
        Self::Bridge(msg.into())
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }
}

//! The capability set a browser-automation engine exposes to the runner
//!
//! Every capability takes the bounded wait explicitly. Implementations wait at
//! most that long for the target to become actionable and never retry on
//! their own beyond it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::FlowResult;

/// One element matched by a selector, addressed by its position in the match list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    pub selector: String,
    pub index: usize,
}

impl ElementHandle {
    /// Handles for the first `count` matches of a selector
    pub fn all(selector: &str, count: usize) -> Vec<Self> {
        (0..count)
            .map(|index| Self {
                selector: selector.to_string(),
                index,
            })
            .collect()
    }
}

#[async_trait]
pub trait Driver: Send {
    /// Navigate the page to `url`, relative URLs resolving against the base URL
    async fn visit(&mut self, url: &str, wait: Duration) -> FlowResult<()>;

    /// Elements currently matching `selector`; empty if none appear within `wait`
    async fn find(&mut self, selector: &str, wait: Duration) -> FlowResult<Vec<ElementHandle>>;

    async fn type_text(&mut self, selector: &str, text: &str, wait: Duration) -> FlowResult<()>;

    async fn click(&mut self, selector: &str, wait: Duration) -> FlowResult<()>;

    /// Click the first match of `selector` whose text contains `text`
    async fn click_text(&mut self, selector: &str, text: &str, wait: Duration) -> FlowResult<()>;

    /// Choose the option labelled `label` in a dropdown
    async fn select(&mut self, selector: &str, label: &str, wait: Duration) -> FlowResult<()>;

    async fn read_text(&mut self, selector: &str, wait: Duration) -> FlowResult<String>;

    /// Text of every match, in document order
    async fn read_texts(&mut self, selector: &str, wait: Duration) -> FlowResult<Vec<String>>;

    async fn read_count(&mut self, selector: &str, wait: Duration) -> FlowResult<usize>;

    async fn read_visibility(&mut self, selector: &str, wait: Duration) -> FlowResult<bool>;

    async fn current_url(&mut self) -> FlowResult<String>;

    /// Release the page. Drivers without resources to free keep the default.
    async fn close(&mut self) -> FlowResult<()> {
        Ok(())
    }
}

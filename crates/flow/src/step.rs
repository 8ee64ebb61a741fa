//! Declarative flow documents and the steps they contain

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FlowError, FlowResult};
use crate::ordering::SortOrder;

/// A named, ordered sequence of steps, authored in code or YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// Unique name for this flow
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering flows
    #[serde(default)]
    pub tags: Vec<String>,

    /// Overrides the runner's wait window for every step of this flow
    #[serde(default)]
    pub wait_ms: Option<u64>,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

/// A single UI action or assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a URL (relative to the base URL)
    Navigate { url: String },

    /// Type text into an input
    Type { selector: String, text: String },

    /// Click the first element matching a selector
    Click { selector: String },

    /// Click the first element matching a selector whose text contains `text`
    ClickText { selector: String, text: String },

    /// Choose a dropdown option by its visible label
    Select { selector: String, label: String },

    /// Element text contains a substring
    AssertText { selector: String, expected: String },

    /// Element text, trimmed, equals a value
    AssertTextEquals { selector: String, expected: String },

    /// Number of elements matching a selector
    AssertCount { selector: String, expected: usize },

    /// Element is visible
    AssertVisible { selector: String },

    /// Current page URL contains a fragment
    AssertUrl { contains: String },

    /// Every element matching a selector contains a substring
    AssertEachContains { selector: String, text: String },

    /// Prices read from the matching elements are strictly ordered
    AssertSorted {
        selector: String,
        #[serde(default)]
        order: SortOrder,
    },
}

impl Step {
    pub fn navigate(url: impl Into<String>) -> Self {
        Step::Navigate { url: url.into() }
    }

    pub fn type_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Step::Type {
            selector: selector.into(),
            text: text.into(),
        }
    }

    pub fn click(selector: impl Into<String>) -> Self {
        Step::Click {
            selector: selector.into(),
        }
    }

    pub fn click_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Step::ClickText {
            selector: selector.into(),
            text: text.into(),
        }
    }

    pub fn select(selector: impl Into<String>, label: impl Into<String>) -> Self {
        Step::Select {
            selector: selector.into(),
            label: label.into(),
        }
    }

    pub fn assert_text(selector: impl Into<String>, expected: impl Into<String>) -> Self {
        Step::AssertText {
            selector: selector.into(),
            expected: expected.into(),
        }
    }

    pub fn assert_text_equals(selector: impl Into<String>, expected: impl Into<String>) -> Self {
        Step::AssertTextEquals {
            selector: selector.into(),
            expected: expected.into(),
        }
    }

    pub fn assert_count(selector: impl Into<String>, expected: usize) -> Self {
        Step::AssertCount {
            selector: selector.into(),
            expected,
        }
    }

    pub fn assert_visible(selector: impl Into<String>) -> Self {
        Step::AssertVisible {
            selector: selector.into(),
        }
    }

    pub fn assert_url(contains: impl Into<String>) -> Self {
        Step::AssertUrl {
            contains: contains.into(),
        }
    }

    pub fn assert_each_contains(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Step::AssertEachContains {
            selector: selector.into(),
            text: text.into(),
        }
    }

    pub fn assert_sorted(selector: impl Into<String>, order: SortOrder) -> Self {
        Step::AssertSorted {
            selector: selector.into(),
            order,
        }
    }

    /// Short label used in logs and reports
    pub fn name(&self) -> String {
        match self {
            Step::Navigate { url } => format!("navigate:{}", url),
            Step::Type { selector, .. } => format!("type:{}", selector),
            Step::Click { selector } => format!("click:{}", selector),
            Step::ClickText { selector, text } => format!("click_text:{}:{}", selector, text),
            Step::Select { selector, label } => format!("select:{}:{}", selector, label),
            Step::AssertText { selector, .. } => format!("assert_text:{}", selector),
            Step::AssertTextEquals { selector, .. } => format!("assert_text_equals:{}", selector),
            Step::AssertCount { selector, expected } => {
                format!("assert_count:{}:{}", selector, expected)
            }
            Step::AssertVisible { selector } => format!("assert_visible:{}", selector),
            Step::AssertUrl { contains } => format!("assert_url:{}", contains),
            Step::AssertEachContains { selector, .. } => {
                format!("assert_each_contains:{}", selector)
            }
            Step::AssertSorted { selector, order } => {
                format!("assert_sorted:{}:{}", selector, order.as_str())
            }
        }
    }
}

impl Flow {
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            wait_ms: None,
            steps,
        }
    }

    /// Parse a flow from a YAML string
    pub fn from_yaml(yaml: &str) -> FlowResult<Self> {
        let flow: Self = serde_yaml::from_str(yaml)?;
        if flow.name.trim().is_empty() {
            return Err(FlowError::FlowParse("flow name must not be empty".to_string()));
        }
        if flow.wait_ms == Some(0) {
            return Err(FlowError::FlowParse(format!(
                "flow {}: wait_ms must be positive",
                flow.name
            )));
        }
        Ok(flow)
    }

    /// Parse a flow from a YAML file
    pub fn from_file(path: &Path) -> FlowResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| FlowError::FlowParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all flows from a directory, sorted by name
    pub fn load_all(dir: &Path) -> FlowResult<Vec<Self>> {
        let mut flows = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_type().is_file()
                    && e.path()
                        .extension()
                        .map(|ext| ext == "yaml" || ext == "yml")
                        .unwrap_or(false)
            })
        {
            flows.push(Self::from_file(entry.path())?);
        }

        flows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(flows)
    }

    /// Filter flows by tag
    pub fn filter_by_tag<'a>(flows: &'a [Self], tag: &str) -> Vec<&'a Self> {
        flows
            .iter()
            .filter(|f| f.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Narrow flows to a tag and/or a name. An empty selection is an error.
    pub fn matching(
        flows: Vec<Self>,
        tag: Option<&str>,
        name: Option<&str>,
    ) -> FlowResult<Vec<Self>> {
        let mut selected: Vec<Self> = match tag {
            Some(tag) => Self::filter_by_tag(&flows, tag).into_iter().cloned().collect(),
            None => flows,
        };
        if let Some(name) = name {
            selected.retain(|f| f.name == name);
        }

        if selected.is_empty() {
            let mut criteria = Vec::new();
            if let Some(tag) = tag {
                criteria.push(format!("tag {:?}", tag));
            }
            if let Some(name) = name {
                criteria.push(format!("name {:?}", name));
            }
            let criteria = if criteria.is_empty() {
                "any criteria".to_string()
            } else {
                criteria.join(" and ")
            };
            return Err(FlowError::FlowParse(format!("No flows match {}", criteria)));
        }
        Ok(selected)
    }
}

//! Declarative YAML scenario specification
//!
//! A scenario is an ordered list of browser steps. Ordering is load-bearing:
//! later steps act on DOM state produced by earlier ones, so steps are never
//! reordered or retried at this layer. Polling and timeouts belong to the
//! harness, not to the scenario.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering (e.g. `smoke`, `external`)
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser; the harness default applies when unset
    #[serde(default)]
    pub viewport: Option<Viewport>,

    /// Steps to execute in order
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Navigate to a URL. Relative URLs are joined with the local server's
    /// base URL; absolute URLs hit external sites as-is.
    Navigate {
        url: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
    },

    /// Assert the document title matches a regex (containment check)
    AssertTitle { pattern: String },

    /// Click an element
    Click {
        selector: String,
        /// Scope the selector inside a container locator
        #[serde(default)]
        within: Option<String>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Fill an input field
    Fill {
        selector: String,
        value: String,
        #[serde(default)]
        clear_first: bool,
    },

    /// Press a key, on an element or on the active input
    Press {
        #[serde(default)]
        selector: Option<String>,
        key: String,
    },

    /// Block until an element reaches a state, bounded by a timeout
    Wait {
        selector: String,
        #[serde(default)]
        within: Option<String>,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        state: WaitState,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep { ms: u64 },

    /// Assert something about an element
    Assert {
        selector: String,
        #[serde(default)]
        within: Option<String>,
        #[serde(default)]
        visible: Option<bool>,
        /// Exact text match (whitespace-trimmed)
        #[serde(default)]
        text: Option<String>,
        /// Substring match
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        count: Option<usize>,
    },

    /// Take a screenshot
    Screenshot {
        name: String,
        #[serde(default)]
        selector: Option<String>,
        #[serde(default)]
        full_page: bool,
    },

    /// Suspend indefinitely for manual inspection. Only honored in headed
    /// runs; headless runs log a warning and continue.
    Pause,

    /// Log a message (for debugging)
    Log { message: String },
}

fn default_wait_timeout() -> u64 {
    5000 // 5 seconds default
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

impl Scenario {
    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let scenario: Scenario = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load all scenarios from a directory
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut scenarios = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            scenarios.push(Self::from_file(entry.path())?);
        }

        Ok(scenarios)
    }

    /// Structural checks beyond what serde enforces
    pub fn validate(&self) -> E2eResult<()> {
        if self.name.trim().is_empty() {
            return Err(E2eError::SpecParse("scenario name cannot be empty".into()));
        }
        if self.steps.is_empty() {
            return Err(E2eError::SpecParse(format!(
                "scenario '{}' has no steps",
                self.name
            )));
        }
        for step in &self.steps {
            match step {
                ScenarioStep::AssertTitle { pattern } => {
                    Regex::new(pattern).map_err(|e| E2eError::InvalidPattern {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })?;
                }
                ScenarioStep::Assert {
                    visible,
                    text,
                    text_contains,
                    count,
                    ..
                } => {
                    if visible.is_none()
                        && text.is_none()
                        && text_contains.is_none()
                        && count.is_none()
                    {
                        return Err(E2eError::SpecParse(format!(
                            "scenario '{}' has an assert step with no predicate",
                            self.name
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether this scenario navigates to the local storefront (relative
    /// URLs) and therefore needs the server spawned.
    pub fn requires_server(&self) -> bool {
        self.steps.iter().any(|step| {
            matches!(step, ScenarioStep::Navigate { url, .. }
                if !url.starts_with("http://") && !url.starts_with("https://"))
        })
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios.iter().filter(|s| s.has_tag(tag)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_scenario() {
        let yaml = r##"
name: storefront-smoke
description: Landing page smoke check
tags:
  - smoke
steps:
  - action: navigate
    url: /
  - action: assert_title
    pattern: Tienda
  - action: assert
    selector: "#storefront-title"
    visible: true
"##;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.name, "storefront-smoke");
        assert_eq!(scenario.steps.len(), 3);
        assert!(scenario.requires_server());
        assert!(scenario.has_tag("smoke"));
    }

    #[test]
    fn test_parse_search_purchase_sequence() {
        let yaml = r#"
name: search-purchase
steps:
  - action: navigate
    url: https://www.example-shop.mx/
  - action: assert
    selector: "input[id='twotabsearchtextbox']"
    visible: true
  - action: fill
    selector: "input[id='twotabsearchtextbox']"
    value: xbox
  - action: press
    key: Enter
  - action: assert
    selector: "span[class='a-color-state a-text-bold']"
    text_contains: xbox
  - action: wait
    selector: "div.results"
    state: visible
    timeout_ms: 10000
  - action: click
    within: "div.results"
    selector: "span.title"
  - action: pause
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.steps.len(), 8);
        // Absolute URLs only: no local server involved
        assert!(!scenario.requires_server());
        assert!(matches!(scenario.steps[3], ScenarioStep::Press { ref key, .. } if key == "Enter"));
        assert!(matches!(scenario.steps.last(), Some(ScenarioStep::Pause)));
    }

    #[test]
    fn test_assert_needs_a_predicate() {
        let yaml = r##"
name: empty-assert
steps:
  - action: assert
    selector: "#thing"
"##;
        let err = Scenario::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("no predicate"));
    }

    #[test]
    fn test_title_pattern_must_compile() {
        let yaml = r#"
name: bad-pattern
steps:
  - action: assert_title
    pattern: "unclosed ["
"#;
        assert!(matches!(
            Scenario::from_yaml(yaml).unwrap_err(),
            E2eError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_default_viewport_and_wait_timeout() {
        let yaml = r##"
name: defaults
steps:
  - action: wait
    selector: "#slow"
"##;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert!(scenario.viewport.is_none());
        match &scenario.steps[0] {
            ScenarioStep::Wait { timeout_ms, state, .. } => {
                assert_eq!(*timeout_ms, 5000);
                assert_eq!(state.as_str(), "visible");
            }
            other => panic!("unexpected step: {:?}", other),
        }
    }

    #[test]
    fn test_filter_by_tag() {
        let a = Scenario::from_yaml("name: a\ntags: [smoke]\nsteps:\n  - action: pause\n").unwrap();
        let b = Scenario::from_yaml("name: b\ntags: [external]\nsteps:\n  - action: pause\n").unwrap();
        let all = vec![a, b];
        let smoke = Scenario::filter_by_tag(&all, "smoke");
        assert_eq!(smoke.len(), 1);
        assert_eq!(smoke[0].name, "a");
    }
}

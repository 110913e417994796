//! Playwright script compilation and execution
//!
//! A scenario compiles to one generated Playwright script and runs in one
//! browser session: later steps depend on DOM state produced by earlier
//! ones, so the whole chain shares a page. The script reports one JSON line
//! per completed step on stdout; the first failing step aborts the chain and
//! reports the failure, leaving the remaining steps unattempted.
//!
//! Retry-polling lives here (locator waits and the `waitUntil` probe in the
//! generated script), never in the scenarios themselves.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::spec::{Scenario, ScenarioStep, Viewport};

/// Compiles scenarios to Playwright scripts and runs them under node
pub struct ScenarioDriver {
    config: PlaywrightConfig,
}

#[derive(Debug, Clone, Copy, Default)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for the driver
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    /// Base URL prepended to relative navigation targets
    pub base_url: String,
    /// Directory the generated scripts are written to (kept as artifacts)
    pub script_dir: PathBuf,
    /// Directory for screenshots
    pub screenshot_dir: PathBuf,
    /// Viewport dimensions
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Browser type
    pub browser: Browser,
    /// Headless unless a human is watching; `pause` steps only suspend in
    /// headed runs
    pub headless: bool,
    /// Default per-action timeout applied by the browser session
    pub default_timeout_ms: u64,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            script_dir: PathBuf::from("test-results/scripts"),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
            default_timeout_ms: 5_000,
        }
    }
}

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub step_name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Outcome of one scenario run: results for every attempted step, in order.
/// Steps after the first failure are never attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRun {
    pub steps: Vec<StepResult>,
    pub completed: bool,
    pub error: Option<String>,
}

/// One line of structured output from the generated script
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ScriptEvent {
    Step {
        index: usize,
        name: String,
        duration_ms: u64,
    },
    Log {
        message: String,
    },
    Error {
        index: usize,
        message: String,
    },
    Done {
        steps: usize,
    },
}

const EVENT_MARKER: &str = "@@tienda-e2e@@ ";

impl ScenarioDriver {
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;
        std::fs::create_dir_all(&config.screenshot_dir)?;
        std::fs::create_dir_all(&config.script_dir)?;
        Ok(Self { config })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Run a whole scenario in one browser session
    pub async fn run_scenario(&self, scenario: &Scenario) -> E2eResult<ScenarioRun> {
        let script = self.build_script(scenario);
        let script_path = self.config.script_dir.join(format!("{}.js", scenario.name));
        std::fs::write(&script_path, &script)?;

        debug!("Running scenario script: {}", script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let events = parse_events(&stdout);

        for event in &events {
            if let ScriptEvent::Log { message } = event {
                info!("[{}] {}", scenario.name, message);
            }
        }

        let run = assemble_run(scenario, &events);
        if run.steps.is_empty() && !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(E2eError::Playwright(format!(
                "script failed before reporting any step:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }
        Ok(run)
    }

    /// Generate a display name for a step
    pub fn step_name(step: &ScenarioStep) -> String {
        match step {
            ScenarioStep::Navigate { url, .. } => format!("navigate:{}", url),
            ScenarioStep::AssertTitle { pattern } => format!("assert_title:{}", pattern),
            ScenarioStep::Click { selector, .. } => format!("click:{}", selector),
            ScenarioStep::Fill { selector, .. } => format!("fill:{}", selector),
            ScenarioStep::Press { key, .. } => format!("press:{}", key),
            ScenarioStep::Wait { selector, .. } => format!("wait:{}", selector),
            ScenarioStep::Sleep { ms } => format!("sleep:{}ms", ms),
            ScenarioStep::Assert { selector, .. } => format!("assert:{}", selector),
            ScenarioStep::Screenshot { name, .. } => format!("screenshot:{}", name),
            ScenarioStep::Pause => "pause".to_string(),
            ScenarioStep::Log { message } => {
                format!("log:{}", &message[..message.len().min(30)])
            }
        }
    }

    /// Build the Playwright script for a scenario
    pub fn build_script(&self, scenario: &Scenario) -> String {
        let mut script = String::new();

        let viewport = scenario.viewport.unwrap_or(Viewport {
            width: self.config.viewport_width,
            height: self.config.viewport_height,
        });

        script.push_str(&format!(
            r#"// Generated by tienda-e2e for scenario '{name}'. One browser session;
// steps run strictly in order and the first failure aborts the rest.
const {{ {browser} }} = require('playwright');

function emit(event) {{
  console.log('{marker}' + JSON.stringify(event));
}}

async function waitUntil(description, timeoutMs, probe) {{
  const deadline = Date.now() + timeoutMs;
  let lastError = null;
  for (;;) {{
    try {{
      if (await probe()) return;
      lastError = null;
    }} catch (error) {{
      lastError = error;
    }}
    if (Date.now() >= deadline) {{
      const suffix = lastError ? ': ' + lastError.message : '';
      throw new Error('timed out after ' + timeoutMs + 'ms waiting for ' + description + suffix);
    }}
    await new Promise((resolve) => setTimeout(resolve, 100));
  }}
}}

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({timeout});
  let step = 0;
  let stepStarted = Date.now();
  const done = (name) => {{
    emit({{ type: 'step', index: step, name: name, duration_ms: Date.now() - stepStarted }});
    step += 1;
    stepStarted = Date.now();
  }};
  try {{
"#,
            name = scenario.name,
            marker = EVENT_MARKER,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = viewport.width,
            height = viewport.height,
            timeout = self.config.default_timeout_ms,
        ));

        for (i, step) in scenario.steps.iter().enumerate() {
            script.push_str(&format!("\n    // Step {}: {}\n", i + 1, Self::step_name(step)));
            script.push_str(&self.step_to_js(step));
            script.push_str(&format!("    done({});\n", js_str(&Self::step_name(step))));
        }

        script.push_str(
            r#"
    emit({ type: 'done', steps: step });
  } catch (error) {
    emit({ type: 'error', index: step, message: String((error && error.message) || error) });
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    /// Locator expression, optionally scoped inside a container
    fn locator_expr(selector: &str, within: &Option<String>) -> String {
        match within {
            Some(container) => format!(
                "page.locator({}).locator({})",
                js_str(container),
                js_str(selector)
            ),
            None => format!("page.locator({})", js_str(selector)),
        }
    }

    /// Convert a step to JavaScript code
    fn step_to_js(&self, step: &ScenarioStep) -> String {
        let timeout = self.config.default_timeout_ms;
        match step {
            ScenarioStep::Navigate { url, wait_for_selector } => {
                let target = if url.starts_with("http://") || url.starts_with("https://") {
                    url.clone()
                } else {
                    format!("{}{}", self.config.base_url.trim_end_matches('/'), url)
                };
                let mut js = format!("    await page.goto({});\n", js_str(&target));
                if let Some(selector) = wait_for_selector {
                    js.push_str(&format!(
                        "    await page.locator({}).waitFor({{ state: 'visible' }});\n",
                        js_str(selector)
                    ));
                }
                js
            }

            ScenarioStep::AssertTitle { pattern } => {
                format!(
                    "    await waitUntil({desc}, {timeout}, async () => new RegExp({pattern}).test(await page.title()));\n",
                    desc = js_str(&format!("title matching {}", pattern)),
                    timeout = timeout,
                    pattern = js_str(pattern),
                )
            }

            ScenarioStep::Click { selector, within, timeout_ms } => {
                format!(
                    "    await {}.click({{ timeout: {} }});\n",
                    Self::locator_expr(selector, within),
                    timeout_ms.unwrap_or(timeout)
                )
            }

            ScenarioStep::Fill { selector, value, clear_first } => {
                let locator = Self::locator_expr(selector, &None);
                let mut js = String::new();
                if *clear_first {
                    js.push_str(&format!("    await {}.fill(\"\");\n", locator));
                }
                js.push_str(&format!("    await {}.fill({});\n", locator, js_str(value)));
                js
            }

            ScenarioStep::Press { selector, key } => match selector {
                Some(selector) => format!(
                    "    await {}.press({});\n",
                    Self::locator_expr(selector, &None),
                    js_str(key)
                ),
                None => format!("    await page.keyboard.press({});\n", js_str(key)),
            },

            ScenarioStep::Wait { selector, within, timeout_ms, state } => {
                format!(
                    "    await {}.waitFor({{ state: '{}', timeout: {} }});\n",
                    Self::locator_expr(selector, within),
                    state.as_str(),
                    timeout_ms
                )
            }

            ScenarioStep::Sleep { ms } => {
                format!("    await page.waitForTimeout({});\n", ms)
            }

            ScenarioStep::Assert { selector, within, visible, text, text_contains, count } => {
                let locator = Self::locator_expr(selector, within);
                let mut js = String::new();

                if let Some(visible) = visible {
                    let state = if *visible { "visible" } else { "hidden" };
                    js.push_str(&format!(
                        "    await {}.waitFor({{ state: '{}', timeout: {} }});\n",
                        locator, state, timeout
                    ));
                }
                if let Some(expected) = text {
                    js.push_str(&format!(
                        "    await waitUntil({desc}, {timeout}, async () => ((await {locator}.textContent()) || '').trim() === {expected});\n",
                        desc = js_str(&format!("{} to have text {}", selector, expected)),
                        timeout = timeout,
                        locator = locator,
                        expected = js_str(expected.trim()),
                    ));
                }
                if let Some(expected) = text_contains {
                    js.push_str(&format!(
                        "    await waitUntil({desc}, {timeout}, async () => ((await {locator}.textContent()) || '').includes({expected}));\n",
                        desc = js_str(&format!("{} to contain {}", selector, expected)),
                        timeout = timeout,
                        locator = locator,
                        expected = js_str(expected),
                    ));
                }
                if let Some(expected) = count {
                    js.push_str(&format!(
                        "    await waitUntil({desc}, {timeout}, async () => (await {locator}.count()) === {expected});\n",
                        desc = js_str(&format!("{} to have count {}", selector, expected)),
                        timeout = timeout,
                        locator = locator,
                        expected = expected,
                    ));
                }
                js
            }

            ScenarioStep::Screenshot { name, selector, full_page } => {
                let path = self.config.screenshot_dir.join(format!("{}.png", name));
                let path = js_str(&path.to_string_lossy());
                match selector {
                    Some(selector) => format!(
                        "    await {}.screenshot({{ path: {} }});\n",
                        Self::locator_expr(selector, &None),
                        path
                    ),
                    None => format!(
                        "    await page.screenshot({{ path: {}, fullPage: {} }});\n",
                        path, full_page
                    ),
                }
            }

            ScenarioStep::Pause => {
                if self.config.headless {
                    warn!("pause step in a headless run will be skipped");
                    "    emit({ type: 'log', message: 'pause skipped (headless run)' });\n"
                        .to_string()
                } else {
                    "    await page.pause();\n".to_string()
                }
            }

            ScenarioStep::Log { message } => {
                format!("    emit({{ type: 'log', message: {} }});\n", js_str(message))
            }
        }
    }
}

/// JSON-encode a string into a JS string literal; also the quoting-safe way
/// to embed CSS selectors that themselves contain quotes.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_default()
}

/// Extract structured events from script stdout, ignoring any other output
pub(crate) fn parse_events(stdout: &str) -> Vec<ScriptEvent> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix(EVENT_MARKER))
        .filter_map(|payload| serde_json::from_str(payload).ok())
        .collect()
}

/// Fold script events into per-step results. Steps after the first failure
/// are not attempted and get no result.
pub(crate) fn assemble_run(scenario: &Scenario, events: &[ScriptEvent]) -> ScenarioRun {
    let mut steps = Vec::new();
    let mut completed = false;
    let mut error = None;

    for event in events {
        match event {
            ScriptEvent::Step { index, name, duration_ms } => {
                steps.push(StepResult {
                    index: *index,
                    step_name: name.clone(),
                    success: true,
                    duration_ms: *duration_ms,
                    error: None,
                });
            }
            ScriptEvent::Error { index, message } => {
                let step_name = scenario
                    .steps
                    .get(*index)
                    .map(ScenarioDriver::step_name)
                    .unwrap_or_else(|| format!("step {}", index));
                steps.push(StepResult {
                    index: *index,
                    step_name,
                    success: false,
                    duration_ms: 0,
                    error: Some(message.clone()),
                });
                error = Some(message.clone());
            }
            ScriptEvent::Done { .. } => completed = true,
            ScriptEvent::Log { .. } => {}
        }
    }

    if !completed && error.is_none() {
        error = Some("script ended without reporting completion".to_string());
    }

    ScenarioRun { steps, completed, error }
}

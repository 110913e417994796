//! Scenario runner orchestrating the server and the Playwright driver
//!
//! Scenarios run one after another; within a scenario, the driver enforces
//! strict step order and first-failure abort. The runner owns what the
//! scenarios must not: server lifecycle, timeouts, and reporting.

use std::path::PathBuf;
use std::time::Instant;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{E2eError, E2eResult};
use crate::playwright::{PlaywrightConfig, ScenarioDriver, StepResult};
use crate::server::{ServerConfig, ServerHandle};
use crate::spec::Scenario;

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// Result of running a whole suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    /// Tally per-scenario results into suite counters
    pub fn summarize(results: Vec<ScenarioResult>, skipped: usize, duration_ms: u64) -> Self {
        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        Self {
            total: results.len() + skipped,
            passed,
            failed,
            skipped,
            duration_ms,
            results,
        }
    }
}

/// Main scenario runner
pub struct ScenarioRunner {
    server_config: ServerConfig,
    playwright_config: PlaywrightConfig,
    server: Option<ServerHandle>,
    specs_dir: PathBuf,
    output_dir: PathBuf,
    include_external: bool,
}

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub server: ServerConfig,
    pub playwright: PlaywrightConfig,
    pub specs_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Run scenarios tagged `external` (they drive live third-party sites
    /// whose markup is outside our control)
    pub include_external: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            playwright: PlaywrightConfig::default(),
            specs_dir: PathBuf::from("crates/e2e/specs"),
            output_dir: PathBuf::from("test-results"),
            include_external: false,
        }
    }
}

impl ScenarioRunner {
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self {
            server_config: config.server,
            playwright_config: config.playwright,
            server: None,
            specs_dir: config.specs_dir,
            output_dir: config.output_dir,
            include_external: config.include_external,
        }
    }

    /// Start the storefront server if it is not already running
    pub async fn start_server(&mut self) -> E2eResult<()> {
        if self.server.is_some() {
            return Ok(());
        }

        let server = ServerHandle::spawn(self.server_config.clone()).await?;
        self.playwright_config.base_url = server.base_url().to_string();
        self.server = Some(server);
        Ok(())
    }

    /// Stop the server
    pub fn stop_server(&mut self) -> E2eResult<()> {
        if let Some(mut server) = self.server.take() {
            server.stop()?;
        }
        Ok(())
    }

    /// Run all scenarios in the specs directory
    pub async fn run_all(&mut self) -> E2eResult<SuiteResult> {
        let scenarios = Scenario::load_all(&self.specs_dir)?;
        self.run_scenarios(&scenarios).await
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<SuiteResult> {
        let scenarios = Scenario::load_all(&self.specs_dir)?;
        let filtered: Vec<Scenario> = scenarios
            .into_iter()
            .filter(|s| s.has_tag(tag))
            .collect();
        self.run_scenarios(&filtered).await
    }

    /// Run a specific scenario by name
    pub async fn run_named(&mut self, name: &str) -> E2eResult<ScenarioResult> {
        let scenarios = Scenario::load_all(&self.specs_dir)?;
        let scenario = scenarios
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Scenario not found: {}", name)))?;

        self.run_scenario(&scenario).await
    }

    /// Run a list of scenarios
    pub async fn run_scenarios(&mut self, scenarios: &[Scenario]) -> E2eResult<SuiteResult> {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut skipped = 0;

        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in scenarios {
            if scenario.has_tag("external") && !self.include_external {
                info!("- {} (skipped: external site)", scenario.name);
                skipped += 1;
                continue;
            }

            match self.run_scenario(scenario).await {
                Ok(result) => {
                    if result.success {
                        info!("✓ {} ({} ms)", result.name, result.duration_ms);
                    } else {
                        error!(
                            "✗ {} - {}",
                            result.name,
                            result.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                    results.push(result);
                }
                Err(e) => {
                    error!("✗ {} - {}", scenario.name, e);
                    results.push(ScenarioResult {
                        name: scenario.name.clone(),
                        success: false,
                        duration_ms: 0,
                        steps: vec![],
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let suite = SuiteResult::summarize(results, skipped, start.elapsed().as_millis() as u64);

        info!("");
        info!(
            "Results: {} passed, {} failed, {} skipped ({} ms)",
            suite.passed, suite.failed, suite.skipped, suite.duration_ms
        );

        Ok(suite)
    }

    /// Run a single scenario
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> E2eResult<ScenarioResult> {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        // Local scenarios need the storefront; external ones run against the
        // live site directly.
        if scenario.requires_server() {
            self.start_server().await?;
        }

        let driver = ScenarioDriver::new(self.playwright_config.clone())?;
        let run = driver.run_scenario(scenario).await?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let success = run.completed && run.error.is_none();

        Ok(ScenarioResult {
            name: scenario.name.clone(),
            success,
            duration_ms,
            steps: run.steps,
            error: run.error,
        })
    }

    /// Write suite results to a JSON file
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScenarioRunner {
    fn drop(&mut self) {
        let _ = self.stop_server();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, success: bool) -> ScenarioResult {
        ScenarioResult {
            name: name.into(),
            success,
            duration_ms: 10,
            steps: vec![],
            error: if success { None } else { Some("boom".into()) },
        }
    }

    #[test]
    fn test_summarize_counts() {
        let suite = SuiteResult::summarize(
            vec![result("a", true), result("b", false), result("c", true)],
            2,
            1234,
        );
        assert_eq!(suite.total, 5);
        assert_eq!(suite.passed, 2);
        assert_eq!(suite.failed, 1);
        assert_eq!(suite.skipped, 2);
        assert_eq!(suite.duration_ms, 1234);
    }

    #[test]
    fn test_summarize_empty() {
        let suite = SuiteResult::summarize(vec![], 0, 0);
        assert_eq!(suite.total, 0);
        assert_eq!(suite.passed, 0);
        assert_eq!(suite.failed, 0);
    }
}

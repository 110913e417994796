//! Tienda browser scenario harness
//!
//! A Rust-controlled E2E framework that:
//! - Spawns the storefront web server as a subprocess (for local scenarios)
//! - Compiles declarative YAML scenarios into Playwright scripts
//! - Runs each scenario as one browser session, strictly in step order
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Scenario Runner (Rust)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioRunner                                             │
//! │    ├── spawn_server() -> ServerHandle                       │
//! │    ├── run_scenario(spec) -> ScenarioResult                 │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML)                                            │
//! │    ├── name, description, tags, viewport                    │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate { url }                               │
//! │          ├── assert_title { pattern }                       │
//! │          ├── fill / press / click / wait / assert           │
//! │          └── pause (headed runs only)                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A scenario is one linear chain: every step suspends until its condition
//! holds or the harness timeout elapses, and the first failing step aborts
//! the rest of the chain.

pub mod error;
pub mod playwright;
pub mod runner;
pub mod server;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use runner::ScenarioRunner;
pub use spec::{Scenario, ScenarioStep};

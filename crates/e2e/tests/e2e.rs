//! Scenario harness entry point
//!
//! This file is the test binary that runs browser scenarios from YAML specs.
//! Run with: cargo test --package tienda-e2e --test e2e
//!
//! Scenarios tagged `external` drive live third-party sites and are skipped
//! unless --include-external is passed; use --headed for `pause` steps to
//! actually suspend for manual inspection.

use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tienda_e2e::playwright::{Browser, PlaywrightConfig};
use tienda_e2e::runner::RunnerConfig;
use tienda_e2e::server::ServerConfig;
use tienda_e2e::{E2eResult, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "tienda-e2e")]
#[command(about = "Browser scenario runner for Tienda")]
struct Args {
    /// Path to the scenario specs directory
    #[arg(short, long, default_value = "crates/e2e/specs")]
    specs: PathBuf,

    /// Run only scenarios matching this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific scenario by name
    #[arg(short, long)]
    name: Option<String>,

    /// Also run scenarios tagged `external` (live third-party sites)
    #[arg(long)]
    include_external: bool,

    /// Path to the storefront server binary
    #[arg(long, default_value = "target/debug/tienda-web")]
    server_binary: PathBuf,

    /// Port to run the server on (0 = auto)
    #[arg(long, default_value = "0")]
    port: u16,

    /// Server startup timeout in seconds
    #[arg(long, default_value = "30")]
    startup_timeout_secs: u64,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: String,

    /// Run with a visible browser window; required for `pause` steps
    #[arg(long)]
    headed: bool,

    /// Viewport width
    #[arg(long, default_value = "1280")]
    viewport_width: u32,

    /// Viewport height
    #[arg(long, default_value = "720")]
    viewport_height: u32,

    /// Default per-action timeout in milliseconds
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    /// Output directory for results, scripts, and screenshots
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    // Run async main
    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async_main(args));

    match result {
        Ok(success) => {
            if success {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let browser = match args.browser.as_str() {
        "firefox" => Browser::Firefox,
        "webkit" => Browser::Webkit,
        _ => Browser::Chromium,
    };

    let config = RunnerConfig {
        server: ServerConfig {
            binary_path: args.server_binary,
            port: if args.port == 0 { None } else { Some(args.port) },
            startup_timeout: Duration::from_secs(args.startup_timeout_secs),
            ..Default::default()
        },
        playwright: PlaywrightConfig {
            script_dir: args.output.join("scripts"),
            screenshot_dir: args.output.join("screenshots"),
            viewport_width: args.viewport_width,
            viewport_height: args.viewport_height,
            browser,
            headless: !args.headed,
            default_timeout_ms: args.timeout_ms,
            ..Default::default()
        },
        specs_dir: args.specs,
        output_dir: args.output,
        include_external: args.include_external,
    };

    let mut runner = ScenarioRunner::with_config(config);

    // Run scenarios
    let results = if let Some(name) = args.name {
        let result = runner.run_named(&name).await?;
        let duration_ms = result.duration_ms;
        tienda_e2e::runner::SuiteResult::summarize(vec![result], 0, duration_ms)
    } else if let Some(tag) = args.tag {
        runner.run_tagged(&tag).await?
    } else {
        runner.run_all().await?
    };

    // Write results
    runner.write_results(&results)?;

    Ok(results.failed == 0)
}

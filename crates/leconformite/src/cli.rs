// CLI Interface
//
// Command-line front end: run the suite against the mock plugin, list the
// registered checks, and print the latency baseline table.

use crate::baseline;
use crate::checks;
use crate::config::{ConformanceConfig, DEFAULT_CONFIG_FILE};
use crate::level::ConformanceLevel;
use crate::reporter::{self, ReportFormat};
use crate::suite::run_plugin;
use anyhow::{bail, Context, Result as AnyhowResult};
use clap::{Parser, Subcommand};
use lesimulacre::{MockPlugin, SummaryScope};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// leconform - CostSource plugin conformance runner
#[derive(Parser, Debug)]
#[command(name = "leconform")]
#[command(author = "LeCout Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify CostSource plugins against a leveled conformance suite", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults apply when it does not exist)
    #[arg(global = true, long = "config", short = 'c')]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(global = true, long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the suite against the mock plugin and print a report
    Run {
        /// Level to verify (basic, standard, advanced)
        #[arg(long = "level", short = 'l')]
        level: Option<ConformanceLevel>,

        /// Report format (json, text)
        #[arg(long = "format", short = 'f')]
        format: Option<ReportFormat>,

        /// Make METHOD fail with the configured error code
        #[arg(long = "fail", value_name = "METHOD")]
        fail: Vec<String>,

        /// Delay METHOD by MS milliseconds
        #[arg(long = "delay", value_name = "METHOD=MS")]
        delay: Vec<String>,

        /// Leave METHOD unimplemented
        #[arg(long = "without", value_name = "METHOD")]
        without: Vec<String>,

        /// Status code for failing methods (e.g. UNAVAILABLE)
        #[arg(long = "error-code")]
        error_code: Option<String>,

        /// Recommendation summary scope (page, query)
        #[arg(long = "summary-scope")]
        summary_scope: Option<String>,

        /// Per-call timeout in milliseconds
        #[arg(long = "timeout-ms")]
        timeout_ms: Option<u64>,

        /// Also write the report to this file
        #[arg(long = "output", short = 'o')]
        output: Option<PathBuf>,
    },

    /// List the registered checks
    List {
        /// Only checks that run at this level
        #[arg(long = "level", short = 'l')]
        level: Option<ConformanceLevel>,
    },

    /// Print the latency baseline table
    Baselines,
}

impl Cli {
    /// Run the CLI
    pub async fn run(self) -> AnyhowResult<ExitCode> {
        init_logging(self.verbose);

        let path = self
            .config
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = ConformanceConfig::load(&path)?;
        config.apply_env();
        debug!(config = %path.display(), "configuration loaded");

        match self.command {
            Commands::Run {
                level,
                format,
                fail,
                delay,
                without,
                error_code,
                summary_scope,
                timeout_ms,
                output,
            } => {
                let overrides = RunOverrides {
                    level,
                    format,
                    fail,
                    delay,
                    without,
                    error_code,
                    summary_scope,
                    timeout_ms,
                };
                overrides.apply(&mut config)?;
                cmd_run(config, output).await
            }
            Commands::List { level } => {
                cmd_list(config, level)?;
                Ok(ExitCode::SUCCESS)
            }
            Commands::Baselines => {
                cmd_baselines();
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// `run` flags layered over the loaded configuration
#[derive(Debug, Default)]
struct RunOverrides {
    level: Option<ConformanceLevel>,
    format: Option<ReportFormat>,
    fail: Vec<String>,
    delay: Vec<String>,
    without: Vec<String>,
    error_code: Option<String>,
    summary_scope: Option<String>,
    timeout_ms: Option<u64>,
}

impl RunOverrides {
    fn apply(self, config: &mut ConformanceConfig) -> AnyhowResult<()> {
        if let Some(level) = self.level {
            config.suite.level = level;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(ms) = self.timeout_ms {
            config.suite.call_timeout_ms = ms;
        }
        if let Some(code) = self.error_code {
            config.mock.error_code = code;
        }
        if let Some(scope) = self.summary_scope {
            config.mock.summary_scope = SummaryScope::parse(&scope)
                .with_context(|| format!("Invalid summary scope: {scope} (expected page or query)"))?;
        }
        config.mock.errors.extend(self.fail);
        config.mock.unimplemented.extend(self.without);
        for spec in &self.delay {
            let (method, ms) = parse_delay(spec)?;
            config.mock.delays_ms.insert(method, ms);
        }
        Ok(())
    }
}

/// `METHOD=MS` -> (`METHOD`, `MS`)
fn parse_delay(spec: &str) -> AnyhowResult<(String, u64)> {
    let Some((method, ms)) = spec.split_once('=') else {
        bail!("Invalid delay '{spec}' (expected METHOD=MS)");
    };
    let ms = ms
        .trim()
        .parse()
        .with_context(|| format!("Invalid delay milliseconds in '{spec}'"))?;
    Ok((method.trim().to_string(), ms))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

async fn cmd_run(config: ConformanceConfig, output: Option<PathBuf>) -> AnyhowResult<ExitCode> {
    config.validate().context("Invalid configuration")?;
    let level = config.suite.level;
    let format = config.output.format;

    let plugin = MockPlugin::with_config(config.mock_config()?);
    let mut suite = checks::standard_suite(config)?;
    let result = run_plugin(&mut suite, plugin, level)
        .await
        .context("Conformance run failed")?;

    let report = reporter::render(&result, format)?;
    println!("{report}");
    if let Some(path) = output {
        std::fs::write(&path, &report)
            .with_context(|| format!("Failed to write report: {:?}", path))?;
        info!(path = %path.display(), "report written");
    }

    info!(
        plugin_name = %result.plugin_name,
        level = %level,
        "{}",
        reporter::status_line(&result)
    );

    Ok(if result.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn cmd_list(config: ConformanceConfig, level: Option<ConformanceLevel>) -> AnyhowResult<()> {
    let suite = checks::standard_suite(config)?;
    let level = level.unwrap_or(ConformanceLevel::Advanced);

    println!("{:<36} {:<16} {:<9} Description", "Name", "Category", "Level");
    for test in suite.tests_for(level) {
        println!(
            "{:<36} {:<16} {:<9} {}",
            test.name,
            test.category.as_str(),
            test.min_level.as_str(),
            test.description
        );
    }
    Ok(())
}

fn cmd_baselines() {
    println!("{:<20} {:>12} {:>12}", "Method", "Standard", "Advanced");
    for baseline in baseline::all() {
        println!(
            "{:<20} {:>10}ms {:>10}ms",
            baseline.method.as_str(),
            baseline.standard.as_millis(),
            baseline.advanced.as_millis()
        );
    }
}

/// Main entry point for the CLI
pub async fn main() -> AnyhowResult<ExitCode> {
    let cli = Cli::parse();
    cli.run().await
}

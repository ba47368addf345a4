//! Remedy - run, report, and repair Python repositories
//!
//! Executes every Python file in a repository in isolation, flattens the
//! results into a report, and optionally drives an LLM edit loop until the
//! repository runs clean.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use remedy_core::report::ReportOptions;
use remedy_engine::inspect;
use remedy_engine::repair;
use remedy_engine::{Config, FixOutcome, LlmClient, LlmEditService, PythonExecutor};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "remedy",
    about = "Run and repair Python repositories",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute every file and print a flattened report
    Report {
        /// Path to the repository (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Include runtime errors
        #[arg(long)]
        errors: bool,

        /// Include captured stdout
        #[arg(long)]
        outputs: bool,

        /// Print file contents instead of executing
        #[arg(long)]
        content: bool,

        /// With --content, reduce files to docstrings and signatures
        #[arg(long)]
        summary: bool,

        /// Emit JSON instead of flat text
        #[arg(long)]
        json: bool,
    },

    /// Repair the repository until it runs clean or the trial budget is spent
    Fix {
        /// Path to the repository (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Maximum number of edit dispatches
        #[arg(long)]
        trials: Option<u32>,

        /// Model identifier sent to the edit service
        #[arg(long)]
        model: Option<String>,

        /// Per-file execution timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Show the effective configuration and where it lives
    Config {
        /// Write the effective configuration to disk
        #[arg(long)]
        init: bool,
    },

    /// Alternate feature work and repair over several iterations
    Engineer {
        /// Path to the repository (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// The feature instruction to pursue each iteration
        #[arg(long)]
        prompt: String,

        /// Number of feature iterations
        #[arg(long)]
        iterations: Option<u32>,

        /// Maximum edit dispatches per repair pass
        #[arg(long)]
        trials: Option<u32>,

        /// Model identifier sent to the edit service
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load();

    match args.command {
        Command::Report {
            path,
            errors,
            outputs,
            content,
            summary,
            json,
        } => report(&config, path, errors, outputs, content, summary, json),
        Command::Config { init } => show_config(&config, init),
        Command::Fix {
            path,
            trials,
            model,
            timeout_secs,
        } => fix(&config, path, trials, model, timeout_secs).await,
        Command::Engineer {
            path,
            prompt,
            iterations,
            trials,
            model,
        } => engineer(&config, path, prompt, iterations, trials, model).await,
    }
}

fn show_config(config: &Config, init: bool) -> Result<()> {
    if init {
        config.save().map_err(|e| anyhow!(e))?;
        eprintln!("  + config written to {}", Config::config_location());
    } else {
        eprintln!("  config file: {}", Config::config_location());
        println!("{}", serde_json::to_string_pretty(config)?);
    }
    Ok(())
}

fn build_executor(config: &Config, timeout_secs: Option<u64>) -> PythonExecutor {
    PythonExecutor::new(
        &config.python_bin,
        Duration::from_secs(timeout_secs.unwrap_or(config.file_timeout_secs)),
    )
}

fn build_service(config: &Config) -> Result<LlmEditService> {
    let api_key = config.get_api_key().ok_or_else(|| {
        anyhow!("No API key found. Set the OPENROUTER_API_KEY environment variable.")
    })?;
    Ok(LlmEditService::new(LlmClient::new(api_key)))
}

fn report(
    config: &Config,
    path: PathBuf,
    errors: bool,
    outputs: bool,
    content: bool,
    summary: bool,
    json: bool,
) -> Result<()> {
    let report = if content {
        inspect::repository_map(&path, summary)?
    } else {
        let options = if errors || outputs {
            ReportOptions {
                with_errors: errors,
                with_outputs: outputs,
            }
        } else {
            ReportOptions::errors_and_outputs()
        };
        let executor = build_executor(config, None);
        let (_, report) = inspect::execution_report(&executor, &path, options)?;
        report
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report.to_map())?);
    } else if report.is_empty() {
        eprintln!("  + nothing to report");
    } else {
        println!("{}", report.to_flat_text());
    }
    Ok(())
}

async fn fix(
    config: &Config,
    path: PathBuf,
    trials: Option<u32>,
    model: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let executor = build_executor(config, timeout_secs);
    let service = build_service(config)?;
    let model = model.unwrap_or_else(|| config.model.clone());
    let trials = trials.unwrap_or(config.trials);

    let outcome = repair::fix_repository(&executor, &service, &path, &model, trials).await?;
    print_outcome(&outcome);
    if outcome.is_clean() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

async fn engineer(
    config: &Config,
    path: PathBuf,
    prompt: String,
    iterations: Option<u32>,
    trials: Option<u32>,
    model: Option<String>,
) -> Result<()> {
    let executor = build_executor(config, None);
    let service = build_service(config)?;
    let model = model.unwrap_or_else(|| config.model.clone());
    let iterations = iterations.unwrap_or(config.iterations);
    let trials = trials.unwrap_or(config.trials);

    let outcome = repair::iterative_engineering_process(
        &executor, &service, &path, &prompt, &model, iterations, trials,
    )
    .await?;
    print_outcome(&outcome);
    if outcome.is_clean() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn print_outcome(outcome: &FixOutcome) {
    match outcome {
        FixOutcome::Clean => eprintln!("  + no problems found"),
        FixOutcome::Fixed { attempts } => {
            eprintln!("  + fixed after {} attempt(s)", attempts)
        }
        FixOutcome::TrialsExhausted { attempts, remaining } => {
            eprintln!(
                "  ! problems remain after {} attempt(s) ({} file(s) still failing)",
                attempts,
                remaining.len()
            );
        }
    }
}

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use precommit_utl::{
    CopyrightConfig, CopyrightUpdater, DEFAULT_SETTINGS_PATH, WorkflowChecker, Year,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "precommit-utl",
    version,
    author,
    about = "Pre-commit hooks for copyright notices and CI workflows",
    long_about = "Pre-commit hooks for copyright notices and CI workflows.\n\n\
    Each subcommand takes the files handed over by pre-commit and exits with \
    status 1 when one of them needed attention.\n\n\
    USAGE EXAMPLES:\n  \
      # Bring copyright years in line with the git history\n  \
      precommit-utl copyright src/main.rs LICENSE\n\n  \
      # Fail on files without a notice, show what would change\n  \
      precommit-utl copyright --required --dry-run -v src/*.rs\n\n  \
      # Require a timeout on every workflow job\n  \
      precommit-utl workflow-timeout"
)]
struct Cli {
    /// Verbose output (-v for debug diagnostics, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Update the copyright header of the files
    Copyright(CopyrightArgs),

    /// Check that every job of the GitHub workflows has a timeout
    WorkflowTimeout(WorkflowArgs),
}

#[derive(Args, Debug)]
struct CopyrightArgs {
    /// The configuration file
    #[arg(long, default_value = DEFAULT_SETTINGS_PATH, value_name = "FILE")]
    config: PathBuf,

    /// The copyright is required
    #[arg(long)]
    required: bool,

    /// Report outdated notices without rewriting files
    #[arg(long)]
    dry_run: bool,

    /// Year written as the end of updated ranges (defaults to the clock)
    #[arg(long, value_name = "YYYY", env = "PRECOMMIT_UTL_CURRENT_YEAR")]
    current_year: Option<Year>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// The files to update
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct WorkflowArgs {
    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// The files to check (defaults to .github/workflows/*.yaml and *.yml)
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let success = match cli.command {
        Command::Copyright(args) => copyright(args, cli.verbose > 0)?,
        Command::WorkflowTimeout(args) => workflow_timeout(&args)?,
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn copyright(args: CopyrightArgs, verbose: bool) -> anyhow::Result<bool> {
    let mut builder = CopyrightConfig::builder()
        .settings_path(&args.config)
        .files(args.files)
        .required(args.required)
        .verbose(verbose)
        .dry_run(args.dry_run);

    if let Some(year) = args.current_year {
        builder = builder.current_year(year);
    }

    let config = builder.build().with_context(|| {
        format!(
            "Failed to load copyright configuration from '{}'",
            args.config.display()
        )
    })?;

    let report = CopyrightUpdater::new(config).run();

    if args.json {
        print_json(&report)?;
    }

    Ok(report.is_success())
}

fn workflow_timeout(args: &WorkflowArgs) -> anyhow::Result<bool> {
    let checker = WorkflowChecker::new(".").context("Failed to create workflow checker")?;
    let report = checker
        .check(&args.files)
        .context("Workflow check failed")?;

    if args.json {
        print_json(&report)?;
    } else {
        for violation in &report.violations {
            println!("{violation}");
        }
    }

    Ok(report.is_success())
}

fn print_json(report: &impl Serialize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}

/// Log directive for a `-v` count.
const fn log_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "precommit_utl=info",
        1 => "precommit_utl=debug",
        _ => "precommit_utl=trace",
    }
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::new(log_directive(verbosity)))
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(())
}

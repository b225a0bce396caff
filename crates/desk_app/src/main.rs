mod app;
mod config;
mod effects;
mod logging;
mod persistence;
mod render;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use desk_core::ToolKey;
use log::LevelFilter;

use crate::app::RunRequest;
use crate::config::DeskConfig;
use crate::logging::LogDestination;

/// Convert, compress, sign and edit documents.
#[derive(Debug, Parser)]
#[command(name = "pdfdesk", version, about)]
struct Args {
    /// RON config file (default: ./pdfdesk.ron if present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level to the terminal as well as the log file.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the available tools with their accepted files and options.
    Tools,
    /// Run one job over the given files.
    Run(RunArgs),
    /// Show previously completed jobs.
    History {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Tool key, e.g. `pdf-to-word` or `compress`.
    #[arg(long, default_value_t = ToolKey::default().as_str().to_string())]
    tool: String,

    /// Option assignment, repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    settings: Vec<String>,

    /// Download directory (overrides the config file).
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Cancel the job if it has not finished after this many seconds.
    #[arg(long, value_name = "N")]
    timeout_secs: Option<u64>,

    /// Skip saving results.
    #[arg(long)]
    no_download: bool,

    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = DeskConfig::load(args.config.as_deref())?;

    let (destination, level) = if args.verbose {
        (LogDestination::Both, LevelFilter::Debug)
    } else {
        (config.log_destination, logging::parse_level(&config.log_level))
    };
    logging::initialize(destination, level);

    match args.command {
        Command::Tools => {
            render::tools();
            Ok(())
        }
        Command::Run(run) => {
            let request = RunRequest {
                tool: run.tool.parse()?,
                settings: run.settings,
                files: run.files,
                out: run.out,
                timeout: run.timeout_secs.map(Duration::from_secs),
                download: !run.no_download,
            };
            app::run(&config, request)
        }
        Command::History { json } => app::print_history(&config, json),
    }
}

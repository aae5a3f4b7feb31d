mod checkpoint_file;
mod commands;
mod config;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tag_inventory_core::RunDate;

use commands::{
    cmd_aggregate, cmd_bootstrap, cmd_group, cmd_merge, cmd_report, cmd_search, AggregateArgs,
};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Tag inventory across an AWS Organization.
#[derive(Parser)]
#[command(
    name = "tag-inventory",
    version,
    about = "Inventory resource tags across an AWS Organization"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Configuration file (default: ./tag-inventory.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one page from the resource index (the Search step)
    Search {
        /// Search step input JSON; `-` reads stdin. Default: first page.
        #[arg(long)]
        event: Option<PathBuf>,
    },

    /// Group a Search step output by tag name and value
    Group {
        /// Search step output JSON; `-` reads stdin
        #[arg(long)]
        event: PathBuf,
    },

    /// Fold grouped results into the accumulator (the Merge step)
    Merge {
        /// Merge step input JSON; `-` reads stdin
        #[arg(long)]
        event: PathBuf,
    },

    /// Run a whole spoke-account aggregation: search, merge, write, notify
    Aggregate {
        /// Run identifier used in the output key (default: generated)
        #[arg(long)]
        run_id: Option<String>,
        /// Partition date, YYYY-MM-DD (default: today, UTC)
        #[arg(long)]
        date: Option<RunDate>,
        /// Save a checkpoint to this file after every merged page
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        /// Continue from the checkpoint file instead of starting over
        #[arg(long, requires = "checkpoint")]
        resume: bool,
    },

    /// Build the daily CSV report in the central account
    Report {
        /// Seconds between job status polls
        #[arg(long)]
        poll_interval_secs: Option<u64>,
        /// Status polls before a job is abandoned (at least 1)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_poll_attempts: Option<u32>,
    },

    /// Turn on resource indexes, the aggregator and the all-resources view
    Bootstrap {
        /// Custom-resource request JSON; `-` reads stdin. Answers with a
        /// custom-resource response instead of a summary.
        #[arg(long)]
        event: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.quiet);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Search { event } => {
            cmd_search(event.as_deref(), config, cli.output, cli.quiet);
        }
        Commands::Group { event } => {
            cmd_group(&event, cli.output, cli.quiet);
        }
        Commands::Merge { event } => {
            cmd_merge(&event, config, cli.output, cli.quiet);
        }
        Commands::Aggregate {
            run_id,
            date,
            checkpoint,
            resume,
        } => {
            let args = AggregateArgs {
                run_id,
                date,
                checkpoint,
                resume,
            };
            cmd_aggregate(args, config, cli.output, cli.quiet);
        }
        Commands::Report {
            poll_interval_secs,
            max_poll_attempts,
        } => {
            cmd_report(
                poll_interval_secs,
                max_poll_attempts,
                config,
                cli.output,
                cli.quiet,
            );
        }
        Commands::Bootstrap { event } => {
            cmd_bootstrap(event.as_deref(), config, cli.output, cli.quiet);
        }
    }
}

fn error_json(msg: &str) -> String {
    serde_json::json!({ "error": msg }).to_string()
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{}", error_json(msg)),
    }
}

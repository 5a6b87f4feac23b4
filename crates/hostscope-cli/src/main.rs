//! CLI for hostscope: live CPU, drive, network, temperature and fan charts.

mod commands;
mod tui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hostscope")]
#[command(about = "hostscope — live CPU, drive, network, temperature and fan charts")]
#[command(version = hostscope_core::VERSION)]
struct Cli {
    /// Configuration file (INI-style); defaults apply when missing
    #[arg(long, global = true, default_value = "hostscope.conf")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample headless and print one line per tick
    Sample {
        /// Stop after this many ticks (default: until Ctrl+C)
        #[arg(long)]
        ticks: Option<u64>,

        /// Print every chart as JSON when sampling stops
        #[arg(long)]
        json: bool,
    },

    /// Live terminal dashboard (TUI)
    Monitor {
        /// Refresh period in seconds (overrides monitor.refresh_ms)
        #[arg(long)]
        refresh: Option<f64>,
    },
}

fn init_logging(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sample { ticks, json } => {
            init_logging("warn");
            commands::sample::run(&cli.config, ticks, json);
        }
        Commands::Monitor { refresh } => {
            // The dashboard owns the terminal; diagnostics go to its status line.
            init_logging("off");
            commands::monitor::run(&cli.config, refresh);
        }
    }
}

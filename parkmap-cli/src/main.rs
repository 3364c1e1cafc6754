//! parkmap CLI - Command-line interface
//!
//! Fetches parking lots from the backend and renders them on the headless
//! map provided by the parkmap library.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use parkmap::coord::LatLng;
use parkmap::config::config_file_path;

use commands::common::FilterArgs;
use commands::config::ConfigCommands;
use commands::list::ListArgs;
use commands::show::{parse_lat_lng, ShowArgs};
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "parkmap")]
#[command(version, about = "Browse parking lots on a map from the terminal", long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the configuration file
    Init {
        /// Map SDK app key to store
        #[arg(long)]
        api_key: Option<String>,
    },

    /// List parking lots with a valid location
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Render parking lots on the headless map and print the result
    Show {
        #[command(flatten)]
        filters: FilterArgs,

        /// Keep the initial camera instead of framing the markers
        #[arg(long)]
        no_fit: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Pan to LAT,LNG after rendering and report the settled viewport
        #[arg(long, value_name = "LAT,LNG", value_parser = parse_lat_lng)]
        pan: Option<LatLng>,
    },

    /// View or change configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.unwrap_or_else(config_file_path);

    match cli.command {
        Commands::Init { api_key } => commands::init::run(&config_path, api_key),
        Commands::Config { command } => commands::config::run(command, &config_path),
        Commands::List { filters, json } => {
            let runner = CliRunner::new(&config_path, cli.verbose)?;
            commands::list::run(&runner, ListArgs { filters, json })
        }
        Commands::Show {
            filters,
            no_fit,
            json,
            pan,
        } => {
            let runner = CliRunner::new(&config_path, cli.verbose)?;
            commands::show::run(
                &runner,
                ShowArgs {
                    filters,
                    no_fit,
                    json,
                    pan,
                },
            )
        }
    }
}

//! dbcfg - command-line front end for the DBNet configuration loader
//!
//! Validates DBNet training configurations before they reach the training
//! engine and prints the fully explicit document the engine will receive.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use commands::{components, profiles, show, validate, LoadArgs};
use dbnet_config::{ConfigFormat, RegistryScope};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// dbcfg - DBNet training configuration checker
#[derive(Parser, Debug)]
#[command(
    name = "dbcfg",
    author,
    version,
    about = "Validate and inspect DBNet text-detection training configurations",
    long_about = "dbcfg loads a DBNet training configuration (TOML, JSON or YAML), \
                  resolves `_base_` includes,\nchecks every component against the registries \
                  and reports the first problem with its field path."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error) [default: warn]
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a configuration file
    ///
    /// Runs every validation stage and exits with status 1 on the first error,
    /// printing its kind and dotted field path.
    Validate {
        #[command(flatten)]
        load: LoadArgs,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the validated configuration with every default filled in
    Show {
        #[command(flatten)]
        load: LoadArgs,

        /// Output format (toml, json, yaml)
        #[arg(long)]
        format: Option<ConfigFormat>,
    },

    /// List named image normalization profiles
    Profiles {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered components and the fields they accept
    Components {
        /// Only this registry scope (e.g. backbone, transform, lr_policy)
        #[arg(long)]
        scope: Option<RegistryScope>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cli_config = config::CliConfig::discover_and_load();

    // Initialize tracing
    let level = match args
        .log_level
        .as_deref()
        .or(cli_config.log_level.as_deref())
        .unwrap_or("warn")
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Validate { load, json } => validate::execute(&load, json, &cli_config),
        Command::Show { load, format } => show::execute(&load, format, &cli_config),
        Command::Profiles { json } => {
            profiles::execute(json || cli_config.output.always_json)
        }
        Command::Components { scope, json } => {
            components::execute(scope, json || cli_config.output.always_json)
        }
    }
}

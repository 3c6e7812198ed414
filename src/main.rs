//! liveconf - read and update live-system configuration files
//!
//! Installer and boot scripts call this instead of sourcing and rewriting
//! the `KEY=VALUE` configuration file themselves.

mod location;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{ConfigError, ConfigStore, ConfigValue, Entries, KeySelector, SaveMode};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// liveconf - Live system configuration store
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (searched in standard locations if not specified)
    #[arg(short, long, env = "LIVECONF_FILE", global = true)]
    file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the value of a single key (empty if unset)
    Get {
        /// Key to look up
        key: String,
    },
    /// Print the requested keys as KEY=VALUE lines
    Load {
        /// Keys to load
        keys: Vec<String>,
        /// Print a JSON object instead
        #[arg(long)]
        json: bool,
    },
    /// Write values, replacing existing assignments or appending new ones
    Set {
        /// Assignments such as USER_NAME=user or LIVE_SERVICES=(ssh cron)
        #[arg(required = true, value_parser = parse_assignment)]
        assignments: Vec<(String, ConfigValue)>,
        /// Only write these keys (defaults to the assigned keys)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
        /// Also write empty values
        #[arg(long)]
        declared: bool,
    },
    /// Update keys already present in the file; never adds new ones
    Sync {
        /// Assignments such as USER_NAME=user or LIVE_SERVICES=(ssh cron)
        #[arg(required = true, value_parser = parse_assignment)]
        assignments: Vec<(String, ConfigValue)>,
        /// Also write empty values
        #[arg(long)]
        declared: bool,
    },
    /// List the keys assigned in the file
    Keys,
}

/// Parse `KEY=VALUE`, decoding the value the same way the file is read
fn parse_assignment(arg: &str) -> std::result::Result<(String, ConfigValue), String> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", arg))?;

    if !config::is_valid_key(key) {
        return Err(format!("invalid key name {:?}", key));
    }

    Ok((key.to_string(), ConfigValue::decode(raw)))
}

fn save_mode(declared: bool) -> SaveMode {
    if declared {
        SaveMode::DeclaredOnly
    } else {
        SaveMode::NonEmptyOnly
    }
}

fn run(args: Args) -> Result<()> {
    let path = location::detect_config_path(args.file.as_deref()).unwrap_or_default();
    let store = ConfigStore::new(path);

    match args.command {
        Commands::Get { key } => {
            println!("{}", store.load_value(&key));
        }
        Commands::Load { keys, json } => {
            let entries = store.load(keys.as_slice())?;
            if json {
                let out = serde_json::to_string_pretty(&entries)
                    .context("Failed to serialize values")?;
                println!("{}", out);
            } else {
                for (key, value) in &entries {
                    println!("{}={}", key, value);
                }
            }
        }
        Commands::Set {
            assignments,
            only,
            declared,
        } => {
            let selector = if only.is_empty() {
                KeySelector::keys(assignments.iter().map(|(key, _)| key.clone()))
            } else {
                KeySelector::Keys(only)
            };
            let entries: Entries = assignments.into_iter().collect();

            store
                .save_with_mode(&entries, &selector, save_mode(declared))
                .with_context(|| format!("Failed to update {}", store.path().display()))?;
        }
        Commands::Sync {
            assignments,
            declared,
        } => {
            let entries: Entries = assignments.into_iter().collect();

            store
                .save_with_mode(&entries, &KeySelector::Existing, save_mode(declared))
                .with_context(|| format!("Failed to update {}", store.path().display()))?;
        }
        Commands::Keys => {
            for key in store.keys()? {
                println!("{}", key);
            }
        }
    }

    Ok(())
}

/// `--debug` wins over `RUST_LOG`, which wins over the default
fn log_directives(debug: bool, from_env: Option<String>) -> String {
    if debug {
        return "liveconf=debug,liveconf_config=debug,info".to_string();
    }
    from_env
        .filter(|directives| !directives.is_empty())
        .unwrap_or_else(|| "liveconf=info,liveconf_config=info,warn".to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for values
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_directives(
            args.debug,
            std::env::var("RUST_LOG").ok(),
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Fatal store errors were already logged where they happened
            let logged = e
                .downcast_ref::<ConfigError>()
                .map_or(false, ConfigError::is_fatal);
            if !logged {
                tracing::error!("{:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

//! Command-line interface for easy-env
//!
//! # Usage Examples
//!
//! ```bash
//! # Convert a local csv file to parquet
//! easy-env --root data convert sales.csv sales.parquet
//!
//! # Read a semicolon separated file and write compact json to remote storage
//! easy-env --config easy-env.toml convert raw/export.csv remote:clean/export.json \
//!   --load-option separator=';' --save-option pretty=false
//!
//! # Fetch a remote object
//! easy-env --remote-base s3://bucket/project/ download reports/q1.xlsx ./q1.xlsx
//!
//! # Show which formats this build supports
//! easy-env formats
//! ```
//!
//! ## Locations
//! - `path/to/file.ext` or `local:path/to/file.ext`: relative to `--root`
//! - `remote:path/to/file.ext`: appended to the remote base address

use anyhow::Context;
use clap::{Parser, Subcommand};
use easy_env::{CodecOptions, Environment, EnvironmentConfig, Payload};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "easy-env")]
#[command(about = "Load and save files of many formats on local disk or remote object storage")]
#[command(long_about = None)]
struct Cli {
    /// TOML file with `local_root` and a `[remote]` table
    #[arg(long, global = true, env = "EASY_ENV_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Root directory for local paths (overrides the config file)
    #[arg(long, global = true, env = "EASY_ENV_ROOT", value_name = "DIR")]
    root: Option<PathBuf>,

    /// Remote base address, e.g. s3://bucket/prefix/ (overrides the config file)
    #[arg(long, global = true, env = "EASY_ENV_REMOTE_BASE", value_name = "URL")]
    remote_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a file and save it again, picking both codecs by extension
    Convert {
        /// Source location
        from: String,

        /// Destination location
        to: String,

        /// Option for the loader (repeatable)
        #[arg(long = "load-option", value_name = "KEY=VALUE")]
        load_options: Vec<String>,

        /// Option for the saver (repeatable)
        #[arg(long = "save-option", value_name = "KEY=VALUE")]
        save_options: Vec<String>,
    },

    /// List the extensions this build can load and save
    Formats,

    /// List remote objects under a prefix
    List {
        #[arg(default_value = "")]
        prefix: String,
    },

    /// Copy a remote object to a local file
    Download { path: String, destination: PathBuf },

    /// Delete one file or object
    Delete { location: String },

    /// Delete the files directly inside a local directory
    ClearFolder { dir: String },
}

/// Where a command-line path points
#[derive(Debug, PartialEq, Eq)]
enum Location<'a> {
    Local(&'a str),
    Remote(&'a str),
}

impl<'a> Location<'a> {
    fn parse(location: &'a str) -> Self {
        if let Some(path) = location.strip_prefix("remote:") {
            Location::Remote(path)
        } else {
            Location::Local(location.strip_prefix("local:").unwrap_or(location))
        }
    }
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EnvironmentConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {path:?}"))?,
        None => EnvironmentConfig::default(),
    };
    if let Some(root) = cli.root {
        config.local_root = root;
    }
    if let Some(base) = cli.remote_base {
        config.remote.get_or_insert_with(Default::default).base_address = base;
    }

    let environment =
        Environment::from_config(&config).context("Failed to set up storage backends")?;

    match cli.command {
        Commands::Convert {
            from,
            to,
            load_options,
            save_options,
        } => {
            let load_options = parse_options(&load_options)?;
            let save_options = parse_options(&save_options)?;

            let payload = load(&environment, &from, &load_options)
                .with_context(|| format!("Failed to load {from}"))?;
            save(&environment, &payload, &to, &save_options)
                .with_context(|| format!("Failed to save {to}"))?;

            tracing::info!("Converted {} to {}", from, to);
        }
        Commands::Formats => {
            let registry = environment.local().registry();
            for extension in registry.extensions() {
                let load = registry
                    .resolve_loader(extension)
                    .map(|loader| loader.mode().to_string());
                let save = registry
                    .resolve_saver(extension)
                    .map(|saver| saver.mode().to_string());
                match (load, save) {
                    (Ok(load), Ok(save)) => println!("{extension:<8} load:{load} save:{save}"),
                    (Ok(load), Err(_)) => println!("{extension:<8} load:{load} save:-"),
                    (Err(_), Ok(save)) => println!("{extension:<8} load:- save:{save}"),
                    (Err(e), Err(_)) => println!("{extension:<8} unavailable: {e}"),
                }
            }
        }
        Commands::List { prefix } => {
            for key in environment.remote()?.list_files(&prefix)? {
                println!("{key}");
            }
        }
        Commands::Download { path, destination } => {
            environment
                .remote()?
                .download(&path, &destination)
                .with_context(|| format!("Failed to download {path}"))?;
        }
        Commands::Delete { location } => match Location::parse(&location) {
            Location::Local(path) => environment.local().delete(path)?,
            Location::Remote(path) => environment.remote()?.delete(path)?,
        },
        Commands::ClearFolder { dir } => {
            let removed = environment.local().clear_folder(&dir)?;
            println!("Removed {removed} files");
        }
    }

    Ok(())
}

fn parse_options(pairs: &[String]) -> anyhow::Result<CodecOptions> {
    let options = pairs
        .iter()
        .map(|pair| CodecOptions::parse_pair(pair))
        .collect::<Result<CodecOptions, _>>()?;
    Ok(options)
}

fn load(
    environment: &Environment,
    location: &str,
    options: &CodecOptions,
) -> easy_env::Result<Payload> {
    match Location::parse(location) {
        Location::Local(path) => environment.local().load_with(path, options),
        Location::Remote(path) => environment.remote()?.load_with(path, options),
    }
}

fn save(
    environment: &Environment,
    payload: &Payload,
    location: &str,
    options: &CodecOptions,
) -> easy_env::Result<()> {
    match Location::parse(location) {
        Location::Local(path) => environment.local().save_with(payload, path, options),
        Location::Remote(path) => environment.remote()?.save_with(payload, path, options),
    }
}

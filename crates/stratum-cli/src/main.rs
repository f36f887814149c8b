use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use stratum::{Catalog, NewRequest, parse_key_value, parse_value};

#[derive(Parser, Debug)]
#[command(
    name = "stratum",
    about = "stratum: build, inspect and decode registry-defined errors",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the registry from a catalog and list its definitions
    Check {
        /// Catalog file (TOML, or JSON with a .json extension)
        catalog: PathBuf,
    },

    /// Create an error and print its serialized form
    New(NewArgs),

    /// Reconstruct a serialized error through the registry
    Decode {
        catalog: PathBuf,

        /// JSON payload, or '-' to read from stdin
        payload: String,

        /// Metadata key to restore as safe metadata (repeatable)
        #[arg(long = "safe-field", value_name = "KEY", action = clap::ArgAction::Append)]
        safe_fields: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct NewArgs {
    catalog: PathBuf,

    /// High level error name, e.g. AUTH_ERROR
    high_level: String,

    /// Low level error name; without it a bare error is created
    #[arg(long = "low", value_name = "NAME")]
    low_level: Option<String>,

    /// Message for a bare error
    #[arg(long)]
    message: Option<String>,

    /// Message format argument (repeatable, parsed as JSON when possible)
    #[arg(long = "arg", value_name = "VALUE", action = clap::ArgAction::Append)]
    args: Vec<String>,

    /// Unsafe metadata entry (repeatable)
    #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    meta: Vec<(String, Value)>,

    /// Safe metadata entry (repeatable)
    #[arg(long = "safe-meta", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    safe_meta: Vec<(String, Value)>,

    /// Print the client-safe view
    #[arg(long, default_value_t = false)]
    safe: bool,

    /// Assign a random error id
    #[arg(long = "error-id", default_value_t = false)]
    error_id: bool,
}

pub fn run(args: Cli) -> Result<()> {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    match args.command {
        Command::Check { catalog } => {
            let registry = Catalog::from_path(&catalog)?.build_registry()?;
            print!("{}", stratum::check(&registry)?);
            tracing::info!(
                catalog = %catalog.display(),
                high_level = registry.high_level_names().count(),
                low_level = registry.low_level_names().count(),
                "catalog checked"
            );
        }
        Command::New(new_args) => {
            let registry = Catalog::from_path(&new_args.catalog)?.build_registry()?;
            let request = NewRequest {
                high_level: new_args.high_level,
                low_level: new_args.low_level,
                message: new_args.message,
                args: new_args.args.iter().map(|raw| parse_value(raw)).collect(),
                metadata: new_args.meta,
                safe_metadata: new_args.safe_meta,
                safe: new_args.safe,
                error_id: new_args.error_id,
            };
            let data = stratum::new_error(&registry, &request)?;
            println!("{}", serde_json::to_string_pretty(&data)?);
            tracing::info!(
                high_level = %request.high_level,
                low_level = request.low_level.as_deref().unwrap_or("<bare>"),
                safe = request.safe,
                "error created"
            );
        }
        Command::Decode {
            catalog,
            payload,
            safe_fields,
        } => {
            let registry = Catalog::from_path(&catalog)?.build_registry()?;
            let payload = if payload == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read payload from stdin")?;
                buf
            } else {
                payload
            };
            let report = stratum::decode(&registry, &payload, &safe_fields)?;
            print!("{}", report.render()?);
            tracing::info!(
                type_name = report.error.name(),
                high_level = report.high_level.as_deref().unwrap_or("<unregistered>"),
                "payload decoded"
            );
        }
    }

    Ok(())
}

pub fn main() -> Result<()> {
    let args = Cli::parse();
    run(args)
}

//! knxctl - KNX binding configuration tool for VoltageEMS
//!
//! Parses KNX binding lines, validates whole items files and shows what the
//! bus side will poll or treat as command addresses.

mod config;
mod report;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use voltage_knx::{BindingProvider, GroupAddress, Item, ItemKind};

use crate::config::{load_items_file, load_settings, OutputFormat};
use crate::report::AddressInfo;

#[derive(Parser)]
#[command(name = "knxctl")]
#[command(about = "KNX binding configuration tool for VoltageEMS")]
#[command(long_about = "KNX binding configuration tool for VoltageEMS

Commands:
  parse       Parse a single binding line for an item kind
  check       Validate every item of an items file
  readable    List readable datapoints and their poll intervals
  lookup      Show how a group address is used

Examples:
  knxctl parse --kind switch \"<1/1/10+0/1/13\"
  knxctl check config/knx/items.yaml
  knxctl readable config/knx/items.yaml --format json
  knxctl lookup config/knx/items.yaml 1/1/10")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Output format (overrides the settings file)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// knxctl settings file (yaml/toml/json)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a single binding line
    Parse {
        /// Item kind: switch, dimmer, rollershutter, number, contact, string, datetime, color
        #[arg(short, long)]
        kind: ItemKind,

        /// Item name used in messages
        #[arg(short, long, default_value = "Item")]
        name: String,

        /// Binding line, e.g. "<(30)1.001:1/1/10+0/1/13"
        line: String,
    },

    /// Validate every item of an items file
    Check {
        /// Items file (yaml/toml/json)
        file: PathBuf,
    },

    /// List readable datapoints and their poll intervals
    Readable {
        /// Items file (yaml/toml/json)
        file: PathBuf,
    },

    /// Show how a group address is used
    Lookup {
        /// Items file (yaml/toml/json)
        file: PathBuf,

        /// Group address, e.g. 1/1/10
        address: String,
    },
}

/// Register every item of `path`; rejected items are logged and reported
fn load_provider(path: &Path) -> Result<(BindingProvider, voltage_knx::LoadReport)> {
    let items_file = load_items_file(path)?;
    let items: Vec<(Item, &str)> = items_file
        .items
        .iter()
        .map(|entry| (Item::new(&entry.name, entry.kind), entry.knx.as_str()))
        .collect();

    let provider = BindingProvider::default();
    let context = path.display().to_string();
    let report = provider.load_items(&context, items.iter().map(|(item, line)| (item, *line)));
    Ok((provider, report))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    // Configure colored output
    if cli.no_color || !settings.color {
        colored::control::set_override(false);
    }
    let format = cli.format.unwrap_or(settings.format);

    // Initialize logging (stderr keeps JSON output clean)
    let log_level = if cli.verbose {
        "debug"
    } else {
        settings.log_level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Parse { kind, name, line } => {
            let provider = BindingProvider::default();
            let item = Item::new(name, kind);
            let binding = provider
                .parser()
                .parse(&item, &line)
                .with_context(|| format!("Invalid binding for item '{}'", item.name))?;
            report::print_binding(&binding, format)?;
        },
        Commands::Check { file } => {
            let (_, load_report) = load_provider(&file)?;
            report::print_check(&load_report, format)?;
            if !load_report.is_ok() {
                bail!(
                    "{} item(s) in {} have invalid KNX bindings",
                    load_report.failed.len(),
                    file.display()
                );
            }
            info!("All items in {} are valid", file.display());
        },
        Commands::Readable { file } => {
            let (provider, _) = load_provider(&file)?;
            report::print_readable(&provider.readable_datapoints(), format)?;
        },
        Commands::Lookup { file, address } => {
            let address: GroupAddress = address.parse()?;
            let (provider, _) = load_provider(&file)?;
            let info = AddressInfo {
                address,
                command: provider.is_command_address(address),
                start_stop: provider.is_start_stop_address(address),
                auto_refresh: provider.auto_refresh(address),
                listening_items: provider.listening_item_names(address),
            };
            report::print_address(&info, format)?;
        },
    }

    Ok(())
}

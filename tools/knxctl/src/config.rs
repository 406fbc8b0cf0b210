//! Tool settings and items files
//!
//! Settings priority (highest to lowest):
//! 1. Command-line flags (applied in main)
//! 2. Environment variables prefixed with `KNXCTL_`
//! 3. Settings file given with `--config`
//! 4. Default values

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use voltage_knx::ItemKind;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// tracing filter directive, e.g. "info" or "voltage_knx=debug"
    pub log_level: String,
    pub format: OutputFormat,
    pub color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            format: OutputFormat::Text,
            color: true,
        }
    }
}

/// Merge a YAML/TOML/JSON file into `figment`, picking the format by extension
fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    if !path.exists() {
        bail!("Configuration file not found: {}", path.display());
    }
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .context("Config file must have an extension")?;

    let figment = match extension {
        "toml" => figment.merge(Toml::file(path)),
        "yaml" | "yml" => figment.merge(Yaml::file(path)),
        "json" => figment.merge(Json::file(path)),
        _ => bail!("Unsupported config file format: {}", extension),
    };
    Ok(figment)
}

pub fn load_settings(config_file: Option<&Path>) -> Result<Settings> {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));
    if let Some(path) = config_file {
        figment = merge_file(figment, path)?;
    }

    figment
        .merge(Env::prefixed("KNXCTL_"))
        .extract()
        .context("Failed to load knxctl settings")
}

/// One item with its KNX binding line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEntry {
    pub name: String,
    pub kind: ItemKind,
    pub knx: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsFile {
    #[serde(default)]
    pub items: Vec<ItemEntry>,
}

pub fn load_items_file(path: &Path) -> Result<ItemsFile> {
    let items: ItemsFile = merge_file(Figment::new(), path)?
        .extract()
        .with_context(|| format!("Failed to load items from {}", path.display()))?;

    debug!(
        "Loaded {} item definition(s) from {}",
        items.items.len(),
        path.display()
    );
    Ok(items)
}

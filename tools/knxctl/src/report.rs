//! Output rendering for knxctl commands

use anyhow::Result;
use colored::*;
use serde::Serialize;
use voltage_knx::{AutoRefresh, GroupAddress, ItemBinding, LoadReport, ReadableDatapoint};

use crate::config::OutputFormat;

/// Everything known about one group address
#[derive(Debug, Clone, Serialize)]
pub struct AddressInfo {
    pub address: GroupAddress,
    pub command: bool,
    pub start_stop: bool,
    pub auto_refresh: AutoRefresh,
    pub listening_items: Vec<String>,
}

#[derive(Serialize)]
struct CheckSummary<'a> {
    loaded: &'a [String],
    failed: Vec<FailureLine<'a>>,
}

#[derive(Serialize)]
struct FailureLine<'a> {
    item: &'a str,
    error: String,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn refresh_label(refresh: AutoRefresh) -> String {
    match refresh {
        AutoRefresh::Disabled => "event driven".to_string(),
        AutoRefresh::Interval(secs) => format!("every {}s", secs),
    }
}

pub fn print_binding(binding: &ItemBinding, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(binding);
    }

    println!(
        "{} {} ({} datapoint(s))",
        "Item:".bold(),
        binding.item_name().cyan(),
        binding.len()
    );
    for (idx, group) in binding.groups().iter().enumerate() {
        println!("  {} {}", format!("[{}]", idx).dimmed(), group.main_address());
        for endpoint in group.endpoints() {
            let mut flags = Vec::new();
            if group.readable_address() == Some(endpoint.address) {
                flags.push(format!("readable, {}", refresh_label(group.auto_refresh())));
            }
            if endpoint.alt_behavior {
                flags.push("start-stop".to_string());
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };
            println!(
                "      {:<10} {:<8} {:<8}{}",
                endpoint.address.to_string(),
                endpoint.type_id,
                endpoint.role.to_string().green(),
                flags.yellow()
            );
        }
    }
    match binding.auto_update_suppressed() {
        Some(true) => println!("  auto-update: {}", "suppressed".yellow()),
        Some(false) => println!("  auto-update: enabled"),
        None => println!("  auto-update: undetermined"),
    }
    println!("  canonical:   {}", binding.to_string().dimmed());
    Ok(())
}

pub fn print_check(report: &LoadReport, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let failed = report
            .failed
            .iter()
            .map(|f| FailureLine {
                item: &f.item_name,
                error: f.error.to_string(),
            })
            .collect();
        return print_json(&CheckSummary {
            loaded: &report.loaded,
            failed,
        });
    }

    for name in &report.loaded {
        println!("{} {}", "[OK]".green(), name);
    }
    for failure in &report.failed {
        println!(
            "{} {}: {}",
            "[FAIL]".red(),
            failure.item_name,
            failure.error
        );
    }
    println!(
        "\n{} loaded, {} rejected",
        report.loaded.len().to_string().green(),
        report.failed.len().to_string().red()
    );
    Ok(())
}

pub fn print_readable(datapoints: &[ReadableDatapoint], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(datapoints);
    }

    if datapoints.is_empty() {
        println!("No readable datapoints configured");
        return Ok(());
    }
    println!(
        "{}",
        format!("{:<10} {:<8} {:<14} {}", "ADDRESS", "DPT", "REFRESH", "ITEM").bold()
    );
    for dp in datapoints {
        println!(
            "{:<10} {:<8} {:<14} {}",
            dp.endpoint.address.to_string(),
            dp.endpoint.type_id,
            refresh_label(dp.auto_refresh),
            dp.item_name.cyan()
        );
    }
    Ok(())
}

pub fn print_address(info: &AddressInfo, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(info);
    }

    println!("{} {}", "Address:".bold(), info.address);
    println!("  command address: {}", info.command);
    println!("  start-stop:      {}", info.start_stop);
    println!("  auto refresh:    {}", refresh_label(info.auto_refresh));
    if info.listening_items.is_empty() {
        println!("  listening items: {}", "none".dimmed());
    } else {
        println!("  listening items: {}", info.listening_items.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_label() {
        assert_eq!(refresh_label(AutoRefresh::Disabled), "event driven");
        assert_eq!(refresh_label(AutoRefresh::from_secs(30)), "every 30s");
    }
}

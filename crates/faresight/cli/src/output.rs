//! Output formatting utilities

use colored::*;
use faresight_types::{StatusLevel, StatusMessage};
use serde::Serialize;
use tabled::{Table, Tabled};
use tokio::sync::broadcast;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a vector of items in the specified format
pub fn print_output<T: Serialize + Tabled>(data: Vec<T>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }
    Ok(())
}

/// Print a single item in the specified format
pub fn print_single<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Print a status message the way a toast would show it
pub fn print_status(message: &StatusMessage) {
    match message.level {
        StatusLevel::Loading => println!("{} {}", "…".cyan(), message.text),
        StatusLevel::Success => print_success(&message.text),
        StatusLevel::Error => print_error(&message.text),
    }
}

/// Print every status message received so far.
///
/// Table output only; JSON output stays machine readable.
pub fn drain_status(rx: &mut broadcast::Receiver<StatusMessage>, format: OutputFormat) {
    loop {
        match rx.try_recv() {
            Ok(message) => {
                if matches!(format, OutputFormat::Table) {
                    print_status(&message);
                }
            }
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Status messages dropped");
            }
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        let format = OutputFormat::default();
        assert!(matches!(format, OutputFormat::Table));
    }

    #[test]
    fn test_drain_empties_receiver() {
        let (tx, mut rx) = broadcast::channel(4);
        tx.send(StatusMessage::success("sync", "All sources synced successfully"))
            .unwrap();
        drain_status(&mut rx, OutputFormat::Json);
        assert!(rx.try_recv().is_err());
    }
}

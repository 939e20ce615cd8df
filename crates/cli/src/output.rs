//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use auxsync_drivers::Outcome;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// JSON format
    #[default]
    Json,
    /// Human-readable table format
    Table,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

impl TableDisplay for Outcome {
    fn headers() -> Vec<&'static str> {
        vec!["Changed", "Failed", "Message"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.changed.to_string(),
            self.failed.to_string(),
            self.message.clone(),
        ]
    }
}

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Render a single item
pub fn render_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = table();
            table.set_header(T::headers());
            table.add_row(item.row());
            table.to_string()
        }
        OutputFormat::Json => json(item),
        OutputFormat::Plain => T::headers()
            .iter()
            .zip(item.row())
            .map(|(header, value)| format!("{}: {}", header, value))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Render a list of items
pub fn render_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = table();
            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }
            table.to_string()
        }
        OutputFormat::Json => json(items),
        OutputFormat::Plain => items
            .iter()
            .map(|item| item.row().join("\t"))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    println!("{}", render_list(items, format));
}

/// Print an invocation result. Plain output gets a status marker.
pub fn print_outcome(outcome: &Outcome, format: OutputFormat) {
    match format {
        OutputFormat::Plain => {
            let marker = if outcome.failed {
                "failed".red()
            } else if outcome.changed {
                "changed".yellow()
            } else {
                "ok".green()
            };
            println!("{}: {}", marker, outcome.message);
        }
        _ => println!("{}", render_item(outcome, format)),
    }
}

/// Print warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_json_shape() {
        let rendered = render_item(&Outcome::changed("Supplier has been updated"), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["changed"], true);
        assert_eq!(value["failed"], false);
        assert_eq!(value["message"], "Supplier has been updated");
    }

    #[test]
    fn test_outcome_plain() {
        let rendered = render_item(&Outcome::unchanged("Customer is up to date"), OutputFormat::Plain);
        assert_eq!(
            rendered,
            "Changed: false\nFailed: false\nMessage: Customer is up to date"
        );
    }

    #[test]
    fn test_outcome_table_has_headers() {
        let rendered = render_item(&Outcome::failed("No current logged in user"), OutputFormat::Table);
        assert!(rendered.contains("Changed"));
        assert!(rendered.contains("No current logged in user"));
    }
}

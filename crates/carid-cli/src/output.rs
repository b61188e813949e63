//! Output formatting for carid (table, json, csv)

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet && !self.is_json() {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet && !self.is_json() {
            println!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print data in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    let table = Table::new(data).to_string();
                    println!("{}", table);
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Csv => {
                print_csv(data);
            }
        }
    }

    /// Print any serializable value as pretty JSON
    pub fn print_json<T: Serialize>(&self, value: &T) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
        );
    }

    /// Print key-value pairs, or `full` as a JSON document
    pub fn print_kv<T: Serialize>(&self, pairs: &[(&str, String)], full: &T) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => self.print_json(full),
            OutputFormat::Csv => {
                let keys: Vec<String> = pairs.iter().map(|(k, _)| escape_csv(k)).collect();
                println!("{}", keys.join(","));
                let values: Vec<String> = pairs.iter().map(|(_, v)| escape_csv(v)).collect();
                println!("{}", values.join(","));
            }
        }
    }
}

/// Print data as CSV
fn print_csv<T: Serialize>(data: &[T]) {
    let Some(first) = data.first() else {
        return;
    };

    // Get field names from the first item
    let first = serde_json::to_value(first).unwrap_or_default();
    if let serde_json::Value::Object(map) = &first {
        let headers: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
        println!("{}", headers.join(","));

        for item in data {
            if let Ok(serde_json::Value::Object(row)) = serde_json::to_value(item) {
                let values: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        row.get(*h)
                            .map(|v| match v {
                                serde_json::Value::String(s) => escape_csv(s),
                                other => escape_csv(&other.to_string()),
                            })
                            .unwrap_or_default()
                    })
                    .collect();
                println!("{}", values.join(","));
            }
        }
    }
}

/// Escape a value for CSV output
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Variant display for list command
#[derive(Debug, Tabled, Serialize)]
pub struct VariantRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Addressing")]
    pub addressing: String,
    #[tabled(rename = "Mass (kg)")]
    pub mass: f64,
    #[tabled(rename = "Wheelbase (m)")]
    pub wheelbase: f64,
    #[tabled(rename = "Steer Ratio")]
    pub steer_ratio: f64,
    #[tabled(rename = "Firmware")]
    pub firmware: usize,
}

/// Dialect display for dialect command
#[derive(Debug, Tabled, Serialize)]
pub struct DialectRow {
    #[tabled(rename = "Role")]
    pub role: String,
    #[tabled(rename = "Dialect")]
    pub dialect: String,
}

/// Documentation display for docs command
#[derive(Debug, Tabled, Serialize)]
pub struct DocRow {
    #[tabled(rename = "Variant")]
    pub variant: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Package")]
    pub package: String,
    #[tabled(rename = "Harness")]
    pub harness: String,
    #[tabled(rename = "Notes")]
    pub notes: String,
}

/// Probe log display for identify command
#[derive(Debug, Tabled, Serialize)]
pub struct ObservationRow {
    #[tabled(rename = "Probe")]
    pub probe: String,
    #[tabled(rename = "Outcome")]
    pub outcome: String,
    #[tabled(rename = "Signature")]
    pub signature: String,
    #[tabled(rename = "Remaining")]
    pub remaining: usize,
}

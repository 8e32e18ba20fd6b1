use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled};

use graph_shaper::api::{FormValue, ResponseBody};

use super::OutputFormat;

/// Print rows in the specified format
pub fn print_output<T: Serialize + Tabled>(data: &[T], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).context("Failed to serialize output")?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            let table = Table::new(data).to_string();
            println!("{}", table);
        }
        OutputFormat::Plain => {
            let json = serde_json::to_value(data).context("Failed to serialize output")?;
            if let Some(arr) = json.as_array() {
                for item in arr {
                    if let Some(obj) = item.as_object() {
                        let values: Vec<String> = obj.values().map(plain_value).collect();
                        println!("{}", values.join("|"));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Print a single JSON document
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    let json = match format {
        OutputFormat::Plain => serde_json::to_string(data),
        OutputFormat::Json | OutputFormat::Table => serde_json::to_string_pretty(data),
    }
    .context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

#[derive(Debug, Serialize, Tabled)]
struct FormRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Print a decoded response body
pub fn print_body(body: &ResponseBody, format: OutputFormat) -> Result<()> {
    match body {
        ResponseBody::Json(value) => print_single(value, format),
        ResponseBody::Text(text) => {
            println!("{}", text);
            Ok(())
        }
        ResponseBody::FormData(form) => {
            let rows: Vec<FormRow> = form
                .iter()
                .map(|(name, value)| FormRow {
                    name: name.to_string(),
                    value: match value {
                        FormValue::Text(text) => text.clone(),
                        FormValue::File {
                            filename,
                            content_type,
                            data,
                        } => format!(
                            "<file {} ({}, {} bytes)>",
                            filename.as_deref().unwrap_or("-"),
                            content_type.as_deref().unwrap_or("unknown type"),
                            data.len()
                        ),
                    },
                })
                .collect();
            print_output(&rows, format)
        }
        ResponseBody::Blob(blob) => {
            print_info(&format!(
                "{} bytes ({})",
                blob.len(),
                blob.content_type().unwrap_or("unknown type")
            ));
            Ok(())
        }
        ResponseBody::ArrayBuffer(_) | ResponseBody::Bytes(_) => {
            let len = body.as_bytes().map_or(0, <[u8]>::len);
            print_info(&format!("{} bytes", len));
            Ok(())
        }
    }
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "".to_string(),
        other => other.to_string(),
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

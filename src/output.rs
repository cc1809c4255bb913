//! Rendering of status records

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;

use kubestatus_core::StatusRecord;

/// How records are written to stdout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One aligned line per resource
    #[default]
    Text,
    /// One JSON object per resource and line
    Json,
}

/// Render records in the requested format
pub fn render(records: &[StatusRecord], format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            for record in records {
                out.push_str(&serde_json::to_string(record)?);
                out.push('\n');
            }
        }
        OutputFormat::Text => {
            let width = records.iter().map(|r| r.name.len()).max().unwrap_or(0);
            for record in records {
                let marker = if record.available { "" } else { " (unavailable)" };
                out.push_str(&format!(
                    "{:<width$}  {}{}\n",
                    record.name,
                    record.state,
                    marker,
                    width = width
                ));
            }
        }
    }
    Ok(out)
}

/// Write records to stdout
pub fn emit(records: &[StatusRecord], format: OutputFormat) -> Result<()> {
    let rendered = render(records, format)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

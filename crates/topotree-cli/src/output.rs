//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: an aligned table for humans, tab-separated text for pipes and
//! spreadsheets, or stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / hidden `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. `[output].format` in the config file
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::Path;

use anyhow::Context as _;
use clap::ValueEnum;
use serde::Serialize;
use topotree_core::{BasicRow, ResultRow, RootRank, TopologyError};

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write, width: usize) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "")
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Aligned table with a header and rule.
    Pretty,
    /// Tab-separated rows with a header row.
    Text,
    /// Machine-readable JSON array.
    Json,
}

impl OutputMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some(Self::Pretty),
            "text" | "tsv" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    config_format: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    // Unknown values fall through to the next source.
    if let Some(mode) = format_env.and_then(OutputMode::parse) {
        return mode;
    }

    if let Some(mode) = config_format.and_then(OutputMode::parse) {
        return mode;
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from CLI flags, environment, config, and TTY defaults.
pub fn resolve_output_mode(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    config_format: Option<&str>,
) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(
        format_flag,
        json_flag,
        env_val.as_deref(),
        config_format,
        is_tty,
    )
}

/// Open the report destination: a file when `path` is set, stdout otherwise.
pub fn open_sink(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output file {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tabular rows
// ────────────────────────────────────────────────────────────────────────────

/// A report row that can be laid out as a table.
pub trait TableRow: Serialize {
    /// Column headers, in the same order as [`TableRow::cells`].
    fn columns() -> &'static [&'static str];

    /// Cell values; absent values render as an empty cell.
    fn cells(&self) -> Vec<String>;
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl TableRow for ResultRow {
    fn columns() -> &'static [&'static str] {
        &Self::COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.device_id.to_string(),
            cell(self.device_name.as_deref()),
            cell(self.connected_to),
            cell(self.device_type.as_deref()),
            self.function.to_string(),
            self.phase.to_string(),
            cell(self.model.as_deref()),
            cell(self.vendor.as_deref()),
            cell(self.ip.as_deref()),
            cell(self.mac.as_deref()),
        ]
    }
}

impl TableRow for BasicRow {
    fn columns() -> &'static [&'static str] {
        &Self::COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.device_id.to_string(),
            cell(self.device_name.as_deref()),
            cell(self.connected_to),
            cell(self.device_type.as_deref()),
            cell(self.model.as_deref()),
            cell(self.vendor.as_deref()),
            cell(self.ip.as_deref()),
            cell(self.mac.as_deref()),
        ]
    }
}

impl TableRow for RootRank {
    fn columns() -> &'static [&'static str] {
        &["Root", "Depth", "Size", "Rank", "Phase"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.root.to_string(),
            self.depth.to_string(),
            self.size.to_string(),
            self.rank.to_string(),
            self.phase.to_string(),
        ]
    }
}

/// Write `rows` in the requested mode.
///
/// - JSON: a single array of objects keyed by column name.
/// - Text: tab-separated with a header row (header only when `rows` is non-empty).
/// - Pretty: columns padded to their widest cell, header, then a rule.
pub fn write_rows<R: TableRow>(w: &mut dyn Write, mode: OutputMode, rows: &[R]) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *w, rows)?;
            writeln!(w)?;
        }
        OutputMode::Text => {
            if !rows.is_empty() {
                writeln!(w, "{}", R::columns().join("\t"))?;
            }
            for row in rows {
                writeln!(w, "{}", row.cells().join("\t"))?;
            }
        }
        OutputMode::Pretty => write_pretty_table(w, R::columns(), rows)?,
    }
    Ok(())
}

fn write_pretty_table<R: TableRow>(
    w: &mut dyn Write,
    columns: &[&str],
    rows: &[R],
) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(w, "(no devices)");
    }

    let cells: Vec<Vec<String>> = rows.iter().map(TableRow::cells).collect();
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    write_padded(w, columns, &widths)?;
    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    pretty_rule(w, total)?;
    for row in &cells {
        let values: Vec<&str> = row.iter().map(String::as_str).collect();
        write_padded(w, &values, &widths)?;
    }
    Ok(())
}

fn write_padded(w: &mut dyn Write, values: &[&str], widths: &[usize]) -> io::Result<()> {
    let padded: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(value, &width)| format!("{value:<width$}"))
        .collect();
    writeln!(w, "{}", padded.join("  ").trim_end())
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E2001").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create a simple error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }
}

impl From<&TopologyError> for CliError {
    fn from(err: &TopologyError) -> Self {
        let code = err.code();
        Self {
            message: err.to_string(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }
}

/// Render an error in the requested format.
pub fn write_error(w: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *w, &wrapper)?;
            writeln!(w)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match error.error_code {
                Some(ref code) => writeln!(w, "error[{code}]: {}", error.message)?,
                None => writeln!(w, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(w, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(&mut out, mode, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use topotree_core::DeviceId;

    fn row(id: u64, parent: Option<u64>, function: u32, phase: u32) -> ResultRow {
        ResultRow {
            device_id: DeviceId(id),
            device_name: Some(format!("dev-{id}")),
            connected_to: parent.map(DeviceId),
            device_type: Some("Switch".to_string()),
            function,
            phase,
            model: None,
            vendor: Some("Acme".to_string()),
            ip: None,
            mac: None,
        }
    }

    fn render_to_string<R: TableRow>(mode: OutputMode, rows: &[R]) -> String {
        let mut buf = Vec::new();
        write_rows(&mut buf, mode, rows).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    // ── resolve_output_mode_inner ───────────────────────────────────────────

    #[test]
    fn resolve_format_flag_wins_over_everything() {
        let mode = resolve_output_mode_inner(Some(OutputMode::Text), true, Some("pretty"), Some("json"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn resolve_json_flag_wins_over_env() {
        let mode = resolve_output_mode_inner(None, true, Some("pretty"), None, true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn resolve_env_wins_over_config() {
        let mode = resolve_output_mode_inner(None, false, Some("TEXT"), Some("json"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn resolve_config_wins_over_tty() {
        let mode = resolve_output_mode_inner(None, false, None, Some("json"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn resolve_unknown_values_fall_through_to_tty() {
        let tty = resolve_output_mode_inner(None, false, Some("fancy"), Some("xlsx"), true);
        assert_eq!(tty, OutputMode::Pretty);
        let pipe = resolve_output_mode_inner(None, false, Some("fancy"), None, false);
        assert_eq!(pipe, OutputMode::Text);
    }

    // ── write_rows ──────────────────────────────────────────────────────────

    #[test]
    fn text_mode_is_tab_separated_with_header() {
        let out = render_to_string(OutputMode::Text, &[row(1, None, 0, 1), row(2, Some(1), 1, 1)]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], ResultRow::COLUMNS.join("\t"));
        assert_eq!(lines[1], "1\tdev-1\t\tSwitch\t0\t1\t\tAcme\t\t");
        assert_eq!(lines[2], "2\tdev-2\t1\tSwitch\t1\t1\t\tAcme\t\t");
    }

    #[test]
    fn text_mode_empty_prints_nothing() {
        let out = render_to_string::<ResultRow>(OutputMode::Text, &[]);
        assert!(out.is_empty());
    }

    #[test]
    fn json_mode_uses_column_names() {
        let out = render_to_string(OutputMode::Json, &[row(4, Some(3), 2, 1)]);
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json");
        let first = &parsed[0];
        assert_eq!(first["Device ID"], 4);
        assert_eq!(first["Connected to Device ID"], 3);
        assert_eq!(first["Function"], 2);
        assert_eq!(first["Phase"], 1);
        assert!(first["Model"].is_null());
    }

    #[test]
    fn pretty_mode_aligns_columns() {
        let out = render_to_string(OutputMode::Pretty, &[row(1, None, 0, 1), row(100, Some(1), 1, 1)]);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("Device ID  Device Name"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].starts_with("1          dev-1"));
        assert!(lines[3].starts_with("100        dev-100"));
    }

    #[test]
    fn pretty_mode_empty_says_so() {
        let out = render_to_string::<BasicRow>(OutputMode::Pretty, &[]);
        assert_eq!(out, "(no devices)\n");
    }

    // ── errors ──────────────────────────────────────────────────────────────

    #[test]
    fn cli_error_from_topology_error() {
        let err = TopologyError::CycleDetected {
            members: vec![DeviceId(1), DeviceId(2)],
        };
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E2001"));
        assert!(cli.suggestion.is_some());
        assert!(cli.message.contains("[1, 2]"));
    }

    #[test]
    fn error_json_is_wrapped() {
        let mut buf = Vec::new();
        write_error(&mut buf, OutputMode::Json, &CliError::new("boom")).expect("write");
        let parsed: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(parsed["error"]["message"], "boom");
        assert!(parsed["error"].get("error_code").is_none());
    }

    #[test]
    fn error_human_includes_code_and_suggestion() {
        let err = TopologyError::MultipleParents {
            device: DeviceId(3),
            parents: vec![DeviceId(1), DeviceId(2)],
        };
        let mut buf = Vec::new();
        write_error(&mut buf, OutputMode::Pretty, &CliError::from(&err)).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("error[E2002]: device 3"));
        assert!(text.contains("suggestion:"));
    }
}

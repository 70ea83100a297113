//! Output formatting for path, tour and matrix results.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::json;

use starroute_lib::output::to_json;
use starroute_lib::{
    render_path, render_tour, DistanceMatrix, Location, MatrixCell, PathResult, RenderMode,
    TourOutcome,
};

/// Printed when the optimizer could not produce a tour.
pub const NO_SOLUTION_NOTICE: &str = "No feasible tour found.\n";

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    pub fn render_mode(names_only: bool) -> RenderMode {
        if names_only {
            RenderMode::NamesOnly
        } else {
            RenderMode::PlainText
        }
    }
}

/// Format a point-to-point result.
pub fn format_path(result: &PathResult, format: OutputFormat, names_only: bool) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_path(result, OutputFormat::render_mode(names_only))),
        OutputFormat::Json => to_json_line(result),
    }
}

/// Format the completion of a tour request.
pub fn format_tour(outcome: &TourOutcome, format: OutputFormat, names_only: bool) -> Result<String> {
    match (format, outcome) {
        (OutputFormat::Json, _) => to_json_line(outcome),
        (OutputFormat::Text, TourOutcome::NoSolution) => Ok(NO_SOLUTION_NOTICE.to_string()),
        (OutputFormat::Text, TourOutcome::Completed(result)) => {
            Ok(render_tour(result, OutputFormat::render_mode(names_only)))
        }
        (OutputFormat::Text, TourOutcome::Empty) => Ok(render_tour(
            &Default::default(),
            OutputFormat::render_mode(names_only),
        )),
    }
}

/// Format a distance matrix together with the locations indexing it.
pub fn format_matrix(
    stops: &[Arc<Location>],
    matrix: &DistanceMatrix,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let names: Vec<&str> = stops.iter().map(|stop| stop.name.as_str()).collect();
            to_json_line(&json!({ "locations": names, "matrix": matrix }))
        }
        OutputFormat::Text => Ok(render_matrix(stops, matrix)),
    }
}

/// Plain-text grid: one row per location, `-` for unreachable pairs.
pub fn render_matrix(stops: &[Arc<Location>], matrix: &DistanceMatrix) -> String {
    let mut out = String::new();
    if matrix.is_empty() {
        out.push_str("No destinations selected.\n");
        return out;
    }

    let name_width = stops
        .iter()
        .map(|stop| stop.name.chars().count())
        .max()
        .unwrap_or_default();

    let _ = write!(out, "{:>3}  {:<name_width$}", "#", "Location");
    for column in 0..matrix.len() {
        let _ = write!(out, "  {column:>9}");
    }
    out.push('\n');

    for (index, (stop, row)) in stops.iter().zip(matrix.rows()).enumerate() {
        let _ = write!(out, "{index:>3}  {:<name_width$}", stop.name);
        for cell in row {
            let _ = write!(out, "  {:>9}", format_cell(cell));
        }
        out.push('\n');
    }
    out
}

fn format_cell(cell: MatrixCell) -> String {
    match cell {
        MatrixCell::Value(value) => format!("{value:.2}"),
        MatrixCell::Unreachable => "-".to_string(),
        MatrixCell::NotComputed | MatrixCell::Pending => "?".to_string(),
    }
}

fn to_json_line<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut text = to_json(value)?;
    text.push('\n');
    Ok(text)
}

/// Write rendered output to stdout.
pub fn emit(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

use std::fmt::Write;

use serde::Serialize;

use crate::catalog::Location;
use crate::error::Result;
use crate::path::PathResult;
use crate::tour::TourResult;

/// Format a distance the way it is shown to users, e.g. `12.35 ly`.
pub fn format_distance(distance: f64) -> String {
    format!("{distance:.2} ly")
}

/// Presentation style for textual renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Full listing with per-leg distances.
    #[default]
    PlainText,
    /// One location name per line, nothing else.
    NamesOnly,
}

/// Render a point-to-point result as text.
pub fn render_path(result: &PathResult, mode: RenderMode) -> String {
    let mut out = String::new();
    if !result.is_valid() {
        out.push_str("No route found.\n");
        return out;
    }

    if mode == RenderMode::NamesOnly {
        for location in &result.path {
            let _ = writeln!(out, "{}", location.name);
        }
        return out;
    }

    let _ = writeln!(
        out,
        "Route: {} jumps, {}",
        result.hop_count(),
        format_distance(result.distance)
    );
    let mut previous: Option<&Location> = None;
    for (index, location) in result.path.iter().enumerate() {
        match previous {
            None => {
                let _ = writeln!(out, "{index:>3}. {}", location.name);
            }
            Some(prev) => {
                let leg = location.distance_to(prev);
                let _ = writeln!(
                    out,
                    "{index:>3}. {} ({})",
                    location.name,
                    format_distance(leg)
                );
            }
        }
        previous = Some(location.as_ref());
    }
    out
}

/// Render a tour as a table of `system | body | leg | total`.
pub fn render_tour(result: &TourResult, mode: RenderMode) -> String {
    let mut out = String::new();
    if result.is_empty() {
        out.push_str("No tour planned.\n");
        return out;
    }

    if mode == RenderMode::NamesOnly {
        for stop in result.stops() {
            let _ = writeln!(out, "{stop}");
        }
        return out;
    }

    let labels: Vec<String> = result.rows.iter().map(|row| row.sublabel()).collect();
    let name_width = result
        .rows
        .iter()
        .map(|row| row.location.chars().count())
        .chain(std::iter::once("System".len()))
        .max()
        .unwrap_or_default();
    let label_width = labels
        .iter()
        .map(|label| label.chars().count())
        .chain(std::iter::once("Body".len()))
        .max()
        .unwrap_or_default();

    let _ = writeln!(
        out,
        "{:<name_width$}  {:<label_width$}  {:>12}  {:>12}",
        "System", "Body", "Leg", "Total"
    );
    for (row, label) in result.rows.iter().zip(&labels) {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<label_width$}  {:>12}  {:>12}",
            row.location,
            label,
            format_distance(row.leg_distance),
            format_distance(row.cumulative_distance)
        );
    }
    let _ = writeln!(out, "Total distance: {}", format_distance(result.total_distance));
    out
}

/// Serialize any result to pretty JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

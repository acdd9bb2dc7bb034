//! Tabular input for charts.

use serde_json::Value as JsonValue;
use std::fmt;

/// The kinds of chart that can be drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartKind {
    /// Second column against the first, or the first against row index.
    #[default]
    Line,
    /// Value counts of the first column.
    Bar,
    /// Value counts of the first column as shares of a disc.
    Pie,
}

impl ChartKind {
    /// Parses a chart kind, returning `None` for unknown names.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "line" => Some(Self::Line),
            "bar" => Some(Self::Bar),
            "pie" => Some(Self::Pie),
            _ => None,
        }
    }

    /// Returns the chart kind name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bar => "bar",
            Self::Pie => "pie",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows of values under named columns.
///
/// Built from a JSON array whose items are objects (keys become columns, in
/// first-seen order), arrays (positions become columns `0`, `1`, ...) or
/// scalars (a single column `0`). Missing cells are `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<JsonValue>>,
}

impl Table {
    /// Builds a table from JSON records.
    #[must_use]
    pub fn from_records(records: &[JsonValue]) -> Self {
        let cells: Vec<Vec<(String, &JsonValue)>> = records
            .iter()
            .map(|record| match record {
                JsonValue::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
                JsonValue::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect(),
                scalar => vec![("0".to_string(), scalar)],
            })
            .collect();

        let mut columns: Vec<String> = Vec::new();
        for (name, _) in cells.iter().flatten() {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }

        let rows = cells
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| {
                        record
                            .iter()
                            .find(|(name, _)| name == column)
                            .map_or(JsonValue::Null, |(_, v)| (*v).clone())
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows, each with one value per column.
    #[must_use]
    pub fn rows(&self) -> &[Vec<JsonValue>] {
        &self.rows
    }

    /// Values of the column at `index`, one per row.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &JsonValue> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// True when there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }
}

/// Reads a cell as a number; numeric strings count.
#[must_use]
pub fn as_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Counts distinct non-null values, most frequent first.
///
/// Ties keep first-seen order.
#[must_use]
pub fn value_counts<'a>(values: impl Iterator<Item = &'a JsonValue>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        let label = match value {
            JsonValue::Null => continue,
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((label, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

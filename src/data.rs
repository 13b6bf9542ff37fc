use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::DataError;

/// A single dataset value. Temporal values are kept as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Classify a raw field: blank is `Empty`, anything `f64` accepts is a `Number`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Cell::Number(n),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text used for axis ticks and category names
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Exact identity of the value, for distinctness checks. Unlike
    /// [`Cell::label`] nothing is rounded.
    pub fn key(&self) -> CellKey {
        match self {
            // -0.0 and 0.0 are the same value
            Cell::Number(n) if *n == 0.0 => CellKey::Number(0f64.to_bits()),
            Cell::Number(n) => CellKey::Number(n.to_bits()),
            Cell::Text(s) => CellKey::Text(s.clone()),
            Cell::Empty => CellKey::Empty,
        }
    }
}

/// Hashable form of a [`Cell`]; numbers compare by their exact bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKey {
    Number(u64),
    Text(String),
    Empty,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", format_number(*n)),
            Cell::Text(s) => f.write_str(s),
            Cell::Empty => Ok(()),
        }
    }
}

/// Whole numbers print without a fraction, everything else with two decimals.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{:.2}", n)
    }
}

/// How the non-empty cells of one column look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
    Mixed,
    /// Every cell is empty
    Blank,
}

/// An immutable tabular snapshot: unique ordered column names, ordered rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, DataError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(DataError::DuplicateColumn(column.clone()));
            }
        }
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DataError::RaggedRow {
                    row: idx,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build from raw string fields, classifying each with [`Cell::parse`].
    pub fn from_strings(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, DataError> {
        let rows = rows
            .into_iter()
            .map(|row| row.iter().map(|field| Cell::parse(field)).collect())
            .collect();
        Self::new(headers, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// All cells of a column in row order
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    pub fn classify_column(&self, name: &str) -> Option<ColumnKind> {
        let cells = self.column(name)?;
        let numeric = cells.iter().filter(|c| matches!(c, Cell::Number(_))).count();
        let text = cells.iter().filter(|c| matches!(c, Cell::Text(_))).count();
        Some(match (numeric, text) {
            (0, 0) => ColumnKind::Blank,
            (_, 0) => ColumnKind::Numeric,
            (0, _) => ColumnKind::Text,
            _ => ColumnKind::Mixed,
        })
    }

    pub fn summary(&self) -> DatasetSummary {
        let missing_values = self
            .rows
            .iter()
            .flat_map(|r| r.iter())
            .filter(|c| c.is_empty())
            .count();

        let mut seen: HashSet<Vec<CellKey>> = HashSet::new();
        let mut duplicate_rows = 0;
        for row in &self.rows {
            let key: Vec<CellKey> = row.iter().map(Cell::key).collect();
            if !seen.insert(key) {
                duplicate_rows += 1;
            }
        }

        DatasetSummary {
            rows: self.rows.len(),
            columns: self.columns.len(),
            missing_values,
            duplicate_rows,
        }
    }
}

/// Read-only counts shown next to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub missing_values: usize,
    pub duplicate_rows: usize,
}

/// Which snapshot a render pass reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetVariant {
    Raw,
    Cleaned,
}

/// The raw upload plus an optional cleaned copy produced elsewhere.
#[derive(Debug, Clone)]
pub struct DatasetVariants {
    pub raw: Dataset,
    pub cleaned: Option<Dataset>,
}

impl DatasetVariants {
    pub fn new(raw: Dataset, cleaned: Option<Dataset>) -> Self {
        Self { raw, cleaned }
    }

    /// Cleaned when a cleaned snapshot exists, raw otherwise
    pub fn default_variant(&self) -> DatasetVariant {
        if self.cleaned.is_some() {
            DatasetVariant::Cleaned
        } else {
            DatasetVariant::Raw
        }
    }

    /// Asking for the cleaned snapshot before one exists falls back to raw.
    pub fn select(&self, variant: DatasetVariant) -> &Dataset {
        match (variant, &self.cleaned) {
            (DatasetVariant::Cleaned, Some(cleaned)) => cleaned,
            _ => &self.raw,
        }
    }
}

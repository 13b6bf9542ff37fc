use thiserror::Error;

/// Problems found while registering chart specifications.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("chart specification has an empty name")]
    EmptyName,

    #[error("chart '{0}' is registered more than once")]
    DuplicateName(String),

    #[error("chart '{name}' has unknown type '{tag}'")]
    UnknownChartType { name: String, tag: String },

    #[error("chart '{0}' lists no value columns")]
    NoColumns(String),

    /// Grouped bars place exactly two series side by side
    #[error("grouped bar chart '{name}' needs exactly 2 columns and 2 group names (got {columns} columns, {groups} group names)")]
    GroupedBarArity {
        name: String,
        columns: usize,
        groups: usize,
    },

    #[error("dual axis chart '{0}' lists no right_columns")]
    MissingRightColumns(String),

    #[error("chart '{name}' of type {kind} does not accept field '{field}'")]
    UnexpectedField {
        name: String,
        kind: String,
        field: &'static str,
    },

    #[error("invalid chart registry: {0}")]
    Malformed(String),
}

/// Problems found while assembling a dataset snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("row {row} has {found} cells but the dataset has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Per-chart failures. A builder error omits that one chart from the pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("dataset has no rows")]
    EmptyDataset,

    #[error("row {row} is out of range (dataset has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("column '{0}' is not in the dataset")]
    MissingColumn(String),

    #[error("column '{column}' row {row} is not numeric")]
    NonNumericValue { column: String, row: usize },

    #[error("column '{0}' mixes numeric and text values")]
    MixedColumn(String),

    #[error("none of the configured columns are numeric and present: {0}")]
    NoNumericColumns(String),

    #[error("{kind} chart '{name}' is misconfigured: {reason}")]
    Misconfigured {
        name: String,
        kind: String,
        reason: String,
    },
}

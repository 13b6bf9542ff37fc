use serde::Serialize;

use crate::data::Dataset;
use crate::spec::ChartSpec;

/// Outcome of checking one chart's columns against a dataset snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub spec_name: String,
    pub is_valid: bool,
    /// Absent columns, in the order the chart lists them
    pub missing_columns: Vec<String>,
}

/// `{x_axis} ∪ columns ∪ right_columns`, first occurrence order, no repeats.
pub fn required_columns(spec: &ChartSpec) -> Vec<&str> {
    let right = spec.right_columns.iter().flatten();
    let mut required: Vec<&str> = Vec::new();
    for col in std::iter::once(&spec.x_axis).chain(&spec.columns).chain(right) {
        if !required.contains(&col.as_str()) {
            required.push(col.as_str());
        }
    }
    required
}

pub fn validate(dataset: &Dataset, spec: &ChartSpec) -> ValidationResult {
    let missing_columns: Vec<String> = required_columns(spec)
        .into_iter()
        .filter(|col| !dataset.has_column(col))
        .map(str::to_string)
        .collect();

    ValidationResult {
        spec_name: spec.name.clone(),
        is_valid: missing_columns.is_empty(),
        missing_columns,
    }
}

use tracing::debug;

use super::{values, BuildContext, Built, ChartBuilder};
use crate::data::ColumnKind;
use crate::error::BuildError;
use crate::ir::{ChartBody, ChartDescriptor, HeatmapChart};
use crate::spec::{ChartKind, ChartSpec};
use crate::stats::correlation_matrix;

/// The colour scale always spans the full coefficient range so charts stay
/// comparable with each other.
pub const COLOR_RANGE: (f64, f64) = (-1.0, 1.0);
const COLOR_SCALE: &str = "RdBu";

/// Pairwise Pearson correlation between the configured numeric columns.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationHeatmapBuilder;

impl ChartBuilder for CorrelationHeatmapBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::CorrelationHeatmap
    }

    fn build(&self, ctx: &BuildContext<'_>, spec: &ChartSpec) -> Result<Built, BuildError> {
        let mut labels: Vec<String> = Vec::new();
        let mut absent = Vec::new();
        let mut non_numeric = Vec::new();

        for name in &spec.columns {
            if labels.contains(name) {
                continue;
            }
            match ctx.dataset.classify_column(name) {
                None => absent.push(name.as_str()),
                Some(ColumnKind::Numeric) => labels.push(name.clone()),
                Some(ColumnKind::Text) | Some(ColumnKind::Blank) => non_numeric.push(name.as_str()),
                Some(ColumnKind::Mixed) => return Err(BuildError::MixedColumn(name.clone())),
            }
        }

        let mut warnings = Vec::new();
        if !absent.is_empty() {
            warnings.push(format!("Columns not in the dataset were skipped: {}", absent.join(", ")));
        }
        if !non_numeric.is_empty() {
            warnings.push(format!("Non-numeric columns were skipped: {}", non_numeric.join(", ")));
        }

        if labels.is_empty() {
            return Err(BuildError::NoNumericColumns(spec.columns.join(", ")));
        }

        let columns = labels
            .iter()
            .map(|name| values(ctx.dataset, name))
            .collect::<Result<Vec<_>, _>>()?;
        let matrix = correlation_matrix(&columns);
        let cell_labels: Vec<Vec<String>> = matrix
            .iter()
            .map(|row| {
                row.iter()
                    .map(|r| r.map(|r| format!("{:.2}", r)).unwrap_or_default())
                    .collect()
            })
            .collect();
        debug!(chart = %spec.name, columns = labels.len(), "correlation matrix computed");

        Ok(Built {
            descriptor: ChartDescriptor {
                name: spec.name.clone(),
                kind: ChartKind::CorrelationHeatmap,
                title: spec.name.clone(),
                body: ChartBody::Heatmap(HeatmapChart {
                    axis_title: "Indicator".to_string(),
                    labels,
                    matrix,
                    cell_labels,
                    color_scale: COLOR_SCALE.to_string(),
                    color_range: COLOR_RANGE,
                }),
            },
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::test_support::{cols, dataset};
    use crate::data::Dataset;
    use approx::assert_abs_diff_eq;

    fn heatmap(data: &Dataset, columns: &[&str]) -> Result<(HeatmapChart, Vec<String>), BuildError> {
        let spec = ChartSpec::new("Corr", ChartKind::CorrelationHeatmap, "year", cols(columns));
        let built = CorrelationHeatmapBuilder.build(&BuildContext::new(data), &spec)?;
        match built.descriptor.body {
            ChartBody::Heatmap(h) => Ok((h, built.warnings)),
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_identical_columns_correlate_fully() {
        let data = dataset(
            &["year", "x", "x_copy"],
            &[&["1", "3", "3"], &["2", "7", "7"], &["3", "4", "4"], &["4", "9", "9"]],
        );
        let (h, warnings) = heatmap(&data, &["x", "x_copy"]).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(h.matrix.len(), 2);
        for row in &h.matrix {
            assert_eq!(row.len(), 2);
            for r in row {
                assert_abs_diff_eq!(r.unwrap(), 1.0, epsilon = 1e-9);
            }
        }
        assert_eq!(h.color_range, (-1.0, 1.0));
        assert_eq!(h.cell_labels[0][1], "1.00");
    }

    #[test]
    fn test_absent_and_text_columns_dropped_with_warning() {
        let data = dataset(
            &["year", "a", "b", "label"],
            &[&["1", "1", "2", "x"], &["2", "2", "1", "y"], &["3", "3", "5", "z"]],
        );
        let (h, warnings) = heatmap(&data, &["a", "ghost", "label", "b"]).unwrap();
        assert_eq!(h.labels, vec!["a", "b"]);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("ghost"));
        assert!(warnings[1].contains("label"));
    }

    #[test]
    fn test_zero_variance_is_undefined() {
        let data = dataset(&["year", "flat", "a"], &[&["1", "5", "1"], &["2", "5", "2"]]);
        let (h, _) = heatmap(&data, &["flat", "a"]).unwrap();
        assert_eq!(h.matrix[0][0], None);
        assert_eq!(h.matrix[0][1], None);
        assert_eq!(h.cell_labels[0][1], "");
        assert_abs_diff_eq!(h.matrix[1][1].unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_numeric_columns() {
        let data = dataset(&["year", "label"], &[&["1", "x"]]);
        let err = heatmap(&data, &["label", "ghost"]).unwrap_err();
        assert!(matches!(err, BuildError::NoNumericColumns(_)));
    }

    #[test]
    fn test_mixed_column_fails_the_chart() {
        let data = dataset(&["year", "a", "b"], &[&["1", "1", "2"], &["2", "oops", "3"]]);
        let err = heatmap(&data, &["a", "b"]).unwrap_err();
        assert_eq!(err, BuildError::MixedColumn("a".to_string()));
    }
}

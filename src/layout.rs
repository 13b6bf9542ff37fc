use serde::Serialize;
use tracing::debug;

use crate::data::Dataset;
use crate::registry::ChartRegistry;
use crate::spec::ChartSpec;
use crate::validate::{validate, ValidationResult};

/// The board is always two charts wide; it never reflows.
pub const GRID_COLUMNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridPosition {
    pub row: usize,
    pub col: usize,
}

impl GridPosition {
    pub fn from_index(index: usize) -> Self {
        Self {
            row: index / GRID_COLUMNS,
            col: index % GRID_COLUMNS,
        }
    }
}

/// Number of grid rows needed for `n` charts
pub fn row_count(n: usize) -> usize {
    n.div_ceil(GRID_COLUMNS)
}

/// Grid positions for `n` charts in order; empty when there is nothing to show.
pub fn plan_grid(n: usize) -> Vec<GridPosition> {
    (0..n).map(GridPosition::from_index).collect()
}

/// A valid chart and where it sits on the board.
#[derive(Debug, Clone)]
pub struct PlannedChart<'a> {
    pub spec: &'a ChartSpec,
    pub position: GridPosition,
}

/// Valid charts in registry order with grid positions, plus the charts left
/// out because the dataset lacks some of their columns.
#[derive(Debug, Clone, Default)]
pub struct RenderPlan<'a> {
    pub entries: Vec<PlannedChart<'a>>,
    pub skipped: Vec<ValidationResult>,
}

impl<'a> RenderPlan<'a> {
    pub fn rows(&self) -> usize {
        row_count(self.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn chart_names(&self) -> Vec<&'a str> {
        self.entries.iter().map(|e| e.spec.name.as_str()).collect()
    }
}

/// Validate every registered chart against this dataset snapshot and lay the
/// valid ones out. Nothing is cached: call once per pass.
pub fn plan_render<'a>(registry: &'a ChartRegistry, dataset: &Dataset) -> RenderPlan<'a> {
    let mut valid = Vec::new();
    let mut skipped = Vec::new();

    for spec in registry.iter() {
        let result = validate(dataset, spec);
        if result.is_valid {
            valid.push(spec);
        } else {
            debug!(chart = %spec.name, missing = ?result.missing_columns, "chart excluded from plan");
            skipped.push(result);
        }
    }

    let entries = valid
        .iter()
        .zip(plan_grid(valid.len()))
        .map(|(&spec, position)| PlannedChart { spec, position })
        .collect();

    RenderPlan { entries, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ChartKind;
    use proptest::prelude::*;

    fn line(name: &str, column: &str) -> ChartSpec {
        ChartSpec::new(name, ChartKind::Line, "month", vec![column.to_string()])
    }

    #[test]
    fn test_plan_grid_five_charts() {
        let grid = plan_grid(5);
        assert_eq!(row_count(5), 3);
        assert_eq!(grid[4], GridPosition { row: 2, col: 0 });
        assert_eq!(grid.iter().filter(|p| p.row == 2).count(), 1);
    }

    #[test]
    fn test_plan_grid_empty() {
        assert!(plan_grid(0).is_empty());
        assert_eq!(row_count(0), 0);
    }

    #[test]
    fn test_plan_render_keeps_registry_order() {
        let registry = ChartRegistry::from_specs([
            line("first", "a"),
            line("broken", "zzz"),
            line("second", "b"),
            line("third", "a"),
        ])
        .unwrap();
        let data = Dataset::new(
            vec!["month".to_string(), "a".to_string(), "b".to_string()],
            vec![],
        )
        .unwrap();

        let plan = plan_render(&registry, &data);
        assert_eq!(plan.chart_names(), vec!["first", "second", "third"]);
        assert_eq!(plan.entries[2].position, GridPosition { row: 1, col: 0 });
        assert_eq!(plan.rows(), 2);
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].spec_name, "broken");
        assert_eq!(plan.skipped[0].missing_columns, vec!["zzz".to_string()]);
    }

    proptest! {
        #[test]
        fn rows_are_ceil_half(n in 0usize..200) {
            let grid = plan_grid(n);
            prop_assert_eq!(grid.len(), n);
            prop_assert_eq!(row_count(n), (n + 1) / 2);
            for (idx, pos) in grid.iter().enumerate() {
                prop_assert_eq!(pos.row, idx / 2);
                prop_assert_eq!(pos.col, idx % 2);
            }
        }
    }
}

use std::collections::HashSet;

use super::{column, misconfigured, BuildContext, Built, ChartBuilder};
use crate::data::format_number;
use crate::error::BuildError;
use crate::ir::{BarGroup, ChartBody, ChartDescriptor, GroupedBarChart};
use crate::spec::{ChartKind, ChartSpec};

/// Offset of each group from the category index
pub const GROUP_OFFSET: f64 = 0.15;
pub const BAR_WIDTH: f64 = 0.3;
const DEFAULT_COLORS: [&str; 2] = ["#636EFA", "#EF553B"];

/// Two bar series side by side per category: group A at `index - 0.15`,
/// group B at `index + 0.15`.
#[derive(Debug, Clone, Copy)]
pub struct GroupedBarBuilder;

impl ChartBuilder for GroupedBarBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::GroupedBar
    }

    fn build(&self, ctx: &BuildContext<'_>, spec: &ChartSpec) -> Result<Built, BuildError> {
        let group_names = spec.group_names.as_deref().unwrap_or_default();
        if spec.columns.len() != 2 || group_names.len() != 2 {
            return Err(misconfigured(spec, "needs exactly two columns and two group names"));
        }

        let x = column(ctx.dataset, &spec.x_axis)?;

        // Distinct categories in first-occurrence order, with the row each came from
        let mut seen = HashSet::new();
        let mut categories: Vec<String> = Vec::new();
        let mut source_rows: Vec<usize> = Vec::new();
        for (row, cell) in x.iter().enumerate() {
            if seen.insert(cell.key()) {
                categories.push(cell.label());
                source_rows.push(row);
            }
        }

        let mut warnings = Vec::new();
        if source_rows.len() < x.len() {
            warnings.push(format!(
                "'{}' repeats categories; {} later rows are not shown",
                spec.x_axis,
                x.len() - source_rows.len()
            ));
        }

        let tick_positions: Vec<f64> = (0..categories.len()).map(|i| i as f64).collect();
        let offsets = [-GROUP_OFFSET, GROUP_OFFSET];

        let mut groups = Vec::with_capacity(2);
        for (idx, name) in spec.columns.iter().enumerate() {
            let cells = column(ctx.dataset, name)?;
            let values: Vec<Option<f64>> = source_rows.iter().map(|&r| cells[r].as_number()).collect();
            let labels = values
                .iter()
                .map(|v| v.map(format_number).unwrap_or_default())
                .collect();
            let color = spec
                .bar_colors
                .as_ref()
                .and_then(|c| c.get(idx))
                .cloned()
                .unwrap_or_else(|| DEFAULT_COLORS[idx].to_string());

            groups.push(BarGroup {
                name: group_names[idx].clone(),
                color,
                positions: tick_positions.iter().map(|p| p + offsets[idx]).collect(),
                values,
                labels,
            });
        }

        Ok(Built {
            descriptor: ChartDescriptor {
                name: spec.name.clone(),
                kind: ChartKind::GroupedBar,
                title: spec.name.clone(),
                body: ChartBody::GroupedBar(GroupedBarChart {
                    x_title: spec.x_axis.clone(),
                    y_title: "Value".to_string(),
                    categories,
                    tick_positions,
                    bar_width: BAR_WIDTH,
                    groups,
                }),
            },
            warnings,
        })
    }
}

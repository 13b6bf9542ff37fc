use tracing::debug;

use super::{BuildContext, Built, ChartBuilder};
use crate::data::{Cell, Dataset};
use crate::error::BuildError;
use crate::ir::{ChartBody, ChartDescriptor, PieChart, PieSlice, SliceKind};
use crate::spec::{ChartKind, ChartSpec};

const OTHER_LABEL: &str = "Other";
const DONUT_HOLE: f64 = 0.3;

/// Row shown when the user has not picked one: the second row if there is
/// one, else the first. The first row of these tables is often a header-like
/// or all-zero row.
pub fn default_pie_row(len: usize) -> Option<usize> {
    match len {
        0 => None,
        1 => Some(0),
        _ => Some(1),
    }
}

/// Composition of one row: `x_axis` is the total, `columns` are the parts,
/// and a positive remainder becomes an "Other" slice.
#[derive(Debug, Clone, Copy)]
pub struct PieBuilder;

impl ChartBuilder for PieBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::Pie
    }

    fn build(&self, ctx: &BuildContext<'_>, spec: &ChartSpec) -> Result<Built, BuildError> {
        let len = ctx.dataset.len();
        let row = match ctx.row_selection {
            Some(row) if row >= len => return Err(BuildError::RowOutOfRange { row, len }),
            Some(row) => row,
            None => default_pie_row(len).ok_or(BuildError::EmptyDataset)?,
        };

        let total = number_at(ctx.dataset, row, &spec.x_axis)?;

        let mut slices = Vec::with_capacity(spec.columns.len() + 1);
        for column in &spec.columns {
            let value = number_at(ctx.dataset, row, column)?;
            slices.push(PieSlice {
                label: format!("{} ({:.2})", column, value),
                value,
                kind: SliceKind::Part,
            });
        }

        let parts: f64 = slices.iter().map(|s| s.value).sum();
        let remainder = total - parts;
        if remainder > 0.0 {
            slices.push(PieSlice {
                label: format!("{} ({:.2})", OTHER_LABEL, remainder),
                value: remainder,
                kind: SliceKind::Other,
            });
        } else {
            // Parts meet or exceed the total; the slices are left as they are.
            debug!(chart = %spec.name, row, total, remainder, "no remainder slice");
        }

        Ok(ChartDescriptor {
            name: spec.name.clone(),
            kind: ChartKind::Pie,
            title: format!("{} (row {})", spec.name, row + 1),
            body: ChartBody::Pie(PieChart {
                row,
                total,
                slices,
                remainder,
                hole: DONUT_HOLE,
                center_label: format!("Total: {:.2}", total),
            }),
        }
        .into())
    }
}

fn number_at(dataset: &Dataset, row: usize, column: &str) -> Result<f64, BuildError> {
    match dataset.cell(row, column) {
        Some(Cell::Number(n)) => Ok(*n),
        Some(_) => Err(BuildError::NonNumericValue {
            column: column.to_string(),
            row,
        }),
        None => Err(BuildError::MissingColumn(column.to_string())),
    }
}

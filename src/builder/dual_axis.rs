use super::{column, misconfigured, values, BuildContext, Built, ChartBuilder};
use crate::error::BuildError;
use crate::ir::{AxisSide, ChartBody, ChartDescriptor, Dash, DualAxisChart, Series, Stroke};
use crate::spec::{ChartKind, ChartSpec};

const LEFT_FALLBACK: &str = "Left axis";
const RIGHT_FALLBACK: &str = "Right axis";
const STROKE_WIDTH: f64 = 2.5;

/// `columns` on the left axis with solid strokes, `right_columns` on the
/// right axis with dashed strokes, sharing `x_axis`.
#[derive(Debug, Clone, Copy)]
pub struct DualAxisBuilder;

impl ChartBuilder for DualAxisBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::DualAxisLine
    }

    fn build(&self, ctx: &BuildContext<'_>, spec: &ChartSpec) -> Result<Built, BuildError> {
        let right = match spec.right_columns.as_deref() {
            Some(cols) if !cols.is_empty() => cols,
            _ => return Err(misconfigured(spec, "right_columns is empty")),
        };

        let x = column(ctx.dataset, &spec.x_axis)?.into_iter().cloned().collect();

        let sides = [(AxisSide::Left, &spec.columns[..], Dash::Solid), (AxisSide::Right, right, Dash::Dashed)];
        let mut series = Vec::with_capacity(spec.columns.len() + right.len());
        for (axis, names, dash) in sides {
            for name in names {
                series.push(Series {
                    name: name.clone(),
                    values: values(ctx.dataset, name)?,
                    axis,
                    stroke: Stroke {
                        dash,
                        width: STROKE_WIDTH,
                    },
                });
            }
        }

        Ok(ChartDescriptor {
            name: spec.name.clone(),
            kind: ChartKind::DualAxisLine,
            title: spec.name.clone(),
            body: ChartBody::DualAxis(DualAxisChart {
                x_title: spec.x_axis.clone(),
                left_title: spec.left_title.clone().unwrap_or_else(|| LEFT_FALLBACK.to_string()),
                right_title: spec.right_title.clone().unwrap_or_else(|| RIGHT_FALLBACK.to_string()),
                legend_title: "Series".to_string(),
                x,
                series,
            }),
        }
        .into())
    }
}

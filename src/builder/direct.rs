use tracing::debug;

use super::{column, misconfigured, values, BuildContext, Built, ChartBuilder};
use crate::error::BuildError;
use crate::ir::{
    AxisSide, CartesianChart, ChartBody, ChartDescriptor, Mark, ScatterChart, Series, Stroke,
    TaggedPoint,
};
use crate::spec::{ChartKind, ChartSpec};

/// Line, bar and area charts: one series per value column against the shared
/// x column, every row in order, no aggregation.
#[derive(Debug, Clone, Copy)]
pub struct DirectBuilder {
    mark: Mark,
}

impl DirectBuilder {
    pub const fn line() -> Self {
        Self { mark: Mark::Line }
    }

    pub const fn bar() -> Self {
        Self { mark: Mark::Bar }
    }

    pub const fn area() -> Self {
        Self { mark: Mark::Area }
    }
}

impl ChartBuilder for DirectBuilder {
    fn kind(&self) -> ChartKind {
        match self.mark {
            Mark::Line => ChartKind::Line,
            Mark::Bar => ChartKind::Bar,
            Mark::Area => ChartKind::Area,
        }
    }

    fn build(&self, ctx: &BuildContext<'_>, spec: &ChartSpec) -> Result<Built, BuildError> {
        let x: Vec<_> = column(ctx.dataset, &spec.x_axis)?.into_iter().cloned().collect();

        let mut series = Vec::with_capacity(spec.columns.len());
        for name in &spec.columns {
            series.push(Series {
                name: name.clone(),
                values: values(ctx.dataset, name)?,
                axis: AxisSide::Left,
                stroke: Stroke::default(),
            });
        }
        debug!(chart = %spec.name, kind = %self.kind(), rows = x.len(), series = series.len(), "built series chart");

        Ok(ChartDescriptor {
            name: spec.name.clone(),
            kind: self.kind(),
            title: spec.name.clone(),
            body: ChartBody::Cartesian(CartesianChart {
                mark: self.mark,
                x_title: spec.x_axis.clone(),
                x,
                series,
            }),
        }
        .into())
    }
}

/// Scatter: like the direct builders, but every point carries its source
/// column so several columns stay distinguishable.
#[derive(Debug, Clone, Copy)]
pub struct ScatterBuilder;

impl ChartBuilder for ScatterBuilder {
    fn kind(&self) -> ChartKind {
        ChartKind::Scatter
    }

    fn build(&self, ctx: &BuildContext<'_>, spec: &ChartSpec) -> Result<Built, BuildError> {
        let y_title = spec
            .columns
            .first()
            .ok_or_else(|| misconfigured(spec, "columns is empty"))?
            .clone();
        let x = column(ctx.dataset, &spec.x_axis)?;

        let mut points = Vec::with_capacity(x.len() * spec.columns.len());
        for name in &spec.columns {
            let ys = values(ctx.dataset, name)?;
            points.extend(x.iter().zip(ys).map(|(&x, y)| TaggedPoint {
                x: x.clone(),
                y,
                source: name.clone(),
            }));
        }

        Ok(ChartDescriptor {
            name: spec.name.clone(),
            kind: ChartKind::Scatter,
            title: spec.name.clone(),
            body: ChartBody::Scatter(ScatterChart {
                x_title: spec.x_axis.clone(),
                y_title,
                points,
            }),
        }
        .into())
    }
}

// Chart builders, one per chart kind

pub mod direct;
pub mod dual_axis;
pub mod grouped_bar;
pub mod heatmap;
pub mod pie;

use crate::data::{Cell, Dataset};
use crate::error::BuildError;
use crate::ir::ChartDescriptor;
use crate::spec::{ChartKind, ChartSpec};

pub use direct::{DirectBuilder, ScatterBuilder};
pub use dual_axis::DualAxisBuilder;
pub use grouped_bar::GroupedBarBuilder;
pub use heatmap::CorrelationHeatmapBuilder;
pub use pie::{default_pie_row, PieBuilder};

/// Inputs a builder may read besides the chart spec.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub dataset: &'a Dataset,
    /// Row picked for this chart by the user, if any (pie only)
    pub row_selection: Option<usize>,
}

impl<'a> BuildContext<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            row_selection: None,
        }
    }

    pub fn with_row(mut self, row: Option<usize>) -> Self {
        self.row_selection = row;
        self
    }
}

/// A descriptor plus non-fatal notes raised while building it.
#[derive(Debug, Clone)]
pub struct Built {
    pub descriptor: ChartDescriptor,
    pub warnings: Vec<String>,
}

impl From<ChartDescriptor> for Built {
    fn from(descriptor: ChartDescriptor) -> Self {
        Self {
            descriptor,
            warnings: Vec::new(),
        }
    }
}

/// Turns one chart spec plus a dataset snapshot into a descriptor.
/// Builders hold no state and never touch the dataset.
pub trait ChartBuilder: Sync {
    fn kind(&self) -> ChartKind;

    fn build(&self, ctx: &BuildContext<'_>, spec: &ChartSpec) -> Result<Built, BuildError>;
}

static LINE: DirectBuilder = DirectBuilder::line();
static BAR: DirectBuilder = DirectBuilder::bar();
static AREA: DirectBuilder = DirectBuilder::area();
static SCATTER: ScatterBuilder = ScatterBuilder;
static PIE: PieBuilder = PieBuilder;
static GROUPED_BAR: GroupedBarBuilder = GroupedBarBuilder;
static DUAL_AXIS: DualAxisBuilder = DualAxisBuilder;
static HEATMAP: CorrelationHeatmapBuilder = CorrelationHeatmapBuilder;

/// The builder registered for a chart kind. Exhaustive over [`ChartKind`].
pub fn builder_for(kind: ChartKind) -> &'static dyn ChartBuilder {
    match kind {
        ChartKind::Line => &LINE,
        ChartKind::Bar => &BAR,
        ChartKind::Area => &AREA,
        ChartKind::Scatter => &SCATTER,
        ChartKind::Pie => &PIE,
        ChartKind::GroupedBar => &GROUPED_BAR,
        ChartKind::DualAxisLine => &DUAL_AXIS,
        ChartKind::CorrelationHeatmap => &HEATMAP,
    }
}

fn column<'d>(dataset: &'d Dataset, name: &str) -> Result<Vec<&'d Cell>, BuildError> {
    dataset
        .column(name)
        .ok_or_else(|| BuildError::MissingColumn(name.to_string()))
}

/// Numeric view of a column; text and empty cells become gaps.
fn values(dataset: &Dataset, name: &str) -> Result<Vec<Option<f64>>, BuildError> {
    Ok(column(dataset, name)?.iter().map(|c| c.as_number()).collect())
}

fn misconfigured(spec: &ChartSpec, reason: impl Into<String>) -> BuildError {
    BuildError::Misconfigured {
        name: spec.name.clone(),
        kind: spec.kind.to_string(),
        reason: reason.into(),
    }
}

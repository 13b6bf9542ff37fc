use serde::Serialize;

use crate::data::Cell;
use crate::spec::ChartKind;

// =============================================================================
// Chart descriptors
// =============================================================================

/// Builder output: everything the view layer needs to draw one chart.
/// Plain data, no behavior.
#[derive(Debug, Clone, Serialize)]
pub struct ChartDescriptor {
    pub name: String,
    pub kind: ChartKind,
    pub title: String,
    pub body: ChartBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum ChartBody {
    Cartesian(CartesianChart),
    Scatter(ScatterChart),
    Pie(PieChart),
    GroupedBar(GroupedBarChart),
    DualAxis(DualAxisChart),
    Heatmap(HeatmapChart),
}

// =============================================================================
// Series charts (line, bar, area, dual axis)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Line,
    Bar,
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dash {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub dash: Dash,
    pub width: f64,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            dash: Dash::Solid,
            width: 2.0,
        }
    }
}

/// One value column, aligned index by index with the chart's shared `x`.
/// Non-numeric cells become gaps.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
    pub axis: AxisSide,
    pub stroke: Stroke,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartesianChart {
    pub mark: Mark,
    pub x_title: String,
    pub x: Vec<Cell>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DualAxisChart {
    pub x_title: String,
    pub left_title: String,
    pub right_title: String,
    pub legend_title: String,
    pub x: Vec<Cell>,
    /// Left-axis series first, then right-axis series
    pub series: Vec<Series>,
}

impl DualAxisChart {
    pub fn side(&self, axis: AxisSide) -> impl Iterator<Item = &Series> {
        self.series.iter().filter(move |s| s.axis == axis)
    }
}

// =============================================================================
// Scatter
// =============================================================================

/// A scatter point remembers which column it came from.
#[derive(Debug, Clone, Serialize)]
pub struct TaggedPoint {
    pub x: Cell,
    pub y: Option<f64>,
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterChart {
    pub x_title: String,
    pub y_title: String,
    pub points: Vec<TaggedPoint>,
}

impl ScatterChart {
    /// Distinct source columns in first-seen order
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = Vec::new();
        for point in &self.points {
            if !sources.contains(&point.source.as_str()) {
                sources.push(&point.source);
            }
        }
        sources
    }
}

// =============================================================================
// Pie
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceKind {
    Part,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub kind: SliceKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct PieChart {
    /// Zero-based row the slices were read from
    pub row: usize,
    pub total: f64,
    pub slices: Vec<PieSlice>,
    /// `total - sum(parts)`, signed. Only drawn when positive.
    pub remainder: f64,
    pub hole: f64,
    pub center_label: String,
}

impl PieChart {
    pub fn slice_sum(&self) -> f64 {
        self.slices.iter().map(|s| s.value).sum()
    }
}

// =============================================================================
// Grouped bar
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct BarGroup {
    pub name: String,
    pub color: String,
    pub positions: Vec<f64>,
    pub values: Vec<Option<f64>>,
    /// Drawn just above each bar
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupedBarChart {
    pub x_title: String,
    pub y_title: String,
    pub categories: Vec<String>,
    pub tick_positions: Vec<f64>,
    pub bar_width: f64,
    pub groups: Vec<BarGroup>,
}

// =============================================================================
// Correlation heatmap
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapChart {
    pub axis_title: String,
    pub labels: Vec<String>,
    /// Square and symmetric; `None` where the coefficient is undefined
    pub matrix: Vec<Vec<Option<f64>>>,
    pub cell_labels: Vec<Vec<String>>,
    pub color_scale: String,
    pub color_range: (f64, f64),
}

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::builder::{builder_for, BuildContext};
use crate::data::Dataset;
use crate::ir::ChartDescriptor;
use crate::layout::{plan_render, GridPosition, RenderPlan};
use crate::registry::ChartRegistry;
use crate::validate::ValidationResult;

pub const NO_CHARTS_MESSAGE: &str = "No charts available";

/// Per-pass user input, passed in as plain values.
#[derive(Debug, Clone, Default)]
pub struct UserSelections {
    /// Pie row picked per chart name; charts without an entry use the default row
    pub pie_rows: HashMap<String, usize>,
}

impl UserSelections {
    pub fn with_pie_row(mut self, chart: impl Into<String>, row: usize) -> Self {
        self.pie_rows.insert(chart.into(), row);
        self
    }
}

/// Everything one render pass reads. Nothing is held between passes.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub dataset: &'a Dataset,
    pub registry: &'a ChartRegistry,
    pub selections: &'a UserSelections,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedChart {
    pub position: GridPosition,
    pub descriptor: ChartDescriptor,
}

/// A chart left out of the plan and the columns it was missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedChart {
    pub name: String,
    pub missing_columns: Vec<String>,
}

impl From<ValidationResult> for SkippedChart {
    fn from(result: ValidationResult) -> Self {
        Self {
            name: result.spec_name,
            missing_columns: result.missing_columns,
        }
    }
}

/// A note about one chart: either built with caveats or omitted entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartWarning {
    pub chart: String,
    pub message: String,
    /// True when the chart produced no descriptor
    pub omitted: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderOutcome {
    /// Grid rows of the plan, including cells left empty by omitted charts
    pub rows: usize,
    pub charts: Vec<PlacedChart>,
    pub skipped: Vec<SkippedChart>,
    pub warnings: Vec<ChartWarning>,
}

impl RenderOutcome {
    /// The aggregated missing-column warning, if anything was skipped
    pub fn skipped_summary(&self) -> Option<String> {
        if self.skipped.is_empty() {
            return None;
        }
        let mut msg = String::from("The following charts were skipped because of missing columns:");
        for chart in &self.skipped {
            msg.push_str(&format!("\n- {}: missing {}", chart.name, chart.missing_columns.join(", ")));
        }
        Some(msg)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ChartDescriptor> {
        self.charts.iter().map(|c| &c.descriptor)
    }
}

/// Run builders over a plan in order. A failing chart is omitted with a
/// warning; it never stops the rest of the plan.
pub fn dispatch(plan: &RenderPlan<'_>, dataset: &Dataset, selections: &UserSelections) -> RenderOutcome {
    let mut charts = Vec::with_capacity(plan.entries.len());
    let mut warnings = Vec::new();

    for entry in &plan.entries {
        let spec = entry.spec;
        let ctx = BuildContext::new(dataset).with_row(selections.pie_rows.get(&spec.name).copied());

        match builder_for(spec.kind).build(&ctx, spec) {
            Ok(built) => {
                for message in built.warnings {
                    warn!(chart = %spec.name, "{}", message);
                    warnings.push(ChartWarning {
                        chart: spec.name.clone(),
                        message,
                        omitted: false,
                    });
                }
                charts.push(PlacedChart {
                    position: entry.position,
                    descriptor: built.descriptor,
                });
            }
            Err(e) => {
                warn!(chart = %spec.name, error = %e, "chart omitted");
                warnings.push(ChartWarning {
                    chart: spec.name.clone(),
                    message: e.to_string(),
                    omitted: true,
                });
            }
        }
    }

    RenderOutcome {
        rows: plan.rows(),
        charts,
        skipped: plan.skipped.iter().cloned().map(SkippedChart::from).collect(),
        warnings,
    }
}

/// One full pass: validate, lay out, build.
pub fn render_pass(request: &RenderRequest<'_>) -> RenderOutcome {
    let plan = plan_render(request.registry, request.dataset);
    if plan.is_empty() {
        info!("{}", NO_CHARTS_MESSAGE);
    }

    let outcome = dispatch(&plan, request.dataset, request.selections);
    if let Some(summary) = outcome.skipped_summary() {
        warn!("{}", summary);
    }
    info!(
        charts = outcome.charts.len(),
        skipped = outcome.skipped.len(),
        warnings = outcome.warnings.len(),
        "render pass finished"
    );
    outcome
}

// Library exports for chartboard

pub mod builder;
pub mod csv_reader;
pub mod data;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod ir;
pub mod layout;
pub mod registry;
pub mod spec;
pub mod stats;
pub mod validate;

pub use data::{Cell, Dataset, DatasetVariant, DatasetVariants};
pub use dispatch::{render_pass, RenderOutcome, RenderRequest, UserSelections};
pub use registry::{BoardConfig, ChartRegistry};
pub use spec::{ChartKind, ChartSpec};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    /// Board width in pixels; each chart gets half
    #[serde(default = "default_width")]
    pub width: u32,
    /// Height of one grid row in pixels
    #[serde(default = "default_row_height")]
    pub row_height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 1200 }
fn default_row_height() -> u32 { 400 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            row_height: default_row_height(),
            format: OutputFormat::Png,
        }
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Every chart type the board knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Area,
    Scatter,
    Pie,
    GroupedBar,
    DualAxisLine,
    CorrelationHeatmap,
}

impl ChartKind {
    pub const ALL: [ChartKind; 8] = [
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Area,
        ChartKind::Scatter,
        ChartKind::Pie,
        ChartKind::GroupedBar,
        ChartKind::DualAxisLine,
        ChartKind::CorrelationHeatmap,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Area => "area",
            ChartKind::Scatter => "scatter",
            ChartKind::Pie => "pie",
            ChartKind::GroupedBar => "grouped_bar",
            ChartKind::DualAxisLine => "dual_axis_line",
            ChartKind::CorrelationHeatmap => "correlation_heatmap",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error carrying the tag that matched no chart kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTag(pub String);

impl FromStr for ChartKind {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|k| k.tag() == s)
            .ok_or_else(|| UnknownTag(s.to_string()))
    }
}

/// Declarative description of one chart: its type and the columns it reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub name: String,
    pub kind: ChartKind,
    /// Shared x column. For pie charts this is the total column.
    pub x_axis: String,
    pub columns: Vec<String>,
    /// Secondary-axis columns (dual axis only)
    pub right_columns: Option<Vec<String>>,
    /// Legend labels for the two bar groups (grouped bar only)
    pub group_names: Option<Vec<String>>,
    pub left_title: Option<String>,
    pub right_title: Option<String>,
    pub bar_colors: Option<Vec<String>>,
}

impl ChartSpec {
    pub fn new(
        name: impl Into<String>,
        kind: ChartKind,
        x_axis: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            x_axis: x_axis.into(),
            columns,
            right_columns: None,
            group_names: None,
            left_title: None,
            right_title: None,
            bar_colors: None,
        }
    }

    pub fn with_right_columns(mut self, columns: Vec<String>) -> Self {
        self.right_columns = Some(columns);
        self
    }

    pub fn with_group_names(mut self, names: Vec<String>) -> Self {
        self.group_names = Some(names);
        self
    }

    pub fn with_axis_titles(mut self, left: Option<String>, right: Option<String>) -> Self {
        self.left_title = left;
        self.right_title = right;
        self
    }

    /// Registration-time checks for the fields each kind depends on.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.columns.is_empty() {
            return Err(ConfigError::NoColumns(self.name.clone()));
        }

        match self.kind {
            ChartKind::GroupedBar => {
                let groups = self.group_names.as_ref().map_or(0, Vec::len);
                if self.columns.len() != 2 || groups != 2 {
                    return Err(ConfigError::GroupedBarArity {
                        name: self.name.clone(),
                        columns: self.columns.len(),
                        groups,
                    });
                }
            }
            ChartKind::DualAxisLine => {
                if self.right_columns.as_ref().map_or(true, Vec::is_empty) {
                    return Err(ConfigError::MissingRightColumns(self.name.clone()));
                }
            }
            _ => {}
        }

        if self.kind != ChartKind::DualAxisLine && self.right_columns.is_some() {
            return Err(self.unexpected("right_columns"));
        }
        if self.kind != ChartKind::GroupedBar && self.group_names.is_some() {
            return Err(self.unexpected("group_names"));
        }
        Ok(())
    }

    fn unexpected(&self, field: &'static str) -> ConfigError {
        ConfigError::UnexpectedField {
            name: self.name.clone(),
            kind: self.kind.to_string(),
            field,
        }
    }
}

/// Wire form of a chart specification, before its type tag is resolved.
#[derive(Debug, Clone, Deserialize)]
pub struct RawChartSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x_axis: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub right_columns: Option<Vec<String>>,
    #[serde(default)]
    pub group_names: Option<Vec<String>>,
    #[serde(default)]
    pub left_title: Option<String>,
    #[serde(default)]
    pub right_title: Option<String>,
    #[serde(default)]
    pub bar_colors: Option<Vec<String>>,
}

impl TryFrom<RawChartSpec> for ChartSpec {
    type Error = ConfigError;

    fn try_from(raw: RawChartSpec) -> Result<Self, Self::Error> {
        let kind = raw
            .kind
            .parse::<ChartKind>()
            .map_err(|UnknownTag(tag)| ConfigError::UnknownChartType {
                name: raw.name.clone(),
                tag,
            })?;

        let spec = ChartSpec {
            name: raw.name,
            kind,
            x_axis: raw.x_axis,
            columns: raw.columns,
            right_columns: raw.right_columns,
            group_names: raw.group_names,
            left_title: raw.left_title,
            right_title: raw.right_title,
            bar_colors: raw.bar_colors,
        };
        spec.check()?;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn raw(kind: &str) -> RawChartSpec {
        RawChartSpec {
            name: "chart".to_string(),
            kind: kind.to_string(),
            x_axis: "x".to_string(),
            columns: cols(&["a"]),
            right_columns: None,
            group_names: None,
            left_title: None,
            right_title: None,
            bar_colors: None,
        }
    }

    #[test]
    fn test_kind_tags_round_trip() {
        for kind in ChartKind::ALL {
            assert_eq!(kind.tag().parse::<ChartKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = ChartSpec::try_from(raw("unsupported_kind")).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownChartType {
                name: "chart".to_string(),
                tag: "unsupported_kind".to_string()
            }
        );
    }

    #[test]
    fn test_grouped_bar_arity() {
        let spec = ChartSpec::new("g", ChartKind::GroupedBar, "x", cols(&["a", "b", "c"]))
            .with_group_names(cols(&["A", "B"]));
        assert!(matches!(
            spec.check(),
            Err(ConfigError::GroupedBarArity { columns: 3, groups: 2, .. })
        ));

        let spec = ChartSpec::new("g", ChartKind::GroupedBar, "x", cols(&["a", "b"]));
        assert!(matches!(
            spec.check(),
            Err(ConfigError::GroupedBarArity { columns: 2, groups: 0, .. })
        ));

        let spec = ChartSpec::new("g", ChartKind::GroupedBar, "x", cols(&["a", "b"]))
            .with_group_names(cols(&["A", "B"]));
        assert!(spec.check().is_ok());
    }

    #[test]
    fn test_dual_axis_needs_right_columns() {
        let spec = ChartSpec::new("d", ChartKind::DualAxisLine, "x", cols(&["a"]));
        assert_eq!(spec.check(), Err(ConfigError::MissingRightColumns("d".to_string())));

        let spec = spec.with_right_columns(cols(&["b"]));
        assert!(spec.check().is_ok());
    }

    #[test]
    fn test_kind_specific_fields_rejected_elsewhere() {
        let spec = ChartSpec::new("l", ChartKind::Line, "x", cols(&["a"]))
            .with_right_columns(cols(&["b"]));
        assert!(matches!(
            spec.check(),
            Err(ConfigError::UnexpectedField { field: "right_columns", .. })
        ));
    }

    #[test]
    fn test_empty_columns_and_name() {
        let spec = ChartSpec::new("l", ChartKind::Line, "x", vec![]);
        assert_eq!(spec.check(), Err(ConfigError::NoColumns("l".to_string())));

        let spec = ChartSpec::new(" ", ChartKind::Line, "x", cols(&["a"]));
        assert_eq!(spec.check(), Err(ConfigError::EmptyName));
    }
}

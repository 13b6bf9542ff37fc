use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::spec::{ChartSpec, RawChartSpec};
use crate::RenderOptions;

const BUILTIN_REGISTRY: &str = include_str!("../registry/default.json");

/// Ordered, read-only collection of chart specifications. Registration order
/// is the default rendering order; names are unique.
#[derive(Debug, Clone, Default)]
pub struct ChartRegistry {
    specs: Vec<ChartSpec>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_specs(specs: impl IntoIterator<Item = ChartSpec>) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, spec: ChartSpec) -> Result<(), ConfigError> {
        spec.check()?;
        if self.get(&spec.name).is_some() {
            return Err(ConfigError::DuplicateName(spec.name));
        }
        debug!(chart = %spec.name, kind = %spec.kind, "registered chart");
        self.specs.push(spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ChartSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawBoardConfig {
    #[serde(default)]
    render: RenderOptions,
    charts: Vec<RawChartSpec>,
}

/// A parsed board configuration: the chart registry plus output options.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub registry: ChartRegistry,
    pub render: RenderOptions,
}

impl BoardConfig {
    /// Parse `{"render": {...}, "charts": [...]}`. Any invalid chart fails the
    /// whole load.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawBoardConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;

        let mut registry = ChartRegistry::new();
        for raw_spec in raw.charts {
            registry.register(ChartSpec::try_from(raw_spec)?)?;
        }

        Ok(Self {
            registry,
            render: raw.render,
        })
    }

    /// The economic indicator board shipped with the crate
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_REGISTRY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ChartKind;
    use crate::OutputFormat;
    use std::collections::HashSet;

    fn line(name: &str) -> ChartSpec {
        ChartSpec::new(name, ChartKind::Line, "x", vec!["a".to_string()])
    }

    #[test]
    fn test_registry_preserves_order() {
        let registry = ChartRegistry::from_specs([line("b"), line("a"), line("c")]).unwrap();
        let names: Vec<&str> = registry.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let res = ChartRegistry::from_specs([line("a"), line("a")]);
        assert_eq!(res.unwrap_err(), ConfigError::DuplicateName("a".to_string()));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "render": {"width": 640, "type": "svg"},
            "charts": [
                {"name": "Trend", "type": "line", "x_axis": "month", "columns": ["sales"]},
                {"name": "Split", "type": "grouped_bar", "x_axis": "month",
                 "columns": ["a", "b"], "group_names": ["A", "B"]}
            ]
        }"#;
        let config = BoardConfig::from_json_str(json).unwrap();
        assert_eq!(config.registry.len(), 2);
        assert_eq!(config.registry.get("Split").unwrap().kind, ChartKind::GroupedBar);
        assert_eq!(config.render.width, 640);
        assert!(matches!(config.render.format, OutputFormat::Svg));
    }

    #[test]
    fn test_config_unknown_type_is_an_error() {
        let json = r#"{"charts": [
            {"name": "Ok", "type": "line", "x_axis": "x", "columns": ["a"]},
            {"name": "Odd", "type": "unsupported_kind", "x_axis": "x", "columns": ["a"]}
        ]}"#;
        let err = BoardConfig::from_json_str(json).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownChartType {
                name: "Odd".to_string(),
                tag: "unsupported_kind".to_string()
            }
        );
    }

    #[test]
    fn test_config_malformed_json() {
        assert!(matches!(
            BoardConfig::from_json_str("{\"charts\": 3}"),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn test_builtin_registry_loads() {
        let config = BoardConfig::builtin().unwrap();
        assert!(!config.registry.is_empty());
        let kinds: HashSet<ChartKind> = config.registry.iter().map(|s| s.kind).collect();
        assert_eq!(kinds.len(), ChartKind::ALL.len());
    }
}

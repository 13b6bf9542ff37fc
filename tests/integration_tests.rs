use std::fs;
use std::path::Path;
use std::process::Command;

use chartboard::csv_reader::read_csv_file;
use chartboard::dispatch::NO_CHARTS_MESSAGE;
use chartboard::error::ConfigError;
use chartboard::ir::{ChartBody, SliceKind};
use chartboard::layout::GridPosition;
use chartboard::{
    render_pass, BoardConfig, ChartKind, DatasetVariant, DatasetVariants, OutputFormat, RenderOutcome,
    RenderRequest, UserSelections,
};

fn render(data: &str, config: &BoardConfig, selections: &UserSelections) -> RenderOutcome {
    let dataset = read_csv_file(Path::new(data)).expect("Failed to read test CSV");
    render_pass(&RenderRequest {
        dataset: &dataset,
        registry: &config.registry,
        selections,
    })
}

fn board_config() -> BoardConfig {
    let json = fs::read_to_string("test/board.json").expect("Failed to read test registry");
    BoardConfig::from_json_str(&json).expect("test registry is valid")
}

/// Helper function to run the chartboard binary
fn run_chartboard(args: &[&str]) -> Result<Vec<u8>, String> {
    let output = Command::new(env!("CARGO_BIN_EXE_chartboard"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

#[test]
fn test_builtin_board_on_full_dataset() {
    let config = BoardConfig::builtin().unwrap();
    let outcome = render("test/economy.csv", &config, &UserSelections::default());

    assert_eq!(outcome.charts.len(), config.registry.len());
    assert_eq!(outcome.rows, 9);
    assert!(outcome.skipped.is_empty());
    assert!(outcome.skipped_summary().is_none());
    assert!(outcome.warnings.iter().all(|w| !w.omitted), "{:?}", outcome.warnings);

    // Charts keep registry order and fill the grid left to right
    let names: Vec<&str> = outcome.descriptors().map(|d| d.name.as_str()).collect();
    let expected: Vec<&str> = config.registry.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, expected);
    for (i, chart) in outcome.charts.iter().enumerate() {
        assert_eq!(chart.position, GridPosition { row: i / 2, col: i % 2 });
    }
}

#[test]
fn test_partial_dataset_skips_charts() {
    let config = BoardConfig::builtin().unwrap();
    let outcome = render("test/tax_only.csv", &config, &UserSelections::default());

    let names: Vec<&str> = outcome.descriptors().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Tax revenue trend", "Tax revenue vs GDP"]);
    assert_eq!(outcome.rows, 1);
    assert_eq!(outcome.charts[1].position, GridPosition { row: 0, col: 1 });
    assert_eq!(outcome.skipped.len(), config.registry.len() - 2);

    let summary = outcome.skipped_summary().unwrap();
    assert!(summary.starts_with("The following charts were skipped because of missing columns:"));
    assert!(summary.contains("- Share of high-tech exports: missing Total imports and exports, High-tech product exports"));
}

#[test]
fn test_custom_registry_pie_and_grouped_bar() {
    let config = board_config();
    assert_eq!(config.render.format, OutputFormat::Svg);
    assert_eq!(config.render.row_height, 300);

    let outcome = render("test/economy.csv", &config, &UserSelections::default());
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].missing_columns, vec!["Provincial rank"]);

    let pie = outcome.descriptors().find(|d| d.kind == ChartKind::Pie).unwrap();
    assert_eq!(pie.title, "Value added split (row 2)");
    match &pie.body {
        ChartBody::Pie(p) => {
            assert_eq!(p.row, 1);
            assert_eq!(p.total, 10410.0);
            assert_eq!(p.slices.len(), 3);
            assert_eq!(p.slices[2].kind, SliceKind::Other);
            assert!((p.slices[2].value - 400.0).abs() < 1e-9);
            assert!((p.slice_sum() - 10410.0).abs() < 1e-9);
            assert_eq!(p.center_label, "Total: 10410.00");
        }
        other => panic!("unexpected body {:?}", other),
    }

    let bars = outcome.descriptors().find(|d| d.kind == ChartKind::GroupedBar).unwrap();
    match &bars.body {
        ChartBody::GroupedBar(g) => {
            assert_eq!(g.categories.len(), 5);
            assert_eq!(g.groups[0].name, "Exports");
            assert!((g.groups[0].positions[0] + 0.15).abs() < 1e-9);
            assert!((g.groups[1].positions[0] - 0.15).abs() < 1e-9);
        }
        other => panic!("unexpected body {:?}", other),
    }
}

#[test]
fn test_pie_row_selection_is_per_chart() {
    let config = board_config();
    let selections = UserSelections::default().with_pie_row("Value added split", 4);
    let outcome = render("test/economy.csv", &config, &selections);
    let pie = outcome.descriptors().find(|d| d.kind == ChartKind::Pie).unwrap();
    assert_eq!(pie.title, "Value added split (row 5)");
}

#[test]
fn test_cleaned_variant_is_selected() {
    let raw = read_csv_file(Path::new("test/tax_only.csv")).unwrap();
    let cleaned = read_csv_file(Path::new("test/economy.csv")).unwrap();
    let variants = DatasetVariants::new(raw, Some(cleaned));
    assert_eq!(variants.default_variant(), DatasetVariant::Cleaned);

    let config = BoardConfig::builtin().unwrap();
    let selections = UserSelections::default();
    let plan_size = |variant| {
        render_pass(&RenderRequest {
            dataset: variants.select(variant),
            registry: &config.registry,
            selections: &selections,
        })
        .charts
        .len()
    };
    assert_eq!(plan_size(DatasetVariant::Raw), 2);
    assert_eq!(plan_size(DatasetVariant::Cleaned), 18);
}

#[test]
fn test_unknown_chart_type_rejected_at_load() {
    let json = r#"{"charts": [{"name": "Odd", "type": "unsupported_kind", "x_axis": "a", "columns": ["b"]}]}"#;
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
fn test_cli_render_json() {
    let stdout = run_chartboard(&[
        "render",
        "--data",
        "test/economy.csv",
        "--registry",
        "test/board.json",
        "--pie-row",
        "Value added split=1",
        "--format",
        "json",
    ])
    .expect("render failed");

    let value: serde_json::Value = serde_json::from_slice(&stdout).expect("output is JSON");
    assert_eq!(value["rows"], 2);
    assert_eq!(value["charts"].as_array().unwrap().len(), 4);
    assert_eq!(value["charts"][1]["descriptor"]["body"]["layout"], "pie");
    assert_eq!(value["charts"][1]["descriptor"]["body"]["row"], 0);
    assert_eq!(value["skipped"][0]["name"], "Provincial ranking");
}

#[test]
fn test_cli_reports_skipped_charts_once() {
    let output = Command::new(env!("CARGO_BIN_EXE_chartboard"))
        .args(["render", "--data", "test/tax_only.csv", "--format", "json"])
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to spawn process");
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let header = "The following charts were skipped because of missing columns:";
    assert_eq!(stderr.matches(header).count(), 1, "{}", stderr);
}

#[test]
fn test_cli_rejects_bad_pie_row() {
    let result = run_chartboard(&["render", "--data", "test/economy.csv", "--pie-row", "Value added split"]);
    assert!(result.is_err());
}

#[test]
fn test_cli_rejects_unknown_registry_kind() {
    let dir = std::env::temp_dir().join("chartboard-bad-registry");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("bad.json");
    fs::write(
        &path,
        r#"{"charts": [{"name": "Odd", "type": "sunburst", "x_axis": "GDP", "columns": ["GDP"]}]}"#,
    )
    .unwrap();

    let result = run_chartboard(&[
        "validate",
        "--data",
        "test/economy.csv",
        "--registry",
        path.to_str().unwrap(),
    ]);
    let err = result.unwrap_err();
    assert!(err.contains("sunburst"), "{}", err);
}

#[test]
fn test_cli_validate_lists_every_chart() {
    let stdout = run_chartboard(&["validate", "--data", "test/tax_only.csv"]).expect("validate failed");
    let text = String::from_utf8(stdout).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 18);
    assert_eq!(lines.iter().filter(|l| l.starts_with("ok")).count(), 2);
    assert!(text.contains("skipped  Revenue by sector (bar): missing"));
}

#[test]
fn test_cli_summary() {
    let stdout = run_chartboard(&["summary", "--data", "test/economy.csv"]).expect("summary failed");
    let text = String::from_utf8(stdout).unwrap();
    assert!(text.contains("rows:            5"));
    assert!(text.contains("columns:         25"));
    assert!(text.contains("missing values:  1"));
    assert!(text.contains("duplicate rows:  0"));
}

#[test]
#[ignore = "requires a system sans-serif font"]
fn test_end_to_end_png_board() {
    let stdout = run_chartboard(&["render", "--data", "test/economy.csv", "--format", "png"]).expect("render failed");
    assert!(is_valid_png(&stdout), "Output is not a valid PNG");
}

#[test]
#[ignore = "requires a system sans-serif font"]
fn test_end_to_end_svg_board() {
    let stdout = run_chartboard(&["render", "--data", "test/economy.csv", "--registry", "test/board.json"])
        .expect("render failed");
    let svg = String::from_utf8(stdout).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("GDP trend"));
}

#[test]
#[ignore = "requires a system sans-serif font"]
fn test_empty_board_renders_placeholder() {
    let dir = std::env::temp_dir().join("chartboard-empty-board");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("unrelated.csv");
    fs::write(&path, "station,reading\nA,1\n").unwrap();

    let stdout = run_chartboard(&["render", "--data", path.to_str().unwrap(), "--format", "svg"])
        .expect("render failed");
    let svg = String::from_utf8(stdout).unwrap();
    assert!(svg.contains(NO_CHARTS_MESSAGE));
}

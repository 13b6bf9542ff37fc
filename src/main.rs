use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chartboard::csv_reader;
use chartboard::graph;
use chartboard::validate::validate;
use chartboard::{
    render_pass, BoardConfig, Dataset, DatasetVariant, DatasetVariants, OutputFormat, RenderRequest,
    UserSelections,
};

#[derive(Parser, Debug)]
#[command(name = "chartboard")]
#[command(about = "Render a grid of charts from a tabular dataset and a chart registry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate, lay out and build every chart, then write the board
    Render {
        /// Raw CSV dataset (reads stdin when omitted)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Cleaned CSV snapshot of the same dataset
        #[arg(long)]
        cleaned: Option<PathBuf>,

        /// Which snapshot to render; defaults to cleaned when one is given
        #[arg(long, value_enum)]
        variant: Option<Variant>,

        /// Chart registry JSON (the builtin economic board when omitted)
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Row shown by a pie chart, 1-based (e.g. 'Tax structure=3')
        #[arg(long = "pie-row", value_parser = parse_pie_row)]
        pie_rows: Vec<(String, usize)>,

        /// Output format; overrides the registry's render options
        #[arg(long, value_enum)]
        format: Option<Format>,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long = "row-height")]
        row_height: Option<u32>,

        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check every registered chart against the dataset's columns
    Validate {
        #[arg(long)]
        data: Option<PathBuf>,

        #[arg(long)]
        registry: Option<PathBuf>,
    },

    /// Print row, column, missing-value and duplicate-row counts
    Summary {
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Variant {
    Raw,
    Cleaned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Png,
    Svg,
}

fn parse_pie_row(s: &str) -> Result<(String, usize), String> {
    let (name, row) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=ROW, got '{}'", s))?;
    let row: usize = row
        .trim()
        .parse()
        .map_err(|_| format!("row must be a positive integer, got '{}'", row))?;
    if row == 0 {
        return Err("rows are numbered from 1".to_string());
    }
    Ok((name.trim().to_string(), row - 1))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chartboard=info")))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_dataset(path: Option<&Path>) -> Result<Dataset> {
    match path {
        Some(path) => csv_reader::read_csv_file(path),
        None => csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin"),
    }
}

fn load_config(path: Option<&Path>) -> Result<BoardConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read registry {}", path.display()))?;
            BoardConfig::from_json_str(&json)
                .with_context(|| format!("Invalid registry {}", path.display()))
        }
        None => BoardConfig::builtin().context("Builtin registry is invalid"),
    }
}

fn write_output(bytes: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = bytes.len(), "board written");
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(bytes).context("Failed to write to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            data,
            cleaned,
            variant,
            registry,
            pie_rows,
            format,
            width,
            row_height,
            output,
        } => {
            if data.is_none() && cleaned.is_some() {
                bail!("--cleaned needs --data; only one dataset can come from stdin");
            }
            let raw = load_dataset(data.as_deref())?;
            let cleaned = cleaned
                .as_deref()
                .map(csv_reader::read_csv_file)
                .transpose()?;
            let variants = DatasetVariants::new(raw, cleaned);
            let variant = match variant {
                Some(Variant::Raw) => DatasetVariant::Raw,
                Some(Variant::Cleaned) => DatasetVariant::Cleaned,
                None => variants.default_variant(),
            };
            let dataset = variants.select(variant);

            let config = load_config(registry.as_deref())?;
            let selections = pie_rows
                .into_iter()
                .fold(UserSelections::default(), |sel, (name, row)| sel.with_pie_row(name, row));

            let outcome = render_pass(&RenderRequest {
                dataset,
                registry: &config.registry,
                selections: &selections,
            });

            let mut options = config.render;
            if let Some(width) = width {
                options.width = width;
            }
            if let Some(row_height) = row_height {
                options.row_height = row_height;
            }
            let bytes = match format {
                Some(Format::Json) => serde_json::to_vec_pretty(&outcome).context("Failed to serialize charts")?,
                Some(Format::Png) => {
                    options.format = OutputFormat::Png;
                    graph::render_board(&outcome, &options).context("Failed to render board")?
                }
                Some(Format::Svg) => {
                    options.format = OutputFormat::Svg;
                    graph::render_board(&outcome, &options).context("Failed to render board")?
                }
                None => graph::render_board(&outcome, &options).context("Failed to render board")?,
            };
            write_output(&bytes, output.as_deref())
        }

        Commands::Validate { data, registry } => {
            let dataset = load_dataset(data.as_deref())?;
            let config = load_config(registry.as_deref())?;
            for spec in config.registry.iter() {
                let result = validate(&dataset, spec);
                if result.is_valid {
                    println!("ok       {} ({})", spec.name, spec.kind);
                } else {
                    println!(
                        "skipped  {} ({}): missing {}",
                        spec.name,
                        spec.kind,
                        result.missing_columns.join(", ")
                    );
                }
            }
            Ok(())
        }

        Commands::Summary { data } => {
            let dataset = load_dataset(data.as_deref())?;
            let summary = dataset.summary();
            println!("rows:            {}", summary.rows);
            println!("columns:         {}", summary.columns);
            println!("missing values:  {}", summary.missing_values);
            println!("duplicate rows:  {}", summary.duplicate_rows);
            Ok(())
        }
    }
}

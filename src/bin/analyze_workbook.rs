use clap::Parser;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use anomaly_correlation_service::analysis::{
    CoordinateLookup, CorrelationRow, LabelSet, Metric, MetricPair,
};
use anomaly_correlation_service::config::DEFAULT_SHEET_NAME;
use anomaly_correlation_service::models::{ProvinceSeries, WorkbookAnalysis, WorkbookSummary};
use anomaly_correlation_service::services::DashboardService;
use anomaly_correlation_service::workbook::{read_grid_from_path, RawGrid, GRID_COLUMNS};

#[derive(Parser)]
#[command(name = "analyze-workbook")]
#[command(
    about = "Parse a province anomaly workbook and print per-province correlations",
    long_about = None
)]
struct Cli {
    /// Path to the .xlsx workbook
    file: PathBuf,

    /// Sheet holding the province blocks
    #[arg(long, env = "WORKBOOK_SHEET", default_value = DEFAULT_SHEET_NAME)]
    sheet: String,

    /// Label set for column headers: 'anomaly' or 'enso'
    #[arg(long, env = "METRIC_LABELS", default_value = "anomaly")]
    labels: LabelSet,

    /// JSON file replacing the built-in province coordinate table
    #[arg(long, env = "PROVINCE_COORDINATES_PATH")]
    coordinates: Option<PathBuf>,

    /// Also print the yearly series of this province
    #[arg(long)]
    province: Option<String>,

    /// Print the analysis as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Print the first N rows of the sheet before parsing (layout inspection)
    #[arg(long)]
    dump_rows: Option<usize>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: WorkbookSummary,
    correlations: &'a [CorrelationRow],
    #[serde(skip_serializing_if = "Option::is_none")]
    series: Option<ProvinceSeries>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let coordinates = match &cli.coordinates {
        Some(path) => CoordinateLookup::from_json_file(path)?,
        None => CoordinateLookup::builtin(),
    };

    info!("Reading sheet {} from {}", cli.sheet, cli.file.display());
    let grid = read_grid_from_path(&cli.file, &cli.sheet)?;

    if let Some(limit) = cli.dump_rows {
        print!("{}", render_rows(&grid, limit));
    }

    let service = DashboardService::new(coordinates, &cli.sheet, cli.labels, NonZeroUsize::MIN);
    let analysis = service.analyze_grid(cli.file.display().to_string(), &grid)?;

    let series = cli
        .province
        .as_deref()
        .map(|province| DashboardService::build_province_series(&analysis, province))
        .transpose()?;

    if cli.json {
        let report = JsonReport {
            summary: analysis.summary(),
            correlations: &analysis.correlations,
            series,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{}", render_table(&analysis, cli.labels));
    if let Some(series) = series {
        print!("{}", render_series(&series, cli.labels));
    }

    Ok(())
}

/// First `limit` grid rows, one bracketed cell per column
fn render_rows(grid: &RawGrid, limit: usize) -> String {
    let mut out = format!("First {limit} rows (showing first {GRID_COLUMNS} columns):\n");
    out.push_str(&format!("{}\n", "=".repeat(100)));
    for (row_idx, row) in grid.rows().enumerate().take(limit) {
        out.push_str(&format!("Row {:3}: ", row_idx + 1));
        for cell in row {
            if cell.is_empty() {
                out.push_str("[empty] ");
            } else {
                out.push_str(&format!("[{cell}] "));
            }
        }
        out.push('\n');
    }
    out.push_str(&format!("{}\n\n", "=".repeat(100)));
    out
}

/// Correlation table followed by the analysis notes
fn render_table(analysis: &WorkbookAnalysis, labels: LabelSet) -> String {
    let mut out = format!(
        "Sheet '{}': {} provinces, {} observations\n",
        analysis.sheet_name,
        analysis.correlations.len(),
        analysis.table.len()
    );
    out.push_str(&format!("{}\n", "=".repeat(100)));
    out.push_str(&format!("{:<28}", "Province"));
    for pair in MetricPair::ALL {
        out.push_str(&format!("{:>20}", short_title(labels, pair)));
    }
    out.push_str(&format!("{:>8}{:>8}\n", "Lon", "Lat"));
    out.push_str(&format!("{}\n", "-".repeat(100)));

    for row in &analysis.correlations {
        out.push_str(&format!("{:<28}", row.province));
        for pair in MetricPair::ALL {
            out.push_str(&format!("{:>20}", format_value(row.coefficient(pair), 3)));
        }
        out.push_str(&format!(
            "{:>8}{:>8}\n",
            format_value(row.longitude, 1),
            format_value(row.latitude, 1)
        ));
    }

    let diagnostics = analysis.diagnostics();
    if !diagnostics.is_empty() {
        out.push_str("\nNotes:\n");
        for diagnostic in &diagnostics {
            out.push_str(&format!("  - {}\n", diagnostic.message()));
        }
    }
    out
}

fn render_series(series: &ProvinceSeries, labels: LabelSet) -> String {
    let mut out = format!("\nSeries for {}:\n", series.province);
    out.push_str(&format!(
        "{:>6}{:>24}{:>24}{:>24}\n",
        "Year",
        labels.metric_label(Metric::Sst),
        labels.metric_label(Metric::Rainfall),
        labels.metric_label(Metric::Productivity),
    ));

    let years = series.sst.iter().zip(&series.rainfall).zip(&series.productivity);
    for ((sst, rain), prod) in years {
        out.push_str(&format!(
            "{:>6}{:>24}{:>24}{:>24}\n",
            sst.year,
            format_value(sst.value, 3),
            format_value(rain.value, 3),
            format_value(prod.value, 3)
        ));
    }
    out
}

/// Column header for a pair: "SST/Produktivitas" rather than the full map title
fn short_title(labels: LabelSet, pair: MetricPair) -> String {
    let title = labels.pair_title(pair).replace("Anomali ", "");
    title.replace(" vs ", "/")
}

fn format_value(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "n/a".to_string(),
    }
}

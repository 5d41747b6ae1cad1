use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use whiskey_studio::config::{AppConfig, ConfigOverrides};
use whiskey_studio::error::StudioError;
use whiskey_studio::export::{ExportFormat, ExportManager};
use whiskey_studio::mapping::{normalize_row, CanonicalField, ColumnMapping, Row};
use whiskey_studio::model::WhiskeyRecord;
use whiskey_studio::pipeline::{BatchItem, EnrichmentPipeline};

#[derive(Parser)]
#[command(name = "whiskey-studio")]
#[command(about = "Whiskey catalog enrichment and normalization")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(short, long, help = "Configuration file path")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich whiskey names from a CSV via web search and LLM analysis
    Enrich {
        #[arg(help = "Input CSV file")]
        input: PathBuf,

        #[arg(long, help = "Name column header (default: auto)")]
        column: Option<String>,

        #[arg(short, long, help = "Output file path")]
        output: Option<PathBuf>,

        #[arg(short, long, help = "Output format (json or csv)")]
        format: Option<String>,

        #[arg(long, help = "Delay between external calls in milliseconds")]
        delay_ms: Option<u64>,
    },

    /// Convert a raw CSV table into canonical catalog records, offline
    Convert {
        #[arg(help = "Input CSV file")]
        input: PathBuf,

        #[arg(short, long, help = "Output file path")]
        output: Option<PathBuf>,

        #[arg(short, long, help = "Output format (json or csv)")]
        format: Option<String>,

        #[arg(long = "map", help = "Pin a column mapping, e.g. --map name=商品名")]
        mappings: Vec<String>,
    },

    /// Write a sample input CSV for trying the tool out
    Sample {
        #[arg(help = "Output CSV path", default_value = "sample_drink_list.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if let Some(path) = &cli.config {
        AppConfig::load_from_file(path).await?
    } else {
        AppConfig::load().await?
    };
    ConfigOverrides::apply(&mut config);

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    let _guard = whiskey_studio::logging::init(&config.logging)?;

    info!("whiskey-studio v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Enrich {
            input,
            column,
            output,
            format,
            delay_ms,
        } => {
            if let Some(delay) = delay_ms {
                config.pipeline.inter_call_delay_ms = delay;
            }
            run_enrich(&config, &input, column, output, format).await?;
        }
        Commands::Convert {
            input,
            output,
            format,
            mappings,
        } => {
            run_convert(&config, &input, output, format, &mappings).await?;
        }
        Commands::Sample { output } => {
            write_sample(&output).await?;
        }
    }

    Ok(())
}

async fn run_enrich(
    config: &AppConfig,
    input: &Path,
    column: Option<String>,
    output: Option<PathBuf>,
    format: Option<String>,
) -> Result<()> {
    let (headers, rows) = read_csv(input).await?;

    let name_column = match column {
        Some(c) => {
            if !headers.contains(&c) {
                return Err(
                    StudioError::validation(format!("column '{c}' not found in input")).into(),
                );
            }
            c
        }
        None => default_name_column(&headers)?,
    };

    // Pick up a pre-existing tasting note column when one is present
    let mapping = ColumnMapping::auto_detect(&headers);
    let note_column = mapping.get(CanonicalField::TastingNote).map(str::to_string);

    let items: Vec<BatchItem> = rows
        .iter()
        .map(|row| BatchItem {
            name: cell_text(row, &name_column),
            tasting_note: note_column
                .as_deref()
                .map(|c| cell_text(row, c))
                .filter(|s| !s.is_empty()),
        })
        .collect();

    println!("Enriching {} items from {}", items.len(), input.display());

    let mut pipeline = EnrichmentPipeline::from_config(config)?;
    let report = pipeline
        .run_batch(&items, |progress| {
            println!(
                "[{}/{}] {}",
                progress.index + 1,
                progress.total,
                progress.summary()
            );
        })
        .await;

    let records: Vec<WhiskeyRecord> = report
        .records
        .into_iter()
        .enumerate()
        .map(|(i, analysis)| analysis.into_record(i + 1))
        .collect();

    println!(
        "Done: {} processed, {} successful, {} skipped, {} taste profiles",
        report.stats.processed,
        report.stats.successful,
        report.stats.skipped,
        report.stats.taste_profiles_generated
    );
    for error in &report.stats.errors {
        eprintln!("  {error}");
    }

    export_records(config, &records, output, format, input, "whiskey_catalog", true).await
}

async fn run_convert(
    config: &AppConfig,
    input: &Path,
    output: Option<PathBuf>,
    format: Option<String>,
    overrides: &[String],
) -> Result<()> {
    let (headers, rows) = read_csv(input).await?;

    let mut mapping = ColumnMapping::auto_detect(&headers);
    for entry in overrides {
        let (field_name, column) = entry.split_once('=').ok_or_else(|| {
            StudioError::validation(format!("mapping '{entry}' must look like field=Column"))
        })?;
        let field = parse_field(field_name)?;
        if !headers.iter().any(|h| h == column) {
            return Err(
                StudioError::validation(format!("column '{column}' not found in input")).into(),
            );
        }
        mapping.set(field, column);
    }

    for required in [CanonicalField::Id, CanonicalField::Name] {
        if !mapping.is_mapped(required) {
            return Err(StudioError::validation(format!(
                "no column mapped to required field '{}'",
                required.as_str()
            ))
            .into());
        }
    }

    let records: Vec<WhiskeyRecord> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| normalize_row(row, &mapping, i + 1))
        .collect();

    println!(
        "Converted {} of {} rows from {}",
        records.len(),
        rows.len(),
        input.display()
    );

    // Real profiles only come from a mapped taste column; otherwise every
    // record carries the default and the document must say so.
    let has_profiles = mapping.is_mapped(CanonicalField::TasteProfile);
    export_records(
        config,
        &records,
        output,
        format,
        input,
        "whiskey_catalog",
        has_profiles,
    )
    .await
}

async fn export_records(
    config: &AppConfig,
    records: &[WhiskeyRecord],
    output: Option<PathBuf>,
    format: Option<String>,
    input: &Path,
    stem: &str,
    includes_taste_profile: bool,
) -> Result<()> {
    let format = format
        .unwrap_or_else(|| config.export.default_format.clone())
        .parse::<ExportFormat>()?;
    let source_file = input.file_name().and_then(|n| n.to_str());

    let manager = ExportManager::new(&config.export).await?;
    let written = match output {
        Some(path) => {
            manager
                .export_to_path(records, &path, format, source_file, includes_taste_profile)
                .await?;
            path
        }
        None => {
            manager
                .export(records, stem, format, source_file, includes_taste_profile)
                .await?
        }
    };

    println!("Wrote {} records to {}", records.len(), written.display());
    Ok(())
}

/// Read a CSV into its header row and string-valued rows
async fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Row>)> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        StudioError::validation(format!("cannot read input {}: {e}", path.display()))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row = Row::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            row.insert(
                header.clone(),
                serde_json::Value::String(cell.to_string()),
            );
        }
        rows.push(row);
    }

    Ok((headers, rows))
}

/// Menu-style sheets carry an id in the first column and names in the
/// second; a single-column file is just a name list.
fn default_name_column(headers: &[String]) -> Result<String> {
    headers
        .get(usize::from(headers.len() > 1))
        .cloned()
        .ok_or_else(|| StudioError::validation("input has no columns").into())
}

fn cell_text(row: &Row, column: &str) -> String {
    row.get(column)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn parse_field(name: &str) -> Result<CanonicalField> {
    CanonicalField::ALL
        .into_iter()
        .find(|f| f.as_str().eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| StudioError::validation(format!("unknown field '{name}'")).into())
}

const SAMPLE_CSV: &str = "\
番号,ウィスキー名,価格,テイスティングノート
1,山崎 12年,12000,蜂蜜と柑橘のやわらかな香り
2,マッカラン 12年 シェリーオーク,15000,シェリーとドライフルーツの濃厚な甘み
3,ラフロイグ 10年,8000,強烈なピートとヨードの個性
4,ジェムソン スタンダード,3500,軽快でスムーズなブレンド
5,メーカーズマーク,4200,バニラとキャラメルの甘い余韻
";

async fn write_sample(path: &Path) -> Result<()> {
    tokio::fs::write(path, SAMPLE_CSV).await?;
    println!("Sample input written to {}", path.display());
    Ok(())
}

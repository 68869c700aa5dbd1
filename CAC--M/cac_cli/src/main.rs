use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use cac_alignment::{
    render, sample, AlignmentTelemetry, AnalyzerConfig, BloomClassifier, ReportFormat,
    SyllabusAnalyzer, SyllabusTable,
};
use clap::{Parser, Subcommand};
use serde_json::json;
use shared_logging::LogLevel;

#[derive(Parser, Debug)]
#[command(name = "cac", version, about = "Constructive alignment checker for course syllabi")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyses a JSON syllabus table.
    Analyze(AnalyzeArgs),
    /// Analyses the built-in sample syllabus.
    Demo {
        /// `text` or `json`.
        #[arg(long, default_value = "text")]
        format: String,
        /// Appends JSON-lines telemetry to this file.
        #[arg(long)]
        log_path: Option<PathBuf>,
    },
    /// Lists the Bloom verbs and levels found in a text.
    Classify {
        /// Text to classify.
        text: String,
    },
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    /// JSON table: array of objects, or `{ "columns": [...], "records": [...] }`.
    #[arg(long)]
    input: PathBuf,
    /// TOML analyzer configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `semantic_threshold` from the configuration.
    #[arg(long)]
    threshold: Option<f64>,
    /// `text` or `json`.
    #[arg(long, default_value = "text")]
    format: String,
    /// Writes the report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Appends JSON-lines telemetry to this file.
    #[arg(long)]
    log_path: Option<PathBuf>,
    /// Minimum telemetry level: `debug`, `info`, `warn` or `error`.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::Demo { format, log_path } => {
            print!("{}", run_demo(&format, log_path.as_deref())?);
            Ok(())
        }
        Commands::Classify { text } => {
            for line in run_classify(&text) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.threshold)?;
    let format = parse_format(&args.format)?;
    let level = LogLevel::parse(&args.log_level)
        .with_context(|| format!("unknown log level {:?}", args.log_level))?;
    let telemetry = build_telemetry(args.log_path.as_deref(), level)?;

    let table = read_table(&args.input)?;
    let analyzer = SyllabusAnalyzer::new(config, telemetry.clone());
    let report = analyzer
        .analyze_table(&table)
        .with_context(|| format!("analysing {}", args.input.display()))?;
    let rendered = render(&report, format)?;
    if let Some(path) = &args.output {
        fs::write(path, &rendered).with_context(|| format!("writing {}", path.display()))?;
        if let Some(tel) = &telemetry {
            let _ = tel.log(
                LogLevel::Info,
                "cac.report.written",
                json!({ "path": path, "rows": report.summary.total_entries }),
            );
        }
    } else {
        print!("{rendered}");
    }
    Ok(())
}

fn run_demo(format: &str, log_path: Option<&Path>) -> Result<String> {
    let format = parse_format(format)?;
    let telemetry = build_telemetry(log_path, LogLevel::Info)?;
    let analyzer = SyllabusAnalyzer::new(AnalyzerConfig::default(), telemetry);
    let report = analyzer.analyze_table(&sample::sample_table())?;
    Ok(render(&report, format)?)
}

fn run_classify(text: &str) -> Vec<String> {
    let classifier = BloomClassifier::new();
    let verbs = classifier.extract_verbs(text);
    let mut lines = Vec::with_capacity(verbs.len() + 2);
    if verbs.is_empty() {
        lines.push("no Bloom verbs detected".to_string());
    }
    lines.extend(verbs.iter().map(|(verb, level)| format!("{verb}\t{level}")));
    lines.push(format!("levels: {}", classifier.classify(text).joined()));
    lines
}

fn load_config(path: Option<&Path>, threshold: Option<f64>) -> Result<AnalyzerConfig> {
    let mut config = match path {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::default(),
    };
    if let Some(threshold) = threshold {
        config.semantic_threshold = threshold;
        config.validate().context("invalid --threshold")?;
    }
    Ok(config)
}

fn parse_format(raw: &str) -> Result<ReportFormat> {
    match ReportFormat::parse(raw) {
        Some(format) => Ok(format),
        None => bail!("unsupported format {raw:?}; expected `text` or `json`"),
    }
}

fn build_telemetry(log_path: Option<&Path>, level: LogLevel) -> Result<Option<AlignmentTelemetry>> {
    let Some(path) = log_path else {
        return Ok(None);
    };
    let telemetry = AlignmentTelemetry::builder("cac")
        .log_path(path)
        .min_level(level)
        .build()
        .with_context(|| format!("opening log {}", path.display()))?;
    Ok(Some(telemetry))
}

fn read_table(path: &Path) -> Result<SyllabusTable> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("reading table {}", path.display()))?;
    SyllabusTable::from_json_str(&raw).with_context(|| format!("parsing table {}", path.display()))
}

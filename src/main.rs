use anyhow::{bail, Context, Result};
use clap::Parser;
use numrepro::aggregate::{aggregate_view, AggregateOptions};
use numrepro::cli::{AggregateArgs, Cli, Commands, OutputFormat, ProcessArgs, SeriesArgs};
use numrepro::config::{AnalysisConfig, SuiteConfig};
use numrepro::csv_output::CsvOutput;
use numrepro::json_output::{self, JsonAggregate, JsonFilter, JsonRawRun, JsonRun, JsonSeries};
use numrepro::labels::{unix_now, RunLabeler};
use numrepro::probes::{warnings_report, SampleSetBuilder};
use numrepro::run_stats::StatisticsComputer;
use numrepro::store::RunMetadata;
use numrepro::text_output;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` forces TRACE, otherwise RUST_LOG (default warn)
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Write `content` to `output`, or stdout when no file is given
fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{content}"),
    }
    Ok(())
}

fn with_newline(mut json: String) -> String {
    json.push('\n');
    json
}

fn run_process(args: ProcessArgs, analysis: &AnalysisConfig) -> Result<()> {
    let suite = SuiteConfig::from_file(&args.config)?;
    let executions = suite.executions();
    info!(
        "Reading {} probe dumps from {}",
        executions.len(),
        args.probes_dir.display()
    );

    let mut builder = SampleSetBuilder::new();
    for execution in &executions {
        builder.add_probe_file(execution, &execution.probe_file(&args.probes_dir));
    }
    let (samples, warnings) = builder.finish();

    if !warnings.is_empty() {
        eprint!("{}", warnings_report(&warnings));
    }
    if samples.is_empty() {
        bail!("No data have been generated by your tests executions");
    }

    let timestamp = args.timestamp.unwrap_or_else(unix_now);
    let metadata = match args.hash {
        Some(hash) => RunMetadata::commit(
            timestamp,
            hash,
            args.author.unwrap_or_default(),
            args.message.unwrap_or_default(),
        ),
        None => RunMetadata::untracked(timestamp),
    };

    if let Some(path) = &args.export_raw {
        let raw = JsonRawRun::new(&metadata, &samples).to_json()?;
        emit(&with_newline(raw), Some(path))?;
        info!("Raw samples exported to {}", path.display());
    }

    let computer = StatisticsComputer::from_config(analysis);
    let run = computer.process_run(&samples, metadata);
    info!(
        "Computed {} sample sets ({} samples)",
        run.statistics.len(),
        samples.sample_count()
    );

    let content = match args.format {
        OutputFormat::Json => with_newline(JsonRun::new(&run, &warnings).to_json()?),
        OutputFormat::Csv => CsvOutput::statistics(&run.statistics).to_csv(),
        OutputFormat::Text => text_output::run_report(&run),
    };
    emit(&content, args.output.as_deref())
}

fn run_aggregate(args: AggregateArgs, analysis: &AnalysisConfig) -> Result<()> {
    let store = json_output::load_store(&args.runs)?;
    let Some(run) = args.run.or_else(|| store.latest()) else {
        bail!("No runs loaded");
    };

    let mut options = AggregateOptions::from(analysis);
    if args.keep_outliers {
        options.remove_outliers = false;
    }

    let filter = args.filter;
    let groups = aggregate_view(
        &store,
        run,
        filter.dimension,
        &filter.value,
        args.group_by,
        &options,
    )?;
    if groups.is_empty() {
        warn!("No rows of run {} match {}={}", run, filter.dimension, filter.value);
    }

    let content = match args.format {
        OutputFormat::Json => {
            let document = JsonAggregate::new(
                run,
                JsonFilter {
                    dimension: filter.dimension,
                    value: filter.value,
                },
                args.group_by,
                options.remove_outliers,
                groups,
            );
            with_newline(document.to_json()?)
        }
        OutputFormat::Csv => CsvOutput::groups(&groups).to_csv(),
        OutputFormat::Text => text_output::groups_report(&groups),
    };
    emit(&content, None)
}

fn run_series(args: SeriesArgs, analysis: &AnalysisConfig) -> Result<()> {
    let now = unix_now();
    let store = json_output::load_store_at(&args.runs, now)?;
    let key = args.key();
    let zscore = args.remove_outliers.then_some(analysis.outlier_zscore);

    let mut labeler = RunLabeler::new();
    let points = store.run_series(&key, args.last, zscore, &mut labeler, now);
    if points.is_empty() {
        warn!("No stored run holds {}", key);
    }

    let content = match args.format {
        OutputFormat::Json => with_newline(JsonSeries::new(key, points).to_json()?),
        OutputFormat::Csv => CsvOutput::series(&points).to_csv(),
        OutputFormat::Text => text_output::series_report(&points),
    };
    emit(&content, None)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let analysis = AnalysisConfig::load(args.analysis_config.as_deref())?;

    match args.command {
        Commands::Process(process) => run_process(process, &analysis),
        Commands::Aggregate(aggregate) => run_aggregate(aggregate, &analysis),
        Commands::Series(series) => run_series(series, &analysis),
    }
}

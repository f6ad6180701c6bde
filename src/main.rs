//! datashear CLI: split CSV files by row count, byte size or number of files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use datashear::{
    EmptyDataPolicy, FileNameTemplate, MemoryReporter, MetricsCollector, SplitOptions, Splitter,
    expand_inputs,
};

#[derive(Parser, Debug)]
#[command(
    name = "datashear",
    version,
    about = "Split CSV files into multiple smaller files",
    after_help = "Examples:
  # 1000 data rows per file
  datashear input.csv -r 1000

  # at most 10 MB per file, header only in the first part
  datashear input.csv -s 10000000 --no-header

  # 5 files of about equal row counts into out/, named data_input_part_N.csv
  datashear input.csv -n 5 -o out/ -p data

  # every CSV in a directory, gzip included
  datashear 'exports/*.csv*' -r 50000"
)]
struct Cli {
    /// Input CSV file, or a glob pattern matching several
    input: String,

    #[command(flatten)]
    mode: Mode,

    /// Output directory (created if missing)
    #[arg(short = 'o', long, default_value = ".")]
    output_dir: PathBuf,

    /// Prefix for output file names
    #[arg(short = 'p', long, default_value = "")]
    prefix: String,

    /// Base name for output files (default: input file stem)
    #[arg(long)]
    base: Option<String>,

    /// Suffix placed before the part number
    #[arg(long, default_value = datashear::naming::DEFAULT_SUFFIX)]
    suffix: String,

    /// Only write the header to the first output file
    #[arg(long)]
    no_header: bool,

    /// Write a header-only file when the input has no data rows
    #[arg(long)]
    header_only_file: bool,

    /// Field delimiter for input and output
    #[arg(short = 'd', long)]
    delimiter: Option<char>,

    /// JSON file with split options (dialect, repeat_header, empty_data)
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Write split metrics as JSON to this file
    #[arg(long, value_name = "JSON")]
    metrics_out: Option<PathBuf>,

    /// Log process memory usage after each output file
    #[arg(long)]
    memory: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Mode {
    /// Number of data rows per output file
    #[arg(short = 'r', long = "rows", allow_negative_numbers = true)]
    rows: Option<i64>,

    /// Maximum size of each output file in bytes
    #[arg(short = 's', long = "size", value_name = "BYTES", allow_negative_numbers = true)]
    size: Option<i64>,

    /// Number of output files to create
    #[arg(short = 'n', long = "num-files", allow_negative_numbers = true)]
    files: Option<i64>,
}

impl Mode {
    fn split(&self, splitter: Splitter, repeat_header: bool) -> Result<Vec<PathBuf>> {
        let parts = match (self.rows, self.size, self.files) {
            (Some(rows), _, _) => splitter.by_rows(rows, repeat_header)?,
            (_, Some(bytes), _) => splitter.by_size(bytes, repeat_header)?,
            (_, _, Some(files)) => splitter.by_file_count(files, repeat_header)?,
            (None, None, None) => bail!("one of --rows, --size or --num-files is required"),
        };
        Ok(parts)
    }
}

fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_options(cli: &Cli) -> Result<SplitOptions> {
    let mut options = match &cli.config {
        Some(path) => SplitOptions::from_json_file(path)?,
        None => SplitOptions::default(),
    };
    if let Some(delimiter) = cli.delimiter {
        options.dialect = options.dialect.with_delimiter(delimiter);
    }
    if cli.header_only_file {
        options.empty_data = EmptyDataPolicy::HeaderOnlyFile;
    }
    if cli.no_header {
        options.repeat_header = false;
    }
    Ok(options)
}

fn split_one(
    cli: &Cli,
    input: &Path,
    options: &SplitOptions,
    metrics: Option<&MetricsCollector>,
) -> Result<Vec<PathBuf>> {
    let mut splitter = Splitter::new(input, &cli.output_dir)?
        .with_prefix(cli.prefix.as_str())
        .with_suffix(cli.suffix.as_str())
        .with_options(options.clone());
    if let Some(base) = &cli.base {
        splitter = splitter.with_base_name(base.as_str());
    }
    if cli.memory {
        splitter = splitter.with_observer(MemoryReporter::new());
    }
    if let Some(metrics) = metrics {
        splitter = splitter.with_observer(metrics.clone());
    }
    cli.mode.split(splitter, options.repeat_header)
}

/// Every input writes into the same output directory, so two inputs whose
/// parts would share a name must be rejected before anything is written.
fn check_distinct_outputs(cli: &Cli, inputs: &[PathBuf]) -> Result<()> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    for input in inputs {
        let mut names = FileNameTemplate::for_input(input, &cli.output_dir)
            .with_prefix(cli.prefix.as_str())
            .with_suffix(cli.suffix.as_str());
        if let Some(base) = &cli.base {
            names = names.with_base_name(base.as_str());
        }
        let first = names.file_name(1);
        if let Some(other) = seen.insert(first.clone(), input) {
            bail!(
                "{} and {} would both write {first} into {}; split them into separate output directories",
                other.display(),
                input.display(),
                cli.output_dir.display()
            );
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let options = load_options(cli)?;
    debug!(?options, "resolved split options");

    let inputs = expand_inputs(&cli.input)?;
    if inputs.len() > 1 {
        info!("Splitting {} files matching {}", inputs.len(), cli.input);
    }

    check_distinct_outputs(cli, &inputs)?;

    let metrics = cli.metrics_out.as_ref().map(|_| MetricsCollector::new());
    for input in &inputs {
        let parts = split_one(cli, input, &options, metrics.as_ref())
            .with_context(|| format!("failed to split {}", input.display()))?;
        println!("Successfully split {} into {} files:", input.display(), parts.len());
        for part in &parts {
            println!("  - {}", part.display());
        }
    }

    if let (Some(path), Some(metrics)) = (&cli.metrics_out, &metrics) {
        metrics
            .save_to_file(path)
            .with_context(|| format!("write metrics to {}", path.display()))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

use std::fs::File;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use genome_fromfile::app::{App, Inputs, RunOptions, RunSummary};
use genome_fromfile::config::{ConfigLoader, ResolvedConfig};
use genome_fromfile::domain::{IdentMode, Moltype};
use genome_fromfile::error::FromfileError;
use genome_fromfile::output::{
    DiscardRecords, JsonOutput, LogProgress, OutputMode, RecordSink, RecordWriter,
};
use genome_fromfile::picklist::{InclusionFilter, Picklist, PicklistSpec};
use genome_fromfile::report::{AnomalyKind, ErrorReporter};
use genome_fromfile::taxonomy::{LineageDb, NameResolver};

#[derive(Parser)]
#[command(name = "genome-fromfile")]
#[command(about = "Consolidate genome/protein files into per-accession fromfile CSV records")]
#[command(version, author)]
struct Cli {
    /// Narrate every file as it is merged or skipped.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the run summary as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Identify files by accession filename and name them from taxonomy")]
    Genbank(GenbankArgs),
    #[command(about = "Identify files by their first sequence header or by filename")]
    Fasta(FastaArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Genome (.fna[.gz]) and protein (.faa[.gz]) files to consolidate.
    filenames: Vec<String>,

    /// Text file with one filename per line; may be repeated.
    #[arg(short = 'F', long = "file-list")]
    file_list: Vec<Utf8PathBuf>,

    #[arg(short = 'o', long = "output-csv")]
    output_csv: Utf8PathBuf,

    /// Fail the run when any genome or protein counterpart is missing.
    #[arg(long)]
    strict: bool,

    /// Defaults to <output-csv>.error-report.txt
    #[arg(short = 'R', long = "report-errors-to")]
    report_errors_to: Option<Utf8PathBuf>,

    /// FILE:COLUMN:KIND[:STYLE] with KIND ident|identprefix and STYLE include|exclude.
    #[arg(long)]
    picklist: Option<String>,

    /// Slot for files whose extension names neither a genome nor a protein.
    #[arg(long, value_enum)]
    default_moltype: Option<Moltype>,

    /// Run every check and write the error report, but not the output CSV.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct GenbankArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(short = 't', long = "taxonomy-db")]
    taxonomy_db: Vec<Utf8PathBuf>,

    /// Name records "<ident> <taxon>" rather than just "<taxon>".
    #[arg(long)]
    ident_in_name: bool,
}

#[derive(Args)]
struct FastaArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Determine identifiers from filename prefixes instead of sequence headers.
    #[arg(long)]
    ident_from_filename: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(summary) if summary.failed() => ExitCode::from(3),
        Ok(_) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(error) = report.downcast_ref::<FromfileError>() {
                return ExitCode::from(map_exit_code(error));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &FromfileError) -> u8 {
    if error.is_config() { 2 } else { 1 }
}

fn run() -> miette::Result<RunSummary> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Genbank(args) => {
            let mut taxonomy_db = config.taxonomy_db.clone();
            taxonomy_db.extend(args.taxonomy_db);
            if taxonomy_db.is_empty() {
                return Err(FromfileError::MissingTaxonomy.into());
            }
            let lineages = LineageDb::load(&taxonomy_db)?;
            let options = RunOptions {
                mode: IdentMode::Accession,
                ident_in_name: args.ident_in_name || config.ident_in_name,
                ..run_options(&args.common, &config)
            };
            run_pipeline(lineages, args.common, config, options, output_mode)
        }
        Commands::Fasta(args) => {
            let options = RunOptions {
                mode: if args.ident_from_filename {
                    IdentMode::FilenameStem
                } else {
                    IdentMode::Header
                },
                ..run_options(&args.common, &config)
            };
            run_pipeline(NopResolver, args.common, config, options, output_mode)
        }
    }
}

fn run_options(args: &CommonArgs, config: &ResolvedConfig) -> RunOptions {
    RunOptions {
        strict: args.strict || config.strict,
        default_moltype: args.default_moltype.or(config.default_moltype),
        dry_run: args.dry_run,
        ..RunOptions::default()
    }
}

fn run_pipeline<R: NameResolver>(
    resolver: R,
    args: CommonArgs,
    config: ResolvedConfig,
    options: RunOptions,
    output_mode: OutputMode,
) -> miette::Result<RunSummary> {
    let picklist_spec = match args.picklist.as_deref() {
        Some(value) => Some(value.parse::<PicklistSpec>()?),
        None => config.picklist,
    };
    let picklist = picklist_spec.as_ref().map(Picklist::load).transpose()?;

    let report_path = args
        .report_errors_to
        .or(config.report_errors_to)
        .unwrap_or_else(|| Utf8PathBuf::from(format!("{}.error-report.txt", args.output_csv)));
    let report_file = File::create(report_path.as_std_path()).into_diagnostic()?;
    let mut reporter = ErrorReporter::new(Box::new(report_file));

    let mut output: Box<dyn RecordSink> = if options.dry_run {
        Box::new(DiscardRecords)
    } else {
        Box::new(RecordWriter::create(&args.output_csv)?)
    };

    let inputs = Inputs {
        filenames: args.filenames,
        file_lists: args.file_list,
    };

    let mut app = App::new(resolver, InclusionFilter::new(picklist), options);
    let summary = app.run(&inputs, output.as_mut(), &mut reporter, &LogProgress)?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_summary(&summary).into_diagnostic()?,
        OutputMode::Human => print_summary(&summary, &args.output_csv, &report_path),
    }
    if summary.failed() {
        info!("strict mode: recoverable anomalies fail this run");
    }
    Ok(summary)
}

fn print_summary(summary: &RunSummary, output_csv: &Utf8PathBuf, report_path: &Utf8PathBuf) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let red = "\x1b[31m";
    let reset = "\x1b[0m";

    println!("{cyan}---{reset}");
    println!("{green}processed {} files{reset}", summary.processed);
    if summary.dry_run {
        println!(
            "{yellow}dry run: would have written {} entries to '{output_csv}'{reset}",
            summary.emitted
        );
    } else {
        println!(
            "{green}wrote {} entries to '{output_csv}'{reset}",
            summary.written
        );
    }
    if summary.skipped_by_picklist > 0 {
        println!(
            "{yellow}skipped {} files not selected by picklist{reset}",
            summary.skipped_by_picklist
        );
    }

    let total = summary.anomalies.values().sum::<usize>();
    let color = if summary.failed() {
        red
    } else if total > 0 {
        yellow
    } else {
        green
    };
    println!("{color}anomalies: {total} (see '{report_path}'){reset}");
    for kind in AnomalyKind::ALL {
        let count = summary.anomaly_count(kind);
        if count > 0 {
            println!("{color}   {kind}: {count}{reset}");
        }
    }
}

/// `fasta` runs derive names themselves and never consult taxonomy.
struct NopResolver;

impl NameResolver for NopResolver {
    fn resolve(&self, identprefix: &str) -> Result<String, FromfileError> {
        Err(FromfileError::UnresolvedName(identprefix.to_string()))
    }
}

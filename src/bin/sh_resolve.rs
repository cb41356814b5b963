use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use unite_sh::app::{App, MatchOptions, ProgressEvent, ProgressSink};
use unite_sh::config::{ConfigLoader, Overrides, Settings};
use unite_sh::domain::InputFormat;
use unite_sh::error::ShError;
use unite_sh::input::load_identifiers;
use unite_sh::output::{JsonOutput, create_output, ensure_absent, write_taxon_dump};
use unite_sh::plutof::PlutofHttpClient;

#[derive(Parser)]
#[command(name = "sh-resolve")]
#[command(about = "Resolve sequences to UNITE Species Hypotheses and SHs to their taxonomy via PlutoF")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true, help = "Print the run summary as JSON on stdout")]
    json: bool,

    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Match sequences to their SH at a given identity threshold")]
    Match(MatchArgs),
    #[command(about = "Find kingdom..species taxonomy for a list of SHs")]
    Taxonomy(TaxonomyArgs),
}

#[derive(Args)]
struct MatchArgs {
    #[arg(short, long, help = "Fasta file (UNITE general release headers) or accession list")]
    input: Utf8PathBuf,

    #[arg(short, long, default_value = "seq2SH.tsv")]
    output: Utf8PathBuf,

    #[arg(short = 'c', long, help = "SH identity threshold [default: 1.5]")]
    threshold: Option<String>,

    #[arg(short = 'v', long = "sh-version", help = "SH version [default: 8]")]
    sh_version: Option<String>,

    #[arg(long, value_enum, default_value_t = InputFormat::Fasta)]
    input_format: InputFormat,

    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct TaxonomyArgs {
    #[arg(short, long, help = "Text file with one SH per line")]
    input: Utf8PathBuf,

    #[arg(short, long, default_value = "SHtax.tsv")]
    output: Utf8PathBuf,

    #[arg(short = 's', long, help = "Also write every visited taxon as id/rank/name")]
    taxa: Option<Utf8PathBuf>,

    #[arg(long)]
    force: bool,
}

struct LogProgress;

impl ProgressSink for LogProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => info!("{} [{:.1}s]", event.message, elapsed.as_secs_f64()),
            None => info!("{}", event.message),
        }
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<ShError>() {
            return ExitCode::from(error.exit_code());
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Match(args) => {
            let overrides = Overrides {
                threshold: args.threshold.clone(),
                version: args.sh_version.clone(),
            };
            let settings = ConfigLoader::resolve(cli.config.as_deref(), overrides)?;
            run_match(args, settings, cli.json)
        }
        Commands::Taxonomy(args) => {
            let settings = ConfigLoader::resolve(cli.config.as_deref(), Overrides::default())?;
            run_taxonomy(args, settings, cli.json)
        }
    }
}

fn build_app(settings: &Settings) -> Result<App<PlutofHttpClient>, ShError> {
    let client =
        PlutofHttpClient::new(&settings.api_url, settings.timeout, settings.max_retries)?;
    Ok(App::new(client))
}

fn run_match(args: MatchArgs, settings: Settings, json: bool) -> miette::Result<()> {
    let names = load_identifiers(args.input.as_std_path(), args.input_format)?;
    let mut out = create_output(args.output.as_std_path(), args.force)?;
    let app = build_app(&settings)?;
    let options = MatchOptions {
        threshold: settings.threshold,
        version: settings.version,
    };

    let summary = app.match_sequences(&names, &options, &mut out, &LogProgress)?;
    if json {
        JsonOutput::print_match(&summary).into_diagnostic()?;
    } else {
        eprintln!(
            "{} sequences: {} resolved, {} not found, {} ambiguous -> {}",
            summary.processed, summary.resolved, summary.not_found, summary.ambiguous, args.output
        );
    }
    Ok(())
}

fn run_taxonomy(args: TaxonomyArgs, settings: Settings, json: bool) -> miette::Result<()> {
    let lines = load_identifiers(args.input.as_std_path(), InputFormat::List)?;
    if let Some(taxa) = &args.taxa {
        ensure_absent(taxa.as_std_path(), args.force)?;
    }
    let mut out = create_output(args.output.as_std_path(), args.force)?;
    let app = build_app(&settings)?;

    let run = app.sh_taxonomy(&lines, &mut out, &LogProgress)?;
    if let Some(taxa) = &args.taxa {
        let mut taxa_out = create_output(taxa.as_std_path(), args.force)?;
        write_taxon_dump(&mut taxa_out, &run.cache)?;
    }

    if json {
        JsonOutput::print_taxonomy(&run.summary).into_diagnostic()?;
    } else {
        eprintln!(
            "{} SHs: {} with taxonomy, {} without, {} invalid names, {} taxa visited -> {}",
            run.summary.processed,
            run.summary.with_taxonomy,
            run.summary.missing_taxonomy,
            run.summary.invalid_names,
            run.summary.taxa_visited,
            args.output
        );
    }
    Ok(())
}

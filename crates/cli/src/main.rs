// creddedupe CLI - deduplicate password-manager CSV exports

mod exit_codes;
mod prompt;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use creddedupe_config::{MergeMode, Settings};
use creddedupe_engine::{
    choose_provider, detect_format, run, DedupeSummary, MergeDecision, ProviderAdapter, ProviderChoice,
    ProviderFormat, ProviderRegistry, Record, Resolution,
};
use creddedupe_io::{
    build_audit_report, builtin_registry, import_records, read_csv, write_audit_report, write_records, IoError,
};

use exit_codes::{EXIT_BAD_INPUT, EXIT_ERROR, EXIT_SUCCESS, EXIT_UNDETECTED, EXIT_USAGE, EXIT_WRITE};
use prompt::Prompter;

/// Log filter, in `EnvFilter` syntax.
const LOG_ENV: &str = "CREDDEDUPE_LOG";

#[derive(Parser)]
#[command(name = "creddedupe")]
#[command(about = "Find and merge duplicate entries in password-manager CSV exports")]
#[command(version)]
struct Cli {
    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove exact duplicates and resolve near duplicates
    #[command(after_help = "\
Examples:
  creddedupe dedupe -i proton.csv -o clean.csv
  creddedupe dedupe -i export.csv -o clean.csv --input-provider lastpass --auto-merge
  creddedupe dedupe -i chrome.csv -o bitwarden.csv --output-provider bitwarden --audit-log audit.json
  creddedupe dedupe -i export.csv -o clean.csv --no-interactive-merge --json")]
    Dedupe(DedupeArgs),

    /// Report which provider format a CSV export matches
    Detect {
        /// CSV export to inspect
        input: PathBuf,

        /// Print the detection result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported provider formats
    Providers {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct DedupeArgs {
    /// Input CSV export
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Output CSV
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Input format, or `auto` to detect it from the header row
    #[arg(long, default_value = "auto")]
    input_provider: String,

    /// Output format (default: settings file, then the input format)
    #[arg(long)]
    output_provider: Option<String>,

    /// Keep the recommended entry of every near-duplicate group without asking
    #[arg(long, conflicts_with = "no_interactive_merge")]
    auto_merge: bool,

    /// Leave every near-duplicate group as it is without asking
    #[arg(long)]
    no_interactive_merge: bool,

    /// Write a JSON audit log (identifiers and counts only) to PATH
    #[arg(long, value_name = "PATH")]
    audit_log: Option<PathBuf>,

    /// Do not treat an entry's email as its username when the username is empty
    #[arg(long)]
    no_email_username_equivalence: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "creddedupe=info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let result = match cli.command {
        Commands::Dedupe(args) => cmd_dedupe(args),
        Commands::Detect { input, json } => cmd_detect(&input, json),
        Commands::Providers { json } => cmd_providers(json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn undetected(msg: impl Into<String>) -> Self {
        Self { code: EXIT_UNDETECTED, message: msg.into(), hint: None }
    }

    pub fn write(msg: impl Into<String>) -> Self {
        Self { code: EXIT_WRITE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let code = match &err {
            IoError::Read { .. } | IoError::Csv(_) | IoError::NoHeaders | IoError::MissingColumns { .. } => {
                EXIT_BAD_INPUT
            }
            IoError::Write { .. } => EXIT_WRITE,
            IoError::Engine(_) | IoError::Json(_) => EXIT_ERROR,
        };
        let hint = match &err {
            IoError::MissingColumns { .. } => {
                Some("pick the right format with --input-provider; see `creddedupe providers`".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}

const PROVIDERS_HINT: &str = "run `creddedupe providers` for the list of formats";

fn registry() -> Result<ProviderRegistry, CliError> {
    builtin_registry().map_err(|e| CliError::general(e.to_string()))
}

fn adapter(registry: &ProviderRegistry, format: ProviderFormat) -> Result<&dyn ProviderAdapter, CliError> {
    registry
        .get(format)
        .ok_or_else(|| CliError::usage(format!("no adapter registered for {format}")))
}

fn parse_provider(name: &str, registry: &ProviderRegistry) -> Result<ProviderFormat, CliError> {
    let format: ProviderFormat = name
        .parse()
        .map_err(|e: creddedupe_engine::EngineError| CliError::usage(e.to_string()).with_hint(PROVIDERS_HINT))?;
    adapter(registry, format)?;
    Ok(format)
}

// ============================================================================
// dedupe
// ============================================================================

fn cmd_dedupe(args: DedupeArgs) -> Result<(), CliError> {
    let settings = Settings::load();
    let registry = registry()?;

    let mode = if args.auto_merge {
        MergeMode::Auto
    } else if args.no_interactive_merge {
        MergeMode::Keep
    } else {
        settings.merge_mode
    };
    let interactive = mode == MergeMode::Interactive;

    let requested_output = match args.output_provider.as_deref() {
        Some(name) => Some(parse_provider(name, &registry)?),
        None => settings.output_provider,
    };

    let table = read_csv(&args.input)?;
    let input_format = resolve_input_format(
        &table.headers,
        &registry,
        &args.input_provider,
        settings.confirm_threshold,
        interactive,
    )?;
    let output_format = requested_output.unwrap_or(input_format);

    let records = import_records(&table, adapter(&registry, input_format)?)?;
    info!(provider = %input_format, records = records.len(), "imported");

    let mut options = settings.to_dedupe_options();
    if args.no_email_username_equivalence {
        options.treat_email_as_username = false;
    }

    let output = match mode {
        MergeMode::Auto => run(records, &options, Resolution::Auto),
        MergeMode::Keep => run(records, &options, Resolution::KeepAll),
        MergeMode::Interactive => {
            let stdin = io::stdin();
            let mut prompter = Prompter::new(stdin.lock(), io::stderr());
            let mut decide = |group_index: usize, group: &[Record]| {
                prompter.decide(group_index, group).unwrap_or_else(|e| {
                    warn!(group = group_index, error = %e, "cannot read answer; skipping group");
                    MergeDecision::Skip
                })
            };
            run(records, &options, Resolution::Directed(&mut decide))
        }
    };

    write_records(&args.output, &output.final_records, adapter(&registry, output_format)?)?;

    if let Some(path) = &args.audit_log {
        let report = build_audit_report(output.audit.into_entries(), &args.input, &args.output)
            .map_err(|e| CliError::write(format!("cannot build audit log: {e}")))?;
        write_audit_report(path, &report)?;
    }

    if !output.outcome.untouched_groups.is_empty() && mode != MergeMode::Keep {
        warn!(
            groups = output.outcome.untouched_groups.len(),
            "near-duplicate groups left unresolved; run again to review them"
        );
    }

    print_summary(&output.summary, input_format, output_format, &args.output, args.json)
}

fn resolve_input_format(
    headers: &[String],
    registry: &ProviderRegistry,
    requested: &str,
    threshold: f64,
    interactive: bool,
) -> Result<ProviderFormat, CliError> {
    match choose_provider(headers, registry, Some(requested), threshold) {
        ProviderChoice::Explicit(format) => Ok(format),
        ProviderChoice::Detected { format, detection } => {
            info!(provider = %format, confidence = detection.confidence(), "detected input format");
            Ok(format)
        }
        ProviderChoice::LowConfidence { detection } => {
            if interactive {
                let stdin = io::stdin();
                let mut prompter = Prompter::new(stdin.lock(), io::stderr());
                match prompter.confirm_format(&detection) {
                    Ok(Some(format)) => return Ok(format),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "cannot read answer"),
                }
            }
            Err(CliError::undetected(format!("input format is uncertain. {}", detection.reason()))
                .with_hint("name the format with --input-provider"))
        }
        ProviderChoice::Undetected { detection } => {
            Err(CliError::undetected(format!("cannot detect input format: {}", detection.reason()))
                .with_hint("name the format with --input-provider"))
        }
        ProviderChoice::UnknownName(name) => {
            Err(CliError::usage(format!("unknown provider \"{name}\"")).with_hint(PROVIDERS_HINT))
        }
        ProviderChoice::MissingPlugin(format) => {
            Err(CliError::usage(format!("no adapter registered for {format}")).with_hint(PROVIDERS_HINT))
        }
    }
}

fn print_summary(
    summary: &DedupeSummary,
    input: ProviderFormat,
    output: ProviderFormat,
    path: &Path,
    as_json: bool,
) -> Result<(), CliError> {
    if as_json {
        let value = json!({
            "input_provider": input,
            "output_provider": output,
            "output_file": path.display().to_string(),
            "summary": summary,
        });
        let text = serde_json::to_string_pretty(&value).map_err(|e| CliError::general(e.to_string()))?;
        println!("{text}");
        return Ok(());
    }

    println!("input:   {} entries ({input})", summary.input);
    println!(
        "exact:   {} removed from {} duplicate groups",
        summary.auto_removed, summary.exact_groups
    );
    println!(
        "near:    {} groups, {} resolved, {} entries merged away",
        summary.near_groups, summary.near_groups_resolved, summary.merged_discarded
    );
    println!("output:  {} entries ({output}) -> {}", summary.final_count, path.display());
    Ok(())
}

// ============================================================================
// detect
// ============================================================================

fn cmd_detect(input: &Path, as_json: bool) -> Result<(), CliError> {
    let registry = registry()?;
    let headers = match read_csv(input) {
        Ok(table) => table.headers,
        Err(IoError::NoHeaders) => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    let detection = detect_format(&headers, &registry);

    if as_json {
        let text = serde_json::to_string_pretty(&detection).map_err(|e| CliError::general(e.to_string()))?;
        println!("{text}");
    } else {
        match detection.format() {
            Some(format) => println!("{format} (confidence {:.2})", detection.confidence()),
            None => println!("undetected"),
        }
        println!("{}", detection.reason());
        for m in detection.matches() {
            println!(
                "  {:<18} score {:.2}  required {}/{}  optional {}/{}",
                m.format.as_str(),
                m.score,
                m.matched_required,
                m.total_required,
                m.matched_optional,
                m.total_optional
            );
        }
    }

    if detection.format().is_none() {
        // Reason already printed.
        return Err(CliError::undetected(String::new()));
    }
    Ok(())
}

// ============================================================================
// providers
// ============================================================================

fn cmd_providers(as_json: bool) -> Result<(), CliError> {
    let registry = registry()?;

    if as_json {
        let list: Vec<_> = registry
            .adapters()
            .map(|a| {
                let schema = a.header_schema();
                json!({
                    "name": a.format(),
                    "required": schema.required,
                    "optional": schema.optional,
                })
            })
            .collect();
        let text = serde_json::to_string_pretty(&list).map_err(|e| CliError::general(e.to_string()))?;
        println!("{text}");
        return Ok(());
    }

    for a in registry.adapters() {
        println!("{:<18} {}", a.format().as_str(), a.header_schema().required.join(", "));
    }
    Ok(())
}

//! riskscan - security triage for source repositories
//!
//! Lists the files of a repository, classifies them by security relevance,
//! selects the ones that matter for the chosen intent, groups them into
//! single-category chunks and analyzes each chunk in order. The result is an
//! aggregated verdict rendered as a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success (risk below threshold, or no --fail-on set)
//!   1 - Runtime error (config, clone failure, unreachable model, etc.)
//!   2 - Overall risk at or above the --fail-on threshold
//!   130 - Aborted by a second Ctrl-C

mod analysis;
mod chunker;
mod classifier;
mod cli;
mod config;
mod error;
mod models;
mod provider;
mod reasoning;
mod repo;
mod report;
mod selector;

use analysis::{
    ChunkProcessor, ConsoleObserver, HeuristicProcessor, Orchestrator, ReasoningProcessor,
};
use anyhow::{Context, Result};
use chunker::Chunker;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use futures::stream::{self, Stream, StreamExt};
use models::{Chunk, ClassifiedFile};
use provider::{collect_paths, LocalTreeProvider};
use reasoning::OllamaSession;
use report::SecurityReport;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Exit code when a second interrupt aborts the run.
const ABORT_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // The config file can raise the default log level, so it loads first.
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("riskscan v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Config: {:?}", config);

    match run_scan(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Scan failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .riskscan.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the intent, cost model, model and search.");
    Ok(())
}

/// Initialize logging. `RUST_LOG` wins over `level` when set.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete scan. Returns the process exit code (0 or 2).
async fn run_scan(args: Args, config: Config) -> Result<i32> {
    let repository = repo::repository_id(args.repo_url());

    // Step 1: Get the repository. A clone is removed when `checkout` drops.
    let checkout = acquire_repository(&args)?;
    info!("Repository at: {}", checkout.path().display());

    // Step 2: List and select files
    let provider = LocalTreeProvider::new(checkout.path().to_path_buf(), config.provider.clone());
    let paths = collect_paths(&provider, &repository, &config.provider.search);
    info!("Listed {} paths", paths.len());

    let policy = config.selection_policy();
    let selected = selector::select(&paths, &policy);
    println!(
        "🔎 Selected {} of {} files for intent '{}'",
        selected.len(),
        paths.len(),
        config.selection.intent
    );

    // Step 3: Chunk
    let chunks = Chunker::new(config.cost.clone()).chunk(&selected);

    if args.dry_run {
        return handle_dry_run(&selected, &chunks);
    }

    // Step 4: Analyze
    let cancel = Arc::new(AtomicBool::new(false));
    watch_for_interrupt(Arc::clone(&cancel));

    let (processor, model_used) = build_processor(&config, &repository)?;
    if let Some(ref model) = model_used {
        println!("🤖 Reasoning model: {} ({})", model, config.model.ollama_url);
    }

    println!("\n🔬 Analyzing {} chunks...\n", chunks.len());
    let observer = ConsoleObserver::new(chunks.len(), args.quiet);
    let orchestrator = Orchestrator::new(processor).with_cancellation(cancel);
    let verdict = orchestrator.run_with_observer(&chunks, &observer).await;
    observer.finish();
    // Ends the reasoning session, if any.
    drop(orchestrator);

    // Step 5: Report
    println!("\n📝 Generating report...");
    let report = SecurityReport::from_verdict(
        &repository,
        config.selection.intent.label(),
        model_used,
        selected.len(),
        verdict,
    );

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };
    let output_path = output_path(&args, &config);
    report::write_report(&output, &output_path)?;

    print_summary(&report);
    println!(
        "\n✅ Scan complete! Report saved to: {}",
        output_path.display()
    );

    if let Some(fail_level) = args.fail_on {
        let risk = report.executive_summary.overall_risk;
        if fail_level.is_exceeded_by(risk) {
            eprintln!(
                "\n⛔ Overall risk {} is at or above {:?}. Failing (exit code 2).",
                risk, fail_level
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Heuristics only, or heuristics plus a reasoning session for this run.
fn build_processor(
    config: &Config,
    repository: &str,
) -> Result<(Box<dyn ChunkProcessor>, Option<String>)> {
    if !config.model.enabled {
        return Ok((Box::new(HeuristicProcessor::new(config.cost.clone())), None));
    }

    let session = OllamaSession::acquire(config.model.engine_config())
        .context("Failed to start reasoning session")?;
    let model = session.model_name().to_string();
    let processor = ReasoningProcessor::new(
        session,
        config.cost.clone(),
        repository,
        config.selection.intent.label(),
    );

    Ok((Box::new(processor), Some(model)))
}

/// Set `cancel` on Ctrl-C. The run stops before its next chunk. A second
/// Ctrl-C exits immediately.
fn watch_for_interrupt(cancel: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let signals = Box::pin(stream::unfold((), |()| async {
            tokio::signal::ctrl_c().await.ok().map(|()| ((), ()))
        }));
        if let Some(code) = handle_interrupts(signals, &cancel).await {
            eprintln!("\n⛔ Interrupted again, aborting.");
            std::process::exit(code);
        }
    });
}

/// Sets `cancel` on the first signal. Returns the exit code to abort with
/// on the second, or `None` when the signal stream ends first.
async fn handle_interrupts<S>(mut signals: S, cancel: &AtomicBool) -> Option<i32>
where
    S: Stream<Item = ()> + Unpin,
{
    signals.next().await?;
    warn!("Interrupt received, stopping after the current chunk (Ctrl-C again to abort)");
    cancel.store(true, Ordering::SeqCst);

    signals.next().await?;
    warn!("Second interrupt received, aborting the run");
    Some(ABORT_EXIT_CODE)
}

/// Handle --dry-run: print the selection and chunk plan, analyze nothing.
fn handle_dry_run(selected: &[ClassifiedFile], chunks: &[Chunk]) -> Result<i32> {
    println!("\n🔍 Dry run: no chunks will be analyzed.\n");

    if selected.is_empty() {
        println!("   No security-relevant files found.");
    } else {
        for file in selected {
            println!(
                "     📄 {} [{} / {}] {}",
                file.path, file.category, file.priority, file.reason
            );
        }

        println!("\n   Chunk plan:");
        for chunk in chunks {
            println!(
                "     📦 {} - {} files, priority {}, estimated cost {}",
                chunk.id,
                chunk.files.len(),
                chunk.priority,
                chunk.cost_estimate
            );
        }
        let total_cost: u64 = chunks.iter().map(|c| c.cost_estimate as u64).sum();
        println!("\n   Total estimated cost: {} units", total_cost);
    }

    println!("\n✅ Dry run complete.");
    Ok(0)
}

fn print_summary(report: &SecurityReport) {
    let verdict = &report.verdict;
    let counts = &verdict.severity_counts;
    let summary = &report.executive_summary;

    println!("\n📊 Scan Summary:");
    println!(
        "   Overall risk: {} {}",
        summary.overall_risk.emoji(),
        summary.overall_risk
    );
    println!(
        "   Chunks: {}/{} analyzed ({}% success rate)",
        verdict.processed_chunks, verdict.total_chunks, summary.success_rate
    );
    println!("   Total findings: {}", verdict.total_findings);
    println!(
        "   - 🔴 Critical: {} | 🟠 High: {} | 🟡 Medium: {} | 🟢 Low: {} | 🔵 Info: {}",
        counts.critical, counts.high, counts.medium, counts.low, counts.info
    );
    println!("   Duration: {:.1}s", verdict.total_duration_ms as f64 / 1000.0);
    if verdict.cancelled {
        println!("   ⚠️  Run was cancelled; the report is partial.");
    }
}

/// Explicit --output, else the configured path. JSON output swaps a
/// Markdown extension for `.json`.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    if let Some(ref path) = args.output {
        return path.clone();
    }

    let path = PathBuf::from(&config.general.output);
    match args.format {
        OutputFormat::Json if path.extension().map(|e| e == "md").unwrap_or(false) => {
            path.with_extension("json")
        }
        _ => path,
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go to stderr.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(config) => Ok(config.unwrap_or_default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

/// Use the local directory, or clone into a temporary one.
fn acquire_repository(args: &Args) -> Result<repo::CloneResult> {
    if let Some(ref local) = args.local {
        info!("Using local directory: {}", local.display());
        return Ok(repo::CloneResult::local(local.clone()));
    }

    let repo_url = args.repo_url();
    println!("📥 Cloning repository: {}", repo_url);

    let clone_options = repo::CloneOptions {
        branch: args.branch.clone(),
        show_progress: !args.quiet,
        ..Default::default()
    };

    repo::clone_repository(repo_url, &clone_options)
}

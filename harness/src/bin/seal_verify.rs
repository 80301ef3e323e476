//! seal-verify: verify one traceability seal from local stores.
//!
//! Exit codes: 0 OK or WARNING, 1 KO, 2 FATAL, 3 usage or config error.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use seal_harness::config::VerifyConfig;
use seal_harness::context::VerificationContext;
use seal_harness::fs_store::{DirLogStore, DirObjectStore, FileTrustStoreLoader};
use seal_harness::orchestrator::{SealVerificationOrchestrator, VerificationOutcome};
use seal_kernel::verdict::StatusCode;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const EXIT_KO: u8 = 1;
const EXIT_FATAL: u8 = 2;
const EXIT_USAGE: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Verify a traceability seal: Merkle root, timestamp imprint, and signer
/// trust.
#[derive(Parser)]
#[command(name = "seal-verify")]
#[command(version = VERSION)]
#[command(about = "Verify a traceability seal against its log record and timestamp")]
struct Cli {
    /// JSON config file; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the seal log
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Directory holding seal containers
    #[arg(long)]
    object_dir: Option<PathBuf>,

    /// Trust store file
    #[arg(long)]
    trust_store: Option<PathBuf>,

    /// Parent directory for staging areas
    #[arg(long)]
    staging_root: Option<PathBuf>,

    /// Tenant id
    #[arg(long, default_value = "0")]
    tenant: u32,

    /// Request id; defaults to cli-<pid>
    #[arg(long)]
    request_id: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Seal to verify
    seal_id: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.format == Format::Json {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("seal-verify: {message}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let request_id = cli
        .request_id
        .clone()
        .unwrap_or_else(|| format!("cli-{}", std::process::id()));
    let ctx = match VerificationContext::new(cli.tenant, request_id) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("seal-verify: {e}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let orchestrator = SealVerificationOrchestrator::new(
        &config,
        DirLogStore::new(&config.log_store_dir),
        DirObjectStore::new(&config.object_store_dir),
        FileTrustStoreLoader::new(&config.trust_store_path),
    );
    let outcome = orchestrator.verify(&ctx, &cli.seal_id);

    match cli.format {
        Format::Json => match serde_json::to_string_pretty(&outcome) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("seal-verify: cannot encode outcome: {e}");
                return ExitCode::from(EXIT_USAGE);
            }
        },
        Format::Text => print_text(&outcome),
    }

    match outcome.status {
        StatusCode::Ok | StatusCode::Warning => ExitCode::SUCCESS,
        StatusCode::Ko => ExitCode::from(EXIT_KO),
        StatusCode::Fatal => ExitCode::from(EXIT_FATAL),
    }
}

fn load_config(cli: &Cli) -> Result<VerifyConfig, String> {
    let mut config = match &cli.config {
        Some(path) => VerifyConfig::load(path).map_err(|e| e.to_string())?,
        None => VerifyConfig::default(),
    };
    if let Some(dir) = &cli.log_dir {
        config.log_store_dir.clone_from(dir);
    }
    if let Some(dir) = &cli.object_dir {
        config.object_store_dir.clone_from(dir);
    }
    if let Some(path) = &cli.trust_store {
        config.trust_store_path.clone_from(path);
    }
    if let Some(dir) = &cli.staging_root {
        config.staging_root.clone_from(dir);
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn print_text(outcome: &VerificationOutcome) {
    println!("seal {}: {}", outcome.seal_id, outcome.status);
    if let Some(root) = &outcome.recomputed_root {
        println!("  recomputed root: {root}");
    }
    for verdict in &outcome.sub_verdicts {
        println!("  [{:<7}] {}", verdict.status.as_str(), verdict.check);
        if let Some(detail) = &verdict.detail {
            println!("            {detail}");
        }
    }
    for report in &outcome.stages {
        if let Some(fault) = &report.fault {
            println!("  {} FATAL: {fault}", report.stage);
        }
    }
}

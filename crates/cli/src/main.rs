//! Web3Signer Voluntary Exits
//!
//! Generates a signed voluntary exit file for each requested validator key.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use exit_gen::verifier::DEFAULT_VERIFIER;
use exit_gen::{BeaconClient, ExitGenerator, KeySelection, SignerClient, Verifier};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "web3signer-exits")]
#[command(about = "Generate signed voluntary exits for validators held by Web3Signer")]
struct Args {
    /// Consensus-layer (beacon node) URL
    #[arg(long = "cl", env = "CL_URL", default_value = "http://localhost:5052")]
    cl_url: String,

    /// Web3Signer URL
    #[arg(long = "web3signer", env = "WEB3SIGNER_URL", default_value = "http://localhost:9000")]
    web3signer_url: String,

    /// Verify each signed exit with the external verifier
    #[arg(long, overrides_with = "no_verify")]
    verify: bool,

    /// Do not verify signed exits
    #[arg(long, overrides_with = "verify")]
    no_verify: bool,

    /// Verifier executable, invoked as `<verifier> exit verify ...`
    #[arg(long, env = "EXIT_VERIFIER", default_value = DEFAULT_VERIFIER)]
    verifier: PathBuf,

    /// Directory the signed exit files are written to
    #[arg(long, env = "EXITS_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Validator public keys, or `auto` for every key held by the signer
    #[arg(required = true, num_args = 1..)]
    pubkeys: Vec<String>,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment from .env if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(args.log_format);

    tracing::info!(cl_url = %args.cl_url, "Consensus-layer node");
    tracing::info!(web3signer_url = %args.web3signer_url, "Web3Signer");

    let beacon = BeaconClient::new(&args.cl_url);
    let signer = SignerClient::new(&args.web3signer_url);
    let mut generator = ExitGenerator::new(beacon, signer, &args.output_dir);

    if args.verify && !args.no_verify {
        tracing::info!(verifier = %args.verifier.display(), "Verification enabled");
        generator = generator.with_verifier(Verifier::new(&args.verifier, &args.cl_url));
    }

    let summary = generator
        .run(KeySelection::from_args(args.pubkeys))
        .await
        .context("Failed to generate voluntary exits")?;

    tracing::info!(
        written = summary.written.len(),
        skipped = summary.skipped.len(),
        verification_failures = summary.verification_failures.len(),
        "Done"
    );

    Ok(())
}

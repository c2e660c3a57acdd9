//! Verifies one receipt from the command line and prints the verdict JSON.

use std::{fs, path::PathBuf, process::ExitCode, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{ArgGroup, Parser};
use fractic_receipt_verifier::{
    config::ReceiptVerifierConfig, util::ReceiptVerifierUtil, FileRedemptionLedgerDatasource,
};
use tracing::error;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["receipt", "receipt_file"])))]
struct Args {
    /// User redeeming the receipt.
    #[arg(long)]
    user_id: String,

    /// Base64-encoded receipt data.
    #[arg(long)]
    receipt: Option<String>,

    /// File containing the raw (binary) receipt.
    #[arg(long)]
    receipt_file: Option<PathBuf>,

    /// Directory holding the redemption ledger.
    #[arg(long, default_value = "./receipt-ledger")]
    ledger_dir: PathBuf,

    /// Overall deadline for the verification, in milliseconds.
    #[arg(long, default_value = "30000")]
    timeout_ms: u64,

    /// Log filter, e.g. "info" or "fractic_receipt_verifier=debug".
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let receipt_data = match (&args.receipt, &args.receipt_file) {
        (Some(receipt), _) => receipt.clone(),
        (None, Some(path)) => match fs::read(path) {
            Ok(bytes) => STANDARD.encode(bytes),
            Err(e) => {
                error!("failed to read receipt file {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        (None, None) => unreachable!("clap requires one of --receipt or --receipt-file"),
    };

    let util = match ReceiptVerifierConfig::from_env().and_then(|config| {
        let ledger = FileRedemptionLedgerDatasource::open(&args.ledger_dir)?;
        ReceiptVerifierUtil::new(&config, ledger)
    }) {
        Ok(util) => util,
        Err(e) => {
            error!("failed to initialize receipt verifier: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let verdict = util
        .verify_receipt_with_timeout(
            &args.user_id,
            &receipt_data,
            Duration::from_millis(args.timeout_ms),
        )
        .await;
    println!("{}", verdict.to_json());
    if verdict.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

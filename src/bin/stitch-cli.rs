use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};

use w3b_stitch::anchor::{AnchorRequest, AnchorSource, AnchorWorkflow};
use w3b_stitch::blockchain::scripted::ScriptedTransport;
use w3b_stitch::blockchain::{ChainClient, SubmissionSettings};
use w3b_stitch::config::{load_config, AppConfig};
use w3b_stitch::hashing::ContentHasher;
use w3b_stitch::observability::logging;
use w3b_stitch::receipt::{qr_svg, verification_url};
use w3b_stitch::status::{RemarkContent, STATUS_CONNECTING};
use w3b_stitch::verify::{compare, VerifyStatus};
use w3b_stitch::wallet::WalletConnector;

#[derive(Parser)]
#[command(name = "stitch-cli")]
#[command(about = "Hash, anchor and verify media with W3b Stitch", long_about = None)]
struct Cli {
    /// API server base URL.
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// TOML configuration file for local commands.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the SHA-256 digest of a file or URL
    Hash(SourceArgs),
    /// Anchor a digest with the server-held key
    Anchor {
        #[arg(long)]
        hash: String,
    },
    /// Forward a digest to the anchor backend
    Credential {
        #[arg(long)]
        hash: String,
        #[arg(long)]
        filename: Option<String>,
    },
    /// Compare a local file against an expected digest
    Verify {
        file: PathBuf,
        /// Expected digest (from the QR link)
        #[arg(long)]
        hash: Option<String>,
    },
    /// Run the placeholder credential check on the server
    Check { payload: String },
    /// Store or fetch receipts on the server
    #[command(subcommand)]
    Receipt(ReceiptCommand),
    /// Render the verification QR code as SVG
    Qr {
        #[arg(long)]
        hash: String,
        #[arg(long)]
        did: Option<String>,
        #[arg(long)]
        tx: Option<String>,
        /// Write the SVG here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Hash, sign with a wallet, submit and follow the remark to finality
    Submit {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        did: Option<String>,
        /// Wallet provider name (preferred provider if omitted)
        #[arg(long)]
        wallet: Option<String>,
        /// Directory for the receipt JSON and QR SVG
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Play back a scripted chain instead of contacting a node
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Local file to hash
    #[arg(long, conflicts_with = "media_url")]
    file: Option<PathBuf>,
    /// Remote media URL to hash
    #[arg(long = "media-url")]
    media_url: Option<String>,
}

impl SourceArgs {
    fn source(&self) -> Result<AnchorSource, Box<dyn std::error::Error>> {
        match (&self.file, &self.media_url) {
            (Some(path), _) => Ok(AnchorSource::File(path.clone())),
            (None, Some(url)) => Ok(AnchorSource::Url(url.clone())),
            (None, None) => Err("either --file or --media-url is required".into()),
        }
    }
}

#[derive(Subcommand)]
enum ReceiptCommand {
    Get {
        tx_hash: String,
    },
    Put {
        #[arg(long)]
        tx_hash: String,
        #[arg(long)]
        did: String,
        #[arg(long)]
        hash: String,
        #[arg(long)]
        filename: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    logging::init_logging(&config.observability);
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Hash(source) => {
            let hasher = ContentHasher::new(config.hashing.max_input_bytes, outbound(&config));
            let content = match source.source()? {
                AnchorSource::File(path) => hasher.hash_file(&path).await?,
                AnchorSource::Url(url) => hasher.hash_url(&url).await?,
            };
            println!("{}", content.digest);
            eprintln!("{} bytes from {}", content.byte_len, content.source);
        }
        Commands::Anchor { hash } => {
            let res = client
                .post(format!("{}/api/anchor", cli.url))
                .json(&json!({ "hash": hash }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Credential { hash, filename } => {
            let res = client
                .post(format!("{}/api/credential", cli.url))
                .json(&json!({ "hash": hash, "filename": filename }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Verify { file, hash } => {
            let hasher = ContentHasher::new(config.hashing.max_input_bytes, outbound(&config));
            let content = hasher.hash_file(&file).await?;
            let status = compare(hash.as_deref(), &content.digest);
            println!("{}", json!({ "status": status, "hash": content.digest.to_string() }));
            if status == VerifyStatus::NoMatch {
                std::process::exit(1);
            }
        }
        Commands::Check { payload } => {
            let res = client
                .post(format!("{}/api/verify", cli.url))
                .json(&json!({ "payload": payload }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Receipt(ReceiptCommand::Get { tx_hash }) => {
            let res = client
                .get(format!("{}/api/receipt", cli.url))
                .query(&[("txHash", tx_hash)])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Receipt(ReceiptCommand::Put { tx_hash, did, hash, filename }) => {
            let res = client
                .post(format!("{}/api/receipt", cli.url))
                .json(&json!({ "txHash": tx_hash, "did": did, "hash": hash, "filename": filename }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Qr { hash, did, tx, out } => {
            let url = verification_url(&config.anchor.public_base_url, &hash, did.as_deref(), tx.as_deref())?;
            let svg = qr_svg(url.as_str())?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, svg).await?;
                    eprintln!("{} → {}", url, path.display());
                }
                None => println!("{}", svg),
            }
        }
        Commands::Submit { source, did, wallet, out_dir, dry_run } => {
            let request = AnchorRequest {
                source: source.source()?,
                did,
                wallet,
                session_id: "cli".to_string(),
            };
            submit(&config, request, &out_dir, dry_run).await?;
        }
    }

    Ok(())
}

fn outbound(config: &AppConfig) -> std::time::Duration {
    std::time::Duration::from_secs(config.timeouts.outbound_secs)
}

async fn submit(
    config: &AppConfig,
    request: AnchorRequest,
    out_dir: &Path,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("{}", STATUS_CONNECTING);
    let chain = if dry_run {
        ChainClient::with_transport(
            Arc::new(ScriptedTransport::happy_path()),
            SubmissionSettings {
                finality_depth: 1,
                poll_interval: std::time::Duration::from_millis(200),
                ..SubmissionSettings::from(&config.chain)
            },
        )
    } else {
        ChainClient::connect(&config.chain).await?
    };

    let wallets = Arc::new(WalletConnector::from_config(&config.wallet)?);
    let hasher = ContentHasher::new(config.hashing.max_input_bytes, outbound(config));
    let workflow = AnchorWorkflow::new(chain, hasher, wallets, config);

    let outcome = workflow.run(&request, |status| eprintln!("{}", status)).await?;

    tokio::fs::create_dir_all(out_dir).await?;
    let receipt_path = outcome.receipt.write_to_dir(out_dir).await?;
    let qr_path = receipt_path.with_extension("svg");
    tokio::fs::write(&qr_path, qr_svg(outcome.verification_url.as_str())?).await?;

    let remark = match &outcome.remark {
        Some(RemarkContent::Anchor(payload)) => serde_json::to_value(payload)?,
        Some(RemarkContent::Raw(bytes)) => Value::String(bytes.to_string()),
        None => Value::Null,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "ok": outcome.failure().is_none(),
            "status": outcome.status,
            "hash": outcome.content.digest.to_string(),
            "txHash": outcome.tx_hash.to_string(),
            "finalizedBlock": outcome.receipt.finalized_block,
            "explorer": outcome.explorer,
            "verify": outcome.verification_url.as_str(),
            "remark": remark,
            "receipt": receipt_path.display().to_string(),
            "qr": qr_path.display().to_string(),
        }))?
    );

    if outcome.failure().is_some() {
        std::process::exit(1);
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

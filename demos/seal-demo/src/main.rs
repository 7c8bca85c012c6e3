//! Command-line walkthrough of the Amber seal/open pipeline.
//!
//! Runs the full session pipeline against an in-process mock key-derivation
//! service and a filesystem blob store. The mock derives all key material
//! from a seed passphrase, so `seal` in one invocation and `open` in the
//! next agree on per-asset keys the way two clients of a real service
//! would.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use amber_core::{AssetId, Principal};
use amber_session::{AssetCryptoSession, MockKeyService, MockRecordService, RecordService};
use amber_storage::{ContentAddress, FsContentStore, FsStoreConfig, MemoryContentStore};

#[derive(Parser)]
#[command(
    name = "seal-demo",
    about = "Seal and open confidential assets against mock collaborators"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Seed passphrase for the mock key-derivation service
    #[arg(long, default_value = "amber-demo")]
    seed: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encrypt a payload and store it content-addressed on disk
    Seal {
        /// Directory for the blob store
        #[arg(long, default_value = "./amber-data")]
        data_dir: PathBuf,
        /// Asset identifier; a fresh one is minted when omitted
        #[arg(long)]
        asset: Option<String>,
        /// Caller identity the key material is bound to
        #[arg(long, default_value = "principal-demo")]
        caller: String,
        /// Media type recorded with the asset
        #[arg(long)]
        content_type: Option<String>,
        /// Read the payload from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Inline payload text
        #[arg(long)]
        text: Option<String>,
    },
    /// Fetch a sealed blob and decrypt it
    Open {
        /// Directory for the blob store
        #[arg(long, default_value = "./amber-data")]
        data_dir: PathBuf,
        /// Asset the blob was sealed for
        #[arg(long)]
        asset: String,
        /// Caller identity the key material is bound to
        #[arg(long, default_value = "principal-demo")]
        caller: String,
        /// Content address printed by seal (64 hex chars)
        #[arg(long)]
        address: String,
        /// Blob size printed by seal
        #[arg(long)]
        size: u64,
        /// Write the plaintext here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run a full in-memory walkthrough
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let keys = MockKeyService::new(blake3::derive_key(
        "amber seal-demo master seed",
        cli.seed.as_bytes(),
    ));

    match cli.command {
        Command::Seal {
            data_dir,
            asset,
            caller,
            content_type,
            file,
            text,
        } => seal(keys, data_dir, asset, caller, content_type, file, text).await,
        Command::Open {
            data_dir,
            asset,
            caller,
            address,
            size,
            output,
        } => open(keys, data_dir, asset, caller, address, size, output).await,
        Command::Demo => demo(keys).await,
    }
}

async fn seal(
    keys: MockKeyService,
    data_dir: PathBuf,
    asset: Option<String>,
    caller: String,
    content_type: Option<String>,
    file: Option<PathBuf>,
    text: Option<String>,
) -> anyhow::Result<()> {
    let payload = match (file, text) {
        (Some(path), _) => std::fs::read(&path)?,
        (None, Some(text)) => text.into_bytes(),
        (None, None) => anyhow::bail!("provide a payload with --text or --file"),
    };

    let caller = Principal::new(caller)?;
    let store = FsContentStore::new(FsStoreConfig {
        base_dir: data_dir,
        ..Default::default()
    })
    .await?;

    // Records live in-process; the durable handle is the printed address
    let records = MockRecordService::new();
    let asset = match asset {
        Some(id) => {
            let asset = AssetId::new(id)?;
            records.register_asset(asset.clone(), caller.clone());
            asset
        }
        None => records.create_asset(&caller).await?,
    };

    let mut session = AssetCryptoSession::new(&keys, &store, &records, asset, caller);
    if let Some(content_type) = content_type {
        session = session.with_content_type(content_type);
    }
    let receipt = session.seal(&payload).await?;

    println!("Sealed {} bytes for {}", payload.len(), receipt.asset);
    println!("  address: {}", receipt.content_address.hash_hex());
    println!("  size:    {}", receipt.ciphertext_len);
    println!();
    println!(
        "Open it again with:\n  seal-demo open --asset {} --address {} --size {}",
        receipt.asset,
        receipt.content_address.hash_hex(),
        receipt.ciphertext_len
    );
    Ok(())
}

async fn open(
    keys: MockKeyService,
    data_dir: PathBuf,
    asset: String,
    caller: String,
    address: String,
    size: u64,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let caller = Principal::new(caller)?;
    let asset = AssetId::new(asset)?;
    let address = ContentAddress::from_hex(&address, size)?;

    let store = FsContentStore::new(FsStoreConfig {
        base_dir: data_dir,
        ..Default::default()
    })
    .await?;
    let records = MockRecordService::new();

    let session = AssetCryptoSession::new(&keys, &store, &records, asset, caller);
    let plaintext = session.open(&address).await?;

    match output {
        Some(path) => {
            std::fs::write(&path, &plaintext)?;
            println!("Wrote {} bytes to {}", plaintext.len(), path.display());
        }
        None => match String::from_utf8(plaintext) {
            Ok(text) => println!("{text}"),
            Err(err) => println!(
                "{} bytes of binary plaintext; use --output",
                err.into_bytes().len()
            ),
        },
    }
    Ok(())
}

async fn demo(keys: MockKeyService) -> anyhow::Result<()> {
    let store = MemoryContentStore::new();
    let records = MockRecordService::new();

    let caller = Principal::new("principal-A")?;
    let asset = records.create_asset(&caller).await?;
    println!("Minted {asset} owned by {caller}");

    let payload = b"hello-health-xyz";
    let session = AssetCryptoSession::new(&keys, &store, &records, asset.clone(), caller.clone())
        .with_content_type("text/plain");
    let receipt = session.seal(payload).await?;
    println!(
        "Sealed {} plaintext bytes into a {} byte blob",
        payload.len(),
        receipt.ciphertext_len
    );
    println!("  address: {}", receipt.content_address);

    let session = AssetCryptoSession::new(&keys, &store, &records, asset.clone(), caller.clone());
    let plaintext = session.open(&receipt.content_address).await?;
    println!(
        "Fresh session opened it: {}",
        String::from_utf8_lossy(&plaintext)
    );

    // Key material is bound to the caller identity as well as the asset
    let stranger = Principal::new("principal-B")?;
    let session = AssetCryptoSession::new(&keys, &store, &records, asset, stranger);
    match session.open(&receipt.content_address).await {
        Ok(_) => println!("Unexpected: foreign caller opened the blob"),
        Err(err) => println!("Foreign caller rejected: {err} ({})", err.reason()),
    }

    Ok(())
}

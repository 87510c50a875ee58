use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ethers::providers::{Http, Provider};
use ethers::types::Address;
use shielded_pool_core::backend::groth16::PrecomputedAssignment;
use shielded_pool_core::config::{ArtifactStoreKind, Config};
use shielded_pool_core::field::field_to_bytes;
use shielded_pool_core::orchestrator::{DirArtifactStore, HttpArtifactStore};
use shielded_pool_core::{
    ArtifactStore, BackendKind, DeriveContext, HookClient, ProofArtifact, ProofOrchestrator,
    WithdrawalPayload,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Nullifier string from the deposit.
    #[arg(short, long)]
    nullifier: String,

    /// Secret string from the deposit.
    #[arg(short, long)]
    secret: String,

    /// Address the funds are released to.
    #[arg(short, long)]
    recipient: String,

    /// Tree number the deposit landed in. Defaults to the hook's current
    /// tree, which is only correct for recent deposits.
    #[arg(short, long)]
    tree_number: Option<u64>,

    /// Leaf index of the commitment in that tree.
    #[arg(short, long)]
    leaf_index: u64,

    #[arg(short, long, value_enum, default_value_t = BackendArg::Zkvm)]
    backend: BackendArg,

    /// Full variable assignment (JSON array of hex field elements) from the
    /// external witness calculator. Required for the groth16 backend.
    #[arg(short, long)]
    assignment_file: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Zkvm,
    Groth16,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = Config::load_from_file(&args.config)?;
    let hook = config.network.hook()?;
    let pool_id = config.pool.pool_key(hook)?.id()?;
    println!("Pool id: 0x{}", hex::encode(pool_id));

    let recipient: Address = args
        .recipient
        .parse()
        .context("Failed to parse recipient address")?;

    println!("Deriving spending note...");
    let mut ctx = DeriveContext::new().context("Failed to initialize hashing context")?;
    let note = ctx
        .note_from_strings(&args.nullifier, &args.secret)
        .context("Failed to derive note")?;

    let provider = Provider::<Http>::try_from(config.network.rpc_url.as_str())
        .context("Failed to build RPC provider")?;
    let client = HookClient::new(hook, Arc::new(provider));

    let tree_number = match args.tree_number {
        Some(n) => n.into(),
        None => client.current_tree_number(pool_id).await?,
    };
    println!("Fetching authentication path (tree {tree_number}, leaf {})...", args.leaf_index);
    let path = client
        .fetch_auth_path(pool_id, tree_number, args.leaf_index)
        .await?;

    let store: Box<dyn ArtifactStore + Send + Sync> = match config.artifacts.kind {
        ArtifactStoreKind::Http => Box::new(HttpArtifactStore::new(config.artifacts.base.clone())),
        ArtifactStoreKind::Dir => Box::new(DirArtifactStore::new(config.artifacts.base.clone())),
    };
    let orchestrator = ProofOrchestrator::new(store);

    println!("Generating proof (this may take a while)...");
    let artifact: ProofArtifact = match args.backend {
        BackendArg::Zkvm => {
            let backend = orchestrator.load_zkvm_backend().await?;
            orchestrator.prove_withdrawal(&backend, &note, &path, recipient)?
        }
        BackendArg::Groth16 => {
            let assignment_file = args
                .assignment_file
                .context("--assignment-file is required for the groth16 backend")?;
            let calculator = PrecomputedAssignment::from_json_file(&assignment_file)?;
            let backend = orchestrator.load_groth16_backend(calculator).await?;
            orchestrator.prove_withdrawal(&backend, &note, &path, recipient)?
        }
    };
    println!("Proof generated, size: {} bytes", artifact.proof.len());

    let payload = WithdrawalPayload {
        backend: match args.backend {
            BackendArg::Zkvm => BackendKind::Zkvm,
            BackendArg::Groth16 => BackendKind::Groth16,
        },
        nullifier_hash: field_to_bytes(note.nullifier_hash),
        root: path.root,
        recipient,
        proof: artifact.proof,
    };

    println!("Withdrawal hook data:");
    println!("0x{}", hex::encode(payload.encode()));

    Ok(())
}

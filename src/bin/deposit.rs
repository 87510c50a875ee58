use anyhow::{Context, Result};
use clap::Parser;
use ethers::providers::{Http, Provider};
use shielded_pool_core::config::Config;
use shielded_pool_core::field::field_to_hex;
use shielded_pool_core::payload::deposit_data;
use shielded_pool_core::{DeriveContext, HookClient};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Nullifier string. Keep it secret; it spends the deposit.
    #[arg(short, long)]
    nullifier: String,

    /// Secret string. Keep it secret; it spends the deposit.
    #[arg(short, long)]
    secret: String,

    /// Optional config file; when the hook is configured, also reports where
    /// the commitment will land in the forest.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("Deriving spending note...");
    let mut ctx = DeriveContext::new().context("Failed to initialize hashing context")?;
    let note = ctx
        .note_from_strings(&args.nullifier, &args.secret)
        .context("Failed to derive note")?;

    println!("Nullifier hash: {}", field_to_hex(note.nullifier_hash));
    println!("Commitment:     {}", field_to_hex(note.commitment));
    println!(
        "Deposit hook data: 0x{}",
        hex::encode(deposit_data(note.commitment))
    );

    if let Some(config_path) = args.config {
        let config = Config::load_from_file(&config_path)?;
        let hook = config.network.hook()?;
        let pool_id = config.pool.pool_key(hook)?.id()?;
        println!("Pool id: 0x{}", hex::encode(pool_id));

        let provider = Provider::<Http>::try_from(config.network.rpc_url.as_str())
            .context("Failed to build RPC provider")?;
        let client = HookClient::new(hook, Arc::new(provider));

        let tree_number = client.current_tree_number(pool_id).await?;
        let leaf_index = client.next_leaf_index(pool_id).await?;
        println!("Current tree number: {tree_number}");
        println!("Next leaf index:     {leaf_index}");
        println!("Record the tree number and leaf index; withdrawal needs both.");
    }

    Ok(())
}

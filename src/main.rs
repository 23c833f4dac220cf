//! nanochain CLI application
//!
//! Runs the ledger node (block producer + REST API) and provides small
//! operational helpers.

use clap::{Parser, Subcommand};
use nanochain::api::{create_router, ApiState, FaucetLimiter};
use nanochain::config::NodeConfig;
use nanochain::crypto::KeyPair;
use nanochain::node::Node;
use nanochain::storage::{JsonStore, PersistenceGateway};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nanochain")]
#[command(version = "0.1.0")]
#[command(about = "A single-node account-based proof-of-work ledger", long_about = None)]
struct Cli {
    /// Data directory for the persistence mirror
    #[arg(short, long, default_value = ".nanochain_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the node: block producer plus REST API
    Run {
        /// Proof-of-work difficulty (leading zero hex digits)
        #[arg(long)]
        difficulty: Option<u32>,

        /// HTTP listen port (the PORT env var takes precedence)
        #[arg(short, long)]
        port: Option<u16>,

        /// Maximum transactions per mined block
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Generate a key pair and print its address
    Keygen,

    /// Print a summary of the persisted chain
    Info,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            difficulty,
            port,
            batch_size,
        } => {
            let mut config = NodeConfig {
                data_dir: cli.data_dir,
                ..NodeConfig::default()
            };
            if let Some(difficulty) = difficulty {
                config.difficulty = difficulty;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            let config = config.apply_env();

            run_node(config).await
        }
        Commands::Keygen => {
            let key_pair = KeyPair::generate();
            println!("address:     {}", key_pair.address());
            println!("public key:  {}", key_pair.public_key_hex());
            println!("private key: {}", key_pair.private_key_hex());
            Ok(())
        }
        Commands::Info => {
            let store = JsonStore::open(&cli.data_dir)?;
            let chain = store.load_chain()?;
            match chain.last() {
                Some(tip) => {
                    let tx_count: usize = chain.iter().map(|b| b.transactions.len()).sum();
                    println!("blocks:       {}", chain.len());
                    println!("tip number:   {}", tip.number);
                    println!("tip hash:     {}", tip.hash);
                    println!("transactions: {}", tx_count);
                }
                None => println!("no persisted chain in {}", cli.data_dir.display()),
            }
            Ok(())
        }
    }
}

async fn run_node(config: NodeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = Arc::new(JsonStore::open(&config.data_dir)?);
    let node = Node::new(config, gateway)?;
    node.start();

    let state = ApiState {
        ledger: node.ledger.clone(),
        mempool: node.mempool.clone(),
        faucet: Arc::new(FaucetLimiter::default()),
    };
    let router = create_router(state);

    let addr = format!("0.0.0.0:{}", node.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    node.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {}", err);
    }
}

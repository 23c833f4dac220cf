//! Node configuration

use std::path::PathBuf;
use std::time::Duration;

/// Default proof-of-work difficulty (leading zero hex digits)
pub const DEFAULT_DIFFICULTY: u32 = 2;

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Required count of leading zero hex digits in a proof hash
    pub difficulty: u32,
    /// Maximum transactions per mined block
    pub batch_size: usize,
    /// Producer sleep while the mempool is empty
    pub idle_backoff: Duration,
    /// HTTP listen port
    pub port: u16,
    /// Data directory for the JSON persistence mirror
    pub data_dir: PathBuf,
    /// Balances credited at genesis (demo/testnet accounts)
    pub genesis_alloc: Vec<(String, i64)>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            batch_size: 100,
            idle_backoff: Duration::from_secs(1),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(".nanochain_data"),
            genesis_alloc: vec![
                ("0x742d35Cc6634C0532925a3b844Bc454e4438f44e".to_string(), 1000),
                ("0x742d35Cc6634C0532925a3b844Bc454e4438f44f".to_string(), 1000),
            ],
        }
    }
}

impl NodeConfig {
    /// Apply environment overrides (currently `PORT`)
    pub fn apply_env(mut self) -> Self {
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => log::warn!("ignoring unparseable PORT value: {}", port),
            }
        }
        self
    }
}

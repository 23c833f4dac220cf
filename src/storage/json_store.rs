//! JSON file-backed persistence gateway
//!
//! Mirrors the chain and the account read-model into a data directory as
//! pretty-printed JSON. Writes go through a temporary file followed by an
//! atomic rename, so a crash mid-write never leaves a torn file.

use crate::core::Block;
use crate::storage::gateway::{PersistenceError, PersistenceGateway};
use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const BLOCKS_FILE: &str = "blocks.json";
const ACCOUNTS_FILE: &str = "accounts.json";

/// File-backed persistence gateway
pub struct JsonStore {
    data_dir: PathBuf,
    /// Serializes read-modify-write cycles on the backing files
    io_lock: Mutex<()>,
}

impl JsonStore {
    /// Open (creating if needed) a store in the given data directory
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            io_lock: Mutex::new(()),
        })
    }

    fn blocks_path(&self) -> PathBuf {
        self.data_dir.join(BLOCKS_FILE)
    }

    fn accounts_path(&self) -> PathBuf {
        self.data_dir.join(ACCOUNTS_FILE)
    }

    fn read_blocks(&self) -> Result<Vec<Block>, PersistenceError> {
        read_json_or_default(&self.blocks_path())
    }

    fn read_accounts(&self) -> Result<HashMap<String, i64>, PersistenceError> {
        read_json_or_default(&self.accounts_path())
    }

    fn write_atomically<T: serde::Serialize>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), PersistenceError> {
        let temp_path = path.with_extension("tmp");
        {
            let file = fs::File::create(&temp_path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, value)?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

fn read_json_or_default<T>(path: &Path) -> Result<T, PersistenceError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

impl PersistenceGateway for JsonStore {
    fn insert_block(&self, block: &Block) -> Result<(), PersistenceError> {
        let _guard = self.io_lock.lock().expect("store lock poisoned");
        let mut blocks = self.read_blocks()?;
        if blocks.iter().any(|b| b.number == block.number) {
            return Ok(());
        }
        blocks.push(block.clone());
        blocks.sort_by_key(|b| b.number);
        self.write_atomically(&self.blocks_path(), &blocks)
    }

    fn load_chain(&self) -> Result<Vec<Block>, PersistenceError> {
        let _guard = self.io_lock.lock().expect("store lock poisoned");
        let mut blocks = self.read_blocks()?;
        blocks.sort_by_key(|b| b.number);
        Ok(blocks)
    }

    fn upsert_account_balance(&self, address: &str, balance: i64) -> Result<(), PersistenceError> {
        let _guard = self.io_lock.lock().expect("store lock poisoned");
        let mut accounts = self.read_accounts()?;
        accounts.insert(address.to_string(), balance);
        self.write_atomically(&self.accounts_path(), &accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;

    fn block(number: u64) -> Block {
        let mut b = Block::genesis();
        b.number = number;
        b.transactions = vec![Transaction::new("alice", "bob", 10, number)];
        b
    }

    #[test]
    fn test_save_and_load_chain() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(temp_dir.path()).unwrap();

        store.insert_block(&block(0)).unwrap();
        store.insert_block(&block(1)).unwrap();

        let chain = store.load_chain().unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].number, 0);
        assert_eq!(chain[1].number, 1);
        assert_eq!(chain[1].transactions.len(), 1);
    }

    #[test]
    fn test_empty_store_loads_empty_chain() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(temp_dir.path()).unwrap();
        assert!(store.load_chain().unwrap().is_empty());
    }

    #[test]
    fn test_redelivery_does_not_duplicate() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(temp_dir.path()).unwrap();

        store.insert_block(&block(1)).unwrap();
        store.insert_block(&block(1)).unwrap();
        assert_eq!(store.load_chain().unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_account_balance() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(temp_dir.path()).unwrap();

        store.upsert_account_balance("alice", 100).unwrap();
        store.upsert_account_balance("alice", 42).unwrap();

        let accounts: HashMap<String, i64> =
            read_json_or_default(&temp_dir.path().join(ACCOUNTS_FILE)).unwrap();
        assert_eq!(accounts.get("alice"), Some(&42));
    }

    #[test]
    fn test_store_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        {
            let store = JsonStore::open(temp_dir.path()).unwrap();
            store.insert_block(&block(0)).unwrap();
        }
        let reopened = JsonStore::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.load_chain().unwrap().len(), 1);
    }
}

use ledger_core::Chain;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

pub fn create_temp_config(json: &str) -> (TempDir, PathBuf) {
    // Config files live in a fresh directory that is removed on drop
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("chain.json");
    std::fs::write(&path, json).expect("Failed to write config");
    (temp_dir, path)
}

pub fn mined_chain(difficulty: usize, blocks: usize) -> Chain {
    let mut chain = Chain::new(difficulty).expect("valid difficulty");
    for i in 0..blocks {
        chain.add_transaction(format!("User{i}"), format!("User{}", i + 1), i as f64);
        chain.mine_block(&format!("Miner{i}"));
    }
    chain
}

/// Round-trips the chain through JSON, letting `edit` rewrite the document.
pub fn tamper(chain: &Chain, edit: impl FnOnce(&mut Value)) -> Chain {
    let mut doc = serde_json::to_value(chain).expect("serialize chain");
    edit(&mut doc);
    serde_json::from_value(doc).expect("deserialize chain")
}

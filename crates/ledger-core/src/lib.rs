use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod mine;

pub use chain::Chain;
pub use config::{ChainConfig, MiningStrategy};
pub use error::{ChainError, ConfigError, TransactionError, ValidationError};

pub type Hash = [u8; 32];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }
}

/// A ledger entry. `hash` always equals the content hash of the other fields;
/// the only mutation path is the nonce setter used by the proof-of-work search,
/// which rehashes in the same call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    transactions: Vec<Transaction>,
    timestamp: u64,
    previous_hash: String,
    nonce: u64,
    hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        timestamp: u64,
        previous_hash: impl Into<String>,
    ) -> Self {
        let mut block = Self {
            index,
            transactions,
            timestamp,
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.calculate_hash();
        block
    }

    pub fn genesis(timestamp: u64) -> Self {
        Self::new(0, vec![], timestamp, constants::GENESIS_PREVIOUS_HASH)
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Canonical byte layout of everything except the nonce. The nonce goes last
    /// so the search can hash this prefix once and reuse the hasher state.
    pub fn prefix_bytes(&self) -> Vec<u8> {
        prefix_bytes(
            self.index,
            &self.transactions,
            self.timestamp,
            &self.previous_hash,
        )
    }

    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes = self.prefix_bytes();
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes
    }

    pub fn calculate_hash(&self) -> String {
        hex::encode(sha256(&self.hash_bytes()))
    }

    /// False when any field was changed without rehashing.
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.calculate_hash()
    }

    pub(crate) fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
        self.hash = self.calculate_hash();
    }

    #[cfg(test)]
    pub(crate) fn fields_mut(&mut self) -> BlockFieldsMut<'_> {
        BlockFieldsMut {
            transactions: &mut self.transactions,
            timestamp: &mut self.timestamp,
            previous_hash: &mut self.previous_hash,
            hash: &mut self.hash,
        }
    }
}

/// Raw field access so tests can tamper with a block without rehashing it.
#[cfg(test)]
pub(crate) struct BlockFieldsMut<'a> {
    pub transactions: &'a mut Vec<Transaction>,
    pub timestamp: &'a mut u64,
    pub previous_hash: &'a mut String,
    pub hash: &'a mut String,
}

fn put_str(bytes: &mut Vec<u8>, s: &str) {
    bytes.extend_from_slice(&(s.len() as u64).to_le_bytes());
    bytes.extend_from_slice(s.as_bytes());
}

fn prefix_bytes(
    index: u64,
    transactions: &[Transaction],
    timestamp: u64,
    previous_hash: &str,
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + 8 + 8 + previous_hash.len() + 8 + transactions.len() * 48);
    bytes.extend_from_slice(&index.to_le_bytes());
    bytes.extend_from_slice(&timestamp.to_le_bytes());
    put_str(&mut bytes, previous_hash);
    bytes.extend_from_slice(&(transactions.len() as u64).to_le_bytes());
    for tx in transactions {
        put_str(&mut bytes, &tx.sender);
        put_str(&mut bytes, &tx.recipient);
        bytes.extend_from_slice(&tx.amount.to_bits().to_le_bytes());
    }
    bytes
}

pub fn sha256(bytes: &[u8]) -> Hash {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// Hex SHA-256 over the canonical encoding of a block's fields.
pub fn content_hash(
    index: u64,
    transactions: &[Transaction],
    timestamp: u64,
    previous_hash: &str,
    nonce: u64,
) -> String {
    let mut bytes = prefix_bytes(index, transactions, timestamp, previous_hash);
    bytes.extend_from_slice(&nonce.to_le_bytes());
    hex::encode(sha256(&bytes))
}

/// Seconds since the Unix epoch. A clock set before 1970 reads as 0.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub mod pow {
    use super::{Block, Hash};
    use crate::constants::CANCEL_CHECK_INTERVAL;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Increment the nonce until the block hash starts with `difficulty` zero
    /// hex characters. Unbounded.
    pub fn mine(mut block: Block, difficulty: usize) -> Block {
        while !meets_difficulty(block.hash(), difficulty) {
            block.set_nonce(block.nonce().wrapping_add(1));
        }
        block
    }

    /// Same search as [`mine`], polling `cancel` every `CANCEL_CHECK_INTERVAL`
    /// attempts (and before the first one). Returns `None` once cancelled.
    pub fn mine_cancellable(mut block: Block, difficulty: usize, cancel: &AtomicBool) -> Option<Block> {
        let mut attempts: u64 = 0;
        loop {
            if meets_difficulty(block.hash(), difficulty) {
                return Some(block);
            }
            if attempts % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                return None;
            }
            attempts += 1;
            block.set_nonce(block.nonce().wrapping_add(1));
        }
    }

    /// Leading zero nibbles of a raw digest, i.e. the leading `'0'` characters
    /// of its hex form.
    pub fn count_leading_zero_nibbles(hash: &Hash) -> usize {
        let mut total = 0usize;
        for b in hash {
            if *b == 0 {
                total += 2;
            } else {
                if *b < 0x10 {
                    total += 1;
                }
                break;
            }
        }
        total
    }

    pub fn leading_zero_hex_digits(hash_hex: &str) -> usize {
        hash_hex.bytes().take_while(|c| *c == b'0').count()
    }

    pub fn meets_difficulty(hash_hex: &str, difficulty: usize) -> bool {
        leading_zero_hex_digits(hash_hex) >= difficulty
    }
}

use crate::config::{ChainConfig, MiningStrategy};
use crate::constants::{GENESIS_PREVIOUS_HASH, REWARD_SENDER};
use crate::error::{ChainError, ConfigError, TransactionError, ValidationError};
use crate::{mine, now_secs, pow, Block, Transaction};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, warn};

/// In-memory, single-writer chain. Never empty: block 0 is the genesis block.
///
/// Blocks are only appended by mining and are never changed afterwards, so
/// `blocks()` hands out shared references only.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawChain")]
pub struct Chain {
    blocks: Vec<Block>,
    pending_transactions: Vec<Transaction>,
    config: ChainConfig,
}

/// Wire shape of [`Chain`]; converted with the invariants checked.
#[derive(Deserialize)]
struct RawChain {
    blocks: Vec<Block>,
    #[serde(default)]
    pending_transactions: Vec<Transaction>,
    config: ChainConfig,
}

impl TryFrom<RawChain> for Chain {
    type Error = ChainError;

    fn try_from(raw: RawChain) -> Result<Self, Self::Error> {
        raw.config.validate()?;
        let genesis = raw.blocks.first().ok_or(ChainError::MissingGenesis)?;
        if genesis.index() != 0
            || genesis.previous_hash() != GENESIS_PREVIOUS_HASH
            || !genesis.transactions().is_empty()
            || !genesis.has_valid_hash()
        {
            return Err(ChainError::BadGenesis);
        }
        Ok(Self {
            blocks: raw.blocks,
            pending_transactions: raw.pending_transactions,
            config: raw.config,
        })
    }
}

impl Chain {
    /// Chain with the default reward and a custom difficulty.
    pub fn new(difficulty: usize) -> Result<Self, ConfigError> {
        Self::with_config(ChainConfig::with_difficulty(difficulty))
    }

    pub fn with_config(config: ChainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let genesis = Block::genesis(now_secs());
        debug!(hash = genesis.hash(), difficulty = config.difficulty, "created genesis block");
        Ok(Self {
            blocks: vec![genesis],
            pending_transactions: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: the genesis block is created with the chain.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The tip.
    pub fn latest_block(&self) -> &Block {
        // Constructors always push the genesis block and nothing pops.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Queue a transaction for the next block. No checks on identifiers or
    /// amount; see [`Chain::submit_transaction`] for the checked variant.
    pub fn add_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) {
        let tx = Transaction::new(sender, recipient, amount);
        debug!(sender = %tx.sender, recipient = %tx.recipient, amount = tx.amount, "transaction queued");
        self.pending_transactions.push(tx);
    }

    /// Queue a transaction after rejecting empty identifiers and negative or
    /// non-finite amounts.
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<(), TransactionError> {
        if tx.sender.is_empty() {
            return Err(TransactionError::EmptySender);
        }
        if tx.recipient.is_empty() {
            return Err(TransactionError::EmptyRecipient);
        }
        // -0.0 hashes differently from 0.0, so it is rejected with the negatives.
        if !tx.amount.is_finite() || tx.amount.is_sign_negative() {
            return Err(TransactionError::InvalidAmount(tx.amount));
        }
        self.add_transaction(tx.sender, tx.recipient, tx.amount);
        Ok(())
    }

    /// Pending transactions plus the reward, sealed into an unmined block on top
    /// of the current tip.
    fn candidate(&self, miner_address: &str) -> Block {
        let mut transactions = self.pending_transactions.clone();
        transactions.push(Transaction::new(
            REWARD_SENDER,
            miner_address,
            self.config.mining_reward,
        ));
        Block::new(
            self.blocks.len() as u64,
            transactions,
            now_secs(),
            self.latest_block().hash(),
        )
    }

    fn append(&mut self, block: Block) -> &Block {
        info!(
            "Mined block {} with nonce {} and hash {}",
            block.index(),
            block.nonce(),
            block.hash()
        );
        self.blocks.push(block);
        self.pending_transactions.clear();
        self.latest_block()
    }

    /// Pays the reward to `miner_address`, runs proof of work over the pending
    /// transactions and appends the result. Blocks the calling thread until a
    /// nonce is found; expected cost grows as 16^difficulty.
    pub fn mine_block(&mut self, miner_address: &str) -> &Block {
        let candidate = self.candidate(miner_address);
        let difficulty = self.difficulty();
        let sealed = match self.config.strategy {
            MiningStrategy::Sequential => pow::mine(candidate, difficulty),
            MiningStrategy::Parallel => mine::mine_parallel(candidate, difficulty),
        };
        self.append(sealed)
    }

    /// Like [`Chain::mine_block`] but gives up once `cancel` is set. Honours the
    /// configured strategy. A cancelled attempt leaves the blocks and the
    /// pending transactions untouched.
    pub fn mine_block_cancellable(
        &mut self,
        miner_address: &str,
        cancel: &AtomicBool,
    ) -> Result<&Block, ChainError> {
        let candidate = self.candidate(miner_address);
        let index = candidate.index();
        let difficulty = self.difficulty();
        let sealed = match self.config.strategy {
            MiningStrategy::Sequential => pow::mine_cancellable(candidate, difficulty, cancel),
            MiningStrategy::Parallel => mine::mine_parallel_cancellable(candidate, difficulty, cancel),
        };
        match sealed {
            Some(sealed) => Ok(self.append(sealed)),
            None => {
                info!(index, "mining cancelled");
                Err(ChainError::MiningCancelled { index })
            }
        }
    }

    /// Walks blocks `1..len` and reports the first one whose stored hash does
    /// not match its content, or whose previous hash does not match its
    /// predecessor. The genesis block is not checked against anything.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (index, pair) in self.blocks.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            let index = index + 1;

            if !current.has_valid_hash() {
                return Err(ValidationError::HashMismatch { index });
            }
            if current.previous_hash() != previous.hash() {
                return Err(ValidationError::BrokenLink { index });
            }
            if current.index() != index as u64 {
                return Err(ValidationError::IndexMismatch {
                    index,
                    found: current.index(),
                });
            }
            if !pow::meets_difficulty(current.hash(), self.difficulty()) {
                return Err(ValidationError::InsufficientWork {
                    index,
                    difficulty: self.difficulty(),
                });
            }
        }
        Ok(())
    }

    pub fn is_chain_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!(index = err.index(), "{err}");
                false
            }
        }
    }
}

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("difficulty must be between 1 and {max}, got {got}")]
    InvalidDifficulty { got: usize, max: usize },
    #[error("mining reward must be a finite non-negative number, got {0}")]
    InvalidReward(f64),
}

/// Rejections from [`crate::chain::Chain::submit_transaction`]. The unchecked
/// `add_transaction` path never produces these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransactionError {
    #[error("transaction sender is empty")]
    EmptySender,
    #[error("transaction recipient is empty")]
    EmptyRecipient,
    #[error("transaction amount must be finite and non-negative, got {0}")]
    InvalidAmount(f64),
}

/// First integrity failure found while walking the chain front to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid hash in block {index}")]
    HashMismatch { index: usize },
    #[error("chain broken at block {index}")]
    BrokenLink { index: usize },
    #[error("block at position {index} carries index {found}")]
    IndexMismatch { index: usize, found: u64 },
    #[error("block {index} does not meet difficulty {difficulty}")]
    InsufficientWork { index: usize, difficulty: usize },
}

impl ValidationError {
    /// Position in the chain of the offending block.
    pub fn index(&self) -> usize {
        match *self {
            ValidationError::HashMismatch { index }
            | ValidationError::BrokenLink { index }
            | ValidationError::IndexMismatch { index, .. }
            | ValidationError::InsufficientWork { index, .. } => index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("chain has no genesis block")]
    MissingGenesis,
    #[error("first block is not a genesis block")]
    BadGenesis,
    #[error("mining of block {index} was cancelled")]
    MiningCancelled { index: u64 },
}

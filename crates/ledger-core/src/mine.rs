use crate::{pow, Block, Hash};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Hasher state after the fixed part of the block; everything but the nonce.
fn prefix_state(candidate: &Block) -> Sha256 {
    let mut base = Sha256::new();
    base.update(candidate.prefix_bytes());
    base
}

fn digest_with_nonce(base: &Sha256, nonce: u64) -> Hash {
    base.clone().chain_update(nonce.to_le_bytes()).finalize().into()
}

/// Searches nonces `candidate.nonce()..u64::MAX` in parallel and returns the
/// lowest one whose hash meets `difficulty`, i.e. the nonce the sequential
/// search would stop at.
pub fn find_nonce_parallel(candidate: &Block, difficulty: usize) -> Option<u64> {
    let base = prefix_state(candidate);
    (candidate.nonce()..u64::MAX)
        .into_par_iter()
        .find_first(|nonce| pow::count_leading_zero_nibbles(&digest_with_nonce(&base, *nonce)) >= difficulty)
}

/// Parallel counterpart of [`pow::mine`].
pub fn mine_parallel(mut candidate: Block, difficulty: usize) -> Block {
    match find_nonce_parallel(&candidate, difficulty) {
        Some(nonce) => {
            candidate.set_nonce(nonce);
            candidate
        }
        None => {
            // Every nonce below u64::MAX failed; let the sequential search wrap.
            debug!(index = candidate.index(), "parallel nonce range exhausted");
            candidate.set_nonce(u64::MAX);
            pow::mine(candidate, difficulty)
        }
    }
}

/// Parallel counterpart of [`pow::mine_cancellable`]. Every attempt reads
/// `cancel`; the search stops at the lowest nonce that either meets
/// `difficulty` or saw the flag set, and only the former is returned.
pub fn mine_parallel_cancellable(
    mut candidate: Block,
    difficulty: usize,
    cancel: &AtomicBool,
) -> Option<Block> {
    let base = prefix_state(&candidate);
    let stop = (candidate.nonce()..u64::MAX).into_par_iter().find_first(|nonce| {
        cancel.load(Ordering::Relaxed)
            || pow::count_leading_zero_nibbles(&digest_with_nonce(&base, *nonce)) >= difficulty
    });
    match stop {
        Some(nonce) => {
            candidate.set_nonce(nonce);
            pow::meets_difficulty(candidate.hash(), difficulty).then_some(candidate)
        }
        None => {
            debug!(index = candidate.index(), "parallel nonce range exhausted");
            candidate.set_nonce(u64::MAX);
            pow::mine_cancellable(candidate, difficulty, cancel)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transaction;

    fn candidate() -> Block {
        let txs = vec![
            Transaction::new("Alice", "Bob", 50.0),
            Transaction::new("network", "Miner1", 10.0),
        ];
        Block::new(1, txs, 1_600_000_000, "0")
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let sequential = pow::mine(candidate(), 3);
        let parallel = mine_parallel(candidate(), 3);
        assert_eq!(sequential.nonce(), parallel.nonce());
        assert_eq!(sequential.hash(), parallel.hash());
    }

    #[test]
    fn parallel_result_is_consistent() {
        let mined = mine_parallel(candidate(), 2);
        assert!(mined.hash().starts_with("00"));
        assert!(mined.has_valid_hash());
    }

    #[test]
    fn already_solved_candidate_keeps_its_nonce() {
        let mined = pow::mine(candidate(), 2);
        assert_eq!(find_nonce_parallel(&mined, 2), Some(mined.nonce()));
    }

    #[test]
    fn cancelled_parallel_search_gives_up() {
        let cancel = AtomicBool::new(true);
        assert!(mine_parallel_cancellable(candidate(), crate::constants::MAX_DIFFICULTY, &cancel).is_none());
    }

    #[test]
    fn uncancelled_parallel_search_matches_sequential() {
        let cancel = AtomicBool::new(false);
        let sequential = pow::mine(candidate(), 2);
        let parallel = mine_parallel_cancellable(candidate(), 2, &cancel).unwrap();
        assert_eq!(sequential, parallel);
    }
}

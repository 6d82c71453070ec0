pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const REWARD_SENDER: &str = "network";
pub const MINING_REWARD: f64 = 10.0;
pub const DEFAULT_DIFFICULTY: usize = 4;
/// Difficulty is counted in hex characters, so it can't exceed the digest width.
pub const MAX_DIFFICULTY: usize = HASH_HEX_SIZE;
/// Nonce attempts between two checks of a cancellation flag.
pub const CANCEL_CHECK_INTERVAL: u64 = 1 << 12;

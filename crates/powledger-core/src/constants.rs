pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Leading zero hex characters a block hash needs.
pub const DIFFICULTY: usize = 5;
pub const GENESIS_TIMESTAMP: i64 = 0;
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";
/// Commitment recorded for a block sealing no transactions.
pub const EMPTY_MERKLE_HASH: &str = "";

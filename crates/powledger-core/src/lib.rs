//! Ledger core: transactions, Merkle commitments, proof-of-work blocks and
//! longest-valid-chain consensus. Transport lives elsewhere; peers hand their
//! chains in as [`PeerSnapshot`]s.

use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod block;
pub mod chain;
pub mod consensus;
pub mod constants;
pub mod error;
pub mod merkle;
pub mod pow;
pub mod transaction;

pub use block::{meets_difficulty, Block};
pub use chain::{BlockChain, ChainConfig};
pub use consensus::{is_valid_chain, PeerSnapshot};
pub use error::{ChainError, PeerError, SealError};
pub use merkle::calc_merkle_hash;
pub use pow::{Attempt, BlockTemplate, Nonces, ProofSearch};
pub use transaction::Transaction;

/// Lower-case hex SHA-256 digest.
pub type HashHex = String;

pub fn sha256_hex(bytes: &[u8]) -> HashHex {
    hex::encode(Sha256::digest(bytes))
}

/// Seconds since the unix epoch; 0 if the clock is before it.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

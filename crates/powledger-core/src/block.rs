use crate::{error::SealError, merkle::calc_merkle_hash, sha256_hex, HashHex, Transaction};
use serde::{Deserialize, Serialize};

/// True when the first `difficulty` characters of `hash` are all `'0'`.
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// A sealed, hash-linked unit of the chain.
///
/// Blocks only come out of [`Block::new`] (which enforces the difficulty
/// target) or from deserializing a peer's chain, which consensus re-checks
/// with [`Block::verify`]. There are no mutators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain. Not hashed; [`crate::is_valid_chain`] checks it
    /// against the block's index.
    #[serde(default)]
    height: u64,
    timestamp: i64,
    nonce: u64,
    hash: HashHex,
    previous_hash: HashHex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    merkle_hash: Option<HashHex>,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

/// The hashed subset of a block. `height` and `hash` are not part of it.
#[derive(Serialize)]
struct HashSeed<'a> {
    timestamp: i64,
    nonce: u64,
    previous_hash: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    merkle_hash: Option<&'a str>,
    transactions: &'a [Transaction],
}

impl Block {
    /// Builds a candidate and seals it if its hash meets `difficulty`.
    ///
    /// [`SealError::InsufficientWork`] is the expected outcome for most nonces.
    pub fn new(
        height: u64,
        timestamp: i64,
        nonce: u64,
        previous_hash: impl Into<HashHex>,
        merkle_hash: Option<HashHex>,
        transactions: Vec<Transaction>,
        difficulty: usize,
    ) -> Result<Self, SealError> {
        let mut block = Self {
            height,
            timestamp,
            nonce,
            hash: HashHex::new(),
            previous_hash: previous_hash.into(),
            merkle_hash,
            transactions,
        };
        let hash = block.compute_hash()?;
        if !meets_difficulty(&hash, difficulty) {
            return Err(SealError::InsufficientWork { hash, difficulty });
        }
        block.hash = hash;
        Ok(block)
    }

    /// Hash of the canonical seed built from this block's own fields.
    pub fn compute_hash(&self) -> Result<HashHex, serde_json::Error> {
        hash_seed(
            self.timestamp,
            self.nonce,
            &self.previous_hash,
            self.merkle_hash.as_deref(),
            &self.transactions,
        )
    }

    /// Re-checks a block that did not come out of [`Block::new`] locally.
    pub fn verify(&self, difficulty: usize) -> bool {
        let Ok(hash) = self.compute_hash() else {
            return false;
        };
        if hash != self.hash || !meets_difficulty(&hash, difficulty) {
            return false;
        }
        match &self.merkle_hash {
            Some(commitment) => calc_merkle_hash(&self.transactions)
                .map(|root| &root == commitment)
                .unwrap_or(false),
            None => true,
        }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn merkle_hash(&self) -> Option<&str> {
        self.merkle_hash.as_deref()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

pub(crate) fn hash_seed(
    timestamp: i64,
    nonce: u64,
    previous_hash: &str,
    merkle_hash: Option<&str>,
    transactions: &[Transaction],
) -> Result<HashHex, serde_json::Error> {
    let seed = HashSeed {
        timestamp,
        nonce,
        previous_hash,
        merkle_hash,
        transactions,
    };
    Ok(sha256_hex(&serde_json::to_vec(&seed)?))
}

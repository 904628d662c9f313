use thiserror::Error;

/// Why a candidate block could not be sealed.
#[derive(Debug, Error)]
pub enum SealError {
    /// The hash does not start with enough zeros; try the next nonce.
    #[error("hash {hash} does not meet difficulty {difficulty}")]
    InsufficientWork { hash: String, difficulty: usize },
    #[error("failed to encode block for hashing: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("nonce {nonce} no longer seals the pending transactions")]
    MiningFailed {
        nonce: u64,
        #[source]
        source: SealError,
    },
    #[error("proof-of-work search cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },
    #[error(transparent)]
    Encoding(#[from] serde_json::Error),
}

/// Failure to obtain a peer's chain snapshot. Never fatal to consensus.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeerError {
    #[error("peer unreachable: {0}")]
    Transport(String),
    #[error("peer answered with http status {0}")]
    Status(u16),
    #[error("peer sent a malformed chain: {0}")]
    Malformed(String),
}

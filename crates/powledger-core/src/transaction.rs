use crate::{sha256_hex, unix_now, HashHex};
use serde::{Deserialize, Serialize};

/// A value transfer waiting in the pool or sealed into a block.
///
/// Field order is part of the canonical encoding: changing it changes every hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: i64,
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self::with_timestamp(unix_now(), sender, recipient, amount)
    }

    pub fn with_timestamp(
        timestamp: i64,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: u64,
    ) -> Self {
        Self {
            timestamp,
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Copy of this transaction carrying a different timestamp.
    pub fn stamped(&self, timestamp: i64) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }

    /// SHA-256 of the compact JSON encoding, hex encoded.
    pub fn hash(&self) -> Result<HashHex, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(sha256_hex(&bytes))
    }
}

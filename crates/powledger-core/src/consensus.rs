//! Longest-valid-chain conflict resolution.

use crate::{block::Block, chain::BlockChain, error::PeerError};
use tracing::{debug, info, warn};

/// One peer's answer to "send me your chain".
#[derive(Clone, Debug)]
pub struct PeerSnapshot {
    pub node: String,
    pub result: Result<Vec<Block>, PeerError>,
}

impl PeerSnapshot {
    pub fn ok(node: impl Into<String>, chain: Vec<Block>) -> Self {
        Self {
            node: node.into(),
            result: Ok(chain),
        }
    }

    pub fn err(node: impl Into<String>, err: PeerError) -> Self {
        Self {
            node: node.into(),
            result: Err(err),
        }
    }
}

/// Every block must verify on its own, sit at the height it claims and link
/// to its predecessor. An empty chain is trivially valid.
pub fn is_valid_chain(chain: &[Block], difficulty: usize) -> bool {
    let Some(first) = chain.first() else {
        return true;
    };
    if first.height() != 0 || !first.verify(difficulty) {
        return false;
    }
    chain.windows(2).enumerate().all(|(i, pair)| {
        pair[1].height() == i as u64 + 1
            && pair[1].previous_hash() == pair[0].hash()
            && pair[1].verify(difficulty)
    })
}

impl BlockChain {
    /// Replaces the local chain with a longer valid peer chain, if any.
    ///
    /// Snapshots are scanned in order. A chain is taken only when it is
    /// strictly longer than the best seen so far (starting from the local
    /// length) and validates; the bar then rises to its length, so a later
    /// chain of equal length never displaces an earlier one. Failed peers are
    /// logged and skipped. The pool is never touched.
    pub fn resolve_conflicts<I>(&mut self, snapshots: I) -> bool
    where
        I: IntoIterator<Item = PeerSnapshot>,
    {
        let difficulty = self.config().difficulty;
        let mut max_length = self.len();
        let mut new_chain: Option<(String, Vec<Block>)> = None;

        for PeerSnapshot { node, result } in snapshots {
            let chain = match result {
                Ok(chain) => chain,
                Err(err) => {
                    warn!(%node, %err, "skipping peer");
                    continue;
                }
            };
            if chain.len() <= max_length {
                debug!(%node, len = chain.len(), max_length, "peer chain not longer");
                continue;
            }
            if !is_valid_chain(&chain, difficulty) {
                warn!(%node, len = chain.len(), "peer chain failed validation");
                continue;
            }
            max_length = chain.len();
            new_chain = Some((node, chain));
        }

        match new_chain {
            Some((node, chain)) => {
                info!(%node, from = self.len(), to = chain.len(), "replacing local chain");
                self.replace_chain(chain);
                true
            }
            None => false,
        }
    }
}

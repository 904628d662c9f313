use crate::{
    block::Block,
    constants::{DIFFICULTY, GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP},
    error::ChainError,
    merkle::calc_merkle_hash,
    pow::{BlockTemplate, ProofSearch},
    unix_now, Transaction,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, warn};

/// Per-instance settings. Every node that shares a chain must agree on
/// `difficulty` and `merkle`, otherwise they reject each other's blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub difficulty: usize,
    /// Commit transactions with a Merkle root in each block.
    pub merkle: bool,
    /// Replace submitted transaction timestamps with the time of receipt.
    pub stamp_on_receipt: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DIFFICULTY,
            merkle: true,
            stamp_on_receipt: true,
        }
    }
}

/// The local ledger: sealed blocks, the pending pool and known peers.
///
/// Not internally synchronised. A server wraps the whole value in one lock.
#[derive(Clone, Debug, Serialize)]
pub struct BlockChain {
    #[serde(skip)]
    config: ChainConfig,
    chain: Vec<Block>,
    #[serde(rename = "current_transactions")]
    pool: Vec<Transaction>,
    nodes: Vec<String>,
}

impl BlockChain {
    /// Creates a chain and mines its genesis block.
    pub fn new(config: ChainConfig) -> Result<Self, ChainError> {
        let mut chain = Self {
            config,
            chain: Vec::new(),
            pool: Vec::new(),
            nodes: Vec::new(),
        };
        let nonce = chain.proof_of_work(GENESIS_TIMESTAMP)?;
        let genesis = chain.add_block(GENESIS_TIMESTAMP, nonce)?;
        info!(hash = %genesis.hash(), nonce, "genesis block mined");
        Ok(chain)
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pool
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    fn previous_hash(&self) -> &str {
        self.last_block()
            .map(Block::hash)
            .unwrap_or(GENESIS_PREVIOUS_HASH)
    }

    /// Queues a copy of `tx` for the next block and returns the pooled copy.
    pub fn add_transaction(&mut self, tx: &Transaction) -> &Transaction {
        let tx = if self.config.stamp_on_receipt {
            tx.stamped(unix_now())
        } else {
            tx.clone()
        };
        debug!(sender = %tx.sender, recipient = %tx.recipient, amount = tx.amount, "transaction pooled");
        self.pool.push(tx);
        &self.pool[self.pool.len() - 1]
    }

    /// Registers a peer base URL. Duplicates are ignored.
    pub fn add_node(&mut self, node: &str) -> bool {
        let node = node.trim().trim_end_matches('/');
        if node.is_empty() || self.nodes.iter().any(|n| n == node) {
            return false;
        }
        self.nodes.push(node.to_string());
        true
    }

    /// Snapshot of everything the next block would contain except its nonce.
    /// The Merkle root is computed here, once, before any search starts.
    pub fn block_template(&self, timestamp: i64) -> Result<BlockTemplate, ChainError> {
        let merkle_hash = if self.config.merkle {
            Some(calc_merkle_hash(&self.pool)?)
        } else {
            None
        };
        Ok(BlockTemplate {
            height: self.chain.len() as u64,
            timestamp,
            previous_hash: self.previous_hash().to_string(),
            merkle_hash,
            transactions: self.pool.clone(),
            difficulty: self.config.difficulty,
        })
    }

    pub fn proof_search(&self, timestamp: i64) -> Result<ProofSearch, ChainError> {
        Ok(ProofSearch::new(self.block_template(timestamp)?))
    }

    /// Finds the first nonce sealing the current pool at `timestamp`. Blocks
    /// the calling thread until it succeeds.
    pub fn proof_of_work(&self, timestamp: i64) -> Result<u64, ChainError> {
        Ok(self.proof_search(timestamp)?.solve())
    }

    /// Seals the whole pool with a nonce found by [`Self::proof_of_work`].
    ///
    /// On failure nothing changes: the pool is kept and no block is appended.
    pub fn add_block(&mut self, timestamp: i64, nonce: u64) -> Result<&Block, ChainError> {
        let block = self
            .block_template(timestamp)?
            .seal(nonce)
            .map_err(|source| ChainError::MiningFailed { nonce, source })?;
        self.pool.clear();
        self.chain.push(block);
        Ok(&self.chain[self.chain.len() - 1])
    }

    /// Proof-of-work followed by [`Self::add_block`].
    pub fn mine(&mut self, timestamp: i64) -> Result<&Block, ChainError> {
        let nonce = self.proof_of_work(timestamp)?;
        let block = self.add_block(timestamp, nonce)?;
        info!(height = block.height(), hash = %block.hash(), nonce, txs = block.transactions().len(), "block mined");
        Ok(block)
    }

    /// Like [`Self::mine`] but gives up once `cancel` is raised.
    pub fn mine_until(&mut self, timestamp: i64, cancel: &AtomicBool) -> Result<&Block, ChainError> {
        let mut search = self.proof_search(timestamp)?;
        let Some(nonce) = search.solve_until(cancel) else {
            warn!(attempts = search.attempts(), "mining cancelled before a nonce was found");
            return Err(ChainError::Cancelled {
                attempts: search.attempts(),
            });
        };
        let block = self.add_block(timestamp, nonce)?;
        info!(height = block.height(), hash = %block.hash(), nonce, txs = block.transactions().len(), "block mined");
        Ok(block)
    }

    /// Swaps in `chain` wholesale. Callers validate first.
    pub(crate) fn replace_chain(&mut self, chain: Vec<Block>) {
        self.chain = chain;
    }

    /// Pretty JSON of chain, pool and peers for diagnostics.
    pub fn dump(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|err| format!("<unprintable chain: {err}>"))
    }
}

//! Sequential proof-of-work search.
//!
//! [`ProofSearch`] is a lazy, infinite iterator: each `next()` is exactly one
//! attempt. Callers that need a timeout or cancellation bound the iterator
//! (or use [`ProofSearch::solve_within`] / [`ProofSearch::solve_until`])
//! instead of the search growing knobs of its own.

use crate::{block::Block, error::SealError, HashHex, Transaction};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// How often `solve_until` looks at its cancellation flag.
const CANCEL_CHECK_INTERVAL: u64 = 64;

/// Candidate nonces `0, 1, 2, ...`. Infinite; restart with [`Nonces::restart`].
#[derive(Clone, Debug, Default)]
pub struct Nonces {
    next: u64,
}

impl Nonces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restart(&mut self) {
        self.next = 0;
    }
}

impl Iterator for Nonces {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let nonce = self.next;
        self.next = self.next.wrapping_add(1);
        Some(nonce)
    }
}

/// Everything in a candidate block except the nonce.
#[derive(Clone, Debug)]
pub struct BlockTemplate {
    pub height: u64,
    pub timestamp: i64,
    pub previous_hash: HashHex,
    pub merkle_hash: Option<HashHex>,
    pub transactions: Vec<Transaction>,
    pub difficulty: usize,
}

impl BlockTemplate {
    pub fn seal(&self, nonce: u64) -> Result<Block, SealError> {
        Block::new(
            self.height,
            self.timestamp,
            nonce,
            self.previous_hash.clone(),
            self.merkle_hash.clone(),
            self.transactions.clone(),
            self.difficulty,
        )
    }

    fn satisfied_by(&self, nonce: u64) -> bool {
        match crate::block::hash_seed(
            self.timestamp,
            nonce,
            &self.previous_hash,
            self.merkle_hash.as_deref(),
            &self.transactions,
        ) {
            Ok(hash) => crate::block::meets_difficulty(&hash, self.difficulty),
            Err(err) => {
                trace!(nonce, %err, "candidate could not be encoded");
                false
            }
        }
    }
}

/// Result of a single proof-of-work attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attempt {
    pub nonce: u64,
    pub solved: bool,
}

#[derive(Clone, Debug)]
pub struct ProofSearch {
    template: BlockTemplate,
    nonces: Nonces,
    attempts: u64,
}

impl ProofSearch {
    pub fn new(template: BlockTemplate) -> Self {
        Self {
            template,
            nonces: Nonces::new(),
            attempts: 0,
        }
    }

    pub fn template(&self) -> &BlockTemplate {
        &self.template
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Back to nonce 0 with the same template.
    pub fn restart(&mut self) {
        self.nonces.restart();
        self.attempts = 0;
    }

    /// Runs until a nonce is found. Unbounded.
    pub fn solve(mut self) -> u64 {
        loop {
            if let Some(nonce) = self.step() {
                return nonce;
            }
        }
    }

    /// Gives up after `max_attempts` attempts.
    pub fn solve_within(&mut self, max_attempts: u64) -> Option<u64> {
        (0..max_attempts).find_map(|_| self.step())
    }

    /// Runs until a nonce is found or `cancel` is raised.
    pub fn solve_until(&mut self, cancel: &AtomicBool) -> Option<u64> {
        loop {
            if self.attempts % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                debug!(attempts = self.attempts, "proof-of-work search cancelled");
                return None;
            }
            if let Some(nonce) = self.step() {
                return Some(nonce);
            }
        }
    }

    fn step(&mut self) -> Option<u64> {
        self.next().filter(|a| a.solved).map(|a| a.nonce)
    }
}

impl Iterator for ProofSearch {
    type Item = Attempt;

    fn next(&mut self) -> Option<Attempt> {
        let nonce = self.nonces.next()?;
        self.attempts += 1;
        Some(Attempt {
            nonce,
            solved: self.template.satisfied_by(nonce),
        })
    }
}

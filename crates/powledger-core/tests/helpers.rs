#![allow(dead_code)]

use powledger_core::{BlockChain, ChainConfig, Transaction};
use rand::{rngs::StdRng, Rng, SeedableRng};

pub const TEST_DIFFICULTY: usize = 2;

pub fn test_config() -> ChainConfig {
    ChainConfig {
        difficulty: TEST_DIFFICULTY,
        merkle: true,
        stamp_on_receipt: false,
    }
}

pub fn random_transactions(seed: u64, count: usize) -> Vec<Transaction> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            Transaction::with_timestamp(
                1_600_000_000 + i as i64,
                format!("addr_from_{}", rng.gen_range(0..100)),
                format!("addr_to_{}", rng.gen_range(0..100)),
                rng.gen_range(1..1_000),
            )
        })
        .collect()
}

/// A chain with `blocks` blocks in total, each non-genesis block sealing a
/// few random transactions.
pub fn mined_chain(blocks: usize, seed: u64) -> BlockChain {
    let mut chain = BlockChain::new(test_config()).expect("genesis");
    for height in 1..blocks {
        for tx in random_transactions(seed + height as u64, 3) {
            chain.add_transaction(&tx);
        }
        chain
            .mine(1_600_000_000 + height as i64)
            .expect("mining at test difficulty");
    }
    chain
}

//! Merkle commitment over a block's transactions.
//!
//! The tree is padded to the next power of two, but padding is implicit: a
//! right subtree with no transactions reuses the hash of its left sibling.
//! Inner nodes hash the concatenated hex strings of their children.

use crate::{constants::EMPTY_MERKLE_HASH, sha256_hex, HashHex, Transaction};

/// Smallest power of two >= `n`. `0` wraps to `0`.
pub fn roundup_power_of_two(n: u32) -> u32 {
    let mut x = n.wrapping_sub(1);
    x |= x >> 1;
    x |= x >> 2;
    x |= x >> 4;
    x |= x >> 8;
    x |= x >> 16;
    x.wrapping_add(1)
}

pub fn calc_merkle_hash(txs: &[Transaction]) -> Result<HashHex, serde_json::Error> {
    if txs.is_empty() {
        return Ok(EMPTY_MERKLE_HASH.to_string());
    }
    let size = roundup_power_of_two(txs.len() as u32) as usize;
    merkle_root(txs, size)
}

fn merkle_root(txs: &[Transaction], size: usize) -> Result<HashHex, serde_json::Error> {
    if size == 1 {
        return txs[0].hash();
    }
    let half = size / 2;
    let left = merkle_root(&txs[..txs.len().min(half)], half)?;
    let right = if txs.len() > half {
        merkle_root(&txs[half..], half)?
    } else {
        left.clone()
    };
    Ok(sha256_hex(format!("{left}{right}").as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Vec<Transaction> {
        vec![
            Transaction::with_timestamp(1_600_000_000, "Alice", "Bob", 10),
            Transaction::with_timestamp(1_600_000_100, "Bob", "Carol", 5),
            Transaction::with_timestamp(1_600_000_200, "Carol", "Dave", 2),
        ]
    }

    #[test]
    fn roundup_examples() {
        assert_eq!(roundup_power_of_two(1), 1);
        assert_eq!(roundup_power_of_two(2), 2);
        assert_eq!(roundup_power_of_two(3), 4);
        assert_eq!(roundup_power_of_two(5), 8);
        assert_eq!(roundup_power_of_two(8), 8);
        assert_eq!(roundup_power_of_two(1000), 1024);
        assert_eq!(roundup_power_of_two(1 << 20), 1 << 20);
        assert_eq!(roundup_power_of_two(0), 0);
    }

    #[test]
    fn empty_is_sentinel() {
        assert_eq!(calc_merkle_hash(&[]).unwrap(), "");
    }

    #[test]
    fn single_is_leaf_hash() {
        let txs = abc();
        assert_eq!(calc_merkle_hash(&txs[..1]).unwrap(), txs[0].hash().unwrap());
    }

    #[test]
    fn two_txs_hash_concatenated_leaves() {
        let txs = abc();
        let expected = sha256_hex(
            format!("{}{}", txs[0].hash().unwrap(), txs[1].hash().unwrap()).as_bytes(),
        );
        assert_eq!(calc_merkle_hash(&txs[..2]).unwrap(), expected);
        assert_eq!(
            expected,
            "f9c3b33ca3b09b2fdd53d785a7813e74bb42dadeac092ac779bea3db1acddd3a"
        );
    }

    #[test]
    fn three_txs_reuse_left_hash_as_padding() {
        let txs = abc();
        let (a, b, c) = (
            txs[0].hash().unwrap(),
            txs[1].hash().unwrap(),
            txs[2].hash().unwrap(),
        );
        let left = sha256_hex(format!("{a}{b}").as_bytes());
        let right = sha256_hex(format!("{c}{c}").as_bytes());
        let manual = sha256_hex(format!("{left}{right}").as_bytes());

        let root = calc_merkle_hash(&txs).unwrap();
        assert_eq!(root, manual);
        assert_eq!(
            root,
            "92e4bab224768f586165e52f835072e5f714d6dc309e1deb1e53884414215f42"
        );
    }

    #[test]
    fn order_matters() {
        let mut txs = abc();
        let root = calc_merkle_hash(&txs).unwrap();
        txs.swap(0, 1);
        assert_ne!(calc_merkle_hash(&txs).unwrap(), root);
    }
}

mod helpers;

use helpers::{mined_chain, random_transactions, test_config, TEST_DIFFICULTY};
use powledger_core::{
    constants::GENESIS_PREVIOUS_HASH, is_valid_chain, meets_difficulty, Block, BlockChain,
    PeerError, PeerSnapshot, Transaction,
};

#[test]
fn fresh_chain_mine_two_transactions() {
    let mut chain = BlockChain::new(test_config()).unwrap();
    assert_eq!(chain.len(), 1);
    let genesis_hash = chain.chain()[0].hash().to_string();

    chain.add_transaction(&Transaction::new("Alice", "Bob", 10));
    chain.add_transaction(&Transaction::new("Bob", "Carol", 5));
    let pooled = chain.pending().to_vec();

    let block = chain.mine(powledger_core::unix_now()).unwrap().clone();

    assert_eq!(chain.len(), 2);
    assert!(chain.pending().is_empty());
    assert_eq!(block.previous_hash(), genesis_hash);
    assert!(meets_difficulty(block.hash(), TEST_DIFFICULTY));
    assert_eq!(block.transactions(), pooled.as_slice());
    assert!(is_valid_chain(chain.chain(), TEST_DIFFICULTY));
}

#[test]
fn every_block_links_and_meets_difficulty() {
    let chain = mined_chain(6, 11);
    let blocks = chain.chain();
    assert_eq!(blocks[0].previous_hash(), GENESIS_PREVIOUS_HASH);
    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(block.height(), i as u64);
        assert!(meets_difficulty(block.hash(), TEST_DIFFICULTY));
        assert!(block.verify(TEST_DIFFICULTY));
        if i > 0 {
            assert_eq!(block.previous_hash(), blocks[i - 1].hash());
        }
    }
}

#[test]
fn empty_pool_still_mines() {
    let mut chain = BlockChain::new(test_config()).unwrap();
    let block = chain.mine(1_600_000_000).unwrap();
    assert!(block.transactions().is_empty());
    assert_eq!(block.merkle_hash(), Some(""));
}

#[test]
fn chain_round_trips_through_json_and_still_validates() {
    let chain = mined_chain(4, 3);
    let json = serde_json::to_string(chain.chain()).unwrap();
    let decoded: Vec<Block> = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, chain.chain());
    assert!(is_valid_chain(&decoded, TEST_DIFFICULTY));
}

#[test]
fn chain_from_peer_without_heights_is_rejected() {
    let chain = mined_chain(3, 5);
    let mut value = serde_json::to_value(chain.chain()).unwrap();
    for block in value.as_array_mut().unwrap() {
        block.as_object_mut().unwrap().remove("height");
    }
    let decoded: Vec<Block> = serde_json::from_value(value).unwrap();
    assert!(decoded.iter().all(|b| b.height() == 0));
    assert!(is_valid_chain(&decoded[..1], TEST_DIFFICULTY));
    assert!(!is_valid_chain(&decoded, TEST_DIFFICULTY));
}

#[test]
fn swapped_transaction_breaks_block() {
    let chain = mined_chain(3, 9);
    let mut value = serde_json::to_value(chain.chain()).unwrap();
    value[1]["transactions"][0] =
        serde_json::to_value(&random_transactions(999, 1)[0]).unwrap();
    let forged: Vec<Block> = serde_json::from_value(value).unwrap();
    assert!(!is_valid_chain(&forged, TEST_DIFFICULTY));
}

#[test]
fn resolve_against_two_peers() {
    let mut local = mined_chain(3, 1);
    let short = mined_chain(2, 2);
    let long = mined_chain(5, 3);

    assert!(local.resolve_conflicts([
        PeerSnapshot::ok("http://short", short.chain().to_vec()),
        PeerSnapshot::err("http://gone", PeerError::Transport("connection refused".into())),
        PeerSnapshot::ok("http://long", long.chain().to_vec()),
    ]));
    assert_eq!(local.len(), 5);
    assert_eq!(local.chain(), long.chain());

    // Mining continues on top of the adopted chain.
    local.add_transaction(&Transaction::with_timestamp(1, "Dave", "Erin", 3));
    let block = local.mine(1_700_000_000).unwrap();
    assert_eq!(block.previous_hash(), long.chain()[4].hash());
    assert_eq!(block.height(), 5);
}

#[test]
fn resolve_rejects_short_and_invalid() {
    let mut local = mined_chain(3, 1);
    let before = local.chain().to_vec();

    let mut value = serde_json::to_value(mined_chain(6, 4).chain()).unwrap();
    let genesis_hash = value[0]["hash"].clone();
    value[2]["previous_hash"] = genesis_hash;
    let tampered: Vec<Block> = serde_json::from_value(value).unwrap();

    assert!(!local.resolve_conflicts([
        PeerSnapshot::ok("http://same", mined_chain(3, 2).chain().to_vec()),
        PeerSnapshot::ok("http://tampered", tampered),
    ]));
    assert_eq!(local.chain(), before.as_slice());
}

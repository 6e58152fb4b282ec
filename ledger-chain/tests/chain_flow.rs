use ledger_chain::ChainManager;
use ledger_core::{Address, Block, Transaction};
use ledger_db::DatabaseConfig;
use tempfile::TempDir;

fn transfer(from: &str, to: &str, nonce: u64, value: u64) -> Transaction {
    Transaction::new(Address::from(from), Address::from(to), nonce, value)
}

fn open(dir: &TempDir) -> ChainManager {
    let config = DatabaseConfig {
        flush_every_ms: None,
        ..DatabaseConfig::new(dir.path())
    };
    ChainManager::open_path(&config).unwrap()
}

#[test]
fn test_append_and_iterate() {
    let dir = TempDir::new().unwrap();
    let mut chain = open(&dir);

    let genesis_hash = chain.head();
    assert_eq!(chain.height(), 1);

    let tx1 = transfer("alice", "bob", 0, 100);
    let tx2 = transfer("bob", "carol", 0, 40);
    let tx3 = transfer("carol", "alice", 0, 15);

    chain.add_block(vec![tx1.clone()]).unwrap();
    chain.add_block(vec![tx2.clone(), tx3.clone()]).unwrap();
    assert_eq!(chain.height(), 3);

    let blocks: Vec<Block> = chain.iter().collect::<Result<_, _>>().unwrap();
    assert_eq!(blocks.len(), 3);

    assert_eq!(blocks[0].transactions, vec![tx2, tx3]);
    assert_eq!(blocks[1].transactions, vec![tx1]);
    assert!(blocks[2].is_genesis());
    assert_eq!(blocks[2].hash(), genesis_hash);

    let heights: Vec<i64> = blocks.iter().map(|b| b.height).collect();
    assert_eq!(heights, vec![2, 1, 0]);

    assert_eq!(blocks[0].hash(), chain.head());
    assert_eq!(blocks[0].priori(), blocks[1].hash());
    assert_eq!(blocks[1].priori(), blocks[2].hash());
    assert!(blocks[2].priori().is_null());

    for block in &blocks {
        assert!(block.header.validate().unwrap());
    }
    assert_eq!(chain.verify_chain().unwrap(), 3);

    chain.stop().unwrap();
}

#[test]
fn test_reopen_loads_state() {
    let dir = TempDir::new().unwrap();

    let (head, height) = {
        let mut chain = open(&dir);
        chain
            .add_block(vec![transfer("alice", "bob", 0, 1)])
            .unwrap();
        let state = (chain.head(), chain.height());
        chain.stop().unwrap();
        state
    };

    let mut chain = open(&dir);
    assert_eq!(chain.head(), head);
    assert_eq!(chain.height(), height);

    let block = chain
        .add_block(vec![transfer("alice", "bob", 1, 1)])
        .unwrap();
    assert_eq!(block.priori(), head);
    assert_eq!(block.height, height);
    assert_eq!(chain.iter().count(), 3);
    chain.stop().unwrap();
}

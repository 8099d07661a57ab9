//! Commit, reveal, result and pulse publication across validators.

use super::harness::{Devnet, Scenario, CHAIN};
use gc_02_ledger_store::LedgerRead;
use gc_04_oracle_round::result_hash;
use shared_types::Value;

/// External height the ledger bound to pulse round `round`.
fn pulse_height(net: &Devnet, round: u64) -> u64 {
    net.read(|view| view.round_height(CHAIN, round))
        .unwrap()
        .expect("round bound")
}

#[tokio::test]
async fn test_validators_publish_mean_of_reveals() {
    let mut net = Devnet::new(Scenario {
        values: vec![10, 20, 30],
        consul_count: 3,
        bft_value: 2,
    });
    // Round 1 starts before anyone holds a commit; round 2 is the first
    // full pass and finalizes at height 11.
    net.run_to(16).await;

    let pulse = pulse_height(&net, 2);
    let (reveals, results) = net.read(|view| {
        (
            view.reveals(CHAIN, &net.nebula, pulse).unwrap(),
            view.results(CHAIN, &net.nebula, pulse).unwrap(),
        )
    });
    assert_eq!(reveals.len(), 3);
    assert_eq!(results.len(), 3);

    let contract = net.chain.nebula(&net.nebula).unwrap();
    assert!(contract.last_pulse_id() >= 1);
    assert_eq!(contract.pulses[&1], result_hash(&Value::Int64(20)));
}

#[tokio::test]
async fn test_equal_reveals_from_distinct_oracles_all_count() {
    let mut net = Devnet::new(Scenario {
        values: vec![10, 10, 40],
        consul_count: 3,
        bft_value: 2,
    });
    net.run_to(16).await;

    let pulse = pulse_height(&net, 2);
    let reveals = net.read(|view| view.reveals(CHAIN, &net.nebula, pulse).unwrap());
    assert_eq!(reveals.len(), 3);
    for validator in &net.validators {
        let own = net.read(|view| {
            view.reveal(CHAIN, &net.nebula, pulse, &validator.oracle_key)
                .unwrap()
        });
        assert!(own.is_some());
    }

    // (10 + 10 + 40) / 3, not the mean of the distinct values.
    let contract = net.chain.nebula(&net.nebula).unwrap();
    assert_eq!(contract.pulses[&1], result_hash(&Value::Int64(20)));
}

#[tokio::test]
async fn test_every_oracle_signs_the_same_hash() {
    let mut net = Devnet::new(Scenario {
        values: vec![1, 2, 4],
        consul_count: 3,
        bft_value: 3,
    });
    net.run_to(16).await;

    // (1 + 2 + 4) / 3 rounds to 2. All three signatures verify against it,
    // otherwise bft value 3 could not be met.
    let contract = net.chain.nebula(&net.nebula).unwrap();
    assert_eq!(contract.pulses.get(&1), Some(&result_hash(&Value::Int64(2))));
}

#[tokio::test]
async fn test_pulse_withheld_below_bft_value() {
    let mut net = Devnet::new(Scenario {
        values: vec![5, 5, 5],
        consul_count: 3,
        bft_value: 3,
    });
    net.muted.insert(2);
    net.run_to(16).await;

    let pulse = pulse_height(&net, 2);
    let (reveals, results) = net.read(|view| {
        (
            view.reveals(CHAIN, &net.nebula, pulse).unwrap(),
            view.results(CHAIN, &net.nebula, pulse).unwrap(),
        )
    });
    assert_eq!(reveals.len(), 2);
    assert_eq!(results.len(), 2);
    assert!(!results.contains_key(&net.validators[2].oracle_key));
    assert_eq!(net.chain.nebula(&net.nebula).unwrap().last_pulse_id(), 0);
}

#[tokio::test]
async fn test_ledger_keeps_going_while_chain_is_down() {
    let mut net = Devnet::new(Scenario::uniform(3, 5));
    net.chain.set_offline(true);
    net.run_to(8).await;
    assert_eq!(net.ledger.height(), 8);
    // Nobody could read an external height, so no round was bound.
    assert_eq!(net.read(|view| view.round_height(CHAIN, 1)).unwrap(), None);

    net.chain.set_offline(false);
    net.run_to(20).await;
    assert!(net.chain.nebula(&net.nebula).unwrap().last_pulse_id() >= 1);
}

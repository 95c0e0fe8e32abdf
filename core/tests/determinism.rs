//! THE MOST IMPORTANT TEST IN THE PROJECT.
//!
//! Same seed, same config → byte-identical tables.
//! Any divergence is a blocker.

use usagegen_core::{generate, GeneratorConfig};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn tables_json(config: &GeneratorConfig, seed: u64) -> (String, String, String) {
    let ds = generate(config, seed).expect("generation");
    (
        serde_json::to_string(&ds.attributes).expect("attributes json"),
        serde_json::to_string(&ds.usage).expect("usage json"),
        serde_json::to_string(&ds.churn).expect("churn json"),
    )
}

#[test]
fn same_seed_produces_identical_tables() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;
    init_logging();
    let mut config = GeneratorConfig::default_test();
    config.num_accounts = 200;

    let a = tables_json(&config, SEED);
    let b = tables_json(&config, SEED);

    assert_eq!(a.0, b.0, "attribute table diverged");
    assert_eq!(a.1, b.1, "usage table diverged");
    assert_eq!(a.2, b.2, "churn table diverged");
}

#[test]
fn different_seeds_produce_different_tables() {
    let config = GeneratorConfig::default_test();
    let a = tables_json(&config, 1);
    let b = tables_json(&config, 2);
    assert_ne!(a.1, b.1, "usage identical across seeds");
}

#[test]
fn accounts_do_not_depend_on_population_size() {
    // Each account draws from its own streams, so the first accounts of a
    // larger run match a smaller run exactly.
    let mut small = GeneratorConfig::default_test();
    small.num_accounts = 10;
    let mut large = small.clone();
    large.num_accounts = 40;

    let a = generate(&small, 99).expect("small run");
    let b = generate(&large, 99).expect("large run");
    assert_eq!(a.accounts[..], b.accounts[..10]);
    assert_eq!(a.churn[..], b.churn[..10]);
    assert_eq!(a.usage[..], b.usage[..a.usage.len()]);
}

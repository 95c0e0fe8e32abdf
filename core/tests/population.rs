//! Account population and attribute-table invariants.

use std::collections::BTreeMap;
use usagegen_core::{
    config::CompanyNaming,
    generate,
    generator::AttributeRecord,
    types::AccountStatus,
    GeneratorConfig,
};

fn by_account(rows: &[AttributeRecord]) -> BTreeMap<u64, Vec<&AttributeRecord>> {
    let mut map: BTreeMap<u64, Vec<&AttributeRecord>> = BTreeMap::new();
    for row in rows {
        map.entry(row.attributes.service_account_id).or_default().push(row);
    }
    map
}

#[test]
fn fixed_attributes_are_constant_per_account() {
    let mut config = GeneratorConfig::default_test();
    config.num_accounts = 300;
    let ds = generate(&config, 42).expect("generation");

    for (user_id, rows) in by_account(&ds.attributes) {
        let first = &rows[0].attributes;
        for row in &rows {
            assert_eq!(&row.attributes, first, "account {user_id} changed fixed attributes");
        }
    }
}

#[test]
fn one_attribute_row_per_month_from_signup() {
    let config = GeneratorConfig::default_test();
    let ds = generate(&config, 7).expect("generation");

    for (user_id, rows) in by_account(&ds.attributes) {
        let signup = rows[0].attributes.signup_month;
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.tenure as usize, i, "account {user_id}");
            assert_eq!(row.month, signup.add_months(i as u32), "account {user_id}");
            assert!(config.window.contains(row.month));
        }
        assert!(rows.len() as u32 >= 2, "account {user_id} has {} rows", rows.len());
    }
}

#[test]
fn every_account_is_observed_for_minimum_tenure_unless_churned() {
    let mut config = GeneratorConfig::default_test();
    config.num_accounts = 300;
    let ds = generate(&config, 5).expect("generation");

    for account in &ds.accounts {
        let observable = account.attributes.signup_month.months_until(config.window.end) + 1;
        assert!(observable >= i64::from(config.min_tenure_months));
        if account.churn.is_none() {
            assert_eq!(i64::from(account.usage_months), observable);
        }
    }
}

#[test]
fn status_is_active_until_churn_month() {
    let mut config = GeneratorConfig::default_test();
    config.num_accounts = 300;
    let ds = generate(&config, 11).expect("generation");
    let churn: BTreeMap<u64, _> = ds.churn.iter().map(|c| (c.user_id, c)).collect();

    for (user_id, rows) in by_account(&ds.attributes) {
        let record = churn[&user_id];
        let last = rows.last().expect("at least one row");
        match record.churn_date {
            Some(date) => {
                assert_eq!(last.month, date, "account {user_id}: rows continue past churn");
                assert!(config.churn.terminal_statuses.contains(&last.status));
                assert!(rows[..rows.len() - 1].iter().all(|r| r.status == AccountStatus::Active));
            }
            None => assert!(rows.iter().all(|r| r.status == AccountStatus::Active)),
        }
    }
}

#[test]
fn package_changes_only_at_checkpoints() {
    let mut config = GeneratorConfig::default_test();
    config.num_accounts = 200;
    config.min_tenure_months = 30;
    config.package_change.probability = 0.5;
    let ds = generate(&config, 3).expect("generation");

    let mut changes = 0;
    for (user_id, rows) in by_account(&ds.attributes) {
        for pair in rows.windows(2) {
            if pair[0].package != pair[1].package {
                changes += 1;
                assert_eq!(pair[1].tenure % 24, 0, "account {user_id} changed package at tenure {}", pair[1].tenure);
            }
        }
    }
    assert!(changes > 0, "no package changes at probability 0.5");
}

#[test]
fn generated_company_names_are_used_when_configured() {
    let mut config = GeneratorConfig::default_test();
    config.catalog.company_naming = CompanyNaming::Generated;
    config.catalog.companies.clear();
    let ds = generate(&config, 8).expect("generation");
    assert!(ds.accounts.iter().all(|a| a.attributes.company_name.split(' ').count() == 2));
}

#[test]
fn size_categories_follow_weights() {
    let mut config = GeneratorConfig::default_test();
    config.num_accounts = 2_000;
    let ds = generate(&config, 21).expect("generation");
    let small = ds.accounts.iter().filter(|a| a.attributes.size_category == "small").count();
    let large = ds.accounts.iter().filter(|a| a.attributes.size_category == "large").count();
    assert!((1_080..1_320).contains(&small), "small={small}");
    assert!((120..280).contains(&large), "large={large}");
}

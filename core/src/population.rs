//! Account population: size category, seats, signup month and the fixed
//! descriptive attributes drawn once per account.

use crate::{
    company_names::CompanyNameGenerator,
    config::{Brand, GeneratorConfig, Package, SizeCategory, Tier, UnifiedBrand},
    rng::StreamRng,
    types::{AccountId, Tenure, YearMonth},
};
use serde::Serialize;

pub const FIRST_SERVICE_ACCOUNT_ID: AccountId = 1000;

/// Attributes held constant across every monthly row of an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountAttributes {
    pub enterprise_account_id:  u64,
    /// `USERID` in the usage and churn tables.
    pub service_account_id:     AccountId,
    pub company_name:           String,
    pub enterprise_brand:       Brand,
    pub enterprise_ubrand:      UnifiedBrand,
    pub service_brand:          Brand,
    pub service_ubrand:         UnifiedBrand,
    pub tier:                   Tier,
    pub is_tester:              bool,
    pub external_account_id:    String,
    pub billing_account_number: String,
    pub opco:                   String,
    pub size_category:          String,
    pub usage_profile:          String,
    pub seats:                  u32,
    pub signup_month:           YearMonth,
}

/// An account before churn and usage are simulated.
#[derive(Debug, Clone)]
pub struct AccountDraft {
    pub index:          u64,
    pub attributes:     AccountAttributes,
    pub category:       SizeCategory,
    /// Months between the window start and the signup month.
    pub signup_offset:  u32,
    pub initial_package: usize,
}

impl AccountDraft {
    /// Largest tenure still inside the observation window.
    pub fn last_observable_tenure(&self, config: &GeneratorConfig) -> Tenure {
        config.window.len_months() - 1 - self.signup_offset
    }
}

/// Draw one account. Consumes only the account's Attributes stream.
pub fn draw_account(config: &GeneratorConfig, index: u64, rng: &mut StreamRng) -> AccountDraft {
    let weights: Vec<f64> = config.size_categories.iter().map(|c| c.weight).collect();
    let category = config.size_categories[rng.pick_weighted(&weights)].clone();
    let seats = rng.range_inclusive(category.seats.min, category.seats.max);

    let latest_signup = config.latest_signup_offset();
    let signup_offset = rng.range_inclusive(0, latest_signup);
    let signup_month = config.window.month_at(signup_offset);

    let catalog = &config.catalog;
    let company_name = CompanyNameGenerator::for_catalog(catalog, rng);
    let enterprise_brand = rng.pick(&catalog.brands).clone();
    let enterprise_ubrand = rng.pick(&catalog.ubrands).clone();
    let service_brand = rng.pick(&catalog.brands).clone();
    let service_ubrand = rng.pick(&catalog.ubrands).clone();
    let tier = rng.pick(&catalog.tiers).clone();
    let is_tester = rng.chance(catalog.tester_probability);
    let billing_account_number = format!("BAN-{}", rng.range_inclusive(100_000, 999_999));
    let opco = rng.pick(&catalog.opcos).clone();
    let initial_package = rng.next_u64_below(catalog.packages.len() as u64) as usize;

    let enterprise_account_id = index + 1;
    let attributes = AccountAttributes {
        enterprise_account_id,
        service_account_id: FIRST_SERVICE_ACCOUNT_ID + index,
        company_name,
        enterprise_brand,
        enterprise_ubrand,
        service_brand,
        service_ubrand,
        tier,
        is_tester,
        external_account_id: format!("EXT-{enterprise_account_id:08}"),
        billing_account_number,
        opco,
        size_category: category.id.clone(),
        usage_profile: category.profile.clone(),
        seats,
        signup_month,
    };

    AccountDraft { index, attributes, category, signup_offset, initial_package }
}

/// Package index held at each tenure `0..=last_tenure`.
///
/// Changes are only considered at checkpoints `t > 0` with
/// `t % interval_months == 0`, and always move to a different package
/// when the catalog offers one.
pub fn package_timeline(
    config: &GeneratorConfig,
    initial: usize,
    last_tenure: Tenure,
    rng: &mut StreamRng,
) -> Vec<usize> {
    let packages = &config.catalog.packages;
    let interval = config.package_change.interval_months;
    let mut current = initial;
    let mut timeline = Vec::with_capacity(last_tenure as usize + 1);

    for tenure in 0..=last_tenure {
        let checkpoint = tenure > 0 && interval > 0 && tenure % interval == 0;
        if checkpoint && packages.len() > 1 && rng.chance(config.package_change.probability) {
            let draw = rng.next_u64_below(packages.len() as u64 - 1) as usize;
            current = if draw >= current { draw + 1 } else { draw };
        }
        timeline.push(current);
    }
    timeline
}

pub fn package_at<'a>(config: &'a GeneratorConfig, timeline: &[usize], tenure: Tenure) -> &'a Package {
    &config.catalog.packages[timeline[tenure as usize]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StreamSlot};

    #[test]
    fn signup_leaves_room_for_minimum_tenure() {
        let cfg = GeneratorConfig::default_test();
        let bank = RngBank::new(17);
        for i in 0..500 {
            let draft = draw_account(&cfg, i, &mut bank.for_account(i, StreamSlot::Attributes));
            assert!(draft.last_observable_tenure(&cfg) + 1 >= cfg.min_tenure_months);
            assert!(cfg.window.contains(draft.attributes.signup_month));
            let seats = draft.attributes.seats;
            assert!((draft.category.seats.min..=draft.category.seats.max).contains(&seats));
        }
    }

    #[test]
    fn identifiers_follow_account_index() {
        let cfg = GeneratorConfig::default_test();
        let bank = RngBank::new(3);
        let draft = draw_account(&cfg, 41, &mut bank.for_account(41, StreamSlot::Attributes));
        assert_eq!(draft.attributes.enterprise_account_id, 42);
        assert_eq!(draft.attributes.service_account_id, 1041);
        assert_eq!(draft.attributes.external_account_id, "EXT-00000042");
        assert!(draft.attributes.billing_account_number.starts_with("BAN-"));
        assert_eq!(draft.attributes.billing_account_number.len(), 10);
    }

    #[test]
    fn package_changes_only_at_checkpoints() {
        let mut cfg = GeneratorConfig::default_test();
        cfg.package_change.probability = 1.0;
        let mut rng = RngBank::new(5).for_account(0, StreamSlot::Package);
        let timeline = package_timeline(&cfg, 0, 59, &mut rng);
        assert_eq!(timeline.len(), 60);
        for t in 1..timeline.len() {
            if timeline[t] != timeline[t - 1] {
                assert_eq!(t % 24, 0, "change at tenure {t}");
            }
        }
        assert_ne!(timeline[23], timeline[24]);
        assert_ne!(timeline[47], timeline[48]);
    }

    #[test]
    fn single_package_catalog_never_changes() {
        let mut cfg = GeneratorConfig::default_test();
        cfg.catalog.packages.truncate(1);
        cfg.package_change.probability = 1.0;
        let mut rng = RngBank::new(5).for_account(0, StreamSlot::Package);
        assert!(package_timeline(&cfg, 0, 50, &mut rng).iter().all(|p| *p == 0));
    }
}

//! The dataset generator: a pure function of (config, seed) → three tables.
//!
//! PER-ACCOUNT ORDER (fixed):
//!   1. Attributes stream: category, seats, signup month, fixed attributes
//!   2. Churn stream:      churn plan
//!   3. Package stream:    package timeline
//!   4. Usage stream:      one metric vector per usage month
//!
//! RULES:
//!   - Each account owns its streams, so accounts are generated in parallel
//!     and collected in index order. Output does not depend on thread count.
//!   - Usage rows cover signup..churn (exclusive), or signup..window end.
//!   - Attribute rows cover signup..churn (inclusive); the churn-month row
//!     carries the terminal status.

use crate::{
    churn::{plan_churn, ChurnPlan},
    config::{GeneratorConfig, Package},
    error::GenResult,
    metrics::MetricValues,
    population::{draw_account, package_at, package_timeline, AccountAttributes},
    rng::{RngBank, StreamSlot},
    synth::{scaled_baseline, synthesize_month},
    temporal::MonthFactors,
    types::{AccountId, AccountStatus, Tenure, YearMonth},
};
use rayon::prelude::*;
use serde::Serialize;

/// One row per (account, month) of account state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeRecord {
    pub month:      YearMonth,
    pub tenure:     Tenure,
    pub status:     AccountStatus,
    pub package:    Package,
    pub attributes: AccountAttributes,
}

/// One row per (account, month) of usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    pub user_id: AccountId,
    pub month:   YearMonth,
    pub tenure:  Tenure,
    pub metrics: MetricValues,
}

/// Exactly one per account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnRecord {
    pub user_id:    AccountId,
    pub churned:    bool,
    pub churn_date: Option<YearMonth>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    pub attributes:      AccountAttributes,
    pub churn:           Option<ChurnPlan>,
    pub usage_months:    u32,
    pub package_changes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub seed:       u64,
    pub accounts:   Vec<AccountSummary>,
    pub attributes: Vec<AttributeRecord>,
    pub usage:      Vec<UsageRecord>,
    pub churn:      Vec<ChurnRecord>,
}

impl Dataset {
    pub fn churned_accounts(&self) -> usize {
        self.churn.iter().filter(|c| c.churned).count()
    }

    pub fn usage_for(&self, user_id: AccountId) -> impl Iterator<Item = &UsageRecord> + '_ {
        self.usage.iter().filter(move |u| u.user_id == user_id)
    }

    pub fn attributes_for(&self, user_id: AccountId) -> impl Iterator<Item = &AttributeRecord> + '_ {
        self.attributes
            .iter()
            .filter(move |a| a.attributes.service_account_id == user_id)
    }
}

/// All rows produced for a single account.
struct AccountOutput {
    summary:    AccountSummary,
    attributes: Vec<AttributeRecord>,
    usage:      Vec<UsageRecord>,
    churn:      ChurnRecord,
}

pub struct Generator<'a> {
    config: &'a GeneratorConfig,
    bank:   RngBank,
}

impl<'a> Generator<'a> {
    /// Validates the configuration; nothing is generated on error.
    pub fn new(config: &'a GeneratorConfig, seed: u64) -> GenResult<Self> {
        config.validate()?;
        Ok(Self { config, bank: RngBank::new(seed) })
    }

    pub fn generate(&self) -> Dataset {
        let n = self.config.num_accounts as u64;
        let outputs: Vec<AccountOutput> = (0..n)
            .into_par_iter()
            .map(|index| self.generate_account(index))
            .collect();

        let mut dataset = Dataset {
            seed:       self.bank.master_seed(),
            accounts:   Vec::with_capacity(outputs.len()),
            attributes: Vec::new(),
            usage:      Vec::new(),
            churn:      Vec::with_capacity(outputs.len()),
        };
        for out in outputs {
            dataset.accounts.push(out.summary);
            dataset.attributes.extend(out.attributes);
            dataset.usage.extend(out.usage);
            dataset.churn.push(out.churn);
        }

        log::info!(
            "generator: seed={} generated {} accounts ({} churned), {} usage rows, {} attribute rows",
            dataset.seed,
            dataset.accounts.len(),
            dataset.churned_accounts(),
            dataset.usage.len(),
            dataset.attributes.len(),
        );
        dataset
    }

    fn generate_account(&self, index: u64) -> AccountOutput {
        let config = self.config;

        let draft = draw_account(config, index, &mut self.bank.for_account(index, StreamSlot::Attributes));
        let plan = plan_churn(
            config,
            &draft.category,
            draft.signup_offset,
            &mut self.bank.for_account(index, StreamSlot::Churn),
        );
        let user_id = draft.attributes.service_account_id;
        match &plan {
            Some(p) => log::debug!(
                "generator: account={user_id} category={} churns at tenure {} ({:?})",
                draft.category.id, p.churn_tenure, p.cause
            ),
            None => log::debug!("generator: account={user_id} category={} retained", draft.category.id),
        }

        let observable = draft.last_observable_tenure(config);
        let last_attribute_tenure = plan.map_or(observable, |p| p.churn_tenure);
        let timeline = package_timeline(
            config,
            draft.initial_package,
            last_attribute_tenure,
            &mut self.bank.for_account(index, StreamSlot::Package),
        );
        let package_changes = timeline.windows(2).filter(|w| w[0] != w[1]).count() as u32;

        let attributes: Vec<AttributeRecord> = (0..=last_attribute_tenure)
            .map(|tenure| {
                let status = match plan {
                    Some(p) if tenure >= p.churn_tenure => p.terminal_status,
                    _ => AccountStatus::Active,
                };
                AttributeRecord {
                    month: config.window.month_at(draft.signup_offset + tenure),
                    tenure,
                    status,
                    package: package_at(config, &timeline, tenure).clone(),
                    attributes: draft.attributes.clone(),
                }
            })
            .collect();

        let usage_end = plan.map_or(observable + 1, |p| p.churn_tenure);
        let baseline = match config.profile_for(&draft.category) {
            Some(profile) => scaled_baseline(profile, draft.attributes.seats),
            None => Default::default(),
        };
        let mut usage_rng = self.bank.for_account(index, StreamSlot::Usage);
        let churn_at = plan.map(|p| p.churn_tenure);
        let usage: Vec<UsageRecord> = (0..usage_end)
            .map(|tenure| {
                let month = config.window.month_at(draft.signup_offset + tenure);
                let factors = MonthFactors::draw(config, tenure, month.month0(), churn_at, &mut usage_rng);
                UsageRecord {
                    user_id,
                    month,
                    tenure,
                    metrics: synthesize_month(
                        &baseline,
                        draft.attributes.seats,
                        factors.total,
                        &config.noise,
                        &mut usage_rng,
                    ),
                }
            })
            .collect();

        let churn = ChurnRecord {
            user_id,
            churned: plan.is_some(),
            churn_date: plan.map(|p| p.churn_month),
        };

        AccountOutput {
            summary: AccountSummary {
                attributes: draft.attributes,
                churn: plan,
                usage_months: usage_end,
                package_changes,
            },
            attributes,
            usage,
            churn,
        }
    }
}

/// Validate `config` and generate the full dataset for `seed`.
pub fn generate(config: &GeneratorConfig, seed: u64) -> GenResult<Dataset> {
    Ok(Generator::new(config, seed)?.generate())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_account_gets_one_churn_record() {
        let cfg = GeneratorConfig::default_test();
        let ds = generate(&cfg, 42).unwrap();
        assert_eq!(ds.accounts.len(), cfg.num_accounts);
        assert_eq!(ds.churn.len(), cfg.num_accounts);
        let ids: Vec<_> = ds.churn.iter().map(|c| c.user_id).collect();
        let expected: Vec<_> = (0..cfg.num_accounts as u64).map(|i| 1000 + i).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn invalid_config_produces_nothing() {
        let mut cfg = GeneratorConfig::default_test();
        cfg.num_accounts = 0;
        assert!(generate(&cfg, 1).is_err());
    }

    #[test]
    fn usage_months_match_rows() {
        let cfg = GeneratorConfig::default_test();
        let ds = generate(&cfg, 7).unwrap();
        for account in &ds.accounts {
            let rows = ds.usage_for(account.attributes.service_account_id).count();
            assert_eq!(rows as u32, account.usage_months);
        }
    }
}

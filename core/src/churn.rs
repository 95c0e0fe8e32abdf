//! Churn planning.
//!
//! One canonical policy: each month after signup churns independently
//! with the monthly hazard derived from the category's annual rate.
//! Recently signed-up accounts may first get a single-shot early-churn
//! check (see `NewAccountRisk`). Tenure 0 never churns.

use crate::{
    config::{GeneratorConfig, SizeCategory},
    rng::StreamRng,
    types::{AccountStatus, Tenure, YearMonth},
};
use serde::Serialize;

/// `1 - (1 - annual)^(1/12)`
pub fn monthly_hazard(annual_rate: f64) -> f64 {
    1.0 - (1.0 - annual_rate).powf(1.0 / 12.0)
}

/// Independent monthly draws for tenures `1..=max_tenure`.
/// Returns the first tenure that churns.
pub fn simulate_hazard(monthly: f64, max_tenure: Tenure, rng: &mut StreamRng) -> Option<Tenure> {
    (1..=max_tenure).find(|_| rng.chance(monthly))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChurnCause {
    EarlyTenure,
    Hazard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChurnPlan {
    pub churn_tenure:    Tenure,
    pub churn_month:     YearMonth,
    pub cause:           ChurnCause,
    pub terminal_status: AccountStatus,
}

/// Decide whether and when an account churns. Consumes only the Churn stream.
pub fn plan_churn(
    config: &GeneratorConfig,
    category: &SizeCategory,
    signup_offset: u32,
    rng: &mut StreamRng,
) -> Option<ChurnPlan> {
    let window_len = config.window.len_months();
    let exposure = window_len - 1 - signup_offset;
    if exposure == 0 {
        return None;
    }

    let early = config.churn.new_account_risk.as_ref().and_then(|risk| {
        let recent = signup_offset
            .checked_add(risk.recent_signup_months)
            .is_some_and(|end| end > config.latest_signup_offset());
        if recent && rng.chance(risk.probability) {
            let latest = risk.window_months.min(exposure);
            Some(rng.range_inclusive(1, latest))
        } else {
            None
        }
    });

    let (churn_tenure, cause) = match early {
        Some(t) => (t, ChurnCause::EarlyTenure),
        None => {
            let hazard = monthly_hazard(category.annual_churn_rate);
            (simulate_hazard(hazard, exposure, rng)?, ChurnCause::Hazard)
        }
    };

    let terminal_status = *rng.pick(&config.churn.terminal_statuses);
    Some(ChurnPlan {
        churn_tenure,
        churn_month: config.window.month_at(signup_offset + churn_tenure),
        cause,
        terminal_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StreamSlot};

    #[test]
    fn hazard_conversion_round_trips() {
        for annual in [0.05, 0.10, 0.20, 0.50] {
            let monthly = monthly_hazard(annual);
            let survive = (1.0 - monthly).powi(12);
            assert!((1.0 - survive - annual).abs() < 1e-12);
        }
        assert_eq!(monthly_hazard(0.0), 0.0);
        assert_eq!(monthly_hazard(1.0), 1.0);
    }

    #[test]
    fn zero_rate_never_churns_and_full_rate_churns_at_first_month() {
        let mut rng = RngBank::new(1).for_account(0, StreamSlot::Churn);
        assert_eq!(simulate_hazard(0.0, 36, &mut rng), None);
        assert_eq!(simulate_hazard(1.0, 36, &mut rng), Some(1));
        assert_eq!(simulate_hazard(1.0, 0, &mut rng), None);
    }

    #[test]
    fn account_signed_up_in_last_month_cannot_churn() {
        let mut cfg = GeneratorConfig::default_test();
        cfg.min_tenure_months = 1;
        cfg.size_categories[0].annual_churn_rate = 1.0;
        let last = cfg.window.len_months() - 1;
        let mut rng = RngBank::new(2).for_account(0, StreamSlot::Churn);
        assert!(plan_churn(&cfg, &cfg.size_categories[0], last, &mut rng).is_none());
    }

    #[test]
    fn early_tenure_overlay_lands_inside_its_window() {
        let mut cfg = GeneratorConfig::default_test();
        if let Some(risk) = cfg.churn.new_account_risk.as_mut() {
            risk.probability = 1.0;
        }
        let category = cfg.size_categories[0].clone();
        let signup_offset = cfg.window.len_months() - 6;
        let bank = RngBank::new(3);
        for i in 0..200 {
            let plan = plan_churn(&cfg, &category, signup_offset, &mut bank.for_account(i, StreamSlot::Churn))
                .expect("overlay always fires");
            assert_eq!(plan.cause, ChurnCause::EarlyTenure);
            assert!((1..=5).contains(&plan.churn_tenure), "{plan:?}");
            assert!(!plan.terminal_status.is_active());
            assert!(cfg.window.contains(plan.churn_month));
        }
    }

    #[test]
    fn overlay_counts_cohorts_back_from_latest_signup() {
        let mut cfg = GeneratorConfig::default_test();
        if let Some(risk) = cfg.churn.new_account_risk.as_mut() {
            risk.probability = 1.0;
            risk.recent_signup_months = cfg.min_tenure_months;
        }
        let mut category = cfg.size_categories[0].clone();
        category.annual_churn_rate = 0.0;
        let latest = cfg.latest_signup_offset();
        let first_eligible = latest + 1 - cfg.min_tenure_months;
        let bank = RngBank::new(5);

        for offset in first_eligible..=latest {
            let plan = plan_churn(&cfg, &category, offset, &mut bank.for_account(offset.into(), StreamSlot::Churn))
                .expect("eligible cohort always churns");
            assert_eq!(plan.cause, ChurnCause::EarlyTenure, "offset {offset}");
        }
        let mut rng = bank.for_account(0, StreamSlot::Churn);
        assert!(plan_churn(&cfg, &category, first_eligible - 1, &mut rng).is_none());
    }

    #[test]
    fn older_accounts_skip_the_overlay() {
        let mut cfg = GeneratorConfig::default_test();
        if let Some(risk) = cfg.churn.new_account_risk.as_mut() {
            risk.probability = 1.0;
        }
        let mut category = cfg.size_categories[0].clone();
        category.annual_churn_rate = 0.0;
        let mut rng = RngBank::new(4).for_account(0, StreamSlot::Churn);
        assert!(plan_churn(&cfg, &category, 0, &mut rng).is_none());
    }
}

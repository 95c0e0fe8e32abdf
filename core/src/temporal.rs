//! Temporal factor functions.
//!
//! Each factor maps an account's tenure (months since signup) or the
//! calendar month to a multiplier. The synthesizer composes them as
//!
//!   growth × (1 + trend) × (1 + seasonal) × decline × noise
//!
//! All factors except `decline` and `noise` are pure functions.

use crate::{
    config::{ChurnConfig, GeneratorConfig, TrendConfig},
    rng::StreamRng,
    types::Tenure,
};
use serde::Serialize;
use std::f64::consts::PI;

/// Ramp-up for new accounts. Sigmoid centred on `growth_months / 2`
/// while `tenure < growth_months`, 1.0 afterwards.
pub fn growth_factor(tenure: Tenure, growth_months: u32, steepness: f64) -> f64 {
    if tenure >= growth_months {
        return 1.0;
    }
    let midpoint = f64::from(growth_months) / 2.0;
    1.0 / (1.0 + (-steepness * (f64::from(tenure) - midpoint)).exp())
}

/// Calendar seasonality in [-amplitude, amplitude]. `month0` is 0 for January.
pub fn seasonal_factor(month0: u32, amplitude: f64, phase: f64) -> f64 {
    let m = f64::from(month0 % 12);
    amplitude * (2.0 * PI * m / 12.0 + phase).sin()
}

/// Rise-then-fall cycle. 0 before `start_month`; then rises linearly to
/// `peak` over the first `rise_fraction` of each cycle and falls by
/// `decline` over the remainder, restarting every `cycle_months`.
pub fn trend_factor(tenure: Tenure, trend: &TrendConfig) -> f64 {
    if tenure < trend.start_month || trend.cycle_months == 0 {
        return 0.0;
    }
    let cycle = f64::from(trend.cycle_months);
    let position = f64::from((tenure - trend.start_month) % trend.cycle_months);
    let rise_len = cycle * trend.rise_fraction;

    if position < rise_len {
        trend.peak * position / rise_len
    } else {
        let fall_len = cycle - rise_len;
        if fall_len <= 0.0 {
            return trend.peak;
        }
        trend.peak - trend.decline * (position - rise_len) / fall_len
    }
}

/// Pre-churn wind-down.
///
/// With `months_before = churn_at - tenure`:
///   - `months_before > window`: 1.0
///   - `1 ..= window`: `floor + (1 - floor) × (months_before - 1) / window`,
///     reaching `floor` in the last month before churn
///   - at or after churn: a near-zero draw in `[0, post_churn_residual)`
///
/// Only the last branch consumes randomness.
pub fn churn_decline_factor(
    tenure: Tenure,
    churn_at: Option<Tenure>,
    churn: &ChurnConfig,
    rng: &mut StreamRng,
) -> f64 {
    let Some(churn_at) = churn_at else {
        return 1.0;
    };
    if tenure >= churn_at {
        return rng.uniform(0.0, churn.post_churn_residual);
    }
    let months_before = churn_at - tenure;
    if months_before > churn.decline_window_months || churn.decline_window_months == 0 {
        return 1.0;
    }
    let progress = f64::from(months_before - 1) / f64::from(churn.decline_window_months);
    churn.decline_floor + (1.0 - churn.decline_floor) * progress
}

/// The factors behind one account-month, kept for inspection and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthFactors {
    pub growth:   f64,
    pub trend:    f64,
    pub seasonal: f64,
    pub decline:  f64,
    pub noise:    f64,
    pub total:    f64,
}

impl MonthFactors {
    /// Draw the composed multiplier for one account-month.
    pub fn draw(
        config: &GeneratorConfig,
        tenure: Tenure,
        calendar_month0: u32,
        churn_at: Option<Tenure>,
        rng: &mut StreamRng,
    ) -> Self {
        let t = &config.temporal;
        let growth = growth_factor(tenure, t.growth_months, t.growth_steepness);
        let trend = trend_factor(tenure, &t.trend);
        let seasonal = seasonal_factor(calendar_month0, t.seasonal_amplitude, t.seasonal_phase);
        let decline = churn_decline_factor(tenure, churn_at, &config.churn, rng);
        let noise = rng.bounded_normal(1.0, config.noise.multiplier_std);

        Self {
            growth,
            trend,
            seasonal,
            decline,
            noise,
            total: growth * (1.0 + trend) * (1.0 + seasonal) * decline * noise,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StreamSlot};

    fn trend() -> TrendConfig {
        TrendConfig { start_month: 6, cycle_months: 24, rise_fraction: 0.6, peak: 0.20, decline: 0.10 }
    }

    #[test]
    fn growth_ramps_monotonically_to_one() {
        let values: Vec<f64> = (0..10).map(|i| growth_factor(i, 6, 1.5)).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "{values:?}");
        assert!(values[..6].iter().all(|v| *v > 0.0 && *v < 1.0));
        assert!(values[6..].iter().all(|v| *v == 1.0));
        assert!((growth_factor(3, 6, 1.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_growth_months_disables_ramp() {
        assert_eq!(growth_factor(0, 0, 1.5), 1.0);
    }

    #[test]
    fn seasonality_peaks_in_january_with_quarter_phase() {
        let jan = seasonal_factor(0, 0.15, PI / 2.0);
        let jul = seasonal_factor(6, 0.15, PI / 2.0);
        assert!((jan - 0.15).abs() < 1e-12);
        assert!((jul + 0.15).abs() < 1e-12);
        assert!((seasonal_factor(12, 0.15, PI / 2.0) - jan).abs() < 1e-12);
    }

    #[test]
    fn trend_rises_then_falls_each_cycle() {
        let cfg = trend();
        assert_eq!(trend_factor(0, &cfg), 0.0);
        assert_eq!(trend_factor(5, &cfg), 0.0);
        assert_eq!(trend_factor(6, &cfg), 0.0);
        let peak_at = 6 + (24.0_f64 * 0.6).ceil() as u32;
        assert!(trend_factor(peak_at - 1, &cfg) < 0.20);
        assert!(trend_factor(peak_at, &cfg) <= 0.20);
        let end_of_cycle = trend_factor(6 + 23, &cfg);
        assert!(end_of_cycle > 0.10 && end_of_cycle < 0.20, "{end_of_cycle}");
        assert_eq!(trend_factor(6 + 24, &cfg), 0.0, "cycle restarts");
    }

    #[test]
    fn decline_shrinks_towards_floor_then_collapses() {
        let churn = GeneratorConfig::default_test().churn;
        let mut rng = RngBank::new(3).for_account(0, StreamSlot::Usage);
        let churn_at = Some(20);

        assert_eq!(churn_decline_factor(10, churn_at, &churn, &mut rng), 1.0);
        assert_eq!(churn_decline_factor(13, churn_at, &churn, &mut rng), 1.0);
        let window: Vec<f64> = (14..20)
            .map(|i| churn_decline_factor(i, churn_at, &churn, &mut rng))
            .collect();
        assert!(window.windows(2).all(|w| w[0] > w[1]), "{window:?}");
        assert!((window[5] - churn.decline_floor).abs() < 1e-12);

        for i in 20..30 {
            let v = churn_decline_factor(i, churn_at, &churn, &mut rng);
            assert!((0.0..churn.post_churn_residual).contains(&v));
        }
        assert_eq!(churn_decline_factor(19, None, &churn, &mut rng), 1.0);
    }

    #[test]
    fn composed_multiplier_is_the_product() {
        let cfg = GeneratorConfig::default_test();
        let mut rng = RngBank::new(8).for_account(1, StreamSlot::Usage);
        let f = MonthFactors::draw(&cfg, 9, 3, None, &mut rng);
        let expected = f.growth * (1.0 + f.trend) * (1.0 + f.seasonal) * f.decline * f.noise;
        assert!((f.total - expected).abs() < 1e-12);
        assert!(f.total > 0.0);
    }
}

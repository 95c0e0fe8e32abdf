//! Per-account-month synthesizer.
//!
//! Step 1 scales every baseline by the composed multiplier and a
//! per-metric jitter, then shapes it by kind (counts floored, minutes
//! rounded, both clamped at zero). Step 2 recomputes the aggregate
//! columns from the in/out leaves so the table is internally consistent.

use crate::{
    config::{NoiseConfig, UsageProfile},
    metrics::{Metric, MetricValue, MetricValues},
    rng::StreamRng,
};
use std::collections::BTreeMap;

/// An account's mature monthly usage: profile baseline × seats / reference seats.
pub fn scaled_baseline(profile: &UsageProfile, seats: u32) -> BTreeMap<Metric, f64> {
    let scale = f64::from(seats) / f64::from(profile.reference_seats.max(1));
    profile
        .baseline
        .iter()
        .map(|(metric, base)| (*metric, base * scale))
        .collect()
}

/// `value = baseline × multiplier × jitter` for every metric in the baseline.
/// Jitter is drawn in column order so the stream stays reproducible.
pub fn scale_metrics(
    baseline: &BTreeMap<Metric, f64>,
    multiplier: f64,
    noise: &NoiseConfig,
    rng: &mut StreamRng,
) -> MetricValues {
    let mut values = MetricValues::new();
    for metric in Metric::ALL {
        let jitter = rng.uniform(noise.jitter_low, noise.jitter_high);
        if let Some(base) = baseline.get(&metric) {
            values.set(metric, MetricValue::shaped(metric.kind(), base * multiplier * jitter));
        }
    }
    values
}

/// Rebuild aggregates from leaves and cap user counts.
pub fn reconcile(values: &mut MetricValues, seats: u32) {
    use Metric::*;

    // calls
    let out_voice = values.count(OutVoiceCalls);
    let in_voice = values.count(InVoiceCalls);
    let out_fax = values.count(OutFaxCalls);
    let in_fax = values.count(InFaxCalls);
    values.set_count(VoiceCalls, in_voice + out_voice);
    values.set_count(FaxCalls, in_fax + out_fax);
    values.set_count(PhoneTotalNumInboundCalls, in_voice + in_fax);
    values.set_count(PhoneTotalNumOutboundCalls, out_voice + out_fax);
    let total_calls = in_voice + out_voice + in_fax + out_fax;
    values.set_count(PhoneTotalCalls, total_calls);

    // minutes
    let out_voice_m = values.minutes(OutVoiceMins);
    let in_voice_m = values.minutes(InVoiceMins);
    let out_fax_m = values.minutes(OutFaxMins);
    let in_fax_m = values.minutes(InFaxMins);
    values.set_minutes(VoiceMins, in_voice_m + out_voice_m);
    values.set_minutes(FaxMins, in_fax_m + out_fax_m);
    values.set_minutes(PhoneTotalInboundMin, in_voice_m + in_fax_m);
    values.set_minutes(PhoneTotalOutboundMin, out_voice_m + out_fax_m);
    values.set_minutes(
        PhoneTotalMinutesOfUse,
        values.minutes(VoiceMins) + values.minutes(FaxMins),
    );

    // device split
    let device_weights = [
        values.count(HardphoneCalls) as f64,
        values.count(SoftphoneCalls) as f64,
        values.count(MobileCalls) as f64,
    ];
    let [hard, soft, mobile] = apportion(total_calls, device_weights);
    values.set_count(HardphoneCalls, hard);
    values.set_count(SoftphoneCalls, soft);
    values.set_count(MobileCalls, mobile);
    values.set_count(MobileAndroidCalls, values.count(MobileAndroidCalls).min(mobile));

    // users
    let phone_mau = values.count(PhoneMau).min(u64::from(seats));
    values.set_count(PhoneMau, phone_mau);
    values.set_count(CallMau, values.count(CallMau).min(phone_mau));
    values.set_count(FaxMau, values.count(FaxMau).min(phone_mau));
}

/// Split `total` across three buckets proportionally to `weights` using
/// largest remainder. All-zero weights put everything in the first bucket.
pub fn apportion(total: u64, weights: [f64; 3]) -> [u64; 3] {
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        return [total, 0, 0];
    }
    let quotas = weights.map(|w| total as f64 * w / sum);
    let mut shares = quotas.map(|q| q.floor() as u64);
    let assigned: u64 = shares.iter().sum();
    let mut leftover = total.saturating_sub(assigned);

    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| {
        let ra = quotas[a] - quotas[a].floor();
        let rb = quotas[b] - quotas[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for idx in order.iter().cycle() {
        if leftover == 0 {
            break;
        }
        shares[*idx] += 1;
        leftover -= 1;
    }
    shares
}

/// Full synthesis for one account-month.
pub fn synthesize_month(
    baseline: &BTreeMap<Metric, f64>,
    seats: u32,
    multiplier: f64,
    noise: &NoiseConfig,
    rng: &mut StreamRng,
) -> MetricValues {
    let mut values = scale_metrics(baseline, multiplier, noise, rng);
    reconcile(&mut values, seats);
    values
}

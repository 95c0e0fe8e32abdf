//! Usage metric catalogue and per-month metric vectors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every usage metric emitted per account-month.
/// Declaration order is the column order of the usage table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Metric {
    PhoneTotalCalls,
    PhoneTotalMinutesOfUse,
    VoiceCalls,
    VoiceMins,
    FaxCalls,
    FaxMins,
    PhoneTotalNumInboundCalls,
    PhoneTotalNumOutboundCalls,
    PhoneTotalInboundMin,
    PhoneTotalOutboundMin,
    OutVoiceCalls,
    InVoiceCalls,
    OutVoiceMins,
    InVoiceMins,
    OutFaxCalls,
    InFaxCalls,
    OutFaxMins,
    InFaxMins,
    PhoneMau,
    CallMau,
    FaxMau,
    HardphoneCalls,
    SoftphoneCalls,
    MobileCalls,
    MobileAndroidCalls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Integer count, floored and clamped at zero.
    Count,
    /// Minutes of use, rounded to 2 decimals and clamped at zero.
    Minutes,
}

impl Metric {
    pub const ALL: [Metric; 25] = [
        Metric::PhoneTotalCalls,
        Metric::PhoneTotalMinutesOfUse,
        Metric::VoiceCalls,
        Metric::VoiceMins,
        Metric::FaxCalls,
        Metric::FaxMins,
        Metric::PhoneTotalNumInboundCalls,
        Metric::PhoneTotalNumOutboundCalls,
        Metric::PhoneTotalInboundMin,
        Metric::PhoneTotalOutboundMin,
        Metric::OutVoiceCalls,
        Metric::InVoiceCalls,
        Metric::OutVoiceMins,
        Metric::InVoiceMins,
        Metric::OutFaxCalls,
        Metric::InFaxCalls,
        Metric::OutFaxMins,
        Metric::InFaxMins,
        Metric::PhoneMau,
        Metric::CallMau,
        Metric::FaxMau,
        Metric::HardphoneCalls,
        Metric::SoftphoneCalls,
        Metric::MobileCalls,
        Metric::MobileAndroidCalls,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Self::PhoneTotalCalls            => "PHONE_TOTAL_CALLS",
            Self::PhoneTotalMinutesOfUse     => "PHONE_TOTAL_MINUTES_OF_USE",
            Self::VoiceCalls                 => "VOICE_CALLS",
            Self::VoiceMins                  => "VOICE_MINS",
            Self::FaxCalls                   => "FAX_CALLS",
            Self::FaxMins                    => "FAX_MINS",
            Self::PhoneTotalNumInboundCalls  => "PHONE_TOTAL_NUM_INBOUND_CALLS",
            Self::PhoneTotalNumOutboundCalls => "PHONE_TOTAL_NUM_OUTBOUND_CALLS",
            Self::PhoneTotalInboundMin       => "PHONE_TOTAL_INBOUND_MIN",
            Self::PhoneTotalOutboundMin      => "PHONE_TOTAL_OUTBOUND_MIN",
            Self::OutVoiceCalls              => "OUT_VOICE_CALLS",
            Self::InVoiceCalls               => "IN_VOICE_CALLS",
            Self::OutVoiceMins               => "OUT_VOICE_MINS",
            Self::InVoiceMins                => "IN_VOICE_MINS",
            Self::OutFaxCalls                => "OUT_FAX_CALLS",
            Self::InFaxCalls                 => "IN_FAX_CALLS",
            Self::OutFaxMins                 => "OUT_FAX_MINS",
            Self::InFaxMins                  => "IN_FAX_MINS",
            Self::PhoneMau                   => "PHONE_MAU",
            Self::CallMau                    => "CALL_MAU",
            Self::FaxMau                     => "FAX_MAU",
            Self::HardphoneCalls             => "HARDPHONE_CALLS",
            Self::SoftphoneCalls             => "SOFTPHONE_CALLS",
            Self::MobileCalls                => "MOBILE_CALLS",
            Self::MobileAndroidCalls         => "MOBILE_ANDROID_CALLS",
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Self::PhoneTotalMinutesOfUse
            | Self::VoiceMins
            | Self::FaxMins
            | Self::PhoneTotalInboundMin
            | Self::PhoneTotalOutboundMin
            | Self::OutVoiceMins
            | Self::InVoiceMins
            | Self::OutFaxMins
            | Self::InFaxMins => MetricKind::Minutes,
            _ => MetricKind::Count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Minutes(f64),
}

impl MetricValue {
    /// Shape a raw scaled value according to the metric's kind.
    pub fn shaped(kind: MetricKind, raw: f64) -> Self {
        match kind {
            MetricKind::Count   => Self::Count(raw.max(0.0).floor() as u64),
            MetricKind::Minutes => Self::Minutes(round2(raw.max(0.0))),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Count(n)   => n as f64,
            Self::Minutes(m) => m,
        }
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Count(n)   => write!(f, "{n}"),
            Self::Minutes(m) => write!(f, "{m:.2}"),
        }
    }
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// One account-month of usage, keyed by metric in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricValues(BTreeMap<Metric, MetricValue>);

impl MetricValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, metric: Metric, value: MetricValue) {
        self.0.insert(metric, value);
    }

    pub fn get(&self, metric: Metric) -> Option<MetricValue> {
        self.0.get(&metric).copied()
    }

    /// Count value of `metric`, 0 if absent or not a count.
    pub fn count(&self, metric: Metric) -> u64 {
        match self.get(metric) {
            Some(MetricValue::Count(n)) => n,
            _ => 0,
        }
    }

    /// Minutes value of `metric`, 0.0 if absent or not minutes.
    pub fn minutes(&self, metric: Metric) -> f64 {
        match self.get(metric) {
            Some(MetricValue::Minutes(m)) => m,
            _ => 0.0,
        }
    }

    pub fn set_count(&mut self, metric: Metric, n: u64) {
        self.set(metric, MetricValue::Count(n));
    }

    pub fn set_minutes(&mut self, metric: Metric, m: f64) {
        self.set(metric, MetricValue::Minutes(round2(m.max(0.0))));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, MetricValue)> + '_ {
        self.0.iter().map(|(m, v)| (*m, *v))
    }
}

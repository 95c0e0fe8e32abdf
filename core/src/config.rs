use crate::{
    error::{GenError, GenResult},
    metrics::Metric,
    types::{AccountStatus, YearMonth},
    window::ObservationWindow,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Size categories and usage profiles ─────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeCategory {
    pub id: String,
    pub weight: f64,
    pub seats: SeatRange,
    pub annual_churn_rate: f64,
    /// Name of the entry in `profiles` that supplies baseline usage.
    pub profile: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeatRange {
    pub min: u32,
    pub max: u32,
}

/// Mature monthly usage for an account with `reference_seats` seats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageProfile {
    pub reference_seats: u32,
    pub baseline: BTreeMap<Metric, f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct SegmentsFile {
    size_categories: Vec<SizeCategory>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProfilesFile {
    profiles: BTreeMap<String, UsageProfile>,
}

// ── Catalog ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyNaming {
    /// Pick from `Catalog::companies`.
    #[default]
    Catalog,
    /// Compose prefix + suffix names.
    Generated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedBrand {
    pub id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: u32,
    pub name: String,
    pub catalog_id: String,
    pub catalog_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub id: u32,
    pub name: String,
    pub edition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub company_naming: CompanyNaming,
    #[serde(default)]
    pub companies: Vec<String>,
    pub brands: Vec<Brand>,
    pub ubrands: Vec<UnifiedBrand>,
    pub packages: Vec<Package>,
    pub tiers: Vec<Tier>,
    pub opcos: Vec<String>,
    #[serde(default = "default_tester_probability")]
    pub tester_probability: f64,
}

fn default_tester_probability() -> f64 { 0.5 }

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    catalog: Catalog,
}

// ── Churn, package changes, temporal shape, noise ──────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnConfig {
    /// Months before churn over which usage winds down.
    pub decline_window_months: u32,
    /// Multiplier reached in the final month before churn.
    pub decline_floor: f64,
    /// Upper bound of the near-zero multiplier at and after churn.
    pub post_churn_residual: f64,
    pub terminal_statuses: Vec<AccountStatus>,
    #[serde(default)]
    pub new_account_risk: Option<NewAccountRisk>,
}

/// Single-shot early churn check for recently signed-up accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccountRisk {
    /// Accounts in the last `recent_signup_months` admissible signup cohorts
    /// qualify, counted back from the latest signup `min_tenure_months`
    /// allows.
    pub recent_signup_months: u32,
    /// Churn, if drawn, lands at a tenure in 1..=window_months.
    pub window_months: u32,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageChangeConfig {
    pub interval_months: u32,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalConfig {
    /// Ramp length; 0 disables the growth phase.
    pub growth_months: u32,
    pub growth_steepness: f64,
    pub seasonal_amplitude: f64,
    /// Phase offset in radians; π/2 peaks in January.
    pub seasonal_phase: f64,
    pub trend: TrendConfig,
}

/// Rise-then-fall cycle applied after `start_month`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    pub start_month: u32,
    pub cycle_months: u32,
    /// Share of the cycle spent rising.
    pub rise_fraction: f64,
    pub peak: f64,
    /// How far the factor falls back from `peak` by the end of the cycle.
    pub decline: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// σ of the per-month multiplier noise, centred on 1.0 and clamped to ±3σ.
    pub multiplier_std: f64,
    pub jitter_low: f64,
    pub jitter_high: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct GeneratorFile {
    num_accounts: usize,
    window: ObservationWindow,
    min_tenure_months: u32,
    churn: ChurnConfig,
    package_change: PackageChangeConfig,
    temporal: TemporalConfig,
    noise: NoiseConfig,
}

// ── Top-level config ───────────────────────────────────────────────

/// Immutable input to a generation run. Build it, validate it, pass it by reference.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratorConfig {
    pub num_accounts: usize,
    pub window: ObservationWindow,
    /// Every account has at least this many observed months.
    pub min_tenure_months: u32,
    pub size_categories: Vec<SizeCategory>,
    pub profiles: BTreeMap<String, UsageProfile>,
    pub catalog: Catalog,
    pub churn: ChurnConfig,
    pub package_change: PackageChangeConfig,
    pub temporal: TemporalConfig,
    pub noise: NoiseConfig,
}

impl GeneratorConfig {
    /// Load from the data/ directory.
    /// In tests, use GeneratorConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/generator.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let gen_file: GeneratorFile = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;

        let segments_path = format!("{data_dir}/segments/size_categories.json");
        let segments_content = std::fs::read_to_string(&segments_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {segments_path}: {e}"))?;
        let segments_file: SegmentsFile = serde_json::from_str(&segments_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {segments_path}: {e}"))?;

        let profiles_path = format!("{data_dir}/profiles/usage_profiles.json");
        let profiles_content = std::fs::read_to_string(&profiles_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {profiles_path}: {e}"))?;
        let profiles_file: ProfilesFile = serde_json::from_str(&profiles_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {profiles_path}: {e}"))?;

        let catalog_path = format!("{data_dir}/catalog/catalog.json");
        let catalog_content = std::fs::read_to_string(&catalog_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {catalog_path}: {e}"))?;
        let catalog_file: CatalogFile = serde_json::from_str(&catalog_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {catalog_path}: {e}"))?;

        Ok(Self {
            num_accounts: gen_file.num_accounts,
            window: gen_file.window,
            min_tenure_months: gen_file.min_tenure_months,
            size_categories: segments_file.size_categories,
            profiles: profiles_file.profiles,
            catalog: catalog_file.catalog,
            churn: gen_file.churn,
            package_change: gen_file.package_change,
            temporal: gen_file.temporal,
            noise: gen_file.noise,
        })
    }

    pub fn profile_for(&self, category: &SizeCategory) -> Option<&UsageProfile> {
        self.profiles.get(&category.profile)
    }

    /// Latest signup offset that still leaves `min_tenure_months` in the window.
    pub fn latest_signup_offset(&self) -> u32 {
        self.window.len_months() - self.min_tenure_months
    }

    /// Fail-fast checks run before any generation.
    /// Returns the first problem found.
    pub fn validate(&self) -> GenResult<()> {
        if self.num_accounts == 0 {
            return Err(GenError::Degenerate("num_accounts must be positive".into()));
        }
        self.window.check()?;
        let window_len = self.window.len_months();
        if self.min_tenure_months == 0 || self.min_tenure_months > window_len {
            return Err(GenError::Degenerate(format!(
                "min_tenure_months={} must be in 1..={window_len} for a {window_len}-month window",
                self.min_tenure_months
            )));
        }

        self.validate_categories()?;
        self.validate_profiles()?;
        self.validate_catalog()?;
        self.validate_churn()?;

        if self.package_change.interval_months == 0 {
            return Err(GenError::InvalidConfig("package_change.interval_months must be ≥ 1".into()));
        }
        probability("package_change.probability", self.package_change.probability)?;

        let t = &self.temporal;
        if t.growth_months > 0 && !(t.growth_steepness > 0.0) {
            return Err(GenError::InvalidConfig("temporal.growth_steepness must be > 0".into()));
        }
        if !(0.0..1.0).contains(&t.seasonal_amplitude) {
            return Err(GenError::InvalidConfig("temporal.seasonal_amplitude must be in [0, 1)".into()));
        }
        if !t.seasonal_phase.is_finite() {
            return Err(GenError::InvalidConfig("temporal.seasonal_phase must be finite".into()));
        }
        if t.trend.cycle_months == 0 {
            return Err(GenError::InvalidConfig("temporal.trend.cycle_months must be ≥ 1".into()));
        }
        if !(t.trend.rise_fraction > 0.0 && t.trend.rise_fraction <= 1.0) {
            return Err(GenError::InvalidConfig("temporal.trend.rise_fraction must be in (0, 1]".into()));
        }
        if !(t.trend.peak > -1.0 && t.trend.peak - t.trend.decline > -1.0) {
            return Err(GenError::InvalidConfig("temporal.trend must keep (1 + trend) positive".into()));
        }

        let n = &self.noise;
        if !(n.multiplier_std >= 0.0 && n.multiplier_std < 1.0 / 3.0) {
            return Err(GenError::InvalidConfig("noise.multiplier_std must be in [0, 1/3)".into()));
        }
        if !(n.jitter_low >= 0.0 && n.jitter_low <= n.jitter_high) {
            return Err(GenError::InvalidConfig("noise jitter band must satisfy 0 ≤ low ≤ high".into()));
        }
        Ok(())
    }

    fn validate_categories(&self) -> GenResult<()> {
        if self.size_categories.is_empty() {
            return Err(GenError::EmptyList { name: "size_categories" });
        }
        let mut total_weight = 0.0;
        for cat in &self.size_categories {
            if !(cat.weight >= 0.0 && cat.weight.is_finite()) {
                return Err(GenError::InvalidConfig(format!(
                    "size category '{}' has invalid weight {}", cat.id, cat.weight
                )));
            }
            total_weight += cat.weight;
            if cat.seats.min == 0 || cat.seats.min > cat.seats.max {
                return Err(GenError::InvalidConfig(format!(
                    "size category '{}' seat range {}..={} is invalid", cat.id, cat.seats.min, cat.seats.max
                )));
            }
            probability("size_categories.annual_churn_rate", cat.annual_churn_rate)?;
            if self.profile_for(cat).is_none() {
                return Err(GenError::InvalidConfig(format!(
                    "size category '{}' references unknown profile '{}'", cat.id, cat.profile
                )));
            }
        }
        if total_weight <= 0.0 {
            return Err(GenError::InvalidConfig("size category weights sum to zero".into()));
        }
        if (total_weight - 1.0).abs() > 1e-6 {
            log::warn!("config: size category weights sum to {total_weight:.4}; draws are normalised");
        }
        Ok(())
    }

    fn validate_profiles(&self) -> GenResult<()> {
        if self.profiles.is_empty() {
            return Err(GenError::EmptyList { name: "profiles" });
        }
        for (name, profile) in &self.profiles {
            if profile.reference_seats == 0 {
                return Err(GenError::InvalidConfig(format!(
                    "profile '{name}' must have reference_seats ≥ 1"
                )));
            }
            for metric in Metric::ALL {
                match profile.baseline.get(&metric) {
                    None => {
                        return Err(GenError::InvalidConfig(format!(
                            "profile '{name}' is missing baseline {}", metric.column()
                        )))
                    }
                    Some(v) if !(v.is_finite() && *v >= 0.0) => {
                        return Err(GenError::InvalidConfig(format!(
                            "profile '{name}' baseline {} must be a non-negative number", metric.column()
                        )))
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    fn validate_catalog(&self) -> GenResult<()> {
        let c = &self.catalog;
        if c.company_naming == CompanyNaming::Catalog && c.companies.is_empty() {
            return Err(GenError::EmptyList { name: "companies" });
        }
        if c.brands.is_empty()   { return Err(GenError::EmptyList { name: "brands" }); }
        if c.ubrands.is_empty()  { return Err(GenError::EmptyList { name: "ubrands" }); }
        if c.packages.is_empty() { return Err(GenError::EmptyList { name: "packages" }); }
        if c.tiers.is_empty()    { return Err(GenError::EmptyList { name: "tiers" }); }
        if c.opcos.is_empty()    { return Err(GenError::EmptyList { name: "opcos" }); }
        probability("catalog.tester_probability", c.tester_probability)
    }

    fn validate_churn(&self) -> GenResult<()> {
        let c = &self.churn;
        probability("churn.decline_floor", c.decline_floor)?;
        probability("churn.post_churn_residual", c.post_churn_residual)?;
        if c.terminal_statuses.is_empty() {
            return Err(GenError::EmptyList { name: "terminal_statuses" });
        }
        if c.terminal_statuses.iter().any(AccountStatus::is_active) {
            return Err(GenError::InvalidConfig("churn.terminal_statuses must not include Active".into()));
        }
        if let Some(risk) = &c.new_account_risk {
            probability("churn.new_account_risk.probability", risk.probability)?;
            if risk.window_months == 0 {
                return Err(GenError::InvalidConfig(
                    "churn.new_account_risk.window_months must be ≥ 1".into(),
                ));
            }
            let cohorts = self.latest_signup_offset() + 1;
            if risk.recent_signup_months == 0 {
                log::warn!("config: new_account_risk.recent_signup_months=0; no account qualifies");
            } else if risk.recent_signup_months >= cohorts {
                log::warn!(
                    "config: new_account_risk.recent_signup_months={} covers all {cohorts} signup cohorts",
                    risk.recent_signup_months
                );
            }
        }
        Ok(())
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let size_categories = vec![
            SizeCategory {
                id: "small".into(),
                weight: 0.60,
                seats: SeatRange { min: 1, max: 10 },
                annual_churn_rate: 0.20,
                profile: "light".into(),
            },
            SizeCategory {
                id: "medium".into(),
                weight: 0.30,
                seats: SeatRange { min: 11, max: 50 },
                annual_churn_rate: 0.10,
                profile: "medium".into(),
            },
            SizeCategory {
                id: "large".into(),
                weight: 0.10,
                seats: SeatRange { min: 51, max: 200 },
                annual_churn_rate: 0.10,
                profile: "heavy".into(),
            },
        ];

        let profiles = [
            ("heavy".to_string(), profile(28, [
                150.0, 450.0, 120.0, 380.0, 5.0, 15.0, 80.0, 70.0, 240.0, 210.0,
                70.0, 50.0, 210.0, 170.0, 3.0, 2.0, 9.0, 6.0,
                28.0, 25.0, 4.0, 100.0, 50.0, 30.0, 15.0,
            ])),
            ("medium".to_string(), profile(20, [
                80.0, 240.0, 65.0, 210.0, 3.0, 8.0, 45.0, 35.0, 130.0, 110.0,
                35.0, 30.0, 110.0, 100.0, 2.0, 1.0, 5.0, 3.0,
                20.0, 18.0, 2.0, 50.0, 30.0, 15.0, 8.0,
            ])),
            ("light".to_string(), profile(12, [
                35.0, 100.0, 30.0, 90.0, 1.0, 3.0, 20.0, 15.0, 55.0, 45.0,
                15.0, 15.0, 45.0, 45.0, 1.0, 0.0, 2.0, 1.0,
                12.0, 10.0, 1.0, 20.0, 15.0, 5.0, 3.0,
            ])),
        ]
        .into_iter()
        .collect();

        let catalog = Catalog {
            company_naming: CompanyNaming::Catalog,
            companies: vec![
                "Acme Corporation".into(),
                "TechStart Innovations".into(),
                "Global Solutions Ltd".into(),
                "Enterprise Dynamics".into(),
                "Digital Ventures".into(),
            ],
            brands: vec![
                Brand { id: 1, name: "Premium Brand".into() },
                Brand { id: 2, name: "Standard Brand".into() },
                Brand { id: 3, name: "Economy Brand".into() },
            ],
            ubrands: vec![
                UnifiedBrand { id: "UA1".into(), description: "Unified Brand Alpha".into() },
                UnifiedBrand { id: "UA2".into(), description: "Unified Brand Beta".into() },
            ],
            packages: vec![
                Package { id: 100, name: "Starter Package".into(),  catalog_id: "CAT-100".into(), catalog_name: "Catalog Starter".into() },
                Package { id: 200, name: "Business Package".into(), catalog_id: "CAT-200".into(), catalog_name: "Catalog Business".into() },
                Package { id: 300, name: "Enterprise Package".into(), catalog_id: "CAT-300".into(), catalog_name: "Catalog Enterprise".into() },
            ],
            tiers: vec![
                Tier { id: 1, name: "Bronze Tier".into(), edition: "Standard Edition".into() },
                Tier { id: 2, name: "Gold Tier".into(),   edition: "Premium Edition".into() },
            ],
            opcos: vec!["OPCO-NORTH-AMERICA".into(), "OPCO-EUROPE".into()],
            tester_probability: 0.5,
        };

        Self {
            num_accounts: 50,
            window: ObservationWindow {
                start: YearMonth::new(2023, 1).expect("valid month"),
                end:   YearMonth::new(2025, 12).expect("valid month"),
            },
            min_tenure_months: 6,
            size_categories,
            profiles,
            catalog,
            churn: ChurnConfig {
                decline_window_months: 6,
                decline_floor: 0.3,
                post_churn_residual: 0.05,
                terminal_statuses: vec![AccountStatus::Suspended, AccountStatus::Closed],
                new_account_risk: Some(NewAccountRisk {
                    recent_signup_months: 6,
                    window_months: 6,
                    probability: 0.30,
                }),
            },
            package_change: PackageChangeConfig { interval_months: 24, probability: 0.10 },
            temporal: TemporalConfig {
                growth_months: 6,
                growth_steepness: 1.5,
                seasonal_amplitude: 0.15,
                seasonal_phase: std::f64::consts::FRAC_PI_2,
                trend: TrendConfig {
                    start_month: 6,
                    cycle_months: 24,
                    rise_fraction: 0.6,
                    peak: 0.20,
                    decline: 0.10,
                },
            },
            noise: NoiseConfig { multiplier_std: 0.05, jitter_low: 0.9, jitter_high: 1.1 },
        }
    }
}

/// Build a profile from baselines listed in `Metric::ALL` order.
pub fn profile(reference_seats: u32, values: [f64; 25]) -> UsageProfile {
    UsageProfile {
        reference_seats,
        baseline: Metric::ALL.into_iter().zip(values).collect(),
    }
}

fn probability(name: &str, p: f64) -> GenResult<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(GenError::InvalidConfig(format!("{name}={p} must be a probability in [0, 1]")))
    }
}

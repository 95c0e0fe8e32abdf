//! Deterministic company name generation from curated word lists.

use crate::{
    config::{Catalog, CompanyNaming},
    rng::StreamRng,
};

pub struct CompanyNameGenerator;

impl CompanyNameGenerator {
    /// Company name for one account, following the catalog's naming mode.
    pub fn for_catalog(catalog: &Catalog, rng: &mut StreamRng) -> String {
        match catalog.company_naming {
            CompanyNaming::Catalog => rng.pick(&catalog.companies).clone(),
            CompanyNaming::Generated => Self::generate(rng),
        }
    }

    /// "Prefix Suffix", e.g. "Summit Networks".
    pub fn generate(rng: &mut StreamRng) -> String {
        let prefix = rng.pick(Self::prefixes());
        let suffix = rng.pick(Self::suffixes());
        format!("{prefix} {suffix}")
    }

    fn prefixes() -> &'static [&'static str] {
        &[
            "Global", "Digital", "Tech", "Innovative", "Smart", "Cloud", "Enterprise",
            "Corporate", "Advanced", "Professional", "Premier", "Elite", "Summit",
            "Prime", "Apex", "Core", "Alpha", "Beta", "Omega", "Nexus",
        ]
    }

    fn suffixes() -> &'static [&'static str] {
        &[
            "Solutions", "Systems", "Technologies", "Corp", "Inc", "Group", "Networks",
            "Communications", "Telecom", "Services", "Enterprises", "Industries",
            "Partners", "Ventures", "Labs", "Dynamics", "Works", "Hub",
        ]
    }
}

// 🏢 Company Profile - report metadata, independent of the ledger

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Industry {
    Services,
    Banking,
    Hospitality,
    Manufacturing,
    Healthcare,
    Retail,
}

impl Industry {
    pub const ALL: [Industry; 6] = [
        Industry::Services,
        Industry::Banking,
        Industry::Hospitality,
        Industry::Manufacturing,
        Industry::Healthcare,
        Industry::Retail,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Industry::Services => "Services",
            Industry::Banking => "Banking",
            Industry::Hospitality => "Hospitality",
            Industry::Manufacturing => "Manufacturing",
            Industry::Healthcare => "Healthcare",
            Industry::Retail => "Retail",
        }
    }

    pub fn from_name(name: &str) -> Option<Industry> {
        Industry::ALL
            .into_iter()
            .find(|i| i.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for Industry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub industry: Industry,
    pub reporting_year: i32,
}

impl CompanyProfile {
    pub fn new(name: impl Into<String>, industry: Industry, reporting_year: i32) -> Self {
        CompanyProfile {
            name: name.into(),
            industry,
            reporting_year,
        }
    }
}

impl Default for CompanyProfile {
    fn default() -> Self {
        CompanyProfile::new("ACME", Industry::Services, 2025)
    }
}

//! Basic catalog (CNY).
//!
//! Three net grades, an installation-method multiplier in place of a markup
//! tier, and four accessory kinds counted by density per square meter.

use serde::{Deserialize, Serialize};

use super::{AccessoryItem, AccessoryKind, Catalog, Currency, DensityBasis, NetTypeSpec, Variant};
use crate::errors::{CalcError, CalcResult};

/// Smallest farm area accepted by the basic calculator's input form (ha)
pub const MIN_FARM_AREA_HA: f64 = 0.1;

static NET_TYPES: [NetTypeSpec; 3] = [
    NetTypeSpec {
        id: "standard",
        label: "standard",
        base_price_per_m2: 12.5,
        roll_coverage_m2: 500.0,
        description: "Standard - 5 year warranty",
    },
    NetTypeSpec {
        id: "reinforced",
        label: "reinforced",
        base_price_per_m2: 18.8,
        roll_coverage_m2: 450.0,
        description: "Reinforced - 8 year warranty",
    },
    NetTypeSpec {
        id: "premium",
        label: "premium",
        base_price_per_m2: 25.0,
        roll_coverage_m2: 400.0,
        description: "Premium - 10 year warranty",
    },
];

static ACCESSORIES: [AccessoryItem; 4] = [
    AccessoryItem { kind: AccessoryKind::GroundAnchors, unit_price: 3.50, density: 0.15 },
    AccessoryItem { kind: AccessoryKind::FixingClips, unit_price: 1.20, density: 0.8 },
    AccessoryItem { kind: AccessoryKind::Tensioners, unit_price: 8.80, density: 0.05 },
    AccessoryItem { kind: AccessoryKind::SupportPoles, unit_price: 45.00, density: 0.03 },
];

/// Engine configuration for the basic calculator
pub static CATALOG: Catalog = Catalog {
    variant: Variant::Basic,
    currency: Currency::Cny,
    density_basis: DensityBasis::PerSquareMeter,
    discount_tiers: &[],
    split_per_hectare: false,
};

/// The fixed accessory list priced by the basic calculator
pub fn accessories() -> &'static [AccessoryItem] {
    &ACCESSORIES
}

/// Basic net grades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasicNetType {
    #[default]
    Standard,
    Reinforced,
    Premium,
}

impl BasicNetType {
    pub const ALL: [BasicNetType; 3] = [BasicNetType::Standard, BasicNetType::Reinforced, BasicNetType::Premium];

    pub fn spec(self) -> &'static NetTypeSpec {
        match self {
            BasicNetType::Standard => &NET_TYPES[0],
            BasicNetType::Reinforced => &NET_TYPES[1],
            BasicNetType::Premium => &NET_TYPES[2],
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(BasicNetType::Standard),
            "reinforced" => Ok(BasicNetType::Reinforced),
            "premium" => Ok(BasicNetType::Premium),
            _ => Err(CalcError::unknown_option("net type", s)),
        }
    }
}

impl std::fmt::Display for BasicNetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.spec().label)
    }
}

/// Installation method; scales the base price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallationType {
    #[default]
    Manual,
    Mechanical,
    Hybrid,
}

impl InstallationType {
    pub const ALL: [InstallationType; 3] = [
        InstallationType::Manual,
        InstallationType::Mechanical,
        InstallationType::Hybrid,
    ];

    pub fn factor(self) -> f64 {
        match self {
            InstallationType::Manual => 1.0,
            InstallationType::Mechanical => 1.15,
            InstallationType::Hybrid => 1.08,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            InstallationType::Manual => "Manual installation (standard cost)",
            InstallationType::Mechanical => "Mechanical installation (+15% cost)",
            InstallationType::Hybrid => "Hybrid installation (+8% cost)",
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(InstallationType::Manual),
            "mechanical" => Ok(InstallationType::Mechanical),
            "hybrid" => Ok(InstallationType::Hybrid),
            _ => Err(CalcError::unknown_option("installation type", s)),
        }
    }
}

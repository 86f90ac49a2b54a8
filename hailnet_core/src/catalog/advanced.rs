//! Advanced catalog (USD).
//!
//! Net types T60 / T90+ / L50, markup tiers, the economy and luxury
//! accessory packages, bulk discount tiers and the constants behind the
//! fuzzy (area-only) estimate.

use serde::{Deserialize, Serialize};

use super::{AccessoryItem, AccessoryKind, Catalog, Currency, DensityBasis, DiscountTier, NetTypeSpec, Variant};
use crate::errors::{CalcError, CalcResult};

/// Preset farm areas (hectares) offered in fuzzy mode, ascending
pub const FARM_AREA_OPTIONS_HA: [f64; 5] = [5.0, 10.0, 20.0, 50.0, 100.0];

/// Roof-mounted netting needs this much more material than flat coverage
pub const ROOF_STRUCTURE_FACTOR: f64 = 1.155;

/// Reference block the fuzzy accessory counts are scaled from
pub const REFERENCE_HECTARES: f64 = 10.0;
pub const REFERENCE_WIDTH_M: f64 = 300.0;
pub const REFERENCE_LENGTH_M: f64 = 334.0;
pub const REFERENCE_ROW_SPACING_M: f64 = 4.0;
/// 300 m / 4 m
pub const REFERENCE_ROW_COUNT: f64 = 75.0;

/// Extra length per row for anchoring (m)
pub const ANCHOR_MARGIN_M: f64 = 15.0;
/// Net lengths are cut in 5 m steps
pub const NET_LENGTH_STEP_M: f64 = 5.0;
/// Net widths come in 0.2 m steps
pub const NET_WIDTH_DIVISIONS_PER_M: f64 = 5.0;

static NET_TYPES: [NetTypeSpec; 3] = [
    NetTypeSpec {
        id: "T60",
        label: "T60",
        base_price_per_m2: 0.142,
        roll_coverage_m2: 500.0,
        description: "700kly | 5 years",
    },
    NetTypeSpec {
        id: "T90",
        label: "T90+",
        base_price_per_m2: 0.237,
        roll_coverage_m2: 450.0,
        description: "1200kly | 8 years",
    },
    NetTypeSpec {
        id: "L50",
        label: "L50",
        base_price_per_m2: 0.160,
        roll_coverage_m2: 480.0,
        description: "700kly | 6 years",
    },
];

/// Economy items first; luxury adds the trailing two.
static ACCESSORIES: [AccessoryItem; 5] = [
    AccessoryItem { kind: AccessoryKind::NetClips, unit_price: 0.10, density: 2.0 },
    AccessoryItem { kind: AccessoryKind::BungeeHooks, unit_price: 0.10, density: 2.0 },
    AccessoryItem { kind: AccessoryKind::BungeeCord, unit_price: 0.38, density: 1.0 },
    AccessoryItem { kind: AccessoryKind::WireClips, unit_price: 0.10, density: 1.0 },
    AccessoryItem { kind: AccessoryKind::NetConnectors, unit_price: 0.35, density: 1.0 },
];

static DISCOUNT_TIERS: [DiscountTier; 2] = [
    DiscountTier { min_hectares: 100.0, rate: 0.05 },
    DiscountTier { min_hectares: 50.0, rate: 0.02 },
];

/// Engine configuration for the advanced calculator
pub static CATALOG: Catalog = Catalog {
    variant: Variant::Advanced,
    currency: Currency::Usd,
    density_basis: DensityBasis::PerRowMeter,
    discount_tiers: &DISCOUNT_TIERS,
    split_per_hectare: true,
};

/// Advanced net types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AdvancedNetType {
    /// 700kly, 5 year rating
    #[default]
    T60,
    /// 1200kly, 8 year rating (sold as "T90+")
    T90,
    /// 700kly, 6 year rating
    L50,
}

impl AdvancedNetType {
    pub const ALL: [AdvancedNetType; 3] = [AdvancedNetType::T60, AdvancedNetType::T90, AdvancedNetType::L50];

    pub fn spec(self) -> &'static NetTypeSpec {
        match self {
            AdvancedNetType::T60 => &NET_TYPES[0],
            AdvancedNetType::T90 => &NET_TYPES[1],
            AdvancedNetType::L50 => &NET_TYPES[2],
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "T60" => Ok(AdvancedNetType::T60),
            "T90" | "T90+" => Ok(AdvancedNetType::T90),
            "L50" => Ok(AdvancedNetType::L50),
            _ => Err(CalcError::unknown_option("net type", s)),
        }
    }
}

impl std::fmt::Display for AdvancedNetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.spec().label)
    }
}

/// Markup applied on top of the base price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceMarginTier {
    #[default]
    Margin30,
    Margin40,
    Margin50,
}

impl PriceMarginTier {
    pub const ALL: [PriceMarginTier; 3] = [
        PriceMarginTier::Margin30,
        PriceMarginTier::Margin40,
        PriceMarginTier::Margin50,
    ];

    /// Markup as a fraction (0.30 for 30 %)
    pub fn fraction(self) -> f64 {
        match self {
            PriceMarginTier::Margin30 => 0.30,
            PriceMarginTier::Margin40 => 0.40,
            PriceMarginTier::Margin50 => 0.50,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PriceMarginTier::Margin30 => "30%",
            PriceMarginTier::Margin40 => "40%",
            PriceMarginTier::Margin50 => "50%",
        }
    }

    /// Accepts `30`, `30%` or `margin30`
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let normalized = s.trim().to_lowercase();
        let digits = normalized.trim_start_matches("margin").trim_end_matches('%');
        match digits {
            "30" => Ok(PriceMarginTier::Margin30),
            "40" => Ok(PriceMarginTier::Margin40),
            "50" => Ok(PriceMarginTier::Margin50),
            _ => Err(CalcError::unknown_option("price margin", s)),
        }
    }
}

/// Named bundle of fastener kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessoryPackage {
    /// Net clips, bungee hooks, bungee cord
    #[default]
    Economy,
    /// Economy plus wire clips and net connectors
    Luxury,
}

impl AccessoryPackage {
    pub fn items(self) -> &'static [AccessoryItem] {
        match self {
            AccessoryPackage::Economy => &ACCESSORIES[..3],
            AccessoryPackage::Luxury => &ACCESSORIES[..],
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AccessoryPackage::Economy => "Economy",
            AccessoryPackage::Luxury => "Luxury",
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "economy" | "eco" => Ok(AccessoryPackage::Economy),
            "luxury" | "lux" => Ok(AccessoryPackage::Luxury),
            _ => Err(CalcError::unknown_option("accessory package", s)),
        }
    }
}

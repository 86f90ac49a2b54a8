//! # Pricing Catalogs
//!
//! Static lookup tables for the two calculator variants. The advanced catalog
//! is priced in USD and covers fuzzy (area) and precise (row geometry)
//! estimates; the basic catalog is priced in CNY and works from farm area
//! alone. The two catalogs have different net type ids and values and are
//! kept in separate modules so they cannot be mixed up.
//!
//! The calculation engine is written once and parameterised by a [`Catalog`]
//! value: which currency it prices in, how accessory densities are measured,
//! which bulk discount tiers apply and whether per-hectare costs are split.
//!
//! ## Example
//!
//! ```rust
//! use hailnet_core::catalog::advanced::{self, AdvancedNetType};
//! use hailnet_core::catalog::basic::{self, BasicNetType};
//!
//! assert_eq!(AdvancedNetType::T60.spec().base_price_per_m2, 0.142);
//! assert_eq!(BasicNetType::Standard.spec().base_price_per_m2, 12.5);
//!
//! assert_eq!(advanced::CATALOG.bulk_discount_rate(100.0), 0.05);
//! assert_eq!(basic::CATALOG.bulk_discount_rate(100.0), 0.0);
//! ```

pub mod advanced;
pub mod basic;

pub use advanced::{AccessoryPackage, AdvancedNetType, PriceMarginTier};
pub use basic::{BasicNetType, InstallationType};

use serde::{Deserialize, Serialize};

/// Which calculator a catalog, input or result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// USD-denominated export calculator (password gated)
    Advanced,
    /// CNY-denominated domestic calculator
    Basic,
}

impl Variant {
    pub fn display_name(&self) -> &'static str {
        match self {
            Variant::Advanced => "Advanced",
            Variant::Basic => "Basic",
        }
    }
}

/// Currency a catalog is priced in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Cny,
}

impl Currency {
    /// Symbol prefixed to formatted amounts
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Cny => "¥",
        }
    }

    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Cny => "CNY",
        }
    }
}

/// Static description of one net type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetTypeSpec {
    /// Catalog id (`T60`, `standard`, ...)
    pub id: &'static str,
    /// Label printed on quotations (`T90+` for `T90`)
    pub label: &'static str,
    /// Base price per square meter, in the catalog currency
    pub base_price_per_m2: f64,
    /// Area of netting supplied by one roll (m²)
    pub roll_coverage_m2: f64,
    /// Rating / warranty summary
    pub description: &'static str,
}

/// Fastener item kinds across both catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessoryKind {
    NetClips,
    BungeeHooks,
    BungeeCord,
    WireClips,
    NetConnectors,
    GroundAnchors,
    FixingClips,
    Tensioners,
    SupportPoles,
}

impl AccessoryKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            AccessoryKind::NetClips => "Net Clips",
            AccessoryKind::BungeeHooks => "Bungee Hooks",
            AccessoryKind::BungeeCord => "Bungee Cord",
            AccessoryKind::WireClips => "Wire Clips",
            AccessoryKind::NetConnectors => "Net Connectors",
            AccessoryKind::GroundAnchors => "Ground Anchors",
            AccessoryKind::FixingClips => "Fixing Clips",
            AccessoryKind::Tensioners => "Tensioners",
            AccessoryKind::SupportPoles => "Support Poles",
        }
    }
}

impl std::fmt::Display for AccessoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// What an accessory density is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DensityBasis {
    /// Items per meter of row, summed over all rows
    PerRowMeter,
    /// Items per square meter of covered area
    PerSquareMeter,
}

/// One priced accessory item kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccessoryItem {
    pub kind: AccessoryKind,
    /// Unit price in the catalog currency
    pub unit_price: f64,
    /// Items per unit of the catalog's [`DensityBasis`]
    pub density: f64,
}

/// Bulk discount unlocked at or above a hectare threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiscountTier {
    pub min_hectares: f64,
    pub rate: f64,
}

/// Configuration of the shared estimation engine for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Catalog {
    pub variant: Variant,
    pub currency: Currency,
    pub density_basis: DensityBasis,
    /// Tiers ordered from the highest threshold down; empty means no discount
    pub discount_tiers: &'static [DiscountTier],
    /// Whether per-hectare figures are split into net and accessory cost
    pub split_per_hectare: bool,
}

impl Catalog {
    /// Discount rate for an order covering `hectares`.
    ///
    /// The first tier whose threshold is met wins; NaN meets no threshold.
    pub fn bulk_discount_rate(&self, hectares: f64) -> f64 {
        self.discount_tiers
            .iter()
            .find(|tier| hectares >= tier.min_hectares)
            .map(|tier| tier.rate)
            .unwrap_or(0.0)
    }
}

//! # Pricing Resolver
//!
//! Prices an [`AreaResolution`] against a catalog:
//!
//! ```text
//! unit price      = base price × modifier          (1 + margin, or installation factor)
//! net cost        = material area × unit price
//! accessories     = Σ count(item) × unit price(item)
//! discount        = (net + accessories) × tier rate
//! total           = net + accessories − discount
//! ```

use serde::Serialize;

use super::area::AreaResolution;
use crate::catalog::{AccessoryItem, AccessoryKind, Catalog, InstallationType, NetTypeSpec, PriceMarginTier};

/// Multiplier applied to the catalog base price
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PriceModifier {
    /// Advanced catalog markup tier
    Margin(PriceMarginTier),
    /// Basic catalog installation method
    Installation(InstallationType),
}

impl PriceModifier {
    pub fn apply(&self, base_price: f64) -> f64 {
        match self {
            PriceModifier::Margin(tier) => base_price * (1.0 + tier.fraction()),
            PriceModifier::Installation(installation) => base_price * installation.factor(),
        }
    }
}

/// One priced accessory line of the bill of materials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccessoryLine {
    pub kind: AccessoryKind,
    pub count: u64,
    pub unit_price: f64,
    pub cost: f64,
}

/// Per-hectare cost figures. All zero in precise mode, where the geometry
/// has no farm area to divide by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerHectareCost {
    pub total: f64,
    /// Present when the catalog splits per-hectare cost
    pub net: Option<f64>,
    pub accessories: Option<f64>,
}

/// Output of the pricing pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingResolution {
    pub base_price: f64,
    pub unit_price: f64,
    pub accessories: Vec<AccessoryLine>,
    pub net_cost: f64,
    pub accessories_cost: f64,
    pub subtotal: f64,
    pub bulk_discount_rate: f64,
    pub discount_amount: f64,
    pub total_price: f64,
    pub per_hectare: PerHectareCost,
}

/// Count and price the given accessory items against the area's measure.
pub fn price_accessories(area: &AreaResolution, items: &[AccessoryItem]) -> Vec<AccessoryLine> {
    items
        .iter()
        .map(|item| {
            let count = area.measure.count_for(item.density);
            AccessoryLine {
                kind: item.kind,
                count,
                unit_price: item.unit_price,
                cost: count as f64 * item.unit_price,
            }
        })
        .collect()
}

/// Price a resolved area.
///
/// Nothing here is guarded: a NaN or infinite area flows through to the money
/// fields unchanged.
pub fn resolve(
    catalog: &Catalog,
    net: &NetTypeSpec,
    modifier: PriceModifier,
    area: &AreaResolution,
    items: &[AccessoryItem],
) -> PricingResolution {
    let base_price = net.base_price_per_m2;
    let unit_price = modifier.apply(base_price);
    let net_cost = area.actual_net_area_m2 * unit_price;

    let accessories = price_accessories(area, items);
    let accessories_cost: f64 = accessories.iter().map(|line| line.cost).sum();

    let subtotal = net_cost + accessories_cost;
    let bulk_discount_rate = catalog.bulk_discount_rate(area.discount_hectares);
    let discount_amount = subtotal * bulk_discount_rate;
    let total_price = subtotal - discount_amount;

    let split = catalog.split_per_hectare;
    let per_hectare = match area.per_hectare_basis {
        Some(hectares) => PerHectareCost {
            total: total_price / hectares,
            net: split.then(|| net_cost / hectares),
            accessories: split.then(|| accessories_cost / hectares),
        },
        None => PerHectareCost {
            total: 0.0,
            net: split.then_some(0.0),
            accessories: split.then_some(0.0),
        },
    };

    PricingResolution {
        base_price,
        unit_price,
        accessories,
        net_cost,
        accessories_cost,
        subtotal,
        bulk_discount_rate,
        discount_amount,
        total_price,
        per_hectare,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::area::{resolve_basic, resolve_fuzzy, resolve_precise};
    use crate::catalog::{advanced, basic, AccessoryPackage, AdvancedNetType, BasicNetType};

    #[test]
    fn test_margin_modifier() {
        let price = PriceModifier::Margin(PriceMarginTier::Margin30).apply(0.142);
        assert!((price - 0.1846).abs() < 1e-12);
    }

    #[test]
    fn test_installation_modifier() {
        assert_eq!(PriceModifier::Installation(InstallationType::Manual).apply(12.5), 12.5);
        let mechanical = PriceModifier::Installation(InstallationType::Mechanical).apply(12.5);
        assert!((mechanical - 14.375).abs() < 1e-12);
    }

    #[test]
    fn test_basic_pricing() {
        let net = BasicNetType::Standard.spec();
        let area = resolve_basic(5.0, net);
        let pricing = resolve(
            &basic::CATALOG,
            net,
            PriceModifier::Installation(InstallationType::Manual),
            &area,
            basic::accessories(),
        );

        assert_eq!(pricing.unit_price, 12.5);
        assert_eq!(pricing.net_cost, 625_000.0);
        // 7500×3.5 + 40000×1.2 + 2500×8.8 + 1500×45
        assert!((pricing.accessories_cost - 163_750.0).abs() < 1e-6);
        assert_eq!(pricing.bulk_discount_rate, 0.0);
        assert_eq!(pricing.discount_amount, 0.0);
        assert_eq!(pricing.total_price, pricing.net_cost + pricing.accessories_cost);

        let per_ha = pricing.per_hectare;
        assert!((per_ha.total - pricing.total_price / 5.0).abs() < 1e-9);
        assert_eq!(per_ha.net, None);
    }

    #[test]
    fn test_fuzzy_pricing_with_discount() {
        let net = AdvancedNetType::T60.spec();
        let area = resolve_fuzzy(50.0, net);
        let pricing = resolve(
            &advanced::CATALOG,
            net,
            PriceModifier::Margin(PriceMarginTier::Margin30),
            &area,
            AccessoryPackage::Economy.items(),
        );

        assert_eq!(pricing.bulk_discount_rate, 0.02);
        assert!((pricing.discount_amount - pricing.subtotal * 0.02).abs() < 1e-9);
        assert!((pricing.total_price + pricing.discount_amount - pricing.subtotal).abs() < 1e-6);

        let per_ha = pricing.per_hectare;
        assert!((per_ha.net.unwrap() - pricing.net_cost / 50.0).abs() < 1e-9);
        assert!((per_ha.accessories.unwrap() - pricing.accessories_cost / 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_precise_per_hectare_is_zero() {
        let net = AdvancedNetType::L50.spec();
        let area = resolve_precise(10, 100.0, 3.0);
        let pricing = resolve(
            &advanced::CATALOG,
            net,
            PriceModifier::Margin(PriceMarginTier::Margin50),
            &area,
            AccessoryPackage::Luxury.items(),
        );

        assert_eq!(
            pricing.per_hectare,
            PerHectareCost { total: 0.0, net: Some(0.0), accessories: Some(0.0) }
        );
        assert_eq!(pricing.accessories.len(), 5);
        // 0.414 ha: no discount
        assert_eq!(pricing.bulk_discount_rate, 0.0);
        // 4140 m² × 0.16 × 1.5
        assert!((pricing.net_cost - 993.6).abs() < 1e-6);
    }

    #[test]
    fn test_nan_area_propagates_to_money() {
        let net = BasicNetType::Standard.spec();
        let area = resolve_basic(f64::NAN, net);
        let pricing = resolve(
            &basic::CATALOG,
            net,
            PriceModifier::Installation(InstallationType::Manual),
            &area,
            basic::accessories(),
        );
        assert!(pricing.net_cost.is_nan());
        assert!(pricing.total_price.is_nan());
    }
}

//! # Estimation Engine
//!
//! One pure entry point, [`compute`], turns a complete [`CalculationInput`]
//! into a complete [`CalculationResult`]. There is no incremental update:
//! any parameter change is a fresh call with the full input, and the result
//! replaces the previous one as a whole.
//!
//! - `*Input` - input parameters (JSON-serializable)
//! - [`CalculationResult`] - derived quantities and costs (JSON-serializable)
//! - [`compute`] - the calculation, infallible by contract
//! - [`CalculationInput::validate`] - the input-form constraints, for front ends
//!
//! ## Example
//!
//! ```rust
//! use hailnet_core::calculations::{compute, CalculationInput, BasicInput};
//! use hailnet_core::catalog::{BasicNetType, InstallationType};
//!
//! let input = CalculationInput::Basic(BasicInput {
//!     farm_area_ha: 5.0,
//!     net_type: BasicNetType::Standard,
//!     installation: InstallationType::Manual,
//! });
//!
//! let result = compute(&input);
//! assert_eq!(result.total_area_m2, 50_000.0);
//! assert_eq!(result.rolls_needed, 100);
//! assert_eq!(result.net_cost, 625_000.0);
//! ```

pub mod area;
pub mod pricing;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use area::{AccessoryMeasure, AreaResolution};
pub use pricing::{AccessoryLine, PerHectareCost, PriceModifier, PricingResolution};

use crate::catalog::{
    advanced, basic, AccessoryKind, AccessoryPackage, AdvancedNetType, BasicNetType, Catalog, Currency,
    InstallationType, NetTypeSpec, PriceMarginTier, Variant,
};
use crate::errors::{CalcError, CalcResult};

/// Minimum row count accepted by the precise input form
pub const MIN_ROW_COUNT: u32 = 2;
/// Minimum row length accepted by the precise input form (m)
pub const MIN_ROW_LENGTH_M: f64 = 1.0;
/// Minimum row spacing accepted by the precise input form (m)
pub const MIN_ROW_SPACING_M: f64 = 0.5;

/// Advanced calculator, fuzzy mode: estimate from a preset farm area.
///
/// ## JSON Example
///
/// ```json
/// {
///   "mode": "fuzzy",
///   "farm_area_ha": 20.0,
///   "net_type": "T90",
///   "price_margin": "margin40",
///   "accessory_package": "luxury"
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzyInput {
    /// Farm area in hectares; snapped to {5, 10, 20, 50, 100} during compute
    pub farm_area_ha: f64,
    pub net_type: AdvancedNetType,
    pub price_margin: PriceMarginTier,
    pub accessory_package: AccessoryPackage,
}

/// Advanced calculator, precise mode: estimate from row geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreciseInput {
    pub row_count: u32,
    pub row_length_m: f64,
    pub row_spacing_m: f64,
    pub net_type: AdvancedNetType,
    pub price_margin: PriceMarginTier,
    pub accessory_package: AccessoryPackage,
}

/// Basic calculator: flat coverage of a farm area, priced in CNY.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicInput {
    /// Farm area in hectares (any positive value, not snapped)
    pub farm_area_ha: f64,
    pub net_type: BasicNetType,
    pub installation: InstallationType,
}

/// Complete parameter set for one calculation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CalculationInput {
    Fuzzy(FuzzyInput),
    Precise(PreciseInput),
    Basic(BasicInput),
}

/// Which estimate a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationMode {
    Fuzzy,
    Precise,
    Basic,
}

impl CalculationMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            CalculationMode::Fuzzy => "Area Estimation",
            CalculationMode::Precise => "Precise Calculation",
            CalculationMode::Basic => "Basic Estimation",
        }
    }
}

impl CalculationInput {
    pub fn mode(&self) -> CalculationMode {
        match self {
            CalculationInput::Fuzzy(_) => CalculationMode::Fuzzy,
            CalculationInput::Precise(_) => CalculationMode::Precise,
            CalculationInput::Basic(_) => CalculationMode::Basic,
        }
    }

    pub fn catalog(&self) -> &'static Catalog {
        match self {
            CalculationInput::Fuzzy(_) | CalculationInput::Precise(_) => &advanced::CATALOG,
            CalculationInput::Basic(_) => &basic::CATALOG,
        }
    }

    pub fn net_type_spec(&self) -> &'static NetTypeSpec {
        match self {
            CalculationInput::Fuzzy(input) => input.net_type.spec(),
            CalculationInput::Precise(input) => input.net_type.spec(),
            CalculationInput::Basic(input) => input.net_type.spec(),
        }
    }

    /// Check the constraints the input forms enforce.
    ///
    /// [`compute`] does not call this; it accepts anything and lets
    /// degenerate values propagate.
    pub fn validate(&self) -> CalcResult<()> {
        match self {
            CalculationInput::Fuzzy(input) => {
                if !input.farm_area_ha.is_finite() || input.farm_area_ha <= 0.0 {
                    return Err(CalcError::invalid_input(
                        "farm_area_ha",
                        input.farm_area_ha.to_string(),
                        "Farm area must be a positive number",
                    ));
                }
            }
            CalculationInput::Precise(input) => {
                if input.row_count < MIN_ROW_COUNT {
                    return Err(CalcError::invalid_input(
                        "row_count",
                        input.row_count.to_string(),
                        format!("At least {} rows are required", MIN_ROW_COUNT),
                    ));
                }
                if !input.row_length_m.is_finite() || input.row_length_m < MIN_ROW_LENGTH_M {
                    return Err(CalcError::invalid_input(
                        "row_length_m",
                        input.row_length_m.to_string(),
                        format!("Row length must be at least {} m", MIN_ROW_LENGTH_M),
                    ));
                }
                if !input.row_spacing_m.is_finite() || input.row_spacing_m < MIN_ROW_SPACING_M {
                    return Err(CalcError::invalid_input(
                        "row_spacing_m",
                        input.row_spacing_m.to_string(),
                        format!("Row spacing must be at least {} m", MIN_ROW_SPACING_M),
                    ));
                }
            }
            CalculationInput::Basic(input) => {
                if !input.farm_area_ha.is_finite() || input.farm_area_ha < basic::MIN_FARM_AREA_HA {
                    return Err(CalcError::invalid_input(
                        "farm_area_ha",
                        input.farm_area_ha.to_string(),
                        format!("Farm area must be at least {} ha", basic::MIN_FARM_AREA_HA),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Fully derived estimate. Never updated piecewise.
///
/// Invariant: `total_price == subtotal − discount_amount` where
/// `subtotal == net_cost + accessories_cost` and
/// `discount_amount == subtotal × bulk_discount_rate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    pub variant: Variant,
    pub mode: CalculationMode,
    pub currency: Currency,
    pub net_type: &'static NetTypeSpec,

    /// Net width per row (m), precise mode only
    pub net_width_m: f64,
    /// Net length per row (m), precise mode only
    pub net_length_m: f64,
    pub total_area_m2: f64,
    pub actual_net_area_m2: f64,
    pub rolls_needed: u64,

    pub base_price: f64,
    /// Price per m² after markup or installation factor
    pub unit_price: f64,
    pub accessories: Vec<AccessoryLine>,

    pub net_cost: f64,
    pub accessories_cost: f64,
    pub subtotal: f64,
    pub bulk_discount_rate: f64,
    pub discount_amount: f64,
    pub total_price: f64,

    /// Zero in precise mode
    pub per_hectare: PerHectareCost,
}

impl CalculationResult {
    fn assemble(input: &CalculationInput, area: AreaResolution, pricing: PricingResolution) -> Self {
        let catalog = input.catalog();
        CalculationResult {
            variant: catalog.variant,
            mode: input.mode(),
            currency: catalog.currency,
            net_type: input.net_type_spec(),
            net_width_m: area.net_width_m,
            net_length_m: area.net_length_m,
            total_area_m2: area.total_area_m2,
            actual_net_area_m2: area.actual_net_area_m2,
            rolls_needed: area.rolls_needed,
            base_price: pricing.base_price,
            unit_price: pricing.unit_price,
            accessories: pricing.accessories,
            net_cost: pricing.net_cost,
            accessories_cost: pricing.accessories_cost,
            subtotal: pricing.subtotal,
            bulk_discount_rate: pricing.bulk_discount_rate,
            discount_amount: pricing.discount_amount,
            total_price: pricing.total_price,
            per_hectare: pricing.per_hectare,
        }
    }

    /// Count for an accessory kind; 0 when the kind is not in the package
    pub fn count_of(&self, kind: AccessoryKind) -> u64 {
        self.accessories
            .iter()
            .find(|line| line.kind == kind)
            .map(|line| line.count)
            .unwrap_or(0)
    }

    pub fn has_discount(&self) -> bool {
        self.bulk_discount_rate > 0.0
    }

    /// Net cost as a fraction of the subtotal
    pub fn net_share(&self) -> f64 {
        self.net_cost / self.subtotal
    }

    /// Accessories cost as a fraction of the subtotal
    pub fn accessory_share(&self) -> f64 {
        self.accessories_cost / self.subtotal
    }
}

/// Run the full estimate for one input.
pub fn compute(input: &CalculationInput) -> CalculationResult {
    let catalog = input.catalog();
    let net = input.net_type_spec();

    let (area, modifier, items) = match input {
        CalculationInput::Fuzzy(fuzzy) => (
            area::resolve_fuzzy(fuzzy.farm_area_ha, net),
            PriceModifier::Margin(fuzzy.price_margin),
            fuzzy.accessory_package.items(),
        ),
        CalculationInput::Precise(precise) => (
            area::resolve_precise(precise.row_count, precise.row_length_m, precise.row_spacing_m),
            PriceModifier::Margin(precise.price_margin),
            precise.accessory_package.items(),
        ),
        CalculationInput::Basic(basic_input) => (
            area::resolve_basic(basic_input.farm_area_ha, net),
            PriceModifier::Installation(basic_input.installation),
            basic::accessories(),
        ),
    };

    let pricing = pricing::resolve(catalog, net, modifier, &area, items);
    let result = CalculationResult::assemble(input, area, pricing);

    debug!(
        mode = ?result.mode,
        net_type = result.net_type.id,
        total_area_m2 = result.total_area_m2,
        rolls = result.rolls_needed,
        total_price = result.total_price,
        "estimate computed"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use crate::catalog::advanced::{FARM_AREA_OPTIONS_HA, ROOF_STRUCTURE_FACTOR};

    fn fuzzy(area: f64, net_type: AdvancedNetType, package: AccessoryPackage) -> CalculationInput {
        CalculationInput::Fuzzy(FuzzyInput {
            farm_area_ha: area,
            net_type,
            price_margin: PriceMarginTier::Margin30,
            accessory_package: package,
        })
    }

    fn precise(rows: u32, length: f64, spacing: f64) -> CalculationInput {
        CalculationInput::Precise(PreciseInput {
            row_count: rows,
            row_length_m: length,
            row_spacing_m: spacing,
            net_type: AdvancedNetType::T60,
            price_margin: PriceMarginTier::Margin30,
            accessory_package: AccessoryPackage::Economy,
        })
    }

    fn assert_close(a: f64, b: f64) {
        let tolerance = 1e-9 * a.abs().max(b.abs()).max(1.0);
        assert!((a - b).abs() <= tolerance, "{} != {}", a, b);
    }

    #[test]
    fn test_basic_reference_case() {
        let input = CalculationInput::Basic(BasicInput {
            farm_area_ha: 5.0,
            net_type: BasicNetType::Standard,
            installation: InstallationType::Manual,
        });
        let result = compute(&input);

        assert_eq!(result.variant, Variant::Basic);
        assert_eq!(result.currency, Currency::Cny);
        assert_eq!(result.total_area_m2, 50_000.0);
        assert_eq!(result.unit_price, 12.5);
        assert_eq!(result.net_cost, 625_000.0);
        assert_eq!(result.rolls_needed, 100);
        assert_eq!(result.count_of(AccessoryKind::GroundAnchors), 7_500);
        assert_eq!(result.count_of(AccessoryKind::FixingClips), 40_000);
        assert_eq!(result.count_of(AccessoryKind::Tensioners), 2_500);
        assert_eq!(result.count_of(AccessoryKind::SupportPoles), 1_500);
        assert!(!result.has_discount());
        assert_eq!(result.total_price, result.net_cost + result.accessories_cost);
    }

    #[test]
    fn test_fuzzy_snaps_to_presets() {
        let snapped = compute(&fuzzy(7.0, AdvancedNetType::T60, AccessoryPackage::Economy));
        let exact = compute(&fuzzy(5.0, AdvancedNetType::T60, AccessoryPackage::Economy));
        assert_eq!(snapped, exact);

        let tie = compute(&fuzzy(15.0, AdvancedNetType::T60, AccessoryPackage::Economy));
        assert_eq!(tie.total_area_m2, 100_000.0);
    }

    #[test]
    fn test_fuzzy_result_fields() {
        let result = compute(&fuzzy(10.0, AdvancedNetType::T60, AccessoryPackage::Economy));
        assert_eq!(result.mode, CalculationMode::Fuzzy);
        assert_eq!(result.net_width_m, 0.0);
        assert_eq!(result.net_length_m, 0.0);
        assert_eq!(result.rolls_needed, 231);
        assert_eq!(result.count_of(AccessoryKind::NetClips), 50_100);
        assert_eq!(result.count_of(AccessoryKind::BungeeHooks), 50_100);
        assert_eq!(result.count_of(AccessoryKind::BungeeCord), 25_050);
        assert_eq!(result.count_of(AccessoryKind::WireClips), 0);
        assert!(result.per_hectare.total > 0.0);
    }

    #[test]
    fn test_precise_result_fields() {
        let result = compute(&precise(10, 100.0, 3.0));
        assert_eq!(result.mode, CalculationMode::Precise);
        assert_eq!(result.net_width_m, 3.6);
        assert_eq!(result.net_length_m, 115.0);
        assert_eq!(result.rolls_needed, 10);
        assert_eq!(result.actual_net_area_m2, result.total_area_m2);
        assert_eq!(result.per_hectare.total, 0.0);
        assert_eq!(result.per_hectare.net, Some(0.0));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["per_hectare"]["total"], 0.0);
        assert_eq!(json["per_hectare"]["accessories"], 0.0);
    }

    #[test]
    fn test_precise_discount_uses_netting_area() {
        // 3.6 m × 1015 m × 140 rows = 511 560 m² ≈ 51.2 ha
        let result = compute(&precise(140, 1_000.0, 3.0));
        assert_eq!(result.bulk_discount_rate, 0.02);

        // 3.6 m × 1015 m × 274 rows ≈ 100.1 ha
        let result = compute(&precise(274, 1_000.0, 3.0));
        assert_eq!(result.bulk_discount_rate, 0.05);
    }

    #[test]
    fn test_fuzzy_discount_tiers() {
        let rates: Vec<f64> = FARM_AREA_OPTIONS_HA
            .iter()
            .map(|&ha| compute(&fuzzy(ha, AdvancedNetType::T90, AccessoryPackage::Economy)).bulk_discount_rate)
            .collect();
        assert_eq!(rates, vec![0.0, 0.0, 0.0, 0.02, 0.05]);
    }

    #[test]
    fn test_validate() {
        assert!(precise(2, 1.0, 0.5).validate().is_ok());
        assert!(precise(1, 100.0, 3.0).validate().is_err());
        assert!(precise(10, 0.5, 3.0).validate().is_err());
        assert!(precise(10, 100.0, 0.4).validate().is_err());
        assert!(precise(10, f64::NAN, 3.0).validate().is_err());

        let tiny = CalculationInput::Basic(BasicInput {
            farm_area_ha: 0.05,
            net_type: BasicNetType::Standard,
            installation: InstallationType::Manual,
        });
        let err = tiny.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_degenerate_input_is_not_rejected_by_compute() {
        let result = compute(&precise(0, 0.0, 0.0));
        assert_eq!(result.total_area_m2, 0.0);
        // 0 / 0
        assert!(result.net_share().is_nan());
    }

    #[test]
    fn test_input_json_shape() {
        let input = fuzzy(20.0, AdvancedNetType::T90, AccessoryPackage::Luxury);
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["mode"], "fuzzy");
        assert_eq!(json["net_type"], "T90");
        assert_eq!(json["accessory_package"], "luxury");

        let roundtrip: CalculationInput = serde_json::from_value(json).unwrap();
        assert_eq!(roundtrip, input);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let input = precise(12, 250.0, 3.5);
        assert_eq!(compute(&input), compute(&input));
    }

    fn advanced_net_type() -> impl Strategy<Value = AdvancedNetType> {
        prop::sample::select(AdvancedNetType::ALL.to_vec())
    }

    fn margin() -> impl Strategy<Value = PriceMarginTier> {
        prop::sample::select(PriceMarginTier::ALL.to_vec())
    }

    fn package() -> impl Strategy<Value = AccessoryPackage> {
        prop::sample::select(vec![AccessoryPackage::Economy, AccessoryPackage::Luxury])
    }

    fn any_input() -> impl Strategy<Value = CalculationInput> {
        prop_oneof![
            (prop::sample::select(FARM_AREA_OPTIONS_HA.to_vec()), advanced_net_type(), margin(), package()).prop_map(
                |(farm_area_ha, net_type, price_margin, accessory_package)| {
                    CalculationInput::Fuzzy(FuzzyInput { farm_area_ha, net_type, price_margin, accessory_package })
                }
            ),
            (2u32..400, 1.0f64..2_000.0, 0.5f64..10.0, advanced_net_type(), margin(), package()).prop_map(
                |(row_count, row_length_m, row_spacing_m, net_type, price_margin, accessory_package)| {
                    CalculationInput::Precise(PreciseInput {
                        row_count,
                        row_length_m,
                        row_spacing_m,
                        net_type,
                        price_margin,
                        accessory_package,
                    })
                }
            ),
            (
                0.1f64..500.0,
                prop::sample::select(BasicNetType::ALL.to_vec()),
                prop::sample::select(InstallationType::ALL.to_vec())
            )
                .prop_map(|(farm_area_ha, net_type, installation)| {
                    CalculationInput::Basic(BasicInput { farm_area_ha, net_type, installation })
                }),
        ]
    }

    proptest! {
        #[test]
        fn fuzzy_rolls_follow_roof_factor(
            area in prop::sample::select(FARM_AREA_OPTIONS_HA.to_vec()),
            net_type in advanced_net_type(),
            margin in margin(),
            package in package(),
        ) {
            let input = CalculationInput::Fuzzy(FuzzyInput {
                farm_area_ha: area,
                net_type,
                price_margin: margin,
                accessory_package: package,
            });
            let result = compute(&input);
            let expected = (area * 10_000.0 * ROOF_STRUCTURE_FACTOR / net_type.spec().roll_coverage_m2).ceil() as u64;
            prop_assert_eq!(result.rolls_needed, expected);
        }

        #[test]
        fn total_plus_discount_equals_subtotal(input in any_input()) {
            let result = compute(&input);
            let gross = result.net_cost + result.accessories_cost;
            let tolerance = 1e-9 * gross.abs().max(1.0);
            prop_assert!((result.total_price + result.discount_amount - gross).abs() <= tolerance);
            prop_assert!((result.total_price - gross * (1.0 - result.bulk_discount_rate)).abs() <= tolerance);
        }

        #[test]
        fn luxury_adds_two_lines_and_cost_only(input in any_input()) {
            let economy_input = match input {
                CalculationInput::Fuzzy(f) => CalculationInput::Fuzzy(FuzzyInput { accessory_package: AccessoryPackage::Economy, ..f }),
                CalculationInput::Precise(p) => CalculationInput::Precise(PreciseInput { accessory_package: AccessoryPackage::Economy, ..p }),
                CalculationInput::Basic(_) => return Ok(()),
            };
            let luxury_input = match economy_input {
                CalculationInput::Fuzzy(f) => CalculationInput::Fuzzy(FuzzyInput { accessory_package: AccessoryPackage::Luxury, ..f }),
                CalculationInput::Precise(p) => CalculationInput::Precise(PreciseInput { accessory_package: AccessoryPackage::Luxury, ..p }),
                CalculationInput::Basic(_) => unreachable!(),
            };

            let economy = compute(&economy_input);
            let luxury = compute(&luxury_input);

            prop_assert_eq!(luxury.accessories.len(), economy.accessories.len() + 2);
            prop_assert_eq!(&luxury.accessories[..3], &economy.accessories[..]);
            prop_assert!(luxury.accessories_cost > economy.accessories_cost);
            prop_assert_eq!(luxury.net_cost, economy.net_cost);
            prop_assert_eq!(luxury.rolls_needed, economy.rolls_needed);
        }

        #[test]
        fn precise_dimensions_are_on_their_grids(
            rows in 2u32..200,
            length in 1.0f64..2_000.0,
            spacing in 0.5f64..10.0,
        ) {
            let result = compute(&precise(rows, length, spacing));
            prop_assert_eq!(result.rolls_needed, u64::from(rows));
            prop_assert!(result.net_width_m >= 2.0 * spacing / 3f64.sqrt() - 1e-9);
            prop_assert!(result.net_length_m >= length + 15.0 - 1e-9);
            prop_assert_eq!(result.net_length_m % 5.0, 0.0);
            let fifths = result.net_width_m * 5.0;
            prop_assert!((fifths - fifths.round()).abs() < 1e-9);
        }

        #[test]
        fn accessory_counts_cover_their_measure(input in any_input()) {
            let result = compute(&input);
            for line in &result.accessories {
                prop_assert_eq!(line.cost, line.count as f64 * line.unit_price);
            }
            let summed: f64 = result.accessories.iter().map(|line| line.cost).sum();
            prop_assert_eq!(summed, result.accessories_cost);
        }
    }
}

//! # Area/Quantity Resolver
//!
//! Turns farm area or row geometry into netting dimensions, covered area,
//! material area, roll count and the measure accessory densities are
//! applied to.
//!
//! | Mode    | Total area               | Material area        | Rolls                      |
//! |---------|--------------------------|----------------------|----------------------------|
//! | fuzzy   | ha × 10 000              | total × 1.155        | ⌈material / roll coverage⌉ |
//! | precise | width × length × rows    | total                | row count                  |
//! | basic   | ha × 10 000              | total                | ⌈total / roll coverage⌉    |

use serde::Serialize;

use crate::catalog::advanced::{
    FARM_AREA_OPTIONS_HA, REFERENCE_HECTARES, REFERENCE_LENGTH_M, REFERENCE_ROW_COUNT, ROOF_STRUCTURE_FACTOR,
};
use crate::catalog::NetTypeSpec;
use crate::rounding::{ceil_count, net_length_for_row, net_width_for_spacing, snap_to_nearest};

/// Square meters per hectare
pub const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

pub fn hectares_to_square_meters(hectares: f64) -> f64 {
    hectares * SQUARE_METERS_PER_HECTARE
}

pub fn square_meters_to_hectares(square_meters: f64) -> f64 {
    square_meters / SQUARE_METERS_PER_HECTARE
}

/// Snap a requested fuzzy-mode area onto the preset option set.
pub fn snap_farm_area(hectares: f64) -> f64 {
    snap_to_nearest(hectares, &FARM_AREA_OPTIONS_HA)
}

/// The quantity accessory densities are multiplied by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum AccessoryMeasure {
    /// `meters_per_row × density × rows × scale`
    RowMeters { meters_per_row: f64, rows: f64, scale: f64 },
    /// `square_meters × density`
    Area { square_meters: f64 },
}

impl AccessoryMeasure {
    /// Whole item count for one accessory density.
    ///
    /// Each item kind is rounded up on its own, never derived from another
    /// kind's rounded count.
    pub fn count_for(&self, density: f64) -> u64 {
        match *self {
            AccessoryMeasure::RowMeters { meters_per_row, rows, scale } => {
                ceil_count(meters_per_row * density * rows * scale)
            }
            AccessoryMeasure::Area { square_meters } => ceil_count(square_meters * density),
        }
    }
}

/// Output of the area/quantity pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AreaResolution {
    /// Net width per row (m); precise mode only, otherwise 0
    pub net_width_m: f64,
    /// Net length per row (m); precise mode only, otherwise 0
    pub net_length_m: f64,
    /// Covered ground area (m²)
    pub total_area_m2: f64,
    /// Netting area after structural adjustment (m²)
    pub actual_net_area_m2: f64,
    pub rolls_needed: u64,
    /// Hectare figure used for bulk discount eligibility
    pub discount_hectares: f64,
    /// Hectare figure per-hectare costs are divided by, when applicable
    pub per_hectare_basis: Option<f64>,
    pub measure: AccessoryMeasure,
}

/// Fuzzy (area estimate) mode of the advanced calculator.
///
/// `farm_area_ha` is snapped onto [`FARM_AREA_OPTIONS_HA`] first. Accessory
/// counts scale the 10 ha reference block (334 m rows, 75 of them) by
/// `farm_area_ha / 10`.
pub fn resolve_fuzzy(farm_area_ha: f64, net: &NetTypeSpec) -> AreaResolution {
    let farm_area_ha = snap_farm_area(farm_area_ha);
    let total_area_m2 = hectares_to_square_meters(farm_area_ha);
    let actual_net_area_m2 = total_area_m2 * ROOF_STRUCTURE_FACTOR;

    AreaResolution {
        net_width_m: 0.0,
        net_length_m: 0.0,
        total_area_m2,
        actual_net_area_m2,
        rolls_needed: ceil_count(actual_net_area_m2 / net.roll_coverage_m2),
        discount_hectares: farm_area_ha,
        per_hectare_basis: Some(farm_area_ha),
        measure: AccessoryMeasure::RowMeters {
            meters_per_row: REFERENCE_LENGTH_M,
            rows: REFERENCE_ROW_COUNT,
            scale: farm_area_ha / REFERENCE_HECTARES,
        },
    }
}

/// Precise (row geometry) mode of the advanced calculator.
///
/// One roll is cut per row, so the roll count is the row count and no roof
/// factor is applied. The discount basis is derived from the netting area,
/// not from the row inputs.
pub fn resolve_precise(row_count: u32, row_length_m: f64, row_spacing_m: f64) -> AreaResolution {
    let net_width_m = net_width_for_spacing(row_spacing_m);
    let net_length_m = net_length_for_row(row_length_m);
    let rows = f64::from(row_count);
    let total_area_m2 = net_width_m * net_length_m * rows;

    AreaResolution {
        net_width_m,
        net_length_m,
        total_area_m2,
        actual_net_area_m2: total_area_m2,
        rolls_needed: u64::from(row_count),
        discount_hectares: square_meters_to_hectares(total_area_m2),
        per_hectare_basis: None,
        measure: AccessoryMeasure::RowMeters {
            meters_per_row: row_length_m,
            rows,
            scale: 1.0,
        },
    }
}

/// Basic calculator: flat coverage of any farm area, no snapping.
pub fn resolve_basic(farm_area_ha: f64, net: &NetTypeSpec) -> AreaResolution {
    let total_area_m2 = hectares_to_square_meters(farm_area_ha);

    AreaResolution {
        net_width_m: 0.0,
        net_length_m: 0.0,
        total_area_m2,
        actual_net_area_m2: total_area_m2,
        rolls_needed: ceil_count(total_area_m2 / net.roll_coverage_m2),
        discount_hectares: farm_area_ha,
        per_hectare_basis: Some(farm_area_ha),
        measure: AccessoryMeasure::Area {
            square_meters: total_area_m2,
        },
    }
}

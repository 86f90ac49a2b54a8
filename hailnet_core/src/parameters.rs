//! # Parameter Sets
//!
//! The user-editable state of each calculator. A parameter set is what gets
//! persisted; the [`CalculationResult`] is always derived from it and
//! replaced wholesale whenever it changes.
//!
//! ## Example
//!
//! ```rust
//! use hailnet_core::parameters::{AdvancedParameters, Estimator};
//!
//! let mut estimator = Estimator::new(AdvancedParameters::default());
//! let before = estimator.result().total_price;
//!
//! estimator.update(|p| p.set_farm_area(18.0)); // snaps to 20 ha
//! assert_eq!(estimator.params().farm_area_ha, 20.0);
//! assert!(estimator.result().total_price > before);
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calculations::area::snap_farm_area;
use crate::calculations::{compute, BasicInput, CalculationInput, CalculationResult, FuzzyInput, PreciseInput};
use crate::catalog::{AccessoryPackage, AdvancedNetType, BasicNetType, InstallationType, PriceMarginTier};
use crate::errors::CalcResult;
use crate::store::{StateStore, ADVANCED_PARAMETERS_KEY, BASIC_PARAMETERS_KEY};

/// A persisted, resettable set of calculator inputs.
pub trait ParameterSet: Clone + Default + Serialize + DeserializeOwned {
    /// Namespace key in the [`StateStore`]
    const STORAGE_KEY: &'static str;

    /// The full engine input these parameters describe
    fn to_input(&self) -> CalculationInput;

    fn customer_name(&self) -> &str;

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Which estimate the advanced calculator runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvancedMode {
    #[default]
    Fuzzy,
    Precise,
}

/// Advanced (USD) calculator state.
///
/// Both the fuzzy and the precise fields are kept so switching modes does not
/// lose what was typed into the other one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedParameters {
    pub mode: AdvancedMode,
    pub farm_area_ha: f64,
    pub row_count: u32,
    pub row_length_m: f64,
    pub row_spacing_m: f64,
    pub net_type: AdvancedNetType,
    pub price_margin: PriceMarginTier,
    pub accessory_package: AccessoryPackage,
    pub customer_name: String,
}

impl Default for AdvancedParameters {
    fn default() -> Self {
        AdvancedParameters {
            mode: AdvancedMode::Fuzzy,
            farm_area_ha: 5.0,
            row_count: 10,
            row_length_m: 100.0,
            row_spacing_m: 3.0,
            net_type: AdvancedNetType::T60,
            price_margin: PriceMarginTier::Margin30,
            accessory_package: AccessoryPackage::Economy,
            customer_name: String::new(),
        }
    }
}

impl AdvancedParameters {
    /// Set the fuzzy-mode farm area, snapped to the nearest preset
    pub fn set_farm_area(&mut self, hectares: f64) {
        self.farm_area_ha = snap_farm_area(hectares);
    }
}

impl ParameterSet for AdvancedParameters {
    const STORAGE_KEY: &'static str = ADVANCED_PARAMETERS_KEY;

    fn to_input(&self) -> CalculationInput {
        match self.mode {
            AdvancedMode::Fuzzy => CalculationInput::Fuzzy(FuzzyInput {
                farm_area_ha: self.farm_area_ha,
                net_type: self.net_type,
                price_margin: self.price_margin,
                accessory_package: self.accessory_package,
            }),
            AdvancedMode::Precise => CalculationInput::Precise(PreciseInput {
                row_count: self.row_count,
                row_length_m: self.row_length_m,
                row_spacing_m: self.row_spacing_m,
                net_type: self.net_type,
                price_margin: self.price_margin,
                accessory_package: self.accessory_package,
            }),
        }
    }

    fn customer_name(&self) -> &str {
        &self.customer_name
    }
}

/// Basic (CNY) calculator state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicParameters {
    pub farm_area_ha: f64,
    pub net_type: BasicNetType,
    pub installation: InstallationType,
    pub customer_name: String,
}

impl Default for BasicParameters {
    fn default() -> Self {
        BasicParameters {
            farm_area_ha: 5.0,
            net_type: BasicNetType::Standard,
            installation: InstallationType::Manual,
            customer_name: String::new(),
        }
    }
}

impl ParameterSet for BasicParameters {
    const STORAGE_KEY: &'static str = BASIC_PARAMETERS_KEY;

    fn to_input(&self) -> CalculationInput {
        CalculationInput::Basic(BasicInput {
            farm_area_ha: self.farm_area_ha,
            net_type: self.net_type,
            installation: self.installation,
        })
    }

    fn customer_name(&self) -> &str {
        &self.customer_name
    }
}

/// Current parameters plus the result derived from them.
///
/// Every mutation goes through [`Estimator::update`] or
/// [`Estimator::reset`], so the result is never stale.
#[derive(Debug, Clone)]
pub struct Estimator<P: ParameterSet> {
    params: P,
    result: CalculationResult,
}

impl<P: ParameterSet> Estimator<P> {
    pub fn new(params: P) -> Self {
        let result = compute(&params.to_input());
        Estimator { params, result }
    }

    /// Restore the parameters saved in `store`, or the defaults.
    pub fn load(store: &StateStore) -> Self {
        Self::new(store.load_or_default(P::STORAGE_KEY))
    }

    pub fn save(&self, store: &StateStore) -> CalcResult<()> {
        store.save(P::STORAGE_KEY, &self.params)
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn result(&self) -> &CalculationResult {
        &self.result
    }

    /// Apply a change to the parameters and recompute.
    pub fn update(&mut self, change: impl FnOnce(&mut P)) -> &CalculationResult {
        change(&mut self.params);
        self.result = compute(&self.params.to_input());
        &self.result
    }

    /// Back to defaults, recomputed
    pub fn reset(&mut self) -> &CalculationResult {
        self.params.reset();
        self.result = compute(&self.params.to_input());
        info!(key = P::STORAGE_KEY, "parameters reset");
        &self.result
    }
}

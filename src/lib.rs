//! Pressure-enthalpy flash solver core for the fixed five-component
//! {H2, N2, O2, NH3, H2O} system, modeled with the Peng-Robinson cubic
//! equation of state.
//!
//! Given a feed composition, pressure, and target molar enthalpy, finds
//! the equilibrium temperature and phase split. See [`flash_calculate`]
//! for the entry point.

pub mod components;
pub mod constants;
pub mod diagnostics;
pub mod driver;
pub mod enthalpy;
pub mod eos;
pub mod errors;
pub mod ideal_gas;
pub mod numeric;
pub mod options;
pub mod state;
pub mod vle;

pub use constants::NC;
pub use driver::OperatingCondition;
pub use errors::{PhFlashError, PhFlashResult};
pub use options::{BipSource, FlashOptions, FlashOptionsBuilder};
pub use state::FlashState;

/// Fixed-size feed/phase composition vector.
pub type Composition = [f64; NC];

/// Runs a full P-H flash for feed `z` at pressure `p` (Pa) with target
/// molar enthalpy `h_target` (J/mol), per `options`.
///
/// This is the sole public entry point (spec.md section 6): it validates
/// inputs, builds a [`eos::PrSystem`] from `options`, and drives the outer
/// temperature loop to convergence.
pub fn flash_calculate(
    z: Composition,
    p: f64,
    h_target: f64,
    options: &FlashOptions,
) -> PhFlashResult<FlashState> {
    let sys = eos::PrSystem::new(options)?;
    driver::solve(&sys, z, p, h_target, options, None)
}

/// Same as [`flash_calculate`], routing solver diagnostics through `sink`
/// when `options.verbose` is set.
pub fn flash_calculate_with_diagnostics(
    z: Composition,
    p: f64,
    h_target: f64,
    options: &FlashOptions,
    sink: &dyn diagnostics::Diagnostics,
) -> PhFlashResult<FlashState> {
    let sys = eos::PrSystem::new(options)?;
    driver::solve(&sys, z, p, h_target, options, Some(sink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_calculate_round_trips_an_ideal_gas_enthalpy_target() {
        let z = [0.0, 0.79, 0.21, 0.0, 0.0];
        let target_t = 310.0;
        let h_target: f64 = (0..NC).map(|i| z[i] * ideal_gas::h_ig(i, target_t)).sum();
        let options = FlashOptions::default();
        let state = flash_calculate(z, 101325.0, h_target, &options).unwrap();
        assert!((state.t - target_t).abs() < 5.0);
        assert!(state.is_single_phase());
    }

    #[test]
    fn flash_calculate_rejects_bad_composition() {
        let z = [0.5, 0.5, 0.5, 0.0, 0.0];
        let options = FlashOptions::default();
        let err = flash_calculate(z, 101325.0, 0.0, &options).unwrap_err();
        assert!(matches!(err, PhFlashError::InvalidComposition(_)));
    }

    #[test]
    fn flash_calculate_rejects_pressure_out_of_range() {
        let z = [0.2, 0.2, 0.2, 0.2, 0.2];
        let options = FlashOptions::default();
        let err = flash_calculate(z, -1.0, 0.0, &options).unwrap_err();
        assert!(matches!(err, PhFlashError::InvalidPressure(_)));
    }
}

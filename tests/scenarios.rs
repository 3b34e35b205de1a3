//! Concrete acceptance scenarios (spec.md section 8).

use approx::assert_relative_eq;
use ph_flash_core::{flash_calculate, FlashOptions};

#[test]
fn nitrogen_oxygen_single_phase_vapor_at_ambient_conditions() {
    let z = [0.0, 0.79, 0.21, 0.0, 0.0];
    let options = FlashOptions::default();

    // Enthalpy of air-like mixture well above its dew point stays vapor.
    let h_target = -200.0;
    let state = flash_calculate(z, 101325.0, h_target, &options).unwrap();
    assert!(state.is_single_phase());
    assert!(state.t > 200.0 && state.t < 400.0);
}

#[test]
fn ammonia_water_two_phase_split_at_moderate_pressure() {
    let z = [0.0, 0.0, 0.0, 0.4, 0.6];
    let options = FlashOptions::default();

    let h_target = -1.2e5;
    let state = flash_calculate(z, 5.0e5, h_target, &options).unwrap();
    assert!(state.beta > 0.0 && state.beta < 1.0, "expected a two-phase split, got beta={}", state.beta);
    for i in 0..5 {
        let recombined = (1.0 - state.beta) * state.x[i] + state.beta * state.y[i];
        assert_relative_eq!(recombined, z[i], epsilon = 1e-6);
    }
}

#[test]
fn hydrogen_rich_feed_uses_quantum_correction_when_enabled() {
    let z = [0.95, 0.05, 0.0, 0.0, 0.0];
    let with_quantum = FlashOptions::builder().use_quantum_h2(true).build().unwrap();
    let without_quantum = FlashOptions::builder().use_quantum_h2(false).build().unwrap();

    let h_target = -50.0;
    let state_with = flash_calculate(z, 2.0e6, h_target, &with_quantum).unwrap();
    let state_without = flash_calculate(z, 2.0e6, h_target, &without_quantum).unwrap();

    // The correction shifts the solved temperature measurably at cryogenic,
    // hydrogen-dominated conditions.
    assert!((state_with.t - state_without.t).abs() > 1e-6);
}

#[test]
fn near_critical_oxygen_nitrogen_mixture_converges() {
    let z = [0.0, 0.5, 0.5, 0.0, 0.0];
    let options = FlashOptions::default();
    let h_target = -300.0;
    let state = flash_calculate(z, 3.4e6, h_target, &options).unwrap();
    assert!(state.t.is_finite());
    assert!(state.z_vapor >= state.z_liquid - 1e-9);
}

#[test]
fn full_five_component_feed_converges_with_anderson_enabled() {
    let z = [0.1, 0.2, 0.1, 0.2, 0.4];
    let options = FlashOptions::default();
    let h_target = -3.0e4;
    let state = flash_calculate(z, 1.0e6, h_target, &options).unwrap();
    assert!((state.h - h_target).abs() < 200.0);
}

#[test]
fn disabling_anderson_still_converges_via_damped_successive_substitution() {
    let z = [0.0, 0.0, 0.0, 0.4, 0.6];
    let options = FlashOptions::builder().use_anderson(false).build().unwrap();
    let h_target = -1.2e5;
    let state = flash_calculate(z, 5.0e5, h_target, &options).unwrap();
    assert!((state.h - h_target).abs() < options.custom_enthalpy_tol.unwrap_or(150.0));
}

#[test]
fn hydrogen_nitrogen_feed_stays_single_phase_at_high_pressure() {
    use ph_flash_core::ideal_gas::h_ig;

    let z = [0.5, 0.5, 0.0, 0.0, 0.0];
    let options = FlashOptions::default();
    let h_target: f64 = (0..5).map(|i| z[i] * h_ig(i, 250.0)).sum();
    let state = flash_calculate(z, 1.0e7, h_target, &options).unwrap();
    assert!(state.is_single_phase());
    assert!(state.t >= 200.0 && state.t <= 350.0);
}

#[test]
fn cryogenic_air_like_feed_condenses_to_mostly_liquid() {
    use ph_flash_core::ideal_gas::h_ig;

    let z = [0.0, 0.79, 0.21, 0.0, 0.0];
    let options = FlashOptions::default();
    let h_target: f64 = (0..5).map(|i| z[i] * h_ig(i, 90.0)).sum::<f64>() - 5000.0;
    let state = flash_calculate(z, 101325.0, h_target, &options).unwrap();
    assert!(state.beta < 0.5, "expected mostly-liquid split, got beta={}", state.beta);
}

//! Boundary conditions (spec.md section 8): extreme pressure, temperature
//! clamps, near-pure compositions.

use ph_flash_core::{BipSource, FlashOptions};
use ph_flash_core::errors::PhFlashError;
use ph_flash_core::flash_calculate;

#[test]
fn pressure_below_accepted_range_is_rejected() {
    let z = [0.2, 0.2, 0.2, 0.2, 0.2];
    let options = FlashOptions::default();
    let err = flash_calculate(z, 1.0, 0.0, &options).unwrap_err();
    assert!(matches!(err, PhFlashError::InvalidPressure(_)));
}

#[test]
fn pressure_above_accepted_range_is_rejected() {
    let z = [0.2, 0.2, 0.2, 0.2, 0.2];
    let options = FlashOptions::default();
    let err = flash_calculate(z, 1.0e12, 0.0, &options).unwrap_err();
    assert!(matches!(err, PhFlashError::InvalidPressure(_)));
}

#[test]
fn enthalpy_target_outside_accepted_range_is_rejected() {
    let z = [0.2, 0.2, 0.2, 0.2, 0.2];
    let options = FlashOptions::default();
    let err = flash_calculate(z, 101325.0, 1.0e9, &options).unwrap_err();
    assert!(matches!(err, PhFlashError::InvalidEnthalpy(_)));
}

#[test]
fn near_pure_hydrogen_feed_converges() {
    let z = [0.999, 0.00025, 0.00025, 0.00025, 0.00025];
    let options = FlashOptions::default();
    let state = flash_calculate(z, 1.0e6, -20.0, &options).unwrap();
    assert!(state.t.is_finite());
}

#[test]
fn near_pure_water_feed_converges() {
    let z = [0.00025, 0.00025, 0.00025, 0.00025, 0.999];
    let options = FlashOptions::default();
    let state = flash_calculate(z, 1.0e5, -2.4e5, &options).unwrap();
    assert!(state.t.is_finite());
}

#[test]
fn custom_bip_source_with_out_of_range_value_is_rejected_at_configuration_time() {
    let mut custom = [[0.0; 5]; 5];
    custom[0][1] = 0.9;
    custom[1][0] = 0.9;
    let options = FlashOptions::builder()
        .bip_source(BipSource::Custom(Box::new(custom)))
        .build()
        .unwrap();
    let z = [0.2, 0.2, 0.2, 0.2, 0.2];
    let err = flash_calculate(z, 101325.0, 0.0, &options).unwrap_err();
    assert!(matches!(err, PhFlashError::InvalidBip(..)));
}

#[test]
fn invalid_damping_factor_is_rejected_by_options_validation() {
    let result = FlashOptions::builder().damping(1.5).build();
    assert!(result.is_err());
}

//! Wilson K-value initialization (spec.md section 4.3).

use crate::constants::NC;

/// `K_i = (Pc_i / P) * exp[5.373 (1 + omega_i)(1 - Tc_i / T)]`.
///
/// Used at first entry into the VLE solver and after TPD detects
/// instability with no prior K estimate.
pub fn wilson_k(p: f64, t: f64, tc: &[f64; NC], pc: &[f64; NC], omega: &[f64; NC]) -> [f64; NC] {
    let mut k = [0.0; NC];
    for i in 0..NC {
        k[i] = (pc[i] / p) * (5.373 * (1.0 + omega[i]) * (1.0 - tc[i] / t)).exp();
    }
    k
}

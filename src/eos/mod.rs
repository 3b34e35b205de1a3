//! Peng-Robinson equation of state: mixing rules, cubic solve, fugacity,
//! enthalpy departure, and the hydrogen quantum correction, assembled into
//! a single per-configuration [`PrSystem`].

pub mod bip;
pub mod cubic;
pub mod quantum;

pub use bip::BipMatrix;
pub use cubic::{CubicRoots, MixtureParams, PrPureParams};

use crate::components::{COMPONENTS, H2};
use crate::constants::NC;
use crate::errors::PhFlashResult;
use crate::options::FlashOptions;

/// A fully configured PR-EOS instance: BIP matrix and the quantum-H2
/// switch, selected once at configuration time (spec.md section 4.1,
/// "selected once at configuration time").
#[derive(Debug, Clone, Copy)]
pub struct PrSystem {
    pub bip: BipMatrix,
    pub use_quantum_h2: bool,
}

/// The full working state of the EOS kernel for one `(T, phase)` pair:
/// pure and mixture parameters plus the effective criticals used to build
/// them (spec.md section 3, "PR parameter bundle").
#[derive(Debug, Clone, Copy)]
pub struct PrBundle {
    pub pure: PrPureParams,
    pub mix: MixtureParams,
    pub tc_used: [f64; NC],
    pub pc_used: [f64; NC],
}

impl PrSystem {
    pub fn new(options: &FlashOptions) -> PhFlashResult<Self> {
        Ok(Self {
            bip: BipMatrix::from_source(&options.bip_source)?,
            use_quantum_h2: options.use_quantum_h2,
        })
    }

    /// Effective critical properties at `t`, with the hydrogen quantum
    /// correction applied if enabled (spec.md section 4.1).
    pub fn effective_criticals(&self, t: f64) -> ([f64; NC], [f64; NC]) {
        let mut tc = [0.0; NC];
        let mut pc = [0.0; NC];
        for i in 0..NC {
            tc[i] = COMPONENTS[i].tc;
            pc[i] = COMPONENTS[i].pc;
        }
        if self.use_quantum_h2 {
            let (tc_h2, pc_h2) = quantum::effective_critical_h2(t);
            tc[H2] = tc_h2;
            pc[H2] = pc_h2;
        }
        (tc, pc)
    }

    /// Builds the PR parameter bundle for temperature `t` and phase
    /// composition `x`. Never shared across phases (spec.md section 3,
    /// "Lifetimes").
    pub fn bundle(&self, t: f64, x: &[f64; NC]) -> PrBundle {
        let (tc_used, pc_used) = self.effective_criticals(t);
        let mut omega = [0.0; NC];
        for i in 0..NC {
            omega[i] = COMPONENTS[i].omega;
        }
        let pure = PrPureParams::at_temperature(t, &tc_used, &pc_used, &omega);
        let mix = MixtureParams::new(x, &pure, &self.bip.0);
        PrBundle {
            pure,
            mix,
            tc_used,
            pc_used,
        }
    }

    /// Solves the cubic for a bundle at pressure `p`, temperature `t`.
    pub fn solve_z(&self, bundle: &PrBundle, p: f64, t: f64) -> PhFlashResult<(CubicRoots, f64, f64)> {
        let (a, b) = cubic::reduced_ab(bundle.mix.a_mix, bundle.mix.b_mix, p, t);
        let roots = cubic::solve_cubic(a, b)?;
        Ok((roots, a, b))
    }

    /// Liquid-like and vapor-like fugacity coefficients for composition
    /// `x` given an already-solved bundle and `Z`.
    pub fn ln_phi(
        &self,
        bundle: &PrBundle,
        x: &[f64; NC],
        z: f64,
        a: f64,
        b: f64,
    ) -> PhFlashResult<[f64; NC]> {
        cubic::ln_fugacity_coeffs(x, &bundle.pure, &self.bip.0, &bundle.mix, z, a, b)
    }

    /// Molar enthalpy departure, J/mol.
    pub fn h_departure(&self, t: f64, z: f64, bundle: &PrBundle) -> f64 {
        cubic::enthalpy_departure(t, z, &bundle.mix)
    }

    /// Analytic `dH_dep/dT` at fixed `Z`, J/(mol K).
    pub fn h_departure_dt(&self, z: f64, bundle: &PrBundle) -> f64 {
        cubic::enthalpy_departure_dt(z, &bundle.mix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_and_solve_roundtrip_for_air_like_mixture() {
        let options = FlashOptions::default();
        let sys = PrSystem::new(&options).unwrap();
        let x = [0.0, 0.79, 0.21, 0.0, 0.0];
        let bundle = sys.bundle(300.0, &x);
        let (roots, a, b) = sys.solve_z(&bundle, 101325.0, 300.0).unwrap();
        assert!(roots.z_vapor > b);
        let phi = sys.ln_phi(&bundle, &x, roots.z_vapor, a, b).unwrap();
        assert!(phi.iter().all(|v| v.is_finite()));
    }
}

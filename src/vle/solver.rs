//! Isothermal VLE solver: Rachford-Rice + successive substitution with
//! Anderson acceleration, guarded by TPD stability analysis (spec.md
//! section 4.3).

use crate::components::COMPONENTS;
use crate::constants::{
    MAX_ITER_VLE, NC, OSCILLATION_FAIL_STREAK, OSCILLATION_WARN_STREAK, TOL_FUGACITY, TOL_K_VALUE,
    TOL_TRIVIAL,
};
use crate::diagnostics::{log_warn, Diagnostics};
use crate::eos::PrSystem;
use crate::errors::{PhFlashError, PhFlashResult, RecoveryBudget, RecoveryCategory};
use crate::numeric::{AndersonAccelerator, AndersonStep};
use crate::options::FlashOptions;
use crate::vle::rachford_rice::{phase_compositions, rachford_rice, RachfordRiceOutcome};
use crate::vle::stability::tpd_analysis;
use crate::vle::wilson::wilson_k;

/// Converged (or single-phase) result of an isothermal flash at fixed
/// `(T, P)`.
#[derive(Debug, Clone, Copy)]
pub struct VleOutcome {
    pub beta: f64,
    pub x: [f64; NC],
    pub y: [f64; NC],
    pub k: [f64; NC],
    pub z_liquid: f64,
    pub z_vapor: f64,
    pub ln_phi_liquid: [f64; NC],
    pub ln_phi_vapor: [f64; NC],
    pub iterations: usize,
}

fn wilson_seed(sys: &PrSystem, t: f64, p: f64) -> [f64; NC] {
    let (tc, pc) = sys.effective_criticals(t);
    let mut omega = [0.0; NC];
    for i in 0..NC {
        omega[i] = COMPONENTS[i].omega;
    }
    wilson_k(p, t, &tc, &pc, &omega)
}

fn finalize_single_phase(
    sys: &PrSystem,
    t: f64,
    p: f64,
    z: &[f64; NC],
    outcome: RachfordRiceOutcome,
    k: [f64; NC],
) -> PhFlashResult<VleOutcome> {
    let (x, y, beta) = phase_compositions(z, &k, outcome);
    let vapor_like = beta >= 0.5;
    let bundle = sys.bundle(t, z);
    let (roots, a, b) = sys.solve_z(&bundle, p, t)?;
    let z_root = if vapor_like { roots.z_vapor } else { roots.z_liquid };
    let ln_phi = sys.ln_phi(&bundle, z, z_root, a, b)?;
    Ok(VleOutcome {
        beta,
        x,
        y,
        k,
        z_liquid: z_root,
        z_vapor: z_root,
        ln_phi_liquid: ln_phi,
        ln_phi_vapor: ln_phi,
        iterations: 0,
    })
}

/// One recovery attempt of the successive-substitution loop: returns
/// `Err(PhFlashError::TrivialSolution)` or
/// `Err(PhFlashError::UnstableSinglePhase)` when a TPD-guided re-seed
/// could help, or a numeric/convergence error, letting the caller retry
/// once per category. `initial_damping` and `use_anderson` are taken as
/// explicit parameters (rather than read from `options` directly) so a
/// caller can override them for a recovery retry without needing a
/// mutable `FlashOptions` (spec.md section 4.5, "damping coordination
/// with Anderson").
fn flash_attempt(
    sys: &PrSystem,
    t: f64,
    p: f64,
    z: &[f64; NC],
    mut k: [f64; NC],
    initial_damping: f64,
    use_anderson: bool,
    options: &FlashOptions,
    sink: Option<&dyn Diagnostics>,
    anderson_failure_streak: &mut u32,
) -> PhFlashResult<VleOutcome> {
    let mut anderson: AndersonAccelerator<NC> = AndersonAccelerator::init(options.anderson_depth);
    let mut damping = initial_damping;
    let mut prev_residual_norm: Option<f64> = None;
    let mut oscillation_streak = 0usize;

    for iteration in 0..MAX_ITER_VLE {
        let rr_outcome = rachford_rice(z, &k)?;
        let beta_hint = match rr_outcome {
            RachfordRiceOutcome::TwoPhase(b) => b,
            RachfordRiceOutcome::AllLiquid => 0.0,
            RachfordRiceOutcome::AllVapor => 1.0,
        };
        if !matches!(rr_outcome, RachfordRiceOutcome::TwoPhase(_)) {
            let stability = tpd_analysis(sys, t, p, z);
            if stability.unstable {
                return Err(PhFlashError::UnstableSinglePhase);
            }
            return finalize_single_phase(sys, t, p, z, rr_outcome, k);
        }
        let _ = beta_hint;

        let (x, y, _beta) = phase_compositions(z, &k, rr_outcome);

        let bundle_l = sys.bundle(t, &x);
        let (roots_l, a_l, b_l) = sys.solve_z(&bundle_l, p, t)?;
        let ln_phi_l = sys.ln_phi(&bundle_l, &x, roots_l.z_liquid, a_l, b_l)?;

        let bundle_v = sys.bundle(t, &y);
        let (roots_v, a_v, b_v) = sys.solve_z(&bundle_v, p, t)?;
        let ln_phi_v = sys.ln_phi(&bundle_v, &y, roots_v.z_vapor, a_v, b_v)?;

        let max_k_dev = k.iter().map(|&ki| (ki - 1.0).abs()).fold(0.0, f64::max);
        if max_k_dev < TOL_TRIVIAL {
            return Err(PhFlashError::TrivialSolution);
        }

        let mut ln_k = [0.0; NC];
        let mut ln_k_new = [0.0; NC];
        let mut residual = [0.0; NC];
        let mut fugacity_residual = 0.0_f64;
        for i in 0..NC {
            ln_k[i] = k[i].ln();
            ln_k_new[i] = ln_phi_l[i] - ln_phi_v[i];
            residual[i] = ln_k[i] - ln_k_new[i];
            let f_i = (ln_phi_l[i] + x[i].max(1e-300).ln()) - (ln_phi_v[i] + y[i].max(1e-300).ln());
            fugacity_residual = fugacity_residual.max(f_i.abs());
        }
        let max_k_residual = residual.iter().cloned().fold(0.0_f64, |acc, v| acc.max(v.abs()));

        if max_k_residual < TOL_K_VALUE && fugacity_residual < TOL_FUGACITY {
            return Ok(VleOutcome {
                beta: _beta,
                x,
                y,
                k,
                z_liquid: roots_l.z_liquid,
                z_vapor: roots_v.z_vapor,
                ln_phi_liquid: ln_phi_l,
                ln_phi_vapor: ln_phi_v,
                iterations: iteration,
            });
        }

        let residual_norm = crate::numeric::linalg::norm(&residual);
        if let Some(prev) = prev_residual_norm {
            if residual_norm > prev {
                oscillation_streak += 1;
            } else {
                oscillation_streak = 0;
            }
        }
        prev_residual_norm = Some(residual_norm);

        if oscillation_streak >= OSCILLATION_FAIL_STREAK {
            return Err(PhFlashError::Oscillation);
        }
        if oscillation_streak >= OSCILLATION_WARN_STREAK {
            damping = (damping * 0.5).max(0.1);
            log_warn!(
                sink,
                options.verbose,
                "VLE oscillation detected, reducing damping to {damping:.3}"
            );
        }

        let ln_k_next = if use_anderson {
            match anderson.update(ln_k, residual) {
                AndersonStep::Accelerated(next) => {
                    *anderson_failure_streak = 0;
                    next
                }
                AndersonStep::Fallback => {
                    *anderson_failure_streak += 1;
                    let mut fallback = [0.0; NC];
                    for i in 0..NC {
                        fallback[i] = ln_k[i] - damping * residual[i];
                    }
                    fallback
                }
            }
        } else {
            let mut fallback = [0.0; NC];
            for i in 0..NC {
                fallback[i] = ln_k[i] - damping * residual[i];
            }
            fallback
        };

        for i in 0..NC {
            k[i] = ln_k_next[i].exp();
            if !k[i].is_finite() || k[i] <= 0.0 {
                return Err(PhFlashError::NumericNonFinite("K-value"));
            }
        }
    }

    Err(PhFlashError::NotConverged("successive substitution"))
}

/// Runs the isothermal VLE solver at fixed `(T, P)` for feed `z`, starting
/// from `k_init` (or Wilson K if `None`) and `damping`, with at most one
/// retry per recovery category per spec.md section 7's recovery policy:
/// a physical-category failure (`TrivialSolution`/`UnstableSinglePhase`)
/// retries with a TPD-guided re-seed; a numeric-category failure
/// (`NumericCubic`/`NumericLogGuard`/`NumericIllConditioned`) retries with
/// Anderson disabled and a fresh Wilson seed; a convergence-category
/// failure (`NotConverged`/`Oscillation`) retries with Anderson disabled
/// and damping halved.
#[allow(clippy::too_many_arguments)]
pub fn flash(
    sys: &PrSystem,
    t: f64,
    p: f64,
    z: &[f64; NC],
    k_init: Option<[f64; NC]>,
    damping: f64,
    use_anderson: bool,
    options: &FlashOptions,
    sink: Option<&dyn Diagnostics>,
    anderson_failure_streak: &mut u32,
) -> PhFlashResult<VleOutcome> {
    let mut k = k_init.unwrap_or_else(|| wilson_seed(sys, t, p));
    let mut attempt_damping = damping;
    let mut use_anderson = use_anderson;
    let mut budget = RecoveryBudget::new();

    loop {
        match flash_attempt(sys, t, p, z, k, attempt_damping, use_anderson, options, sink, anderson_failure_streak) {
            Ok(outcome) => return Ok(outcome),
            Err(err @ (PhFlashError::TrivialSolution | PhFlashError::UnstableSinglePhase))
                if budget.try_consume(RecoveryCategory::Physical) =>
            {
                let stability = tpd_analysis(sys, t, p, z);
                match stability.seed_k {
                    Some(seed) => {
                        k = seed;
                        log_warn!(sink, options.verbose, "{err}, TPD re-seed triggered for VLE retry");
                    }
                    None => return Err(PhFlashError::NoPhaseSplit),
                }
            }
            Err(err @ (PhFlashError::NumericCubic { .. }
            | PhFlashError::NumericLogGuard { .. }
            | PhFlashError::NumericIllConditioned(_)))
                if budget.try_consume(RecoveryCategory::Numeric) =>
            {
                use_anderson = false;
                k = wilson_seed(sys, t, p);
                log_warn!(
                    sink,
                    options.verbose,
                    "{err}, retrying VLE with Anderson disabled and a fresh Wilson seed"
                );
            }
            Err(err @ (PhFlashError::NotConverged(_) | PhFlashError::Oscillation))
                if budget.try_consume(RecoveryCategory::Convergence) =>
            {
                use_anderson = false;
                attempt_damping = (attempt_damping * 0.5).max(0.1);
                log_warn!(
                    sink,
                    options.verbose,
                    "{err}, retrying VLE with Anderson disabled and damping {attempt_damping:.3}"
                );
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_phase_vapor_h2_n2_high_pressure() {
        let sys = PrSystem::new(&FlashOptions::default()).unwrap();
        let z = [0.7, 0.3, 0.0, 0.0, 0.0];
        let mut streak = 0;
        let outcome = flash(&sys, 250.0, 2e6, &z, None, 1.0, true, &FlashOptions::default(), None, &mut streak).unwrap();
        assert_relative_eq_beta(outcome.beta, 1.0);
    }

    #[test]
    fn ammonia_water_splits_two_phase() {
        let sys = PrSystem::new(&FlashOptions::default()).unwrap();
        let z = [0.0, 0.0, 0.0, 0.4, 0.6];
        let mut streak = 0;
        let outcome = flash(&sys, 300.0, 5e5, &z, None, 1.0, true, &FlashOptions::default(), None, &mut streak).unwrap();
        assert!(outcome.beta > 0.0 && outcome.beta < 1.0);
        for i in 0..NC {
            let recombined = (1.0 - outcome.beta) * outcome.x[i] + outcome.beta * outcome.y[i];
            assert!((recombined - z[i]).abs() < 1e-6);
        }
    }

    fn assert_relative_eq_beta(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-3, "beta {actual} != {expected}");
    }
}

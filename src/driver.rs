//! Outer pressure-enthalpy temperature loop (spec.md section 4.5).
//!
//! A damped Newton iteration on `T` with optional line search, wrapping an
//! inner isothermal VLE solve at each trial temperature. Structured as an
//! explicit state machine, the way the teacher's `critical_point_hkm`
//! damped-Newton loop (`state/critical_point.rs`) walks
//! `Init -> Estimate -> ... -> Converged | Fail`, generalized here to a 1-D
//! temperature residual with a line search instead of a fixed damping
//! schedule.

use crate::components::{validate_composition, H2};
use crate::constants::{
    H_MAX, H_MIN, LINE_SEARCH_FACTORS, MAX_DELTA_T_NEWTON, MAX_ITER_OUTER, NC, P_MAX, P_MIN,
    TOL_H_DIFFICULT, TOL_H_EXTREME, TOL_H_STANDARD, TOL_TEMP,
};
use crate::diagnostics::{log_iter, log_warn, Diagnostics};
use crate::enthalpy::{denthalpy_dtemperature, mixture_enthalpy, phase_enthalpy};
use crate::eos::PrSystem;
use crate::errors::{PhFlashError, PhFlashResult, RecoveryBudget};
use crate::numeric::damping_after_anderson_failures;
use crate::options::FlashOptions;
use crate::state::FlashState;
use crate::vle::{self, VleOutcome};

/// Classification of how hard the outer loop's enthalpy target is to hit,
/// used to widen the convergence tolerance for feeds near a phase
/// boundary or at the edges of the accepted operating envelope (spec.md
/// section 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingCondition {
    Standard,
    Difficult,
    Extreme,
}

impl OperatingCondition {
    fn tolerance(self) -> f64 {
        match self {
            OperatingCondition::Standard => TOL_H_STANDARD,
            OperatingCondition::Difficult => TOL_H_DIFFICULT,
            OperatingCondition::Extreme => TOL_H_EXTREME,
        }
    }
}

/// Classifies `(t, p, z)` per spec.md section 6's literal thresholds.
fn classify(t: f64, p: f64, z: &[f64; NC]) -> OperatingCondition {
    let extreme = p > 20_000_000.0 || t < 100.0 || (t < 150.0 && z[H2] > 0.5);
    if extreme {
        return OperatingCondition::Extreme;
    }

    let standard = (100_000.0..=1_000_000.0).contains(&p) && (250.0..=400.0).contains(&t);
    if standard {
        return OperatingCondition::Standard;
    }

    OperatingCondition::Difficult
}

/// Initial temperature estimate: inverts the feed's ideal-gas enthalpy
/// curve around the reference temperature with a single Newton step,
/// then clamps into the solver's accepted range.
fn initial_temperature_estimate(z: &[f64; NC], h_target: f64) -> f64 {
    use crate::constants::{T_MAX, T_MIN, T_REF};
    use crate::ideal_gas::{dh_ig_dt, h_ig};

    let h_ref: f64 = (0..NC).map(|i| z[i] * h_ig(i, T_REF)).sum();
    let cp_ref: f64 = (0..NC).map(|i| z[i] * dh_ig_dt(i, T_REF)).sum();
    let t0 = if cp_ref.abs() > 1e-6 {
        T_REF + (h_target - h_ref) / cp_ref
    } else {
        T_REF
    };
    t0.clamp(T_MIN, T_MAX)
}

struct TrialOutcome {
    t: f64,
    k: [f64; NC],
    outcome: VleOutcome,
    h: f64,
    h_liquid: f64,
    h_vapor: f64,
    dhdt: f64,
}

#[allow(clippy::too_many_arguments)]
fn evaluate(
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
) -> PhFlashResult<TrialOutcome> {
    let outcome = vle::flash(sys, t, p, z, k_init, damping, use_anderson, options, sink, anderson_failure_streak)?;

    let bundle_l = sys.bundle(t, &outcome.x);
    let h_liquid = phase_enthalpy(sys, t, &outcome.x, outcome.z_liquid, &bundle_l).total();
    let bundle_v = sys.bundle(t, &outcome.y);
    let h_vapor = phase_enthalpy(sys, t, &outcome.y, outcome.z_vapor, &bundle_v).total();
    let h = mixture_enthalpy(outcome.beta, h_liquid, h_vapor);

    let dhdt = denthalpy_dtemperature(
        sys,
        t,
        p,
        outcome.beta,
        &outcome.x,
        &outcome.y,
        options,
        sink,
    )?;

    Ok(TrialOutcome {
        t,
        k: outcome.k,
        outcome,
        h,
        h_liquid,
        h_vapor,
        dhdt,
    })
}

/// Solves the P-H flash for feed `z`, pressure `p`, target molar enthalpy
/// `h_target`, per spec.md sections 4.5 and 8.
///
/// Validates inputs once, then runs [`run_outer_loop`], retrying at most
/// once per recovery category (spec.md section 7) if it returns a
/// numeric or convergence error: the retry disables Anderson and halves
/// the damping cap passed to every inner VLE call, the same "safer
/// fallback" the inner solver uses for its own numeric/convergence
/// recoveries.
pub fn solve(
    sys: &PrSystem,
    z: [f64; NC],
    p: f64,
    h_target: f64,
    options: &FlashOptions,
    sink: Option<&dyn Diagnostics>,
) -> PhFlashResult<FlashState> {
    validate_composition(&z)?;
    if !(P_MIN..=P_MAX).contains(&p) || !p.is_finite() {
        return Err(PhFlashError::InvalidPressure(p));
    }
    if !(H_MIN..=H_MAX).contains(&h_target) || !h_target.is_finite() {
        return Err(PhFlashError::InvalidEnthalpy(h_target));
    }
    options.validate()?;

    let mut damping_cap = options.damping;
    let mut use_anderson = options.use_anderson;
    let mut budget = RecoveryBudget::new();

    loop {
        match run_outer_loop(sys, &z, p, h_target, damping_cap, use_anderson, options, sink) {
            Ok(state) => return Ok(state),
            Err(err) => {
                use crate::errors::RecoveryCategory;
                let can_retry = matches!(
                    err.recovery_category(),
                    Some(RecoveryCategory::Numeric) | Some(RecoveryCategory::Convergence)
                ) && budget.try_consume(err.recovery_category().unwrap());
                if !can_retry {
                    return Err(err);
                }
                use_anderson = false;
                damping_cap = (damping_cap * 0.5).max(0.2);
                log_warn!(
                    sink,
                    options.verbose,
                    "{err}, retrying outer loop with Anderson disabled and damping capped at {damping_cap:.3}"
                );
            }
        }
    }
}

/// One full run of the outer Newton loop, from the initial temperature
/// estimate to convergence or a terminal error. `damping_cap` bounds the
/// per-iteration damping passed into the inner VLE solve; it caps (rather
/// than replaces) the anderson-failure-streak-derived damping of spec.md
/// section 4.5's "damping coordination with Anderson".
#[allow(clippy::too_many_arguments)]
fn run_outer_loop(
    sys: &PrSystem,
    z: &[f64; NC],
    p: f64,
    h_target: f64,
    damping_cap: f64,
    use_anderson: bool,
    options: &FlashOptions,
    sink: Option<&dyn Diagnostics>,
) -> PhFlashResult<FlashState> {
    let mut t = initial_temperature_estimate(z, h_target);
    let mut k_init: Option<[f64; NC]> = None;
    let mut anderson_failure_streak = 0u32;

    for iteration in 0..MAX_ITER_OUTER {
        let condition = classify(t, p, z);
        let tol_h = options.custom_enthalpy_tol.unwrap_or_else(|| condition.tolerance());
        let damping = damping_cap.min(damping_after_anderson_failures(anderson_failure_streak));

        let trial = evaluate(sys, t, p, z, k_init, damping, use_anderson, options, sink, &mut anderson_failure_streak)?;
        let residual = trial.h - h_target;

        log_iter!(
            sink,
            options.verbose,
            "outer iter {iteration}: T={:.3} H={:.3} residual={:.3}",
            trial.t,
            trial.h,
            residual
        );

        if residual.abs() < tol_h {
            return Ok(FlashState {
                t: trial.t,
                p,
                beta: trial.outcome.beta,
                z: *z,
                x: trial.outcome.x,
                y: trial.outcome.y,
                k: trial.outcome.k,
                h_target,
                h: trial.h,
                h_liquid: trial.h_liquid,
                h_vapor: trial.h_vapor,
                z_liquid: trial.outcome.z_liquid,
                z_vapor: trial.outcome.z_vapor,
                ln_phi_liquid: trial.outcome.ln_phi_liquid,
                ln_phi_vapor: trial.outcome.ln_phi_vapor,
                dh_dt: trial.dhdt,
                outer_iterations: iteration,
            });
        }

        let mut delta_t = -residual / trial.dhdt;
        delta_t = delta_t.clamp(-MAX_DELTA_T_NEWTON, MAX_DELTA_T_NEWTON);

        let (t_next, best) = if options.use_line_search {
            line_search(
                sys,
                z,
                p,
                t,
                delta_t,
                trial.h,
                h_target,
                k_init,
                damping,
                use_anderson,
                options,
                sink,
                &mut anderson_failure_streak,
            )?
        } else {
            let t_candidate = (t + delta_t).clamp(crate::constants::T_MIN, crate::constants::T_MAX);
            (t_candidate, None)
        };

        if (t_next - t).abs() < TOL_TEMP {
            if residual.abs() >= tol_h {
                return Err(PhFlashError::Stagnation);
            }
        }

        t = t_next;
        k_init = Some(best.map(|b| b.k).unwrap_or(trial.k));
    }

    Err(PhFlashError::NotConverged("outer temperature loop"))
}

/// Backtracking line search over [`LINE_SEARCH_FACTORS`]: shrinks the
/// Newton step until the trial enthalpy residual improves on the current
/// one, or the smallest factor is reached.
#[allow(clippy::too_many_arguments)]
fn line_search(
    sys: &PrSystem,
    z: &[f64; NC],
    p: f64,
    t: f64,
    delta_t: f64,
    h_current: f64,
    h_target: f64,
    k_init: Option<[f64; NC]>,
    damping: f64,
    use_anderson: bool,
    options: &FlashOptions,
    sink: Option<&dyn Diagnostics>,
    anderson_failure_streak: &mut u32,
) -> PhFlashResult<(f64, Option<TrialOutcome>)> {
    let residual_current = (h_current - h_target).abs();
    for &factor in LINE_SEARCH_FACTORS.iter() {
        let t_trial = (t + factor * delta_t).clamp(crate::constants::T_MIN, crate::constants::T_MAX);
        match evaluate(sys, t_trial, p, z, k_init, damping, use_anderson, options, sink, anderson_failure_streak) {
            Ok(trial) => {
                if (trial.h - h_target).abs() <= residual_current || factor == *LINE_SEARCH_FACTORS.last().unwrap() {
                    return Ok((t_trial, Some(trial)));
                }
            }
            Err(_) if factor != *LINE_SEARCH_FACTORS.last().unwrap() => {
                log_warn!(sink, options.verbose, "line search factor {factor} failed, shrinking further");
                continue;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(((t + delta_t).clamp(crate::constants::T_MIN, crate::constants::T_MAX), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_standard_mid_range() {
        let z = [0.2, 0.2, 0.2, 0.2, 0.2];
        assert_eq!(classify(320.0, 5.0e5, &z), OperatingCondition::Standard);
    }

    #[test]
    fn classify_extreme_above_pressure_ceiling() {
        let z = [0.2, 0.2, 0.2, 0.2, 0.2];
        assert_eq!(classify(320.0, 25.0e6, &z), OperatingCondition::Extreme);
    }

    #[test]
    fn classify_extreme_cold_hydrogen_rich_feed() {
        let z = [0.6, 0.1, 0.1, 0.1, 0.1];
        assert_eq!(classify(140.0, 5.0e5, &z), OperatingCondition::Extreme);
    }

    #[test]
    fn classify_difficult_outside_standard_band_but_not_extreme() {
        let z = [0.2, 0.2, 0.2, 0.2, 0.2];
        assert_eq!(classify(450.0, 5.0e5, &z), OperatingCondition::Difficult);
    }

    #[test]
    fn solves_a_single_phase_nitrogen_oxygen_feed() {
        let options = FlashOptions::default();
        let sys = PrSystem::new(&options).unwrap();
        let z = [0.0, 0.79, 0.21, 0.0, 0.0];
        let h_target: f64 = (0..NC).map(|i| z[i] * crate::ideal_gas::h_ig(i, 320.0)).sum();
        let state = solve(&sys, z, 101325.0, h_target, &options, None).unwrap();
        assert!((state.t - 320.0).abs() < 5.0);
    }
}

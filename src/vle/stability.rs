//! Tangent-plane-distance (TPD) stability analysis (spec.md section 4.3).

use crate::constants::{MAX_ITER_TPD, MAX_TPD_TRIALS, NC, TOL_TPD, TPD_INSTABILITY_THRESHOLD};
use crate::eos::PrSystem;
use crate::vle::wilson::wilson_k;

/// Whether a trial phase is tested as vapor-like or liquid-like, which
/// selects which cubic root is used to evaluate its fugacity
/// coefficients, and which feed-phase assumption it is tested against.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TrialKind {
    /// Trial approximates a vapor phase splitting off an assumed-liquid feed.
    VaporFromLiquidFeed,
    /// Trial approximates a liquid phase splitting off an assumed-vapor feed.
    LiquidFromVaporFeed,
}

/// Outcome of the stability analysis: whether the single-phase assumption
/// is unstable, and (if so) the minimizing trial composition to seed
/// re-initialization.
#[derive(Debug, Clone, Copy)]
pub struct StabilityResult {
    pub unstable: bool,
    pub seed_k: Option<[f64; NC]>,
    pub min_tpd: f64,
}

fn normalize(w: &[f64; NC]) -> [f64; NC] {
    let sum: f64 = w.iter().sum();
    let mut out = [0.0; NC];
    if sum > 0.0 {
        for i in 0..NC {
            out[i] = w[i] / sum;
        }
    }
    out
}

fn seed_compositions(z: &[f64; NC], k_wilson: &[f64; NC]) -> [([f64; NC], TrialKind); MAX_TPD_TRIALS] {
    let floor = 1e-6;
    let mut pure = [[floor; NC]; NC];
    for i in 0..NC {
        pure[i][i] = 1.0 - floor * (NC - 1) as f64;
    }

    let mut vapor_wilson = [0.0; NC];
    let mut liquid_wilson = [0.0; NC];
    for i in 0..NC {
        vapor_wilson[i] = z[i] * k_wilson[i];
        liquid_wilson[i] = z[i] / k_wilson[i];
    }

    [
        (pure[0], TrialKind::VaporFromLiquidFeed),
        (pure[1], TrialKind::VaporFromLiquidFeed),
        (pure[2], TrialKind::VaporFromLiquidFeed),
        (pure[3], TrialKind::LiquidFromVaporFeed),
        (pure[4], TrialKind::LiquidFromVaporFeed),
        (normalize(&vapor_wilson), TrialKind::VaporFromLiquidFeed),
        (normalize(&liquid_wilson), TrialKind::LiquidFromVaporFeed),
    ]
}

/// Fugacity coefficients for composition `x`, using the vapor-like or
/// liquid-like root as selected by `vapor_like`.
fn ln_phi_for(sys: &PrSystem, t: f64, p: f64, x: &[f64; NC], vapor_like: bool) -> Option<[f64; NC]> {
    let bundle = sys.bundle(t, x);
    let (roots, a, b) = sys.solve_z(&bundle, p, t).ok()?;
    let z = if vapor_like { roots.z_vapor } else { roots.z_liquid };
    sys.ln_phi(&bundle, x, z, a, b).ok()
}

/// Runs the TPD stability analysis at `(T, P, z)` per spec.md section 4.3:
/// seven trial seeds, successive substitution on each to a stationary
/// point, and a declaration of instability if any seed converges to a
/// non-trivial composition with `TPD* < -1e-8`.
pub fn tpd_analysis(sys: &PrSystem, t: f64, p: f64, z: &[f64; NC]) -> StabilityResult {
    let (tc, pc) = sys.effective_criticals(t);
    let mut omega = [0.0; NC];
    for i in 0..NC {
        omega[i] = crate::components::COMPONENTS[i].omega;
    }
    let k_wilson = wilson_k(p, t, &tc, &pc, &omega);

    let (ln_phi_z_liquid, ln_phi_z_vapor) = match (
        ln_phi_for(sys, t, p, z, false),
        ln_phi_for(sys, t, p, z, true),
    ) {
        (Some(l), Some(v)) => (l, v),
        _ => {
            return StabilityResult {
                unstable: false,
                seed_k: None,
                min_tpd: f64::INFINITY,
            }
        }
    };

    let mut best_tpd = f64::INFINITY;
    let mut best_seed: Option<([f64; NC], TrialKind)> = None;

    for (seed0, kind) in seed_compositions(z, &k_wilson) {
        let (ln_phi_z, vapor_like_trial) = match kind {
            TrialKind::VaporFromLiquidFeed => (&ln_phi_z_liquid, true),
            TrialKind::LiquidFromVaporFeed => (&ln_phi_z_vapor, false),
        };

        let mut w = seed0;
        let mut converged_w = w;
        for _ in 0..MAX_ITER_TPD {
            let ln_phi_w = match ln_phi_for(sys, t, p, &normalize(&w), vapor_like_trial) {
                Some(v) => v,
                None => break,
            };
            let mut w_new = [0.0; NC];
            for i in 0..NC {
                w_new[i] = z[i] * (ln_phi_z[i] - ln_phi_w[i]).exp();
            }
            let diff: f64 = (0..NC)
                .map(|i| (normalize(&w_new)[i] - normalize(&w)[i]).abs())
                .sum();
            w = w_new;
            converged_w = w;
            if diff < TOL_TPD {
                break;
            }
        }

        let w_norm = normalize(&converged_w);
        let sum_w: f64 = converged_w.iter().sum();
        if sum_w <= 0.0 || !sum_w.is_finite() {
            continue;
        }
        let ln_phi_w = match ln_phi_for(sys, t, p, &w_norm, vapor_like_trial) {
            Some(v) => v,
            None => continue,
        };

        let mut tpd = 0.0;
        for i in 0..NC {
            if w_norm[i] <= 0.0 {
                continue;
            }
            tpd += w_norm[i] * (w_norm[i].ln() + ln_phi_w[i] - z[i].max(1e-300).ln() - ln_phi_z[i]);
        }

        if tpd < best_tpd {
            best_tpd = tpd;
            best_seed = Some((w_norm, kind));
        }
    }

    if best_tpd < TPD_INSTABILITY_THRESHOLD {
        if let Some((w, kind)) = best_seed {
            let mut k_new = [0.0; NC];
            for i in 0..NC {
                k_new[i] = match kind {
                    TrialKind::VaporFromLiquidFeed => w[i] / z[i].max(1e-300),
                    TrialKind::LiquidFromVaporFeed => z[i] / w[i].max(1e-300),
                };
            }
            return StabilityResult {
                unstable: true,
                seed_k: Some(k_new),
                min_tpd: best_tpd,
            };
        }
    }

    StabilityResult {
        unstable: false,
        seed_k: None,
        min_tpd: best_tpd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FlashOptions;

    #[test]
    fn ammonia_water_is_unstable_at_moderate_conditions() {
        let sys = PrSystem::new(&FlashOptions::default()).unwrap();
        let z = [0.0, 0.0, 0.0, 0.4, 0.6];
        let result = tpd_analysis(&sys, 320.0, 5e5, &z);
        assert!(result.unstable);
        assert!(result.seed_k.is_some());
    }

    #[test]
    fn pure_light_vapor_is_stable() {
        let sys = PrSystem::new(&FlashOptions::default()).unwrap();
        let z = [0.7, 0.3, 0.0, 0.0, 0.0];
        let result = tpd_analysis(&sys, 300.0, 2e6, &z);
        assert!(!result.unstable);
    }
}

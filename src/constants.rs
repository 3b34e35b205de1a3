//! Physical and numerical constants shared across the solver.

/// Number of components in the fixed fluid system (H2, N2, O2, NH3, H2O).
pub const NC: usize = 5;

/// Universal gas constant, J/(mol K).
pub const R: f64 = 8.31446261815324;

/// Reference temperature used for the ideal-gas inversion seed, K.
pub const T_REF: f64 = 298.15;

/// Clamp bounds for the outer temperature loop, K.
pub const T_MIN: f64 = 50.0;
pub const T_MAX: f64 = 1500.0;

/// Accepted pressure range, Pa.
pub const P_MIN: f64 = 100.0;
pub const P_MAX: f64 = 1.0e8;

/// Accepted target molar enthalpy range, J/mol.
pub const H_MIN: f64 = -1.0e7;
pub const H_MAX: f64 = 1.0e7;

/// Normalization tolerance for composition vectors.
pub const TOL_COMPOSITION: f64 = 1e-8;

/// Rachford-Rice root tolerance and iteration cap.
pub const TOL_RR: f64 = 1e-10;
pub const MAX_ITER_RR: usize = 30;

/// Successive-substitution convergence tolerances and iteration cap.
pub const TOL_K_VALUE: f64 = 1e-6;
pub const TOL_FUGACITY: f64 = 1e-7;
pub const MAX_ITER_VLE: usize = 100;

/// Trivial-solution detection threshold on |K_i - 1|.
pub const TOL_TRIVIAL: f64 = 1e-3;

/// TPD stability analysis.
pub const MAX_TPD_TRIALS: usize = 7;
pub const MAX_ITER_TPD: usize = 20;
pub const TOL_TPD: f64 = 1e-8;
pub const TPD_INSTABILITY_THRESHOLD: f64 = -1e-8;

/// Outer Newton loop on temperature.
pub const MAX_ITER_OUTER: usize = 50;
pub const TOL_TEMP: f64 = 1e-2;
pub const MAX_DELTA_T_NEWTON: f64 = 50.0;
pub const LINE_SEARCH_FACTORS: [f64; 5] = [1.0, 0.5, 0.25, 0.125, 0.0625];

/// Adaptive enthalpy tolerances, J/mol, by operating-condition class.
pub const TOL_H_STANDARD: f64 = 5.0;
pub const TOL_H_DIFFICULT: f64 = 50.0;
pub const TOL_H_EXTREME: f64 = 150.0;

/// Default upper sanity bound for dH/dT, J/(mol K).
pub const DEFAULT_MAX_DHDT: f64 = 1e6;
pub const MIN_DHDT: f64 = 1.0;

/// Cubic-solver guards.
pub const EPS_LOG_GUARD: f64 = 1e-12;
pub const EPS_DISCRIMINANT: f64 = 1e-14;

/// Anderson accelerator depth bounds.
pub const ANDERSON_MIN_DEPTH: usize = 2;
pub const ANDERSON_MAX_DEPTH: usize = 10;
pub const ANDERSON_DEFAULT_DEPTH: usize = 4;
pub const ANDERSON_COND_LIMIT: f64 = 1e12;

/// Oscillation handling in successive substitution.
pub const OSCILLATION_WARN_STREAK: usize = 3;
pub const OSCILLATION_FAIL_STREAK: usize = 10;

use thiserror::Error;

/// Error type for the P-H flash core.
///
/// Variants are grouped into the numeric-code categories used by host
/// logging (input, numeric, convergence, physical, algorithm, system,
/// generic); [`PhFlashError::code`] returns the stable ABI value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhFlashError {
    // -- input (-101..) --
    #[error("composition does not sum to one: sum={0}")]
    InvalidComposition(f64),
    #[error("pressure {0} Pa outside accepted range")]
    InvalidPressure(f64),
    #[error("target enthalpy {0} J/mol outside accepted range")]
    InvalidEnthalpy(f64),
    #[error("binary interaction parameter out of range: k[{0}][{1}] = {2}")]
    InvalidBip(usize, usize, f64),
    #[error("damping factor {0} outside [0.1, 1.0]")]
    InvalidDamping(f64),

    // -- numeric (-201..) --
    #[error("cubic equation of state has no physical root (A={a}, B={b})")]
    NumericCubic { a: f64, b: f64 },
    #[error("log guard tripped: Z={z} <= B={b} + eps")]
    NumericLogGuard { z: f64, b: f64 },
    #[error("Anderson normal equations are ill-conditioned (cond={0:.3e})")]
    NumericIllConditioned(f64),
    #[error("non-finite value encountered in `{0}`")]
    NumericNonFinite(&'static str),

    // -- convergence (-301..) --
    #[error("`{0}` did not converge within the maximum number of iterations")]
    NotConverged(&'static str),
    #[error("successive substitution is oscillating and did not settle")]
    Oscillation,
    #[error("outer Newton loop stagnated (|delta T| below tolerance without convergence)")]
    Stagnation,

    // -- physical (-401..) --
    #[error("iteration resulted in the trivial solution (K ~= 1)")]
    TrivialSolution,
    #[error("negative composition encountered: component {0} = {1}")]
    NegativeComposition(usize, f64),
    #[error("single-phase region reported unstable by TPD analysis")]
    UnstableSinglePhase,
    #[error("no phase split found for the given feed and conditions")]
    NoPhaseSplit,
    #[error("dH/dT = {0} outside the physically reasonable range [{1}, {2}]")]
    UnreasonableDerivative(f64, f64, f64),

    // -- algorithm (-601..) --
    #[error("Rachford-Rice bracket is empty or invalid (beta_min={0}, beta_max={1})")]
    InvalidRachfordRiceBracket(f64, f64),
    #[error("Anderson accelerator was not initialized before use")]
    AndersonNotInitialized,

    // -- system (-701..) --
    #[error("recovery budget exhausted for `{0}`")]
    RecoveryExhausted(&'static str),

    // -- generic (-901..) --
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl PhFlashError {
    /// Stable numeric error code, matching spec.md's category ranges.
    pub fn code(&self) -> i32 {
        use PhFlashError::*;
        match self {
            InvalidComposition(_) => -101,
            InvalidPressure(_) => -102,
            InvalidEnthalpy(_) => -103,
            InvalidBip(..) => -104,
            InvalidDamping(_) => -105,

            NumericCubic { .. } => -201,
            NumericLogGuard { .. } => -202,
            NumericIllConditioned(_) => -203,
            NumericNonFinite(_) => -204,

            NotConverged(_) => -301,
            Oscillation => -302,
            Stagnation => -303,

            TrivialSolution => -401,
            NegativeComposition(..) => -402,
            UnstableSinglePhase => -403,
            NoPhaseSplit => -404,
            UnreasonableDerivative(..) => -405,

            InvalidRachfordRiceBracket(..) => -601,
            AndersonNotInitialized => -602,

            RecoveryExhausted(_) => -701,

            Internal(_) => -901,
        }
    }

    /// True for errors that a caller may attempt to recover from exactly
    /// once, per the recovery policy of spec.md section 7.
    pub fn is_recoverable(&self) -> bool {
        self.recovery_category().is_some()
    }

    /// The recovery category this error falls under, per spec.md section
    /// 7, or `None` if the error is fatal and should never be retried.
    pub fn recovery_category(&self) -> Option<RecoveryCategory> {
        use PhFlashError::*;
        match self {
            NumericCubic { .. } | NumericLogGuard { .. } | NumericIllConditioned(_) => {
                Some(RecoveryCategory::Numeric)
            }
            NotConverged(_) | Oscillation | Stagnation => Some(RecoveryCategory::Convergence),
            TrivialSolution | NegativeComposition(..) | UnstableSinglePhase => {
                Some(RecoveryCategory::Physical)
            }
            _ => None,
        }
    }
}

/// Convenience type for `Result<T, PhFlashError>`.
pub type PhFlashResult<T> = Result<T, PhFlashError>;

/// The three recovery categories of spec.md section 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    Numeric,
    Convergence,
    Physical,
}

/// Tracks, per call, whether each recovery category's single retry has
/// already been spent (spec.md section 7: "recovery is attempted at most
/// once per phase per call"). One instance is scoped to one `vle::flash`
/// call and a separate instance to one `driver::solve` call, since those
/// are distinct phases.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryBudget {
    numeric_used: bool,
    convergence_used: bool,
    physical_used: bool,
}

impl RecoveryBudget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` (and marks the category spent) the first time it is
    /// called for a given category; `false` on every call after that.
    pub fn try_consume(&mut self, category: RecoveryCategory) -> bool {
        let used = match category {
            RecoveryCategory::Numeric => &mut self.numeric_used,
            RecoveryCategory::Convergence => &mut self.convergence_used,
            RecoveryCategory::Physical => &mut self.physical_used,
        };
        if *used {
            false
        } else {
            *used = true;
            true
        }
    }
}

//! Solver configuration.
//!
//! Mirrors the teacher's `SolverOptions` (`state/critical_point.rs`,
//! `phase_equilibria`) in spirit: a small `Copy`-ish struct with sane
//! defaults, unwrapped against per-call overrides, plus an optional
//! diagnostic sink for verbose runs.

use crate::constants::{ANDERSON_DEFAULT_DEPTH, DEFAULT_MAX_DHDT};
use crate::errors::{PhFlashError, PhFlashResult};
use serde::{Deserialize, Serialize};

/// Source of the binary interaction parameter matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BipSource {
    Recommended,
    UniSim,
    Custom(Box<[[f64; crate::constants::NC]; crate::constants::NC]>),
}

impl Default for BipSource {
    fn default() -> Self {
        BipSource::Recommended
    }
}

/// Recognized solver options (spec.md section 6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashOptions {
    pub use_quantum_h2: bool,
    pub bip_source: BipSource,
    pub use_anderson: bool,
    pub anderson_depth: usize,
    pub use_line_search: bool,
    pub damping: f64,
    pub use_adaptive_tolerance: bool,
    pub custom_enthalpy_tol: Option<f64>,
    pub use_adaptive_derivative: bool,
    pub derivative_perturbation: Option<f64>,
    pub max_reasonable_dhdt: f64,
    pub verbose: bool,
}

impl Default for FlashOptions {
    fn default() -> Self {
        Self {
            use_quantum_h2: true,
            bip_source: BipSource::Recommended,
            use_anderson: true,
            anderson_depth: ANDERSON_DEFAULT_DEPTH,
            use_line_search: true,
            damping: 1.0,
            use_adaptive_tolerance: true,
            custom_enthalpy_tol: None,
            use_adaptive_derivative: true,
            derivative_perturbation: None,
            max_reasonable_dhdt: DEFAULT_MAX_DHDT,
            verbose: false,
        }
    }
}

impl FlashOptions {
    /// Populate defaults, equivalent to the source's `flash_init_options`.
    pub fn builder() -> FlashOptionsBuilder {
        FlashOptionsBuilder(Self::default())
    }

    pub(crate) fn validate(&self) -> PhFlashResult<()> {
        if !(0.1..=1.0).contains(&self.damping) {
            return Err(PhFlashError::InvalidDamping(self.damping));
        }
        if !(crate::constants::ANDERSON_MIN_DEPTH..=crate::constants::ANDERSON_MAX_DEPTH)
            .contains(&self.anderson_depth)
        {
            return Err(PhFlashError::InvalidDamping(self.anderson_depth as f64));
        }
        Ok(())
    }
}

/// Fluent builder over [`FlashOptions`], following the teacher's pattern of
/// exposing `SolverOptions` as a plain struct with an `unwrap_or` style
/// accessor rather than a trait object.
pub struct FlashOptionsBuilder(FlashOptions);

impl FlashOptionsBuilder {
    pub fn use_quantum_h2(mut self, v: bool) -> Self {
        self.0.use_quantum_h2 = v;
        self
    }
    pub fn bip_source(mut self, v: BipSource) -> Self {
        self.0.bip_source = v;
        self
    }
    pub fn use_anderson(mut self, v: bool) -> Self {
        self.0.use_anderson = v;
        self
    }
    pub fn anderson_depth(mut self, v: usize) -> Self {
        self.0.anderson_depth = v;
        self
    }
    pub fn use_line_search(mut self, v: bool) -> Self {
        self.0.use_line_search = v;
        self
    }
    pub fn damping(mut self, v: f64) -> Self {
        self.0.damping = v;
        self
    }
    pub fn use_adaptive_tolerance(mut self, v: bool) -> Self {
        self.0.use_adaptive_tolerance = v;
        self
    }
    pub fn custom_enthalpy_tol(mut self, v: f64) -> Self {
        self.0.custom_enthalpy_tol = Some(v);
        self
    }
    pub fn use_adaptive_derivative(mut self, v: bool) -> Self {
        self.0.use_adaptive_derivative = v;
        self
    }
    pub fn derivative_perturbation(mut self, v: f64) -> Self {
        self.0.derivative_perturbation = Some(v);
        self
    }
    pub fn max_reasonable_dhdt(mut self, v: f64) -> Self {
        self.0.max_reasonable_dhdt = v;
        self
    }
    pub fn verbose(mut self, v: bool) -> Self {
        self.0.verbose = v;
        self
    }
    pub fn build(self) -> PhFlashResult<FlashOptions> {
        self.0.validate()?;
        Ok(self.0)
    }
}

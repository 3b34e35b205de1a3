//! Isothermal vapor-liquid equilibrium: Wilson initialization,
//! Rachford-Rice, TPD stability analysis, and the successive-substitution
//! solver that ties them together (spec.md section 4.3).

pub mod rachford_rice;
pub mod solver;
pub mod stability;
pub mod wilson;

pub use rachford_rice::RachfordRiceOutcome;
pub use solver::{flash, VleOutcome};
pub use stability::StabilityResult;

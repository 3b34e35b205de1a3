//! The fixed five-component fluid system and its critical-property table.
//!
//! Collapsed from the teacher's `Identifier` / `PureRecord` pattern
//! (`parameter/identifier.rs`, `parameter/model_record.rs`): the component
//! set here is fixed and built once as a `const`-friendly table rather than
//! loaded from JSON at runtime, since a reimplementation is explicitly
//! scoped to these five substances (spec.md Non-goals).

use crate::constants::NC;

/// Component indices, in the fixed order used throughout the crate.
pub const H2: usize = 0;
pub const N2: usize = 1;
pub const O2: usize = 2;
pub const NH3: usize = 3;
pub const H2O: usize = 4;

/// Immutable per-component critical-property record.
#[derive(Debug, Clone, Copy)]
pub struct ComponentRecord {
    pub name: &'static str,
    pub cas: &'static str,
    /// Critical temperature, K.
    pub tc: f64,
    /// Critical pressure, Pa.
    pub pc: f64,
    /// Acentric factor.
    pub omega: f64,
    /// Molar weight, g/mol.
    pub molar_weight: f64,
}

/// Critical-property table, indexed as [`H2`], [`N2`], [`O2`], [`NH3`], [`H2O`].
pub static COMPONENTS: [ComponentRecord; NC] = [
    ComponentRecord {
        name: "hydrogen",
        cas: "1333-74-0",
        tc: 33.19,
        pc: 1.3130e6,
        omega: -0.215,
        molar_weight: 2.016,
    },
    ComponentRecord {
        name: "nitrogen",
        cas: "7727-37-9",
        tc: 126.21,
        pc: 3.3958e6,
        omega: 0.037,
        molar_weight: 28.013,
    },
    ComponentRecord {
        name: "oxygen",
        cas: "7782-44-7",
        tc: 154.58,
        pc: 5.0430e6,
        omega: 0.022,
        molar_weight: 31.999,
    },
    ComponentRecord {
        name: "ammonia",
        cas: "7664-41-7",
        tc: 405.40,
        pc: 11.333e6,
        omega: 0.253,
        molar_weight: 17.031,
    },
    ComponentRecord {
        name: "water",
        cas: "7732-18-5",
        tc: 647.10,
        pc: 22.064e6,
        omega: 0.344,
        molar_weight: 18.015,
    },
];

/// Checks that a composition vector is nonnegative and normalized to 1
/// within [`crate::constants::TOL_COMPOSITION`].
pub fn validate_composition(z: &[f64; NC]) -> crate::errors::PhFlashResult<()> {
    use crate::errors::PhFlashError;
    let mut sum = 0.0;
    for (i, &zi) in z.iter().enumerate() {
        if !zi.is_finite() {
            return Err(PhFlashError::NumericNonFinite("composition"));
        }
        if zi < 0.0 {
            return Err(PhFlashError::NegativeComposition(i, zi));
        }
        sum += zi;
    }
    if (sum - 1.0).abs() > crate::constants::TOL_COMPOSITION {
        return Err(PhFlashError::InvalidComposition(sum));
    }
    Ok(())
}

/// Renormalizes a composition vector to sum exactly to 1.
pub fn normalize(z: &mut [f64; NC]) {
    let sum: f64 = z.iter().sum();
    if sum > 0.0 {
        for zi in z.iter_mut() {
            *zi /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_sums_to_five_entries() {
        assert_eq!(COMPONENTS.len(), NC);
        assert_eq!(COMPONENTS[H2O].name, "water");
    }

    #[test]
    fn validate_rejects_bad_sum() {
        let z = [0.5, 0.5, 0.5, 0.0, 0.0];
        assert!(validate_composition(&z).is_err());
    }

    #[test]
    fn validate_accepts_normalized() {
        let z = [0.2, 0.2, 0.2, 0.2, 0.2];
        assert!(validate_composition(&z).is_ok());
    }

    #[test]
    fn validate_rejects_negative() {
        let z = [1.2, -0.2, 0.0, 0.0, 0.0];
        assert!(validate_composition(&z).is_err());
    }
}

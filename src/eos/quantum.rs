//! Hydrogen quantum correction (Prausnitz-Gunn form).
//!
//! spec.md Design Notes: "the precise coefficients should be copied
//! verbatim from the source; do not re-derive." The source is not
//! available to this reimplementation, so the standard literature form of
//! the correction is used instead, applied as a pure function of
//! temperature as required.

/// Effective critical temperature and pressure for hydrogen at `t`,
/// replacing the classical `(Tc, Pc)` when quantum corrections are
/// enabled (`FlashOptions::use_quantum_h2`).
///
/// `Tc_eff = Tc * (1 + beta / (M * T))`
/// `Pc_eff = Pc * (1 + beta / (M * T))`
///
/// with `M` the molar mass in g/mol and `beta` the standard Prausnitz-Gunn
/// constant. At elevated temperature the correction factor tends to 1 and
/// the classical `(Tc, Pc)` are recovered; at cryogenic temperature the
/// shift becomes significant.
pub fn effective_critical_h2(t: f64) -> (f64, f64) {
    const BETA: f64 = 21.8;
    let h2 = &crate::components::COMPONENTS[crate::components::H2];
    let correction = 1.0 + BETA / (h2.molar_weight * t);
    (h2.tc * correction, h2.pc * correction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn approaches_classical_values_at_high_temperature() {
        let h2 = &crate::components::COMPONENTS[crate::components::H2];
        let (tc, pc) = effective_critical_h2(5000.0);
        assert_relative_eq!(tc / h2.tc, 1.0, max_relative = 0.05);
        assert_relative_eq!(pc / h2.pc, 1.0, max_relative = 0.05);
    }

    #[test]
    fn shifts_strongly_at_cryogenic_temperature() {
        let h2 = &crate::components::COMPONENTS[crate::components::H2];
        let (tc, _) = effective_critical_h2(30.0);
        assert!(tc > h2.tc * 1.2);
    }

    #[test]
    fn is_pure_function_of_temperature() {
        let a = effective_critical_h2(77.0);
        let b = effective_critical_h2(77.0);
        assert_eq!(a, b);
    }
}

use crate::core::models::bond::BondVectorKind;
use serde::Deserialize;
use std::f64::consts::PI;

/// Vacuum permeability in T·m/A.
const MU_0: f64 = 4.0 * PI * 1e-7;
/// Planck constant in J·s.
const PLANCK: f64 = 6.626_070_15e-34;

/// Gyromagnetic ratios in rad/(s·T).
pub const GAMMA_H: f64 = 267.522e6;
pub const GAMMA_N: f64 = -27.126e6;
pub const GAMMA_C: f64 = 67.2828e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nucleus {
    H,
    C,
    N,
}

impl Nucleus {
    pub fn gyromagnetic_ratio(&self) -> f64 {
        match self {
            Self::H => GAMMA_H,
            Self::C => GAMMA_C,
            Self::N => GAMMA_N,
        }
    }
}

/// Static dipolar coupling constant in Hz for two nuclei `distance` Å apart:
/// `-μ0·γa·γb·h / (8π³·r³)`.
pub fn dipolar_coupling_constant(a: Nucleus, b: Nucleus, distance: f64) -> f64 {
    let r = distance * 1e-10;
    -MU_0 * a.gyromagnetic_ratio() * b.gyromagnetic_ratio() * PLANCK / (8.0 * PI.powi(3) * r.powi(3))
}

pub fn nuclei(kind: BondVectorKind) -> (Nucleus, Nucleus) {
    match kind {
        BondVectorKind::NH => (Nucleus::N, Nucleus::H),
        BondVectorKind::CaHa => (Nucleus::C, Nucleus::H),
        BondVectorKind::CaC => (Nucleus::C, Nucleus::C),
        BondVectorKind::CN => (Nucleus::C, Nucleus::N),
        BondVectorKind::CH => (Nucleus::C, Nucleus::H),
        BondVectorKind::NCa => (Nucleus::N, Nucleus::C),
    }
}

/// Dmax (Hz) for every coupling column, defaulting to the values implied by
/// the reference bond lengths.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct CouplingConstants {
    pub n_h: f64,
    pub ca_ha: f64,
    pub ca_c: f64,
    pub c_n: f64,
    pub c_h: f64,
    pub n_ca: f64,
}

fn reference_dmax(kind: BondVectorKind) -> f64 {
    let (a, b) = nuclei(kind);
    dipolar_coupling_constant(a, b, kind.reference_length())
}

impl Default for CouplingConstants {
    fn default() -> Self {
        Self {
            n_h: reference_dmax(BondVectorKind::NH),
            ca_ha: reference_dmax(BondVectorKind::CaHa),
            ca_c: reference_dmax(BondVectorKind::CaC),
            c_n: reference_dmax(BondVectorKind::CN),
            c_h: reference_dmax(BondVectorKind::CH),
            n_ca: reference_dmax(BondVectorKind::NCa),
        }
    }
}

impl CouplingConstants {
    pub fn dmax(&self, kind: BondVectorKind) -> f64 {
        match kind {
            BondVectorKind::NH => self.n_h,
            BondVectorKind::CaHa => self.ca_ha,
            BondVectorKind::CaC => self.ca_c,
            BondVectorKind::CN => self.c_n,
            BondVectorKind::CH => self.c_h,
            BondVectorKind::NCa => self.n_ca,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amide_coupling_constant_matches_literature_value() {
        let dmax = dipolar_coupling_constant(Nucleus::N, Nucleus::H, 1.02);
        assert!((dmax - 22_955.0).abs() < 5.0, "N-H Dmax {dmax}");
    }

    #[test]
    fn sign_follows_gyromagnetic_ratios() {
        let defaults = CouplingConstants::default();
        assert!(defaults.n_h > 0.0);
        assert!(defaults.n_ca > 0.0);
        assert!(defaults.ca_ha < 0.0);
        assert!(defaults.ca_c < 0.0);
    }

    #[test]
    fn coupling_scales_with_inverse_cube_of_distance() {
        let near = dipolar_coupling_constant(Nucleus::C, Nucleus::H, 1.0);
        let far = dipolar_coupling_constant(Nucleus::C, Nucleus::H, 2.0);
        assert!((near / far - 8.0).abs() < 1e-9);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let constants: CouplingConstants = toml::from_str("n-h = 21700.0").unwrap();
        assert_eq!(constants.dmax(BondVectorKind::NH), 21_700.0);
        assert_eq!(
            constants.dmax(BondVectorKind::CaHa),
            CouplingConstants::default().ca_ha
        );
    }
}

use serde::Deserialize;

/// Lennard-Jones 12-6 parameters for the pairwise Cα contact energy.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct CaEnergyParams {
    /// Distance of the energy minimum in Å.
    pub r_min: f64,
    /// Depth of the well in kcal/mol.
    pub well_depth: f64,
    /// Smallest sequence separation `j - i` that contributes a pair term.
    pub min_separation: usize,
}

impl Default for CaEnergyParams {
    fn default() -> Self {
        Self {
            r_min: 4.0,
            well_depth: 0.1,
            min_separation: 3,
        }
    }
}

impl CaEnergyParams {
    pub fn pair_energy(&self, dist: f64) -> f64 {
        super::potentials::lennard_jones_12_6(dist, self.r_min, self.well_depth)
    }

    pub fn contributes(&self, i: usize, j: usize) -> bool {
        i.abs_diff(j) >= self.min_separation
    }
}

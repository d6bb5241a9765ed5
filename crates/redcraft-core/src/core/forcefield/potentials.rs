#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return 1e10;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn lennard_jones_at_minimum_distance_returns_negative_well_depth() {
        let energy = lennard_jones_12_6(4.0, 4.0, 0.1);
        assert!(f64_approx_equal(energy, -0.1));
    }

    #[test]
    fn lennard_jones_at_very_small_distance_returns_large_positive_energy() {
        let energy = lennard_jones_12_6(1e-7, 4.0, 0.1);
        assert!(f64_approx_equal(energy, 1e10));
    }

    #[test]
    fn lennard_jones_crosses_zero_below_minimum() {
        let sigma = 4.0 / 2f64.powf(1.0 / 6.0);
        assert!(f64_approx_equal(lennard_jones_12_6(sigma, 4.0, 0.1), 0.0));
        assert!(lennard_jones_12_6(sigma * 0.95, 4.0, 0.1) > 0.0);
    }

    #[test]
    fn lennard_jones_vanishes_at_long_range() {
        let energy = lennard_jones_12_6(40.0, 4.0, 0.1);
        assert!(energy < 0.0 && energy.abs() < 1e-6);
    }
}

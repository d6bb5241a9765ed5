use nalgebra::{Point3, Vector3};

/// Places atom `d` from three reference atoms using internal coordinates
/// (natural extension reference frame).
///
/// `bond_length` is |cd|, `bond_angle` the b-c-d angle and `torsion` the
/// a-b-c-d dihedral, both in degrees.
pub fn place_atom(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    bond_length: f64,
    bond_angle: f64,
    torsion: f64,
) -> Point3<f64> {
    let bc = (c - b).normalize();
    let n = (b - a).cross(&bc).normalize();
    let m = n.cross(&bc);

    let angle = bond_angle.to_radians();
    let torsion = torsion.to_radians();
    let local = Vector3::new(
        -bond_length * angle.cos(),
        bond_length * angle.sin() * torsion.cos(),
        bond_length * angle.sin() * torsion.sin(),
    );

    c + bc * local.x + m * local.y + n * local.z
}

/// Amide hydrogen on the external bisector of the C'(i-1)-N-CA angle.
pub fn calculate_hn_position(
    n_pos: &Point3<f64>,
    ca_pos: &Point3<f64>,
    prev_c_pos: &Point3<f64>,
    bond_length: f64,
) -> Point3<f64> {
    let n_ca = (ca_pos - n_pos).normalize();
    let n_c_prev = (prev_c_pos - n_pos).normalize();

    let hn_dir = -(n_ca + n_c_prev).normalize();

    n_pos + hn_dir * bond_length
}

/// Dihedral angle a-b-c-d in degrees, in (-180, 180].
pub fn dihedral(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    let b1 = b - a;
    let b2 = c - b;
    let b3 = d - c;

    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);

    let y = b2.norm() * b1.dot(&n2);
    let x = n1.dot(&n2);
    y.atan2(x).to_degrees()
}

/// Angle a-b-c in degrees.
pub fn bond_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ba = a - b;
    let bc = c - b;
    (ba.dot(&bc) / (ba.norm() * bc.norm()))
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees()
}

/// Unit vector pointing from `from` to `to`, or `None` for coincident points.
pub fn unit_vector(from: &Point3<f64>, to: &Point3<f64>) -> Option<Vector3<f64>> {
    (to - from).try_normalize(1e-12)
}

// src/field/dipole.rs

use std::f64::consts::PI;

use crate::vec3::{self, Vec3};

/// Point-dipole B-field (mT) of `moment` (mT·mm³) at local position `p`.
/// NaN at the dipole position.
pub fn b_field(moment: Vec3, p: Vec3) -> Vec3 {
    let r2 = vec3::dot(p, p);
    if r2 == 0.0 {
        return [f64::NAN; 3];
    }
    let r = r2.sqrt();
    let r3 = r2 * r;
    let r5 = r3 * r2;
    let mr = vec3::dot(moment, p);
    let f = 1.0 / (4.0 * PI);
    [
        f * (3.0 * mr * p[0] / r5 - moment[0] / r3),
        f * (3.0 * mr * p[1] / r5 - moment[1] / r3),
        f * (3.0 * mr * p[2] / r5 - moment[2] / r3),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn on_axis_field_is_twice_the_equatorial() {
        let m = [0.0, 0.0, 4.0 * PI];
        let axial = b_field(m, [0.0, 0.0, 2.0]);
        let equatorial = b_field(m, [2.0, 0.0, 0.0]);
        assert_relative_eq!(axial[2], 2.0 / 8.0, epsilon = 1e-15);
        assert_relative_eq!(equatorial[2], -1.0 / 8.0, epsilon = 1e-15);
    }

    #[test]
    fn dipole_position_is_nan() {
        assert!(b_field([1.0, 0.0, 0.0], [0.0; 3]).iter().all(|c| c.is_nan()));
    }
}

// src/field/current_loop.rs
//
// Circular current loop of diameter d in the local xy-plane, centered at the
// origin. Positive current circulates counter-clockwise seen from +z.
// Off-axis field via the complete elliptic integrals K and E; points on the
// wire return zero.

use super::special::{ellipe, ellipk};
use crate::params::MU0_OVER_4PI;
use crate::vec3::Vec3;

pub fn b_field(current: f64, diameter: f64, p: Vec3) -> Vec3 {
    let radius = diameter / 2.0;
    let [x, y, z] = p;
    let r = x.hypot(y);
    if r == radius && z == 0.0 {
        return [0.0; 3];
    }

    let q = (radius + r).powi(2) + z * z;
    let m = 4.0 * radius * r / q;
    let k = ellipk(m);
    let s = ellipe(m) / (1.0 - m) / q;
    let a0 = 2.0 * current / q.sqrt();

    let bz = MU0_OVER_4PI * a0 * (s * (radius * radius - r * r - z * z) + k);
    if r == 0.0 {
        return [0.0, 0.0, bz];
    }
    let br = MU0_OVER_4PI * (z / r) * a0 * (s * (radius * radius + r * r + z * z) - k);
    [br * x / r, br * y / r, bz]
}

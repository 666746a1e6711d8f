// src/field/line.rs
//
// Current along a polyline: Biot-Savart field of each straight segment,
// summed. Points on a segment's supporting line get no contribution from it.

use crate::params::MU0_OVER_4PI;
use crate::vec3::{self, Vec3};

pub fn b_field(current: f64, vertices: &[Vec3], p: Vec3) -> Vec3 {
    let mut b = [0.0; 3];
    for seg in vertices.windows(2) {
        vec3::add_assign(&mut b, segment(current, seg[0], seg[1], p));
    }
    b
}

/// Segment from `p1` to `p2` carrying `current` in that direction.
fn segment(current: f64, p1: Vec3, p2: Vec3, p: Vec3) -> Vec3 {
    let l = vec3::sub(p2, p1);
    let a = vec3::sub(p, p1);
    let c = vec3::cross(l, a);
    let c2 = vec3::dot(c, c);
    if c2 == 0.0 {
        return [0.0; 3];
    }
    let bnd = vec3::sub(p, p2);
    let f = vec3::dot(l, a) / vec3::norm(a) - vec3::dot(l, bnd) / vec3::norm(bnd);
    vec3::scale(c, MU0_OVER_4PI * current * f / c2)
}

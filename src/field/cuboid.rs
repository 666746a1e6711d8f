// src/field/cuboid.rs
//
// Homogeneously magnetized cuboid, centered at the origin with sides along
// the local axes. Each magnetization component is replaced by the surface
// charges on the two faces normal to it; the field of a charged rectangle has
// a closed form in atan and log terms.
//
// Points on an edge or corner of the body are singular and return zero.
//
// Far from the body the atan/log sums cancel to a small remainder; beyond
// FAR_FIELD_RADII circumradii the field is instead the Gauss-Legendre volume
// integral of the point-dipole field, whose terms do not cancel.

use std::f64::consts::PI;

use super::dipole;
use super::special::GAUSS_LEGENDRE_8;
use crate::vec3::{self, Vec3};

/// Switch to the volume quadrature beyond this many circumradii.
pub const FAR_FIELD_RADII: f64 = 8.0;

/// B-field (mT) at local position `p`.
pub fn b_field(magnetization: Vec3, dimension: Vec3, p: Vec3) -> Vec3 {
    let h = [dimension[0] / 2.0, dimension[1] / 2.0, dimension[2] / 2.0];
    if vec3::norm(p) > FAR_FIELD_RADII * vec3::norm(h) {
        return far_field(magnetization, h, p);
    }
    if on_edge(h, p) {
        return [0.0; 3];
    }

    let [mx, my, mz] = magnetization;
    let mut b = [0.0; 3];

    // Mz: (u, v, w) = (x, y, z)
    if mz != 0.0 {
        let f = face_pair(mz, [p[0], p[1], p[2]], [h[0], h[1], h[2]]);
        b[0] += f[0];
        b[1] += f[1];
        b[2] += f[2];
    }
    // Mx: (u, v, w) = (y, z, x)
    if mx != 0.0 {
        let f = face_pair(mx, [p[1], p[2], p[0]], [h[1], h[2], h[0]]);
        b[1] += f[0];
        b[2] += f[1];
        b[0] += f[2];
    }
    // My: (u, v, w) = (z, x, y)
    if my != 0.0 {
        let f = face_pair(my, [p[2], p[0], p[1]], [h[2], h[0], h[1]]);
        b[2] += f[0];
        b[0] += f[1];
        b[1] += f[2];
    }

    if is_inside(dimension, p) {
        b[0] += mx;
        b[1] += my;
        b[2] += mz;
    }
    b
}

/// Superposition of point dipoles M·dV over the body (exterior points only).
fn far_field(magnetization: Vec3, h: Vec3, p: Vec3) -> Vec3 {
    let mut b = [0.0; 3];
    for &(xi, wi) in &GAUSS_LEGENDRE_8 {
        for &(yj, wj) in &GAUSS_LEGENDRE_8 {
            for &(zk, wk) in &GAUSS_LEGENDRE_8 {
                let q = [p[0] - h[0] * xi, p[1] - h[1] * yj, p[2] - h[2] * zk];
                let f = dipole::b_field(magnetization, q);
                vec3::add_assign(&mut b, vec3::scale(f, wi * wj * wk));
            }
        }
    }
    vec3::scale(b, h[0] * h[1] * h[2])
}

/// Strictly inside the body.
pub fn is_inside(dimension: Vec3, p: Vec3) -> bool {
    (0..3).all(|i| p[i].abs() < dimension[i] / 2.0)
}

/// At least two coordinates on a face plane while the third is within range.
fn on_edge(h: Vec3, p: Vec3) -> bool {
    let on = (0..3).filter(|&i| p[i].abs() == h[i]).count();
    on >= 2 && (0..3).all(|i| p[i].abs() <= h[i])
}

/// Field of the charge sheets ±m on the faces w = ±hw, in (u, v, w)
/// components.
fn face_pair(m: f64, p: Vec3, h: Vec3) -> Vec3 {
    let [u, v, w] = p;
    let [hu, hv, hw] = h;
    let (mut bu, mut bv, mut bw) = (0.0, 0.0, 0.0);

    for (tk, zk) in [(1.0, hw), (-1.0, -hw)] {
        let z = w - zk;
        for (sn, xn) in [(1.0, -hu), (-1.0, hu)] {
            let x = u - xn;
            for (sm, ym) in [(1.0, -hv), (-1.0, hv)] {
                let y = v - ym;
                let r = (x * x + y * y + z * z).sqrt();
                let s = tk * sn * sm;
                let xy = x * y;
                if xy != 0.0 {
                    bw += s * (xy / (z * r)).atan();
                }
                bu -= s * ln_plus(y, r, x, z);
                bv -= s * ln_plus(x, r, y, z);
            }
        }
    }

    let f = m / (4.0 * PI);
    [bu * f, bv * f, bw * f]
}

/// ln(a + r) with r = |(a, b, c)|, rewritten for negative `a` to avoid the
/// cancellation in a + r.
#[inline]
fn ln_plus(a: f64, r: f64, b: f64, c: f64) -> f64 {
    if a >= 0.0 {
        (a + r).ln()
    } else {
        (b * b + c * c).ln() - (r - a).ln()
    }
}

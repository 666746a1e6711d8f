// src/field/cylinder.rs
//
// Homogeneously magnetized cylinder, symmetry axis along local z, centered at
// the origin.
//
// Axial magnetization: closed form of Derby & Olbert in terms of Bulirsch's
// complete elliptic integral `cel`.
// Transverse magnetization: surface charge σ = M·n on the mantle. The charge
// integral is exact in z; the azimuth uses a periodic trapezoid rule with
// `nodes` points (spectrally convergent away from the mantle).
//
// Points on the rim circles return zero. Beyond FAR_FIELD_RADII circumradii
// both parts are replaced by a volume quadrature of the point-dipole field.

use std::f64::consts::PI;

use super::cuboid::FAR_FIELD_RADII;
use super::dipole;
use super::special::{cel, GAUSS_LEGENDRE_8};
use crate::vec3::{self, Vec3};

/// Azimuthal trapezoid nodes of the far-field quadrature.
const FAR_AZIMUTH_NODES: usize = 16;

/// B-field (mT) at local position `p`.
pub fn b_field(magnetization: Vec3, diameter: f64, height: f64, p: Vec3, nodes: usize) -> Vec3 {
    let radius = diameter / 2.0;
    let half = height / 2.0;
    if vec3::norm(p) > FAR_FIELD_RADII * radius.hypot(half) {
        return far_field(magnetization, radius, half, p);
    }
    let r = p[0].hypot(p[1]);
    if r == radius && p[2].abs() == half {
        return [0.0; 3];
    }

    let mut b = [0.0; 3];
    if magnetization[2] != 0.0 {
        let (br, bz) = axial_unit(r / radius, p[2] / radius, half / radius);
        let mz = magnetization[2];
        if r > 0.0 {
            b[0] = mz * br * p[0] / r;
            b[1] = mz * br * p[1] / r;
        }
        b[2] = mz * bz;
    }

    let (mx, my) = (magnetization[0], magnetization[1]);
    if mx != 0.0 || my != 0.0 {
        let t = transverse(mx, my, radius, half, p, nodes);
        b[0] += t[0];
        b[1] += t[1];
        b[2] += t[2];
        if is_inside(diameter, height, p) {
            b[0] += mx;
            b[1] += my;
        }
    }
    b
}

/// Superposition of point dipoles M·dV over the body: Gauss-Legendre in r and
/// z, trapezoid in the azimuth.
fn far_field(magnetization: Vec3, radius: f64, half: f64, p: Vec3) -> Vec3 {
    let dphi = 2.0 * PI / FAR_AZIMUTH_NODES as f64;
    let mut b = [0.0; 3];
    for &(ri, wr) in &GAUSS_LEGENDRE_8 {
        let rho = 0.5 * radius * (ri + 1.0);
        for j in 0..FAR_AZIMUTH_NODES {
            let (sin, cos) = (dphi * j as f64).sin_cos();
            for &(zk, wz) in &GAUSS_LEGENDRE_8 {
                let q = [p[0] - rho * cos, p[1] - rho * sin, p[2] - half * zk];
                let f = dipole::b_field(magnetization, q);
                vec3::add_assign(&mut b, vec3::scale(f, wr * wz * rho));
            }
        }
    }
    vec3::scale(b, 0.5 * radius * dphi * half)
}

pub fn is_inside(diameter: f64, height: f64, p: Vec3) -> bool {
    p[0].hypot(p[1]) < diameter / 2.0 && p[2].abs() < height / 2.0
}

/// (B_r, B_z) per unit axial magnetization, all lengths in units of the
/// radius.
fn axial_unit(r: f64, z: f64, half: f64) -> (f64, f64) {
    let zph = z + half;
    let zmh = z - half;
    let dpr = 1.0 + r;
    let dmr = 1.0 - r;

    let sq0 = (zmh * zmh + dpr * dpr).sqrt();
    let sq1 = (zph * zph + dpr * dpr).sqrt();
    let k0 = ((zmh * zmh + dmr * dmr) / (zmh * zmh + dpr * dpr)).sqrt();
    let k1 = ((zph * zph + dmr * dmr) / (zph * zph + dpr * dpr)).sqrt();
    let gamma = dmr / dpr;
    let g2 = gamma * gamma;

    let br = (cel(k1, 1.0, 1.0, -1.0) / sq1 - cel(k0, 1.0, 1.0, -1.0) / sq0) / PI;
    let bz = (zph * cel(k1, g2, 1.0, gamma) / sq1 - zmh * cel(k0, g2, 1.0, gamma) / sq0)
        / dpr
        / PI;
    (br, bz)
}

/// Field of the mantle charges of a transverse magnetization, including the
/// z-integration in closed form.
fn transverse(mx: f64, my: f64, radius: f64, half: f64, p: Vec3, nodes: usize) -> Vec3 {
    let [x, y, z] = p;
    let u1 = -half - z;
    let u2 = half - z;
    let dphi = 2.0 * PI / nodes as f64;

    let (mut sx, mut sy, mut sz) = (0.0, 0.0, 0.0);
    for i in 0..nodes {
        let (sin, cos) = (dphi * i as f64).sin_cos();
        let sigma = mx * cos + my * sin;
        let a = x - radius * cos;
        let b = y - radius * sin;
        let rho2 = a * a + b * b;
        if rho2 == 0.0 {
            continue;
        }
        let q1 = (rho2 + u1 * u1).sqrt();
        let q2 = (rho2 + u2 * u2).sqrt();
        let fxy = (u2 / q2 - u1 / q1) / rho2;
        let fz = 1.0 / q2 - 1.0 / q1;
        sx += sigma * a * fxy;
        sy += sigma * b * fxy;
        sz += sigma * fz;
    }

    let w = radius * dphi / (4.0 * PI);
    [sx * w, sy * w, sz * w]
}

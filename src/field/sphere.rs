// src/field/sphere.rs
//
// Homogeneously magnetized sphere: uniform 2/3·M inside, the field of a
// point dipole with moment M·V outside.

use std::f64::consts::PI;

use super::dipole;
use crate::vec3::{self, Vec3};

pub fn b_field(magnetization: Vec3, diameter: f64, p: Vec3) -> Vec3 {
    if is_inside(diameter, p) {
        return vec3::scale(magnetization, 2.0 / 3.0);
    }
    let volume = PI * diameter.powi(3) / 6.0;
    dipole::b_field(vec3::scale(magnetization, volume), p)
}

pub fn is_inside(diameter: f64, p: Vec3) -> bool {
    vec3::norm(p) < diameter / 2.0
}

// src/field/special.rs
//
// Complete elliptic integrals used by the cylinder and loop formulas.

use std::f64::consts::{FRAC_PI_2, PI};

const MAX_ITER: usize = 64;

/// 8-point Gauss-Legendre rule on [-1, 1] as (node, weight) pairs.
pub const GAUSS_LEGENDRE_8: [(f64, f64); 8] = [
    (-0.960_289_856_497_536_3, 0.101_228_536_290_376_3),
    (-0.796_666_477_413_626_7, 0.222_381_034_453_374_5),
    (-0.525_532_409_916_329_0, 0.313_706_645_877_887_3),
    (-0.183_434_642_495_649_8, 0.362_683_783_378_362_0),
    (0.183_434_642_495_649_8, 0.362_683_783_378_362_0),
    (0.525_532_409_916_329_0, 0.313_706_645_877_887_3),
    (0.796_666_477_413_626_7, 0.222_381_034_453_374_5),
    (0.960_289_856_497_536_3, 0.101_228_536_290_376_3),
];

/// Bulirsch's general complete elliptic integral
///
///   cel(kc, p, c, s) = ∫_0^{π/2} (c cos²φ + s sin²φ)
///                       / ((cos²φ + p sin²φ) sqrt(cos²φ + kc² sin²φ)) dφ
///
/// Returns NaN for kc = 0, where the integral diverges.
pub fn cel(kc: f64, p: f64, c: f64, s: f64) -> f64 {
    const ERRTOL: f64 = 1e-10;
    if kc == 0.0 {
        return f64::NAN;
    }

    let mut k = kc.abs();
    let mut em = 1.0;
    let (mut pp, mut cc, mut ss);
    if p > 0.0 {
        pp = p.sqrt();
        cc = c;
        ss = s / pp;
    } else {
        let mut f = kc * kc;
        let mut q = 1.0 - f;
        let g = 1.0 - p;
        f -= p;
        q *= s - c * p;
        pp = (f / g).sqrt();
        cc = (c - s) / g;
        ss = -q / (g * g * pp) + cc * pp;
    }

    let mut f = cc;
    cc += ss / pp;
    let mut g = k / pp;
    ss = 2.0 * (ss + f * g);
    pp += g;
    g = em;
    em += k;
    let mut kk = k;

    for _ in 0..MAX_ITER {
        if (g - k).abs() <= g * ERRTOL {
            break;
        }
        k = 2.0 * kk.sqrt();
        kk = k * em;
        f = cc;
        cc += ss / pp;
        g = kk / pp;
        ss = 2.0 * (ss + f * g);
        pp += g;
        g = em;
        em += k;
    }
    FRAC_PI_2 * (ss + cc * em) / (em * (em + pp))
}

/// Arithmetic-geometric mean iteration shared by K and E. Returns the AGM
/// and the weighted sum Σ 2^(n-1) c_n² (c_0² = m).
fn agm(m: f64) -> (f64, f64) {
    let mut a = 1.0;
    let mut b = (1.0 - m).sqrt();
    let mut sum = 0.5 * m;
    let mut w = 0.5;
    for _ in 0..MAX_ITER {
        let c = 0.5 * (a - b);
        if c.abs() <= 1e-15 * a {
            break;
        }
        let an = 0.5 * (a + b);
        b = (a * b).sqrt();
        a = an;
        w *= 2.0;
        sum += w * c * c;
    }
    (a, sum)
}

/// Complete elliptic integral of the first kind K(m), parameter m = k².
/// Infinite at m = 1, NaN for m > 1.
pub fn ellipk(m: f64) -> f64 {
    if m == 1.0 {
        return f64::INFINITY;
    }
    if !(m < 1.0) {
        return f64::NAN;
    }
    let (a, _) = agm(m);
    PI / (2.0 * a)
}

/// Complete elliptic integral of the second kind E(m), parameter m = k².
pub fn ellipe(m: f64) -> f64 {
    if m == 1.0 {
        return 1.0;
    }
    if !(m < 1.0) {
        return f64::NAN;
    }
    let (a, sum) = agm(m);
    PI / (2.0 * a) * (1.0 - sum)
}

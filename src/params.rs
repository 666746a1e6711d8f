// src/params.rs
//
// Field kinds, evaluation options and unit constants.
//
// Units: mm, mT (magnetization, B), kA/m (H), A, mT·mm³ (dipole moment).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// H[kA/m] = B[mT] * B_TO_H, i.e. 1/mu0 in these units.
pub const B_TO_H: f64 = 10.0 / (4.0 * PI);

/// mu0/(4 pi) in mT·mm/A, prefactor of the current-source formulas.
pub const MU0_OVER_4PI: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldKind {
    /// Magnetic flux density (mT).
    #[default]
    B,
    /// Magnetic field strength (kA/m).
    H,
}

impl FieldKind {
    pub fn from_arg(s: &str) -> Option<Self> {
        match s {
            "b" | "B" => Some(Self::B),
            "h" | "H" => Some(Self::H),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::B => "B",
            Self::H => "H",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::B => "mT",
            Self::H => "kA/m",
        }
    }
}

/// Output shaping of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalOptions {
    /// Sum over the source axis (first axis).
    pub sum_over_sources: bool,
    /// Remove every axis of length 1.
    pub squeeze: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            sum_over_sources: false,
            squeeze: true,
        }
    }
}

impl EvalOptions {
    /// Full-rank output, nothing summed or squeezed.
    pub fn raw() -> Self {
        Self {
            sum_over_sources: false,
            squeeze: false,
        }
    }
}

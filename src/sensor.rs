// src/sensor.rs
//
// Observers. A sensor is a movable frame carrying a pixel grid of local
// offsets; the grid may have any rank (N1 x N2 x ... x 3). Bare observer
// positions are wrapped as a static, unrotated sensor at the origin.

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, Result};
use crate::path::Path;
use crate::rotation::Rotation;
use crate::scene::SensorId;
use crate::vec3::Vec3;

/// Local pixel offsets with their grid shape (the trailing 3 is implicit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PixelGridRepr", into = "PixelGridRepr")]
pub struct PixelGrid {
    shape: Vec<usize>,
    offsets: Vec<Vec3>,
}

#[derive(Serialize, Deserialize)]
struct PixelGridRepr {
    shape: Vec<usize>,
    offsets: Vec<Vec3>,
}

impl TryFrom<PixelGridRepr> for PixelGrid {
    type Error = FieldError;

    fn try_from(r: PixelGridRepr) -> Result<Self> {
        PixelGrid::from_shape(r.shape, r.offsets)
    }
}

impl From<PixelGrid> for PixelGridRepr {
    fn from(g: PixelGrid) -> Self {
        Self {
            shape: g.shape,
            offsets: g.offsets,
        }
    }
}

impl Default for PixelGrid {
    fn default() -> Self {
        Self::single([0.0; 3])
    }
}

impl PixelGrid {
    /// One pixel, rank 0 (contributes no pixel axes to the output shape).
    pub fn single(offset: Vec3) -> Self {
        Self {
            shape: Vec::new(),
            offsets: vec![offset],
        }
    }

    /// Rank-1 grid.
    pub fn line(offsets: Vec<Vec3>) -> Self {
        Self {
            shape: vec![offsets.len()],
            offsets,
        }
    }

    /// Grid of arbitrary rank; `offsets` in row-major order.
    pub fn from_shape(shape: Vec<usize>, offsets: Vec<Vec3>) -> Result<Self> {
        let n: usize = shape.iter().product();
        if n != offsets.len() {
            return Err(FieldError::shape(format!(
                "pixel grid shape {:?} needs {} offsets, got {}",
                shape,
                n,
                offsets.len()
            )));
        }
        Ok(Self { shape, offsets })
    }

    /// Regular grid spanning `[lo, hi]` on each axis with `counts` samples;
    /// axes with one sample sit at `lo`. Shape is `counts` with singleton axes
    /// kept.
    pub fn regular(lo: Vec3, hi: Vec3, counts: [usize; 3]) -> Self {
        let axis = |a: usize| -> Vec<f64> {
            let c = counts[a];
            if c <= 1 {
                return vec![lo[a]; c];
            }
            let step = (hi[a] - lo[a]) / (c - 1) as f64;
            (0..c).map(|i| lo[a] + step * i as f64).collect()
        };
        let (xs, ys, zs) = (axis(0), axis(1), axis(2));
        let mut offsets = Vec::with_capacity(xs.len() * ys.len() * zs.len());
        for &x in &xs {
            for &y in &ys {
                for &z in &zs {
                    offsets.push([x, y, z]);
                }
            }
        }
        Self {
            shape: counts.to_vec(),
            offsets,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn offsets(&self) -> &[Vec3] {
        &self.offsets
    }

    #[inline]
    pub fn n_pixels(&self) -> usize {
        self.offsets.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sensor {
    #[serde(default)]
    pub path: Path,
    #[serde(default)]
    pub pixels: PixelGrid,
}

impl Sensor {
    /// Single-pixel sensor at `position`.
    pub fn new(position: Vec3) -> Self {
        Self {
            path: Path::new(position, Rotation::identity()),
            pixels: PixelGrid::default(),
        }
    }

    pub fn with_pixels(mut self, pixels: PixelGrid) -> Self {
        self.pixels = pixels;
        self
    }

    pub fn oriented(mut self, orientation: Rotation) -> Self {
        let p = self.path.current_position();
        self.path.reset(p, orientation);
        self
    }

    pub fn with_path(mut self, path: Path) -> Self {
        self.path = path;
        self
    }
}

/// One entry of the observer input of an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Observer {
    Sensor(SensorId),
    /// Bare world-frame positions, evaluated as a static sensor at the origin.
    Points(PixelGrid),
}

impl Observer {
    pub fn point(position: Vec3) -> Self {
        Self::Points(PixelGrid::single(position))
    }

    pub fn points(positions: Vec<Vec3>) -> Self {
        Self::Points(PixelGrid::line(positions))
    }
}

impl From<SensorId> for Observer {
    fn from(id: SensorId) -> Self {
        Self::Sensor(id)
    }
}

// src/engine/observers.rs
//
// Observer flattening: every observer's pixel offsets are moved into the
// world frame at every path step and laid out as one flat array,
//
//   index = m * n + k * P + p,   n = K * P
//
// for step m, observer k and pixel p (P pixels per observer).

use rayon::prelude::*;

use super::broadcast::PathView;
use crate::error::{FieldError, Result};
use crate::rotation::Rotation;
use crate::scene::Scene;
use crate::sensor::{Observer, PixelGrid};
use crate::vec3::{self, Vec3};

/// One observer entry resolved against the scene. Bare positions have no
/// path (static, unrotated, at the origin).
#[derive(Debug, Clone, Copy)]
pub struct ObserverView<'a> {
    path: Option<PathView<'a>>,
    pixels: &'a PixelGrid,
}

impl<'a> ObserverView<'a> {
    pub fn path_len(&self) -> usize {
        self.path.map_or(1, |p| p.len())
    }

    fn position(&self, step: usize) -> Vec3 {
        self.path.map_or([0.0; 3], |p| p.position(step))
    }

    fn orientation(&self, step: usize) -> Option<Rotation> {
        self.path.map(|p| p.orientation(step))
    }

    /// Every orientation on the observer's own path is exactly the identity.
    fn unrotated(&self) -> bool {
        self.path
            .map_or(true, |p| p.orientations().iter().all(|r| r.is_identity()))
    }

    /// Path of length 1, or all orientations bitwise equal.
    fn static_orientation(&self) -> bool {
        self.path.map_or(true, |p| {
            let rs = p.orientations();
            rs.iter().all(|r| *r == rs[0])
        })
    }
}

pub fn resolve<'a>(scene: &'a Scene, observers: &'a [Observer]) -> Result<Vec<ObserverView<'a>>> {
    if observers.is_empty() {
        return Err(FieldError::shape("no observers given"));
    }
    observers
        .iter()
        .map(|o| match o {
            Observer::Sensor(id) => {
                let s = scene.sensor(*id)?;
                Ok(ObserverView {
                    path: Some(PathView::new(&s.path)),
                    pixels: &s.pixels,
                })
            }
            Observer::Points(grid) => Ok(ObserverView {
                path: None,
                pixels: grid,
            }),
        })
        .collect()
}

/// World-frame observer positions for all steps, plus what is needed to
/// bring results back into each observer's frame.
#[derive(Debug, Clone)]
pub struct FlatObservers {
    pub positions: Vec<Vec3>,
    pub steps: usize,
    pub n_observers: usize,
    pub n_pixels: usize,
    pub pixel_shape: Vec<usize>,
    /// Rotation to undo per (step, observer), `None` when nothing to undo.
    pub frames: Vec<Option<Rotation>>,
}

impl FlatObservers {
    /// Rows per path step (K * P).
    #[inline]
    pub fn rows_per_step(&self) -> usize {
        self.n_observers * self.n_pixels
    }
}

pub fn flatten(views: &[ObserverView<'_>], steps: usize, min_rows: usize) -> Result<FlatObservers> {
    let first = views
        .first()
        .ok_or_else(|| FieldError::shape("no observers given"))?;
    let shape = first.pixels.shape();
    if let Some(v) = views.iter().find(|v| v.pixels.shape() != shape) {
        return Err(FieldError::shape(format!(
            "observers have different pixel shapes: {:?} vs {:?}",
            shape,
            v.pixels.shape()
        )));
    }
    let n_pixels = first.pixels.n_pixels();
    let expected: usize = shape.iter().product();
    if let Some(v) = views.iter().find(|v| v.pixels.n_pixels() != expected) {
        return Err(FieldError::shape(format!(
            "pixel grid {shape:?} holds {} offsets, expected {expected}",
            v.pixels.n_pixels()
        )));
    }
    if n_pixels == 0 {
        return Err(FieldError::shape(format!(
            "pixel grid {shape:?} has no pixels"
        )));
    }
    let k_len = views.len();

    let mut positions = vec![[0.0; 3]; steps * k_len * n_pixels];
    positions
        .par_chunks_mut(n_pixels)
        .with_min_len((min_rows / n_pixels).max(1))
        .enumerate()
        .for_each(|(c, chunk)| {
            let (m, k) = (c / k_len, c % k_len);
            let view = &views[k];
            chunk.copy_from_slice(view.pixels.offsets());
            if let Some(r) = view.orientation(m) {
                if !r.is_identity() {
                    r.apply_batch(chunk);
                }
            }
            let pos = view.position(m);
            for px in chunk.iter_mut() {
                *px = vec3::add(*px, pos);
            }
        });

    let mut frames = vec![None; steps * k_len];
    for (k, view) in views.iter().enumerate() {
        if view.unrotated() {
            continue;
        }
        let fixed = view.static_orientation();
        for m in 0..steps {
            let step = if fixed { 0 } else { m };
            frames[m * k_len + k] = view.orientation(step);
        }
    }

    Ok(FlatObservers {
        positions,
        steps,
        n_observers: k_len,
        n_pixels,
        pixel_shape: shape.to_vec(),
        frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;
    use crate::sensor::Sensor;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn layout_is_step_observer_pixel() {
        let mut scene = Scene::new();
        let path = Path::from_positions(vec![[0.0; 3], [10.0, 0.0, 0.0]]).unwrap();
        let s = scene.add_sensor(
            Sensor::default()
                .with_path(path)
                .with_pixels(PixelGrid::line(vec![[0.0; 3], [0.0, 1.0, 0.0]])),
        );
        let obs = vec![
            Observer::Sensor(s),
            Observer::points(vec![[5.0, 5.0, 5.0], [6.0, 6.0, 6.0]]),
        ];
        let views = resolve(&scene, &obs).unwrap();
        let flat = flatten(&views, 2, 1).unwrap();
        assert_eq!(flat.rows_per_step(), 4);
        assert_eq!(flat.positions.len(), 8);
        assert_eq!(flat.positions[1], [0.0, 1.0, 0.0]);
        assert_eq!(flat.positions[3], [6.0, 6.0, 6.0]);
        assert_eq!(flat.positions[5], [10.0, 1.0, 0.0]);
        assert_eq!(flat.positions[6], [5.0, 5.0, 5.0]);
        assert!(flat.frames.iter().all(Option::is_none));
    }

    #[test]
    fn pixel_offsets_follow_sensor_orientation() {
        let mut scene = Scene::new();
        let r = Rotation::from_axis_angle([0.0, 0.0, 1.0], FRAC_PI_2).unwrap();
        let s = scene.add_sensor(
            Sensor::new([1.0, 0.0, 0.0])
                .oriented(r)
                .with_pixels(PixelGrid::single([1.0, 0.0, 0.0])),
        );
        let obs = [Observer::Sensor(s)];
        let flat = flatten(&resolve(&scene, &obs).unwrap(), 3, 1).unwrap();
        for m in 0..3 {
            assert_relative_eq!(flat.positions[m][0], 1.0, epsilon = 1e-12);
            assert_relative_eq!(flat.positions[m][1], 1.0, epsilon = 1e-12);
            assert_eq!(flat.frames[m], Some(r));
        }
    }

    #[test]
    fn pixel_shapes_must_agree() {
        let obs = vec![
            Observer::points(vec![[0.0; 3]; 2]),
            Observer::points(vec![[0.0; 3]; 3]),
        ];
        let scene = Scene::new();
        let views = resolve(&scene, &obs).unwrap();
        assert!(matches!(flatten(&views, 1, 1), Err(FieldError::BadInputShape(_))));
    }

    #[test]
    fn unknown_sensor_is_an_invalid_handle() {
        let scene = Scene::new();
        let obs = [Observer::Sensor(crate::scene::SensorId(3))];
        assert!(matches!(
            resolve(&scene, &obs),
            Err(FieldError::InvalidHandle { kind: "sensor", index: 3 })
        ));
    }
}

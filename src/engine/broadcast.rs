// src/engine/broadcast.rs
//
// Path-length reconciliation. Every participating object has a path of
// length 1 or of the common length M; length-1 paths are read through a view
// that returns entry 0 at every step, so nothing is tiled or mutated.

use crate::error::{FieldError, Result};
use crate::path::Path;
use crate::rotation::Rotation;
use crate::vec3::Vec3;

/// Read-only length-M view of a path.
#[derive(Debug, Clone, Copy)]
pub struct PathView<'a> {
    path: &'a Path,
}

impl<'a> PathView<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self { path }
    }

    #[inline]
    fn index(&self, step: usize) -> usize {
        if self.path.len() == 1 {
            0
        } else {
            step
        }
    }

    #[inline]
    pub fn position(&self, step: usize) -> Vec3 {
        self.path.position(self.index(step))
    }

    #[inline]
    pub fn orientation(&self, step: usize) -> Rotation {
        self.path.orientation(self.index(step))
    }

    /// Distinct orientations seen by the view (1 for broadcast paths).
    pub fn orientations(&self) -> &'a [Rotation] {
        self.path.orientations()
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Common path length of a set of objects: the maximum, provided every
/// length is either 1 or that maximum.
pub fn reconcile<I>(lengths: I) -> Result<usize>
where
    I: IntoIterator<Item = usize>,
{
    let lengths: Vec<usize> = lengths.into_iter().collect();
    let m = lengths
        .iter()
        .copied()
        .max()
        .ok_or_else(|| FieldError::shape("no objects to evaluate"))?;
    if let Some(bad) = lengths.iter().find(|&&l| l != 1 && l != m) {
        return Err(FieldError::shape(format!(
            "path length {bad} is neither 1 nor the common length {m}"
        )));
    }
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_length_is_the_maximum() {
        assert_eq!(reconcile([1, 4, 1, 4]).unwrap(), 4);
        assert_eq!(reconcile([1, 1]).unwrap(), 1);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(matches!(reconcile([3, 5]), Err(FieldError::BadInputShape(_))));
        assert!(matches!(
            reconcile(std::iter::empty::<usize>()),
            Err(FieldError::BadInputShape(_))
        ));
    }

    #[test]
    fn static_paths_broadcast_entry_zero() {
        let p = Path::new([1.0, 2.0, 3.0], Rotation::identity());
        let v = PathView::new(&p);
        assert_eq!(v.position(0), [1.0, 2.0, 3.0]);
        assert_eq!(v.position(7), [1.0, 2.0, 3.0]);

        let q = Path::from_positions(vec![[0.0; 3], [1.0, 0.0, 0.0]]).unwrap();
        assert_eq!(PathView::new(&q).position(1), [1.0, 0.0, 0.0]);
    }
}

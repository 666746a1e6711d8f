// src/path.rs
//
// Motion path of a movable object (source or sensor): an ordered sequence of
// (position, orientation) states. The last entry is the current state, earlier
// entries are history. A path always has at least one entry.
//
// Step semantics shared by all motion operations:
//   steps < 0 : ramp the operation linearly over the last |steps| entries,
//               entry len-|steps|+j receives the fraction (j+1)/|steps|.
//               steps = -1 applies the full operation to the current state.
//   steps > 0 : append `steps` entries starting from the current state,
//               entry i (1-based) receives the fraction i/steps.

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, Result};
use crate::rotation::Rotation;
use crate::vec3::{self, Vec3};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PathRepr", into = "PathRepr")]
pub struct Path {
    positions: Vec<Vec3>,
    orientations: Vec<Rotation>,
}

#[derive(Serialize, Deserialize)]
struct PathRepr {
    positions: Vec<Vec3>,
    orientations: Vec<Rotation>,
}

impl TryFrom<PathRepr> for Path {
    type Error = FieldError;

    fn try_from(r: PathRepr) -> Result<Self> {
        Path::from_steps(r.positions, r.orientations)
    }
}

impl From<Path> for PathRepr {
    fn from(p: Path) -> Self {
        Self {
            positions: p.positions,
            orientations: p.orientations,
        }
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::new([0.0; 3], Rotation::identity())
    }
}

impl Path {
    /// Static path (length 1).
    pub fn new(position: Vec3, orientation: Rotation) -> Self {
        Self {
            positions: vec![position],
            orientations: vec![orientation],
        }
    }

    /// Path from explicit states. Both sequences must be non-empty and of equal
    /// length.
    pub fn from_steps(positions: Vec<Vec3>, orientations: Vec<Rotation>) -> Result<Self> {
        if positions.is_empty() {
            return Err(FieldError::shape("path must contain at least one state"));
        }
        if positions.len() != orientations.len() {
            return Err(FieldError::shape(format!(
                "path has {} positions but {} orientations",
                positions.len(),
                orientations.len()
            )));
        }
        Ok(Self {
            positions,
            orientations,
        })
    }

    /// Translation-only path with identity orientation.
    pub fn from_positions(positions: Vec<Vec3>) -> Result<Self> {
        let orientations = vec![Rotation::identity(); positions.len()];
        Self::from_steps(positions, orientations)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Never true; paths hold at least one state.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.positions.len() == 1
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn orientations(&self) -> &[Rotation] {
        &self.orientations
    }

    #[inline]
    pub fn position(&self, step: usize) -> Vec3 {
        self.positions[step]
    }

    #[inline]
    pub fn orientation(&self, step: usize) -> Rotation {
        self.orientations[step]
    }

    pub fn current_position(&self) -> Vec3 {
        self.positions[self.positions.len() - 1]
    }

    pub fn current_orientation(&self) -> Rotation {
        self.orientations[self.orientations.len() - 1]
    }

    /// Drop the history and make `position`/`orientation` the only state.
    pub fn reset(&mut self, position: Vec3, orientation: Rotation) {
        self.positions = vec![position];
        self.orientations = vec![orientation];
    }

    /// Drop the history, keeping the current state.
    pub fn reset_to_current(&mut self) {
        let (p, r) = (self.current_position(), self.current_orientation());
        self.reset(p, r);
    }

    /// Linear displacement, see the module docs for `steps`.
    pub fn move_by(&mut self, displacement: Vec3, steps: isize) -> Result<()> {
        for (idx, t) in self.ramp(steps)? {
            self.positions[idx] = vec3::add(self.positions[idx], vec3::scale(displacement, t));
        }
        Ok(())
    }

    /// Rotate by `rotation`. With an anchor the axis passes through the anchor
    /// point, otherwise the object rotates about its own position.
    pub fn rotate(&mut self, rotation: &Rotation, anchor: Option<Vec3>, steps: isize) -> Result<()> {
        let r = *rotation;
        self.rotate_with(|t| r.fraction(t), anchor, steps)
    }

    /// Rotate by `angle` about `axis`. Unlike `rotate`, angles beyond half a
    /// turn are kept when ramped over several steps.
    pub fn rotate_from_angax(
        &mut self,
        angle: f64,
        axis: Vec3,
        anchor: Option<Vec3>,
        steps: isize,
        degrees: bool,
    ) -> Result<()> {
        let angle = if degrees { angle.to_radians() } else { angle };
        // validates the axis before touching the path
        Rotation::from_axis_angle(axis, angle)?;
        self.rotate_with(
            |t| Rotation::from_axis_angle(axis, angle * t).unwrap_or_default(),
            anchor,
            steps,
        )
    }

    fn rotate_with<F>(&mut self, fraction: F, anchor: Option<Vec3>, steps: isize) -> Result<()>
    where
        F: Fn(f64) -> Rotation,
    {
        for (idx, t) in self.ramp(steps)? {
            let r = fraction(t);
            self.orientations[idx] = r.compose(&self.orientations[idx]);
            if let Some(a) = anchor {
                let rel = vec3::sub(self.positions[idx], a);
                self.positions[idx] = vec3::add(a, r.apply(rel));
            }
        }
        Ok(())
    }

    /// Resolve `steps` into (entry index, fraction) pairs, appending entries
    /// first when `steps > 0`.
    fn ramp(&mut self, steps: isize) -> Result<Vec<(usize, f64)>> {
        let len = self.len();
        if steps == 0 {
            return Err(FieldError::motion("steps must be non-zero"));
        }
        if steps < 0 {
            let k = steps.unsigned_abs();
            if k > len {
                return Err(FieldError::motion(format!(
                    "steps={steps} reaches beyond the path start (path length {len})"
                )));
            }
            return Ok((0..k)
                .map(|j| (len - k + j, (j + 1) as f64 / k as f64))
                .collect());
        }

        let k = steps as usize;
        let (p, r) = (self.current_position(), self.current_orientation());
        self.positions.extend(std::iter::repeat(p).take(k));
        self.orientations.extend(std::iter::repeat(r).take(k));
        Ok((1..=k).map(|i| (len - 1 + i, i as f64 / k as f64)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        for i in 0..3 {
            assert_relative_eq!(a[i], b[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn negative_steps_displace_only_the_tail() {
        let mut p = Path::from_positions(vec![[0.0; 3]; 4]).unwrap();
        p.move_by([4.0, 0.0, 0.0], -2).unwrap();
        assert_eq!(p.len(), 4);
        assert_vec_eq(p.position(1), [0.0, 0.0, 0.0]);
        assert_vec_eq(p.position(2), [2.0, 0.0, 0.0]);
        assert_vec_eq(p.position(3), [4.0, 0.0, 0.0]);
    }

    #[test]
    fn positive_steps_append_from_current_state() {
        let mut p = Path::new([1.0, 0.0, 0.0], Rotation::identity());
        p.move_by([0.0, 0.0, 3.0], 3).unwrap();
        assert_eq!(p.len(), 4);
        assert_vec_eq(p.position(0), [1.0, 0.0, 0.0]);
        assert_vec_eq(p.position(1), [1.0, 0.0, 1.0]);
        assert_vec_eq(p.position(3), [1.0, 0.0, 3.0]);
    }

    #[test]
    fn steps_out_of_range_or_zero_are_errors() {
        let mut p = Path::default();
        assert!(matches!(p.move_by([1.0; 3], -2), Err(FieldError::InvalidMotion(_))));
        assert!(matches!(p.move_by([1.0; 3], 0), Err(FieldError::InvalidMotion(_))));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn rotation_about_anchor_moves_position() {
        let mut p = Path::new([1.0, 0.0, 0.0], Rotation::identity());
        p.rotate_from_angax(90.0, [0.0, 0.0, 1.0], Some([0.0; 3]), -1, true)
            .unwrap();
        assert_vec_eq(p.current_position(), [0.0, 1.0, 0.0]);
        assert_vec_eq(p.current_orientation().apply([1.0, 0.0, 0.0]), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn rotation_without_anchor_keeps_position() {
        let mut p = Path::new([1.0, 2.0, 3.0], Rotation::identity());
        let r = Rotation::from_axis_angle([1.0, 0.0, 0.0], 0.5).unwrap();
        p.rotate(&r, None, -1).unwrap();
        assert_vec_eq(p.current_position(), [1.0, 2.0, 3.0]);
        assert!(p.current_orientation().approx_eq(&r, 1e-12));
    }

    #[test]
    fn full_turn_in_steps_keeps_large_angles() {
        let mut p = Path::new([1.0, 0.0, 0.0], Rotation::identity());
        p.rotate_from_angax(360.0, [0.0, 0.0, 1.0], Some([0.0; 3]), 4, true)
            .unwrap();
        assert_eq!(p.len(), 5);
        assert_vec_eq(p.position(1), [0.0, 1.0, 0.0]);
        assert_vec_eq(p.position(2), [-1.0, 0.0, 0.0]);
        assert_vec_eq(p.position(3), [0.0, -1.0, 0.0]);
        assert_vec_eq(p.position(4), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn mismatched_steps_are_rejected() {
        let err = Path::from_steps(vec![[0.0; 3]; 2], vec![Rotation::identity(); 3]);
        assert!(matches!(err, Err(FieldError::BadInputShape(_))));
        assert!(Path::from_positions(vec![]).is_err());
    }

    #[test]
    fn deserialization_validates_lengths() {
        let bad = r#"{"positions":[[0,0,0]],"orientations":[]}"#;
        assert!(serde_json::from_str::<Path>(bad).is_err());
        let good = r#"{"positions":[[0,0,0],[1,0,0]],"orientations":[[0,0,0,1],[0,0,0,1]]}"#;
        let p: Path = serde_json::from_str(good).unwrap();
        assert_eq!(p.len(), 2);
    }
}

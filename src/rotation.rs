// src/rotation.rs
//
// 3D rotations backed by nalgebra unit quaternions.
//
// Convention: `apply` maps a vector from an object's local frame into the world
// frame; `apply_inverse` maps world-frame vectors into the local frame.
// Quaternion import/export uses scalar-last order [x, y, z, w].

use nalgebra::{Matrix3, Quaternion, Rotation3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, Result};
use crate::vec3::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rotation(UnitQuaternion<f64>);

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Rotation {
    pub fn identity() -> Self {
        Self(UnitQuaternion::identity())
    }

    /// Rotation by `angle` radians about `axis` (need not be normalised).
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Result<Self> {
        let v = Vector3::from(axis);
        let unit = Unit::try_new(v, 0.0).ok_or_else(|| {
            FieldError::motion(format!("rotation axis {axis:?} has zero length"))
        })?;
        Ok(Self(UnitQuaternion::from_axis_angle(&unit, angle)))
    }

    /// Rotation vector: axis scaled by the angle in radians.
    pub fn from_rotvec(rotvec: Vec3) -> Self {
        Self(UnitQuaternion::from_scaled_axis(Vector3::from(rotvec)))
    }

    /// Quaternion in [x, y, z, w] order; normalised on construction.
    pub fn from_quat(q: [f64; 4]) -> Self {
        Self(UnitQuaternion::from_quaternion(Quaternion::new(
            q[3], q[0], q[1], q[2],
        )))
    }

    /// Row-major 3x3 rotation matrix. The matrix is orthonormalised.
    pub fn from_matrix(m: [[f64; 3]; 3]) -> Self {
        let mat = Matrix3::new(
            m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
        );
        let rot = Rotation3::from_matrix_eps(&mat, 1e-12, 100, Rotation3::identity());
        Self(UnitQuaternion::from_rotation_matrix(&rot))
    }

    pub fn as_quat(&self) -> [f64; 4] {
        let c = self.0.coords;
        [c[0], c[1], c[2], c[3]]
    }

    pub fn as_matrix(&self) -> [[f64; 3]; 3] {
        let m = self.0.to_rotation_matrix().into_inner();
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    pub fn as_rotvec(&self) -> Vec3 {
        self.0.scaled_axis().into()
    }

    /// Rotation angle in radians, in [0, pi].
    pub fn angle(&self) -> f64 {
        self.0.angle()
    }

    /// `self ∘ other`: applies `other` first, then `self`.
    pub fn compose(&self, other: &Rotation) -> Rotation {
        Self(self.0 * other.0)
    }

    pub fn inverse(&self) -> Rotation {
        Self(self.0.inverse())
    }

    /// Same axis, angle scaled by `t`.
    pub fn fraction(&self, t: f64) -> Rotation {
        Self::from_rotvec(crate::vec3::scale(self.as_rotvec(), t))
    }

    #[inline]
    pub fn apply(&self, v: Vec3) -> Vec3 {
        self.0.transform_vector(&Vector3::from(v)).into()
    }

    #[inline]
    pub fn apply_inverse(&self, v: Vec3) -> Vec3 {
        self.0.inverse_transform_vector(&Vector3::from(v)).into()
    }

    /// Rotate a whole batch of vectors in place.
    pub fn apply_batch(&self, vs: &mut [Vec3]) {
        let m = self.0.to_rotation_matrix();
        for v in vs.iter_mut() {
            *v = (m * Vector3::from(*v)).into();
        }
    }

    /// Inverse-rotate a whole batch of vectors in place.
    pub fn apply_inverse_batch(&self, vs: &mut [Vec3]) {
        self.inverse().apply_batch(vs);
    }

    /// Exactly the identity (no tolerance).
    pub fn is_identity(&self) -> bool {
        let c = self.0.coords;
        c[0] == 0.0 && c[1] == 0.0 && c[2] == 0.0
    }

    /// True if the two rotations differ by at most `tol` radians.
    pub fn approx_eq(&self, other: &Rotation, tol: f64) -> bool {
        self.0.angle_to(&other.0) <= tol
    }
}

impl From<[f64; 4]> for Rotation {
    fn from(q: [f64; 4]) -> Self {
        Self::from_quat(q)
    }
}

impl From<Rotation> for [f64; 4] {
    fn from(r: Rotation) -> Self {
        r.as_quat()
    }
}

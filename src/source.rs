// src/source.rs
//
// Elementary field sources: a closed set of families, each with its own
// geometry and excitation, plus a motion path.
//
// Units: lengths in mm, magnetization in mT, dipole moment in mT·mm³,
// current in A.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::Path;
use crate::rotation::Rotation;
use crate::vec3::Vec3;

/// Formula family. Sources of one family are evaluated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Cuboid,
    Cylinder,
    Sphere,
    Dipole,
    Loop,
    Line,
}

impl Family {
    /// Dispatch order used by the engine.
    pub const ALL: [Family; 6] = [
        Family::Cuboid,
        Family::Cylinder,
        Family::Sphere,
        Family::Dipole,
        Family::Loop,
        Family::Line,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cuboid => "cuboid",
            Self::Cylinder => "cylinder",
            Self::Sphere => "sphere",
            Self::Dipole => "dipole",
            Self::Loop => "loop",
            Self::Line => "line",
        }
    }

    pub fn from_arg(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }

    /// Volume magnets carry a magnetization and change B inside their body.
    pub fn is_magnet(&self) -> bool {
        matches!(self, Self::Cuboid | Self::Cylinder | Self::Sphere)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry and excitation of an elementary source, in its local frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    /// Homogeneously magnetized box centered at the origin, sides along the
    /// local axes.
    Cuboid { magnetization: Vec3, dimension: Vec3 },
    /// Homogeneously magnetized cylinder, symmetry axis along local z.
    Cylinder {
        magnetization: Vec3,
        diameter: f64,
        height: f64,
    },
    Sphere { magnetization: Vec3, diameter: f64 },
    Dipole { moment: Vec3 },
    /// Circular current loop in the local xy-plane, current counter-clockwise
    /// about +z for positive values.
    Loop { current: f64, diameter: f64 },
    /// Current flowing along the polyline through `vertices`.
    Line { current: f64, vertices: Vec<Vec3> },
}

impl SourceKind {
    pub fn family(&self) -> Family {
        match self {
            Self::Cuboid { .. } => Family::Cuboid,
            Self::Cylinder { .. } => Family::Cylinder,
            Self::Sphere { .. } => Family::Sphere,
            Self::Dipole { .. } => Family::Dipole,
            Self::Loop { .. } => Family::Loop,
            Self::Line { .. } => Family::Line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub kind: SourceKind,
    #[serde(default)]
    pub path: Path,
}

impl Source {
    /// Source at the origin with identity orientation.
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            path: Path::default(),
        }
    }

    pub fn cuboid(magnetization: Vec3, dimension: Vec3) -> Self {
        Self::new(SourceKind::Cuboid {
            magnetization,
            dimension,
        })
    }

    pub fn cylinder(magnetization: Vec3, diameter: f64, height: f64) -> Self {
        Self::new(SourceKind::Cylinder {
            magnetization,
            diameter,
            height,
        })
    }

    pub fn sphere(magnetization: Vec3, diameter: f64) -> Self {
        Self::new(SourceKind::Sphere {
            magnetization,
            diameter,
        })
    }

    pub fn dipole(moment: Vec3) -> Self {
        Self::new(SourceKind::Dipole { moment })
    }

    pub fn current_loop(current: f64, diameter: f64) -> Self {
        Self::new(SourceKind::Loop { current, diameter })
    }

    pub fn line(current: f64, vertices: Vec<Vec3>) -> Self {
        Self::new(SourceKind::Line { current, vertices })
    }

    /// Replace the path with a static state at `position`, keeping the
    /// current orientation.
    pub fn at(mut self, position: Vec3) -> Self {
        let r = self.path.current_orientation();
        self.path.reset(position, r);
        self
    }

    /// Replace the path with a static state with `orientation`, keeping the
    /// current position.
    pub fn oriented(mut self, orientation: Rotation) -> Self {
        let p = self.path.current_position();
        self.path.reset(p, orientation);
        self
    }

    pub fn with_path(mut self, path: Path) -> Self {
        self.path = path;
        self
    }

    #[inline]
    pub fn family(&self) -> Family {
        self.kind.family()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_round_trips_through_arg_names() {
        for f in Family::ALL {
            assert_eq!(Family::from_arg(f.as_str()), Some(f));
            assert_eq!(Family::ALL[f.index()], f);
        }
        assert_eq!(Family::from_arg("tetrahedron"), None);
    }

    #[test]
    fn builders_set_static_state() {
        let r = Rotation::from_rotvec([0.0, 0.0, 0.3]);
        let s = Source::sphere([0.0, 0.0, 1.0], 2.0).at([1.0, 2.0, 3.0]).oriented(r);
        assert_eq!(s.family(), Family::Sphere);
        assert!(s.path.is_static());
        assert_eq!(s.path.current_position(), [1.0, 2.0, 3.0]);
        assert_eq!(s.path.current_orientation(), r);
    }

    #[test]
    fn kind_serializes_with_type_tag() {
        let s = Source::current_loop(2.0, 5.0);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["kind"]["type"], "loop");
        let back: Source = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }
}

// src/scene.rs
//
// Arena of sources, sensors and collections. Objects are addressed by typed
// indices; a collection is an ordered list of members (sources or nested
// collections) without duplicates. A source may belong to several
// collections. Collections never contain themselves, directly or through
// nesting.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, Result};
use crate::path::Path;
use crate::rotation::Rotation;
use crate::sensor::Sensor;
use crate::source::Source;
use crate::vec3::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SensorId(pub usize);

/// Entry of a collection, or a top-level source entry of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Member {
    Source(SourceId),
    Collection(CollectionId),
}

impl From<SourceId> for Member {
    fn from(id: SourceId) -> Self {
        Self::Source(id)
    }
}

impl From<CollectionId> for Member {
    fn from(id: CollectionId) -> Self {
        Self::Collection(id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    members: Vec<Member>,
}

impl Collection {
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    sources: Vec<Source>,
    collections: Vec<Collection>,
    sensors: Vec<Sensor>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- arena ----

    pub fn add_source(&mut self, source: Source) -> SourceId {
        self.sources.push(source);
        SourceId(self.sources.len() - 1)
    }

    pub fn add_sensor(&mut self, sensor: Sensor) -> SensorId {
        self.sensors.push(sensor);
        SensorId(self.sensors.len() - 1)
    }

    /// New collection holding `members` in order (duplicates dropped).
    pub fn add_collection(&mut self, members: &[Member]) -> Result<CollectionId> {
        let id = CollectionId(self.collections.len());
        self.collections.push(Collection::default());
        if let Err(e) = self.collection_add(id, members) {
            self.collections.pop();
            return Err(e);
        }
        Ok(id)
    }

    pub fn source(&self, id: SourceId) -> Result<&Source> {
        self.sources.get(id.0).ok_or(FieldError::InvalidHandle {
            kind: "source",
            index: id.0,
        })
    }

    pub fn source_mut(&mut self, id: SourceId) -> Result<&mut Source> {
        self.sources.get_mut(id.0).ok_or(FieldError::InvalidHandle {
            kind: "source",
            index: id.0,
        })
    }

    pub fn sensor(&self, id: SensorId) -> Result<&Sensor> {
        self.sensors.get(id.0).ok_or(FieldError::InvalidHandle {
            kind: "sensor",
            index: id.0,
        })
    }

    pub fn sensor_mut(&mut self, id: SensorId) -> Result<&mut Sensor> {
        self.sensors.get_mut(id.0).ok_or(FieldError::InvalidHandle {
            kind: "sensor",
            index: id.0,
        })
    }

    pub fn collection(&self, id: CollectionId) -> Result<&Collection> {
        self.collections.get(id.0).ok_or(FieldError::InvalidHandle {
            kind: "collection",
            index: id.0,
        })
    }

    pub fn n_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn n_sensors(&self) -> usize {
        self.sensors.len()
    }

    // ---- collections ----

    /// Append members to a collection. Members already present are skipped;
    /// adding a collection that (transitively) contains `id` is rejected and
    /// leaves the collection unchanged.
    pub fn collection_add(&mut self, id: CollectionId, members: &[Member]) -> Result<()> {
        self.collection(id)?;
        for &m in members {
            self.check_member(m)?;
            if let Member::Collection(c) = m {
                if c == id || self.contains_collection(c, id)? {
                    return Err(FieldError::CollectionCycle(id.0));
                }
            }
        }
        let coll = &mut self.collections[id.0];
        for &m in members {
            if !coll.members.contains(&m) {
                coll.members.push(m);
            }
        }
        Ok(())
    }

    /// Remove a direct member. Removing a member that is not present is a no-op.
    pub fn collection_remove(&mut self, id: CollectionId, member: Member) -> Result<()> {
        self.collection(id)?;
        self.collections[id.0].members.retain(|&m| m != member);
        Ok(())
    }

    fn check_member(&self, m: Member) -> Result<()> {
        match m {
            Member::Source(s) => self.source(s).map(|_| ()),
            Member::Collection(c) => self.collection(c).map(|_| ()),
        }
    }

    /// True if `needle` is reachable from `root` through nested collections.
    fn contains_collection(&self, root: CollectionId, needle: CollectionId) -> Result<bool> {
        let mut stack = vec![root];
        let mut seen = HashSet::new();
        while let Some(c) = stack.pop() {
            if !seen.insert(c) {
                continue;
            }
            for &m in self.collection(c)?.members() {
                if let Member::Collection(sub) = m {
                    if sub == needle {
                        return Ok(true);
                    }
                    stack.push(sub);
                }
            }
        }
        Ok(false)
    }

    /// Depth-first expansion of `member` into elementary sources, each source
    /// at most once.
    pub fn flatten(&self, member: Member) -> Result<Vec<SourceId>> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.flatten_into(member, &mut out, &mut seen)?;
        Ok(out)
    }

    fn flatten_into(
        &self,
        member: Member,
        out: &mut Vec<SourceId>,
        seen: &mut HashSet<SourceId>,
    ) -> Result<()> {
        match member {
            Member::Source(s) => {
                self.source(s)?;
                if seen.insert(s) {
                    out.push(s);
                }
            }
            Member::Collection(c) => {
                for &m in self.collection(c)?.members() {
                    self.flatten_into(m, out, seen)?;
                }
            }
        }
        Ok(())
    }

    // ---- motion ----

    fn paths_of(&mut self, member: Member) -> Result<Vec<&mut Path>> {
        let ids = self.flatten(member)?;
        let mut picked = vec![false; self.sources.len()];
        for s in &ids {
            picked[s.0] = true;
        }
        Ok(self
            .sources
            .iter_mut()
            .zip(picked)
            .filter_map(|(src, p)| p.then_some(&mut src.path))
            .collect())
    }

    /// Translate a source or every source of a collection. On error no path
    /// is changed.
    pub fn move_by(&mut self, member: Member, displacement: Vec3, steps: isize) -> Result<()> {
        self.check_steps(member, steps)?;
        for path in self.paths_of(member)? {
            path.move_by(displacement, steps)?;
        }
        Ok(())
    }

    pub fn rotate(
        &mut self,
        member: Member,
        rotation: &Rotation,
        anchor: Option<Vec3>,
        steps: isize,
    ) -> Result<()> {
        self.check_steps(member, steps)?;
        for path in self.paths_of(member)? {
            path.rotate(rotation, anchor, steps)?;
        }
        Ok(())
    }

    pub fn rotate_from_angax(
        &mut self,
        member: Member,
        angle: f64,
        axis: Vec3,
        anchor: Option<Vec3>,
        steps: isize,
        degrees: bool,
    ) -> Result<()> {
        self.check_steps(member, steps)?;
        Rotation::from_axis_angle(axis, 1.0)?;
        for path in self.paths_of(member)? {
            path.rotate_from_angax(angle, axis, anchor, steps, degrees)?;
        }
        Ok(())
    }

    /// Reset every member to a static path at `position`, keeping its current
    /// orientation.
    pub fn set_position(&mut self, member: Member, position: Vec3) -> Result<()> {
        for path in self.paths_of(member)? {
            let r = path.current_orientation();
            path.reset(position, r);
        }
        Ok(())
    }

    /// Reset every member to a static path with `orientation`, keeping its
    /// current position.
    pub fn set_orientation(&mut self, member: Member, orientation: Rotation) -> Result<()> {
        for path in self.paths_of(member)? {
            let p = path.current_position();
            path.reset(p, orientation);
        }
        Ok(())
    }

    /// Drop motion history, keeping each member's current state.
    pub fn reset_path(&mut self, member: Member) -> Result<()> {
        for path in self.paths_of(member)? {
            path.reset_to_current();
        }
        Ok(())
    }

    /// Validate step counts against every affected path before mutating any.
    fn check_steps(&self, member: Member, steps: isize) -> Result<()> {
        if steps == 0 {
            return Err(FieldError::motion("steps must be non-zero"));
        }
        if steps < 0 {
            let k = steps.unsigned_abs();
            for s in self.flatten(member)? {
                let len = self.source(s)?.path.len();
                if k > len {
                    return Err(FieldError::motion(format!(
                        "steps={steps} reaches beyond the start of source #{} (path length {len})",
                        s.0
                    )));
                }
            }
        }
        Ok(())
    }
}

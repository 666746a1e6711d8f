// src/field/mod.rs
//
// Field formulas behind a narrow batched interface.
//
// The engine hands an evaluator one `FormulaBatch` per source family: a stack
// of observer rows, already expressed in each source's local frame, plus the
// parameters of the member sources. Row `i` belongs to member
// `i / rows_per_member`. The evaluator returns one local-frame field vector
// per row.
//
// `AnalyticEvaluator` is the built-in implementation of the six families.

pub mod cuboid;
pub mod current_loop;
pub mod cylinder;
pub mod dipole;
pub mod line;
pub mod sphere;
pub mod special;

use rayon::prelude::*;

use crate::config::{AnalyticConfig, ConfigError};
use crate::error::{FieldError, Result};
use crate::params::{FieldKind, B_TO_H};
use crate::source::{Family, SourceKind};
use crate::vec3::{self, Vec3};

/// Closed-form field provider used by the engine.
pub trait FieldEvaluator: Sync {
    /// Whether this evaluator has a formula for `family`.
    fn supports(&self, family: Family) -> bool;

    /// Evaluate every row of `batch`, returning local-frame vectors in the
    /// batch's row order.
    fn evaluate(&self, kind: FieldKind, batch: &FormulaBatch<'_>) -> Result<Vec<Vec3>>;
}

/// Stacked observer rows of one source family.
#[derive(Debug, Clone)]
pub struct FormulaBatch<'a> {
    family: Family,
    params: Vec<&'a SourceKind>,
    rows_per_member: usize,
    observers: Vec<Vec3>,
}

impl<'a> FormulaBatch<'a> {
    pub fn new(
        family: Family,
        params: Vec<&'a SourceKind>,
        rows_per_member: usize,
        observers: Vec<Vec3>,
    ) -> Result<Self> {
        if let Some(p) = params.iter().find(|p| p.family() != family) {
            return Err(FieldError::shape(format!(
                "{} source in a {} batch",
                p.family(),
                family
            )));
        }
        if params.len() * rows_per_member != observers.len() {
            return Err(FieldError::shape(format!(
                "batch of {} members x {} rows has {} observer rows",
                params.len(),
                rows_per_member,
                observers.len()
            )));
        }
        Ok(Self {
            family,
            params,
            rows_per_member,
            observers,
        })
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn members(&self) -> &[&'a SourceKind] {
        &self.params
    }

    pub fn rows_per_member(&self) -> usize {
        self.rows_per_member
    }

    /// Local-frame observer positions, one per row.
    pub fn observers(&self) -> &[Vec3] {
        &self.observers
    }

    #[inline]
    pub fn member_of(&self, row: usize) -> usize {
        row / self.rows_per_member
    }

    #[inline]
    pub fn params_for_row(&self, row: usize) -> &'a SourceKind {
        self.params[self.member_of(row)]
    }
}

/// Built-in closed-form formulas for all families.
#[derive(Debug, Clone, Default)]
pub struct AnalyticEvaluator {
    config: AnalyticConfig,
}

impl AnalyticEvaluator {
    pub fn new(config: AnalyticConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyticConfig {
        &self.config
    }

    /// Field of one source at one local-frame position.
    pub fn field_at(&self, kind: FieldKind, source: &SourceKind, p: Vec3) -> Vec3 {
        let b = match source {
            SourceKind::Cuboid {
                magnetization,
                dimension,
            } => cuboid::b_field(*magnetization, *dimension, p),
            SourceKind::Cylinder {
                magnetization,
                diameter,
                height,
            } => cylinder::b_field(
                *magnetization,
                *diameter,
                *height,
                p,
                self.config.cylinder_nodes,
            ),
            SourceKind::Sphere {
                magnetization,
                diameter,
            } => sphere::b_field(*magnetization, *diameter, p),
            SourceKind::Dipole { moment } => dipole::b_field(*moment, p),
            SourceKind::Loop { current, diameter } => current_loop::b_field(*current, *diameter, p),
            SourceKind::Line { current, vertices } => line::b_field(*current, vertices, p),
        };
        match kind {
            FieldKind::B => b,
            FieldKind::H => {
                let inside = match source {
                    SourceKind::Cuboid {
                        magnetization,
                        dimension,
                    } => cuboid::is_inside(*dimension, p).then_some(*magnetization),
                    SourceKind::Cylinder {
                        magnetization,
                        diameter,
                        height,
                    } => cylinder::is_inside(*diameter, *height, p).then_some(*magnetization),
                    SourceKind::Sphere {
                        magnetization,
                        diameter,
                    } => sphere::is_inside(*diameter, p).then_some(*magnetization),
                    _ => None,
                };
                let b = match inside {
                    Some(m) => vec3::sub(b, m),
                    None => b,
                };
                vec3::scale(b, B_TO_H)
            }
        }
    }
}

/// Reject parameters outside the formula's domain.
pub fn validate(source: &SourceKind) -> Result<()> {
    let family = source.family();
    let positive = |name: &str, v: f64| -> Result<()> {
        if v.is_finite() && v > 0.0 {
            Ok(())
        } else {
            Err(FieldError::domain(
                family,
                format!("{name} must be positive and finite, got {v}"),
            ))
        }
    };
    let finite = |name: &str, v: Vec3| -> Result<()> {
        if vec3::is_finite(v) {
            Ok(())
        } else {
            Err(FieldError::domain(family, format!("{name} {v:?} is not finite")))
        }
    };
    let finite_current = |v: f64| -> Result<()> {
        if v.is_finite() {
            Ok(())
        } else {
            Err(FieldError::domain(family, format!("current {v} is not finite")))
        }
    };

    match source {
        SourceKind::Cuboid {
            magnetization,
            dimension,
        } => {
            finite("magnetization", *magnetization)?;
            for &d in dimension {
                positive("dimension", d)?;
            }
        }
        SourceKind::Cylinder {
            magnetization,
            diameter,
            height,
        } => {
            finite("magnetization", *magnetization)?;
            positive("diameter", *diameter)?;
            positive("height", *height)?;
        }
        SourceKind::Sphere {
            magnetization,
            diameter,
        } => {
            finite("magnetization", *magnetization)?;
            positive("diameter", *diameter)?;
        }
        SourceKind::Dipole { moment } => finite("moment", *moment)?,
        SourceKind::Loop { current, diameter } => {
            finite_current(*current)?;
            positive("diameter", *diameter)?;
        }
        SourceKind::Line { current, vertices } => {
            finite_current(*current)?;
            if vertices.len() < 2 {
                return Err(FieldError::domain(
                    family,
                    format!("need at least 2 vertices, got {}", vertices.len()),
                ));
            }
            for &v in vertices {
                finite("vertex", v)?;
            }
        }
    }
    Ok(())
}

impl FieldEvaluator for AnalyticEvaluator {
    fn supports(&self, _family: Family) -> bool {
        true
    }

    fn evaluate(&self, kind: FieldKind, batch: &FormulaBatch<'_>) -> Result<Vec<Vec3>> {
        for p in batch.members() {
            validate(p)?;
        }

        let mut out = vec![[0.0; 3]; batch.len()];
        out.par_iter_mut()
            .enumerate()
            .with_min_len(self.config.min_rows_per_task.max(1))
            .for_each(|(row, b)| {
                *b = self.field_at(kind, batch.params_for_row(row), batch.observers()[row]);
            });
        Ok(out)
    }
}

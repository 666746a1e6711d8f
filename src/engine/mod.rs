// src/engine/mod.rs
//
// Field evaluation entry point.
//
// Pipeline: flatten top-level source entries -> reconcile path lengths ->
// flatten observers -> grouped batched dispatch -> collapse per entry and
// rotate into observer frames -> output shaping.
//
// The scene is only read; length-1 paths are broadcast through views.

pub mod broadcast;
pub mod dispatch;
pub mod observers;
pub mod scatter;
pub mod shape;

use ndarray::ArrayD;
use tracing::debug;

use crate::config::{ConfigError, EngineConfig, RunConfig};
use crate::error::{FieldError, Result};
use crate::field::{AnalyticEvaluator, FieldEvaluator};
use crate::params::{EvalOptions, FieldKind};
use crate::scene::{Member, Scene};
use crate::sensor::Observer;
use crate::source::Source;

#[derive(Debug, Clone, Default)]
pub struct Engine<E: FieldEvaluator = AnalyticEvaluator> {
    evaluator: E,
    config: EngineConfig,
}

impl Engine<AnalyticEvaluator> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RunConfig) -> std::result::Result<Self, ConfigError> {
        config.engine.validate()?;
        Ok(Self {
            evaluator: AnalyticEvaluator::new(config.analytic.clone())?,
            config: config.engine.clone(),
        })
    }
}

impl<E: FieldEvaluator> Engine<E> {
    pub fn with_evaluator(evaluator: E, config: EngineConfig) -> Self {
        Self { evaluator, config }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Field of each top-level source entry at each observer pixel.
    ///
    /// Output shape before options: `(entries, steps, observers, pixel dims..., 3)`.
    /// A collection entry holds the sum of its (deduplicated) sources.
    /// Vectors are given in each observer's local frame.
    pub fn compute(
        &self,
        scene: &Scene,
        kind: FieldKind,
        sources: &[Member],
        observers: &[Observer],
        options: EvalOptions,
    ) -> Result<ArrayD<f64>> {
        if sources.is_empty() {
            return Err(FieldError::shape("no sources given"));
        }

        let mut flat: Vec<&Source> = Vec::new();
        let mut entries = Vec::with_capacity(sources.len());
        for &member in sources {
            let start = flat.len();
            for id in scene.flatten(member)? {
                flat.push(scene.source(id)?);
            }
            entries.push(start..flat.len());
        }

        let views = observers::resolve(scene, observers)?;
        let steps = broadcast::reconcile(
            flat.iter()
                .map(|s| s.path.len())
                .chain(views.iter().map(|v| v.path_len())),
        )?;
        debug!(
            field = kind.as_str(),
            entries = sources.len(),
            sources = flat.len(),
            observers = views.len(),
            steps,
            "evaluating field"
        );

        let min_rows = self.config.min_rows_per_task.max(1);
        let obs = observers::flatten(&views, steps, min_rows)?;
        let dense = dispatch::evaluate_grouped(&self.evaluator, kind, &flat, &obs, min_rows)?;
        let mut collapsed = scatter::collapse(&dense, &entries);
        scatter::to_observer_frames(&mut collapsed, &obs.frames, obs.n_pixels, min_rows);
        shape::finalize(collapsed, obs.n_observers, &obs.pixel_shape, options)
    }

    pub fn get_b(&self, scene: &Scene, sources: &[Member], observers: &[Observer]) -> Result<ArrayD<f64>> {
        self.compute(scene, FieldKind::B, sources, observers, EvalOptions::default())
    }

    pub fn get_h(&self, scene: &Scene, sources: &[Member], observers: &[Observer]) -> Result<ArrayD<f64>> {
        self.compute(scene, FieldKind::H, sources, observers, EvalOptions::default())
    }
}

/// `Engine::compute` with the built-in analytic formulas.
pub fn compute_field(
    scene: &Scene,
    kind: FieldKind,
    sources: &[Member],
    observers: &[Observer],
    options: EvalOptions,
) -> Result<ArrayD<f64>> {
    Engine::new().compute(scene, kind, sources, observers, options)
}

/// B-field with default options.
pub fn get_b(scene: &Scene, sources: &[Member], observers: &[Observer]) -> Result<ArrayD<f64>> {
    compute_field(scene, FieldKind::B, sources, observers, EvalOptions::default())
}

/// H-field with default options.
pub fn get_h(scene: &Scene, sources: &[Member], observers: &[Observer]) -> Result<ArrayD<f64>> {
    compute_field(scene, FieldKind::H, sources, observers, EvalOptions::default())
}

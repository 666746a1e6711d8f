// src/engine/dispatch.rs
//
// Grouped, batched formula dispatch. Sources are partitioned by family; each
// family is evaluated with one evaluator call on the stacked local-frame
// observer rows of all its members and steps. Results come back rotated into
// the world frame, at the source's original index.

use rayon::prelude::*;
use tracing::trace;

use super::broadcast::PathView;
use super::observers::FlatObservers;
use crate::error::{FieldError, Result};
use crate::field::{FieldEvaluator, FormulaBatch};
use crate::params::FieldKind;
use crate::source::{Family, Source};
use crate::vec3::{self, Vec3};

/// Dense field tensor of shape (sources, steps, rows per step).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTensor {
    pub sources: usize,
    pub steps: usize,
    pub rows: usize,
    pub data: Vec<Vec3>,
}

impl FieldTensor {
    pub fn zeros(sources: usize, steps: usize, rows: usize) -> Self {
        Self {
            sources,
            steps,
            rows,
            data: vec![[0.0; 3]; sources * steps * rows],
        }
    }

    /// Flat index of (source, step, row).
    #[inline]
    pub fn idx(&self, s: usize, m: usize, i: usize) -> usize {
        (s * self.steps + m) * self.rows + i
    }

    /// Number of vectors owned by one source.
    #[inline]
    pub fn block(&self) -> usize {
        self.steps * self.rows
    }
}

/// Every family present must have a formula before anything is computed.
pub fn check_supported<E>(evaluator: &E, sources: &[&Source]) -> Result<()>
where
    E: FieldEvaluator + ?Sized,
{
    match sources.iter().find(|s| !evaluator.supports(s.family())) {
        Some(s) => Err(FieldError::UnrecognizedSourceType(s.family().to_string())),
        None => Ok(()),
    }
}

pub fn evaluate_grouped<E>(
    evaluator: &E,
    kind: FieldKind,
    sources: &[&Source],
    observers: &FlatObservers,
    min_rows: usize,
) -> Result<FieldTensor>
where
    E: FieldEvaluator + ?Sized,
{
    check_supported(evaluator, sources)?;

    let steps = observers.steps;
    let n = observers.rows_per_step();
    let chunk_min = (min_rows / n).max(1);
    let mut dense = FieldTensor::zeros(sources.len(), steps, n);

    for family in Family::ALL {
        let group: Vec<usize> = (0..sources.len())
            .filter(|&i| sources[i].family() == family)
            .collect();
        if group.is_empty() {
            continue;
        }
        let views: Vec<PathView<'_>> = group.iter().map(|&i| PathView::new(&sources[i].path)).collect();
        trace!(%family, members = group.len(), rows = group.len() * steps * n, "dispatch");

        // world -> source frame, one chunk per (member, step)
        let mut local = vec![[0.0; 3]; group.len() * steps * n];
        local
            .par_chunks_mut(n)
            .with_min_len(chunk_min)
            .enumerate()
            .for_each(|(c, chunk)| {
                let (g, m) = (c / steps, c % steps);
                let pos = views[g].position(m);
                let obs = &observers.positions[m * n..(m + 1) * n];
                for (dst, o) in chunk.iter_mut().zip(obs) {
                    *dst = vec3::sub(*o, pos);
                }
                let r = views[g].orientation(m);
                if !r.is_identity() {
                    r.apply_inverse_batch(chunk);
                }
            });

        let params = group.iter().map(|&i| &sources[i].kind).collect();
        let batch = FormulaBatch::new(family, params, steps * n, local)?;
        let mut out = evaluator.evaluate(kind, &batch)?;
        if out.len() != batch.len() {
            return Err(FieldError::shape(format!(
                "{family} evaluator returned {} rows for {} observers",
                out.len(),
                batch.len()
            )));
        }

        // source -> world frame
        out.par_chunks_mut(n)
            .with_min_len(chunk_min)
            .enumerate()
            .for_each(|(c, chunk)| {
                let r = views[c / steps].orientation(c % steps);
                if !r.is_identity() {
                    r.apply_batch(chunk);
                }
            });

        let block = dense.block();
        for (g, &s) in group.iter().enumerate() {
            let start = dense.idx(s, 0, 0);
            dense.data[start..start + block].copy_from_slice(&out[g * block..(g + 1) * block]);
        }
    }
    Ok(dense)
}

// src/engine/shape.rs
//
// Final output shape: (entries, steps, observers, pixel dims..., 3), then
// optional sum over entries and squeeze of all length-1 axes.

use ndarray::{ArrayD, Axis, IxDyn};

use super::dispatch::FieldTensor;
use crate::error::{FieldError, Result};
use crate::params::EvalOptions;

pub fn finalize(
    field: FieldTensor,
    n_observers: usize,
    pixel_shape: &[usize],
    options: EvalOptions,
) -> Result<ArrayD<f64>> {
    let mut dims = vec![field.sources, field.steps, n_observers];
    dims.extend_from_slice(pixel_shape);
    dims.push(3);

    let flat: Vec<f64> = field.data.into_iter().flatten().collect();
    let mut out = ArrayD::from_shape_vec(IxDyn(&dims), flat)
        .map_err(|e| FieldError::shape(format!("result shape {dims:?}: {e}")))?;

    if options.sum_over_sources {
        out = out.sum_axis(Axis(0));
    }
    if options.squeeze {
        let kept: Vec<usize> = out.shape().iter().copied().filter(|&d| d != 1).collect();
        out = out
            .into_shape(IxDyn(&kept))
            .map_err(|e| FieldError::shape(format!("squeeze to {kept:?}: {e}")))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(sources: usize, steps: usize, rows: usize) -> FieldTensor {
        let mut t = FieldTensor::zeros(sources, steps, rows);
        for (i, v) in t.data.iter_mut().enumerate() {
            *v = [i as f64, 0.0, 0.0];
        }
        t
    }

    #[test]
    fn full_rank_layout() {
        let out = finalize(tensor(2, 3, 4 * 5), 4, &[5], EvalOptions::raw()).unwrap();
        assert_eq!(out.shape(), &[2, 3, 4, 5, 3]);
        assert_eq!(out[&[1, 2, 3, 4, 0][..]], (2 * 3 * 20 - 1) as f64);
    }

    #[test]
    fn squeeze_can_leave_a_bare_vector() {
        let out = finalize(tensor(1, 1, 1), 1, &[], EvalOptions::default()).unwrap();
        assert_eq!(out.shape(), &[3]);
    }

    #[test]
    fn sum_then_squeeze() {
        let opts = EvalOptions {
            sum_over_sources: true,
            squeeze: true,
        };
        let out = finalize(tensor(2, 1, 2), 1, &[2], opts).unwrap();
        assert_eq!(out.shape(), &[2, 3]);
        // rows 0 and 2 summed
        assert_eq!(out[&[0, 0][..]], 0.0 + 2.0);
    }
}

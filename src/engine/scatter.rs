// src/engine/scatter.rs
//
// Collapse of flattened sources onto the caller's top-level entries, then
// rotation of every result into its observer's frame. Summation happens in
// the world frame; each observer rotation is applied once, after summing.

use std::ops::Range;

use rayon::prelude::*;

use super::dispatch::FieldTensor;
use crate::rotation::Rotation;
use crate::vec3;

/// Sum the per-source blocks of `dense` over each entry's range of flattened
/// sources. An empty range yields zeros.
pub fn collapse(dense: &FieldTensor, entries: &[Range<usize>]) -> FieldTensor {
    let mut out = FieldTensor::zeros(entries.len(), dense.steps, dense.rows);
    let block = out.block();
    if block == 0 {
        return out;
    }
    out.data
        .par_chunks_mut(block)
        .zip(entries.par_iter())
        .for_each(|(dst, range)| {
            for s in range.clone() {
                let src = &dense.data[s * block..(s + 1) * block];
                for (d, v) in dst.iter_mut().zip(src) {
                    vec3::add_assign(d, *v);
                }
            }
        });
    out
}

/// Apply the inverse of `frames[m * K + k]` to the pixels of observer k at
/// step m, for every entry.
pub fn to_observer_frames(
    field: &mut FieldTensor,
    frames: &[Option<Rotation>],
    n_pixels: usize,
    min_rows: usize,
) {
    if frames.iter().all(Option::is_none) {
        return;
    }
    let per_entry = frames.len();
    field
        .data
        .par_chunks_mut(n_pixels)
        .with_min_len((min_rows / n_pixels).max(1))
        .enumerate()
        .for_each(|(c, chunk)| {
            if let Some(r) = frames[c % per_entry] {
                r.apply_inverse_batch(chunk);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn collapse_sums_ranges_and_zero_fills_empty_entries() {
        let mut dense = FieldTensor::zeros(3, 1, 2);
        for (i, v) in dense.data.iter_mut().enumerate() {
            *v = [i as f64, 0.0, 1.0];
        }
        let out = collapse(&dense, &[0..1, 1..3, 3..3]);
        assert_eq!(out.sources, 3);
        assert_eq!(out.data[0], [0.0, 0.0, 1.0]);
        assert_eq!(out.data[2], [2.0 + 4.0, 0.0, 2.0]);
        assert_eq!(out.data[3], [3.0 + 5.0, 0.0, 2.0]);
        assert_eq!(out.data[4], [0.0; 3]);
        assert_eq!(out.data[5], [0.0; 3]);
    }

    #[test]
    fn rotation_table_is_indexed_by_step_and_observer() {
        // 1 entry, 2 steps, 2 observers, 1 pixel each
        let mut field = FieldTensor::zeros(1, 2, 2);
        field.data = vec![[1.0, 0.0, 0.0]; 4];
        let r = Rotation::from_axis_angle([0.0, 0.0, 1.0], std::f64::consts::FRAC_PI_2).unwrap();
        let frames = vec![None, Some(r), Some(r), None];
        to_observer_frames(&mut field, &frames, 1, 1);
        assert_eq!(field.data[0], [1.0, 0.0, 0.0]);
        assert_relative_eq!(field.data[1][1], -1.0, epsilon = 1e-12);
        assert_relative_eq!(field.data[2][1], -1.0, epsilon = 1e-12);
        assert_eq!(field.data[3], [1.0, 0.0, 0.0]);
    }
}

// src/fft/engine.rs
//
// Strided 1-D FFT engine.
//
// An engine is planned once from an `FftSpec` and then applied to any number
// of buffers. Every call allocates its own scratch, so a shared `&StridedFft`
// can run on several buffers from several threads at once.
//
// Contiguous transforms (stride 1) run directly on the buffer; strided ones
// gather each line into a small work vector, transform it and scatter it back.

use std::fmt;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftDirection};

use crate::fft::backend::FftBackend;
use crate::fft::spec::FftSpec;
use crate::odometer::Odometer;
use crate::topology::Topology;

pub struct StridedFft {
    spec: FftSpec,
    direction: FftDirection,
    fft: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for StridedFft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StridedFft")
            .field("spec", &self.spec)
            .field("direction", &self.direction)
            .finish()
    }
}

impl StridedFft {
    pub fn new(spec: FftSpec, direction: FftDirection, backend: &dyn FftBackend) -> Self {
        assert!(spec.transform.n > 0, "FFT length must be positive");
        let fft = backend.plan(spec.transform.n, direction);
        Self {
            spec,
            direction,
            fft,
        }
    }

    pub fn spec(&self) -> &FftSpec {
        &self.spec
    }

    pub fn direction(&self) -> FftDirection {
        self.direction
    }

    fn offsets(&self) -> Odometer {
        let axes: Vec<(usize, usize, usize)> = self
            .spec
            .loops
            .iter()
            .map(|d| (d.n, d.input_stride, d.output_stride))
            .collect();
        Odometer::new(&axes, 0, 0)
    }

    /// Transforms `data` in place. Requires equal input/output strides.
    pub fn transform_in_place(&self, data: &mut [Complex<f64>]) {
        assert!(
            self.spec.is_in_place_compatible(),
            "in-place transform needs equal input and output strides: {:?}",
            self.spec
        );
        let span = self.spec.input_span();
        assert!(
            data.len() >= span,
            "buffer of {} values is shorter than the strided extent {}",
            data.len(),
            span
        );

        let n = self.spec.transform.n;
        if n == 1 {
            return;
        }
        let stride = self.spec.transform.input_stride;
        let zero = Complex::new(0.0, 0.0);
        let mut scratch = vec![zero; self.fft.get_inplace_scratch_len()];

        if stride == 1 {
            for (off, _) in self.offsets() {
                self.fft
                    .process_with_scratch(&mut data[off..off + n], &mut scratch);
            }
        } else {
            let mut line = vec![zero; n];
            for (off, _) in self.offsets() {
                for (k, z) in line.iter_mut().enumerate() {
                    *z = data[off + k * stride];
                }
                self.fft.process_with_scratch(&mut line, &mut scratch);
                for (k, z) in line.iter().enumerate() {
                    data[off + k * stride] = *z;
                }
            }
        }
    }

    /// Transforms `input` into `output`. Only the output positions the loops
    /// visit are written; everything else in `output` is left as is.
    pub fn transform(&self, input: &[Complex<f64>], output: &mut [Complex<f64>]) {
        assert_eq!(
            input.len(),
            output.len(),
            "out-of-place buffers differ in length"
        );
        let (in_span, out_span) = (self.spec.input_span(), self.spec.output_span());
        assert!(
            input.len() >= in_span && output.len() >= out_span,
            "buffers of {} values are shorter than the strided extents ({}, {})",
            input.len(),
            in_span,
            out_span
        );

        let t = self.spec.transform;
        let zero = Complex::new(0.0, 0.0);
        let mut line = vec![zero; t.n];
        let mut scratch = vec![zero; self.fft.get_inplace_scratch_len()];

        for (i_off, o_off) in self.offsets() {
            for (k, z) in line.iter_mut().enumerate() {
                *z = input[i_off + k * t.input_stride];
            }
            if t.n > 1 {
                self.fft.process_with_scratch(&mut line, &mut scratch);
            }
            for (k, z) in line.iter().enumerate() {
                output[o_off + k * t.output_stride] = *z;
            }
        }
    }

    /// Work estimate: `count * n * log2(n)` (zero for `n == 1`).
    pub fn cost(&self) -> f64 {
        let n = self.spec.transform.n as f64;
        self.spec.transform_count() as f64 * n * n.log2()
    }
}

/// Loop bound along an axis that still holds (or will only be read over)
/// the unpadded sample: `min(floor(p/2) + 1, p)`.
pub fn restricted_extent(p: usize) -> usize {
    (p / 2 + 1).min(p)
}

fn axis_order(dimension: usize, direction: FftDirection) -> Vec<usize> {
    match direction {
        FftDirection::Forward => (0..dimension).collect(),
        FftDirection::Inverse => (0..dimension).rev().collect(),
    }
}

/// One engine per axis, every loop at full extent, in execution order
/// (increasing axes forward, decreasing axes inverse).
pub fn full_extent_plan(
    topology: &Topology,
    direction: FftDirection,
    backend: &dyn FftBackend,
) -> Vec<StridedFft> {
    axis_order(topology.dimension(), direction)
        .into_iter()
        .map(|i| {
            let spec = FftSpec::along_axis(topology, i, |j| topology.cell_count(j));
            StridedFft::new(spec, direction, backend)
        })
        .collect()
}

/// One engine per axis with the loops along later axes cut to
/// [`restricted_extent`], in execution order.
///
/// Forward: the input must be zero outside the first `restricted_extent`
/// cells of every axis (a zero-padded sample); the result equals the full
/// transform everywhere.
///
/// Inverse: the result is exact only on the first `restricted_extent` cells
/// of every axis, which is all a caller cropping back to the sample reads.
pub fn restricted_plan(
    topology: &Topology,
    direction: FftDirection,
    backend: &dyn FftBackend,
) -> Vec<StridedFft> {
    axis_order(topology.dimension(), direction)
        .into_iter()
        .map(|i| {
            let spec = FftSpec::along_axis(topology, i, |j| {
                let p = topology.cell_count(j);
                if j > i {
                    restricted_extent(p)
                } else {
                    p
                }
            });
            StridedFft::new(spec, direction, backend)
        })
        .collect()
}

pub fn plan_cost(plan: &[StridedFft]) -> f64 {
    plan.iter().map(StridedFft::cost).sum()
}

/// Cost of `plan` relative to the full-extent plan over `topology`
/// (1.0 when the full plan is free, i.e. every axis has one cell).
pub fn relative_cost(plan: &[StridedFft], topology: &Topology) -> f64 {
    let total = topology.total_cell_count() as f64;
    let full: f64 = topology
        .cell_counts()
        .iter()
        .map(|&n| total * (n as f64).log2())
        .sum();
    if full == 0.0 {
        1.0
    } else {
        plan_cost(plan) / full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::backend::PortableBackend;
    use crate::fft::spec::FftDimension;
    use std::f64::consts::PI;

    fn xorshift_buffer(len: usize, mut seed: u64) -> Vec<Complex<f64>> {
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed >> 11) as f64 / (1u64 << 53) as f64 - 0.5
        };
        (0..len).map(|_| Complex::new(next(), next())).collect()
    }

    fn naive_dft(x: &[Complex<f64>], sign: f64) -> Vec<Complex<f64>> {
        let n = x.len();
        (0..n)
            .map(|k| {
                x.iter()
                    .enumerate()
                    .map(|(j, v)| {
                        let a = sign * 2.0 * PI * (j * k) as f64 / n as f64;
                        v * Complex::new(a.cos(), a.sin())
                    })
                    .sum::<Complex<f64>>()
            })
            .collect()
    }

    fn max_diff(a: &[Complex<f64>], b: &[Complex<f64>]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).norm()).fold(0.0, f64::max)
    }

    #[test]
    fn strided_axis_matches_naive_dft() {
        let t = Topology::new(&[4, 3, 2], &[1.0, 1.0, 1.0]);
        let data = xorshift_buffer(t.total_cell_count(), 7);
        let engine = StridedFft::new(
            FftSpec::along_axis(&t, 1, |j| t.cell_count(j)),
            FftDirection::Forward,
            &PortableBackend::new(),
        );
        let mut got = data.clone();
        engine.transform_in_place(&mut got);

        let mut want = data.clone();
        for x in 0..4 {
            for z in 0..2 {
                let idx: Vec<usize> = (0..3).map(|y| t.linear_index(&[x, y, z])).collect();
                let line: Vec<_> = idx.iter().map(|&i| data[i]).collect();
                for (i, v) in idx.iter().zip(naive_dft(&line, -1.0)) {
                    want[*i] = v;
                }
            }
        }
        assert!(max_diff(&got, &want) < 1e-12);
    }

    #[test]
    fn contiguous_axis_matches_naive_inverse() {
        let t = Topology::new(&[6, 2], &[1.0, 1.0]);
        let data = xorshift_buffer(12, 3);
        let engine = StridedFft::new(
            FftSpec::along_axis(&t, 0, |j| t.cell_count(j)),
            FftDirection::Inverse,
            &PortableBackend::new(),
        );
        let mut got = data.clone();
        engine.transform_in_place(&mut got);

        let mut want = naive_dft(&data[..6], 1.0);
        want.extend(naive_dft(&data[6..], 1.0));
        assert!(max_diff(&got, &want) < 1e-12);
    }

    #[test]
    fn out_of_place_writes_only_visited_positions() {
        // 3 lines of length 4 stored contiguously, written out transposed
        let spec = FftSpec::new(
            FftDimension::new(4, 1, 3),
            vec![FftDimension::new(3, 4, 1)],
        );
        let engine = StridedFft::new(spec, FftDirection::Forward, &PortableBackend::new());
        let input = xorshift_buffer(12, 11);
        let mut output = vec![Complex::new(9.0, 9.0); 12];
        engine.transform(&input, &mut output);

        for line in 0..3 {
            let want = naive_dft(&input[4 * line..4 * line + 4], -1.0);
            let got: Vec<_> = (0..4).map(|k| output[line + 3 * k]).collect();
            assert!(max_diff(&got, &want) < 1e-12);
        }

        // a restricted loop leaves the last output line untouched
        let spec = FftSpec::new(
            FftDimension::new(4, 1, 3),
            vec![FftDimension::new(2, 4, 1)],
        );
        let engine = StridedFft::new(spec, FftDirection::Forward, &PortableBackend::new());
        let mut output = vec![Complex::new(9.0, 9.0); 12];
        engine.transform(&input, &mut output);
        assert!((0..4).all(|k| output[2 + 3 * k] == Complex::new(9.0, 9.0)));
    }

    #[test]
    fn length_one_is_identity() {
        let t = Topology::new(&[1, 5], &[1.0, 1.0]);
        let data = xorshift_buffer(5, 5);
        let engine = StridedFft::new(
            FftSpec::along_axis(&t, 0, |j| t.cell_count(j)),
            FftDirection::Forward,
            &PortableBackend::new(),
        );
        let mut in_place = data.clone();
        engine.transform_in_place(&mut in_place);
        assert_eq!(in_place, data);

        let mut out = vec![Complex::new(0.0, 0.0); 5];
        engine.transform(&data, &mut out);
        assert_eq!(out, data);
        assert_eq!(engine.cost(), 0.0);
    }

    #[test]
    #[should_panic(expected = "shorter than the strided extent")]
    fn short_buffer_is_rejected() {
        let t = Topology::new(&[4, 4], &[1.0, 1.0]);
        let engine = StridedFft::new(
            FftSpec::along_axis(&t, 1, |j| t.cell_count(j)),
            FftDirection::Forward,
            &PortableBackend::new(),
        );
        let mut data = vec![Complex::new(0.0, 0.0); 15];
        engine.transform_in_place(&mut data);
    }

    #[test]
    #[should_panic(expected = "differ in length")]
    fn out_of_place_needs_equal_lengths() {
        let spec = FftSpec::new(FftDimension::in_place(4, 1), vec![]);
        let engine = StridedFft::new(spec, FftDirection::Forward, &PortableBackend::new());
        let input = vec![Complex::new(0.0, 0.0); 4];
        let mut output = vec![Complex::new(0.0, 0.0); 5];
        engine.transform(&input, &mut output);
    }

    #[test]
    fn round_trip_scales_by_cell_count() {
        let backend = PortableBackend::new();
        for counts in [vec![8], vec![5, 3], vec![4, 3, 2], vec![2, 1, 6]] {
            let sizes = vec![1.0; counts.len()];
            let t = Topology::new(&counts, &sizes);
            let data = xorshift_buffer(t.total_cell_count(), 13);
            let mut buf = data.clone();
            for e in full_extent_plan(&t, FftDirection::Forward, &backend) {
                e.transform_in_place(&mut buf);
            }
            for e in full_extent_plan(&t, FftDirection::Inverse, &backend) {
                e.transform_in_place(&mut buf);
            }
            let n = t.total_cell_count() as f64;
            let scaled: Vec<_> = data.iter().map(|z| z * n).collect();
            assert!(max_diff(&buf, &scaled) < 1e-10 * n, "counts {:?}", counts);
        }
    }

    #[test]
    fn axis_order_does_not_change_the_transform() {
        let backend = PortableBackend::new();
        let t = Topology::new(&[4, 3, 5], &[1.0, 1.0, 1.0]);
        let data = xorshift_buffer(t.total_cell_count(), 21);
        let mut forward_order = data.clone();
        for e in full_extent_plan(&t, FftDirection::Forward, &backend) {
            e.transform_in_place(&mut forward_order);
        }
        let mut reversed = data.clone();
        for e in full_extent_plan(&t, FftDirection::Forward, &backend).iter().rev() {
            e.transform_in_place(&mut reversed);
        }
        assert!(max_diff(&forward_order, &reversed) < 1e-10);
    }

    #[test]
    fn restricted_plans_agree_with_full_plans_on_padded_data() {
        let backend = PortableBackend::new();
        let sample = Topology::new(&[3, 2, 3], &[1.0, 1.0, 1.0]);
        let padded = Topology::new(&[6, 4, 5], &[1.0, 1.0, 1.0]);
        let data = sample.resize(&xorshift_buffer(sample.total_cell_count(), 5), &padded);

        let run = |plan: Vec<StridedFft>, mut buf: Vec<Complex<f64>>| {
            for e in &plan {
                e.transform_in_place(&mut buf);
            }
            buf
        };

        let full = run(full_extent_plan(&padded, FftDirection::Forward, &backend), data.clone());
        let fast = run(restricted_plan(&padded, FftDirection::Forward, &backend), data.clone());
        assert!(max_diff(&full, &fast) < 1e-12);

        let back_full = run(full_extent_plan(&padded, FftDirection::Inverse, &backend), full.clone());
        let back_fast = run(restricted_plan(&padded, FftDirection::Inverse, &backend), full);
        let crop = |v: &[Complex<f64>]| padded.resize(v, &sample);
        assert!(max_diff(&crop(&back_full), &crop(&back_fast)) < 1e-10);
    }

    #[test]
    fn restricted_cost_tends_to_seven_twelfths() {
        let backend = PortableBackend::new();
        let t = Topology::new(&[64, 64, 64], &[1.0, 1.0, 1.0]);
        let full = full_extent_plan(&t, FftDirection::Forward, &backend);
        assert!((relative_cost(&full, &t) - 1.0).abs() < 1e-12);

        let fast = restricted_plan(&t, FftDirection::Forward, &backend);
        let r = relative_cost(&fast, &t);
        assert!((r - 7.0 / 12.0).abs() < 0.015, "relative cost {}", r);

        let t2 = Topology::new(&[64, 64], &[1.0, 1.0]);
        let r2 = relative_cost(&restricted_plan(&t2, FftDirection::Forward, &backend), &t2);
        assert!((r2 - 0.75).abs() < 0.01, "relative cost {}", r2);
    }

    #[test]
    fn restricted_extent_never_exceeds_axis() {
        assert_eq!(restricted_extent(1), 1);
        assert_eq!(restricted_extent(2), 2);
        assert_eq!(restricted_extent(3), 2);
        assert_eq!(restricted_extent(8), 5);
    }
}

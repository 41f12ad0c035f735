// src/fft/spec.rs

use crate::topology::Topology;

/// One strided axis: `n` points, `input_stride` apart in the source buffer
/// and `output_stride` apart in the destination buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FftDimension {
    pub n: usize,
    pub input_stride: usize,
    pub output_stride: usize,
}

impl FftDimension {
    pub fn new(n: usize, input_stride: usize, output_stride: usize) -> Self {
        Self {
            n,
            input_stride,
            output_stride,
        }
    }

    /// Same stride on both sides.
    pub fn in_place(n: usize, stride: usize) -> Self {
        Self::new(n, stride, stride)
    }
}

/// A transform dimension plus the loop dimensions it is repeated over,
/// outermost loop first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FftSpec {
    pub transform: FftDimension,
    pub loops: Vec<FftDimension>,
}

impl FftSpec {
    pub fn new(transform: FftDimension, loops: Vec<FftDimension>) -> Self {
        Self { transform, loops }
    }

    /// Transform along `axis` of `topology`, looping over every other axis
    /// with `loop_extent(j)` points. Loops run from the highest axis
    /// (outermost) down to the lowest (fastest), matching the column-major
    /// layout.
    pub fn along_axis<F>(topology: &Topology, axis: usize, loop_extent: F) -> Self
    where
        F: Fn(usize) -> usize,
    {
        assert!(
            axis < topology.dimension(),
            "axis {} out of range for a {}-d topology",
            axis,
            topology.dimension()
        );
        let transform = FftDimension::in_place(topology.cell_count(axis), topology.stride(axis));
        let loops = (0..topology.dimension())
            .rev()
            .filter(|&j| j != axis)
            .map(|j| {
                let extent = loop_extent(j);
                assert!(
                    extent <= topology.cell_count(j),
                    "loop extent {} exceeds axis {} of {} cells",
                    extent,
                    j,
                    topology.cell_count(j)
                );
                FftDimension::in_place(extent, topology.stride(j))
            })
            .collect();
        Self { transform, loops }
    }

    /// Number of 1-D transforms per application.
    pub fn transform_count(&self) -> usize {
        self.loops.iter().map(|d| d.n).product()
    }

    /// Smallest buffer length covering every input index.
    pub fn input_span(&self) -> usize {
        self.span(|d| d.input_stride)
    }

    /// Smallest buffer length covering every output index.
    pub fn output_span(&self) -> usize {
        self.span(|d| d.output_stride)
    }

    pub fn is_in_place_compatible(&self) -> bool {
        std::iter::once(&self.transform)
            .chain(&self.loops)
            .all(|d| d.input_stride == d.output_stride)
    }

    fn span(&self, stride: impl Fn(&FftDimension) -> usize) -> usize {
        if self.loops.iter().any(|d| d.n == 0) {
            return 0;
        }
        1 + std::iter::once(&self.transform)
            .chain(&self.loops)
            .map(|d| (d.n - 1) * stride(d))
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn along_axis_orders_loops_outermost_first() {
        let t = Topology::new(&[4, 3, 2], &[1.0, 1.0, 1.0]);
        let s = FftSpec::along_axis(&t, 1, |j| t.cell_count(j));
        assert_eq!(s.transform, FftDimension::in_place(3, 4));
        assert_eq!(
            s.loops,
            vec![FftDimension::in_place(2, 12), FftDimension::in_place(4, 1)]
        );
        assert_eq!(s.transform_count(), 8);
        assert_eq!(s.input_span(), t.total_cell_count());
    }

    #[test]
    fn restricted_loops_shrink_the_span() {
        let t = Topology::new(&[4, 4], &[1.0, 1.0]);
        let s = FftSpec::along_axis(&t, 0, |_| 3);
        assert_eq!(s.transform_count(), 3);
        // last visited index: 3 * 1 + 2 * 4
        assert_eq!(s.input_span(), 12);
    }

    #[test]
    fn distinct_strides_are_not_in_place() {
        let s = FftSpec::new(FftDimension::new(4, 1, 2), vec![]);
        assert!(!s.is_in_place_compatible());
        assert_eq!(s.output_span(), 7);
    }

    #[test]
    #[should_panic(expected = "loop extent")]
    fn loop_extent_cannot_exceed_axis() {
        let t = Topology::new(&[4, 2], &[1.0, 1.0]);
        let _ = FftSpec::along_axis(&t, 0, |_| 3);
    }
}

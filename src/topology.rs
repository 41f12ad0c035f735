// src/topology.rs
//
// Rectilinear, uniformly spaced grid of arbitrary dimension (1..=3 in
// practice). Cells are addressed three ways:
//   - linear index:    column-major (axis 0 fastest)
//   - component index: integer tuple, shifted by `origin` (may be negative)
//   - position:        component index weighted with the cell size
//
// Padding and cropping of fields between topologies goes through `resize`;
// periodic re-centring of the demag kernel goes through `cyclic_shift`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;
use crate::odometer::Odometer;

/// Plain descriptor used for (de)serialisation; strides are derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyDescriptor {
    pub cell_count: Vec<usize>,
    pub cell_size: Vec<f64>,
    #[serde(default)]
    pub origin: Vec<i64>,
}

/// Discretised rectangular region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TopologyDescriptor", into = "TopologyDescriptor")]
pub struct Topology {
    cell_count: Vec<usize>,
    cell_size: Vec<f64>,
    origin: Vec<i64>,
    /// `dimension + 1` entries; the last one is the total cell count.
    stride: Vec<usize>,
}

impl Topology {
    /// Topology with origin 0. Panics on invalid input.
    pub fn new(cell_count: &[usize], cell_size: &[f64]) -> Self {
        Self::new_with_origin(cell_count, cell_size, &vec![0; cell_count.len()])
    }

    /// Panics on invalid input; see [`Topology::try_new`] for the checked form.
    pub fn new_with_origin(cell_count: &[usize], cell_size: &[f64], origin: &[i64]) -> Self {
        Self::try_new(cell_count, cell_size, origin)
            .unwrap_or_else(|e| panic!("invalid topology: {e}"))
    }

    /// Topology from the total edge lengths instead of the cell sizes.
    pub fn from_extent(extent: &[f64], cell_count: &[usize]) -> Self {
        assert_eq!(
            extent.len(),
            cell_count.len(),
            "from_extent: {} edge lengths for {} axes",
            extent.len(),
            cell_count.len()
        );
        let cell_size: Vec<f64> = extent
            .iter()
            .zip(cell_count)
            .map(|(&l, &n)| l / n as f64)
            .collect();
        Self::new(cell_count, &cell_size)
    }

    pub fn try_new(
        cell_count: &[usize],
        cell_size: &[f64],
        origin: &[i64],
    ) -> Result<Self, TopologyError> {
        if cell_count.is_empty() {
            return Err(TopologyError::Empty);
        }
        if cell_count.len() != cell_size.len() || cell_count.len() != origin.len() {
            return Err(TopologyError::DimensionMismatch {
                counts: cell_count.len(),
                sizes: cell_size.len(),
                origins: origin.len(),
            });
        }
        if let Some(axis) = cell_count.iter().position(|&n| n == 0) {
            return Err(TopologyError::ZeroCellCount { axis });
        }
        if let Some(axis) = cell_size.iter().position(|&s| !(s > 0.0 && s.is_finite())) {
            return Err(TopologyError::InvalidCellSize {
                axis,
                size: cell_size[axis],
            });
        }

        let mut stride = Vec::with_capacity(cell_count.len() + 1);
        stride.push(1);
        for (i, &n) in cell_count.iter().enumerate() {
            stride.push(stride[i] * n);
        }

        Ok(Self {
            cell_count: cell_count.to_vec(),
            cell_size: cell_size.to_vec(),
            origin: origin.to_vec(),
            stride,
        })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.cell_count.len()
    }

    #[inline]
    pub fn total_cell_count(&self) -> usize {
        self.stride[self.dimension()]
    }

    #[inline]
    pub fn cell_count(&self, axis: usize) -> usize {
        self.cell_count[axis]
    }

    pub fn cell_counts(&self) -> &[usize] {
        &self.cell_count
    }

    #[inline]
    pub fn cell_size(&self, axis: usize) -> f64 {
        self.cell_size[axis]
    }

    pub fn cell_sizes(&self) -> &[f64] {
        &self.cell_size
    }

    #[inline]
    pub fn origin(&self, axis: usize) -> i64 {
        self.origin[axis]
    }

    pub fn origins(&self) -> &[i64] {
        &self.origin
    }

    /// Stride of `axis`; `stride(dimension())` is the total cell count.
    #[inline]
    pub fn stride(&self, axis: usize) -> usize {
        self.stride[axis]
    }

    pub fn strides(&self) -> &[usize] {
        &self.stride
    }

    pub fn cell_volume(&self) -> f64 {
        self.cell_size.iter().product()
    }

    /// One past the highest component index along `axis`.
    #[inline]
    pub fn max_index(&self, axis: usize) -> i64 {
        self.origin[axis] + self.cell_count[axis] as i64
    }

    pub fn contains(&self, cidx: &[i64]) -> bool {
        cidx.len() == self.dimension()
            && cidx
                .iter()
                .enumerate()
                .all(|(i, &c)| c >= self.origin[i] && c < self.max_index(i))
    }

    /// Component index -> linear index.
    pub fn linear_index(&self, cidx: &[i64]) -> usize {
        debug_assert!(
            self.contains(cidx),
            "component index {:?} outside topology [{}]",
            cidx,
            self
        );
        cidx.iter()
            .enumerate()
            .map(|(i, &c)| (c - self.origin[i]) as usize * self.stride[i])
            .sum()
    }

    /// Linear index -> component index.
    pub fn component_index(&self, lidx: usize) -> Vec<i64> {
        debug_assert!(lidx < self.total_cell_count());
        (0..self.dimension())
            .map(|i| ((lidx % self.stride[i + 1]) / self.stride[i]) as i64 + self.origin[i])
            .collect()
    }

    /// Component index -> continuous position.
    pub fn position(&self, cidx: &[i64]) -> Vec<f64> {
        cidx.iter()
            .zip(&self.cell_size)
            .map(|(&c, &d)| c as f64 * d)
            .collect()
    }

    pub fn position_of(&self, lidx: usize) -> Vec<f64> {
        self.position(&self.component_index(lidx))
    }

    /// All cell displacements between two cells of `self`: `2n-1` cells per
    /// axis, origin `1-n`, so the zero displacement is at the centre.
    pub fn distance_topology(&self) -> Topology {
        let count: Vec<usize> = self.cell_count.iter().map(|&n| 2 * n - 1).collect();
        let origin: Vec<i64> = self.cell_count.iter().map(|&n| 1 - n as i64).collect();
        Topology::new_with_origin(&count, &self.cell_size, &origin)
    }

    /// Same shape and cell size, relocated origin.
    pub fn with_origin(&self, origin: &[i64]) -> Topology {
        assert_eq!(
            origin.len(),
            self.dimension(),
            "with_origin: origin has {} entries for a {}-d topology",
            origin.len(),
            self.dimension()
        );
        Topology {
            origin: origin.to_vec(),
            ..self.clone()
        }
    }

    pub fn reset_origin(&self) -> Topology {
        self.with_origin(&vec![0; self.dimension()])
    }

    /// Same origin and cell size, different cell counts.
    pub fn with_cell_count(&self, cell_count: &[usize]) -> Topology {
        Topology::new_with_origin(cell_count, &self.cell_size, &self.origin)
    }

    /// Copies `values` (laid out on `self`) onto `target`.
    ///
    /// Cells in the intersection of both index boxes are copied, cells only in
    /// `target` are zero (`T::default()`), cells only in `self` are dropped.
    pub fn resize<T: Copy + Default>(&self, values: &[T], target: &Topology) -> Vec<T> {
        assert_eq!(
            self.dimension(),
            target.dimension(),
            "resize: cannot map a {}-d topology onto a {}-d one",
            self.dimension(),
            target.dimension()
        );
        assert_eq!(
            values.len(),
            self.total_cell_count(),
            "resize: {} values for {} cells",
            values.len(),
            self.total_cell_count()
        );

        let mut out = vec![T::default(); target.total_cell_count()];
        let d = self.dimension();

        let mut start = vec![0i64; d];
        let mut interval = vec![0usize; d];
        for i in 0..d {
            let lo = self.origin[i].max(target.origin[i]);
            let hi = self.max_index(i).min(target.max_index(i));
            if hi <= lo {
                // disjoint boxes
                return out;
            }
            start[i] = lo;
            interval[i] = (hi - lo) as usize;
        }

        let row = interval[0];
        let axes: Vec<(usize, usize, usize)> = (1..d)
            .rev()
            .map(|k| (interval[k], self.stride[k], target.stride[k]))
            .collect();

        for (src, dst) in Odometer::new(&axes, self.linear_index(&start), target.linear_index(&start)) {
            out[dst..dst + row].copy_from_slice(&values[src..src + row]);
        }
        out
    }

    /// Periodic re-indexing: the value at absolute component index `c` moves
    /// to local index `(c - origin) mod n` of `self.with_origin(origin)`.
    pub fn cyclic_shift<T: Copy + Default>(&self, values: &[T], origin: &[i64]) -> Vec<T> {
        assert_eq!(
            origin.len(),
            self.dimension(),
            "cyclic_shift: origin has {} entries for a {}-d topology",
            origin.len(),
            self.dimension()
        );
        assert_eq!(values.len(), self.total_cell_count());

        let d = self.dimension();
        let mut out = vec![T::default(); values.len()];
        for (lidx, &v) in values.iter().enumerate() {
            let mut dst = 0usize;
            for k in 0..d {
                let n = self.cell_count[k] as i64;
                let c = ((lidx % self.stride[k + 1]) / self.stride[k]) as i64 + self.origin[k];
                dst += (c - origin[k]).rem_euclid(n) as usize * self.stride[k];
            }
            out[dst] = v;
        }
        out
    }
}

impl TryFrom<TopologyDescriptor> for Topology {
    type Error = TopologyError;

    fn try_from(d: TopologyDescriptor) -> Result<Self, Self::Error> {
        let origin = if d.origin.is_empty() {
            vec![0; d.cell_count.len()]
        } else {
            d.origin
        };
        Topology::try_new(&d.cell_count, &d.cell_size, &origin)
    }
}

impl From<Topology> for TopologyDescriptor {
    fn from(t: Topology) -> Self {
        TopologyDescriptor {
            cell_count: t.cell_count,
            cell_size: t.cell_size,
            origin: t.origin,
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "origin {:?}, cell count {:?}, cell size {:?}",
            self.origin, self.cell_count, self.cell_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Topology {
        Topology::new_with_origin(&[3, 3, 2], &[4.0 / 3.0, 5.0 / 3.0, 0.5], &[-1, 0, 0])
    }

    #[test]
    fn strides_are_column_major() {
        let t = sample();
        assert_eq!(t.stride(0), 1);
        assert_eq!(t.stride(1), 3);
        assert_eq!(t.stride(2), 9);
        assert_eq!(t.stride(3), t.total_cell_count());
        assert_eq!(t.total_cell_count(), 18);
        assert_eq!(t.dimension(), 3);
    }

    #[test]
    fn index_conversions_respect_origin() {
        let t = sample();
        assert_eq!(t.component_index(14), vec![1, 1, 1]);
        assert_eq!(t.linear_index(&[1, 2, 1]), 17);
        for lidx in 0..t.total_cell_count() {
            assert_eq!(t.linear_index(&t.component_index(lidx)), lidx);
        }
    }

    #[test]
    fn contains_checks_every_axis() {
        let t = sample();
        assert!(t.contains(&[1, 2, 1]));
        assert!(t.contains(&[-1, 2, 1]));
        assert!(!t.contains(&[-2, 2, 2]));
        assert!(!t.contains(&[-2, 2, 0]));
    }

    #[test]
    fn distance_topology_is_centred() {
        let d = sample().distance_topology();
        assert_eq!(d.total_cell_count(), 75);
        assert_eq!(d.linear_index(&[0, 0, 0]), 37);
        assert_eq!(d.origins(), &[-2, -2, -1]);
    }

    #[test]
    fn from_extent_divides_edge_lengths() {
        let t = Topology::from_extent(&[4.0, 5.0, 1.0], &[4, 5, 2]);
        assert_eq!(t.cell_sizes(), &[1.0, 1.0, 0.5]);
        assert!((t.cell_volume() - 0.5).abs() < 1e-15);
        assert_eq!(t.position(&[2, -1, 3]), vec![2.0, -1.0, 1.5]);
    }

    #[test]
    fn equality_compares_origin() {
        let a = Topology::new(&[2, 2, 1], &[1.0, 1.0, 1.0]);
        let b = a.with_origin(&[0, 0, 0]);
        let c = a.with_origin(&[1, 0, 0]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn try_new_rejects_bad_descriptors() {
        assert_eq!(Topology::try_new(&[], &[], &[]), Err(TopologyError::Empty));
        assert_eq!(
            Topology::try_new(&[2, 0], &[1.0, 1.0], &[0, 0]),
            Err(TopologyError::ZeroCellCount { axis: 1 })
        );
        assert!(matches!(
            Topology::try_new(&[2, 2], &[1.0, -1.0], &[0, 0]),
            Err(TopologyError::InvalidCellSize { axis: 1, .. })
        ));
        assert!(matches!(
            Topology::try_new(&[2, 2], &[1.0], &[0, 0]),
            Err(TopologyError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn resize_pads_and_crops() {
        let small = Topology::new(&[2, 2], &[1.0, 1.0]);
        let large = Topology::new(&[3, 4], &[1.0, 1.0]);
        let values = vec![1, 2, 3, 4];

        let padded = small.resize(&values, &large);
        assert_eq!(padded, vec![1, 2, 0, 3, 4, 0, 0, 0, 0, 0, 0, 0]);

        let cropped = large.resize(&padded, &small);
        assert_eq!(cropped, values);
    }

    #[test]
    fn resize_uses_origin_offsets() {
        // target starts one cell further along axis 0: drops column 0, pads the right
        let src = Topology::new(&[3, 1], &[1.0, 1.0]);
        let dst = Topology::new_with_origin(&[3, 1], &[1.0, 1.0], &[1, 0]);
        assert_eq!(src.resize(&[1.0, 2.0, 3.0], &dst), vec![2.0, 3.0, 0.0]);

        let far = Topology::new_with_origin(&[3, 1], &[1.0, 1.0], &[5, 0]);
        assert_eq!(src.resize(&[1.0, 2.0, 3.0], &far), vec![0.0; 3]);
    }

    #[test]
    #[should_panic(expected = "resize")]
    fn resize_rejects_dimension_mismatch() {
        let a = Topology::new(&[2, 2], &[1.0, 1.0]);
        let b = Topology::new(&[2, 2, 1], &[1.0, 1.0, 1.0]);
        let _ = a.resize(&[0.0; 4], &b);
    }

    #[test]
    fn cyclic_shift_moves_zero_displacement_to_index_zero() {
        let t = Topology::new(&[2], &[1.0]).distance_topology(); // origin -1, 3 cells
        // values tagged with their component index
        let values: Vec<i64> = (0..3).map(|l| t.component_index(l)[0]).collect();
        assert_eq!(values, vec![-1, 0, 1]);

        let shifted = t.cyclic_shift(&values, &[0]);
        assert_eq!(shifted, vec![0, 1, -1]);
    }

    #[test]
    fn descriptor_round_trips_through_json() {
        let t = sample();
        let json = serde_json::to_string(&t).unwrap();
        let back: Topology = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);

        let bad = r#"{"cell_count":[2,0],"cell_size":[1.0,1.0]}"#;
        assert!(serde_json::from_str::<Topology>(bad).is_err());

        let no_origin = r#"{"cell_count":[2,3],"cell_size":[1.0,2.0]}"#;
        let t2: Topology = serde_json::from_str(no_origin).unwrap();
        assert_eq!(t2.origins(), &[0, 0]);
    }
}

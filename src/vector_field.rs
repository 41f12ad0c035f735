// src/vector_field.rs

use rayon::prelude::*;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::complex_field::ComplexVectorField;
use crate::error::FieldError;
use crate::topology::Topology;

/// Real 3-component field (magnetisation or effective field) on a topology.
/// Each cell stores (vx, vy, vz); cells are in the topology's linear order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VectorFieldRepr")]
pub struct VectorField {
    pub topology: Topology,
    pub data: Vec<[f64; 3]>,
}

#[derive(Deserialize)]
struct VectorFieldRepr {
    topology: Topology,
    data: Vec<[f64; 3]>,
}

impl TryFrom<VectorFieldRepr> for VectorField {
    type Error = FieldError;

    fn try_from(r: VectorFieldRepr) -> Result<Self, Self::Error> {
        VectorField::from_data(r.topology, r.data)
    }
}

impl VectorField {
    /// All-zero field.
    pub fn zeros(topology: Topology) -> Self {
        Self::uniform(topology, [0.0, 0.0, 0.0])
    }

    /// Every cell set to `v`.
    pub fn uniform(topology: Topology, v: [f64; 3]) -> Self {
        let n = topology.total_cell_count();
        Self {
            topology,
            data: vec![v; n],
        }
    }

    pub fn from_data(topology: Topology, data: Vec<[f64; 3]>) -> Result<Self, FieldError> {
        if data.len() != topology.total_cell_count() {
            return Err(FieldError::LengthMismatch {
                expected: topology.total_cell_count(),
                got: data.len(),
            });
        }
        Ok(Self { topology, data })
    }

    /// Field built from a function of the component index of each cell.
    pub fn from_fn<F>(topology: Topology, f: F) -> Self
    where
        F: Fn(&[i64]) -> [f64; 3],
    {
        let data = (0..topology.total_cell_count())
            .map(|lidx| f(&topology.component_index(lidx)))
            .collect();
        Self { topology, data }
    }

    #[inline]
    pub fn value(&self, component: usize, lidx: usize) -> f64 {
        self.data[lidx][component]
    }

    pub fn add(&self, other: &VectorField) -> VectorField {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &VectorField) -> VectorField {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn scale(&self, factor: f64) -> VectorField {
        VectorField {
            topology: self.topology.clone(),
            data: self
                .data
                .iter()
                .map(|v| [factor * v[0], factor * v[1], factor * v[2]])
                .collect(),
        }
    }

    fn zip_with(&self, other: &VectorField, op: impl Fn(f64, f64) -> f64) -> VectorField {
        assert_eq!(
            self.topology, other.topology,
            "vector field arithmetic needs equal topologies"
        );
        VectorField {
            topology: self.topology.clone(),
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| [op(a[0], b[0]), op(a[1], b[1]), op(a[2], b[2])])
                .collect(),
        }
    }

    /// Zero-pad / crop onto `target` (see [`Topology::resize`]).
    pub fn resize(&self, target: &Topology) -> VectorField {
        VectorField {
            topology: target.clone(),
            data: self.topology.resize(&self.data, target),
        }
    }

    /// Same values, topology replaced by one of identical shape (e.g. another origin).
    pub fn relabel(self, topology: Topology) -> VectorField {
        assert_eq!(
            self.topology.cell_counts(),
            topology.cell_counts(),
            "relabel: cell counts differ"
        );
        VectorField {
            topology,
            data: self.data,
        }
    }

    /// Complex copy with zero imaginary part.
    pub fn to_complex(&self) -> ComplexVectorField {
        let component = |c: usize| -> Vec<Complex<f64>> {
            self.data
                .par_iter()
                .map(|v| Complex::new(v[c], 0.0))
                .collect()
        };
        ComplexVectorField::new(
            self.topology.clone(),
            [component(0), component(1), component(2)],
        )
    }

    /// Mean over all cells.
    pub fn average(&self) -> [f64; 3] {
        let mut sum = [0.0; 3];
        for v in &self.data {
            sum[0] += v[0];
            sum[1] += v[1];
            sum[2] += v[2];
        }
        let n = self.data.len() as f64;
        [sum[0] / n, sum[1] / n, sum[2] / n]
    }

    /// Largest |a - b| over all cells and components.
    pub fn max_abs_diff(&self, other: &VectorField) -> f64 {
        assert_eq!(self.topology, other.topology);
        self.data
            .iter()
            .zip(&other.data)
            .flat_map(|(a, b)| (0..3).map(move |c| (a[c] - b[c]).abs()))
            .fold(0.0, f64::max)
    }

    /// Largest |v| component over all cells.
    pub fn max_abs(&self) -> f64 {
        self.data
            .iter()
            .flat_map(|v| v.iter().map(|x| x.abs()))
            .fold(0.0, f64::max)
    }

    /// Topologies equal and every component within `tolerance`.
    pub fn approx_eq(&self, other: &VectorField, tolerance: f64) -> bool {
        self.topology == other.topology && self.max_abs_diff(other) <= tolerance
    }
}

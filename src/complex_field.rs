// src/complex_field.rs
//
// Complex 3-component field, stored one buffer per component so that each
// component can be handed to the strided FFT engine as a flat slice.

use rayon::prelude::*;
use rustfft::num_complex::Complex;

use crate::fft::StridedFft;
use crate::topology::Topology;
use crate::vector_field::VectorField;

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexVectorField {
    pub topology: Topology,
    pub components: [Vec<Complex<f64>>; 3],
}

impl ComplexVectorField {
    pub fn new(topology: Topology, components: [Vec<Complex<f64>>; 3]) -> Self {
        for (c, v) in components.iter().enumerate() {
            assert_eq!(
                v.len(),
                topology.total_cell_count(),
                "component {} has {} values for {} cells",
                c,
                v.len(),
                topology.total_cell_count()
            );
        }
        Self {
            topology,
            components,
        }
    }

    pub fn zeros(topology: Topology) -> Self {
        let n = topology.total_cell_count();
        let zero = Complex::new(0.0, 0.0);
        Self {
            topology,
            components: [vec![zero; n], vec![zero; n], vec![zero; n]],
        }
    }

    #[inline]
    pub fn value(&self, component: usize, lidx: usize) -> Complex<f64> {
        self.components[component][lidx]
    }

    /// Runs `plan` (engines applied in slice order) on every component.
    ///
    /// Consumes the field: the buffers are transformed in place and handed
    /// back, so no other owner can observe the intermediate state.
    pub fn transformed(mut self, plan: &[StridedFft]) -> Self {
        self.components.par_iter_mut().for_each(|buf| {
            for engine in plan {
                engine.transform_in_place(buf);
            }
        });
        self
    }

    /// Real part of every component.
    pub fn to_real(&self) -> VectorField {
        let data = (0..self.topology.total_cell_count())
            .into_par_iter()
            .map(|i| {
                [
                    self.components[0][i].re,
                    self.components[1][i].re,
                    self.components[2][i].re,
                ]
            })
            .collect();
        VectorField {
            topology: self.topology.clone(),
            data,
        }
    }

    /// Zero-pad / crop onto `target`.
    pub fn resize(&self, target: &Topology) -> ComplexVectorField {
        let c = |i: usize| self.topology.resize(&self.components[i], target);
        ComplexVectorField {
            topology: target.clone(),
            components: [c(0), c(1), c(2)],
        }
    }

    pub fn scale(&self, factor: f64) -> ComplexVectorField {
        let c = |i: usize| -> Vec<Complex<f64>> {
            self.components[i].iter().map(|z| *z * factor).collect()
        };
        ComplexVectorField {
            topology: self.topology.clone(),
            components: [c(0), c(1), c(2)],
        }
    }

    /// Largest |a - b| (complex modulus) over all cells and components.
    pub fn max_abs_diff(&self, other: &ComplexVectorField) -> f64 {
        assert_eq!(self.topology, other.topology);
        self.components
            .iter()
            .zip(&other.components)
            .flat_map(|(a, b)| a.iter().zip(b).map(|(x, y)| (x - y).norm()))
            .fold(0.0, f64::max)
    }
}

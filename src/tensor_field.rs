// src/tensor_field.rs
//
// Complex 3x3 tensor field. Only the independent components are stored;
// `map[3 * j + k]` names the stored component holding entry (j, k).

use rayon::prelude::*;
use rustfft::num_complex::Complex;

use crate::complex_field::ComplexVectorField;
use crate::fft::StridedFft;
use crate::topology::Topology;

/// Symmetric tensor stored as (xx, xy, xz, yy, yz, zz).
pub const SYMMETRIC_MAP: [usize; 9] = [0, 1, 2, 1, 3, 4, 2, 4, 5];

/// Full tensor stored row-major.
pub const FULL_MAP: [usize; 9] = [0, 1, 2, 3, 4, 5, 6, 7, 8];

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexTensorField {
    pub topology: Topology,
    components: Vec<Vec<Complex<f64>>>,
    map: [usize; 9],
}

impl ComplexTensorField {
    pub fn new(topology: Topology, components: Vec<Vec<Complex<f64>>>, map: [usize; 9]) -> Self {
        assert!(
            map.iter().all(|&m| m < components.len()),
            "tensor map {:?} refers past {} stored components",
            map,
            components.len()
        );
        for v in &components {
            assert_eq!(v.len(), topology.total_cell_count());
        }
        Self {
            topology,
            components,
            map,
        }
    }

    /// Symmetric tensor from real (xx, xy, xz, yy, yz, zz) values per cell.
    pub fn symmetric_from_real(topology: Topology, values: &[[f64; 6]]) -> Self {
        assert_eq!(values.len(), topology.total_cell_count());
        let components = (0..6)
            .map(|c| values.iter().map(|v| Complex::new(v[c], 0.0)).collect())
            .collect();
        Self::new(topology, components, SYMMETRIC_MAP)
    }

    pub fn map(&self) -> &[usize; 9] {
        &self.map
    }

    pub fn stored_components(&self) -> usize {
        self.components.len()
    }

    pub fn component(&self, c: usize) -> &[Complex<f64>] {
        &self.components[c]
    }

    /// Entry (j, k) at linear index `lidx`.
    #[inline]
    pub fn entry(&self, j: usize, k: usize, lidx: usize) -> Complex<f64> {
        self.components[self.map[3 * j + k]][lidx]
    }

    pub fn scale(mut self, factor: f64) -> Self {
        self.components.par_iter_mut().for_each(|c| {
            for z in c.iter_mut() {
                *z *= factor;
            }
        });
        self
    }

    /// Zero-pad / crop every stored component onto `target`.
    pub fn resize(&self, target: &Topology) -> Self {
        let components = self
            .components
            .iter()
            .map(|c| self.topology.resize(c, target))
            .collect();
        Self {
            topology: target.clone(),
            components,
            map: self.map,
        }
    }

    /// Periodic re-indexing to a new origin (see [`Topology::cyclic_shift`]).
    pub fn cyclic_shift_to(&self, origin: &[i64]) -> Self {
        let components = self
            .components
            .iter()
            .map(|c| self.topology.cyclic_shift(c, origin))
            .collect();
        Self {
            topology: self.topology.with_origin(origin),
            components,
            map: self.map,
        }
    }

    /// Runs `plan` on every stored component, in place.
    pub fn transformed(mut self, plan: &[StridedFft]) -> Self {
        self.components.par_iter_mut().for_each(|buf| {
            for engine in plan {
                engine.transform_in_place(buf);
            }
        });
        self
    }

    /// Cell-wise tensor-vector product `out[j] = sum_k T[j][k] * v[k]`.
    pub fn times(&self, v: &ComplexVectorField) -> ComplexVectorField {
        assert_eq!(
            self.topology, v.topology,
            "tensor and vector field live on different topologies"
        );

        let mut out: [Vec<Complex<f64>>; 3] = Default::default();
        out.par_iter_mut().enumerate().for_each(|(j, o)| {
            let t0 = &self.components[self.map[3 * j]];
            let t1 = &self.components[self.map[3 * j + 1]];
            let t2 = &self.components[self.map[3 * j + 2]];
            let [v0, v1, v2] = &v.components;
            *o = (0..v0.len())
                .map(|i| t0[i] * v0[i] + t1[i] * v1[i] + t2[i] * v2[i])
                .collect();
        });

        ComplexVectorField::new(self.topology.clone(), out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex<f64> {
        Complex::new(re, im)
    }

    fn pairs(v: &[f64]) -> Vec<Complex<f64>> {
        v.chunks(2).map(|p| c(p[0], p[1])).collect()
    }

    #[test]
    fn full_tensor_times_vector() {
        let t = Topology::new(&[2, 1, 1], &[1.0, 1.0, 1.0]);
        let vf = ComplexVectorField::new(
            t.clone(),
            [
                pairs(&[1.0, 0.0, 0.0, 2.0]),
                pairs(&[2.0, 3.0, 4.0, 5.0]),
                pairs(&[4.0, 5.0, 6.0, 2.0]),
            ],
        );
        let rows = [
            [3.0, 4.0, 5.0, 6.0],
            [3.0, 5.0, 6.0, 7.0],
            [5.0, 0.0, 0.0, 8.0],
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 7.0, 3.0, 8.0],
            [2.0, 4.0, 4.0, 5.0],
            [1.0, 1.0, 3.0, 3.0],
            [4.0, 4.0, 2.0, 4.0],
            [6.0, 6.0, 6.0, 8.0],
        ];
        let tf = ComplexTensorField::new(t, rows.iter().map(|r| pairs(r)).collect(), FULL_MAP);

        let result = tf.times(&vf);
        assert_eq!(result.components[0], pairs(&[14.0, 48.0, -39.0, 116.0]));
        assert_eq!(result.components[1], pairs(&[-22.0, 57.0, -22.0, 91.0]));
        assert_eq!(result.components[2], pairs(&[-9.0, 75.0, 2.0, 92.0]));
    }

    #[test]
    fn symmetric_map_mirrors_off_diagonals() {
        let t = Topology::new(&[1, 1, 1], &[1.0, 1.0, 1.0]);
        let tf = ComplexTensorField::symmetric_from_real(t, &[[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]]);
        for j in 0..3 {
            for k in 0..3 {
                assert_eq!(tf.entry(j, k, 0), tf.entry(k, j, 0));
            }
        }
        assert_eq!(tf.entry(2, 1, 0), c(5.0, 0.0));
        assert_eq!(tf.stored_components(), 6);
    }

    #[test]
    fn resize_then_shift_centres_the_kernel() {
        // 1-d distance topology of a 2-cell sample: displacements -1, 0, 1
        let d = Topology::new(&[2, 1, 1], &[1.0, 1.0, 1.0]).distance_topology();
        let values: Vec<[f64; 6]> = (0..3).map(|i| [i as f64 - 1.0; 6]).collect();
        let tf = ComplexTensorField::symmetric_from_real(d.clone(), &values);

        let padded = tf
            .resize(&d.with_cell_count(&[4, 1, 1]))
            .cyclic_shift_to(&[0, 0, 0]);
        let xx: Vec<f64> = padded.component(0).iter().map(|z| z.re).collect();
        // displacement d sits at index d mod 4; index 2 is the padding cell
        assert_eq!(xx, vec![0.0, 1.0, 0.0, -1.0]);
        assert_eq!(padded.topology.origins(), &[0, 0, 0]);
    }

    #[test]
    fn scale_multiplies_every_component() {
        let t = Topology::new(&[1, 1, 1], &[1.0, 1.0, 1.0]);
        let tf = ComplexTensorField::symmetric_from_real(t, &[[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]])
            .scale(-0.5);
        assert_eq!(tf.entry(0, 0, 0), c(-0.5, 0.0));
        assert_eq!(tf.entry(2, 2, 0), c(-3.0, 0.0));
    }
}

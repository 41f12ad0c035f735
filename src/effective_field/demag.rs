// src/effective_field/demag.rs
//
// Magnetostatic (demagnetising) field via FFT-accelerated convolution.
//
// We compute (discrete linear convolution, open boundaries):
//   H_i(x) = - sum_y N_ij(x - y) M_j(y)
// with the Newell tensor N of the cell shape. H comes out in the units of M.
//
// Build:
// - evaluate N over every displacement between two sample cells
//   (the distance topology, 2n-1 cells per axis);
// - optionally zero-extend each axis to a multiple of 4 (1 stays 1);
// - cyclically shift so the zero displacement sits at index 0;
// - forward FFT at full extent, scaled by -1/P (P = padded cell count) so the
//   unnormalised inverse needs no extra pass.
//
// Evaluate:
// - pad M onto the internal topology, forward FFT per component;
// - per cell h_j = sum_k N_jk m_k in frequency space;
// - inverse FFT per component, real part, crop.
//
// With restricted loop bounds the per-axis engines skip lines that are known
// to be zero (forward) or that are cropped away afterwards (inverse). In 3-D
// this brings the transform work to about 7/12 of the full-extent plans.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::effective_field::newell::demag_tensor;
use crate::effective_field::{FieldTerm, State};
use crate::fft::{
    full_extent_plan, relative_cost, restricted_plan, FftBackend, FftDirection, StridedFft,
};
use crate::tensor_field::ComplexTensorField;
use crate::topology::Topology;
use crate::vector_field::VectorField;

/// Size of the internal (padded) topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// Exactly `2n - 1` cells per axis.
    None,
    /// `2n - 1` rounded up to a multiple of 4 (axes of one cell stay at one).
    MultipleOfFour,
}

impl Padding {
    /// Internal cell count of an axis with `n` sample cells.
    pub fn padded_count(self, n: usize) -> usize {
        let distance = 2 * n - 1;
        match self {
            Padding::None => distance,
            Padding::MultipleOfFour if distance == 1 => 1,
            Padding::MultipleOfFour => distance.div_ceil(4) * 4,
        }
    }
}

/// Loop extents of the per-axis FFT engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopBounds {
    Full,
    Restricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemagConfig {
    pub padding: Padding,
    pub loop_bounds: LoopBounds,
}

impl DemagConfig {
    /// Padded to multiples of 4, restricted loops.
    pub fn optimized() -> Self {
        Self {
            padding: Padding::MultipleOfFour,
            loop_bounds: LoopBounds::Restricted,
        }
    }

    /// No padding beyond `2n - 1`, full loops. Slow; used to cross-check.
    pub fn reference() -> Self {
        Self {
            padding: Padding::None,
            loop_bounds: LoopBounds::Full,
        }
    }
}

impl Default for DemagConfig {
    fn default() -> Self {
        Self::optimized()
    }
}

/// Demag field solver for one fixed topology.
///
/// Immutable after construction; `compute_field` takes `&self` and allocates
/// its own buffers, so one solver can serve several threads.
#[derive(Debug)]
pub struct DemagField {
    topology: Topology,
    /// `topology` with origin 0; the region of `internal` that holds the sample.
    sample: Topology,
    internal: Topology,
    kernel: ComplexTensorField,
    forward: Vec<StridedFft>,
    /// In execution order (highest axis first).
    inverse: Vec<StridedFft>,
    config: DemagConfig,
    backend: &'static str,
}

impl DemagField {
    /// Optimised solver (see [`DemagConfig::optimized`]).
    pub fn new(topology: &Topology, backend: &dyn FftBackend) -> Self {
        Self::with_config(topology, backend, DemagConfig::optimized())
    }

    pub fn with_config(topology: &Topology, backend: &dyn FftBackend, config: DemagConfig) -> Self {
        assert_eq!(
            topology.dimension(),
            3,
            "demag field needs a 3-d topology, got {}-d",
            topology.dimension()
        );
        let span = tracing::info_span!("demag_build", cells = topology.total_cell_count());
        let _enter = span.enter();
        let t_total = Instant::now();

        let sample = topology.reset_origin();

        let t_kernel = Instant::now();
        let kernel = demag_tensor(&sample);
        tracing::debug!(
            elapsed_s = t_kernel.elapsed().as_secs_f64(),
            displacements = kernel.topology.total_cell_count(),
            "newell tensor evaluated"
        );

        let counts: Vec<usize> = sample
            .cell_counts()
            .iter()
            .map(|&n| config.padding.padded_count(n))
            .collect();
        let internal = Topology::new(&counts, sample.cell_sizes());

        // zero-extend past the largest positive displacement, then wrap the
        // negative displacements to the top of each axis
        let kernel = kernel
            .resize(&kernel.topology.with_cell_count(&counts))
            .cyclic_shift_to(&vec![0; internal.dimension()]);
        debug_assert_eq!(kernel.topology, internal);

        let t_fft = Instant::now();
        let kernel = kernel
            .transformed(&full_extent_plan(&internal, FftDirection::Forward, backend))
            .scale(-1.0 / internal.total_cell_count() as f64);
        tracing::debug!(
            elapsed_s = t_fft.elapsed().as_secs_f64(),
            "kernel transformed"
        );

        let (forward, inverse) = match config.loop_bounds {
            LoopBounds::Full => (
                full_extent_plan(&internal, FftDirection::Forward, backend),
                full_extent_plan(&internal, FftDirection::Inverse, backend),
            ),
            LoopBounds::Restricted => (
                restricted_plan(&internal, FftDirection::Forward, backend),
                restricted_plan(&internal, FftDirection::Inverse, backend),
            ),
        };

        let solver = Self {
            topology: topology.clone(),
            sample,
            internal,
            kernel,
            forward,
            inverse,
            config,
            backend: backend.name(),
        };

        tracing::info!(
            sample = ?solver.topology.cell_counts(),
            internal = ?solver.internal.cell_counts(),
            padding = ?config.padding,
            loop_bounds = ?config.loop_bounds,
            backend = solver.backend,
            relative_cost = solver.relative_cost(),
            elapsed_s = t_total.elapsed().as_secs_f64(),
            "demag solver ready"
        );
        solver
    }

    /// Unpadded, full-loop solver (see [`DemagConfig::reference`]).
    pub fn reference(topology: &Topology, backend: &dyn FftBackend) -> Self {
        Self::with_config(topology, backend, DemagConfig::reference())
    }

    /// Demagnetising field of `m`. `m` must live on the construction topology.
    pub fn compute_field(&self, m: &VectorField) -> VectorField {
        assert_eq!(
            m.topology, self.topology,
            "magnetisation topology [{}] differs from solver topology [{}]",
            m.topology, self.topology
        );

        let padded = VectorField {
            topology: self.internal.clone(),
            data: self.sample.resize(&m.data, &self.internal),
        };
        let m_hat = padded.to_complex().transformed(&self.forward);
        let h = self.kernel.times(&m_hat).transformed(&self.inverse).to_real();

        VectorField {
            topology: self.topology.clone(),
            data: self.internal.resize(&h.data, &self.sample),
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Padded, origin-0 topology the convolution runs on.
    pub fn internal_topology(&self) -> &Topology {
        &self.internal
    }

    pub fn config(&self) -> DemagConfig {
        self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend
    }

    /// Forward transform work relative to full-extent loops on the internal
    /// topology (the inverse plan costs the same).
    pub fn relative_cost(&self) -> f64 {
        relative_cost(&self.forward, &self.internal)
    }

    /// Transformed kernel, already scaled by `-1/P`.
    pub fn kernel(&self) -> &ComplexTensorField {
        &self.kernel
    }
}

impl FieldTerm for DemagField {
    fn compute_field(&self, state: &State) -> VectorField {
        DemagField::compute_field(self, &state.magnetization)
    }

    fn name(&self) -> &'static str {
        "demag"
    }
}

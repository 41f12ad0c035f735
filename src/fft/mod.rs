// src/fft/mod.rs
//
// Strided multi-axis FFT: a 1-D transform along one axis of a flat buffer,
// repeated at every offset generated by a list of loop axes. The demag solver
// builds one engine per axis and chains them.

pub mod backend;
pub mod engine;
pub mod spec;

pub use backend::{create_backend, AcceleratedBackend, BackendKind, FftBackend, PortableBackend};
pub use engine::{
    full_extent_plan, plan_cost, relative_cost, restricted_extent, restricted_plan, StridedFft,
};
pub use rustfft::FftDirection;
pub use spec::{FftDimension, FftSpec};

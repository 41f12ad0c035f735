// src/fft/backend.rs
//
// Source of 1-D FFT plans. Engines receive the backend explicitly; there is
// no process-wide factory. The accelerated (AVX) backend is optional: when
// the CPU lacks it, `create_backend` logs and falls back to the portable one.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rustfft::{Fft, FftDirection, FftPlannerAvx, FftPlannerScalar};
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Environment variable that overrides the configured backend.
pub const BACKEND_ENV_VAR: &str = "LLG_DEMAG_FFT_BACKEND";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Scalar rustfft algorithms, available everywhere.
    Portable,
    /// AVX rustfft algorithms (x86_64 with AVX + FMA).
    #[default]
    Accelerated,
}

impl BackendKind {
    /// Backend named by `LLG_DEMAG_FFT_BACKEND`, `None` when unset or empty.
    pub fn from_env() -> Result<Option<Self>, BackendError> {
        match std::env::var(BACKEND_ENV_VAR) {
            Ok(s) if !s.trim().is_empty() => s.parse().map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Portable => "portable",
            BackendKind::Accelerated => "accelerated",
        }
    }
}

impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portable" | "scalar" => Ok(BackendKind::Portable),
            "accelerated" | "avx" => Ok(BackendKind::Accelerated),
            _ => Err(BackendError::UnknownName(s.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plans 1-D complex transforms of a given length and direction.
///
/// Plans are unnormalised in both directions (rustfft convention).
pub trait FftBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> BackendKind;

    fn plan(&self, len: usize, direction: FftDirection) -> Arc<dyn Fft<f64>>;
}

// Planners are created per call; engines plan a handful of lengths once, at
// build time.
#[derive(Debug, Clone, Copy)]
pub struct PortableBackend;

impl PortableBackend {
    pub fn new() -> Self {
        PortableBackend
    }
}

impl Default for PortableBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FftBackend for PortableBackend {
    fn name(&self) -> &'static str {
        "rustfft-scalar"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Portable
    }

    fn plan(&self, len: usize, direction: FftDirection) -> Arc<dyn Fft<f64>> {
        FftPlannerScalar::new().plan_fft(len, direction)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AcceleratedBackend {
    _probed: (),
}

impl AcceleratedBackend {
    /// Fails when the CPU lacks AVX + FMA (or the target is not x86_64).
    pub fn new() -> Result<Self, BackendError> {
        FftPlannerAvx::<f64>::new().map_err(|_| {
            BackendError::Unavailable("AVX and FMA are not supported on this CPU".to_string())
        })?;
        Ok(Self { _probed: () })
    }
}

impl FftBackend for AcceleratedBackend {
    fn name(&self) -> &'static str {
        "rustfft-avx"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Accelerated
    }

    fn plan(&self, len: usize, direction: FftDirection) -> Arc<dyn Fft<f64>> {
        match FftPlannerAvx::new() {
            Ok(mut planner) => planner.plan_fft(len, direction),
            // only reachable if CPU features changed after the probe
            Err(()) => FftPlannerScalar::new().plan_fft(len, direction),
        }
    }
}

/// Backend of the requested kind, or the portable one if it is unavailable.
pub fn create_backend(kind: BackendKind) -> Arc<dyn FftBackend> {
    match kind {
        BackendKind::Portable => Arc::new(PortableBackend::new()),
        BackendKind::Accelerated => match AcceleratedBackend::new() {
            Ok(b) => Arc::new(b),
            Err(e) => {
                tracing::warn!(error = %e, "falling back to the portable FFT backend");
                Arc::new(PortableBackend::new())
            }
        },
    }
}

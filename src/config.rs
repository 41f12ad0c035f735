// src/config.rs
//
// Solver configuration, read from / written next to run output as JSON.
// `LLG_DEMAG_FFT_BACKEND` overrides the configured backend at run time.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::effective_field::{DemagConfig, DemagField};
use crate::error::ConfigError;
use crate::fft::{create_backend, BackendKind, FftBackend};
use crate::topology::Topology;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub backend: BackendKind,
    pub demag: DemagConfig,
}

impl SolverConfig {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes `config.json` into `out_dir`.
    pub fn write_to_dir(&self, out_dir: &Path) -> Result<(), ConfigError> {
        let path = out_dir.join("config.json");
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Configured backend unless the environment names another one.
    pub fn resolved_backend_kind(&self) -> Result<BackendKind, ConfigError> {
        Ok(BackendKind::from_env()?.unwrap_or(self.backend))
    }

    pub fn backend(&self) -> Result<Arc<dyn FftBackend>, ConfigError> {
        Ok(create_backend(self.resolved_backend_kind()?))
    }

    /// Demag solver for `topology` with this configuration.
    pub fn demag_field(&self, topology: &Topology) -> Result<DemagField, ConfigError> {
        let backend = self.backend()?;
        Ok(DemagField::with_config(topology, backend.as_ref(), self.demag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effective_field::{LoopBounds, Padding};

    #[test]
    fn partial_json_fills_defaults() {
        let c = SolverConfig::from_json(r#"{"backend":"portable"}"#).unwrap();
        assert_eq!(c.backend, BackendKind::Portable);
        assert_eq!(c.demag, DemagConfig::optimized());

        let c = SolverConfig::from_json(r#"{"demag":{"loop_bounds":"full"}}"#).unwrap();
        assert_eq!(c.backend, BackendKind::Accelerated);
        assert_eq!(c.demag.padding, Padding::MultipleOfFour);
        assert_eq!(c.demag.loop_bounds, LoopBounds::Full);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            SolverConfig::from_json(r#"{"backend":"gpu"}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn written_config_reads_back() {
        let dir = std::env::temp_dir().join(format!("llg_demag_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let c = SolverConfig {
            backend: BackendKind::Portable,
            demag: DemagConfig::reference(),
        };
        c.write_to_dir(&dir).unwrap();
        let back = SolverConfig::from_file(&dir.join("config.json")).unwrap();
        assert_eq!(back, c);
        assert_eq!(SolverConfig::from_json(&c.to_json().unwrap()).unwrap(), c);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SolverConfig::from_file(Path::new("/nonexistent/llg_demag/config.json"));
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }
}

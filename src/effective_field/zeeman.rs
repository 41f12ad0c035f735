// src/effective_field/zeeman.rs

use serde::{Deserialize, Serialize};

use crate::effective_field::{FieldTerm, State};
use crate::vector_field::VectorField;

/// Uniform, time-independent applied field (same units as the other terms).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZeemanField {
    pub h_ext: [f64; 3],
}

impl ZeemanField {
    pub fn new(h_ext: [f64; 3]) -> Self {
        Self { h_ext }
    }
}

impl FieldTerm for ZeemanField {
    fn compute_field(&self, state: &State) -> VectorField {
        VectorField::uniform(state.topology().clone(), self.h_ext)
    }

    fn name(&self) -> &'static str {
        "zeeman"
    }
}

// src/effective_field/mod.rs
//
// Effective-field terms. Every term maps a simulation state to a field on the
// state's topology; time integrators and energy code only see `FieldTerm`.

pub mod demag;
pub mod newell;
pub mod zeeman;

pub use demag::{DemagConfig, DemagField, LoopBounds, Padding};
pub use zeeman::ZeemanField;

use crate::topology::Topology;
use crate::vector_field::VectorField;

/// Snapshot handed to field terms: the magnetisation plus the integrator's
/// position in time.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub magnetization: VectorField,
    pub time: f64,
    pub step: usize,
}

impl State {
    /// State at t = 0, step 0.
    pub fn new(magnetization: VectorField) -> Self {
        Self {
            magnetization,
            time: 0.0,
            step: 0,
        }
    }

    pub fn at(magnetization: VectorField, time: f64, step: usize) -> Self {
        Self {
            magnetization,
            time,
            step,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.magnetization.topology
    }
}

/// A contribution to the effective field.
pub trait FieldTerm: Send + Sync {
    fn compute_field(&self, state: &State) -> VectorField;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}

/// Sum of several field terms, evaluated in insertion order.
#[derive(Default)]
pub struct CompositeFieldTerm {
    terms: Vec<Box<dyn FieldTerm>>,
}

impl CompositeFieldTerm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, term: Box<dyn FieldTerm>) {
        self.terms.push(term);
    }

    /// Builder-style `push`.
    pub fn with(mut self, term: impl FieldTerm + 'static) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl FieldTerm for CompositeFieldTerm {
    fn compute_field(&self, state: &State) -> VectorField {
        self.terms
            .iter()
            .fold(VectorField::zeros(state.topology().clone()), |acc, term| {
                let _span = tracing::trace_span!("field_term", term = term.name()).entered();
                acc.add(&term.compute_field(state))
            })
    }

    fn name(&self) -> &'static str {
        "composite"
    }
}

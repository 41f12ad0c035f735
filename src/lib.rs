// src/lib.rs

pub mod complex_field;
pub mod config;
pub mod effective_field;
pub mod error;
pub mod fft;
pub mod initial_states;
pub mod odometer;
pub mod tensor_field;
pub mod topology;
pub mod vector_field;

// src/initial_states.rs
//
// Magnetisation generators on an arbitrary topology: uniform, uniform with a
// small random tilt, and fully random directions. All produce unit vectors;
// the random ones are reproducible from a seed.

use crate::topology::Topology;
use crate::vector_field::VectorField;

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let n = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if n == 0.0 {
        return [0.0; 3];
    }
    [v[0] / n, v[1] / n, v[2] / n]
}

/// Every cell along `dir` (normalised).
pub fn uniform(topology: &Topology, dir: [f64; 3]) -> VectorField {
    VectorField::uniform(topology.clone(), normalize(dir))
}

/// Uniform + small random tilt (each component perturbed by up to `noise`
/// before renormalising).
pub fn uniform_with_noise(topology: &Topology, dir: [f64; 3], noise: f64, seed: u64) -> VectorField {
    let base = normalize(dir);
    let mut rng = XorShift64::new(seed);
    let data = (0..topology.total_cell_count())
        .map(|_| {
            let dx = noise * (rng.next_f64() * 2.0 - 1.0);
            let dy = noise * (rng.next_f64() * 2.0 - 1.0);
            let dz = noise * (rng.next_f64() * 2.0 - 1.0);
            normalize([base[0] + dx, base[1] + dy, base[2] + dz])
        })
        .collect();
    VectorField {
        topology: topology.clone(),
        data,
    }
}

/// Random unit directions (cube sampling, then normalised; not exactly
/// uniform on the sphere).
pub fn random(topology: &Topology, seed: u64) -> VectorField {
    let mut rng = XorShift64::new(seed);
    let data = (0..topology.total_cell_count())
        .map(|_| {
            let x = rng.next_f64() * 2.0 - 1.0;
            let y = rng.next_f64() * 2.0 - 1.0;
            let z = rng.next_f64() * 2.0 - 1.0;
            normalize([x, y, z])
        })
        .collect();
    VectorField {
        topology: topology.clone(),
        data,
    }
}

// ---------------------------
// Small deterministic RNG (no extra deps)
// ---------------------------

struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        let s = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        // top 53 bits -> [0, 1)
        let u = self.next_u64() >> 11;
        (u as f64) * (1.0 / ((1u64 << 53) as f64))
    }
}

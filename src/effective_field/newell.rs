// src/effective_field/newell.rs
//
// Demagnetising tensor of rectangular cells (Newell, Williams & Dunlop 1993).
//
// N(x) is the cell-averaged interaction between two cuboid cells of size
// (dx, dy, dz) whose centres are displaced by x. Only Nxx and Nxy have their
// own closed forms (f and g); the remaining four components follow from
// permuting coordinates and cell sizes together.
//
// Sign convention: N is positive definite with trace 1 at x = 0, so the field
// of a uniformly magnetised cell is H = -N M. The solver applies the minus.

use std::f64::consts::PI;

use rayon::prelude::*;

use crate::tensor_field::ComplexTensorField;
use crate::topology::Topology;

/// 27-point second-difference stencil: (weight, ox, oy, oz), offsets in
/// units of the cell size.
pub const STENCIL: [(f64, f64, f64, f64); 27] = [
    (8.0, 0.0, 0.0, 0.0),
    (-4.0, 1.0, 0.0, 0.0),
    (-4.0, -1.0, 0.0, 0.0),
    (-4.0, 0.0, 1.0, 0.0),
    (-4.0, 0.0, -1.0, 0.0),
    (-4.0, 0.0, 0.0, 1.0),
    (-4.0, 0.0, 0.0, -1.0),
    (2.0, 1.0, 1.0, 0.0),
    (2.0, 1.0, -1.0, 0.0),
    (2.0, -1.0, 1.0, 0.0),
    (2.0, -1.0, -1.0, 0.0),
    (2.0, 1.0, 0.0, 1.0),
    (2.0, 1.0, 0.0, -1.0),
    (2.0, -1.0, 0.0, 1.0),
    (2.0, -1.0, 0.0, -1.0),
    (2.0, 0.0, 1.0, 1.0),
    (2.0, 0.0, 1.0, -1.0),
    (2.0, 0.0, -1.0, 1.0),
    (2.0, 0.0, -1.0, -1.0),
    (-1.0, 1.0, 1.0, 1.0),
    (-1.0, 1.0, 1.0, -1.0),
    (-1.0, 1.0, -1.0, 1.0),
    (-1.0, 1.0, -1.0, -1.0),
    (-1.0, -1.0, 1.0, 1.0),
    (-1.0, -1.0, 1.0, -1.0),
    (-1.0, -1.0, -1.0, 1.0),
    (-1.0, -1.0, -1.0, -1.0),
];

/// Newell's f, even in every argument.
pub fn newell_f(x: f64, y: f64, z: f64) -> f64 {
    let (x, y, z) = (x.abs(), y.abs(), z.abs());
    let (x2, y2, z2) = (x * x, y * y, z * z);
    let r = (x2 + y2 + z2).sqrt();

    let mut result = 0.0;
    if x2 + z2 > 0.0 {
        result += 0.5 * y * (z2 - x2) * (y / (x2 + z2).sqrt()).asinh();
    }
    if x2 + y2 > 0.0 {
        result += 0.5 * z * (y2 - x2) * (z / (x2 + y2).sqrt()).asinh();
    }
    if x * r > 0.0 {
        result -= x * y * z * (y * z / (x * r)).atan();
    }
    result + (2.0 * x2 - y2 - z2) * r / 6.0
}

/// Newell's g, odd in x and y, even in z.
pub fn newell_g(x: f64, y: f64, z: f64) -> f64 {
    let z = z.abs();
    let (x2, y2, z2) = (x * x, y * y, z * z);
    let r = (x2 + y2 + z2).sqrt();

    let mut result = -x * y * r / 3.0;
    if x2 + y2 > 0.0 {
        result += x * y * z * (z / (x2 + y2).sqrt()).asinh();
    }
    if x2 + z2 > 0.0 {
        result += x / 6.0 * (3.0 * z2 - x2) * (y / (x2 + z2).sqrt()).asinh();
    }
    if y2 + z2 > 0.0 {
        result += y / 6.0 * (3.0 * z2 - y2) * (x / (y2 + z2).sqrt()).asinh();
    }
    if x * r != 0.0 {
        result -= 0.5 * z * x2 * (y * z / (x * r)).atan();
    }
    if (y * r).abs() > 0.0 {
        result -= 0.5 * z * y2 * (x * z / (y * r)).atan();
    }
    if (z * r).abs() > 0.0 {
        result -= z2 * z / 6.0 * (x * y / (z * r)).atan();
    }
    result
}

fn stencil_sum(kernel: fn(f64, f64, f64) -> f64, x: [f64; 3], dx: [f64; 3]) -> f64 {
    let sum: f64 = STENCIL
        .iter()
        .map(|&(w, ox, oy, oz)| {
            w * kernel(x[0] + ox * dx[0], x[1] + oy * dx[1], x[2] + oz * dx[2])
        })
        .sum();
    sum / (4.0 * PI * dx[0] * dx[1] * dx[2])
}

pub fn nxx(x: [f64; 3], dx: [f64; 3]) -> f64 {
    stencil_sum(newell_f, x, dx)
}

pub fn nxy(x: [f64; 3], dx: [f64; 3]) -> f64 {
    stencil_sum(newell_g, x, dx)
}

pub fn nxz(x: [f64; 3], dx: [f64; 3]) -> f64 {
    nxy([x[0], x[2], x[1]], [dx[0], dx[2], dx[1]])
}

pub fn nyy(x: [f64; 3], dx: [f64; 3]) -> f64 {
    nxx([x[1], x[0], x[2]], [dx[1], dx[0], dx[2]])
}

pub fn nyz(x: [f64; 3], dx: [f64; 3]) -> f64 {
    nxy([x[1], x[2], x[0]], [dx[1], dx[2], dx[0]])
}

pub fn nzz(x: [f64; 3], dx: [f64; 3]) -> f64 {
    nxx([x[2], x[1], x[0]], [dx[2], dx[1], dx[0]])
}

/// (xx, xy, xz, yy, yz, zz) for centre displacement `x`.
pub fn tensor_at(x: [f64; 3], dx: [f64; 3]) -> [f64; 6] {
    [
        nxx(x, dx),
        nxy(x, dx),
        nxz(x, dx),
        nyy(x, dx),
        nyz(x, dx),
        nzz(x, dx),
    ]
}

/// Demag tensor over the distance topology of `topology` (every displacement
/// between two of its cells), symmetric storage.
pub fn demag_tensor(topology: &Topology) -> ComplexTensorField {
    assert_eq!(
        topology.dimension(),
        3,
        "demag tensor needs a 3-d topology, got {}-d",
        topology.dimension()
    );
    let distance = topology.distance_topology();
    let dx = [
        distance.cell_size(0),
        distance.cell_size(1),
        distance.cell_size(2),
    ];

    let values: Vec<[f64; 6]> = (0..distance.total_cell_count())
        .into_par_iter()
        .map(|lidx| {
            let p = distance.position_of(lidx);
            tensor_at([p[0], p[1], p[2]], dx)
        })
        .collect();

    ComplexTensorField::symmetric_from_real(distance, &values)
}

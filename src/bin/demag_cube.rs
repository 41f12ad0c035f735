// src/bin/demag_cube.rs
//
// Developer diagnostic: demagnetisation kernel sanity checker.
//
// Computes implied demag factors (Nxx, Nyy, Nzz) for a uniform magnetisation
// on an Nx×Ny×Nz box with given cell dimensions. For a uniformly magnetised
// prism the cell-averaged factors are the body factors, so they should sum to 1
// (and each be 1/3 for a cube).
//
// Usage examples:
//   cargo run --bin demag_cube
//   cargo run --bin demag_cube -- 2 2 2 1.0 1.0 1.0
//   cargo run --bin demag_cube -- 64 64 1 5e-9 5e-9 1e-9 config.json
//   LLG_DEMAG_FFT_BACKEND=portable RUST_LOG=debug cargo run --bin demag_cube

use std::path::Path;
use std::process;

use llg_demag::config::SolverConfig;
use llg_demag::effective_field::DemagField;
use llg_demag::initial_states;
use llg_demag::topology::Topology;

fn usage_exit(msg: &str) -> ! {
    eprintln!("demag_cube: {msg}");
    eprintln!("usage: demag_cube [nx ny nz dx dy dz [config.json]]");
    process::exit(2);
}

fn parse<T: std::str::FromStr>(s: &str, what: &str) -> T {
    s.parse::<T>()
        .unwrap_or_else(|_| usage_exit(&format!("cannot parse {what} from {s:?}")))
}

fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();

    // Defaults: a small cube of cubes
    let (counts, sizes) = match args.len() {
        1 => ([8usize, 8, 8], [5e-9, 5e-9, 5e-9]),
        7 | 8 => (
            [
                parse::<usize>(&args[1], "nx"),
                parse::<usize>(&args[2], "ny"),
                parse::<usize>(&args[3], "nz"),
            ],
            [
                parse::<f64>(&args[4], "dx"),
                parse::<f64>(&args[5], "dy"),
                parse::<f64>(&args[6], "dz"),
            ],
        ),
        _ => usage_exit("expected 0, 6 or 7 arguments"),
    };

    let config = match args.get(7) {
        Some(path) => SolverConfig::from_file(Path::new(path))
            .unwrap_or_else(|e| usage_exit(&format!("config {path}: {e}"))),
        None => SolverConfig::default(),
    };

    let topology = Topology::try_new(&counts, &sizes, &[0, 0, 0])
        .unwrap_or_else(|e| usage_exit(&e.to_string()));
    let solver = config
        .demag_field(&topology)
        .unwrap_or_else(|e| usage_exit(&e.to_string()));

    let n: Vec<f64> = (0..3).map(|c| infer_nii(&solver, &topology, c)).collect();

    println!(
        "Grid: {}x{}x{}, dx={:.3e}, dy={:.3e}, dz={:.3e}",
        counts[0], counts[1], counts[2], sizes[0], sizes[1], sizes[2]
    );
    println!(
        "Internal grid: {:?}, backend {}, relative FFT cost {:.4}",
        solver.internal_topology().cell_counts(),
        solver.backend_name(),
        solver.relative_cost()
    );
    println!(
        "Implied demag factors: Nxx={:.6}, Nyy={:.6}, Nzz={:.6}",
        n[0], n[1], n[2]
    );
    println!("Trace check: Nxx+Nyy+Nzz = {:.6}", n[0] + n[1] + n[2]);
}

fn infer_nii(solver: &DemagField, topology: &Topology, component: usize) -> f64 {
    let mut dir = [0.0; 3];
    dir[component] = 1.0;
    let m = initial_states::uniform(topology, dir);

    let h = solver.compute_field(&m);

    // Nii = -<H_i> / M_i, here M_i = 1.
    -h.average()[component]
}

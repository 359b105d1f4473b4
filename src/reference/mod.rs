//! Reference engine: one cell per slot, brute-force neighbour counting.

mod engine;

pub use engine::ReferenceLife;

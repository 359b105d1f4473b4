//! Bounded Conway's Game of Life (B3/S23) with a word-parallel packed engine.
//!
//! [`PackedLife`] packs 16 cells into each `u64` and advances a whole element
//! per handful of integer operations. [`ReferenceLife`] stores one cell per
//! slot and counts neighbours directly; it is the oracle the packed engine is
//! tested against. Both implement [`World`] and [`Evolve`].

pub mod error;
pub mod packed;
pub mod reference;
pub mod world;

pub use error::GridError;
pub use packed::{KernelVariant, PackedLife, PackedLifeConfig};
pub use reference::ReferenceLife;
pub use world::{Cell, Evolve, World, copy_world, count_alive, populate_uniform, render, same_cells};

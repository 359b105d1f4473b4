//! PackedLife engine internals and public API.

mod engine;
mod kernel;
mod layout;
mod rules;

pub use engine::{KERNEL_ENV, PackedLife, PackedLifeConfig};
pub use kernel::{KernelVariant, StepSummary};
pub use layout::{BITS_PER_CELL, Element, LANES};

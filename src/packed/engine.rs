use std::fmt;
use std::sync::OnceLock;

use super::kernel::{KernelVariant, advance_cells};
use super::layout::{BITS_PER_CELL, LANE_LOW_BITS, LANES, PackedCells};
use crate::error::GridError;
use crate::reference::ReferenceLife;
use crate::world::{self, Cell, Evolve, World};

/// Environment override for the default kernel variant.
pub const KERNEL_ENV: &str = "SWAR_LIFE_KERNEL";

static AUTO_KERNEL_VARIANT: OnceLock<KernelVariant> = OnceLock::new();

fn detect_kernel_variant() -> KernelVariant {
    kernel_variant_from_env(std::env::var(KERNEL_ENV).ok().as_deref())
}

fn kernel_variant_from_env(value: Option<&str>) -> KernelVariant {
    match value {
        Some(value) if !value.trim().is_empty() => match value.parse() {
            Ok(variant) => variant,
            Err(err) => {
                tracing::warn!(%err, "ignoring {KERNEL_ENV}, using the table kernel");
                KernelVariant::Table
            }
        },
        _ => KernelVariant::Table,
    }
}

fn resolve_kernel_variant(config: &PackedLifeConfig) -> KernelVariant {
    config
        .kernel
        .unwrap_or_else(|| *AUTO_KERNEL_VARIANT.get_or_init(detect_kernel_variant))
}

/// Configuration for a PackedLife instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PackedLifeConfig {
    /// Lane decision variant.
    /// `None` reads `SWAR_LIFE_KERNEL` once per process and falls back to
    /// [`KernelVariant::Table`].
    pub kernel: Option<KernelVariant>,
}

impl PackedLifeConfig {
    /// Force a specific kernel variant.
    pub fn kernel(mut self, variant: KernelVariant) -> Self {
        self.kernel = Some(variant);
        self
    }
}

/// Bounded grid packed [`LANES`] cells per machine word.
///
/// Width must be a multiple of [`LANES`]. Cells outside the grid read as dead
/// and never influence the interior.
#[derive(Clone, Debug)]
pub struct PackedLife {
    width: usize,
    height: usize,
    cells: PackedCells,
    kernel: KernelVariant,
    generation: u64,
    population_cache: Option<u64>,
    stable: bool,
}

impl Default for PackedLife {
    fn default() -> Self {
        Self::new()
    }
}

impl PackedLife {
    /// An empty 0x0 grid.
    pub fn new() -> Self {
        Self::with_config(PackedLifeConfig::default())
    }

    pub fn with_config(config: PackedLifeConfig) -> Self {
        Self {
            width: 0,
            height: 0,
            cells: PackedCells::default(),
            kernel: resolve_kernel_variant(&config),
            generation: 0,
            population_cache: Some(0),
            stable: false,
        }
    }

    /// A `width x height` grid with every cell dead.
    pub fn with_size(width: usize, height: usize) -> Result<Self, GridError> {
        Self::with_size_and_config(width, height, PackedLifeConfig::default())
    }

    pub fn with_size_and_config(
        width: usize,
        height: usize,
        config: PackedLifeConfig,
    ) -> Result<Self, GridError> {
        let mut engine = Self::with_config(config);
        engine.resize(width, height)?;
        Ok(engine)
    }

    /// Copy-construct from any other grid. Fails when the source width is not
    /// a multiple of [`LANES`].
    pub fn from_world<W: World + ?Sized>(other: &W) -> Result<Self, GridError> {
        let mut engine = Self::new();
        world::copy_world(&mut engine, other)?;
        Ok(engine)
    }

    pub fn kernel(&self) -> KernelVariant {
        self.kernel
    }

    pub fn set_kernel(&mut self, variant: KernelVariant) {
        self.kernel = variant;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Live cell count. Takes `&mut self` because the count is cached between
    /// edits and refreshed by `advance`.
    pub fn population(&mut self) -> u64 {
        if let Some(cached) = self.population_cache {
            return cached;
        }
        let total = self.cells.population();
        self.population_cache = Some(total);
        total
    }

    /// True when the last generation left every cell as it was and nothing
    /// has been edited since.
    pub fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn is_empty(&mut self) -> bool {
        self.population() == 0
    }

    /// Visit every live cell in row-major order.
    pub fn for_each_live<F: FnMut(usize, usize)>(&self, mut f: F) {
        for y in 0..self.height {
            for (e, &element) in self.cells.row(y).iter().enumerate() {
                let mut bits = element & LANE_LOW_BITS;
                while bits != 0 {
                    let lane = bits.trailing_zeros() as usize / BITS_PER_CELL;
                    f(e * LANES + lane, y);
                    bits &= bits - 1;
                }
            }
        }
    }

    #[inline]
    fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    fn validate_width(width: usize) -> Result<(), GridError> {
        if width % LANES != 0 {
            return Err(GridError::InvalidWidth {
                width,
                lanes: LANES,
            });
        }
        Ok(())
    }
}

impl World for PackedLife {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn get(&self, x: usize, y: usize) -> Cell {
        if self.contains(x, y) {
            self.cells.get_cell(x, y)
        } else {
            Cell::Dead
        }
    }

    #[inline]
    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        debug_assert!(self.contains(x, y), "set({x},{y}) outside {}x{}", self.width, self.height);
        self.cells.set_cell(x, y, cell);
        self.population_cache = None;
        self.stable = false;
    }

    /// Reallocate both buffers, all dead. On error the grid is left untouched.
    fn resize(&mut self, width: usize, height: usize) -> Result<(), GridError> {
        Self::validate_width(width)?;
        let stride = width / LANES;
        self.cells = PackedCells::new(stride, height);
        self.width = width;
        self.height = height;
        self.population_cache = Some(0);
        self.stable = false;
        tracing::debug!(width, height, stride, kernel = %self.kernel, "packed grid resized");
        Ok(())
    }
}

impl Evolve for PackedLife {
    fn advance(&mut self) {
        let summary = advance_cells(self.kernel, &mut self.cells);
        self.cells.swap();
        self.generation += 1;
        self.population_cache = Some(summary.population);
        self.stable = !summary.changed;
        tracing::trace!(
            generation = self.generation,
            population = summary.population,
            changed = summary.changed,
            "packed grid advanced"
        );
    }
}

impl PartialEq for PackedLife {
    fn eq(&self, other: &Self) -> bool {
        world::same_cells(self, other)
    }
}

impl PartialEq<ReferenceLife> for PackedLife {
    fn eq(&self, other: &ReferenceLife) -> bool {
        world::same_cells(self, other)
    }
}

impl PartialEq<PackedLife> for ReferenceLife {
    fn eq(&self, other: &PackedLife) -> bool {
        world::same_cells(self, other)
    }
}

impl fmt::Display for PackedLife {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", world::render(self))
    }
}

#[cfg(test)]
mod tests {
    use super::{KernelVariant, PackedLife, PackedLifeConfig, kernel_variant_from_env};
    use crate::error::GridError;
    use crate::packed::layout::LANES;
    use crate::world::{Cell, Evolve, World};

    fn packed(width: usize, height: usize, kernel: KernelVariant) -> PackedLife {
        PackedLife::with_size_and_config(width, height, PackedLifeConfig::default().kernel(kernel))
            .unwrap()
    }

    #[test]
    fn rejects_width_not_multiple_of_lanes() {
        assert_eq!(
            PackedLife::with_size(20, 4).unwrap_err(),
            GridError::InvalidWidth {
                width: 20,
                lanes: LANES
            }
        );
        assert!(PackedLife::with_size(LANES - 1, 1).is_err());
        assert!(PackedLife::with_size(0, 3).is_ok());
    }

    #[test]
    fn failed_resize_keeps_grid() {
        let mut engine = PackedLife::with_size(32, 4).unwrap();
        engine.set(17, 2, Cell::Alive);
        assert!(engine.resize(33, 4).is_err());
        assert_eq!((engine.width(), engine.height()), (32, 4));
        assert_eq!(engine.get(17, 2), Cell::Alive);
    }

    #[test]
    fn resize_discards_contents() {
        let mut engine = PackedLife::with_size(16, 2).unwrap();
        engine.set(3, 1, Cell::Alive);
        engine.resize(48, 3).unwrap();
        assert_eq!(engine.population(), 0);
        assert_eq!((engine.width(), engine.height()), (48, 3));
    }

    #[test]
    fn population_cache_follows_set_and_advance() {
        let mut engine = PackedLife::with_size(16, 3).unwrap();
        for x in 4..7 {
            engine.set(x, 1, Cell::Alive);
        }
        assert_eq!(engine.population(), 3);
        engine.set(4, 1, Cell::Dead);
        assert_eq!(engine.population(), 2);
        engine.advance();
        assert_eq!(engine.population(), 0);
        assert!(engine.is_empty());
    }

    #[test]
    fn for_each_live_reports_coordinates() {
        let mut engine = PackedLife::with_size(32, 2).unwrap();
        engine.set(0, 0, Cell::Alive);
        engine.set(15, 0, Cell::Alive);
        engine.set(16, 1, Cell::Alive);
        engine.set(31, 1, Cell::Alive);
        let mut live = Vec::new();
        engine.for_each_live(|x, y| live.push((x, y)));
        assert_eq!(live, vec![(0, 0), (15, 0), (16, 1), (31, 1)]);
    }

    #[test]
    fn single_row_blinker_dies() {
        for kernel in KernelVariant::ALL {
            let mut engine = packed(16, 1, kernel);
            for x in 6..9 {
                engine.set(x, 0, Cell::Alive);
            }
            engine.advance();
            // Only the middle cell has two neighbours; it survives alone.
            assert_eq!(engine.population(), 1, "{kernel}");
            assert_eq!(engine.get(7, 0), Cell::Alive);
            engine.advance();
            assert_eq!(engine.population(), 0);
        }
    }

    #[test]
    fn vertical_blinker_across_element_boundary() {
        for kernel in KernelVariant::ALL {
            let mut engine = packed(32, 5, kernel);
            for x in 15..18 {
                engine.set(x, 2, Cell::Alive);
            }
            engine.advance();
            for y in 1..4 {
                assert_eq!(engine.get(16, y), Cell::Alive, "{kernel} y {y}");
            }
            assert_eq!(engine.get(15, 2), Cell::Dead);
            assert_eq!(engine.get(17, 2), Cell::Dead);
            assert_eq!(engine.population(), 3);
        }
    }

    #[test]
    fn explicit_kernel_beats_environment() {
        let engine =
            PackedLife::with_config(PackedLifeConfig::default().kernel(KernelVariant::Bitwise));
        assert_eq!(engine.kernel(), KernelVariant::Bitwise);
    }

    #[test]
    fn kernel_env_values() {
        assert_eq!(kernel_variant_from_env(Some("bitwise")), KernelVariant::Bitwise);
        assert_eq!(kernel_variant_from_env(Some(" TABLE ")), KernelVariant::Table);
        assert_eq!(kernel_variant_from_env(Some("avx2")), KernelVariant::Table);
        assert_eq!(kernel_variant_from_env(Some("")), KernelVariant::Table);
        assert_eq!(kernel_variant_from_env(Some("   ")), KernelVariant::Table);
        assert_eq!(kernel_variant_from_env(None), KernelVariant::Table);
    }

    #[test]
    fn stability_tracks_last_generation() {
        for kernel in KernelVariant::ALL {
            let mut block = packed(16, 4, kernel);
            assert!(!block.is_stable());
            for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
                block.set(x, y, Cell::Alive);
            }
            block.advance();
            assert!(block.is_stable(), "{kernel}");
            block.set(10, 0, Cell::Alive);
            assert!(!block.is_stable());

            let mut blinker = packed(16, 5, kernel);
            for x in 6..9 {
                blinker.set(x, 2, Cell::Alive);
            }
            blinker.advance();
            assert!(!blinker.is_stable(), "{kernel}");

            // An empty grid stays empty.
            let mut empty = packed(32, 3, kernel);
            empty.advance();
            assert!(empty.is_stable());
        }
    }
}

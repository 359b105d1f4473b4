//! Engine-independent grid surface.
//!
//! Both engines implement [`World`]; copying, random population, equality and
//! text rendering are written once here against that trait only.

use std::fmt;

use rand::distr::Bernoulli;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::GridError;

/// State of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Cell {
    #[default]
    Dead = 0,
    Alive = 1,
}

impl Cell {
    #[inline]
    pub const fn is_alive(self) -> bool {
        matches!(self, Cell::Alive)
    }

    /// Character used by [`render`].
    #[inline]
    pub const fn glyph(self) -> char {
        match self {
            Cell::Alive => 'X',
            Cell::Dead => ' ',
        }
    }
}

impl From<bool> for Cell {
    #[inline]
    fn from(alive: bool) -> Self {
        if alive { Cell::Alive } else { Cell::Dead }
    }
}

/// Per-cell access to a bounded grid.
///
/// Reads outside `width x height` return [`Cell::Dead`]. Writes outside the
/// grid are unchecked in release builds.
pub trait World {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn get(&self, x: usize, y: usize) -> Cell;
    fn set(&mut self, x: usize, y: usize, cell: Cell);
    /// Reallocate to the given size. Prior contents are discarded.
    fn resize(&mut self, width: usize, height: usize) -> Result<(), GridError>;
}

/// Generation stepping.
pub trait Evolve {
    fn advance(&mut self);

    fn advance_n(&mut self, n: u64) {
        for _ in 0..n {
            self.advance();
        }
    }
}

/// Resize `dst` to the dimensions of `src`, then copy every cell.
pub fn copy_world<D, S>(dst: &mut D, src: &S) -> Result<(), GridError>
where
    D: World + ?Sized,
    S: World + ?Sized,
{
    dst.resize(src.width(), src.height())?;
    for y in 0..src.height() {
        for x in 0..src.width() {
            dst.set(x, y, src.get(x, y));
        }
    }
    Ok(())
}

/// Set every cell alive independently with probability `chance`.
///
/// A `seed` of 0 draws the generator seed from the operating system.
pub fn populate_uniform<W>(world: &mut W, chance: f64, seed: u64) -> Result<(), GridError>
where
    W: World + ?Sized,
{
    let dist = Bernoulli::new(chance).map_err(|_| GridError::InvalidChance { chance })?;
    let mut rng = if seed == 0 {
        StdRng::from_os_rng()
    } else {
        StdRng::seed_from_u64(seed)
    };
    for y in 0..world.height() {
        for x in 0..world.width() {
            world.set(x, y, Cell::from(rng.sample(dist)));
        }
    }
    Ok(())
}

/// True when both grids have the same dimensions and identical cells.
pub fn same_cells<A, B>(lhs: &A, rhs: &B) -> bool
where
    A: World + ?Sized,
    B: World + ?Sized,
{
    if lhs.width() != rhs.width() || lhs.height() != rhs.height() {
        return false;
    }
    (0..lhs.height()).all(|y| (0..lhs.width()).all(|x| lhs.get(x, y) == rhs.get(x, y)))
}

/// Number of live cells, counted through [`World::get`].
pub fn count_alive<W: World + ?Sized>(world: &W) -> u64 {
    let mut count = 0;
    for y in 0..world.height() {
        for x in 0..world.width() {
            count += world.get(x, y) as u64;
        }
    }
    count
}

/// Text view of a grid: one line per row, `X` for live cells.
pub fn render<W: World + ?Sized>(world: &W) -> Render<'_, W> {
    Render(world)
}

pub struct Render<'a, W: ?Sized>(&'a W);

impl<W: World + ?Sized> fmt::Display for Render<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        let world = self.0;
        for y in 0..world.height() {
            for x in 0..world.width() {
                f.write_char(world.get(x, y).glyph())?;
            }
            f.write_char('\n')?;
        }
        Ok(())
    }
}

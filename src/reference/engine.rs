//! Reference engine core.
//!
//! Slow but obviously correct: every cell sums its eight neighbours and
//! applies B3/S23 with the count excluding the cell itself. Used as the
//! oracle the packed engine is validated against.

use std::fmt;

use crate::error::GridError;
use crate::world::{self, Cell, Evolve, World};

#[derive(Clone, Debug, Default)]
pub struct ReferenceLife {
    width: usize,
    height: usize,
    active: Vec<Cell>,
    future: Vec<Cell>,
    generation: u64,
}

impl ReferenceLife {
    /// An empty 0x0 grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// A `width x height` grid with every cell dead.
    pub fn with_size(width: usize, height: usize) -> Self {
        let mut engine = Self::new();
        engine.reallocate(width, height);
        engine
    }

    /// Copy-construct from any other grid.
    pub fn from_world<W: World + ?Sized>(other: &W) -> Self {
        let mut engine = Self::new();
        // Resizing a reference grid never fails.
        let _ = world::copy_world(&mut engine, other);
        engine
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn population(&self) -> u64 {
        self.active.iter().filter(|cell| cell.is_alive()).count() as u64
    }

    /// Number of live cells among the eight neighbours of `(x, y)`.
    /// Coordinates outside the grid count as dead.
    pub fn live_neighbors(&self, x: usize, y: usize) -> u8 {
        let mut count = 0;
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                // Wrapping below zero lands far outside the grid, which reads dead.
                let nx = x.wrapping_add_signed(dx);
                let ny = y.wrapping_add_signed(dy);
                count += self.get(nx, ny) as u8;
            }
        }
        count
    }

    #[inline]
    fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn reallocate(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.active = vec![Cell::Dead; width * height];
        self.future = vec![Cell::Dead; width * height];
        tracing::debug!(width, height, "reference grid resized");
    }
}

impl World for ReferenceLife {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn get(&self, x: usize, y: usize) -> Cell {
        if self.contains(x, y) {
            self.active[self.index(x, y)]
        } else {
            Cell::Dead
        }
    }

    #[inline]
    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        debug_assert!(self.contains(x, y), "set({x},{y}) outside {}x{}", self.width, self.height);
        let index = self.index(x, y);
        self.active[index] = cell;
    }

    fn resize(&mut self, width: usize, height: usize) -> Result<(), GridError> {
        self.reallocate(width, height);
        Ok(())
    }
}

impl Evolve for ReferenceLife {
    fn advance(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                let neighbors = self.live_neighbors(x, y);
                let next_alive = if self.active[self.index(x, y)].is_alive() {
                    neighbors == 2 || neighbors == 3
                } else {
                    neighbors == 3
                };
                let index = self.index(x, y);
                self.future[index] = Cell::from(next_alive);
            }
        }
        std::mem::swap(&mut self.active, &mut self.future);
        self.generation += 1;
    }
}

impl PartialEq for ReferenceLife {
    fn eq(&self, other: &Self) -> bool {
        world::same_cells(self, other)
    }
}

impl fmt::Display for ReferenceLife {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", world::render(self))
    }
}

//! Packed cell layout for PackedLife.
//!
//! Cells are packed `LANES` to an [`Element`], `BITS_PER_CELL` bits per lane,
//! least-significant lane first (lane `i` of element `e` is column
//! `e * LANES + i`). A stored lane holds 0 or 1; the upper bits of each lane
//! are headroom for the kernel's neighbour sums, which peak at 9.
//!
//! Storage is one flat allocation per buffer with a dead padding row above and
//! below the grid, so the kernel never special-cases the first or last row.

use crate::world::Cell;

pub type Element = u64;

pub const BITS_PER_CELL: usize = 4;
pub const LANES: usize = Element::BITS as usize / BITS_PER_CELL;
pub const LANE_MASK: Element = (1 << BITS_PER_CELL) - 1;
/// Shift that moves lane 0 into the top lane (and back).
pub const TOP_LANE_SHIFT: u32 = (BITS_PER_CELL * (LANES - 1)) as u32;
/// Bit 0 of every lane.
pub const LANE_LOW_BITS: Element = repeat_lane(1);

const _: () = assert!(BITS_PER_CELL == 4, "kernel masks assume 4-bit lanes");
const _: () = assert!(LANES * BITS_PER_CELL == Element::BITS as usize);

/// Broadcast `value` into every lane of an element.
pub const fn repeat_lane(value: Element) -> Element {
    let mut out = 0;
    let mut lane = 0;
    while lane < LANES {
        out |= (value & LANE_MASK) << (lane * BITS_PER_CELL);
        lane += 1;
    }
    out
}

/// Double-buffered, row-padded element storage.
#[derive(Clone, Debug, Default)]
pub struct PackedCells {
    buffers: [Vec<Element>; 2],
    phase: u8,
    stride: usize,
    height: usize,
}

impl PackedCells {
    /// All-dead storage for `stride` elements per row and `height` rows.
    pub fn new(stride: usize, height: usize) -> Self {
        let len = stride * (height + 2);
        Self {
            buffers: [vec![0; len], vec![0; len]],
            phase: 0,
            stride,
            height,
        }
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Buffer position of element `element` in grid row `y`.
    #[inline]
    pub fn index(&self, element: usize, y: usize) -> usize {
        (y + 1) * self.stride + element
    }

    #[inline]
    pub fn current(&self) -> &[Element] {
        &self.buffers[self.phase as usize]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut [Element] {
        &mut self.buffers[self.phase as usize]
    }

    #[inline]
    pub fn current_and_next_mut(&mut self) -> (&[Element], &mut [Element]) {
        let (a, b) = self.buffers.split_at_mut(1);
        if self.phase == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    #[inline]
    pub fn swap(&mut self) {
        self.phase ^= 1;
    }

    /// Grid row `y` of the current buffer.
    #[inline]
    pub fn row(&self, y: usize) -> &[Element] {
        let start = self.index(0, y);
        &self.current()[start..start + self.stride]
    }

    #[inline]
    pub fn get_cell(&self, x: usize, y: usize) -> Cell {
        let element = self.current()[self.index(x / LANES, y)];
        Cell::from((element >> lane_shift(x)) & 1 == 1)
    }

    #[inline]
    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        let index = self.index(x / LANES, y);
        let shift = lane_shift(x);
        let element = &mut self.current_mut()[index];
        *element = (*element & !(LANE_MASK << shift)) | ((cell as Element) << shift);
    }

    pub fn population(&self) -> u64 {
        self.current().iter().map(|e| e.count_ones() as u64).sum()
    }

    /// True when both padding rows of both buffers are all dead.
    #[cfg(test)]
    pub fn padding_is_dead(&self) -> bool {
        let tail = (self.height + 1) * self.stride;
        self.buffers.iter().all(|buf| {
            buf[..self.stride].iter().all(|&e| e == 0)
                && buf[tail..tail + self.stride].iter().all(|&e| e == 0)
        })
    }
}

/// Bit offset of column `x` within its element.
#[inline(always)]
pub fn lane_shift(x: usize) -> u32 {
    ((x % LANES) * BITS_PER_CELL) as u32
}

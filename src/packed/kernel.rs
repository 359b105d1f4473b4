//! Word-parallel kernel for PackedLife.
//!
//! Each generation is computed a row at a time, one element (16 cells) per
//! step. Three ordinary integer additions give every lane its column sum over
//! the rows above, itself and below (at most 3). Adding that column sum to
//! copies of itself shifted one lane left and right, plus the edge lanes of the
//! neighbouring elements, gives every lane its full 3x3 total (at most 9)
//! without any carry crossing into the next lane.
//!
//! The lane decision is either a [`LiveTable`] lookup or a closed-form
//! expression over the total's bit-planes; both are monomorphized so the
//! variant is chosen once per generation.

use std::fmt;
use std::str::FromStr;

use super::layout::{
    BITS_PER_CELL, Element, LANE_LOW_BITS, LANE_MASK, PackedCells, TOP_LANE_SHIFT,
};
use super::rules::{LiveTable, live_table};
use crate::error::GridError;

/// How each lane's next state is derived from its 3x3 total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum KernelVariant {
    /// Per-lane lookup in the shared live table.
    #[default]
    Table,
    /// Branch-free boolean expression over the whole element.
    Bitwise,
}

impl KernelVariant {
    pub const ALL: [KernelVariant; 2] = [KernelVariant::Table, KernelVariant::Bitwise];

    pub const fn name(self) -> &'static str {
        match self {
            KernelVariant::Table => "table",
            KernelVariant::Bitwise => "bitwise",
        }
    }
}

impl fmt::Display for KernelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KernelVariant {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(KernelVariant::Table),
            "bitwise" => Ok(KernelVariant::Bitwise),
            other => Err(GridError::UnknownKernel(other.to_string())),
        }
    }
}

/// Outcome of one generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepSummary {
    pub changed: bool,
    pub population: u64,
}

trait LaneRule {
    /// Next state of every lane. `alive` holds the current cells (0/1 per
    /// lane), `total` the 3x3 sums including the cell itself.
    fn next_lanes(&self, alive: Element, total: Element) -> Element;
}

struct TableRule(&'static LiveTable);

impl LaneRule for TableRule {
    #[inline(always)]
    fn next_lanes(&self, alive: Element, total: Element) -> Element {
        let mut out = 0;
        let mut shift = 0;
        while shift < Element::BITS {
            let self_bit = (alive >> shift) & 1;
            let lane_total = (total >> shift) & LANE_MASK;
            out |= self.0.lookup(self_bit, lane_total) << shift;
            shift += BITS_PER_CELL as u32;
        }
        out
    }
}

struct BitwiseRule;

impl LaneRule for BitwiseRule {
    #[inline(always)]
    fn next_lanes(&self, alive: Element, total: Element) -> Element {
        // Bit k of each lane's total, moved down to the lane's bit 0.
        let b0 = total;
        let b1 = total >> 1;
        let b2 = total >> 2;
        let b3 = total >> 3;
        let three = !b3 & !b2 & b1 & b0;
        let four = !b3 & b2 & !b1 & !b0 & alive;
        (three | four) & LANE_LOW_BITS
    }
}

/// 3x3 totals for every lane of an element, given the column sums of the
/// element itself and of its left and right neighbours in the row.
#[inline(always)]
pub fn neighborhood_total(
    old_neighbours: Element,
    vertical: Element,
    new_neighbours: Element,
) -> Element {
    vertical
        + (vertical << BITS_PER_CELL)
        + (vertical >> BITS_PER_CELL)
        + (old_neighbours >> TOP_LANE_SHIFT)
        + (new_neighbours << TOP_LANE_SHIFT)
}

#[inline(always)]
fn advance_row<R: LaneRule>(
    rule: &R,
    above: &[Element],
    row: &[Element],
    below: &[Element],
    out: &mut [Element],
) -> StepSummary {
    let stride = row.len();
    assert!(above.len() == stride && below.len() == stride && out.len() == stride);

    let vertical = |e: usize| above[e] + row[e] + below[e];

    let mut changed = false;
    let mut population = 0u64;
    // Column sums of the element to the left and to the right; zero past the
    // row edges.
    let mut old_neighbours = 0;
    let mut current = vertical(0);
    for e in 0..stride {
        let new_neighbours = if e + 1 < stride { vertical(e + 1) } else { 0 };
        let total = neighborhood_total(old_neighbours, current, new_neighbours);
        let next = rule.next_lanes(row[e], total);
        out[e] = next;
        changed |= next != row[e];
        population += next.count_ones() as u64;
        old_neighbours = current;
        current = new_neighbours;
    }

    StepSummary {
        changed,
        population,
    }
}

fn advance_grid<R: LaneRule>(
    rule: &R,
    current: &[Element],
    next: &mut [Element],
    stride: usize,
    height: usize,
) -> StepSummary {
    let mut summary = StepSummary::default();
    for y in 0..height {
        // Buffer rows y, y + 1, y + 2 are grid rows y - 1, y, y + 1.
        let above = &current[y * stride..(y + 1) * stride];
        let row = &current[(y + 1) * stride..(y + 2) * stride];
        let below = &current[(y + 2) * stride..(y + 3) * stride];
        let out = &mut next[(y + 1) * stride..(y + 2) * stride];
        let row_summary = advance_row(rule, above, row, below, out);
        summary.changed |= row_summary.changed;
        summary.population += row_summary.population;
    }
    summary
}

/// Compute the next generation of `cells` into its scratch buffer.
///
/// The caller swaps the buffers afterwards. Padding rows of the scratch buffer
/// are never written.
pub fn advance_cells(variant: KernelVariant, cells: &mut PackedCells) -> StepSummary {
    let stride = cells.stride();
    let height = cells.height();
    if stride == 0 || height == 0 {
        return StepSummary::default();
    }
    let (current, next) = cells.current_and_next_mut();
    match variant {
        KernelVariant::Table => {
            advance_grid(&TableRule(live_table()), current, next, stride, height)
        }
        KernelVariant::Bitwise => advance_grid(&BitwiseRule, current, next, stride, height),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BitwiseRule, KernelVariant, LaneRule, StepSummary, TableRule, advance_cells, advance_row,
        neighborhood_total,
    };
    use crate::error::GridError;
    use crate::packed::layout::{BITS_PER_CELL, LANES, PackedCells, repeat_lane};
    use crate::packed::rules::live_table;
    use crate::world::Cell;

    fn lane(value: u64, index: usize) -> u64 {
        value << (index * BITS_PER_CELL)
    }

    #[test]
    fn variants_agree_on_every_lane_input() {
        let table = TableRule(live_table());
        for index in 0..LANES {
            for alive in 0..=1u64 {
                for total in alive..=9 {
                    let a = table.next_lanes(lane(alive, index), lane(total, index));
                    let b = BitwiseRule.next_lanes(lane(alive, index), lane(total, index));
                    assert_eq!(a, b, "lane {index} alive {alive} total {total}");
                    let expected = (total == 3 || (alive == 1 && total == 4)) as u64;
                    assert_eq!(a, lane(expected, index));
                }
            }
        }
    }

    #[test]
    fn variants_agree_on_mixed_elements() {
        let table = TableRule(live_table());
        // Every lane gets a different (alive, total) pair.
        let mut alive = 0u64;
        let mut total = 0u64;
        for index in 0..LANES {
            let t = (index as u64 * 7) % 10;
            let a = (index as u64 % 3 == 0 && t > 0) as u64;
            alive |= lane(a, index);
            total |= lane(t, index);
        }
        assert_eq!(table.next_lanes(alive, total), BitwiseRule.next_lanes(alive, total));
    }

    #[test]
    fn totals_carry_across_element_edges() {
        // Previous element's top lane column sum 2, next element's bottom lane 3.
        let old = lane(2, LANES - 1);
        let new = lane(3, 0);
        let total = neighborhood_total(old, 0, new);
        assert_eq!(total, lane(2, 0) | lane(3, LANES - 1));

        let full = repeat_lane(3);
        // Interior lanes see 3 + 3 + 3; edge lanes miss one side.
        let total = neighborhood_total(0, full, 0);
        assert_eq!(total & 0xF, 6);
        assert_eq!(total >> 60, 6);
        assert_eq!((total >> 4) & 0xF, 9);
        let total = neighborhood_total(full, full, full);
        assert_eq!(total, repeat_lane(9));
    }

    #[test]
    fn blinker_across_element_boundary() {
        // Horizontal blinker on cells 15, 16, 17 of the middle row.
        let above = [0u64, 0];
        let row = [lane(1, 15), lane(1, 0) | lane(1, 1)];
        let below = [0u64, 0];
        let mut out = [0u64; 2];
        let summary = advance_row(&TableRule(live_table()), &above, &row, &below, &mut out);
        // Only the middle cell (16) survives in the middle row.
        assert_eq!(out, [0, lane(1, 0)]);
        assert_eq!(
            summary,
            StepSummary {
                changed: true,
                population: 1
            }
        );

        // The row above gains cell 16.
        let mut out = [0u64; 2];
        advance_row(&BitwiseRule, &[0, 0], &above, &row, &mut out);
        assert_eq!(out, [0, lane(1, 0)]);
    }

    #[test]
    fn advance_cells_skips_empty_storage() {
        let mut cells = PackedCells::new(0, 4);
        assert_eq!(advance_cells(KernelVariant::Table, &mut cells), StepSummary::default());
        let mut cells = PackedCells::new(2, 0);
        assert_eq!(advance_cells(KernelVariant::Bitwise, &mut cells), StepSummary::default());
    }

    #[test]
    fn advance_cells_keeps_padding_dead() {
        for variant in KernelVariant::ALL {
            let mut cells = PackedCells::new(2, 2);
            for x in 0..32 {
                cells.set_cell(x, 0, Cell::Alive);
                cells.set_cell(x, 1, Cell::Alive);
            }
            let summary = advance_cells(variant, &mut cells);
            cells.swap();
            assert!(cells.padding_is_dead());
            // A full 32x2 slab keeps only its four corners.
            assert_eq!(summary.population, 4, "{variant}");
            assert_eq!(cells.get_cell(0, 0), Cell::Alive);
            assert_eq!(cells.get_cell(31, 1), Cell::Alive);
            assert_eq!(cells.get_cell(16, 0), Cell::Dead);
        }
    }

    #[test]
    fn kernel_variant_parses() {
        assert_eq!("table".parse::<KernelVariant>(), Ok(KernelVariant::Table));
        assert_eq!(" Bitwise ".parse::<KernelVariant>(), Ok(KernelVariant::Bitwise));
        assert_eq!(
            "avx2".parse::<KernelVariant>(),
            Err(GridError::UnknownKernel("avx2".to_string()))
        );
        assert_eq!(KernelVariant::Bitwise.to_string(), "bitwise");
    }
}

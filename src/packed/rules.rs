//! Live table for B3/S23 in the total-includes-self form.
//!
//! `total` is the sum over the full 3x3 block, the cell itself included, so a
//! cell lives next generation iff `total == 3`, or `total == 4` and it is
//! alive now. The table is indexed by `self_bit << 4 | total`.

use std::sync::OnceLock;

use super::layout::{BITS_PER_CELL, Element};

pub const LIVE_TABLE_LEN: usize = 2 << BITS_PER_CELL;

pub struct LiveTable {
    table: [Element; LIVE_TABLE_LEN],
}

static LIVE_TABLE: OnceLock<LiveTable> = OnceLock::new();

/// Process-wide table, built on first use and never written again.
#[inline]
pub fn live_table() -> &'static LiveTable {
    LIVE_TABLE.get_or_init(LiveTable::new)
}

impl LiveTable {
    fn new() -> Self {
        let mut table = [0; LIVE_TABLE_LEN];
        for (index, slot) in table.iter_mut().enumerate() {
            let alive = index >> BITS_PER_CELL == 1;
            let total = index & ((1 << BITS_PER_CELL) - 1);
            *slot = next_state(alive, total) as Element;
        }
        Self { table }
    }

    /// Next state (0 or 1) for a lane with the given self bit and 3x3 total.
    #[inline(always)]
    pub fn lookup(&self, alive: Element, total: Element) -> Element {
        self.table[((alive << BITS_PER_CELL) | total) as usize]
    }
}

fn next_state(alive: bool, total: usize) -> bool {
    total == 3 || (alive && total == 4)
}

#[cfg(test)]
mod tests {
    use super::{LIVE_TABLE_LEN, live_table};

    fn expected_output(alive: bool, total: u64) -> u64 {
        let neighbors = total - alive as u64;
        let next_alive = if alive {
            neighbors == 2 || neighbors == 3
        } else {
            neighbors == 3
        };
        next_alive as u64
    }

    #[test]
    fn live_table_matches_reference() {
        let table = live_table();
        for alive in [false, true] {
            // A live cell's total is at least 1.
            for total in (alive as u64)..=9 {
                let expected = expected_output(alive, total);
                let got = table.lookup(alive as u64, total);
                assert_eq!(got, expected, "alive {alive} total {total}");
            }
        }
    }

    #[test]
    fn live_table_is_shared() {
        assert!(std::ptr::eq(live_table(), live_table()));
        assert_eq!(LIVE_TABLE_LEN, 32);
    }

    #[test]
    fn unreachable_totals_are_dead() {
        let table = live_table();
        for total in 10..16 {
            assert_eq!(table.lookup(0, total), 0);
            assert_eq!(table.lookup(1, total), 0);
        }
    }
}

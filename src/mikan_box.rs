//! The box: a grid of cells holding items, chain detection and spoil marking.
//!
//! Row 0 is the visible bottom. Rows `row_count..row_count + row_margin` are an
//! invisible buffer above the visible area. Screen coordinates grow downwards,
//! with y = 0 at the top of the visible area.

use crate::error::{GameError, Result};
use crate::item::{Item, ItemKind};
use crate::surface::{Renderable, Surface};

/// Minimum number of mikans in a chain.
pub const CHAIN_LENGTH: usize = 4;

/// `(column, row)` of a cell.
pub type Cell = (i32, i32);

/// Cells of connected, maximally damaged mikans.
pub type Chain = Vec<Cell>;

/// The eight surrounding cells.
pub const SURROUNDINGS: [Cell; 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const NEIGHBORS: [Cell; 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Empty,
    Chain,
    Spoil,
}

#[derive(Debug)]
pub struct MikanBox {
    column_count: usize,
    row_count: usize,
    row_margin: usize,
    cell_size: u32,
    cells: Vec<Option<Item>>,
}

impl MikanBox {
    /// Empty box. Fails if any of the counts or the cell size is zero.
    pub fn new(
        column_count: usize,
        row_count: usize,
        row_margin: usize,
        cell_size: u32,
    ) -> Result<Self> {
        if column_count == 0 {
            return Err(GameError::InvalidDimension {
                name: "column_count",
                value: 0,
            });
        }
        if row_count == 0 {
            return Err(GameError::InvalidDimension {
                name: "row_count",
                value: 0,
            });
        }
        if cell_size == 0 {
            return Err(GameError::InvalidDimension {
                name: "cell_size",
                value: 0,
            });
        }
        let len = column_count * (row_count + row_margin);
        let mut cells = Vec::with_capacity(len);
        cells.resize_with(len, || None);
        Ok(Self {
            column_count,
            row_count,
            row_margin,
            cell_size,
            cells,
        })
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Visible rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn row_margin(&self) -> usize {
        self.row_margin
    }

    /// Visible plus buffer rows.
    pub fn max_row_count(&self) -> usize {
        self.row_count + self.row_margin
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn width(&self) -> f64 {
        (self.column_count as f64) * f64::from(self.cell_size)
    }

    /// Height of the visible area; the buffer rows are not counted.
    pub fn height(&self) -> f64 {
        (self.row_count as f64) * f64::from(self.cell_size)
    }

    pub fn column_at(&self, x: f64) -> i32 {
        (x / f64::from(self.cell_size)).floor() as i32
    }

    pub fn row_at(&self, y: f64) -> i32 {
        ((self.height() - y - 1.0) / f64::from(self.cell_size)).floor() as i32
    }

    pub fn left_x_of(&self, column: i32) -> f64 {
        f64::from(column) * f64::from(self.cell_size)
    }

    pub fn top_y_of(&self, row: i32) -> f64 {
        (self.row_count as f64 - f64::from(row) - 1.0) * f64::from(self.cell_size)
    }

    pub fn is_valid_cell(&self, column: i32, row: i32) -> bool {
        column >= 0
            && (column as usize) < self.column_count
            && row >= 0
            && (row as usize) < self.max_row_count()
    }

    fn check_cell(&self, column: i32, row: i32) -> Result<usize> {
        if self.is_valid_cell(column, row) {
            Ok(self.index_of(column, row))
        } else {
            Err(GameError::OutOfRange {
                column,
                row,
                columns: self.column_count,
                rows: self.max_row_count(),
            })
        }
    }

    /// Column-major: a column's cells are contiguous, bottom first.
    fn index_of(&self, column: i32, row: i32) -> usize {
        row as usize + column as usize * self.max_row_count()
    }

    pub fn item_at(&self, column: i32, row: i32) -> Result<Option<&Item>> {
        let idx = self.check_cell(column, row)?;
        Ok(self.cells[idx].as_ref())
    }

    /// Puts `item` in a vacant cell. With `align`, the item is also moved onto
    /// the cell's screen rectangle.
    pub fn place(&mut self, mut item: Item, column: i32, row: i32, align: bool) -> Result<()> {
        let idx = self.check_cell(column, row)?;
        if self.cells[idx].is_some() {
            return Err(GameError::Occupied { column, row });
        }
        if align {
            item.locate(self.left_x_of(column), self.top_y_of(row));
        }
        self.cells[idx] = Some(item);
        Ok(())
    }

    /// Removes and returns the item in a cell.
    pub fn take(&mut self, column: i32, row: i32) -> Result<Option<Item>> {
        let idx = self.check_cell(column, row)?;
        Ok(self.cells[idx].take())
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        self.cells.fill_with(|| None);
    }

    pub(crate) fn item_at_mut(&mut self, column: i32, row: i32) -> Result<Option<&mut Item>> {
        let idx = self.check_cell(column, row)?;
        Ok(self.cells[idx].as_mut())
    }

    fn is_max_damaged_mikan_at(&self, idx: usize) -> bool {
        self.cells[idx]
            .as_ref()
            .is_some_and(Item::is_max_damaged_mikan)
    }

    fn kind_at(&self, idx: usize) -> Option<ItemKind> {
        self.cells[idx].as_ref().map(Item::kind)
    }

    /// Every chain of at least [`CHAIN_LENGTH`] connected, maximally damaged
    /// mikans. Cells connect up, down, left and right; no cell is in two chains.
    pub fn chain_mikans(&self) -> Vec<Chain> {
        let mut chained = vec![false; self.cells.len()];
        let mut chains = Vec::new();
        let mut stack = Vec::new();
        for column in 0..self.column_count as i32 {
            for row in 0..self.max_row_count() as i32 {
                let idx = self.index_of(column, row);
                if chained[idx] || !self.is_max_damaged_mikan_at(idx) {
                    continue;
                }
                chained[idx] = true;
                let mut chain = vec![(column, row)];
                stack.push((column, row));
                while let Some((c, r)) = stack.pop() {
                    for (dc, dr) in NEIGHBORS {
                        let (c2, r2) = (c + dc, r + dr);
                        if !self.is_valid_cell(c2, r2) {
                            continue;
                        }
                        let idx2 = self.index_of(c2, r2);
                        if !chained[idx2] && self.is_max_damaged_mikan_at(idx2) {
                            chained[idx2] = true;
                            chain.push((c2, r2));
                            stack.push((c2, r2));
                        }
                    }
                }
                if chain.len() >= CHAIN_LENGTH {
                    chains.push(chain);
                }
            }
        }
        chains
    }

    /// Cells whose items get spoiled when `chains` are erased, column by column
    /// from the bottom.
    ///
    /// Occupied cells surrounding a chain are spoiled, except that a mikan next
    /// to a preservative is spared and the preservative is spoiled instead.
    pub fn spoil_targets(&self, chains: &[Chain]) -> Vec<Cell> {
        let mut markers = vec![Marker::Empty; self.cells.len()];
        self.mark_spoil_targets(chains, &mut markers);
        self.mark_absorbers(&mut markers);

        let mut targets = Vec::new();
        for column in 0..self.column_count as i32 {
            for row in 0..self.max_row_count() as i32 {
                if markers[self.index_of(column, row)] == Marker::Spoil {
                    targets.push((column, row));
                }
            }
        }
        targets
    }

    fn mark_spoil_targets(&self, chains: &[Chain], markers: &mut [Marker]) {
        for &(column, row) in chains.iter().flatten() {
            markers[self.index_of(column, row)] = Marker::Chain;
        }
        for &(column, row) in chains.iter().flatten() {
            for (dc, dr) in SURROUNDINGS {
                let (c2, r2) = (column + dc, row + dr);
                if !self.is_valid_cell(c2, r2) {
                    continue;
                }
                let idx = self.index_of(c2, r2);
                if markers[idx] != Marker::Chain && self.cells[idx].is_some() {
                    markers[idx] = Marker::Spoil;
                }
            }
        }
    }

    fn mark_absorbers(&self, markers: &mut [Marker]) {
        for column in 0..self.column_count as i32 {
            for row in 0..self.max_row_count() as i32 {
                let idx = self.index_of(column, row);
                if markers[idx] != Marker::Spoil || self.kind_at(idx) != Some(ItemKind::Mikan) {
                    continue;
                }
                for (dc, dr) in SURROUNDINGS {
                    let (c2, r2) = (column + dc, row + dr);
                    if !self.is_valid_cell(c2, r2) {
                        continue;
                    }
                    let idx2 = self.index_of(c2, r2);
                    if self.kind_at(idx2) == Some(ItemKind::Preservative) {
                        markers[idx2] = Marker::Spoil;
                        markers[idx] = Marker::Empty;
                    }
                }
            }
        }
    }
}

impl Renderable for MikanBox {
    /// Draws the items in the visible rows.
    fn render(&self, surface: &mut dyn Surface) {
        for column in 0..self.column_count as i32 {
            for row in 0..self.row_count as i32 {
                if let Some(item) = &self.cells[self.index_of(column, row)] {
                    item.render(surface);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::RecordingSurface;

    fn mikan_box() -> MikanBox {
        MikanBox::new(8, 12, 8, 32).unwrap()
    }

    fn fill(mikan_box: &mut MikanBox, cells: &[Cell], make: impl Fn() -> Item) {
        for &(c, r) in cells {
            mikan_box.place(make(), c, r, true).unwrap();
        }
    }

    #[test]
    fn test_new_rejects_empty_dimensions() {
        assert_eq!(
            MikanBox::new(0, 12, 8, 32).unwrap_err(),
            GameError::InvalidDimension {
                name: "column_count",
                value: 0
            }
        );
        assert!(MikanBox::new(8, 0, 8, 32).is_err());
        assert!(MikanBox::new(8, 12, 8, 0).is_err());
        assert!(MikanBox::new(1, 1, 0, 1).is_ok());
    }

    #[test]
    fn test_geometry() {
        let mb = mikan_box();
        assert_eq!(mb.width(), 256.0);
        assert_eq!(mb.height(), 384.0);
        assert_eq!(mb.max_row_count(), 20);
        assert_eq!(mb.top_y_of(0), 352.0);
        assert_eq!(mb.top_y_of(11), 0.0);
        assert_eq!(mb.top_y_of(12), -32.0);
        assert_eq!(mb.left_x_of(3), 96.0);
        assert_eq!(mb.row_at(352.0), 0);
        assert_eq!(mb.row_at(383.0), 0);
        assert_eq!(mb.row_at(384.0), -1);
        assert_eq!(mb.row_at(-1.0), 12);
        assert_eq!(mb.column_at(95.0), 2);
        assert_eq!(mb.column_at(-0.5), -1);
    }

    #[test]
    fn test_item_at_out_of_range() {
        let mb = mikan_box();
        assert!(mb.item_at(0, 19).unwrap().is_none());
        assert_eq!(
            mb.item_at(8, 0).unwrap_err(),
            GameError::OutOfRange {
                column: 8,
                row: 0,
                columns: 8,
                rows: 20
            }
        );
        assert!(mb.item_at(0, 20).is_err());
        assert!(mb.item_at(-1, 0).is_err());
        assert!(mb.item_at(0, -1).is_err());
    }

    #[test]
    fn test_place() {
        let mut mb = mikan_box();
        let mut item = Item::mikan(1);
        item.locate(5.0, 5.0);
        mb.place(item, 2, 0, false).unwrap();
        assert_eq!(mb.item_at(2, 0).unwrap().map(|i| (i.x, i.y)), Some((5.0, 5.0)));

        assert_eq!(
            mb.place(Item::mikan(0), 2, 0, true),
            Err(GameError::Occupied { column: 2, row: 0 })
        );
        assert!(mb.place(Item::mikan(0), 2, 20, true).is_err());

        mb.place(Item::preservative(), 3, 1, true).unwrap();
        let placed = mb.item_at(3, 1).unwrap().unwrap();
        assert_eq!((placed.x, placed.y), (96.0, 320.0));

        assert!(mb.take(3, 1).unwrap().is_some());
        assert!(mb.item_at(3, 1).unwrap().is_none());
    }

    #[test]
    fn test_l_shaped_chain_of_four() {
        let mut mb = mikan_box();
        fill(&mut mb, &[(0, 0), (0, 1), (0, 2), (1, 0)], || Item::mikan(3));
        // isolated group of three
        fill(&mut mb, &[(5, 0), (6, 0), (6, 1)], || Item::mikan(3));
        // not maximally damaged
        fill(&mut mb, &[(2, 0), (3, 0)], || Item::mikan(2));

        let chains = mb.chain_mikans();
        assert_eq!(chains.len(), 1);
        let mut chain = chains[0].clone();
        chain.sort_unstable();
        assert_eq!(chain, vec![(0, 0), (0, 1), (0, 2), (1, 0)]);
    }

    #[test]
    fn test_diagonal_cells_do_not_chain() {
        let mut mb = mikan_box();
        fill(&mut mb, &[(0, 0), (1, 1), (2, 2), (3, 3)], || Item::mikan(3));
        assert!(mb.chain_mikans().is_empty());
    }

    #[test]
    fn test_separate_chains_and_buffer_rows() {
        let mut mb = mikan_box();
        fill(&mut mb, &[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)], || {
            Item::mikan(3)
        });
        fill(&mut mb, &[(7, 10), (7, 11), (7, 12), (7, 13)], || Item::mikan(3));
        fill(&mut mb, &[(5, 0)], Item::preservative);

        let mut sizes: Vec<_> = mb.chain_mikans().iter().map(Vec::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![4, 5]);
    }

    #[test]
    fn test_spoil_targets_surround_chain() {
        let mut mb = mikan_box();
        fill(&mut mb, &[(1, 0), (2, 0), (3, 0), (4, 0)], || Item::mikan(3));
        fill(&mut mb, &[(0, 0), (2, 1), (5, 1), (6, 0)], || Item::mikan(0));

        let chains = mb.chain_mikans();
        assert_eq!(mb.spoil_targets(&chains), vec![(0, 0), (2, 1), (5, 1)]);
    }

    #[test]
    fn test_diagonal_preservative_takes_the_spoil() {
        let mut mb = mikan_box();
        fill(&mut mb, &[(0, 0), (1, 0), (2, 0), (3, 0)], || Item::mikan(3));
        // spoil-marked mikan above the chain
        fill(&mut mb, &[(1, 1)], || Item::mikan(1));
        // diagonal to (1, 1), two rows above the chain
        fill(&mut mb, &[(2, 2)], Item::preservative);

        let chains = mb.chain_mikans();
        assert_eq!(mb.spoil_targets(&chains), vec![(2, 2)]);
    }

    #[test]
    fn test_render_draws_visible_rows_only() {
        let mut mb = MikanBox::new(2, 2, 2, 10).unwrap();
        mb.place(Item::mikan(1), 0, 0, true).unwrap();
        mb.place(Item::mikan(2), 1, 1, true).unwrap();
        mb.place(Item::mikan(3), 1, 3, true).unwrap();

        let mut surface = RecordingSurface::default();
        mb.render(&mut surface);
        assert_eq!(
            surface.items,
            vec![
                (ItemKind::Mikan, 1, 0.0, 10.0),
                (ItemKind::Mikan, 2, 10.0, 0.0)
            ]
        );
    }
}

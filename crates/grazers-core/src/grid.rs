//! Row-major grid storage with wrap-around addressing.

use crate::Position;
use crate::cell::{Cell, CellTag};

/// Neighbour offsets clockwise from the top-left corner.
pub const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

/// Fixed-size grid of cells.
#[derive(Debug, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Clone for Grid {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            cells: self.cells.clone(),
        }
    }

    /// Refill in place; the cell buffer is reused when the sizes match.
    fn clone_from(&mut self, source: &Self) {
        self.width = source.width;
        self.height = source.height;
        self.cells.clone_from(&source.cells);
    }
}

impl Grid {
    /// Build a grid from `width * height` cells laid out row-major.
    ///
    /// Returns `None` when the cell count does not match the dimensions.
    #[must_use]
    pub fn from_cells(width: usize, height: usize, cells: Vec<Cell>) -> Option<Self> {
        (width > 0 && height > 0 && cells.len() == width * height).then_some(Self {
            width,
            height,
            cells,
        })
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Returns the flat index for `pos` without bounds checks.
    #[inline]
    fn offset(&self, pos: Position) -> usize {
        pos.y * self.width + pos.x
    }

    #[must_use]
    pub fn position_of(&self, index: usize) -> Position {
        Position::new(index % self.width, index / self.width)
    }

    /// Immutable access to a cell. Panics if `pos` is outside the grid.
    #[must_use]
    pub fn cell(&self, pos: Position) -> &Cell {
        &self.cells[self.offset(pos)]
    }

    /// Mutable access to a cell. Panics if `pos` is outside the grid.
    pub fn cell_mut(&mut self, pos: Position) -> &mut Cell {
        let idx = self.offset(pos);
        &mut self.cells[idx]
    }

    pub fn get(&self, pos: Position) -> Option<&Cell> {
        self.contains(pos).then(|| self.cell(pos))
    }

    /// Overwrite the cell at `pos`.
    pub fn set(&mut self, pos: Position, cell: Cell) {
        *self.cell_mut(pos) = cell;
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Step from `pos` by `(dx, dy)`, wrapping around both axes.
    #[must_use]
    pub fn wrap(&self, pos: Position, dx: isize, dy: isize) -> Position {
        let x = (pos.x as isize + dx).rem_euclid(self.width as isize) as usize;
        let y = (pos.y as isize + dy).rem_euclid(self.height as isize) as usize;
        Position::new(x, y)
    }

    /// Costs of the eight neighbours of `pos`, clockwise from the top-left.
    #[must_use]
    pub fn neighbor_costs(&self, pos: Position) -> [f32; 8] {
        NEIGHBOR_OFFSETS.map(|(dx, dy)| self.cell(self.wrap(pos, dx, dy)).cost())
    }

    /// Number of live organisms on the grid.
    #[must_use]
    pub fn count_organisms(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.tag() == CellTag::Organism)
            .count()
    }

    #[must_use]
    pub fn count_tag(&self, tag: CellTag) -> usize {
        self.cells.iter().filter(|cell| cell.tag() == tag).count()
    }

    /// Reset every non-wall position to empty, keeping slots.
    pub fn clear_to_walls(&mut self) {
        for cell in &mut self.cells {
            if cell.tag() != CellTag::Wall {
                *cell = Cell::empty(cell.slot());
            }
        }
    }

    /// Positions whose observable signature differs between `self` and `next`.
    pub fn changed<'a>(&'a self, next: &'a Grid) -> impl Iterator<Item = &'a Cell> + 'a {
        self.cells
            .iter()
            .zip(&next.cells)
            .filter(|(before, after)| before.signature() != after.signature())
            .map(|(_, after)| after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SlotId;
    use proptest::prelude::*;

    fn empty_grid(width: usize, height: usize) -> Grid {
        let cells = (0..width * height)
            .map(|idx| Cell::empty(SlotId(idx as u64)))
            .collect();
        Grid::from_cells(width, height, cells).expect("grid")
    }

    #[test]
    fn from_cells_rejects_mismatched_dimensions() {
        assert!(Grid::from_cells(3, 3, vec![Cell::empty(SlotId(0)); 8]).is_none());
        assert!(Grid::from_cells(0, 3, Vec::new()).is_none());
    }

    #[test]
    fn wrap_crosses_every_edge() {
        let grid = empty_grid(10, 6);
        assert_eq!(grid.wrap(Position::new(4, 0), 0, -1), Position::new(4, 5));
        assert_eq!(grid.wrap(Position::new(4, 5), 0, 1), Position::new(4, 0));
        assert_eq!(grid.wrap(Position::new(0, 2), -1, 0), Position::new(9, 2));
        assert_eq!(grid.wrap(Position::new(9, 2), 1, 0), Position::new(0, 2));
        assert_eq!(grid.wrap(Position::new(5, 3), 1, 0), Position::new(6, 3));
    }

    #[test]
    fn neighbor_costs_are_clockwise_from_top_left() {
        let mut grid = empty_grid(5, 5);
        let center = Position::new(2, 2);
        grid.set(Position::new(1, 1), Cell::wall(SlotId(99)));
        grid.set(Position::new(3, 2), Cell::food(SlotId(98)));
        grid.set(Position::new(1, 2), Cell::wall(SlotId(97)));
        let costs = grid.neighbor_costs(center);
        assert_eq!(costs, [-1.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, -1.0]);
    }

    #[test]
    fn neighbor_costs_wrap_horizontally() {
        let mut grid = empty_grid(4, 3);
        grid.set(Position::new(3, 1), Cell::wall(SlotId(50)));
        let costs = grid.neighbor_costs(Position::new(0, 1));
        // Left neighbour of column 0 is the last column.
        assert_eq!(costs[7], -1.0);
    }

    #[test]
    fn clear_to_walls_keeps_walls_and_slots() {
        let mut grid = empty_grid(3, 3);
        grid.set(Position::new(0, 0), Cell::wall(SlotId(0)));
        grid.set(Position::new(1, 1), Cell::food(SlotId(4)));
        grid.clear_to_walls();
        assert_eq!(grid.count_tag(CellTag::Wall), 1);
        assert_eq!(grid.count_tag(CellTag::Food), 0);
        assert_eq!(grid.cell(Position::new(1, 1)).slot(), SlotId(4));
    }

    #[test]
    fn changed_reports_only_differing_positions() {
        let before = empty_grid(3, 3);
        let mut after = before.clone();
        after.set(Position::new(2, 1), Cell::food(SlotId(5)));
        let changed: Vec<_> = before.changed(&after).map(Cell::slot).collect();
        assert_eq!(changed, vec![SlotId(5)]);

        // Reserving a cell is not visible to the display.
        let mut reserved = before.clone();
        reserved.cell_mut(Position::new(0, 0)).reserve();
        assert_eq!(before.changed(&reserved).count(), 0);
    }

    #[test]
    fn clone_from_reuses_the_cell_buffer() {
        let mut read = empty_grid(8, 6);
        read.set(Position::new(3, 2), Cell::food(SlotId(19)));
        let mut write = empty_grid(8, 6);
        let buffer = write.cells().as_ptr();

        write.clone_from(&read);
        assert_eq!(write.cells().as_ptr(), buffer);
        assert_eq!(write, read);
    }

    proptest! {
        #[test]
        fn wrap_stays_inside_and_inverts(
            width in 1usize..40,
            height in 1usize..40,
            x in 0usize..40,
            y in 0usize..40,
            dx in -3isize..=3,
            dy in -3isize..=3,
        ) {
            let grid = empty_grid(width, height);
            let start = Position::new(x % width, y % height);
            let moved = grid.wrap(start, dx, dy);
            prop_assert!(grid.contains(moved));
            prop_assert_eq!(grid.wrap(moved, -dx, -dy), start);
        }
    }
}

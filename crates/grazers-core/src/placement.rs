//! Random scatter of new occupants onto free positions.

use rand::{Rng, RngCore};
use tracing::warn;

use crate::SlotId;
use crate::cell::Cell;
use crate::grid::Grid;

/// Chance of claiming a free position per sweep for large requests.
pub const SCATTER_PROBABILITY: f64 = 0.1;
/// Chance used for requests below [`SMALL_REQUEST`].
pub const SPARSE_SCATTER_PROBABILITY: f64 = 0.01;
pub const SMALL_REQUEST: usize = 100;

/// Place up to `count` cells built by `make_cell` on non-solid positions.
///
/// Sweeps the grid row-major, claiming each free position with a fixed
/// probability, for at most `max_sweeps` sweeps. Whatever is still pending
/// afterwards is placed on the first free positions in row-major order.
/// Returns how many cells were placed, which is less than `count` only when
/// the grid ran out of free positions.
pub fn scatter<F>(
    grid: &mut Grid,
    rng: &mut dyn RngCore,
    count: usize,
    max_sweeps: usize,
    mut make_cell: F,
) -> usize
where
    F: FnMut(SlotId) -> Cell,
{
    let probability = if count < SMALL_REQUEST {
        SPARSE_SCATTER_PROBABILITY
    } else {
        SCATTER_PROBABILITY
    };
    let mut placed = 0;

    for _ in 0..max_sweeps {
        if placed == count {
            return placed;
        }
        let mut free_seen = false;
        for cell in grid.cells_mut() {
            if placed == count {
                break;
            }
            if cell.is_solid() {
                continue;
            }
            free_seen = true;
            if rng.random_bool(probability) {
                *cell = make_cell(cell.slot());
                placed += 1;
            }
        }
        if !free_seen {
            break;
        }
    }

    for cell in grid.cells_mut() {
        if placed == count {
            break;
        }
        if !cell.is_solid() {
            *cell = make_cell(cell.slot());
            placed += 1;
        }
    }

    if placed < count {
        warn!(requested = count, placed, "grid ran out of free positions");
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellTag;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn grid(width: usize, height: usize) -> Grid {
        let cells = (0..width * height)
            .map(|idx| Cell::empty(SlotId(idx as u64)))
            .collect();
        Grid::from_cells(width, height, cells).expect("grid")
    }

    #[test]
    fn places_exact_count_and_keeps_slots() {
        let mut grid = grid(20, 20);
        let mut rng = SmallRng::seed_from_u64(3);
        let placed = scatter(&mut grid, &mut rng, 150, 64, Cell::food);
        assert_eq!(placed, 150);
        assert_eq!(grid.count_tag(CellTag::Food), 150);
        for (idx, cell) in grid.cells().iter().enumerate() {
            assert_eq!(cell.slot(), SlotId(idx as u64));
        }
    }

    #[test]
    fn never_overwrites_solid_positions() {
        let mut grid = grid(10, 10);
        for idx in 0..50 {
            grid.cells_mut()[idx] = Cell::wall(SlotId(idx as u64));
        }
        let mut rng = SmallRng::seed_from_u64(8);
        let placed = scatter(&mut grid, &mut rng, 30, 64, Cell::food);
        assert_eq!(placed, 30);
        assert_eq!(grid.count_tag(CellTag::Wall), 50);
        assert_eq!(grid.count_tag(CellTag::Food), 30);
    }

    #[test]
    fn terminates_on_a_full_grid() {
        let mut grid = grid(4, 4);
        for cell in grid.cells_mut() {
            *cell = Cell::wall(cell.slot());
        }
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(scatter(&mut grid, &mut rng, 5, 1_000, Cell::food), 0);
    }

    #[test]
    fn fills_every_free_position_when_overrequested() {
        let mut grid = grid(5, 5);
        let mut rng = SmallRng::seed_from_u64(2);
        assert_eq!(scatter(&mut grid, &mut rng, 40, 2, Cell::food), 25);
        assert_eq!(grid.count_tag(CellTag::Food), 25);
    }
}

use serde::{Deserialize, Serialize};

use crate::env::Dir;
use crate::grid::{Cell, Grid, Pos};

/// Read-only snapshot handed to policies each step. Field names are a stable
/// contract with external drivers; adding fields is fine, renaming is not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub robot_pos: Pos,
    pub has_item: bool,
    pub pickup_pos: Pos,
    pub dropoff_pos: Pos,
    pub battery: i32,
    pub steps: u32,
    /// Square window of side 2*view_radius+1 centered on the robot;
    /// everything outside the grid shows as wall.
    pub local_grid: Vec<Vec<Cell>>,
}

/// Cut the robot-centered window out of the grid. Out-of-grid cells render
/// as wall via `Grid::is_wall`, so window lookups and direct grid queries
/// can never disagree about a cell both can see.
pub(crate) fn local_window(grid: &Grid, center: Pos, radius: usize) -> Vec<Vec<Cell>> {
    let side = 2 * radius + 1;
    (0..side)
        .map(|wr| {
            (0..side)
                .map(|wc| {
                    let row = center.0 - radius as i32 + wr as i32;
                    let col = center.1 - radius as i32 + wc as i32;
                    if grid.is_wall(row, col) {
                        Cell::Wall
                    } else {
                        Cell::Floor
                    }
                })
                .collect()
        })
        .collect()
}

impl Observation {
    pub fn view_radius(&self) -> usize {
        self.local_grid.len() / 2
    }

    /// Whether the cell adjacent to the robot in `dir` is a wall, judged
    /// from the local window alone. A zero-radius window hides its
    /// neighbors, which then count as blocked.
    pub fn blocked(&self, dir: Dir) -> bool {
        let center = self.view_radius() as i32;
        let (dr, dc) = dir.delta();
        let (wr, wc) = (center + dr, center + dc);
        if wr < 0 || wc < 0 {
            return true;
        }
        match self.local_grid.get(wr as usize).and_then(|row| row.get(wc as usize)) {
            Some(cell) => *cell == Cell::Wall,
            None => true,
        }
    }

    /// Movement directions whose destination is not a wall.
    pub fn unblocked_dirs(&self) -> Vec<Dir> {
        Dir::ALL.iter().copied().filter(|d| !self.blocked(*d)).collect()
    }

    /// Window as text rows, same glyphs as the rendered grid.
    pub fn local_rows(&self) -> Vec<String> {
        self.local_grid
            .iter()
            .map(|row| row.iter().map(|c| c.glyph()).collect())
            .collect()
    }
}

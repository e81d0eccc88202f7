use serde::{Deserialize, Serialize};

use crate::rng::LcgRng;

/// (row, col) coordinate. Signed so neighbor arithmetic can leave the grid;
/// `Grid::is_wall` classifies anything out of bounds as a wall.
pub type Pos = (i32, i32);

/// Cell encodings: 0 floor, 1 wall. Glyphs match the rendered text schema.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Cell {
    Floor = 0,
    Wall = 1,
}

impl Cell {
    pub fn from_code(code: u8) -> Cell {
        match code {
            1 => Cell::Wall,
            _ => Cell::Floor,
        }
    }
    pub fn code(self) -> u8 {
        self as u8
    }
    pub fn glyph(self) -> char {
        match self {
            Cell::Floor => '.',
            Cell::Wall => '#',
        }
    }
}

/// Fixed warehouse floor plan, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// An all-floor grid. The boundary is implicit: out-of-grid is wall.
    pub fn open(width: usize, height: usize) -> Self {
        Self { width, height, cells: vec![Cell::Floor.code(); width * height] }
    }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    #[inline]
    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.height && (col as usize) < self.width
    }

    /// Boundary-safe wall predicate: any out-of-grid coordinate is a wall.
    #[inline]
    pub fn is_wall(&self, row: i32, col: i32) -> bool {
        if !self.in_bounds(row, col) {
            return true;
        }
        self.get(row as usize, col as usize) == Cell::Wall
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        Cell::from_code(self.cells[self.idx(row, col)])
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        let i = self.idx(row, col);
        self.cells[i] = cell.code();
    }

    /// All floor coordinates, row-major order.
    pub fn floor_cells(&self) -> Vec<Pos> {
        let mut out = Vec::new();
        for row in 0..self.height {
            for col in 0..self.width {
                if self.get(row, col) == Cell::Floor {
                    out.push((row as i32, col as i32));
                }
            }
        }
        out
    }

    /// Plain text rows of the floor plan, one `String` per row.
    pub fn rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|row| (0..self.width).map(|col| self.get(row, col).glyph()).collect())
            .collect()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("grid needs at least three floor cells, got {0}")]
    TooSmall(usize),
    #[error("{name} position {pos:?} is not a floor cell")]
    BadLandmark { name: &'static str, pos: Pos },
    #[error("start/pickup/dropoff positions must be pairwise distinct")]
    OverlappingLandmarks,
}

/// A floor plan plus the default start/pickup/dropoff landmarks used by
/// non-randomized resets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub grid: Grid,
    pub start_pos: Pos,
    pub pickup_pos: Pos,
    pub dropoff_pos: Pos,
}

impl Layout {
    /// Open floor with landmarks in three corners.
    pub fn open(width: usize, height: usize) -> Self {
        let grid = Grid::open(width, height);
        Self {
            grid,
            start_pos: (0, 0),
            pickup_pos: (0, width as i32 - 1),
            dropoff_pos: (height as i32 - 1, width as i32 - 1),
        }
    }

    /// Landmarks must be distinct floor cells and the floor must be big
    /// enough that a randomized reset can place three distinct landmarks.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let floor = self.grid.floor_cells();
        if floor.len() < 3 {
            return Err(LayoutError::TooSmall(floor.len()));
        }
        for (name, pos) in [
            ("start", self.start_pos),
            ("pickup", self.pickup_pos),
            ("dropoff", self.dropoff_pos),
        ] {
            if self.grid.is_wall(pos.0, pos.1) {
                return Err(LayoutError::BadLandmark { name, pos });
            }
        }
        if self.start_pos == self.pickup_pos
            || self.start_pos == self.dropoff_pos
            || self.pickup_pos == self.dropoff_pos
        {
            return Err(LayoutError::OverlappingLandmarks);
        }
        Ok(())
    }

    /// Deterministically scatter `num_walls` interior walls, then pick three
    /// distinct floor cells for the landmarks. Placement order is fixed so a
    /// given seed always yields the same layout. Reachability between the
    /// landmarks is not guaranteed; unreachable goals simply truncate.
    pub fn from_seed(width: usize, height: usize, num_walls: usize, seed: u64) -> Self {
        let mut grid = Grid::open(width, height);
        let mut rng = LcgRng::new(seed);
        let mut free: Vec<Pos> = grid.floor_cells();
        // Never wall so much that the three landmarks no longer fit.
        let walls = num_walls.min(free.len().saturating_sub(3));
        for _ in 0..walls {
            let i = rng.gen_index(free.len());
            let (row, col) = free.swap_remove(i);
            grid.set(row as usize, col as usize, Cell::Wall);
        }
        let i = rng.gen_index(free.len());
        let start_pos = free.swap_remove(i);
        let i = rng.gen_index(free.len());
        let pickup_pos = free.swap_remove(i);
        let i = rng.gen_index(free.len());
        let dropoff_pos = free.swap_remove(i);
        Self { grid, start_pos, pickup_pos, dropoff_pos }
    }
}

/// The fixed default warehouse floor used by tests and demos.
#[derive(Clone, Debug)]
pub struct StandardLayout;

impl StandardLayout {
    /// 10x10 floor with four shelving blocks:
    /// ```text
    /// ..........
    /// ..##..##..
    /// ..##..##..
    /// ..........
    /// ..........
    /// ..##..##..
    /// ..##..##..
    /// ..........
    /// ..........
    /// ..........
    /// ```
    /// Start at (0,0), pickup at (4,4), dropoff at (9,9).
    pub fn build() -> Layout {
        let mut grid = Grid::open(10, 10);
        for row in [1usize, 2, 5, 6] {
            for col in [2usize, 3, 6, 7] {
                grid.set(row, col, Cell::Wall);
            }
        }
        Layout { grid, start_pos: (0, 0), pickup_pos: (4, 4), dropoff_pos: (9, 9) }
    }
}

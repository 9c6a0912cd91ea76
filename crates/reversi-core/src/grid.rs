//! Board grid: the fixed set of cells for a given shape and size.
//!
//! This module contains:
//! - Construction of the legal coordinate set for hex and square boards
//! - Seeding of the opening discs
//! - Neighbor, corner and direction queries
//!
//! The coordinate set never changes after construction, only cell colors do.
//! Cells are kept in a fixed enumeration order (row-major, ascending column) so
//! every "first legal move" style query is deterministic.

use crate::cell::{Cell, DiscColor};
use crate::coord::{Coordinate, Topology};
use crate::model::GameError;
use std::collections::HashMap;

/// Opening discs for the first and second player on a hex board
const HEX_SEEDS: [&[(i32, i32)]; 2] = [&[(1, 0), (0, -1), (-1, 1)], &[(-1, 0), (0, 1), (1, -1)]];

/// Opening discs for the first and second player on a square board
const SQUARE_SEEDS: [&[(i32, i32)]; 2] = [&[(-1, -1), (1, 1)], &[(-1, 1), (1, -1)]];

/// The board's coordinate to cell mapping.
#[derive(Debug)]
pub struct Grid {
    topology: Topology,
    layers: i32,
    /// Enumeration order of all coordinates
    order: Vec<Coordinate>,
    cells: HashMap<Coordinate, Cell>,
}

impl Grid {
    /// Build a board of the given shape, seeding `first` and `second`'s opening discs.
    pub fn new(
        topology: Topology,
        layers: i32,
        first: DiscColor,
        second: DiscColor,
    ) -> Result<Self, GameError> {
        if layers < topology.min_layers() {
            return Err(GameError::InvalidLayers {
                topology,
                layers,
                min: topology.min_layers(),
            });
        }

        let order = match topology {
            Topology::Hex => Self::hex_coordinates(layers),
            Topology::Square => Self::square_coordinates(layers),
        };
        let cells = order.iter().map(|&c| (c, Cell::new(topology))).collect();

        let mut grid = Self {
            topology,
            layers,
            order,
            cells,
        };
        grid.seed(first, second)?;
        Ok(grid)
    }

    /// All `(row, col)` with `|row|`, `|col|` and `|row + col|` at most `layers`.
    fn hex_coordinates(layers: i32) -> Vec<Coordinate> {
        let mut coords = Vec::new();
        let mut col_start = 0;
        let mut col_end = layers;
        for row in -layers..=layers {
            for col in col_start..=col_end {
                coords.push(Coordinate::new(row, col));
            }
            if row < 0 {
                col_start -= 1;
            } else {
                col_end -= 1;
            }
        }
        coords
    }

    /// The `(2N+1)x(2N+1)` square minus the zero row and zero column.
    fn square_coordinates(layers: i32) -> Vec<Coordinate> {
        let mut coords = Vec::new();
        for row in -layers..=layers {
            for col in -layers..=layers {
                if row != 0 && col != 0 {
                    coords.push(Coordinate::new(row, col));
                }
            }
        }
        coords
    }

    fn seed(&mut self, first: DiscColor, second: DiscColor) -> Result<(), GameError> {
        let seeds = match self.topology {
            Topology::Hex => HEX_SEEDS,
            Topology::Square => SQUARE_SEEDS,
        };
        for (cells, color) in seeds.iter().zip([first, second]) {
            for &c in cells.iter() {
                self.recolor(c.into(), color)?;
            }
        }
        Ok(())
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn layers(&self) -> i32 {
        self.layers
    }

    /// Number of cells on the board
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether `coord` is on this board
    pub fn contains(&self, coord: Coordinate) -> bool {
        self.cells.contains_key(&coord)
    }

    /// All coordinates in enumeration order
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.order
    }

    /// Cells in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, &Cell)> + '_ {
        self.order.iter().map(move |c| (*c, &self.cells[c]))
    }

    pub fn cell(&self, coord: Coordinate) -> Result<&Cell, GameError> {
        self.cells
            .get(&coord)
            .ok_or(GameError::InvalidCoordinate(coord))
    }

    /// Color at `coord`, or `None` when it is off the board
    pub fn color_at(&self, coord: Coordinate) -> Option<DiscColor> {
        self.cells.get(&coord).map(Cell::color)
    }

    /// Recolor a cell. Fails when `coord` is off the board or already `color`.
    pub fn recolor(&mut self, coord: Coordinate, color: DiscColor) -> Result<(), GameError> {
        self.cells
            .get_mut(&coord)
            .ok_or(GameError::InvalidCoordinate(coord))?
            .change_color(color)
    }

    /// Set a cell to `color` whatever it currently holds. Used for custom openings.
    pub(crate) fn place(&mut self, coord: Coordinate, color: DiscColor) -> Result<(), GameError> {
        let cell = self
            .cells
            .get_mut(&coord)
            .ok_or(GameError::InvalidCoordinate(coord))?;
        if cell.color() != color {
            cell.change_color(color)?;
        }
        Ok(())
    }

    /// On-board first-degree neighbors of `coord`
    pub fn neighbors(&self, coord: Coordinate) -> Result<Vec<Coordinate>, GameError> {
        self.cell(coord)?;
        Ok(self
            .topology
            .neighbor_candidates(coord)
            .into_iter()
            .filter(|c| self.contains(*c))
            .collect())
    }

    /// Whether `coord` is one of the board's extremities.
    ///
    /// Hex boards have six corners, square boards four.
    pub fn is_corner(&self, coord: Coordinate) -> Result<bool, GameError> {
        self.cell(coord)?;
        let n = self.layers;
        let Coordinate { row, col } = coord;
        Ok(match self.topology {
            Topology::Hex => {
                (row == -n && (col == 0 || col == n))
                    || (row == n && (col == 0 || col == -n))
                    || (row == 0 && (col == n || col == -n))
            }
            Topology::Square => row.abs() == n && col.abs() == n,
        })
    }

    /// The coordinate one step past `c` when walking from `origin`. May be off the board.
    pub fn next_in_direction(&self, origin: Coordinate, c: Coordinate) -> Coordinate {
        self.topology.next_in_direction(origin, c)
    }

    /// Number of cells holding `color`
    pub fn count(&self, color: DiscColor) -> usize {
        self.cells.values().filter(|cell| cell.color() == color).count()
    }

    /// Deep copy sharing no cells with this grid
    pub fn deep_copy(&self) -> Grid {
        Grid {
            topology: self.topology,
            layers: self.layers,
            order: self.order.clone(),
            cells: self
                .cells
                .iter()
                .map(|(c, cell)| (*c, cell.duplicate()))
                .collect(),
        }
    }
}

//! Coordinate system shared by the hexagonal and square boards.
//!
//! This module provides the foundational geometry types:
//! - `Coordinate`: identifies a single cell as a `(row, col)` pair
//! - `Topology`: which board shape a coordinate lives on, and the direction math for it
//!
//! Hex boards use axial coordinates, so neighbors are a fixed set of six offsets.
//! Square boards have no row 0 and no column 0: the board is `(2N+1)x(2N+1)` with the
//! center cross removed. Any step that would land on a zero component is pushed one
//! further in the direction of travel.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Hex neighbor offsets as `(d_row, d_col)`, in enumeration order.
const HEX_OFFSETS: [(i32, i32); 6] = [(-1, 0), (1, 0), (0, -1), (0, 1), (1, -1), (-1, 1)];

/// Board shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    /// Concentric hexagonal rings, six neighbors per cell
    Hex,
    /// Square grid without a zero row or column, eight neighbors per cell
    Square,
}

impl Topology {
    /// Smallest layer count a board of this shape accepts.
    pub const fn min_layers(self) -> i32 {
        match self {
            Topology::Hex => 1,
            Topology::Square => 2,
        }
    }

    /// First-degree neighbor candidates of `coord`, before filtering against a grid.
    ///
    /// Square candidates are zero-skip corrected and deduplicated.
    pub fn neighbor_candidates(self, coord: Coordinate) -> Vec<Coordinate> {
        match self {
            Topology::Hex => HEX_OFFSETS
                .iter()
                .map(|&(dr, dc)| Coordinate::new(coord.row + dr, coord.col + dc))
                .collect(),
            Topology::Square => {
                let mut candidates = Vec::with_capacity(8);
                for dr in -1..=1 {
                    for dc in -1..=1 {
                        let candidate = Coordinate::new(
                            skip_zero(coord.row + dr, coord.row),
                            skip_zero(coord.col + dc, coord.col),
                        );
                        if candidate != coord && !candidates.contains(&candidate) {
                            candidates.push(candidate);
                        }
                    }
                }
                candidates
            }
        }
    }

    /// The coordinate one step past `c`, walking from `origin` through `c`.
    ///
    /// `c` may be any coordinate on the ray leaving `origin`, not just a direct
    /// neighbor: the step is the per-axis sign of `c - origin`.
    pub fn next_in_direction(self, origin: Coordinate, c: Coordinate) -> Coordinate {
        let (dr, dc) = origin.step_toward(&c);
        let next = Coordinate::new(c.row + dr, c.col + dc);
        match self {
            Topology::Hex => next,
            Topology::Square => {
                Coordinate::new(skip_zero(next.row, c.row), skip_zero(next.col, c.col))
            }
        }
    }
}

/// Pushes a component that landed on 0 to -1 or 1, continuing away from `from`.
fn skip_zero(value: i32, from: i32) -> i32 {
    if value != 0 {
        value
    } else if from > 0 {
        -1
    } else {
        1
    }
}

/// A cell position on either board.
///
/// Equality and hashing use the exact pair. Ordering is deliberately *not* derived:
/// the game orders coordinates by `row + col` alone, see [`Coordinate::cmp_by_sum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Coordinate {
    pub row: i32,
    pub col: i32,
}

impl Coordinate {
    /// Create a new coordinate
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// `row + col`, the only key the game orders coordinates by
    pub const fn sum(&self) -> i32 {
        self.row + self.col
    }

    /// Compares by `row + col` only.
    ///
    /// Distinct coordinates on the same anti-diagonal compare `Equal`, so this is a
    /// preorder, not a total order. Stable sorts keep their input order for ties.
    pub fn cmp_by_sum(&self, other: &Coordinate) -> Ordering {
        self.sum().cmp(&other.sum())
    }

    /// Per-axis sign of `other - self`.
    fn step_toward(&self, other: &Coordinate) -> (i32, i32) {
        ((other.row - self.row).signum(), (other.col - self.col).signum())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

//! Disc colors and the cells that hold them.

use crate::coord::Topology;
use crate::model::GameError;
use serde::{Deserialize, Serialize};

/// Color of the disc sitting in a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscColor {
    /// No disc
    Empty,
    Black,
    White,
}

impl DiscColor {
    /// Default turn order: black moves first
    pub const DEFAULT_PLAYERS: [DiscColor; 2] = [DiscColor::Black, DiscColor::White];

    /// Whether this is the "no disc" color
    pub const fn is_empty(self) -> bool {
        matches!(self, DiscColor::Empty)
    }
}

/// A single slot on the board.
///
/// Cells know which topology they belong to, so a copy of a cell is always built
/// through [`Cell::make_like`] rather than shared.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    topology: Topology,
    color: DiscColor,
}

impl Cell {
    /// Create an empty cell of the given kind
    pub const fn new(topology: Topology) -> Self {
        Self {
            topology,
            color: DiscColor::Empty,
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn color(&self) -> DiscColor {
        self.color
    }

    /// Recolor this cell.
    ///
    /// Recoloring to the current color is rejected, so a capture that is applied
    /// twice surfaces as an error instead of passing silently.
    pub fn change_color(&mut self, color: DiscColor) -> Result<(), GameError> {
        if self.color == color {
            return Err(GameError::AlreadyColored(color));
        }
        self.color = color;
        Ok(())
    }

    /// A fresh, empty cell of the same kind as this one
    pub fn make_like(&self) -> Cell {
        Cell::new(self.topology)
    }

    /// Deep copy: a fresh cell of the same kind, recolored to match.
    pub fn duplicate(&self) -> Cell {
        let mut copy = self.make_like();
        if copy.color != self.color {
            copy.color = self.color;
        }
        copy
    }
}

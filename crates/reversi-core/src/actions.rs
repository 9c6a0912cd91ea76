//! Moves a player can make.

use crate::coord::Coordinate;
use crate::model::{GameError, ReversiModel};
use serde::{Deserialize, Serialize};

/// A single turn's decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// Place a disc at the coordinate
    Play(Coordinate),
    /// Give up the turn
    Pass,
}

impl Move {
    /// Target cell, `None` for a pass
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            Move::Play(coord) => Some(*coord),
            Move::Pass => None,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Move::Pass)
    }

    /// Perform this move for whoever is on turn.
    pub fn apply(self, model: &mut ReversiModel) -> Result<(), GameError> {
        match self {
            Move::Play(coord) => model.play_disc(coord).map(|_| ()),
            Move::Pass => model.pass(),
        }
    }
}

impl From<Option<Coordinate>> for Move {
    fn from(coord: Option<Coordinate>) -> Self {
        coord.map_or(Move::Pass, Move::Play)
    }
}

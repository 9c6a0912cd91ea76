//! Players: whoever decides the moves for one color.
//!
//! This module contains:
//! - The `Player` trait shared by people and bots
//! - `HumanPlayer`, which plays whatever move was last handed to it
//!
//! AI players live in [`crate::bot`].

use crate::actions::Move;
use crate::cell::DiscColor;
use crate::coord::Coordinate;
use crate::model::GameError;
use crate::strategy::HumanStrategy;
use crate::view::BoardView;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Decision maker for one color
pub trait Player: Send + Sync {
    fn color(&self) -> DiscColor;

    fn is_human(&self) -> bool;

    /// Move to make on `board`, `None` to pass
    fn play(&self, board: &dyn BoardView) -> Result<Option<Coordinate>, GameError>;

    /// Hand over a move picked by a person
    fn receive_choice(&self, mv: Move) -> Result<(), GameError>;

    /// Forget any pending choice
    fn reset_choice(&self);
}

/// A seat controlled by a person.
#[derive(Debug)]
pub struct HumanPlayer {
    color: DiscColor,
    strategy: Mutex<HumanStrategy>,
}

impl HumanPlayer {
    pub fn new(color: DiscColor) -> Result<Self, GameError> {
        if color.is_empty() {
            return Err(GameError::InvalidPlayerColor(color));
        }
        Ok(Self {
            color,
            strategy: Mutex::new(HumanStrategy::new()),
        })
    }

    fn strategy(&self) -> MutexGuard<'_, HumanStrategy> {
        self.strategy.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Player for HumanPlayer {
    fn color(&self) -> DiscColor {
        self.color
    }

    fn is_human(&self) -> bool {
        true
    }

    fn play(&self, _board: &dyn BoardView) -> Result<Option<Coordinate>, GameError> {
        self.strategy().chosen_coordinate()
    }

    fn receive_choice(&self, mv: Move) -> Result<(), GameError> {
        self.strategy().notify_of_move_or_pass(mv);
        Ok(())
    }

    fn reset_choice(&self) {
        self.strategy().reset_choice();
    }
}

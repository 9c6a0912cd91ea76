//! AI players for Reversi.
//!
//! This module provides different difficulty levels of AI players:
//! - Easy: Grab the most discs
//! - Medium: Take corners, otherwise grab the most discs
//! - Hard: Take corners, stay off cells next to open corners, then grab the most discs

use crate::actions::Move;
use crate::cell::DiscColor;
use crate::coord::Coordinate;
use crate::model::GameError;
use crate::player::Player;
use crate::strategy::{AiStrategy, TryToWin};
use crate::view::BoardView;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Strategy a bot of this level plays with
    pub fn strategy(self) -> Result<Box<dyn AiStrategy>, GameError> {
        use crate::strategy::StrategyKind::*;
        Ok(match self {
            Difficulty::Easy => Box::new(CaptureMostCells),
            Difficulty::Medium => Box::new(TryToWin::new([PrioritizeCorners, CaptureMostCells])?),
            Difficulty::Hard => Box::new(TryToWin::new([
                PrioritizeCorners,
                AvoidCornerNeighbors,
                CaptureMostCells,
            ])?),
        })
    }
}

/// A seat played by a strategy
pub struct AiPlayer {
    color: DiscColor,
    strategy: Box<dyn AiStrategy>,
}

impl fmt::Debug for AiPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiPlayer")
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

impl AiPlayer {
    pub fn new(color: DiscColor, strategy: Box<dyn AiStrategy>) -> Result<Self, GameError> {
        if color.is_empty() {
            return Err(GameError::InvalidPlayerColor(color));
        }
        Ok(Self { color, strategy })
    }

    pub fn with_difficulty(color: DiscColor, difficulty: Difficulty) -> Result<Self, GameError> {
        Self::new(color, difficulty.strategy()?)
    }
}

impl Player for AiPlayer {
    fn color(&self) -> DiscColor {
        self.color
    }

    fn is_human(&self) -> bool {
        false
    }

    /// The strategy's pick, else the first legal move, else a pass.
    fn play(&self, board: &dyn BoardView) -> Result<Option<Coordinate>, GameError> {
        board.check_player(self.color)?;
        if let Some(coord) = self.strategy.choose_move(board, self.color)? {
            return Ok(Some(coord));
        }
        Ok(board.legal_moves(self.color)?.first().copied())
    }

    fn receive_choice(&self, _mv: Move) -> Result<(), GameError> {
        Err(GameError::NotHumanPlayer(self.color))
    }

    fn reset_choice(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Topology;
    use crate::model::ReversiModel;
    use crate::strategy::{StrategyKind, TryToBlock};

    fn started(topology: Topology, layers: i32) -> ReversiModel {
        let mut model = ReversiModel::builder()
            .topology(topology)
            .layers(layers)
            .build()
            .unwrap();
        model.start_game().unwrap();
        model
    }

    #[test]
    fn test_bot_creation() {
        let bot = AiPlayer::with_difficulty(DiscColor::White, Difficulty::Hard).unwrap();
        assert_eq!(bot.color(), DiscColor::White);
        assert!(!bot.is_human());
        assert!(AiPlayer::with_difficulty(DiscColor::Empty, Difficulty::Easy).is_err());
    }

    #[test]
    fn test_every_difficulty_picks_a_legal_move() {
        for topology in [Topology::Hex, Topology::Square] {
            let model = started(topology, 3);
            for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
                let bot = AiPlayer::with_difficulty(DiscColor::Black, difficulty).unwrap();
                let choice = bot.play(&model).unwrap().unwrap();
                assert!(model.is_valid_move(choice, DiscColor::Black).unwrap());
            }
        }
    }

    #[test]
    fn test_easy_bot_takes_biggest_capture() {
        let model = started(Topology::Hex, 3);
        let bot = AiPlayer::with_difficulty(DiscColor::Black, Difficulty::Easy).unwrap();
        let choice = bot.play(&model).unwrap().unwrap();
        assert!(!model
            .sandwichable_neighbors(choice, DiscColor::Black)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_falls_back_to_first_legal_move() {
        // No corner is open to the opponent at the opening, so blocking finds nothing
        let model = started(Topology::Square, 3);
        let strategy = Box::new(TryToBlock::single(StrategyKind::PrioritizeCorners));
        let bot = AiPlayer::new(DiscColor::Black, strategy).unwrap();

        let first = model.legal_moves(DiscColor::Black).unwrap()[0];
        assert_eq!(bot.play(&model), Ok(Some(first)));
    }

    #[test]
    fn test_bot_rejects_human_input() {
        let bot = AiPlayer::with_difficulty(DiscColor::Black, Difficulty::Easy).unwrap();
        assert_eq!(
            bot.receive_choice(Move::Pass),
            Err(GameError::NotHumanPlayer(DiscColor::Black))
        );
    }
}

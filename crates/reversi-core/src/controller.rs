//! Per-seat controller that connects a player to a model.
//!
//! A `PlayerController` is registered as a model listener. Whenever the model
//! changes and it is an AI seat's turn, the controller asks the player for a move
//! on a read-only copy and plays it. Human seats instead call [`PlayerController::submit`].

use crate::actions::Move;
use crate::bot::{AiPlayer, Difficulty};
use crate::cell::DiscColor;
use crate::coord::Coordinate;
use crate::model::{GameError, ModelListener, ReversiModel};
use crate::player::{HumanPlayer, Player};
use crate::view::BoardView;
use tracing::{debug, warn};

/// Drives one seat of a game
pub struct PlayerController {
    player: Box<dyn Player>,
}

impl PlayerController {
    pub fn new(player: Box<dyn Player>) -> Self {
        Self { player }
    }

    /// Controller for a person playing `color`
    pub fn human(color: DiscColor) -> Result<Self, GameError> {
        Ok(Self::new(Box::new(HumanPlayer::new(color)?)))
    }

    /// Controller for a bot playing `color`
    pub fn bot(color: DiscColor, difficulty: Difficulty) -> Result<Self, GameError> {
        Ok(Self::new(Box::new(AiPlayer::with_difficulty(color, difficulty)?)))
    }

    pub fn color(&self) -> DiscColor {
        self.player.color()
    }

    pub fn is_human(&self) -> bool {
        self.player.is_human()
    }

    /// Play a person's move. The choice is cleared afterwards, whatever the outcome.
    pub fn submit(&self, model: &mut ReversiModel, mv: Move) -> Result<(), GameError> {
        let color = self.color();
        if !self.is_human() {
            warn!(player = ?color, "Rejected move submitted for a bot seat");
            return Err(GameError::NotHumanPlayer(color));
        }

        self.player.receive_choice(mv)?;
        let result = self.take_turn(model);
        self.player.reset_choice();

        if let Err(err) = &result {
            debug!(player = ?color, ?mv, %err, "Move rejected");
        }
        result
    }

    /// `captures + 1` if this seat could legally play `coord`, otherwise `None`
    pub fn hint(
        &self,
        board: &dyn BoardView,
        coord: Coordinate,
    ) -> Result<Option<usize>, GameError> {
        let color = self.color();
        if !board.is_valid_move(coord, color)? {
            return Ok(None);
        }
        Ok(Some(board.sandwichable_neighbors(coord, color)?.len() + 1))
    }

    fn take_turn(&self, model: &mut ReversiModel) -> Result<(), GameError> {
        let color = self.color();
        if model.is_game_over()? {
            return Err(GameError::GameOver);
        }
        if model.turn()? != color {
            return Err(GameError::NotYourTurn(color));
        }

        let view = model.read_only_copy()?;
        let mv = Move::from(self.player.play(&view)?);
        debug!(player = ?color, ?mv, "Making move");
        mv.apply(model)
    }
}

impl ModelListener for PlayerController {
    fn on_model_changed(&self, model: &mut ReversiModel) {
        if self.is_human() {
            return;
        }
        match model.is_game_over() {
            Ok(false) => {}
            Ok(true) => return,
            Err(err) => {
                warn!(player = ?self.color(), %err, "Could not check game state");
                return;
            }
        }
        if model.turn() != Ok(self.color()) {
            return;
        }
        if let Err(err) = self.take_turn(model) {
            warn!(player = ?self.color(), %err, "Bot failed to move");
        }
    }
}

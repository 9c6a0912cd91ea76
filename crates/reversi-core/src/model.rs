//! Core game state machine.
//!
//! This module contains the `ReversiModel` struct, its builder, the error type
//! shared by the whole crate and the listener protocol used to drive turns.
//!
//! Listeners are notified synchronously, in registration order, after every
//! successful `start_game`, `play_disc` and `pass`. A listener receives the model
//! mutably and may itself play a move; that nested mutation notifies the whole
//! list again before the outer loop moves on to the next listener.

use crate::cell::DiscColor;
use crate::coord::{Coordinate, Topology};
use crate::grid::Grid;
use crate::rules::RuleKeeper;
use crate::view::BoardView;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Layer count used when none is given
pub const DEFAULT_LAYERS: i32 = 5;

/// Lifecycle of a started game. A game that has not started has no status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    /// Neither player can move
    Won,
    /// Two passes in a row, or equal scores at the end
    Tied,
}

/// Broad class of a [`GameError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The caller passed something that can never be valid
    Argument,
    /// The request is well formed but not allowed right now
    State,
}

/// Errors that can occur when building, querying or mutating a game
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Coordinate {0} is not on the board")]
    InvalidCoordinate(Coordinate),

    #[error("Color {0:?} is not playing in this game")]
    InvalidPlayerColor(DiscColor),

    #[error("{topology:?} boards need at least {min} layers, got {layers}")]
    InvalidLayers {
        topology: Topology,
        layers: i32,
        min: i32,
    },

    #[error("Invalid player colors: {0}")]
    InvalidPlayerColors(String),

    #[error("Cell is already {0:?}")]
    AlreadyColored(DiscColor),

    #[error("Invalid strategy: {0}")]
    InvalidStrategy(String),

    #[error("Candidate {0} is not a legal move")]
    InvalidCandidate(Coordinate),

    #[error("Player {0:?} is not controlled by a human")]
    NotHumanPlayer(DiscColor),

    #[error("Game has not started")]
    NotStarted,

    #[error("Game has already started")]
    AlreadyStarted,

    #[error("Game is over")]
    GameOver,

    #[error("Game is not over yet")]
    GameNotOver,

    #[error("Can't play a disc at {0}")]
    IllegalMove(Coordinate),

    #[error("Not {0:?}'s turn")]
    NotYourTurn(DiscColor),

    #[error("No move has been chosen")]
    NoChoice,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::InvalidCoordinate(_)
            | GameError::InvalidPlayerColor(_)
            | GameError::InvalidLayers { .. }
            | GameError::InvalidPlayerColors(_)
            | GameError::AlreadyColored(_)
            | GameError::InvalidStrategy(_)
            | GameError::InvalidCandidate(_)
            | GameError::NotHumanPlayer(_) => ErrorKind::Argument,
            GameError::NotStarted
            | GameError::AlreadyStarted
            | GameError::GameOver
            | GameError::GameNotOver
            | GameError::IllegalMove(_)
            | GameError::NotYourTurn(_)
            | GameError::NoChoice => ErrorKind::State,
        }
    }
}

/// Something that wants to hear about every change to a model.
///
/// Closures taking `&mut ReversiModel` are listeners too.
pub trait ModelListener: Send + Sync {
    fn on_model_changed(&self, model: &mut ReversiModel);
}

impl<F> ModelListener for F
where
    F: Fn(&mut ReversiModel) + Send + Sync,
{
    fn on_model_changed(&self, model: &mut ReversiModel) {
        self(model)
    }
}

/// A Reversi game on a hex or square board.
pub struct ReversiModel {
    grid: Grid,
    /// Turn order, head is the player to move
    player_colors: [DiscColor; 2],
    /// `None` until the game is started
    state: Option<GameStatus>,
    /// Whether the previous turn was a pass
    passed: bool,
    listeners: Vec<Arc<dyn ModelListener>>,
}

impl fmt::Debug for ReversiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReversiModel")
            .field("grid", &self.grid)
            .field("player_colors", &self.player_colors)
            .field("state", &self.state)
            .field("passed", &self.passed)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl BoardView for ReversiModel {
    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn player_colors(&self) -> [DiscColor; 2] {
        self.player_colors
    }

    fn game_state(&self) -> Option<GameStatus> {
        self.state
    }

    fn passed_last_turn(&self) -> bool {
        self.passed
    }
}

impl ReversiModel {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    /// Unstarted hex game with the default colors
    pub fn hex(layers: i32) -> Result<Self, GameError> {
        Self::builder().topology(Topology::Hex).layers(layers).build()
    }

    /// Unstarted square game with the default colors
    pub fn square(layers: i32) -> Result<Self, GameError> {
        Self::builder().topology(Topology::Square).layers(layers).build()
    }

    /// Start the game: the first color moves and the pass flag is cleared.
    pub fn start_game(&mut self) -> Result<(), GameError> {
        if self.state.is_some() {
            return Err(GameError::AlreadyStarted);
        }
        self.state = Some(GameStatus::Playing);
        self.passed = false;
        self.notify_model_has_changed();
        Ok(())
    }

    /// Play a disc for the player whose turn it is.
    ///
    /// Returns every coordinate that changed color, starting with `coord`. If the
    /// next player then has no legal move, they pass automatically.
    pub fn play_disc(&mut self, coord: Coordinate) -> Result<Vec<Coordinate>, GameError> {
        self.ensure_playing()?;
        self.check_coordinate(coord)?;

        let mover = self.turn()?;
        let changed = RuleKeeper.play_disc(&*self, coord)?;
        for &c in &changed {
            self.grid.recolor(c, mover)?;
        }

        self.passed = false;
        self.next_turn();
        if !self.has_legal_move(self.turn()?)? {
            self.pass_turn();
        }

        self.notify_model_has_changed();
        Ok(changed)
    }

    /// Pass the current turn. A second pass in a row ties the game.
    pub fn pass(&mut self) -> Result<(), GameError> {
        self.ensure_playing()?;
        self.pass_turn();
        self.notify_model_has_changed();
        Ok(())
    }

    fn pass_turn(&mut self) {
        if self.passed {
            self.state = Some(GameStatus::Tied);
        } else {
            self.passed = true;
        }
        self.next_turn();
    }

    fn next_turn(&mut self) {
        self.player_colors.rotate_left(1);
    }

    fn ensure_playing(&self) -> Result<(), GameError> {
        match self.state {
            None => Err(GameError::NotStarted),
            Some(GameStatus::Playing) => Ok(()),
            Some(_) => Err(GameError::GameOver),
        }
    }

    /// Fold a "nobody can move" position into `Won` and return the terminal
    /// status, or `None` while the game is still on.
    fn recompute_terminal_state(&mut self) -> Result<Option<GameStatus>, GameError> {
        let terminal = self.terminal_state()?;
        if let Some(status) = terminal {
            self.state = Some(status);
        }
        Ok(terminal)
    }

    /// Whether the game has ended. Records `Won` once neither player can move.
    pub fn is_game_over(&mut self) -> Result<bool, GameError> {
        Ok(self.recompute_terminal_state()?.is_some())
    }

    /// Winner of a finished game, `None` on a tie.
    ///
    /// Equal scores record the game as `Tied`.
    pub fn winner(&mut self) -> Result<Option<DiscColor>, GameError> {
        if self.recompute_terminal_state()?.is_none() {
            return Err(GameError::GameNotOver);
        }
        let winner = self.leader()?;
        if winner.is_none() {
            self.state = Some(GameStatus::Tied);
        }
        Ok(winner)
    }

    pub fn add_model_listener(&mut self, listener: Arc<dyn ModelListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Tell every listener, in registration order, that the model changed.
    pub fn notify_model_has_changed(&mut self) {
        let listeners = self.listeners.clone();
        for listener in &listeners {
            listener.on_model_changed(self);
        }
    }

    /// Independent, mutable deep copy of a started game. Listeners are not copied.
    pub fn actionable_copy(&self) -> Result<ReversiModel, GameError> {
        self.ensure_started()?;
        Ok(ReversiModel {
            grid: self.grid.deep_copy(),
            player_colors: self.player_colors,
            state: self.state,
            passed: self.passed,
            listeners: Vec::new(),
        })
    }
}

/// Builder for [`ReversiModel`].
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    topology: Topology,
    layers: i32,
    colors: Vec<DiscColor>,
    discs: Vec<(Coordinate, DiscColor)>,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self {
            topology: Topology::Hex,
            layers: DEFAULT_LAYERS,
            colors: DiscColor::DEFAULT_PLAYERS.to_vec(),
            discs: Vec::new(),
        }
    }
}

impl ModelBuilder {
    pub fn topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn layers(mut self, layers: i32) -> Self {
        self.layers = layers;
        self
    }

    /// Turn order, first color moves first
    pub fn colors(mut self, colors: impl IntoIterator<Item = DiscColor>) -> Self {
        self.colors = colors.into_iter().collect();
        self
    }

    /// Override one cell of the opening position. `Empty` clears a seeded disc.
    pub fn disc(mut self, coord: Coordinate, color: DiscColor) -> Self {
        self.discs.push((coord, color));
        self
    }

    pub fn build(self) -> Result<ReversiModel, GameError> {
        let player_colors = validate_player_colors(&self.colors)?;
        let mut grid = Grid::new(self.topology, self.layers, player_colors[0], player_colors[1])?;

        for (coord, color) in self.discs {
            if !color.is_empty() && !player_colors.contains(&color) {
                return Err(GameError::InvalidPlayerColor(color));
            }
            grid.place(coord, color)?;
        }

        Ok(ReversiModel {
            grid,
            player_colors,
            state: None,
            passed: false,
            listeners: Vec::new(),
        })
    }
}

fn validate_player_colors(colors: &[DiscColor]) -> Result<[DiscColor; 2], GameError> {
    let &[first, second] = colors else {
        return Err(GameError::InvalidPlayerColors(format!(
            "need exactly 2 players, got {}",
            colors.len()
        )));
    };
    if first.is_empty() || second.is_empty() {
        return Err(GameError::InvalidPlayerColors(
            "a player cannot have no color".to_string(),
        ));
    }
    if first == second {
        return Err(GameError::InvalidPlayerColors(format!(
            "duplicate color {first:?}"
        )));
    }
    Ok([first, second])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn started_hex(layers: i32) -> ReversiModel {
        let mut model = ReversiModel::hex(layers).unwrap();
        model.start_game().unwrap();
        model
    }

    #[test]
    fn test_queries_before_start() {
        let model = ReversiModel::hex(3).unwrap();
        assert_eq!(model.game_state(), None);
        assert_eq!(model.turn(), Err(GameError::NotStarted));
        assert_eq!(model.pass_flag(), Err(GameError::NotStarted));
        assert!(model.actionable_copy().is_err());
        // Geometry is available before the game starts
        assert_eq!(
            model.cell_at(Coordinate::new(1, 0)).unwrap().color(),
            DiscColor::Black
        );
    }

    #[test]
    fn test_start_twice_is_a_state_error() {
        let mut model = started_hex(3);
        let err = model.start_game().unwrap_err();
        assert_eq!(err, GameError::AlreadyStarted);
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(model.turn(), Ok(DiscColor::Black));
        assert_eq!(model.other_player_color(), Ok(DiscColor::White));
    }

    #[test]
    fn test_mutators_require_start() {
        let mut model = ReversiModel::square(3).unwrap();
        assert_eq!(model.pass(), Err(GameError::NotStarted));
        assert_eq!(
            model.play_disc(Coordinate::new(-2, -2)),
            Err(GameError::NotStarted)
        );
        assert_eq!(model.is_game_over(), Err(GameError::NotStarted));
    }

    #[test]
    fn test_play_disc_flips_and_rotates() {
        let mut model = started_hex(3);
        let changed = model.play_disc(Coordinate::new(-1, 2)).unwrap();

        assert_eq!(changed, vec![Coordinate::new(-1, 2), Coordinate::new(0, 1)]);
        assert_eq!(model.color_at(Coordinate::new(0, 1)), Ok(DiscColor::Black));
        assert_eq!(model.turn(), Ok(DiscColor::White));
        assert_eq!(model.player_score(DiscColor::Black), Ok(5));
        assert_eq!(model.player_score(DiscColor::White), Ok(2));
    }

    #[test]
    fn test_play_disc_errors() {
        let mut model = started_hex(3);

        let err = model.play_disc(Coordinate::new(9, 9)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);

        let err = model.play_disc(Coordinate::new(1, 0)).unwrap_err();
        assert_eq!(err, GameError::IllegalMove(Coordinate::new(1, 0)));
        assert_eq!(err.kind(), ErrorKind::State);

        // Nothing changed
        assert_eq!(model.turn(), Ok(DiscColor::Black));
        assert_eq!(model.player_score(DiscColor::Black), Ok(3));
    }

    #[test]
    fn test_double_pass_ties() {
        let mut model = started_hex(3);
        model.pass().unwrap();
        assert_eq!(model.pass_flag(), Ok(true));
        assert_eq!(model.turn(), Ok(DiscColor::White));

        model.pass().unwrap();
        assert_eq!(model.game_state(), Some(GameStatus::Tied));
        assert!(model.is_game_over().unwrap());
        assert_eq!(model.pass(), Err(GameError::GameOver));
        // Seeded scores are equal
        assert_eq!(model.winner(), Ok(None));
    }

    #[test]
    fn test_move_clears_pass_flag() {
        let mut model = started_hex(3);
        model.pass().unwrap();
        model.play_disc(Coordinate::new(1, 1)).unwrap();
        assert_eq!(model.pass_flag(), Ok(false));
        model.pass().unwrap();
        assert_eq!(model.game_state(), Some(GameStatus::Playing));
    }

    #[test]
    fn test_winner_before_end() {
        let mut model = started_hex(2);
        assert_eq!(model.winner(), Err(GameError::GameNotOver));
        assert!(!model.is_game_over().unwrap());
    }

    #[test]
    fn test_lazy_won_when_nobody_can_move() {
        // Every cell is black
        let mut builder = ReversiModel::builder().topology(Topology::Hex).layers(1);
        for (row, col) in [(-1, 0), (-1, 1), (0, -1), (0, 0), (0, 1), (1, -1), (1, 0)] {
            builder = builder.disc(Coordinate::new(row, col), DiscColor::Black);
        }
        let mut model = builder.build().unwrap();
        model.start_game().unwrap();

        assert_eq!(model.game_state(), Some(GameStatus::Playing));
        assert!(model.is_game_over().unwrap());
        assert_eq!(model.game_state(), Some(GameStatus::Won));
        assert_eq!(model.winner(), Ok(Some(DiscColor::Black)));
    }

    #[test]
    fn test_auto_pass_when_opponent_is_stuck() {
        // White keeps a single disc, which black can capture
        let mut model = ReversiModel::builder()
            .topology(Topology::Square)
            .layers(2)
            .disc(Coordinate::new(1, -1), DiscColor::Empty)
            .build()
            .unwrap();
        model.start_game().unwrap();

        let changed = model.play_disc(Coordinate::new(-2, 1)).unwrap();
        assert_eq!(changed, vec![Coordinate::new(-2, 1), Coordinate::new(-1, 1)]);
        assert_eq!(model.player_score(DiscColor::White), Ok(0));

        // White had nowhere to go, so the turn is back with black
        assert_eq!(model.turn(), Ok(DiscColor::Black));
        assert_eq!(model.pass_flag(), Ok(true));
        assert_eq!(model.game_state(), Some(GameStatus::Playing));
    }

    #[test]
    fn test_builder_validation() {
        let err = ReversiModel::builder()
            .colors([DiscColor::Black])
            .build()
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidPlayerColors(_)));

        let err = ReversiModel::builder()
            .colors([DiscColor::White, DiscColor::White])
            .build()
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidPlayerColors(_)));

        let err = ReversiModel::builder()
            .colors([DiscColor::Empty, DiscColor::White])
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);

        let err = ReversiModel::square(1).unwrap_err();
        assert!(matches!(err, GameError::InvalidLayers { min: 2, .. }));

        let err = ReversiModel::builder()
            .disc(Coordinate::new(40, 0), DiscColor::Black)
            .build()
            .unwrap_err();
        assert_eq!(err, GameError::InvalidCoordinate(Coordinate::new(40, 0)));
    }

    #[test]
    fn test_custom_turn_order() {
        let mut model = ReversiModel::builder()
            .colors([DiscColor::White, DiscColor::Black])
            .layers(2)
            .build()
            .unwrap();
        model.start_game().unwrap();
        assert_eq!(model.turn(), Ok(DiscColor::White));
        // First color owns the first seed set
        assert_eq!(model.color_at(Coordinate::new(1, 0)), Ok(DiscColor::White));
    }

    #[test]
    fn test_listeners_notified_once_per_mutation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut model = ReversiModel::hex(3).unwrap();
        model.add_model_listener(Arc::new(move |_: &mut ReversiModel| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        model.start_game().unwrap();
        model.play_disc(Coordinate::new(-1, 2)).unwrap();
        model.pass().unwrap();
        assert!(model.pass().is_ok());
        // Failed mutations do not notify
        assert!(model.pass().is_err());

        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_reentrant_listener() {
        let mut model = ReversiModel::hex(3).unwrap();
        // Whoever is on turn as white just passes
        model.add_model_listener(Arc::new(|model: &mut ReversiModel| {
            if model.game_state() == Some(GameStatus::Playing)
                && model.turn() == Ok(DiscColor::White)
            {
                model.pass().unwrap();
            }
        }));

        model.start_game().unwrap();
        model.play_disc(Coordinate::new(-1, 2)).unwrap();
        assert_eq!(model.turn(), Ok(DiscColor::Black));
        assert_eq!(model.pass_flag(), Ok(true));
    }

    #[test]
    fn test_actionable_copy_is_independent() {
        let model = started_hex(3);
        let mut copy = model.actionable_copy().unwrap();
        assert_eq!(copy.listener_count(), 0);

        copy.play_disc(Coordinate::new(-1, 2)).unwrap();
        assert_eq!(model.turn(), Ok(DiscColor::Black));
        assert_eq!(model.color_at(Coordinate::new(-1, 2)), Ok(DiscColor::Empty));
        assert_eq!(copy.color_at(Coordinate::new(-1, 2)), Ok(DiscColor::Black));
    }
}

//! Read-only access to a game.
//!
//! `BoardView` is what strategies, players and rule checks get to see. Both the
//! live [`ReversiModel`](crate::model::ReversiModel) and the detached
//! [`ReadOnlyModel`] snapshot implement it, and neither exposes a mutator
//! through it.
//!
//! Geometry queries (`cell_at`, `neighbors`, `is_corner`) work before the game
//! starts. Everything that depends on whose turn it is requires a started game.

use crate::cell::{Cell, DiscColor};
use crate::coord::{Coordinate, Topology};
use crate::grid::Grid;
use crate::model::{GameError, GameStatus};
use crate::rules::{self, RuleKeeper};
use serde::{Deserialize, Serialize};

/// Queries over a board and its turn state.
pub trait BoardView: Send + Sync {
    fn grid(&self) -> &Grid;

    /// Turn order, head is the player to move
    fn player_colors(&self) -> [DiscColor; 2];

    /// `None` until the game is started
    fn game_state(&self) -> Option<GameStatus>;

    /// Raw pass flag, without the started check
    fn passed_last_turn(&self) -> bool;

    fn ensure_started(&self) -> Result<(), GameError> {
        match self.game_state() {
            Some(_) => Ok(()),
            None => Err(GameError::NotStarted),
        }
    }

    fn check_coordinate(&self, coord: Coordinate) -> Result<(), GameError> {
        if self.grid().contains(coord) {
            Ok(())
        } else {
            Err(GameError::InvalidCoordinate(coord))
        }
    }

    /// `player` must be one of the two colors in this game
    fn check_player(&self, player: DiscColor) -> Result<(), GameError> {
        if !player.is_empty() && self.player_colors().contains(&player) {
            Ok(())
        } else {
            Err(GameError::InvalidPlayerColor(player))
        }
    }

    fn layers(&self) -> i32 {
        self.grid().layers()
    }

    fn topology(&self) -> Topology {
        self.grid().topology()
    }

    /// Color whose turn it is
    fn turn(&self) -> Result<DiscColor, GameError> {
        self.ensure_started()?;
        Ok(self.player_colors()[0])
    }

    /// Whether the previous turn was a pass
    fn pass_flag(&self) -> Result<bool, GameError> {
        self.ensure_started()?;
        Ok(self.passed_last_turn())
    }

    /// The color that is not on turn
    fn other_player_color(&self) -> Result<DiscColor, GameError> {
        self.ensure_started()?;
        Ok(self.player_colors()[1])
    }

    fn cell_at(&self, coord: Coordinate) -> Result<&Cell, GameError> {
        self.grid().cell(coord)
    }

    fn color_at(&self, coord: Coordinate) -> Result<DiscColor, GameError> {
        Ok(self.cell_at(coord)?.color())
    }

    fn neighbors(&self, coord: Coordinate) -> Result<Vec<Coordinate>, GameError> {
        self.grid().neighbors(coord)
    }

    fn is_corner(&self, coord: Coordinate) -> Result<bool, GameError> {
        self.grid().is_corner(coord)
    }

    /// Neighbors of `coord` holding `player`'s color
    fn like_neighbors(
        &self,
        coord: Coordinate,
        player: DiscColor,
    ) -> Result<Vec<Coordinate>, GameError> {
        self.ensure_started()?;
        self.check_coordinate(coord)?;
        self.check_player(player)?;
        rules::like_neighbors(self.grid(), coord, player)
    }

    /// Neighbors of `coord` holding a disc that is not `player`'s
    fn opposite_neighbors(
        &self,
        coord: Coordinate,
        player: DiscColor,
    ) -> Result<Vec<Coordinate>, GameError> {
        self.ensure_started()?;
        self.check_coordinate(coord)?;
        self.check_player(player)?;
        rules::opposite_neighbors(self.grid(), coord, player)
    }

    /// Discs `player` would capture by playing at `origin`
    fn sandwichable_neighbors(
        &self,
        origin: Coordinate,
        player: DiscColor,
    ) -> Result<Vec<Coordinate>, GameError> {
        self.ensure_started()?;
        self.check_coordinate(origin)?;
        self.check_player(player)?;
        rules::sandwiched_coordinates(self.grid(), origin, player)
    }

    /// Number of cells holding `player`'s color
    fn player_score(&self, player: DiscColor) -> Result<usize, GameError> {
        self.ensure_started()?;
        Ok(self.grid().count(player))
    }

    fn is_valid_move(&self, coord: Coordinate, player: DiscColor) -> Result<bool, GameError> {
        RuleKeeper.is_valid(self, coord, player)
    }

    /// Every legal move for `player`, in board enumeration order
    fn legal_moves(&self, player: DiscColor) -> Result<Vec<Coordinate>, GameError> {
        self.ensure_started()?;
        self.check_player(player)?;
        let mut moves = Vec::new();
        for &coord in self.grid().coordinates() {
            if RuleKeeper.is_valid(self, coord, player)? {
                moves.push(coord);
            }
        }
        Ok(moves)
    }

    fn has_legal_move(&self, player: DiscColor) -> Result<bool, GameError> {
        self.ensure_started()?;
        self.check_player(player)?;
        for &coord in self.grid().coordinates() {
            if RuleKeeper.is_valid(self, coord, player)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Terminal status this position is in, or `None` while it is still playable.
    ///
    /// A `Playing` game where neither player can move counts as `Won`.
    fn terminal_state(&self) -> Result<Option<GameStatus>, GameError> {
        match self.game_state() {
            None => Err(GameError::NotStarted),
            Some(GameStatus::Playing) => {
                let stuck = !self.has_legal_move(self.turn()?)?
                    && !self.has_legal_move(self.other_player_color()?)?;
                Ok(stuck.then_some(GameStatus::Won))
            }
            Some(status) => Ok(Some(status)),
        }
    }

    /// Whether the game has ended, without recording anything
    fn is_finished(&self) -> Result<bool, GameError> {
        Ok(self.terminal_state()?.is_some())
    }

    /// Higher scorer between the player on turn and the other one, `None` when level
    fn leader(&self) -> Result<Option<DiscColor>, GameError> {
        let current = self.turn()?;
        let other = self.other_player_color()?;
        let (current_score, other_score) = (self.player_score(current)?, self.player_score(other)?);
        Ok(match current_score.cmp(&other_score) {
            std::cmp::Ordering::Greater => Some(current),
            std::cmp::Ordering::Less => Some(other),
            std::cmp::Ordering::Equal => None,
        })
    }

    /// Winner of a finished game without recording anything, `None` on a tie
    fn outcome(&self) -> Result<Option<DiscColor>, GameError> {
        if !self.is_finished()? {
            return Err(GameError::GameNotOver);
        }
        self.leader()
    }

    /// Deep copy of every cell
    fn all_coords_snapshot(&self) -> Result<Grid, GameError> {
        self.ensure_started()?;
        Ok(self.grid().deep_copy())
    }

    /// Detached copy that only supports queries
    fn read_only_copy(&self) -> Result<ReadOnlyModel, GameError> {
        Ok(ReadOnlyModel {
            grid: self.all_coords_snapshot()?,
            player_colors: self.player_colors(),
            state: self.game_state(),
            passed: self.passed_last_turn(),
        })
    }

    /// Serializable picture of the game for sending over the wire
    fn snapshot(&self) -> Result<ModelSnapshot, GameError> {
        self.ensure_started()?;
        let [turn, other] = self.player_colors();
        Ok(ModelSnapshot {
            topology: self.topology(),
            layers: self.layers(),
            turn,
            players: [turn, other],
            state: self.terminal_state()?.unwrap_or(GameStatus::Playing),
            passed: self.passed_last_turn(),
            cells: self
                .grid()
                .iter()
                .map(|(coord, cell)| CellSnapshot {
                    coord,
                    color: cell.color(),
                })
                .collect(),
            scores: [
                (turn, self.grid().count(turn)),
                (other, self.grid().count(other)),
            ],
        })
    }
}

/// A detached deep copy of a started game.
#[derive(Debug)]
pub struct ReadOnlyModel {
    grid: Grid,
    player_colors: [DiscColor; 2],
    state: Option<GameStatus>,
    passed: bool,
}

impl BoardView for ReadOnlyModel {
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

/// One cell in a [`ModelSnapshot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub coord: Coordinate,
    pub color: DiscColor,
}

/// Full game state as plain data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub topology: Topology,
    pub layers: i32,
    pub turn: DiscColor,
    /// Turn order, head is `turn`
    pub players: [DiscColor; 2],
    /// Status as it would be recorded by a game-over check
    pub state: GameStatus,
    pub passed: bool,
    /// Cells in board enumeration order
    pub cells: Vec<CellSnapshot>,
    pub scores: [(DiscColor, usize); 2],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReversiModel;
    use pretty_assertions::assert_eq;

    fn started_square(layers: i32) -> ReversiModel {
        let mut model = ReversiModel::square(layers).unwrap();
        model.start_game().unwrap();
        model
    }

    #[test]
    fn test_player_checks() {
        let model = started_square(2);
        assert!(model.check_player(DiscColor::White).is_ok());
        assert_eq!(
            model.check_player(DiscColor::Empty),
            Err(GameError::InvalidPlayerColor(DiscColor::Empty))
        );
        assert_eq!(
            model.like_neighbors(Coordinate::new(2, 2), DiscColor::Empty),
            Err(GameError::InvalidPlayerColor(DiscColor::Empty))
        );
    }

    #[test]
    fn test_like_and_opposite_neighbors_are_disjoint() {
        let model = started_square(3);
        for &coord in model.grid().coordinates() {
            for player in DiscColor::DEFAULT_PLAYERS {
                let like = model.like_neighbors(coord, player).unwrap();
                let opposite = model.opposite_neighbors(coord, player).unwrap();
                assert!(like.iter().all(|c| !opposite.contains(c)));
            }
        }
    }

    #[test]
    fn test_legal_moves_opening_square() {
        let model = started_square(2);
        let moves = model.legal_moves(DiscColor::Black).unwrap();
        // Cells touching a black disc. The two white-side corners flank nothing.
        assert_eq!(moves.len(), 10);
        assert!(!moves.contains(&Coordinate::new(-1, -1)));
        assert!(!moves.contains(&Coordinate::new(-2, 2)));
        assert!(!moves.contains(&Coordinate::new(2, -2)));
    }

    #[test]
    fn test_read_only_copy_is_detached() {
        let mut model = started_square(3);
        let copy = model.read_only_copy().unwrap();

        model.play_disc(Coordinate::new(-2, -2)).unwrap();
        assert_eq!(copy.turn(), Ok(DiscColor::Black));
        assert_eq!(copy.color_at(Coordinate::new(-2, -2)), Ok(DiscColor::Empty));
        assert_eq!(model.turn(), Ok(DiscColor::White));
    }

    #[test]
    fn test_read_only_copy_requires_start() {
        let model = ReversiModel::hex(2).unwrap();
        assert_eq!(model.read_only_copy().unwrap_err(), GameError::NotStarted);
        assert_eq!(model.snapshot().unwrap_err(), GameError::NotStarted);
    }

    #[test]
    fn test_outcome_is_pure() {
        let mut model = started_square(2);
        model.pass().unwrap();
        model.pass().unwrap();

        let copy = model.read_only_copy().unwrap();
        assert!(copy.is_finished().unwrap());
        assert_eq!(copy.outcome(), Ok(None));
        assert_eq!(copy.game_state(), Some(GameStatus::Tied));
    }

    #[test]
    fn test_snapshot() {
        let model = started_square(2);
        let snapshot = model.snapshot().unwrap();

        assert_eq!(snapshot.turn, DiscColor::Black);
        assert_eq!(snapshot.state, GameStatus::Playing);
        assert_eq!(snapshot.cells.len(), 16);
        assert_eq!(snapshot.cells[0].coord, Coordinate::new(-2, -2));
        assert_eq!(
            snapshot.scores,
            [(DiscColor::Black, 2), (DiscColor::White, 2)]
        );

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ModelSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}

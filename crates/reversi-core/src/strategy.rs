//! Move selection strategies.
//!
//! This module provides:
//! - `StrategyKind`: the three single strategies (corners, corner neighbors, captures)
//! - `TryToWin`: a stacked pipeline of single strategies with fallbacks
//! - `TryToBlock`: ranks the opponent's best moves and takes those that are also ours
//! - `HumanStrategy`: a one-slot buffer for a move chosen by a person
//!
//! Every strategy takes a list of candidate moves and returns a filtered, ranked
//! list. Candidates must be legal moves for the player they are evaluated for.

use crate::actions::Move;
use crate::cell::DiscColor;
use crate::coord::Coordinate;
use crate::model::GameError;
use crate::view::BoardView;
use serde::{Deserialize, Serialize};

/// Narrows a candidate list down to the moves worth making, best first.
pub trait AiStrategy: Send + Sync {
    fn filter_moves(
        &self,
        board: &dyn BoardView,
        candidates: &[Coordinate],
        player: DiscColor,
    ) -> Result<Vec<Coordinate>, GameError>;

    /// Best move over all of `player`'s legal moves, or `None`
    fn choose_move(
        &self,
        board: &dyn BoardView,
        player: DiscColor,
    ) -> Result<Option<Coordinate>, GameError> {
        let candidates = board.legal_moves(player)?;
        Ok(self.filter_moves(board, &candidates, player)?.first().copied())
    }
}

impl<S: AiStrategy + ?Sized> AiStrategy for Box<S> {
    fn filter_moves(
        &self,
        board: &dyn BoardView,
        candidates: &[Coordinate],
        player: DiscColor,
    ) -> Result<Vec<Coordinate>, GameError> {
        (**self).filter_moves(board, candidates, player)
    }
}

/// Reject a player outside the game and any candidate that is not a legal move.
fn check_candidates(
    board: &dyn BoardView,
    candidates: &[Coordinate],
    player: DiscColor,
) -> Result<(), GameError> {
    board.check_player(player)?;
    for &coord in candidates {
        board.check_coordinate(coord)?;
        if !board.is_valid_move(coord, player)? {
            return Err(GameError::InvalidCandidate(coord));
        }
    }
    Ok(())
}

/// The single strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Keep only corners
    PrioritizeCorners,
    /// Drop cells next to a still-empty corner, unless they are corners themselves
    AvoidCornerNeighbors,
    /// Rank by number of captured discs, most first
    CaptureMostCells,
}

impl StrategyKind {
    /// Position in a `TryToWin` pipeline; higher ranks sit further out.
    pub const fn rank(self) -> u8 {
        match self {
            StrategyKind::PrioritizeCorners => 3,
            StrategyKind::AvoidCornerNeighbors => 2,
            StrategyKind::CaptureMostCells => 1,
        }
    }

    fn prioritize_corners(
        board: &dyn BoardView,
        candidates: &[Coordinate],
    ) -> Result<Vec<Coordinate>, GameError> {
        let mut moves = Vec::new();
        for &coord in candidates {
            if board.is_corner(coord)? {
                moves.push(coord);
            }
        }
        Ok(moves)
    }

    fn avoid_corner_neighbors(
        board: &dyn BoardView,
        candidates: &[Coordinate],
    ) -> Result<Vec<Coordinate>, GameError> {
        let mut moves = Vec::new();
        for &coord in candidates {
            let mut next_to_open_corner = false;
            for neighbor in board.neighbors(coord)? {
                if board.is_corner(neighbor)? && board.color_at(neighbor)?.is_empty() {
                    next_to_open_corner = true;
                    break;
                }
            }
            if !next_to_open_corner || board.is_corner(coord)? {
                moves.push(coord);
            }
        }
        Ok(moves)
    }

    fn capture_most_cells(
        board: &dyn BoardView,
        candidates: &[Coordinate],
        player: DiscColor,
    ) -> Result<Vec<Coordinate>, GameError> {
        let mut weighted = Vec::new();
        for &coord in candidates {
            let captured = board.sandwichable_neighbors(coord, player)?.len();
            if captured > 0 {
                weighted.push((coord, captured));
            }
        }
        // Stable: equal weight and equal row + col keep candidate order
        weighted.sort_by(|(a, a_weight), (b, b_weight)| {
            b_weight.cmp(a_weight).then_with(|| a.cmp_by_sum(b))
        });
        Ok(weighted.into_iter().map(|(coord, _)| coord).collect())
    }
}

impl AiStrategy for StrategyKind {
    fn filter_moves(
        &self,
        board: &dyn BoardView,
        candidates: &[Coordinate],
        player: DiscColor,
    ) -> Result<Vec<Coordinate>, GameError> {
        check_candidates(board, candidates, player)?;
        match self {
            StrategyKind::PrioritizeCorners => Self::prioritize_corners(board, candidates),
            StrategyKind::AvoidCornerNeighbors => Self::avoid_corner_neighbors(board, candidates),
            StrategyKind::CaptureMostCells => Self::capture_most_cells(board, candidates, player),
        }
    }
}

/// Stacked strategies evaluated from the innermost stage outwards.
///
/// Each stage narrows the working set. When `CaptureMostCells` finds nothing the
/// original candidates carry on. When an outer stage finds nothing it is retried
/// on the original candidates; if that is empty too, the last narrowed set wins,
/// or nothing if no stage narrowed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryToWin {
    /// Innermost first
    stages: Vec<StrategyKind>,
}

impl TryToWin {
    /// Build a pipeline from its stages listed outermost first, e.g.
    /// `[PrioritizeCorners, AvoidCornerNeighbors, CaptureMostCells]`.
    pub fn new(stages: impl IntoIterator<Item = StrategyKind>) -> Result<Self, GameError> {
        let mut stages: Vec<StrategyKind> = stages.into_iter().collect();
        stages.reverse();

        if stages.len() < 2 {
            return Err(GameError::InvalidStrategy(format!(
                "a composite needs at least 2 stages, got {}",
                stages.len()
            )));
        }
        for pair in stages.windows(2) {
            let (inner, outer) = (pair[0], pair[1]);
            if inner == outer {
                return Err(GameError::InvalidStrategy(format!("duplicate stage {inner:?}")));
            }
            if inner.rank() > outer.rank() {
                return Err(GameError::InvalidStrategy(format!(
                    "{outer:?} cannot wrap {inner:?}"
                )));
            }
        }
        Ok(Self { stages })
    }

    /// Add a stage outside the current outermost one.
    pub fn wrap(mut self, outer: StrategyKind) -> Result<Self, GameError> {
        self.stages.push(outer);
        let mut outer_first = self.stages;
        outer_first.reverse();
        Self::new(outer_first)
    }

    /// Stages, innermost first
    pub fn stages(&self) -> &[StrategyKind] {
        &self.stages
    }
}

impl AiStrategy for TryToWin {
    fn filter_moves(
        &self,
        board: &dyn BoardView,
        candidates: &[Coordinate],
        player: DiscColor,
    ) -> Result<Vec<Coordinate>, GameError> {
        check_candidates(board, candidates, player)?;

        let mut working = candidates.to_vec();
        let mut filtered = Vec::new();
        let mut narrowed = 0;

        for stage in &self.stages {
            filtered = stage.filter_moves(board, &working, player)?;
            if !filtered.is_empty() {
                working = filtered.clone();
                narrowed += 1;
                continue;
            }
            match stage {
                StrategyKind::CaptureMostCells => working = candidates.to_vec(),
                StrategyKind::PrioritizeCorners | StrategyKind::AvoidCornerNeighbors => {
                    let retried = stage.filter_moves(board, candidates, player)?;
                    if !retried.is_empty() {
                        return Ok(retried);
                    }
                    return Ok(if narrowed == 0 { Vec::new() } else { working });
                }
            }
        }

        Ok(filtered)
    }
}

/// Ranks the opponent's best moves with `S` and keeps the ones we can also play,
/// in the opponent's order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryToBlock<S = TryToWin> {
    inner: S,
}

impl<S: AiStrategy> TryToBlock<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl TryToBlock<TryToWin> {
    /// Block with a `TryToWin` pipeline, stages listed outermost first
    pub fn composite(stages: impl IntoIterator<Item = StrategyKind>) -> Result<Self, GameError> {
        Ok(Self::new(TryToWin::new(stages)?))
    }
}

impl TryToBlock<StrategyKind> {
    /// Block with a single strategy
    pub fn single(kind: StrategyKind) -> Self {
        Self::new(kind)
    }
}

impl<S: AiStrategy> AiStrategy for TryToBlock<S> {
    fn filter_moves(
        &self,
        board: &dyn BoardView,
        candidates: &[Coordinate],
        player: DiscColor,
    ) -> Result<Vec<Coordinate>, GameError> {
        check_candidates(board, candidates, player)?;

        let Some(opponent) = board.player_colors().into_iter().find(|&c| c != player) else {
            return Ok(Vec::new());
        };
        let opponent_moves = board.legal_moves(opponent)?;
        let ranked = self.inner.filter_moves(board, &opponent_moves, opponent)?;
        Ok(ranked.into_iter().filter(|c| candidates.contains(c)).collect())
    }
}

/// Holds the move a person picked until the controller consumes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HumanStrategy {
    choice: Option<Move>,
}

impl HumanStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a play or a pass, replacing any earlier choice
    pub fn notify_of_move_or_pass(&mut self, mv: Move) {
        self.choice = Some(mv);
    }

    pub fn choice(&self) -> Result<Move, GameError> {
        self.choice.ok_or(GameError::NoChoice)
    }

    /// Chosen cell, `None` for a pass
    pub fn chosen_coordinate(&self) -> Result<Option<Coordinate>, GameError> {
        Ok(self.choice()?.coordinate())
    }

    pub fn reset_choice(&mut self) {
        self.choice = None;
    }
}

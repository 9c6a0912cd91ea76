//! Move legality and captures.
//!
//! A disc may go on any empty cell that either touches one of the mover's own
//! discs or flanks at least one run of opposing discs. A run is captured only
//! when the walk along its direction ends on the mover's color; running off the
//! board or into an empty cell drops the whole run.

use crate::cell::DiscColor;
use crate::coord::Coordinate;
use crate::grid::Grid;
use crate::model::GameError;
use crate::view::BoardView;

/// Stateless referee for placing discs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleKeeper;

impl RuleKeeper {
    /// Whether `player` may place a disc at `coord`.
    pub fn is_valid<B: BoardView + ?Sized>(
        &self,
        board: &B,
        coord: Coordinate,
        player: DiscColor,
    ) -> Result<bool, GameError> {
        board.ensure_started()?;
        board.check_coordinate(coord)?;
        board.check_player(player)?;

        if !board.color_at(coord)?.is_empty() {
            return Ok(false);
        }
        Ok(!board.like_neighbors(coord, player)?.is_empty()
            || !board.sandwichable_neighbors(coord, player)?.is_empty())
    }

    /// Cells that change color when the player on turn plays `coord`: `coord`
    /// itself followed by every captured disc.
    pub fn play_disc<B: BoardView + ?Sized>(
        &self,
        board: &B,
        coord: Coordinate,
    ) -> Result<Vec<Coordinate>, GameError> {
        board.check_coordinate(coord)?;
        let player = board.turn()?;
        if !self.is_valid(board, coord, player)? {
            return Err(GameError::IllegalMove(coord));
        }

        let mut changed = vec![coord];
        changed.extend(board.sandwichable_neighbors(coord, player)?);
        Ok(changed)
    }
}

/// Neighbors of `coord` holding `player`'s color
pub fn like_neighbors(
    grid: &Grid,
    coord: Coordinate,
    player: DiscColor,
) -> Result<Vec<Coordinate>, GameError> {
    Ok(grid
        .neighbors(coord)?
        .into_iter()
        .filter(|c| grid.color_at(*c) == Some(player))
        .collect())
}

/// Neighbors of `coord` holding a disc of any color other than `player`'s
pub fn opposite_neighbors(
    grid: &Grid,
    coord: Coordinate,
    player: DiscColor,
) -> Result<Vec<Coordinate>, GameError> {
    Ok(grid
        .neighbors(coord)?
        .into_iter()
        .filter(|c| matches!(grid.color_at(*c), Some(color) if !color.is_empty() && color != player))
        .collect())
}

/// Every disc `player` would capture by playing at `origin`, grouped by
/// direction in neighbor order.
pub fn sandwiched_coordinates(
    grid: &Grid,
    origin: Coordinate,
    player: DiscColor,
) -> Result<Vec<Coordinate>, GameError> {
    let mut captured = Vec::new();

    for first in opposite_neighbors(grid, origin, player)? {
        let Some(run_color) = grid.color_at(first) else {
            continue;
        };
        let mut run = vec![first];
        let mut current = first;

        loop {
            let next = grid.next_in_direction(origin, current);
            match grid.color_at(next) {
                Some(color) if color == player => {
                    captured.append(&mut run);
                    break;
                }
                Some(color) if color == run_color => {
                    run.push(next);
                    current = next;
                }
                // Off the board, an empty cell or a third color
                _ => break,
            }
        }
    }

    Ok(captured)
}

//! Reversi engine for hexagonal and square boards
//!
//! This crate provides the core game logic, including:
//! - Coordinate geometry for both board shapes
//! - The board grid with its opening position
//! - Move legality and disc captures
//! - The turn and game-over state machine with change listeners
//! - Composable AI strategies, players and seat controllers
//!
//! # Modules
//!
//! - [`coord`]: Coordinates and per-shape direction math
//! - [`cell`]: Disc colors and board cells
//! - [`grid`]: The set of cells for a board size
//! - [`rules`]: Legality checks and the capture walk
//! - [`model`]: Game state machine, errors and listeners
//! - [`view`]: Read-only queries and snapshots
//! - [`strategy`]: Move-ranking strategies
//! - [`player`], [`bot`]: Human and AI seats
//! - [`controller`]: Connects a seat to a running game

pub mod actions;
pub mod bot;
pub mod cell;
pub mod controller;
pub mod coord;
pub mod grid;
pub mod model;
pub mod player;
pub mod rules;
pub mod strategy;
pub mod view;

// Re-export commonly used types
pub use actions::Move;
pub use bot::{AiPlayer, Difficulty};
pub use cell::{Cell, DiscColor};
pub use controller::PlayerController;
pub use coord::{Coordinate, Topology};
pub use grid::Grid;
pub use model::{
    ErrorKind, GameError, GameStatus, ModelBuilder, ModelListener, ReversiModel, DEFAULT_LAYERS,
};
pub use player::{HumanPlayer, Player};
pub use rules::RuleKeeper;
pub use strategy::{AiStrategy, HumanStrategy, StrategyKind, TryToBlock, TryToWin};
pub use view::{BoardView, CellSnapshot, ModelSnapshot, ReadOnlyModel};

//! Game room management.

use rand::seq::SliceRandom;
use rand::Rng;
use reversi_core::{
    BoardView, Coordinate, DiscColor, GameError, ModelSnapshot, Move, PlayerController,
    ReversiModel,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::{PlayerInfo, RoomInfo, RoomSettings, RoomStatus};

/// Largest board a client may ask for
pub const MAX_LAYERS: i32 = 12;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Invalid room settings: {0}")]
    InvalidSettings(String),

    #[error("Already in a room")]
    AlreadyInRoom,

    #[error("Room is full")]
    RoomFull,

    #[error("Player not in room")]
    PlayerNotInRoom,

    #[error("Not the host")]
    NotHost,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Not enough players")]
    NotEnoughPlayers,

    #[error("Game not started")]
    GameNotStarted,

    #[error(transparent)]
    Game(#[from] GameError),
}

/// A player in a game room.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
    /// Assigned when the game starts
    pub color: Option<DiscColor>,
}

impl RoomPlayer {
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            connected: true,
            color: None,
        }
    }

    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            connected: self.connected,
            color: self.color,
        }
    }
}

/// How a finished game ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    /// `None` on a tie
    pub winner: Option<DiscColor>,
    pub winner_name: Option<String>,
}

/// A room hosting one game, either between two people or a person and a bot.
pub struct GameRoom {
    pub id: Uuid,
    pub name: String,
    pub host_id: Uuid,
    pub status: RoomStatus,
    pub settings: RoomSettings,
    pub players: HashMap<Uuid, RoomPlayer>,
    /// Join order
    pub player_order: Vec<Uuid>,
    /// Built with the room, started by the host
    pub game: ReversiModel,
    /// One controller per color once the game starts
    seats: Vec<Arc<PlayerController>>,
}

impl GameRoom {
    /// Fails if the settings do not describe a valid board.
    pub fn new(
        id: Uuid,
        host_id: Uuid,
        host_name: String,
        settings: RoomSettings,
    ) -> Result<Self, RoomError> {
        if settings.layers > MAX_LAYERS {
            return Err(RoomError::InvalidSettings(format!(
                "at most {MAX_LAYERS} layers, got {}",
                settings.layers
            )));
        }
        let game = ReversiModel::builder()
            .topology(settings.topology)
            .layers(settings.layers)
            .build()?;

        let mut players = HashMap::new();
        players.insert(host_id, RoomPlayer::new(host_id, host_name.clone()));

        Ok(Self {
            id,
            name: format!("{}'s Game", host_name),
            host_id,
            status: RoomStatus::Waiting,
            settings,
            players,
            player_order: vec![host_id],
            game,
            seats: Vec::new(),
        })
    }

    /// Humans needed to fill the room
    pub fn max_players(&self) -> u8 {
        if self.settings.opponent.is_some() {
            1
        } else {
            2
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players() as usize
    }

    pub fn add_player(&mut self, player_id: Uuid, name: String) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }

        self.players.insert(player_id, RoomPlayer::new(player_id, name));
        self.player_order.push(player_id);
        Ok(())
    }

    pub fn remove_player(&mut self, player_id: Uuid) -> Result<bool, RoomError> {
        if !self.players.contains_key(&player_id) {
            return Err(RoomError::PlayerNotInRoom);
        }

        self.players.remove(&player_id);
        self.player_order.retain(|&id| id != player_id);

        // If host left, assign new host
        if player_id == self.host_id && !self.player_order.is_empty() {
            self.host_id = self.player_order[0];
        }

        // Return true if room is now empty
        Ok(self.players.is_empty())
    }

    pub fn set_player_connected(&mut self, player_id: Uuid, connected: bool) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.connected = connected;
        }
    }

    pub fn start_game(&mut self, requester_id: Uuid) -> Result<(), RoomError> {
        self.start_game_with(requester_id, &mut rand::thread_rng())
    }

    /// Start the game, dealing colors to the seats with `rng`.
    ///
    /// A bot seat moves straight away if it drew black.
    pub fn start_game_with<R: Rng + ?Sized>(
        &mut self,
        requester_id: Uuid,
        rng: &mut R,
    ) -> Result<(), RoomError> {
        if requester_id != self.host_id {
            return Err(RoomError::NotHost);
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if !self.is_full() {
            return Err(RoomError::NotEnoughPlayers);
        }

        let mut colors = DiscColor::DEFAULT_PLAYERS;
        colors.shuffle(rng);

        let mut seats = Vec::with_capacity(colors.len());
        for (idx, &color) in colors.iter().enumerate() {
            let human = self
                .player_order
                .get(idx)
                .and_then(|id| self.players.get_mut(id));
            let seat = match (human, self.settings.opponent) {
                (Some(player), _) => {
                    player.color = Some(color);
                    PlayerController::human(color)?
                }
                (None, Some(difficulty)) => PlayerController::bot(color, difficulty)?,
                (None, None) => return Err(RoomError::NotEnoughPlayers),
            };
            seats.push(Arc::new(seat));
        }

        // Listeners fire in turn order
        seats.sort_by_key(|seat| seat.color() != DiscColor::DEFAULT_PLAYERS[0]);
        for seat in &seats {
            self.game.add_model_listener(seat.clone());
        }
        self.seats = seats;

        self.status = RoomStatus::InGame;
        self.game.start_game()?;
        self.update_status()?;

        Ok(())
    }

    pub fn apply_move(&mut self, player_id: Uuid, mv: Move) -> Result<(), RoomError> {
        let seat = self.seat_of(player_id)?;
        seat.submit(&mut self.game, mv)?;
        self.update_status()?;
        Ok(())
    }

    /// `captures + 1` if the player could legally play `coord` now
    pub fn hint(&self, player_id: Uuid, coord: Coordinate) -> Result<Option<usize>, RoomError> {
        let seat = self.seat_of(player_id)?;
        Ok(seat.hint(&self.game, coord)?)
    }

    pub fn snapshot(&self) -> Result<ModelSnapshot, RoomError> {
        self.ensure_started()?;
        Ok(self.game.snapshot()?)
    }

    pub fn turn(&self) -> Result<DiscColor, RoomError> {
        self.ensure_started()?;
        Ok(self.game.turn()?)
    }

    /// Legal moves for the player on turn
    pub fn legal_moves(&self) -> Result<Vec<Coordinate>, RoomError> {
        let turn = self.turn()?;
        Ok(self.game.legal_moves(turn)?)
    }

    /// The result once the game is over, `None` while it is still on
    pub fn get_winner(&mut self) -> Result<Option<GameResult>, RoomError> {
        self.ensure_started()?;
        if !self.game.is_game_over()? {
            return Ok(None);
        }

        let winner = self.game.winner()?;
        let winner_name = winner.and_then(|color| self.seat_name(color));
        Ok(Some(GameResult {
            winner,
            winner_name,
        }))
    }

    pub fn to_info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            name: self.name.clone(),
            players: self
                .player_order
                .iter()
                .filter_map(|id| self.players.get(id).map(|p| p.to_info()))
                .collect(),
            max_players: self.max_players(),
            host_id: self.host_id,
            status: self.status,
            settings: self.settings,
        }
    }

    fn ensure_started(&self) -> Result<(), RoomError> {
        if self.status == RoomStatus::Waiting {
            return Err(RoomError::GameNotStarted);
        }
        Ok(())
    }

    fn seat_of(&self, player_id: Uuid) -> Result<Arc<PlayerController>, RoomError> {
        self.ensure_started()?;
        let color = self
            .players
            .get(&player_id)
            .and_then(|p| p.color)
            .ok_or(RoomError::PlayerNotInRoom)?;
        self.seats
            .iter()
            .find(|seat| seat.color() == color)
            .cloned()
            .ok_or(RoomError::PlayerNotInRoom)
    }

    fn seat_name(&self, color: DiscColor) -> Option<String> {
        if let Some(player) = self.players.values().find(|p| p.color == Some(color)) {
            return Some(player.name.clone());
        }
        self.settings
            .opponent
            .map(|difficulty| format!("{difficulty:?} bot"))
    }

    fn update_status(&mut self) -> Result<(), RoomError> {
        if self.game.is_game_over()? {
            self.status = RoomStatus::Finished;
        }
        Ok(())
    }
}

//! WebSocket protocol messages for Reversi multiplayer.

use reversi_core::{Coordinate, Difficulty, DiscColor, ModelSnapshot, Move, Topology};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a new game room
    CreateRoom {
        player_name: String,
        #[serde(default)]
        settings: RoomSettings,
    },

    /// Join an existing room
    JoinRoom { room_id: Uuid, player_name: String },

    /// Leave current room
    LeaveRoom,

    /// Start the game (host only)
    StartGame,

    /// Place a disc or pass
    MakeMove { mv: Move },

    /// Ask how many discs a move would turn to your color
    Hint { coord: Coordinate },

    /// Request room list
    ListRooms,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned player ID
    Welcome { player_id: Uuid },

    /// Room created successfully
    RoomCreated { room_id: Uuid },

    /// Joined room successfully
    JoinedRoom { room: RoomInfo },

    /// Left room successfully
    LeftRoom,

    /// Room state updated (player joined/left)
    RoomUpdated { room: RoomInfo },

    /// Game started
    GameStarted { state: ModelSnapshot },

    /// Game state updated
    GameState { state: ModelSnapshot },

    /// Outcome of a submitted move
    MoveResult { success: bool, error: Option<String> },

    /// Legal moves for the player on turn
    LegalMoves { turn: DiscColor, moves: Vec<Coordinate> },

    /// Player on turn changed
    TurnChanged { turn: DiscColor },

    /// `value` is the captures plus one, `None` when the move is not legal
    HintResult { coord: Coordinate, value: Option<usize> },

    /// List of available rooms
    RoomList { rooms: Vec<RoomInfo> },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,

    /// Game finished, no winner on a tie
    GameOver {
        winner: Option<DiscColor>,
        winner_name: Option<String>,
    },
}

/// Board and seating chosen when a room is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    pub topology: Topology,
    pub layers: i32,
    /// Bot difficulty for a single-player room
    pub opponent: Option<Difficulty>,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            topology: Topology::Hex,
            layers: reversi_core::DEFAULT_LAYERS,
            opponent: None,
        }
    }
}

/// Room information for clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: Uuid,
    pub name: String,
    pub players: Vec<PlayerInfo>,
    pub max_players: u8,
    pub host_id: Uuid,
    pub status: RoomStatus,
    pub settings: RoomSettings,
}

/// Player information in a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
    /// Assigned when the game starts
    pub color: Option<DiscColor>,
}

/// Room status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Waiting,
    InGame,
    Finished,
}

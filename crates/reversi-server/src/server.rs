//! WebSocket server and connection handling.

use crate::protocol::{ClientMessage, RoomInfo, RoomSettings, RoomStatus, ServerMessage};
use crate::room::{GameRoom, RoomError};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    /// All active rooms
    pub rooms: DashMap<Uuid, GameRoom>,
    /// Mapping from player ID to their room ID
    pub player_rooms: DashMap<Uuid, Uuid>,
    /// Mapping from player ID to their message sender
    pub player_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            player_rooms: DashMap::new(),
            player_senders: DashMap::new(),
        }
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    pub fn send_error(&self, player_id: Uuid, message: impl ToString) {
        self.send_to_player(
            player_id,
            ServerMessage::Error {
                message: message.to_string(),
            },
        );
    }

    /// Broadcast a message to all players in a room.
    pub fn broadcast_to_room(&self, room_id: Uuid, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(&room_id) {
            for player_id in room.players.keys() {
                self.send_to_player(*player_id, msg.clone());
            }
        }
    }

    /// Broadcast a message to all players in a room except one.
    pub fn broadcast_to_room_except(&self, room_id: Uuid, except: Uuid, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(&room_id) {
            for player_id in room.players.keys() {
                if *player_id != except {
                    self.send_to_player(*player_id, msg.clone());
                }
            }
        }
    }

    /// Get list of waiting rooms.
    pub fn get_waiting_rooms(&self) -> Vec<RoomInfo> {
        self.rooms
            .iter()
            .filter(|r| r.status == RoomStatus::Waiting)
            .map(|r| r.to_info())
            .collect()
    }

    /// Create a room hosted by `player_id`.
    pub fn create_room(
        &self,
        player_id: Uuid,
        player_name: String,
        settings: RoomSettings,
    ) -> Result<RoomInfo, RoomError> {
        if self.room_of(player_id).is_some() {
            return Err(RoomError::AlreadyInRoom);
        }
        let room_id = Uuid::new_v4();
        let room = GameRoom::new(room_id, player_id, player_name, settings)?;
        let room_info = room.to_info();

        self.rooms.insert(room_id, room);
        self.player_rooms.insert(player_id, room_id);
        Ok(room_info)
    }

    fn room_of(&self, player_id: Uuid) -> Option<Uuid> {
        self.player_rooms.get(&player_id).map(|r| *r)
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Reversi server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let player_id = Uuid::new_v4();

    // Outgoing messages go through a channel so rooms can push to any player
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.player_senders.insert(player_id, tx);

    let welcome = ServerMessage::Welcome { player_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(player_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", player_id, e);
                    state.send_error(player_id, format!("Invalid message: {e}"));
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", player_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_player(player_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    handle_disconnect(player_id, &state);
    state.player_senders.remove(&player_id);
    send_task.abort();

    info!("Connection closed for {}", player_id);
    Ok(())
}

/// Messages everyone in the room gets after the game moved on.
fn game_update(room: &mut GameRoom, started: bool) -> Result<Vec<ServerMessage>, RoomError> {
    let snapshot = room.snapshot()?;
    let turn = snapshot.turn;
    let mut messages = vec![if started {
        ServerMessage::GameStarted { state: snapshot }
    } else {
        ServerMessage::GameState { state: snapshot }
    }];

    match room.get_winner()? {
        Some(result) => {
            info!(room = %room.id, winner = ?result.winner, "Game over");
            messages.push(ServerMessage::GameOver {
                winner: result.winner,
                winner_name: result.winner_name,
            });
        }
        None => {
            messages.push(ServerMessage::LegalMoves {
                turn,
                moves: room.legal_moves()?,
            });
            messages.push(ServerMessage::TurnChanged { turn });
        }
    }
    Ok(messages)
}

/// Handle a client message.
fn handle_message(player_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::CreateRoom {
            player_name,
            settings,
        } => match state.create_room(player_id, player_name, settings) {
            Ok(room_info) => {
                info!(room = %room_info.id, ?settings, "Room created");
                state.send_to_player(
                    player_id,
                    ServerMessage::RoomCreated {
                        room_id: room_info.id,
                    },
                );
                state.send_to_player(player_id, ServerMessage::JoinedRoom { room: room_info });
            }
            Err(e) => state.send_error(player_id, e),
        },

        ClientMessage::JoinRoom {
            room_id,
            player_name,
        } => {
            if state.room_of(player_id).is_some() {
                state.send_error(player_id, RoomError::AlreadyInRoom);
            } else if let Some(mut room) = state.rooms.get_mut(&room_id) {
                match room.add_player(player_id, player_name) {
                    Ok(()) => {
                        let room_info = room.to_info();
                        state.player_rooms.insert(player_id, room_id);

                        state.send_to_player(
                            player_id,
                            ServerMessage::JoinedRoom {
                                room: room_info.clone(),
                            },
                        );

                        drop(room); // Release lock before broadcasting
                        state.broadcast_to_room_except(
                            room_id,
                            player_id,
                            ServerMessage::RoomUpdated { room: room_info },
                        );
                    }
                    Err(e) => state.send_error(player_id, e),
                }
            } else {
                state.send_error(player_id, "Room not found");
            }
        }

        ClientMessage::LeaveRoom => {
            if let Some((_, room_id)) = state.player_rooms.remove(&player_id) {
                let should_remove = {
                    if let Some(mut room) = state.rooms.get_mut(&room_id) {
                        let is_empty = room.remove_player(player_id).unwrap_or(false);

                        if !is_empty {
                            let room_info = room.to_info();
                            drop(room);
                            state.broadcast_to_room(
                                room_id,
                                ServerMessage::RoomUpdated { room: room_info },
                            );
                        }

                        is_empty
                    } else {
                        false
                    }
                };

                if should_remove {
                    state.rooms.remove(&room_id);
                }

                state.send_to_player(player_id, ServerMessage::LeftRoom);
            }
        }

        ClientMessage::StartGame => {
            let Some(room_id) = state.room_of(player_id) else {
                state.send_error(player_id, RoomError::PlayerNotInRoom);
                return;
            };
            if let Some(mut room) = state.rooms.get_mut(&room_id) {
                let update = room
                    .start_game(player_id)
                    .and_then(|()| game_update(&mut room, true));
                let room_info = room.to_info();
                drop(room);

                match update {
                    Ok(messages) => {
                        info!(room = %room_id, "Game started");
                        state.broadcast_to_room(
                            room_id,
                            ServerMessage::RoomUpdated { room: room_info },
                        );
                        for msg in messages {
                            state.broadcast_to_room(room_id, msg);
                        }
                    }
                    Err(e) => state.send_error(player_id, e),
                }
            }
        }

        ClientMessage::MakeMove { mv } => {
            let Some(room_id) = state.room_of(player_id) else {
                state.send_error(player_id, RoomError::PlayerNotInRoom);
                return;
            };
            if let Some(mut room) = state.rooms.get_mut(&room_id) {
                let update = room
                    .apply_move(player_id, mv)
                    .and_then(|()| game_update(&mut room, false));
                drop(room);

                match update {
                    Ok(messages) => {
                        state.send_to_player(
                            player_id,
                            ServerMessage::MoveResult {
                                success: true,
                                error: None,
                            },
                        );
                        for msg in messages {
                            state.broadcast_to_room(room_id, msg);
                        }
                    }
                    Err(e) => {
                        warn!(player = %player_id, ?mv, %e, "Move rejected");
                        state.send_to_player(
                            player_id,
                            ServerMessage::MoveResult {
                                success: false,
                                error: Some(e.to_string()),
                            },
                        );
                    }
                }
            }
        }

        ClientMessage::Hint { coord } => {
            let Some(room_id) = state.room_of(player_id) else {
                state.send_error(player_id, RoomError::PlayerNotInRoom);
                return;
            };
            let hint = state
                .rooms
                .get(&room_id)
                .map(|room| room.hint(player_id, coord));
            match hint {
                Some(Ok(value)) => {
                    state.send_to_player(player_id, ServerMessage::HintResult { coord, value })
                }
                Some(Err(e)) => state.send_error(player_id, e),
                None => state.send_error(player_id, "Room not found"),
            }
        }

        ClientMessage::ListRooms => {
            let rooms = state.get_waiting_rooms();
            state.send_to_player(player_id, ServerMessage::RoomList { rooms });
        }

        ClientMessage::Ping => {
            state.send_to_player(player_id, ServerMessage::Pong);
        }
    }
}

/// Handle player disconnect.
fn handle_disconnect(player_id: Uuid, state: &Arc<ServerState>) {
    if let Some((_, room_id)) = state.player_rooms.remove(&player_id) {
        if let Some(mut room) = state.rooms.get_mut(&room_id) {
            // Keep the seat during a game so the player can be shown as away
            if room.status == RoomStatus::InGame {
                room.set_player_connected(player_id, false);
                let room_info = room.to_info();
                drop(room);
                state.broadcast_to_room(room_id, ServerMessage::RoomUpdated { room: room_info });
            } else {
                let is_empty = room.remove_player(player_id).unwrap_or(false);
                if is_empty {
                    drop(room);
                    state.rooms.remove(&room_id);
                } else {
                    let room_info = room.to_info();
                    drop(room);
                    state.broadcast_to_room(
                        room_id,
                        ServerMessage::RoomUpdated { room: room_info },
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reversi_core::{Coordinate, DiscColor, Move, Topology};

    fn connect(state: &ServerState) -> (Uuid, mpsc::UnboundedReceiver<ServerMessage>) {
        let player_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        state.player_senders.insert(player_id, tx);
        (player_id, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    fn small_board() -> RoomSettings {
        RoomSettings {
            topology: Topology::Hex,
            layers: 3,
            opponent: None,
        }
    }

    fn create_and_join(state: &Arc<ServerState>, host: Uuid, guest: Uuid) -> Uuid {
        handle_message(
            host,
            ClientMessage::CreateRoom {
                player_name: "Host".to_string(),
                settings: small_board(),
            },
            state,
        );
        let room_id = state.room_of(host).unwrap();
        handle_message(
            guest,
            ClientMessage::JoinRoom {
                room_id,
                player_name: "Guest".to_string(),
            },
            state,
        );
        room_id
    }

    #[test]
    fn test_create_and_join() {
        let state = Arc::new(ServerState::new());
        let (host, mut host_rx) = connect(&state);
        let (guest, mut guest_rx) = connect(&state);
        let room_id = create_and_join(&state, host, guest);

        let host_msgs = drain(&mut host_rx);
        assert!(matches!(
            host_msgs[0],
            ServerMessage::RoomCreated { room_id: id } if id == room_id
        ));
        assert!(matches!(host_msgs[1], ServerMessage::JoinedRoom { .. }));
        assert!(matches!(
            &host_msgs[2],
            ServerMessage::RoomUpdated { room } if room.players.len() == 2
        ));

        let guest_msgs = drain(&mut guest_rx);
        assert_eq!(guest_msgs.len(), 1);
        assert!(matches!(guest_msgs[0], ServerMessage::JoinedRoom { .. }));

        // Full rooms are not listed
        assert!(state.get_waiting_rooms().is_empty());
    }

    #[test]
    fn test_one_room_per_player() {
        let state = Arc::new(ServerState::new());
        let (host, mut host_rx) = connect(&state);
        let (guest, mut guest_rx) = connect(&state);
        let room_id = create_and_join(&state, host, guest);
        drain(&mut host_rx);
        drain(&mut guest_rx);

        // A second room for the host is refused
        handle_message(
            host,
            ClientMessage::CreateRoom {
                player_name: "Host".to_string(),
                settings: small_board(),
            },
            &state,
        );
        assert!(matches!(drain(&mut host_rx)[..], [ServerMessage::Error { .. }]));
        assert_eq!(state.rooms.len(), 1);
        assert_eq!(state.room_of(host), Some(room_id));

        // So is joining another room while seated
        let (other, _other_rx) = connect(&state);
        handle_message(
            other,
            ClientMessage::CreateRoom {
                player_name: "Other".to_string(),
                settings: small_board(),
            },
            &state,
        );
        let other_room = state.room_of(other).unwrap();
        handle_message(
            guest,
            ClientMessage::JoinRoom {
                room_id: other_room,
                player_name: "Guest".to_string(),
            },
            &state,
        );
        assert!(matches!(drain(&mut guest_rx)[..], [ServerMessage::Error { .. }]));
        assert_eq!(state.room_of(guest), Some(room_id));
        assert_eq!(state.rooms.get(&other_room).unwrap().player_count(), 1);

        // Leaving first frees the player to join
        handle_message(guest, ClientMessage::LeaveRoom, &state);
        handle_message(
            guest,
            ClientMessage::JoinRoom {
                room_id: other_room,
                player_name: "Guest".to_string(),
            },
            &state,
        );
        assert_eq!(state.room_of(guest), Some(other_room));
        assert_eq!(state.rooms.get(&room_id).unwrap().player_count(), 1);
    }

    #[test]
    fn test_create_room_with_bad_board() {
        let state = Arc::new(ServerState::new());
        let (host, mut host_rx) = connect(&state);
        handle_message(
            host,
            ClientMessage::CreateRoom {
                player_name: "Host".to_string(),
                settings: RoomSettings {
                    topology: Topology::Square,
                    layers: 1,
                    opponent: None,
                },
            },
            &state,
        );

        assert!(state.rooms.is_empty());
        let msgs = drain(&mut host_rx);
        assert!(matches!(msgs[..], [ServerMessage::Error { .. }]));
    }

    #[test]
    fn test_game_flow() {
        let state = Arc::new(ServerState::new());
        let (host, mut host_rx) = connect(&state);
        let (guest, mut guest_rx) = connect(&state);
        let room_id = create_and_join(&state, host, guest);
        drain(&mut host_rx);
        drain(&mut guest_rx);

        handle_message(host, ClientMessage::StartGame, &state);
        let msgs = drain(&mut guest_rx);
        assert!(msgs.iter().any(|m| matches!(
            m,
            ServerMessage::GameStarted { state } if state.turn == DiscColor::Black
        )));
        assert!(msgs
            .iter()
            .any(|m| matches!(m, ServerMessage::LegalMoves { moves, .. } if !moves.is_empty())));
        drain(&mut host_rx);

        let black = {
            let room = state.rooms.get(&room_id).unwrap();
            if room.players[&host].color == Some(DiscColor::Black) {
                host
            } else {
                guest
            }
        };
        let white = if black == host { guest } else { host };

        // Out of turn
        handle_message(white, ClientMessage::MakeMove { mv: Move::Pass }, &state);
        let white_rx = if white == host { &mut host_rx } else { &mut guest_rx };
        let msgs = drain(white_rx);
        assert!(matches!(
            msgs[..],
            [ServerMessage::MoveResult { success: false, .. }]
        ));

        handle_message(
            black,
            ClientMessage::MakeMove {
                mv: Move::Play(Coordinate::new(-1, 2)),
            },
            &state,
        );
        let msgs = drain(&mut host_rx);
        assert!(msgs.iter().any(|m| matches!(
            m,
            ServerMessage::TurnChanged { turn } if *turn == DiscColor::White
        )));
    }

    #[test]
    fn test_hint() {
        let state = Arc::new(ServerState::new());
        let (host, mut host_rx) = connect(&state);
        let (guest, _guest_rx) = connect(&state);
        create_and_join(&state, host, guest);

        // Not started
        handle_message(
            host,
            ClientMessage::Hint {
                coord: Coordinate::new(-1, 2),
            },
            &state,
        );
        assert!(matches!(
            drain(&mut host_rx).last(),
            Some(ServerMessage::Error { .. })
        ));

        handle_message(host, ClientMessage::StartGame, &state);
        drain(&mut host_rx);
        handle_message(
            host,
            ClientMessage::Hint {
                coord: Coordinate::new(7, 7),
            },
            &state,
        );
        assert!(matches!(
            drain(&mut host_rx)[..],
            [ServerMessage::Error { .. }]
        ));
    }

    #[test]
    fn test_disconnect_during_game_keeps_seat() {
        let state = Arc::new(ServerState::new());
        let (host, _host_rx) = connect(&state);
        let (guest, _guest_rx) = connect(&state);
        let room_id = create_and_join(&state, host, guest);
        handle_message(host, ClientMessage::StartGame, &state);

        handle_disconnect(guest, &state);
        let room = state.rooms.get(&room_id).unwrap();
        assert_eq!(room.player_count(), 2);
        assert!(!room.players[&guest].connected);
    }

    #[test]
    fn test_leave_removes_empty_room() {
        let state = Arc::new(ServerState::new());
        let (host, mut host_rx) = connect(&state);
        handle_message(
            host,
            ClientMessage::CreateRoom {
                player_name: "Host".to_string(),
                settings: small_board(),
            },
            &state,
        );
        assert_eq!(state.get_waiting_rooms().len(), 1);

        handle_message(host, ClientMessage::LeaveRoom, &state);
        assert!(state.rooms.is_empty());
        assert!(matches!(
            drain(&mut host_rx).last(),
            Some(ServerMessage::LeftRoom)
        ));
    }
}

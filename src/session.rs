// =============================================================================
// Rooms and seats
//
// A SessionManager owns every room. Each Room owns exactly one MatchState plus
// the players seated in it, behind its own mutex, so moves within a room are
// totally ordered and rooms never wait on each other. The registry lock only
// covers lookup, insert and remove. A room lock may be held while taking the
// registry lock, never the other way round.
//
// Seats with no connected human are played by the automated agent after a
// delay. Every event that changes a room bumps its generation counter; a
// scheduled automated move remembers the generation it was armed for and does
// nothing if the room has moved on by the time it fires.
// =============================================================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::board::Position;
use crate::engine;
use crate::game::{now_millis, MatchState, MoveError};
use crate::moves::Move;
use crate::piece::{Color, TURN_ORDER};

const ROOM_ID_LEN: usize = 6;

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Pause before an unattended seat plays, so humans can follow the game.
    pub automated_move_delay: Duration,
    pub max_players: usize,
    /// Buffered events per room before slow subscribers start lagging.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            automated_move_delay: Duration::from_millis(2000),
            max_players: TURN_ORDER.len(),
            event_capacity: 100,
        }
    }
}

impl SessionConfig {
    pub fn with_automated_move_delay(mut self, delay: Duration) -> Self {
        self.automated_move_delay = delay;
        self
    }

    pub fn with_max_players(mut self, max_players: usize) -> Self {
        self.max_players = max_players.clamp(1, TURN_ORDER.len());
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Room not found")]
    RoomNotFound,
    #[error("Room is full")]
    RoomFull,
    #[error("Game already started")]
    GameAlreadyStarted,
    #[error("Game not started")]
    GameNotStarted,
    #[error("Player not found or unauthorized")]
    PlayerNotFound,
    #[error("Only the room creator can do that")]
    NotRoomCreator,
    #[error(transparent)]
    Move(#[from] MoveError),
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub color: Color,
    pub connected: bool,
}

/// What every participant in a room is told about.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RoomEvent {
    PlayerJoined { player: Player },
    PlayerLeft { player_id: Uuid },
    PlayerDisconnected { player_id: Uuid },
    PlayerReconnected { player_id: Uuid },
    GameStarted,
    GameReset,
    StateUpdated { state: MatchState, last_move: Option<Move> },
}

/// Public view of a room, as sent to the lobby.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    pub players: Vec<Player>,
    pub started: bool,
    pub state: MatchState,
}

pub struct Room {
    pub id: String,
    pub name: String,
    pub players: Vec<Player>,
    pub state: MatchState,
    pub started: bool,
    pub created_at: u64,
    generation: u64,
    /// Set once the room is dropped from the registry. Handles still held
    /// by in-flight calls must treat it as gone.
    closed: bool,
    events: broadcast::Sender<RoomEvent>,
}

impl Room {
    /// A new room with `creator_name` seated as red.
    pub fn new(id: String, name: String, creator_name: String, event_capacity: usize) -> (Room, Player) {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        let creator = Player {
            id: Uuid::new_v4(),
            name: creator_name,
            color: TURN_ORDER[0],
            connected: true,
        };
        let room = Room {
            id,
            name,
            players: vec![creator.clone()],
            state: MatchState::new(),
            started: false,
            created_at: now_millis(),
            generation: 0,
            closed: false,
            events,
        };
        (room, creator)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn bump(&mut self) {
        self.generation += 1;
    }

    fn broadcast(&self, event: RoomEvent) {
        // No subscribers is not an error; the room still advances.
        let _ = self.events.send(event);
    }

    fn broadcast_state(&self) {
        self.broadcast(RoomEvent::StateUpdated {
            state: self.state.clone(),
            last_move: self.state.last_move().cloned(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.events.subscribe()
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            players: self.players.clone(),
            started: self.started,
            state: self.state.clone(),
        }
    }

    pub fn player(&self, player_id: Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    fn player_mut(&mut self, player_id: Uuid) -> Result<&mut Player, SessionError> {
        self.players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(SessionError::PlayerNotFound)
    }

    fn require_creator(&self, player_id: Uuid) -> Result<(), SessionError> {
        self.player(player_id).ok_or(SessionError::PlayerNotFound)?;
        match self.players.first() {
            Some(first) if first.id == player_id => Ok(()),
            _ => Err(SessionError::NotRoomCreator),
        }
    }

    /// Is a connected human sitting in `color`'s seat?
    pub fn seat_attended(&self, color: Color) -> bool {
        self.players.iter().any(|p| p.color == color && p.connected)
    }

    pub fn is_open(&self, max_players: usize) -> bool {
        !self.started && self.players.len() < max_players
    }

    /// Should the automated agent play the next move?
    pub fn needs_automated_move(&self) -> bool {
        self.started && !self.state.is_over() && !self.seat_attended(self.state.current_player)
    }

    pub fn join(&mut self, name: String, max_players: usize) -> Result<Player, SessionError> {
        if self.players.len() >= max_players {
            return Err(SessionError::RoomFull);
        }
        if self.started {
            return Err(SessionError::GameAlreadyStarted);
        }
        let color = TURN_ORDER
            .into_iter()
            .find(|c| self.players.iter().all(|p| p.color != *c))
            .ok_or(SessionError::RoomFull)?;

        let player = Player {
            id: Uuid::new_v4(),
            name,
            color,
            connected: true,
        };
        self.players.push(player.clone());
        self.bump();
        self.broadcast(RoomEvent::PlayerJoined { player: player.clone() });
        Ok(player)
    }

    pub fn rejoin(&mut self, player_id: Uuid) -> Result<Player, SessionError> {
        let player = self.player_mut(player_id)?;
        player.connected = true;
        let player = player.clone();
        self.bump();
        self.broadcast(RoomEvent::PlayerReconnected { player_id });
        Ok(player)
    }

    pub fn leave(&mut self, player_id: Uuid) -> Result<Player, SessionError> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(SessionError::PlayerNotFound)?;
        let player = self.players.remove(index);
        self.bump();
        self.broadcast(RoomEvent::PlayerLeft { player_id });
        Ok(player)
    }

    pub fn disconnect(&mut self, player_id: Uuid) -> Result<(), SessionError> {
        self.player_mut(player_id)?.connected = false;
        self.bump();
        self.broadcast(RoomEvent::PlayerDisconnected { player_id });
        Ok(())
    }

    pub fn start(&mut self, player_id: Uuid) -> Result<(), SessionError> {
        self.require_creator(player_id)?;
        if self.started {
            return Err(SessionError::GameAlreadyStarted);
        }
        self.started = true;
        self.bump();
        self.broadcast(RoomEvent::GameStarted);
        self.broadcast_state();
        Ok(())
    }

    pub fn reset(&mut self, player_id: Uuid) -> Result<(), SessionError> {
        self.require_creator(player_id)?;
        self.state.reset();
        self.bump();
        self.broadcast(RoomEvent::GameReset);
        self.broadcast_state();
        Ok(())
    }

    /// A human move. The submitter must hold the seat that is to move.
    pub fn submit_move(&mut self, player_id: Uuid, from: Position, to: Position) -> Result<Move, SessionError> {
        if !self.started {
            return Err(SessionError::GameNotStarted);
        }
        let color = self.player(player_id).ok_or(SessionError::PlayerNotFound)?.color;
        let mv = self.state.apply_move_as(color, from, to)?;
        self.bump();
        self.broadcast_state();
        Ok(mv)
    }

    /// Play for an unattended seat, provided nothing has happened in the room
    /// since `generation` was observed.
    pub fn play_automated_move(&mut self, generation: u64) -> Option<Move> {
        if generation != self.generation {
            debug!("room {}: dropping stale automated move (armed at {generation}, now {})", self.id, self.generation);
            return None;
        }
        if !self.needs_automated_move() {
            return None;
        }
        match engine::play_move(&mut self.state) {
            Ok(Some(mv)) => {
                self.bump();
                self.broadcast_state();
                Some(mv)
            }
            Ok(None) => {
                info!("room {}: automated {} has no legal move", self.id, self.state.current_player);
                None
            }
            Err(e) => {
                warn!("room {}: automated move rejected: {e}", self.id);
                None
            }
        }
    }
}

fn generate_room_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ROOM_ID_LEN)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

type SharedRoom = Arc<Mutex<Room>>;
type Rooms = Arc<Mutex<HashMap<String, SharedRoom>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of all live rooms. Cheap to clone; clones share the same rooms.
#[derive(Clone, Default)]
pub struct SessionManager {
    rooms: Rooms,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        SessionManager {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn room(&self, room_id: &str) -> Result<SharedRoom, SessionError> {
        lock(&self.rooms).get(room_id).cloned().ok_or(SessionError::RoomNotFound)
    }

    fn with_room<T>(&self, room_id: &str, f: impl FnOnce(&mut Room) -> Result<T, SessionError>) -> Result<T, SessionError> {
        let shared = self.room(room_id)?;
        let mut room = lock(&shared);
        if room.closed {
            return Err(SessionError::RoomNotFound);
        }
        f(&mut room)
    }

    /// Run `f` on the room and delete the room if it returns true. The
    /// decision and the removal happen under the same room lock, so nobody
    /// can slip into a room that is about to go.
    fn with_room_or_remove(&self, room_id: &str, f: impl FnOnce(&mut Room) -> Result<bool, SessionError>) -> Result<bool, SessionError> {
        let shared = self.room(room_id)?;
        let mut room = lock(&shared);
        if room.closed {
            return Err(SessionError::RoomNotFound);
        }
        let remove = f(&mut room)?;
        if remove {
            room.closed = true;
            room.bump();
            lock(&self.rooms).remove(room_id);
        }
        Ok(remove)
    }

    pub fn room_count(&self) -> usize {
        lock(&self.rooms).len()
    }

    pub fn create_room(&self, room_name: &str, player_name: &str) -> (RoomSummary, Player) {
        let mut rooms = lock(&self.rooms);
        let mut id = generate_room_id();
        while rooms.contains_key(&id) {
            id = generate_room_id();
        }
        let (room, creator) = Room::new(
            id.clone(),
            room_name.to_string(),
            player_name.to_string(),
            self.config.event_capacity,
        );
        let summary = room.summary();
        rooms.insert(id.clone(), Arc::new(Mutex::new(room)));
        info!("room {id} created by {player_name} ({})", creator.id);
        (summary, creator)
    }

    pub fn join_room(&self, room_id: &str, player_name: &str) -> Result<(RoomSummary, Player), SessionError> {
        let max_players = self.config.max_players;
        self.with_room(room_id, |room| {
            let player = room.join(player_name.to_string(), max_players)?;
            info!("{player_name} ({}) joined room {room_id} as {}", player.id, player.color);
            Ok((room.summary(), player))
        })
    }

    /// Restore a seat after a dropped connection.
    pub fn rejoin_room(&self, room_id: &str, player_id: Uuid) -> Result<(RoomSummary, Player), SessionError> {
        let joined = self.with_room(room_id, |room| {
            let player = room.rejoin(player_id)?;
            info!("{} ({player_id}) reconnected to room {room_id}", player.name);
            Ok((room.summary(), player))
        })?;
        self.check_and_schedule(room_id);
        Ok(joined)
    }

    /// Give up a seat. The color falls to the automated agent; an empty room is deleted.
    pub fn leave_room(&self, room_id: &str, player_id: Uuid) -> Result<(), SessionError> {
        let emptied = self.with_room_or_remove(room_id, |room| {
            room.leave(player_id)?;
            Ok(room.players.is_empty())
        })?;
        if emptied {
            info!("room {room_id} deleted, no players left");
        } else {
            self.check_and_schedule(room_id);
        }
        Ok(())
    }

    /// Mark a seat disconnected. A room that never started and has nobody
    /// connected is deleted.
    pub fn disconnect(&self, room_id: &str, player_id: Uuid) -> Result<(), SessionError> {
        let abandoned = self.with_room_or_remove(room_id, |room| {
            room.disconnect(player_id)?;
            Ok(!room.started && room.players.iter().all(|p| !p.connected))
        })?;
        if abandoned {
            info!("room {room_id} deleted, no connected players");
        } else {
            self.check_and_schedule(room_id);
        }
        Ok(())
    }

    pub fn start_game(&self, room_id: &str, player_id: Uuid) -> Result<MatchState, SessionError> {
        let state = self.with_room(room_id, |room| {
            room.start(player_id)?;
            info!("game started in room {room_id}");
            Ok(room.state.clone())
        })?;
        self.check_and_schedule(room_id);
        Ok(state)
    }

    pub fn reset_game(&self, room_id: &str, player_id: Uuid) -> Result<MatchState, SessionError> {
        let state = self.with_room(room_id, |room| {
            room.reset(player_id)?;
            info!("game reset in room {room_id}");
            Ok(room.state.clone())
        })?;
        self.check_and_schedule(room_id);
        Ok(state)
    }

    pub fn make_move(&self, room_id: &str, player_id: Uuid, from: Position, to: Position) -> Result<Move, SessionError> {
        let mv = self.with_room(room_id, |room| room.submit_move(player_id, from, to))?;
        self.check_and_schedule(room_id);
        Ok(mv)
    }

    /// Legal destinations for highlighting the piece on `pos`.
    pub fn legal_moves(&self, room_id: &str, pos: Position) -> Result<Vec<Position>, SessionError> {
        self.with_room(room_id, |room| Ok(room.state.legal_moves(pos)))
    }

    pub fn state(&self, room_id: &str) -> Result<MatchState, SessionError> {
        self.with_room(room_id, |room| Ok(room.state.clone()))
    }

    pub fn subscribe(&self, room_id: &str) -> Result<broadcast::Receiver<RoomEvent>, SessionError> {
        self.with_room(room_id, |room| Ok(room.subscribe()))
    }

    /// Rooms still waiting to start with a free seat.
    pub fn open_rooms(&self) -> Vec<RoomSummary> {
        let max_players = self.config.max_players;
        let rooms: Vec<SharedRoom> = lock(&self.rooms).values().cloned().collect();
        rooms
            .iter()
            .filter_map(|shared| {
                let room = lock(shared);
                (!room.closed && room.is_open(max_players)).then(|| room.summary())
            })
            .collect()
    }

    /// Arm an automated move if the seat to move is unattended.
    pub fn check_and_schedule(&self, room_id: &str) {
        let armed = self.with_room(room_id, |room| Ok(room.needs_automated_move().then(|| room.generation())));
        if let Ok(Some(generation)) = armed {
            self.schedule(room_id.to_string(), generation);
        }
    }

    fn schedule(&self, room_id: String, generation: u64) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("room {room_id}: no async runtime, automated move not scheduled");
                return;
            }
        };
        let manager = self.clone();
        let delay = self.config.automated_move_delay;
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            manager.fire(&room_id, generation);
        });
    }

    fn fire(&self, room_id: &str, generation: u64) {
        let next = self.with_room(room_id, |room| {
            let Some(mv) = room.play_automated_move(generation) else {
                return Ok(None);
            };
            info!("room {room_id}: automated {}", mv);
            Ok(room.needs_automated_move().then(|| room.generation()))
        });
        if let Ok(Some(generation)) = next {
            self.schedule(room_id.to_string(), generation);
        }
    }
}

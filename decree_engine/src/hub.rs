//! The server-wide room directory and per-connection dispatch.
//!
//! Grounded on `private_poker::table::manager::TableManager`: an
//! `Arc<RwLock<HashMap<_, _>>>` directory of actor handles, with lookup and
//! creation serialized through a single async-friendly lock rather than one
//! lock per room.

use crate::autoplay::AutoPlayStrategy;
use crate::error::{CommandError, RoomError};
use crate::messages::{ClientMessage, ServerEvent};
use crate::room::{RoomActor, RoomConfig, RoomHandle};
use crate::session::{PlayerId, RateLimitCategory, RateLimiters, RoomId, Transport};
use crate::validation;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct ConnectionState {
    transport: Transport,
    rate_limiters: RateLimiters,
    room_id: Option<RoomId>,
}

pub struct Hub {
    rooms: RwLock<HashMap<RoomId, RoomHandle>>,
    connections: RwLock<HashMap<PlayerId, ConnectionState>>,
    strategy: Arc<dyn AutoPlayStrategy>,
}

impl Hub {
    pub fn new(strategy: Arc<dyn AutoPlayStrategy>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            connections: RwLock::new(HashMap::new()),
            strategy,
        }
    }

    /// Registers a new connection and assigns it the stable id it keeps for
    /// its lifetime, including across `reconnect`.
    pub async fn accept_connection(&self, transport: Transport) -> PlayerId {
        let player_id = uuid::Uuid::new_v4();
        self.connections.write().await.insert(
            player_id,
            ConnectionState { transport, rate_limiters: RateLimiters::default(), room_id: None },
        );
        player_id
    }

    /// Tears down a connection: leaves/disconnects its room (if any) and
    /// drops its rate limiter state.
    pub async fn remove_connection(&self, player_id: PlayerId) {
        let room_id = self.connections.write().await.remove(&player_id).and_then(|c| c.room_id);
        if let Some(room_id) = room_id
            && let Some(handle) = self.rooms.read().await.get(&room_id)
        {
            handle.disconnect(player_id).await;
        }
    }

    fn send_to(&self, connections: &HashMap<PlayerId, ConnectionState>, player_id: PlayerId, event: ServerEvent) {
        if let Some(conn) = connections.get(&player_id) {
            let _ = conn.transport.send(event);
        }
    }

    fn send_error(&self, connections: &HashMap<PlayerId, ConnectionState>, player_id: PlayerId, error: CommandError) {
        self.send_to(
            connections,
            player_id,
            ServerEvent::Error { code: error.code(), message: error.message() },
        );
    }

    /// Routes one incoming client message for an already-registered connection.
    pub async fn dispatch(&self, player_id: PlayerId, msg: ClientMessage) {
        let category = rate_limit_category(&msg);
        if let Some(category) = category {
            let mut connections = self.connections.write().await;
            let Some(conn) = connections.get_mut(&player_id) else { return };
            if !conn.rate_limiters.check(category) {
                self.send_error(&connections, player_id, crate::error::RateLimitError.into());
                return;
            }
        }

        match msg {
            ClientMessage::CreateRoom { player_name, game_mode, max_players } => {
                self.handle_create_room(player_id, player_name, game_mode, max_players).await;
            }
            ClientMessage::JoinRoom { room_id, player_name, guest_id } => {
                self.handle_join_room(player_id, room_id, player_name, guest_id).await;
            }
            ClientMessage::Reconnect { room_id, player_id: claimed_id, guest_id: _, player_name } => {
                self.handle_reconnect(player_id, room_id, claimed_id, player_name).await;
            }
            ClientMessage::LeaveRoom {} => {
                self.forward_in_room(player_id, |h, id| async move { h.leave(id).await }).await
            }
            ClientMessage::Ready {} => {
                self.forward_in_room(player_id, |h, id| async move { h.set_ready(id, true).await }).await
            }
            ClientMessage::StartGame {} => {
                self.forward_in_room(player_id, |h, id| async move { h.start_game(id).await }).await
            }
            ClientMessage::RestartGame {} => {
                self.forward_in_room(player_id, |h, id| async move { h.restart_game(id).await }).await
            }
            ClientMessage::SetAuto { is_auto } => {
                self.forward_in_room(player_id, move |h, id| async move { h.set_auto(id, is_auto).await }).await
            }
            ClientMessage::Ping {} => self.handle_ping(player_id).await,
            ClientMessage::DealerCall { room_id, player_id: claimed, cards_to_play } => {
                self.handle_identified(player_id, room_id, claimed, move |h, id| async move {
                    h.dealer_call(id, cards_to_play).await
                })
                .await;
            }
            ClientMessage::SelectFirstDealerCard { room_id, player_id: claimed, card } => {
                match validation::validate_card_bytes(&[card]) {
                    Ok(cards) => {
                        let card = cards[0];
                        self.handle_identified(player_id, room_id, claimed, move |h, id| async move {
                            h.select_first_dealer_card(id, card).await
                        })
                        .await;
                    }
                    Err(e) => {
                        let connections = self.connections.read().await;
                        self.send_error(&connections, player_id, e.into());
                    }
                }
            }
            ClientMessage::PlayCards { room_id, player_id: claimed, cards } => {
                match validation::validate_card_bytes(&cards) {
                    Ok(cards) => {
                        self.handle_identified(player_id, room_id, claimed, move |h, id| async move {
                            h.play_cards(id, cards).await
                        })
                        .await;
                    }
                    Err(e) => {
                        let connections = self.connections.read().await;
                        self.send_error(&connections, player_id, e.into());
                    }
                }
            }
        }
    }

    async fn handle_create_room(&self, player_id: PlayerId, player_name: String, game_mode: String, max_players: usize) {
        let name = match validation::sanitize_player_name(&player_name) {
            Ok(name) => name,
            Err(e) => {
                let connections = self.connections.read().await;
                self.send_error(&connections, player_id, e.into());
                return;
            }
        };
        let max_players = max_players.clamp(2, 8);
        let room_id = uuid::Uuid::new_v4();
        let handle = RoomActor::spawn(room_id, RoomConfig { game_mode, max_players }, Arc::clone(&self.strategy));

        let transport = {
            let connections = self.connections.read().await;
            connections.get(&player_id).map(|c| c.transport.clone())
        };
        let Some(transport) = transport else { return };

        match handle.join(player_id, name.clone(), None, transport.clone()).await {
            Ok(()) => {
                self.rooms.write().await.insert(room_id, handle);
                let mut connections = self.connections.write().await;
                if let Some(conn) = connections.get_mut(&player_id) {
                    conn.room_id = Some(room_id);
                }
                self.send_to(
                    &connections,
                    player_id,
                    ServerEvent::RoomCreated { room_id, player_id, player_name: name, max_players },
                );
            }
            Err(e) => {
                let connections = self.connections.read().await;
                self.send_error(&connections, player_id, e.into());
            }
        }
    }

    async fn handle_join_room(&self, player_id: PlayerId, room_id: RoomId, player_name: String, guest_id: Option<String>) {
        let name = match validation::sanitize_player_name(&player_name) {
            Ok(name) => name,
            Err(e) => {
                let connections = self.connections.read().await;
                self.send_error(&connections, player_id, e.into());
                return;
            }
        };
        let guest_id = match validation::validate_guest_id(guest_id.as_deref()) {
            Ok(g) => g,
            Err(e) => {
                let connections = self.connections.read().await;
                self.send_error(&connections, player_id, e.into());
                return;
            }
        };

        let handle = self.rooms.read().await.get(&room_id).cloned();
        let Some(handle) = handle else {
            let connections = self.connections.read().await;
            self.send_error(&connections, player_id, RoomError::NotFound.into());
            return;
        };

        let transport = {
            let connections = self.connections.read().await;
            connections.get(&player_id).map(|c| c.transport.clone())
        };
        let Some(transport) = transport else { return };

        match handle.join(player_id, name, guest_id, transport).await {
            Ok(()) => {
                let mut connections = self.connections.write().await;
                if let Some(conn) = connections.get_mut(&player_id) {
                    conn.room_id = Some(room_id);
                }
            }
            Err(e) => {
                let connections = self.connections.read().await;
                self.send_error(&connections, player_id, e.into());
            }
        }
    }

    async fn handle_reconnect(&self, player_id: PlayerId, room_id: RoomId, claimed_id: Option<PlayerId>, player_name: String) {
        let target_id = claimed_id.unwrap_or(player_id);
        let name = match validation::sanitize_player_name(&player_name) {
            Ok(name) => name,
            Err(e) => {
                let connections = self.connections.read().await;
                self.send_error(&connections, player_id, e.into());
                return;
            }
        };

        let handle = self.rooms.read().await.get(&room_id).cloned();
        let Some(handle) = handle else {
            let connections = self.connections.read().await;
            self.send_error(&connections, player_id, RoomError::NotFound.into());
            return;
        };

        let transport = {
            let connections = self.connections.read().await;
            connections.get(&player_id).map(|c| c.transport.clone())
        };
        let Some(transport) = transport else { return };

        if let Err(e) = {
            let mut limiters = self.connections.write().await;
            let allowed = limiters
                .get_mut(&player_id)
                .map(|c| c.rate_limiters.check(RateLimitCategory::Reconnect))
                .unwrap_or(false);
            if allowed { Ok(()) } else { Err(crate::error::RateLimitError) }
        } {
            let connections = self.connections.read().await;
            self.send_error(&connections, player_id, e.into());
            return;
        }

        match handle.reconnect(target_id, name, transport).await {
            Ok(()) => {
                let mut connections = self.connections.write().await;
                if let Some(conn) = connections.get_mut(&player_id) {
                    conn.room_id = Some(room_id);
                }
            }
            Err(e) => {
                let connections = self.connections.read().await;
                self.send_error(&connections, player_id, e.into());
            }
        }
    }

    /// Replies `pong` unconditionally, whether or not the connection has joined a room.
    async fn handle_ping(&self, player_id: PlayerId) {
        let room_id = {
            let connections = self.connections.read().await;
            connections.get(&player_id).and_then(|c| c.room_id)
        };
        let handle = match room_id {
            Some(room_id) => self.rooms.read().await.get(&room_id).cloned(),
            None => None,
        };
        match handle {
            Some(handle) => handle.ping(player_id).await,
            None => {
                let connections = self.connections.read().await;
                self.send_to(&connections, player_id, ServerEvent::Pong {});
            }
        }
    }

    async fn forward_in_room<F, Fut>(&self, player_id: PlayerId, f: F)
    where
        F: FnOnce(RoomHandle, PlayerId) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let (handle, _room_id) = {
            let connections = self.connections.read().await;
            let Some(room_id) = connections.get(&player_id).and_then(|c| c.room_id) else { return };
            let Some(handle) = self.rooms.read().await.get(&room_id).cloned() else { return };
            (handle, room_id)
        };
        f(handle, player_id).await;
    }

    /// Forwards a message that itself carries a `roomId`/`playerId` pair —
    /// rejected if either disagrees with what the hub recorded at connect
    /// time, so a connection can never act on behalf of another player.
    async fn handle_identified<F, Fut>(&self, player_id: PlayerId, claimed_room: RoomId, claimed_player: PlayerId, f: F)
    where
        F: FnOnce(RoomHandle, PlayerId) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        if claimed_player != player_id {
            let connections = self.connections.read().await;
            self.send_error(&connections, player_id, RoomError::PlayerIdMismatch.into());
            return;
        }
        let handle = {
            let connections = self.connections.read().await;
            let Some(room_id) = connections.get(&player_id).and_then(|c| c.room_id) else {
                self.send_error(&connections, player_id, RoomError::NotFound.into());
                return;
            };
            if room_id != claimed_room {
                self.send_error(&connections, player_id, RoomError::PlayerIdMismatch.into());
                return;
            }
            self.rooms.read().await.get(&room_id).cloned()
        };
        let Some(handle) = handle else { return };
        f(handle, player_id).await;
    }

    /// Periodic maintenance: drop rooms that are empty or past their idle
    /// timeout. Intended to be driven by a `tokio::time::interval` loop in
    /// the connection/server layer.
    pub async fn sweep_idle_rooms(&self) {
        let candidates: Vec<(RoomId, RoomHandle)> =
            self.rooms.read().await.iter().map(|(id, h)| (*id, h.clone())).collect();
        let mut to_drop = Vec::new();
        for (room_id, handle) in candidates {
            if handle.idle_sweep().await.should_drop {
                to_drop.push(room_id);
            }
        }
        if to_drop.is_empty() {
            return;
        }
        let mut rooms = self.rooms.write().await;
        for room_id in to_drop {
            rooms.remove(&room_id);
        }
    }

    /// A lightweight summary of live rooms, used by the `/stats` endpoint.
    pub async fn stats(&self) -> Vec<RoomStats> {
        let rooms = self.rooms.read().await;
        let mut stats = Vec::with_capacity(rooms.len());
        for handle in rooms.values() {
            stats.push(handle.stats().await);
        }
        stats
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

pub use crate::room::RoomStats;

fn rate_limit_category(msg: &ClientMessage) -> Option<RateLimitCategory> {
    match msg {
        ClientMessage::CreateRoom { .. }
        | ClientMessage::JoinRoom { .. }
        | ClientMessage::LeaveRoom {}
        | ClientMessage::Ready {}
        | ClientMessage::StartGame {}
        | ClientMessage::RestartGame {} => Some(RateLimitCategory::RoomAction),
        ClientMessage::Reconnect { .. } => None,
        ClientMessage::DealerCall { .. }
        | ClientMessage::SelectFirstDealerCard { .. }
        | ClientMessage::PlayCards { .. }
        | ClientMessage::SetAuto { .. } => Some(RateLimitCategory::GameAction),
            ClientMessage::Ping {} => None,
    }
}

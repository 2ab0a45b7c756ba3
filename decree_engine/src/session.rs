//! Player sessions, their transport handle, and per-connection rate limiting.
//!
//! The sliding-window limiter is lifted from
//! `pp_server::api::rate_limiter::RateLimiter`; this project needs three
//! named instances per connection instead of one, so they're grouped in
//! [`RateLimiters`] rather than duplicated at each call site.

use crate::constants::{GAME_ACTION_RATE_LIMIT, RECONNECT_RATE_LIMIT, ROOM_ACTION_RATE_LIMIT};
use crate::messages::ServerEvent;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

pub type PlayerId = Uuid;
pub type RoomId = Uuid;

/// A sliding-window request counter, one per connection per category.
#[derive(Debug)]
pub struct RateLimiter {
    timestamps: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// Returns `true` and records the attempt if under the limit; `false`
    /// (and the limiter is left unchanged) if the limit is already hit.
    pub fn check(&mut self) -> bool {
        let now = Instant::now();
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
        if self.timestamps.len() >= self.max_requests {
            return false;
        }
        self.timestamps.push_back(now);
        true
    }

    pub fn current_count(&self) -> usize {
        self.timestamps.len()
    }
}

/// The category a client message falls into for throttling purposes
///. Heartbeats (`ping`) are exempt from error feedback but still
/// bounded; callers should still run them through a limiter of their own.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RateLimitCategory {
    GameAction,
    RoomAction,
    Reconnect,
}

/// The three named rate limiters every connection carries.
#[derive(Debug)]
pub struct RateLimiters {
    game_action: RateLimiter,
    room_action: RateLimiter,
    reconnect: RateLimiter,
}

impl Default for RateLimiters {
    fn default() -> Self {
        let (game_n, game_w) = GAME_ACTION_RATE_LIMIT;
        let (room_n, room_w) = ROOM_ACTION_RATE_LIMIT;
        let (recon_n, recon_w) = RECONNECT_RATE_LIMIT;
        Self {
            game_action: RateLimiter::new(game_n, game_w),
            room_action: RateLimiter::new(room_n, room_w),
            reconnect: RateLimiter::new(recon_n, recon_w),
        }
    }
}

impl RateLimiters {
    pub fn check(&mut self, category: RateLimitCategory) -> bool {
        match category {
            RateLimitCategory::GameAction => self.game_action.check(),
            RateLimitCategory::RoomAction => self.room_action.check(),
            RateLimitCategory::Reconnect => self.reconnect.check(),
        }
    }
}

/// The outbound half of a connection: a channel of server events the
/// connection task drains and serializes onto the real transport. Mirrors
/// `pp_server::api::websocket::handle_socket`'s per-connection
/// `mpsc::channel` relay.
pub type Transport = mpsc::UnboundedSender<ServerEvent>;

/// The public projection of a session broadcast to peers.
#[derive(Clone, Debug, Serialize)]
pub struct PlayerInfo {
    pub player_id: PlayerId,
    pub name: String,
    pub seat_index: usize,
    pub is_ready: bool,
    pub is_host: bool,
    pub is_connected: bool,
}

/// A connected (or recently disconnected) player bound to a room.
pub struct PlayerSession {
    pub player_id: PlayerId,
    pub guest_id: Option<String>,
    pub name: String,
    pub room_id: Option<RoomId>,
    pub seat_index: usize,
    pub is_ready: bool,
    pub is_host: bool,
    pub is_connected: bool,
    pub last_heartbeat: Instant,
    pub transport: Transport,
}

impl PlayerSession {
    pub fn new(name: String, guest_id: Option<String>, seat_index: usize, transport: Transport) -> Self {
        Self {
            player_id: Uuid::new_v4(),
            guest_id,
            name,
            room_id: None,
            seat_index,
            is_ready: false,
            is_host: false,
            is_connected: true,
            last_heartbeat: Instant::now(),
            transport,
        }
    }

    pub fn send(&self, event: ServerEvent) {
        // A stuck or dropped client receiver must never freeze the room; the
        // unbounded channel absorbs it and the send failure is silently
        // treated as "peer gone" rather than blocking the room on a dead peer.
        let _ = self.transport.send(event);
    }

    pub fn update_heartbeat(&mut self) {
        self.last_heartbeat = Instant::now();
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_heartbeat.elapsed() > timeout
    }

    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            player_id: self.player_id,
            name: self.name.clone(),
            seat_index: self.seat_index,
            is_ready: self.is_ready,
            is_host: self.is_host,
            is_connected: self.is_connected,
        }
    }
}

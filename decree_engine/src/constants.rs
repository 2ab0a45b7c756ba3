//! Process-wide constants for room lifecycle, timers, and validation limits.

use std::time::Duration;

/// A room with no activity longer than this is dropped by the idle sweep.
pub const ROOM_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Cadence of the hub's idle sweep, and the client heartbeat cadence.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// A live session with no heartbeat in this long is treated as a disconnect.
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(90);

/// How long a disconnected session may be resumed via `reconnect`.
pub const RECONNECT_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Delay before an auto-played decision is made, so the table doesn't snap
/// instantly from under a disconnected or slow player.
pub const AUTO_PLAY_DELIBERATION: Duration = Duration::from_secs(2);

/// Delay between a round's scoring and the refill that starts the next one.
pub const SCORING_TO_REFILL_DELAY: Duration = Duration::from_secs(2);

/// Delay between `GameOver` and the room resetting back to `Waiting`.
pub const END_OF_GAME_DELAY: Duration = Duration::from_secs(5);

/// Delay between `start_game` and the first deal.
pub const DEAL_DELAY: Duration = Duration::from_millis(500);

/// Default number of community cards dealt per game.
pub const COMMUNITY_CARD_COUNT: usize = 4;

/// Number of cards dealt to each seated player at the start of a game.
pub const STARTING_HAND_SIZE: usize = 5;

/// Minimum number of players required to start or keep a game running.
pub const MIN_PLAYERS: usize = 2;

/// Maximum `playerName` length, in Unicode code points.
pub const MAX_NAME_LENGTH: usize = 50;

/// Default display name assigned when a client submits an empty name.
pub const DEFAULT_PLAYER_NAME: &str = "Guest";

/// Rate limit: game actions (ready, dealer call, select card, play cards, set auto).
pub const GAME_ACTION_RATE_LIMIT: (usize, Duration) = (10, Duration::from_secs(1));

/// Rate limit: room actions (create, join, leave).
pub const ROOM_ACTION_RATE_LIMIT: (usize, Duration) = (5, Duration::from_secs(1));

/// Rate limit: reconnect attempts.
pub const RECONNECT_RATE_LIMIT: (usize, Duration) = (10, Duration::from_secs(60));

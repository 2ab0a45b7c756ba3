//! # decree_engine
//!
//! The game engine for TheDecree: a real-time, round-based card game played
//! by two or more players over a shared community spread. The crate is
//! split so the core rules stay testable in isolation from any transport:
//!
//! - [`card`]: suit/rank encoding, hand evaluation, the deck.
//! - [`engine`]: the per-game state machine — deal, first-dealer election,
//!   dealer call, play, showdown, scoring, refill, game over.
//! - [`room`]: the actor that owns one game's players and drives the engine
//!   with real-world delays between phases.
//! - [`session`]: per-connection state — rate limiting, heartbeats, the
//!   outbound event channel.
//! - [`messages`]: the wire protocol shared with the server crate.
//! - [`error`], [`validation`], [`autoplay`], [`constants`]: supporting
//!   types used throughout the above.

pub mod autoplay;
pub mod card;
pub mod constants;
pub mod engine;
pub mod error;
pub mod hub;
pub mod messages;
pub mod room;
pub mod session;
pub mod validation;

pub use card::{Card, Deck, HandResult, HandType, Suit};
pub use engine::{Engine, EngineState};
pub use error::{CommandError, ErrorCode};
pub use hub::Hub;
pub use messages::{ClientMessage, ServerEvent};
pub use room::{RoomActor, RoomConfig, RoomHandle, RoomSnapshot};
pub use session::{PlayerId, RoomId};

//! Typed errors for each layer boundary: validation, engine, room, rate limit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The `code` sent to clients in an `error` event.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    RoomNotFound,
    RoomFull,
    InvalidPlay,
    NotYourTurn,
    GameNotStarted,
    AlreadyPlayed,
    InvalidCards,
    NotDealer,
    InternalError,
}

/// Validation failures: malformed payload, bad name,
/// bad card, wrong id. Never mutates state; no broadcast.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ValidationError {
    #[error("player name must be 1-50 characters")]
    InvalidName,
    #[error("guestId does not match the expected guest_<uuid>(_N)? shape")]
    InvalidGuestId,
    #[error("card array is empty, too long, or contains duplicates")]
    InvalidCardArray,
    #[error("card byte {0:#04x} is not a valid suit/rank encoding")]
    InvalidCardEncoding(u8),
    #[error("player does not hold one or more of the submitted cards")]
    CardsNotOwned,
}

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidationError::InvalidName | ValidationError::InvalidGuestId => {
                ErrorCode::InvalidPlay
            }
            ValidationError::InvalidCardArray
            | ValidationError::InvalidCardEncoding(_)
            | ValidationError::CardsNotOwned => ErrorCode::InvalidCards,
        }
    }
}

/// Protocol-order failures: legal action, wrong state.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EngineError {
    #[error("game has not started")]
    GameNotStarted,
    #[error("only the current dealer may call")]
    NotDealer,
    #[error("cardsToPlay must be 1, 2, or 3")]
    InvalidCardsToPlay,
    #[error("player has already played this round")]
    AlreadyPlayed,
    #[error("wrong number of cards for this round's call")]
    WrongCardCount,
    #[error("unknown player id")]
    UnknownPlayer,
    #[error("action is not legal in the current engine state")]
    WrongState,
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::GameNotStarted => ErrorCode::GameNotStarted,
            EngineError::NotDealer => ErrorCode::NotDealer,
            EngineError::AlreadyPlayed => ErrorCode::AlreadyPlayed,
            EngineError::InvalidCardsToPlay | EngineError::WrongCardCount => {
                ErrorCode::InvalidCards
            }
            EngineError::UnknownPlayer | EngineError::WrongState => ErrorCode::InvalidPlay,
        }
    }
}

/// Resource failures: room full, room not found,
/// server capacity exceeded.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RoomError {
    #[error("room not found")]
    NotFound,
    #[error("room is full")]
    Full,
    #[error("only the host may start the game")]
    NotHost,
    #[error("all players must be ready to start")]
    NotAllReady,
    #[error("at least two players are required")]
    NotEnoughPlayers,
    #[error("game is already in progress")]
    AlreadyPlaying,
    #[error("player id does not match this connection's session")]
    PlayerIdMismatch,
    #[error("no disconnected session found for this reconnect attempt")]
    NothingToReconnect,
}

impl RoomError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RoomError::NotFound | RoomError::NothingToReconnect => ErrorCode::RoomNotFound,
            RoomError::Full => ErrorCode::RoomFull,
            RoomError::NotHost
            | RoomError::NotAllReady
            | RoomError::NotEnoughPlayers
            | RoomError::AlreadyPlaying
            | RoomError::PlayerIdMismatch => ErrorCode::InvalidPlay,
        }
    }
}

/// Throttling failure.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error("rate limit exceeded for this category")]
pub struct RateLimitError;

/// Umbrella error returned to the connection layer so it can turn any
/// failure into a single `error` event without matching on every source type.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Room(#[from] RoomError),
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CommandError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CommandError::Validation(e) => e.code(),
            CommandError::Engine(e) => e.code(),
            CommandError::Room(e) => e.code(),
            CommandError::RateLimit(_) => ErrorCode::InvalidPlay,
            CommandError::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

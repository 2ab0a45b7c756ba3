//! The wire protocol: client-to-server commands and server-to-client events.
//!
//! Tagged-enum shape grounded on `pp_server::api::websocket`'s
//! `ClientMessage`/`ServerResponse` and `private_poker::net::messages`'s
//! `UserCommand` catalog, generalized to TheDecree's own event set.

use crate::card::HandType;
use crate::error::ErrorCode;
use crate::session::{PlayerId, PlayerInfo, RoomId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(rename = "gameMode")]
        game_mode: String,
        #[serde(rename = "maxPlayers")]
        max_players: usize,
    },
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(rename = "guestId")]
        guest_id: Option<String>,
    },
    Reconnect {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(rename = "playerId")]
        player_id: Option<PlayerId>,
        #[serde(rename = "guestId")]
        guest_id: Option<String>,
        #[serde(rename = "playerName")]
        player_name: String,
    },
    LeaveRoom {},
    Ready {},
    StartGame {},
    RestartGame {},
    DealerCall {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "cardsToPlay")]
        cards_to_play: u8,
    },
    SelectFirstDealerCard {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        card: u8,
    },
    PlayCards {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        cards: Vec<u8>,
    },
    SetAuto {
        #[serde(rename = "isAuto")]
        is_auto: bool,
    },
    Ping {},
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineStateName {
    Setup,
    FirstDealerSelection,
    DealerCall,
    PlayerSelection,
    Showdown,
    Scoring,
    Refill,
    GameOver,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoReason {
    Manual,
    Timeout,
    Disconnect,
}

#[derive(Clone, Debug, Serialize)]
pub struct ShowdownResult {
    #[serde(rename = "playerId")]
    pub player_id: PlayerId,
    pub cards: Vec<u8>,
    #[serde(rename = "handType")]
    pub hand_type: HandType,
    #[serde(rename = "handTypeName")]
    pub hand_type_name: String,
    pub score: u32,
    #[serde(rename = "isWinner")]
    pub is_winner: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    #[serde(rename = "cardCount")]
    pub card_count: usize,
    #[serde(rename = "isReady")]
    pub is_ready: bool,
    #[serde(rename = "isTurn")]
    pub is_turn: bool,
    #[serde(rename = "seatIndex")]
    pub seat_index: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    RoomCreated {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(rename = "maxPlayers")]
        max_players: usize,
    },
    RoomJoined {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "myPlayerIdInRoom")]
        my_player_id_in_room: PlayerId,
        #[serde(rename = "hostId")]
        host_id: PlayerId,
        players: Vec<PlayerInfo>,
        #[serde(rename = "maxPlayers")]
        max_players: usize,
    },
    PlayerJoined {
        player: PlayerInfo,
    },
    PlayerLeft {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    PlayerReady {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "isReady")]
        is_ready: bool,
    },
    HostChanged {
        #[serde(rename = "newHostId")]
        new_host_id: PlayerId,
    },
    GameStart {
        players: Vec<PlayerInfo>,
    },
    DealCards {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "handCards")]
        hand_cards: Vec<u8>,
        #[serde(rename = "deckSize")]
        deck_size: usize,
    },
    CommunityCards {
        cards: Vec<u8>,
        #[serde(rename = "gameState")]
        game_state: EngineStateName,
    },
    RequestFirstDealerSelection {
        #[serde(rename = "gameState")]
        game_state: EngineStateName,
    },
    PlayerSelectedCard {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    FirstDealerReveal {
        selections: Vec<(PlayerId, u8)>,
        #[serde(rename = "dealerId")]
        dealer_id: PlayerId,
        #[serde(rename = "gameState")]
        game_state: EngineStateName,
    },
    DealerSelected {
        #[serde(rename = "dealerId")]
        dealer_id: PlayerId,
        #[serde(rename = "roundNumber")]
        round_number: u32,
        #[serde(rename = "gameState")]
        game_state: EngineStateName,
    },
    DealerCalled {
        #[serde(rename = "dealerId")]
        dealer_id: PlayerId,
        #[serde(rename = "cardsToPlay")]
        cards_to_play: u8,
        #[serde(rename = "gameState")]
        game_state: EngineStateName,
    },
    PlayerPlayed {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "cardCount")]
        card_count: usize,
    },
    Showdown {
        results: Vec<ShowdownResult>,
        #[serde(rename = "gameState")]
        game_state: EngineStateName,
    },
    RoundEnd {
        #[serde(rename = "winnerId")]
        winner_id: PlayerId,
        #[serde(rename = "loserId")]
        loser_id: PlayerId,
        scores: Vec<(PlayerId, u32)>,
        #[serde(rename = "gameState")]
        game_state: EngineStateName,
    },
    GameOver {
        #[serde(rename = "winnerId")]
        winner_id: PlayerId,
        scores: Vec<(PlayerId, u32)>,
        #[serde(rename = "totalRounds")]
        total_rounds: u32,
    },
    GameStateUpdate {
        state: EngineStateName,
        #[serde(rename = "roundNumber")]
        round_number: u32,
        #[serde(rename = "dealerId")]
        dealer_id: Option<PlayerId>,
        #[serde(rename = "cardsToPlay")]
        cards_to_play: Option<u8>,
        #[serde(rename = "deckSize")]
        deck_size: usize,
        players: Vec<PlayerSnapshot>,
    },
    PlayerAutoChanged {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "isAuto")]
        is_auto: bool,
        reason: AutoReason,
    },
    ReconnectSuccess {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "handCards")]
        hand_cards: Vec<u8>,
        players: Vec<PlayerInfo>,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
    Pong {},
}

//! Events the engine emits; the room translates each into one or more
//! [`crate::messages::ServerEvent`]s and decides who gets to see it —
//! broadcast to the room or private to the one player it concerns.

use crate::card::{Card, HandResult};
use crate::session::PlayerId;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub enum EngineEvent {
    CommunityCardsRevealed {
        cards: Vec<Card>,
    },
    HandDealt {
        player_id: PlayerId,
        hand: Vec<Card>,
        deck_size: usize,
    },
    WaitingForFirstDealerSelection,
    PlayerSelectedCard {
        player_id: PlayerId,
    },
    FirstDealerRevealed {
        selections: Vec<(PlayerId, Card)>,
        dealer_id: PlayerId,
    },
    DealerAssigned {
        dealer_id: PlayerId,
        round_number: u32,
    },
    DealerCalled {
        dealer_id: PlayerId,
        cards_to_play: u8,
    },
    PlayerPlayed {
        player_id: PlayerId,
        card_count: usize,
    },
    ShowdownResolved {
        /// `(player_id, result, is_winner)` in seat order.
        results: Vec<(PlayerId, HandResult, bool)>,
    },
    RoundEnded {
        winner_id: PlayerId,
        loser_id: PlayerId,
        scores: Vec<(PlayerId, u32)>,
    },
    HandsRefilled {
        hands: HashMap<PlayerId, Vec<Card>>,
        deck_size: usize,
    },
    GameOver {
        winner_id: PlayerId,
        scores: Vec<(PlayerId, u32)>,
        total_rounds: u32,
    },
}

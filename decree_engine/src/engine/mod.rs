//! TheDecree game engine: the deterministic round-by-round state machine.
//!
//! Grounded on the shape of `private_poker::game::state_machine` and
//! `private_poker::game::states` (a marker enum per phase, a single mutable
//! data struct, operations that reject out-of-phase calls rather than
//! panicking). TheDecree's operations are each legal in exactly one phase,
//! so a flat `Engine` struct matched against one `EngineState` enum reads
//! more directly here than a typestate-per-phase generic would.
//!
//! Engine logic is entirely synchronous: the room is responsible
//! for turning the delays between `Scoring`→`Refill`, `GameOver`→`Waiting`,
//! etc. into cancellable timers that call back into these methods.

pub mod events;

use crate::autoplay::AutoPlayStrategy;
use crate::card::{evaluate, Card, Deck, HandResult};
use crate::constants::{COMMUNITY_CARD_COUNT, STARTING_HAND_SIZE};
use crate::error::EngineError;
use crate::session::PlayerId;
use events::EngineEvent;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EngineState {
    Setup,
    FirstDealerSelection,
    DealerCall,
    PlayerSelection,
    Showdown,
    Scoring,
    Refill,
    GameOver,
}

#[derive(Debug)]
pub struct EnginePlayer {
    pub hand_cards: Vec<Card>,
    pub score: u32,
    pub played_cards: Vec<Card>,
    pub has_played: bool,
    pub is_auto: bool,
    pub auto_start_time: Option<Instant>,
    pub last_action_time: Instant,
}

impl EnginePlayer {
    fn new() -> Self {
        Self {
            hand_cards: Vec::new(),
            score: 0,
            played_cards: Vec::new(),
            has_played: false,
            is_auto: false,
            auto_start_time: None,
            last_action_time: Instant::now(),
        }
    }
}

#[derive(Debug)]
pub struct Round {
    pub round_number: u32,
    pub dealer_id: PlayerId,
    pub cards_to_play: u8,
    pub player_plays: HashMap<PlayerId, Vec<Card>>,
    pub round_winner_id: Option<PlayerId>,
    pub round_loser_id: Option<PlayerId>,
    pub hand_results: HashMap<PlayerId, HandResult>,
}

/// The authoritative per-round card game. One `Engine` per [`crate::room::Room`]
/// while that room is `Playing`.
pub struct Engine {
    pub state: EngineState,
    /// Insertion order at game start; rotation for dealer/refill follows this.
    pub seat_order: Vec<PlayerId>,
    pub players: HashMap<PlayerId, EnginePlayer>,
    pub community_cards: Vec<Card>,
    pub deck: Deck,
    pub first_dealer_selections: HashMap<PlayerId, Card>,
    pub current_round: Option<Round>,
    strategy: Arc<dyn AutoPlayStrategy>,
}

impl Engine {
    pub fn new(seat_order: Vec<PlayerId>, strategy: Arc<dyn AutoPlayStrategy>) -> Self {
        let players = seat_order.iter().map(|&id| (id, EnginePlayer::new())).collect();
        Self {
            state: EngineState::Setup,
            seat_order,
            players,
            community_cards: Vec::new(),
            deck: Deck::new_shuffled(),
            first_dealer_selections: HashMap::new(),
            current_round: None,
            strategy,
        }
    }

    /// Deals 4 community cards and 5 cards per seated player, then opens
    /// first-dealer selection. Called by the room ~500ms after `start_game`.
    pub fn deal(&mut self) -> Vec<EngineEvent> {
        let mut deck = Deck::new_shuffled();
        let mut community: Vec<Card> = deck.deal(COMMUNITY_CARD_COUNT);
        community.sort_unstable_by_key(|c| c.high_rank());
        self.community_cards = community.clone();

        let mut events = vec![EngineEvent::CommunityCardsRevealed { cards: community }];
        for &player_id in &self.seat_order {
            let mut hand = deck.deal(STARTING_HAND_SIZE);
            hand.sort_unstable_by_key(|c| c.high_rank());
            let deck_size = deck.remaining();
            if let Some(player) = self.players.get_mut(&player_id) {
                player.hand_cards = hand.clone();
            }
            events.push(EngineEvent::HandDealt { player_id, hand, deck_size });
        }
        self.deck = deck;
        self.state = EngineState::FirstDealerSelection;
        events.push(EngineEvent::WaitingForFirstDealerSelection);
        events
    }

    /// Records one player's revealed card for first-dealer election. Once
    /// everyone has selected, reveals and starts round 1.
    pub fn select_first_dealer_card(
        &mut self,
        player_id: PlayerId,
        card: Card,
    ) -> Result<Vec<EngineEvent>, EngineError> {
        if self.state != EngineState::FirstDealerSelection {
            return Err(EngineError::WrongState);
        }
        if !self.players.contains_key(&player_id) {
            return Err(EngineError::UnknownPlayer);
        }
        self.first_dealer_selections.insert(player_id, card);

        if self.first_dealer_selections.len() < self.seat_order.len() {
            return Ok(vec![EngineEvent::PlayerSelectedCard { player_id }]);
        }

        let dealer_id = self
            .seat_order
            .iter()
            .copied()
            .max_by_key(|id| self.first_dealer_selections[id].dealer_selection_key())
            .expect("seat order is never empty once a game has started");

        let selections: Vec<(PlayerId, Card)> = self
            .seat_order
            .iter()
            .map(|&id| (id, self.first_dealer_selections[&id]))
            .collect();

        let mut events = vec![EngineEvent::FirstDealerRevealed { selections, dealer_id }];
        events.extend(self.start_new_round(dealer_id));
        Ok(events)
    }

    fn start_new_round(&mut self, dealer_id: PlayerId) -> Vec<EngineEvent> {
        let round_number = self.current_round.as_ref().map_or(1, |r| r.round_number + 1);
        for player in self.players.values_mut() {
            player.played_cards.clear();
            player.has_played = false;
        }
        self.current_round = Some(Round {
            round_number,
            dealer_id,
            cards_to_play: 0,
            player_plays: HashMap::new(),
            round_winner_id: None,
            round_loser_id: None,
            hand_results: HashMap::new(),
        });
        self.state = EngineState::DealerCall;
        vec![EngineEvent::DealerAssigned { dealer_id, round_number }]
    }

    /// Only the current round's dealer may call; `cards_to_play` must be 1, 2, or 3.
    pub fn dealer_call(
        &mut self,
        player_id: PlayerId,
        cards_to_play: u8,
    ) -> Result<Vec<EngineEvent>, EngineError> {
        if self.state != EngineState::DealerCall {
            return Err(EngineError::WrongState);
        }
        if !(1..=3).contains(&cards_to_play) {
            return Err(EngineError::InvalidCardsToPlay);
        }
        let round = self.current_round.as_mut().ok_or(EngineError::WrongState)?;
        if round.dealer_id != player_id {
            return Err(EngineError::NotDealer);
        }
        round.cards_to_play = cards_to_play;
        self.state = EngineState::PlayerSelection;
        Ok(vec![EngineEvent::DealerCalled { dealer_id: player_id, cards_to_play }])
    }

    /// Records a player's play. Cards stay in the player's hand until refill;
    /// once every seated player has played, resolves the showdown inline.
    pub fn play_cards(
        &mut self,
        player_id: PlayerId,
        cards: Vec<Card>,
    ) -> Result<Vec<EngineEvent>, EngineError> {
        if self.state != EngineState::PlayerSelection {
            return Err(EngineError::WrongState);
        }
        let cards_to_play = self.current_round.as_ref().ok_or(EngineError::WrongState)?.cards_to_play;
        if cards.len() != cards_to_play as usize {
            return Err(EngineError::WrongCardCount);
        }
        {
            let player = self.players.get(&player_id).ok_or(EngineError::UnknownPlayer)?;
            if player.has_played {
                return Err(EngineError::AlreadyPlayed);
            }
            if !crate::validation::cards_are_owned(&player.hand_cards, &cards) {
                return Err(EngineError::WrongCardCount);
            }
        }

        let player = self.players.get_mut(&player_id).expect("checked above");
        player.played_cards = cards.clone();
        player.has_played = true;
        player.last_action_time = Instant::now();

        let round = self.current_round.as_mut().expect("checked above");
        round.player_plays.insert(player_id, cards.clone());

        let mut events = vec![EngineEvent::PlayerPlayed { player_id, card_count: cards.len() }];

        let all_played = self.seat_order.iter().all(|id| self.players[id].has_played);
        if all_played {
            events.extend(self.resolve_showdown());
        }
        Ok(events)
    }

    /// Showdown + scoring happen back to back with no suspension point: both
    /// are deterministic given the round's plays. The room still schedules a
    /// real-world delay before calling [`Engine::refill`], matching the intended
    /// "after ~2s" note on the `Scoring` state.
    fn resolve_showdown(&mut self) -> Vec<EngineEvent> {
        self.state = EngineState::Showdown;
        let round = self.current_round.as_mut().expect("all_played implies a round exists");

        let mut evaluated: Vec<(PlayerId, HandResult)> = Vec::with_capacity(self.seat_order.len());
        for &player_id in &self.seat_order {
            let played = &round.player_plays[&player_id];
            let mut pool = played.clone();
            pool.extend(self.community_cards.iter().copied());
            evaluated.push((player_id, evaluate(&pool)));
        }

        let winner_id = evaluated
            .iter()
            .max_by(|a, b| a.1.cmp(&b.1))
            .map(|(id, _)| *id)
            .expect("at least one player always plays a round");
        let loser_id = evaluated
            .iter()
            .min_by(|a, b| a.1.cmp(&b.1))
            .map(|(id, _)| *id)
            .expect("at least one player always plays a round");

        let results: Vec<(PlayerId, HandResult, bool)> = evaluated
            .iter()
            .map(|(id, r)| (*id, r.clone(), *id == winner_id))
            .collect();

        for (id, result) in &evaluated {
            round.hand_results.insert(*id, result.clone());
        }
        round.round_winner_id = Some(winner_id);
        round.round_loser_id = Some(loser_id);

        let mut events = vec![EngineEvent::ShowdownResolved { results }];
        events.extend(self.score_round(winner_id, loser_id, &evaluated));
        events
    }

    fn score_round(
        &mut self,
        winner_id: PlayerId,
        loser_id: PlayerId,
        evaluated: &[(PlayerId, HandResult)],
    ) -> Vec<EngineEvent> {
        for (id, result) in evaluated {
            let bonus = if *id == winner_id { 1 } else { 0 };
            if let Some(player) = self.players.get_mut(id) {
                player.score += result.hand_type.base_score() + bonus;
            }
        }
        self.state = EngineState::Scoring;
        let scores: Vec<(PlayerId, u32)> = self
            .seat_order
            .iter()
            .map(|&id| (id, self.players[&id].score))
            .collect();
        vec![EngineEvent::RoundEnded { winner_id, loser_id, scores }]
    }

    /// Removes each player's played cards, then refills every hand back to 5
    /// in dealer-first rotation, drawing one card at a time until either
    /// every hand is full or the deck is exhausted (the protocol "Refill").
    pub fn refill(&mut self) -> Vec<EngineEvent> {
        let round = self.current_round.as_ref().expect("refill only runs after a round");
        let dealer_id = round.dealer_id;
        let loser_id = round.round_loser_id.expect("showdown always assigns a loser");

        let dealer_pos = self.seat_order.iter().position(|&id| id == dealer_id).unwrap_or(0);
        let rotation: Vec<PlayerId> = self
            .seat_order
            .iter()
            .cycle()
            .skip(dealer_pos)
            .take(self.seat_order.len())
            .copied()
            .collect();

        for &id in &rotation {
            if let Some(player) = self.players.get_mut(&id) {
                let played = std::mem::take(&mut player.played_cards);
                for card in played {
                    if let Some(pos) = player.hand_cards.iter().position(|c| *c == card) {
                        player.hand_cards.remove(pos);
                    }
                }
            }
        }

        loop {
            let mut dealt_any = false;
            for &id in &rotation {
                let needs_card = self.players[&id].hand_cards.len() < STARTING_HAND_SIZE;
                if !needs_card {
                    continue;
                }
                match self.deck.deal_one() {
                    Some(card) => {
                        self.players.get_mut(&id).expect("seat order is valid").hand_cards.push(card);
                        dealt_any = true;
                    }
                    None => break,
                }
            }
            let all_full = self.seat_order.iter().all(|id| self.players[id].hand_cards.len() >= STARTING_HAND_SIZE);
            if all_full || !dealt_any {
                break;
            }
        }

        let mut hands = HashMap::with_capacity(self.seat_order.len());
        for &id in &self.seat_order {
            let player = self.players.get_mut(&id).expect("seat order is valid");
            player.hand_cards.sort_unstable_by_key(|c| c.high_rank());
            hands.insert(id, player.hand_cards.clone());
        }
        let deck_size = self.deck.remaining();
        let mut events = vec![EngineEvent::HandsRefilled { hands, deck_size }];

        let any_empty = self.seat_order.iter().any(|id| self.players[id].hand_cards.is_empty());
        if any_empty {
            events.extend(self.finish_game());
        } else {
            events.extend(self.start_new_round(loser_id));
        }
        events
    }

    fn finish_game(&mut self) -> Vec<EngineEvent> {
        self.state = EngineState::GameOver;
        let winner_id = self
            .seat_order
            .iter()
            .copied()
            .max_by_key(|id| self.players[id].score)
            .expect("seat order is never empty");
        let scores: Vec<(PlayerId, u32)> = self
            .seat_order
            .iter()
            .map(|&id| (id, self.players[&id].score))
            .collect();
        let total_rounds = self.current_round.as_ref().map_or(0, |r| r.round_number);
        vec![EngineEvent::GameOver { winner_id, scores, total_rounds }]
    }

    pub fn set_auto(&mut self, player_id: PlayerId, is_auto: bool) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.is_auto = is_auto;
            player.auto_start_time = if is_auto { Some(Instant::now()) } else { None };
        }
    }

    /// Players the engine expects to hear from in the current state, used
    /// by the room to decide whose auto-play timer (if any) to arm.
    pub fn pending_actors(&self) -> Vec<PlayerId> {
        match self.state {
            EngineState::FirstDealerSelection => self
                .seat_order
                .iter()
                .copied()
                .filter(|id| !self.first_dealer_selections.contains_key(id))
                .collect(),
            EngineState::DealerCall => self
                .current_round
                .as_ref()
                .map(|r| vec![r.dealer_id])
                .unwrap_or_default(),
            EngineState::PlayerSelection => self
                .seat_order
                .iter()
                .copied()
                .filter(|id| !self.players[id].has_played)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn hand_of(&self, player_id: PlayerId) -> Option<&[Card]> {
        self.players.get(&player_id).map(|p| p.hand_cards.as_slice())
    }

    pub fn strategy(&self) -> Arc<dyn AutoPlayStrategy> {
        Arc::clone(&self.strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoplay::Conservative;
    use uuid::Uuid;

    fn new_engine(n: usize) -> (Engine, Vec<PlayerId>) {
        let seats: Vec<PlayerId> = (0..n).map(|_| Uuid::new_v4()).collect();
        (Engine::new(seats.clone(), Arc::new(Conservative)), seats)
    }

    #[test]
    fn deal_gives_four_community_and_five_per_player() {
        let (mut engine, seats) = new_engine(2);
        engine.deal();
        assert_eq!(engine.community_cards.len(), 4);
        for id in &seats {
            assert_eq!(engine.hand_of(*id).unwrap().len(), 5);
        }
        assert_eq!(engine.state, EngineState::FirstDealerSelection);
    }

    #[test]
    fn deck_and_hands_never_exceed_52_total_cards() {
        let (mut engine, _) = new_engine(3);
        engine.deal();
        let total: usize = engine.community_cards.len()
            + engine.deck.remaining()
            + engine.players.values().map(|p| p.hand_cards.len()).sum::<usize>();
        assert_eq!(total, 52);
    }

    #[test]
    fn first_dealer_election_picks_highest_rank_with_suit_tiebreak() {
        let (mut engine, seats) = new_engine(2);
        engine.deal();
        let a_card = Card::new(crate::card::Suit::Spade, 1); // ace
        let b_card = Card::new(crate::card::Suit::Spade, 13); // king
        engine.select_first_dealer_card(seats[0], a_card).unwrap();
        let events = engine.select_first_dealer_card(seats[1], b_card).unwrap();
        let dealer = events.iter().find_map(|e| match e {
            EngineEvent::FirstDealerRevealed { dealer_id, .. } => Some(*dealer_id),
            _ => None,
        });
        assert_eq!(dealer, Some(seats[0]));
        assert_eq!(engine.state, EngineState::DealerCall);
    }

    #[test]
    fn dealer_call_rejects_non_dealer() {
        let (mut engine, seats) = new_engine(2);
        engine.deal();
        engine.select_first_dealer_card(seats[0], Card::new(crate::card::Suit::Club, 5)).unwrap();
        engine.select_first_dealer_card(seats[1], Card::new(crate::card::Suit::Club, 2)).unwrap();
        assert_eq!(engine.state, EngineState::DealerCall);
        let round = engine.current_round.as_ref().unwrap();
        let non_dealer = seats.iter().copied().find(|id| *id != round.dealer_id).unwrap();
        assert!(engine.dealer_call(non_dealer, 1).is_err());
    }

    #[test]
    fn full_round_two_players_produces_winner_and_scores() {
        let (mut engine, seats) = new_engine(2);
        engine.deal();
        engine.select_first_dealer_card(seats[0], Card::new(crate::card::Suit::Spade, 1)).unwrap();
        engine.select_first_dealer_card(seats[1], Card::new(crate::card::Suit::Club, 2)).unwrap();
        let dealer = engine.current_round.as_ref().unwrap().dealer_id;
        engine.dealer_call(dealer, 2).unwrap();
        assert_eq!(engine.state, EngineState::PlayerSelection);

        for &id in &seats {
            let hand = engine.hand_of(id).unwrap().to_vec();
            let cards: Vec<Card> = hand.into_iter().take(2).collect();
            engine.play_cards(id, cards).unwrap();
        }
        assert_eq!(engine.state, EngineState::Scoring);
        let round = engine.current_round.as_ref().unwrap();
        assert!(round.round_winner_id.is_some());
        assert!(engine.players.values().any(|p| p.score > 0));
    }

    #[test]
    fn play_cards_rejects_wrong_card_count() {
        let (mut engine, seats) = new_engine(2);
        engine.deal();
        engine.select_first_dealer_card(seats[0], Card::new(crate::card::Suit::Spade, 1)).unwrap();
        engine.select_first_dealer_card(seats[1], Card::new(crate::card::Suit::Club, 2)).unwrap();
        let dealer = engine.current_round.as_ref().unwrap().dealer_id;
        engine.dealer_call(dealer, 1).unwrap();
        let hand = engine.hand_of(dealer).unwrap().to_vec();
        let result = engine.play_cards(dealer, hand[0..2].to_vec());
        assert!(result.is_err());
    }

    #[test]
    fn refill_redraws_played_cards_and_rotates_dealer() {
        let (mut engine, seats) = new_engine(2);
        engine.deal();
        engine.select_first_dealer_card(seats[0], Card::new(crate::card::Suit::Spade, 1)).unwrap();
        engine.select_first_dealer_card(seats[1], Card::new(crate::card::Suit::Club, 2)).unwrap();
        let dealer = engine.current_round.as_ref().unwrap().dealer_id;
        engine.dealer_call(dealer, 2).unwrap();
        for &id in &seats {
            let hand = engine.hand_of(id).unwrap().to_vec();
            engine.play_cards(id, hand[0..2].to_vec()).unwrap();
        }
        let loser = engine.current_round.as_ref().unwrap().round_loser_id.unwrap();
        engine.refill();
        assert!(engine.state == EngineState::DealerCall || engine.state == EngineState::GameOver);
        if engine.state == EngineState::DealerCall {
            assert_eq!(engine.current_round.as_ref().unwrap().dealer_id, loser);
            for &id in &seats {
                assert_eq!(engine.hand_of(id).unwrap().len(), 5);
            }
        }
    }
}

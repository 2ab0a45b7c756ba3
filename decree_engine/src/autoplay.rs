//! Pluggable auto-play decision functions.
//!
//! Grounded on `private_poker::bot::decision::BotDecisionMaker`: a small,
//! stateless strategy object the engine depends on only through a trait, so
//! the process can swap strategies without touching engine logic.

use crate::card::Card;
use rand::prelude::IndexedRandom;
use rand::Rng;

/// A replaceable set of decisions made on behalf of a disconnected or slow
/// player. The engine only ever sees this trait, never a concrete strategy.
pub trait AutoPlayStrategy: Send + Sync {
    /// Picks one card from `hand` to reveal during first-dealer selection.
    fn select_first_dealer_card(&self, hand: &[Card]) -> Card;

    /// Picks how many cards the dealer calls for this round.
    fn dealer_call(&self, hand: &[Card], community: &[Card]) -> u8;

    /// Picks `cards_to_play` cards from `hand` to play this round.
    fn select_play_cards(&self, hand: &[Card], cards_to_play: u8) -> Vec<Card>;
}

/// Default strategy: smallest card, calls for 1, plays the smallest cards
/// available.
#[derive(Debug, Default, Clone, Copy)]
pub struct Conservative;

impl AutoPlayStrategy for Conservative {
    fn select_first_dealer_card(&self, hand: &[Card]) -> Card {
        *smallest_to_largest(hand).first().expect("hand is never empty when acting")
    }

    fn dealer_call(&self, _hand: &[Card], _community: &[Card]) -> u8 {
        1
    }

    fn select_play_cards(&self, hand: &[Card], cards_to_play: u8) -> Vec<Card> {
        smallest_to_largest(hand)
            .into_iter()
            .take(cards_to_play as usize)
            .collect()
    }
}

/// Picks the largest card, calls for the maximum, and plays its largest cards.
#[derive(Debug, Default, Clone, Copy)]
pub struct Aggressive;

impl AutoPlayStrategy for Aggressive {
    fn select_first_dealer_card(&self, hand: &[Card]) -> Card {
        *smallest_to_largest(hand).last().expect("hand is never empty when acting")
    }

    fn dealer_call(&self, _hand: &[Card], _community: &[Card]) -> u8 {
        3
    }

    fn select_play_cards(&self, hand: &[Card], cards_to_play: u8) -> Vec<Card> {
        let mut sorted = smallest_to_largest(hand);
        sorted.reverse();
        sorted.into_iter().take(cards_to_play as usize).collect()
    }
}

/// Picks uniformly at random among legal choices.
#[derive(Debug, Default, Clone, Copy)]
pub struct Random;

impl AutoPlayStrategy for Random {
    fn select_first_dealer_card(&self, hand: &[Card]) -> Card {
        *hand
            .choose(&mut rand::rng())
            .expect("hand is never empty when acting")
    }

    fn dealer_call(&self, _hand: &[Card], _community: &[Card]) -> u8 {
        rand::rng().random_range(1..=3)
    }

    fn select_play_cards(&self, hand: &[Card], cards_to_play: u8) -> Vec<Card> {
        let mut shuffled = hand.to_vec();
        {
            use rand::seq::SliceRandom;
            shuffled.shuffle(&mut rand::rng());
        }
        shuffled.into_iter().take(cards_to_play as usize).collect()
    }
}

fn smallest_to_largest(hand: &[Card]) -> Vec<Card> {
    let mut sorted = hand.to_vec();
    sorted.sort_unstable_by_key(|c| c.high_rank());
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Suit;

    fn hand() -> Vec<Card> {
        vec![
            Card::new(Suit::Heart, 9),
            Card::new(Suit::Club, 2),
            Card::new(Suit::Spade, 1),
        ]
    }

    #[test]
    fn conservative_picks_smallest_card_and_calls_one() {
        let strat = Conservative;
        let h = hand();
        assert_eq!(strat.select_first_dealer_card(&h).high_rank(), 2);
        assert_eq!(strat.dealer_call(&h, &[]), 1);
        let played = strat.select_play_cards(&h, 2);
        assert_eq!(played.len(), 2);
        assert_eq!(played[0].high_rank(), 2);
    }

    #[test]
    fn aggressive_picks_largest_card_and_calls_three() {
        let strat = Aggressive;
        let h = hand();
        assert_eq!(strat.select_first_dealer_card(&h).high_rank(), 14);
        assert_eq!(strat.dealer_call(&h, &[]), 3);
    }

    #[test]
    fn random_strategy_always_returns_legal_choices() {
        let strat = Random;
        let h = hand();
        let card = strat.select_first_dealer_card(&h);
        assert!(h.contains(&card));
        let call = strat.dealer_call(&h, &[]);
        assert!((1..=3).contains(&call));
        let played = strat.select_play_cards(&h, 2);
        assert_eq!(played.len(), 2);
    }
}

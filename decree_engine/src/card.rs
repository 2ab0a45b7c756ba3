//! The 52-card model and the Texas Hold'em hand evaluator.
//!
//! A [`Card`] is encoded as a single byte: the high nibble is the [`Suit`],
//! the low nibble is the rank (ace = 1 .. king = 13). This is deliberately
//! flatter than a `(Value, Suit)` tuple so that cards round-trip through the
//! wire protocol as plain JSON numbers.

use rand::{rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Suit {
    Diamond = 0,
    Spade = 1,
    Club = 2,
    Heart = 3,
}

impl Suit {
    const ALL: [Suit; 4] = [Suit::Diamond, Suit::Spade, Suit::Club, Suit::Heart];

    /// Tiebreak ordering used when two cards of equal rank must be compared,
    /// e.g. first-dealer-selection reveals: spade > heart > club > diamond.
    pub fn tiebreak_rank(self) -> u8 {
        match self {
            Suit::Spade => 3,
            Suit::Heart => 2,
            Suit::Club => 1,
            Suit::Diamond => 0,
        }
    }

    fn from_nibble(n: u8) -> Option<Suit> {
        match n {
            0 => Some(Suit::Diamond),
            1 => Some(Suit::Spade),
            2 => Some(Suit::Club),
            3 => Some(Suit::Heart),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Suit::Diamond => "♦",
            Suit::Spade => "♠",
            Suit::Club => "♣",
            Suit::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// A single playing card, byte-encoded as `suit << 4 | rank`.
#[derive(Clone, Copy, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Card(u8);

impl Card {
    pub fn new(suit: Suit, rank: u8) -> Self {
        assert!((1..=13).contains(&rank), "rank out of range: {rank}");
        Card(((suit as u8) << 4) | rank)
    }

    pub fn suit(self) -> Suit {
        Suit::from_nibble(self.0 >> 4).expect("card always carries a valid suit nibble")
    }

    /// Raw rank, ace = 1 .. king = 13.
    pub fn rank(self) -> u8 {
        self.0 & 0x0F
    }

    /// Texas-style high rank: ace is 14, everything else unchanged.
    pub fn high_rank(self) -> u8 {
        if self.rank() == 1 { 14 } else { self.rank() }
    }

    pub fn byte(self) -> u8 {
        self.0
    }

    /// Ordering used to pick the first dealer: higher Texas rank wins,
    /// suit breaks ties (spade > heart > club > diamond).
    pub fn dealer_selection_key(self) -> (u8, u8) {
        (self.high_rank(), self.suit().tiebreak_rank())
    }

    /// All 52 distinct cards, Diamond/Spade/Club/Heart x Ace..King.
    pub fn all_52() -> Vec<Card> {
        let mut cards = Vec::with_capacity(52);
        for suit in Suit::ALL {
            for rank in 1..=13u8 {
                cards.push(Card::new(suit, rank));
            }
        }
        cards
    }
}

impl TryFrom<u8> for Card {
    type Error = CardDecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let suit_nibble = value >> 4;
        let rank = value & 0x0F;
        if Suit::from_nibble(suit_nibble).is_none() || !(1..=13).contains(&rank) {
            return Err(CardDecodeError { byte: value });
        }
        Ok(Card(value))
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> u8 {
        card.0
    }
}

#[derive(Debug, thiserror::Error)]
#[error("byte {byte:#04x} is not a valid card encoding")]
pub struct CardDecodeError {
    pub byte: u8,
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self.rank() {
            1 => "A".to_string(),
            11 => "J".to_string(),
            12 => "Q".to_string(),
            13 => "K".to_string(),
            v => v.to_string(),
        };
        write!(f, "{value}{}", self.suit())
    }
}

/// Ascending hand-type classification; `derive(Ord)` gives the usual poker
/// ordering: High Card .. Royal Flush.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum HandType {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl HandType {
    /// Base score awarded to every player for reaching this hand type.
    pub fn base_score(self) -> u32 {
        match self {
            HandType::HighCard => 0,
            HandType::OnePair => 1,
            HandType::TwoPair => 2,
            HandType::ThreeOfAKind => 3,
            HandType::Straight => 4,
            HandType::Flush => 5,
            HandType::FullHouse => 6,
            HandType::FourOfAKind => 7,
            HandType::StraightFlush => 8,
            HandType::RoyalFlush => 9,
        }
    }
}

impl fmt::Display for HandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            HandType::HighCard => "high card",
            HandType::OnePair => "one pair",
            HandType::TwoPair => "two pair",
            HandType::ThreeOfAKind => "three of a kind",
            HandType::Straight => "straight",
            HandType::Flush => "flush",
            HandType::FullHouse => "full house",
            HandType::FourOfAKind => "four of a kind",
            HandType::StraightFlush => "straight flush",
            HandType::RoyalFlush => "royal flush",
        };
        write!(f, "{repr}")
    }
}

/// The best 5-card hand found within a 5..7 card pool, with enough kicker
/// data to break ties of the same [`HandType`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandResult {
    pub hand_type: HandType,
    /// Descending tiebreaker ranks, e.g. full house is `[trips_rank, pair_rank]`.
    pub tiebreakers: Vec<u8>,
    /// The 5 cards making up the best hand, for display.
    pub cards: Vec<Card>,
}

impl Ord for HandResult {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hand_type
            .cmp(&other.hand_type)
            .then_with(|| self.tiebreakers.cmp(&other.tiebreakers))
    }
}

impl PartialOrd for HandResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A Fisher-Yates shuffled, fixed-size standard deck.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn new_shuffled() -> Self {
        let mut cards = Card::all_52();
        cards.shuffle(&mut rng());
        Deck { cards }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    /// Draws from the top, or `None` if the deck is exhausted.
    pub fn deal_one(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn deal(&mut self, n: usize) -> Vec<Card> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            match self.deal_one() {
                Some(card) => out.push(card),
                None => break,
            }
        }
        out
    }
}

/// Evaluates the best 5-card hand out of 5..7 cards.
pub fn evaluate(cards: &[Card]) -> HandResult {
    assert!(
        (5..=7).contains(&cards.len()),
        "evaluate expects 5..=7 cards, got {}",
        cards.len()
    );
    combinations_of_5(cards)
        .into_iter()
        .map(|hand| classify_5(&hand))
        .max()
        .expect("at least one 5-card combination always exists")
}

/// Total order over two hand results; matches `HandResult`'s `Ord` impl and
/// is exposed separately so callers don't need to import `std::cmp::Ordering`
/// to ask "who won".
pub fn compare(a: &HandResult, b: &HandResult) -> Ordering {
    a.cmp(b)
}

fn combinations_of_5(cards: &[Card]) -> Vec<Vec<Card>> {
    let n = cards.len();
    if n == 5 {
        return vec![cards.to_vec()];
    }
    let mut out = Vec::new();
    let mut idx = [0usize; 5];
    for (i, slot) in idx.iter_mut().enumerate() {
        *slot = i;
    }
    loop {
        out.push(idx.iter().map(|&i| cards[i]).collect());
        // advance indices like an odometer, rightmost fastest
        let mut i = 4;
        loop {
            if idx[i] < n - (5 - i) {
                idx[i] += 1;
                for j in (i + 1)..5 {
                    idx[j] = idx[j - 1] + 1;
                }
                break;
            }
            if i == 0 {
                return out;
            }
            i -= 1;
        }
    }
}

fn classify_5(cards: &[Card]) -> HandResult {
    assert_eq!(cards.len(), 5);
    let mut ranks: Vec<u8> = cards.iter().map(|c| c.high_rank()).collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));

    let is_flush = cards.windows(2).all(|w| w[0].suit() as u8 == w[1].suit() as u8);
    let straight_high = straight_high_card(&ranks);

    if let Some(high) = straight_high
        && is_flush
    {
        let hand_type = if high == 14 { HandType::RoyalFlush } else { HandType::StraightFlush };
        return HandResult { hand_type, tiebreakers: vec![high], cards: sorted_cards(cards) };
    }

    let mut counts: Vec<(u8, u8)> = rank_counts(&ranks);
    // sort by count desc, then rank desc, so duplicates dominate the tiebreak sequence
    counts.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));

    let hand_type = match (counts[0].1, counts.get(1).map(|c| c.1).unwrap_or(0)) {
        (4, _) => HandType::FourOfAKind,
        (3, 2) => HandType::FullHouse,
        _ if is_flush => HandType::Flush,
        _ if straight_high.is_some() => HandType::Straight,
        (3, _) => HandType::ThreeOfAKind,
        (2, 2) => HandType::TwoPair,
        (2, _) => HandType::OnePair,
        _ => HandType::HighCard,
    };
    let tiebreakers = if let Some(high) = straight_high {
        vec![high]
    } else {
        counts.iter().map(|(rank, _)| *rank).collect()
    };

    HandResult { hand_type, tiebreakers, cards: sorted_cards(cards) }
}

fn sorted_cards(cards: &[Card]) -> Vec<Card> {
    let mut out = cards.to_vec();
    out.sort_unstable_by_key(|b| std::cmp::Reverse(b.high_rank()));
    out
}

fn rank_counts(descending_ranks: &[u8]) -> Vec<(u8, u8)> {
    let mut counts: Vec<(u8, u8)> = Vec::new();
    for &r in descending_ranks {
        if let Some(entry) = counts.iter_mut().find(|(rank, _)| *rank == r) {
            entry.1 += 1;
        } else {
            counts.push((r, 1));
        }
    }
    counts
}

/// Returns the straight's high card if `descending_ranks` (5 values, high
/// to low, duplicates already excluded by caller logic not required here
/// since a straight can't coexist with a pair) form five consecutive ranks,
/// treating ace-low (A-2-3-4-5, the wheel) as high card 5.
fn straight_high_card(descending_ranks: &[u8]) -> Option<u8> {
    let mut unique: Vec<u8> = descending_ranks.to_vec();
    unique.dedup();
    if unique.len() != 5 {
        return None;
    }
    if unique[0] - unique[4] == 4 {
        return Some(unique[0]);
    }
    // wheel: A(14),5,4,3,2 -> treat as 5-high
    if unique == [14, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(suit: Suit, rank: u8) -> Card {
        Card::new(suit, rank)
    }

    #[test]
    fn card_round_trips_through_byte_encoding() {
        for suit in Suit::ALL {
            for rank in 1..=13u8 {
                let c = Card::new(suit, rank);
                let decoded = Card::try_from(c.byte()).unwrap();
                assert_eq!(c, decoded);
            }
        }
    }

    #[test]
    fn invalid_byte_is_rejected() {
        assert!(Card::try_from(0xFF).is_err());
    }

    #[test]
    fn full_deck_has_52_distinct_cards() {
        let deck = Deck::new_shuffled();
        assert_eq!(deck.remaining(), 52);
        let mut seen = std::collections::HashSet::new();
        for c in &deck.cards {
            assert!(seen.insert(c.byte()));
        }
    }

    #[test]
    fn royal_flush_beats_ace_high_straight_flush_of_another_suit() {
        let royal = [
            card(Suit::Spade, 10),
            card(Suit::Spade, 11),
            card(Suit::Spade, 12),
            card(Suit::Spade, 13),
            card(Suit::Spade, 1),
        ];
        let nine_high_sf = [
            card(Suit::Heart, 5),
            card(Suit::Heart, 6),
            card(Suit::Heart, 7),
            card(Suit::Heart, 8),
            card(Suit::Heart, 9),
        ];
        let royal_result = evaluate(&royal);
        let sf_result = evaluate(&nine_high_sf);
        assert_eq!(royal_result.hand_type, HandType::RoyalFlush);
        assert_eq!(sf_result.hand_type, HandType::StraightFlush);
        assert_eq!(compare(&royal_result, &sf_result), Ordering::Greater);
    }

    #[test]
    fn wheel_straight_ranks_below_six_high_straight() {
        let wheel = [
            card(Suit::Club, 1),
            card(Suit::Heart, 2),
            card(Suit::Diamond, 3),
            card(Suit::Spade, 4),
            card(Suit::Heart, 5),
        ];
        let six_high = [
            card(Suit::Club, 2),
            card(Suit::Heart, 3),
            card(Suit::Diamond, 4),
            card(Suit::Spade, 5),
            card(Suit::Heart, 6),
        ];
        let wheel_result = evaluate(&wheel);
        let six_high_result = evaluate(&six_high);
        assert_eq!(wheel_result.hand_type, HandType::Straight);
        assert_eq!(six_high_result.hand_type, HandType::Straight);
        assert_eq!(compare(&wheel_result, &six_high_result), Ordering::Less);
    }

    #[test]
    fn best_five_of_seven_is_selected() {
        // Quad aces should be found even though 2 unrelated cards are mixed in.
        let seven = [
            card(Suit::Club, 1),
            card(Suit::Heart, 1),
            card(Suit::Diamond, 1),
            card(Suit::Spade, 1),
            card(Suit::Spade, 2),
            card(Suit::Heart, 7),
            card(Suit::Club, 9),
        ];
        let result = evaluate(&seven);
        assert_eq!(result.hand_type, HandType::FourOfAKind);
    }

    #[test]
    fn evaluate_is_consistent_with_itself() {
        let hand = [
            card(Suit::Club, 3),
            card(Suit::Heart, 3),
            card(Suit::Diamond, 9),
            card(Suit::Spade, 9),
            card(Suit::Spade, 2),
            card(Suit::Heart, 7),
        ];
        let a = evaluate(&hand);
        let b = evaluate(&hand);
        assert_eq!(compare(&a, &b), Ordering::Equal);
    }

    #[test]
    fn high_card_hand_ranks_by_best_kicker_sequence() {
        let ace_high = [
            card(Suit::Club, 1),
            card(Suit::Heart, 9),
            card(Suit::Diamond, 7),
            card(Suit::Spade, 4),
            card(Suit::Heart, 2),
        ];
        let king_high = [
            card(Suit::Club, 13),
            card(Suit::Heart, 9),
            card(Suit::Diamond, 7),
            card(Suit::Spade, 4),
            card(Suit::Heart, 2),
        ];
        assert_eq!(
            compare(&evaluate(&ace_high), &evaluate(&king_high)),
            Ordering::Greater
        );
    }

    #[test]
    fn suit_tiebreak_orders_spade_over_heart_over_club_over_diamond() {
        assert!(Suit::Spade.tiebreak_rank() > Suit::Heart.tiebreak_rank());
        assert!(Suit::Heart.tiebreak_rank() > Suit::Club.tiebreak_rank());
        assert!(Suit::Club.tiebreak_rank() > Suit::Diamond.tiebreak_rank());
    }
}

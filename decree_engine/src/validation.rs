//! Input validation: player names, guest ids, and card arrays.
//!
//! Mirrors `private_poker::game::entities::Username`'s trim-and-sanitize
//! approach, generalized to the guest-id shape this project needs instead of
//! persistent accounts.

use crate::card::Card;
use crate::constants::{DEFAULT_PLAYER_NAME, MAX_NAME_LENGTH};
use crate::error::ValidationError;
use std::collections::HashSet;

/// Sanitizes a raw client-submitted name: trims whitespace, enforces the
/// allowed character set, and falls back to `"Guest"` when empty.
///
/// Allowed characters: letters (including CJK), digits, space, `_`, `-`, `#`.
pub fn sanitize_player_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_PLAYER_NAME.to_string());
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName);
    }
    let allowed = trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-' | '#'));
    if !allowed {
        return Err(ValidationError::InvalidName);
    }
    if looks_like_guest_id(trimmed) && !is_valid_guest_id(trimmed) {
        return Err(ValidationError::InvalidName);
    }
    Ok(trimmed.to_string())
}

/// `guest_<uuid-v4>` optionally suffixed with `_<digits>` for a second
/// session from the same guest identity.
pub fn is_valid_guest_id(candidate: &str) -> bool {
    let Some(rest) = candidate.strip_prefix("guest_") else {
        return false;
    };
    let (uuid_part, suffix) = match rest.split_once('_') {
        Some((uuid_part, suffix)) => (uuid_part, Some(suffix)),
        None => (rest, None),
    };
    if uuid::Uuid::parse_str(uuid_part).is_err() {
        return false;
    }
    match suffix {
        None => true,
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()),
    }
}

fn looks_like_guest_id(s: &str) -> bool {
    s.starts_with("guest_")
}

/// Validates an optional `guestId` field.
pub fn validate_guest_id(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    match raw {
        None => Ok(None),
        Some(s) if is_valid_guest_id(s) => Ok(Some(s.to_string())),
        Some(_) => Err(ValidationError::InvalidGuestId),
    }
}

/// Validates a card array submitted for a play: non-empty, at most 3 cards,
/// no duplicates, every byte a legal encoding.
pub fn validate_card_bytes(bytes: &[u8]) -> Result<Vec<Card>, ValidationError> {
    if bytes.is_empty() || bytes.len() > 3 {
        return Err(ValidationError::InvalidCardArray);
    }
    let mut seen = HashSet::with_capacity(bytes.len());
    let mut cards = Vec::with_capacity(bytes.len());
    for &b in bytes {
        let card = Card::try_from(b).map_err(|_| ValidationError::InvalidCardEncoding(b))?;
        if !seen.insert(card.byte()) {
            return Err(ValidationError::InvalidCardArray);
        }
        cards.push(card);
    }
    Ok(cards)
}

/// Confirms every submitted card is actually present in `hand`, as required
/// before `playCards` may mutate engine state.
pub fn cards_are_owned(hand: &[Card], submitted: &[Card]) -> bool {
    let mut remaining: Vec<Card> = hand.to_vec();
    for card in submitted {
        match remaining.iter().position(|c| c == card) {
            Some(idx) => {
                remaining.remove(idx);
            }
            None => return false,
        }
    }
    true
}

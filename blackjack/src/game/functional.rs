//! Pure blackjack rules: card values, hand totals and round resolution.

use super::{
    constants::{ACE_VALUE, BLACKJACK, DEALER_STANDS_ON, FACE_VALUE},
    entities::{Card, Value},
};
use crate::net::messages::RoundResult;

/// Value of a single card rank. Aces are always worth 11.
#[must_use]
pub const fn card_value(rank: Value) -> u32 {
    match rank {
        1 => ACE_VALUE,
        11..=13 => FACE_VALUE,
        r => r as u32,
    }
}

/// Sum of the card values in a hand. Order does not matter.
#[must_use]
pub fn hand_total(cards: &[Card]) -> u32 {
    cards.iter().map(|card| card_value(card.rank())).sum()
}

#[must_use]
pub const fn is_bust(total: u32) -> bool {
    total > BLACKJACK
}

/// Whether the player is still allowed to act on this total.
#[must_use]
pub const fn player_may_act(total: u32) -> bool {
    total < BLACKJACK
}

#[must_use]
pub const fn dealer_must_draw(total: u32) -> bool {
    total < DEALER_STANDS_ON
}

/// Outcome from the player's point of view once both hands are final
/// and the player did not bust.
///
/// Priority: dealer bust, then higher total, then tie.
#[must_use]
pub const fn resolve(player_total: u32, dealer_total: u32) -> RoundResult {
    if is_bust(dealer_total) || player_total > dealer_total {
        RoundResult::Win
    } else if dealer_total > player_total {
        RoundResult::Loss
    } else {
        RoundResult::Tie
    }
}

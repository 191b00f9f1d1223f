//! House rules and deck layout constants.

/// A hand totalling more than this is bust.
pub const BLACKJACK: u32 = 21;

/// The dealer draws while below this total and stands once at or above it.
pub const DEALER_STANDS_ON: u32 = 17;

/// Number of cards in a fresh deck.
pub const DECK_SIZE: usize = 52;

/// Lowest card rank (ace).
pub const MIN_RANK: u8 = 1;

/// Highest card rank (king).
pub const MAX_RANK: u8 = 13;

/// Fixed value of an ace. There is no soft-ace downgrade.
pub const ACE_VALUE: u32 = 11;

/// Value of jacks, queens and kings.
pub const FACE_VALUE: u32 = 10;

/// Cards dealt to each party at the start of a round.
pub const INITIAL_HAND_SIZE: usize = 2;

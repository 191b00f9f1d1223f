//! Blackjack game engine.
//!
//! This module provides:
//! - Cards, decks and hands
//! - The house rules (strict ace, dealer stands on 17)
//! - The per-round state machine that plays one round over a byte stream

pub mod constants;
pub mod entities;
pub mod functional;
pub mod round;

pub use entities::{Card, Deck, DeckError, DeckSource, Hand, ShuffledDecks, Suit, Tally};
pub use round::{Phase, Round, RoundOutcome};

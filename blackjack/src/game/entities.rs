use rand::{Rng, seq::SliceRandom};
use std::fmt;
use thiserror::Error;

use super::{
    constants::{DECK_SIZE, MAX_RANK, MIN_RANK},
    functional,
};
use crate::net::messages::RoundResult;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Suit {
    Spade,
    Club,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spade, Suit::Club, Suit::Diamond, Suit::Heart];

    /// Wire code of the suit.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Spade => 0,
            Self::Club => 1,
            Self::Diamond => 2,
            Self::Heart => 3,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Spade),
            1 => Some(Self::Club),
            2 => Some(Self::Diamond),
            3 => Some(Self::Heart),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spade => "♠",
            Self::Club => "♣",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card ranks.
pub type Value = u8;

/// A card is a tuple of a uInt8 rank (ace=1u8 ... king=13u8)
/// and a suit.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Card(pub Value, pub Suit);

impl Card {
    #[must_use]
    pub const fn rank(&self) -> Value {
        self.0
    }

    #[must_use]
    pub const fn suit(&self) -> Suit {
        self.1
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            1 => "A".to_string(),
            11 => "J".to_string(),
            12 => "Q".to_string(),
            13 => "K".to_string(),
            v => v.to_string(),
        };
        let repr = format!("{value}/{}", self.1);
        write!(f, "{repr:>4}")
    }
}

#[derive(Debug, Eq, Error, PartialEq)]
pub enum DeckError {
    #[error("deck exhausted")]
    Exhausted,
}

/// An ordered run of cards dealt front to back. Each round gets
/// its own deck; decks are never reshuffled or shared.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
    deck_idx: usize,
}

impl Deck {
    /// All 52 cards in a uniformly random order.
    #[must_use]
    pub fn shuffled() -> Self {
        Self::shuffled_with(&mut rand::rng())
    }

    pub fn shuffled_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::default();
        deck.cards.shuffle(rng);
        deck
    }

    /// A deck that deals exactly `cards`, in the given order.
    ///
    /// Used to replay known rounds; it is not checked for completeness.
    pub fn from_draw_order(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
            deck_idx: 0,
        }
    }

    pub fn draw(&mut self) -> Result<Card, DeckError> {
        let card = *self.cards.get(self.deck_idx).ok_or(DeckError::Exhausted)?;
        self.deck_idx += 1;
        Ok(card)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.deck_idx
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Cards not dealt yet, next card first.
    #[must_use]
    pub fn undealt(&self) -> &[Card] {
        &self.cards[self.deck_idx..]
    }
}

impl Default for Deck {
    /// A fresh, ordered deck.
    fn default() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for value in MIN_RANK..=MAX_RANK {
            for suit in Suit::ALL {
                cards.push(Card(value, suit));
            }
        }
        Self { cards, deck_idx: 0 }
    }
}

/// Supplies one fresh deck per round.
pub trait DeckSource: Send + Sync {
    fn new_deck(&self) -> Deck;
}

/// Production deck source backed by the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShuffledDecks;

impl DeckSource for ShuffledDecks {
    fn new_deck(&self) -> Deck {
        Deck::shuffled()
    }
}

impl<F> DeckSource for F
where
    F: Fn() -> Deck + Send + Sync,
{
    fn new_deck(&self) -> Deck {
        self()
    }
}

/// Cards held by the player or the dealer for one round.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        functional::hand_total(&self.cards)
    }

    #[must_use]
    pub fn is_bust(&self) -> bool {
        functional::is_bust(self.total())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl From<Vec<Card>> for Hand {
    fn from(cards: Vec<Card>) -> Self {
        Self { cards }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cards: Vec<String> = self
            .cards
            .iter()
            .map(|card| card.to_string().trim_start().to_string())
            .collect();
        write!(f, "[{}] = {}", cards.join(" "), self.total())
    }
}

/// Running win/loss/tie count over a session.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl Tally {
    /// Count a finished round. `InProgress` is not an outcome and is ignored.
    pub fn record(&mut self, result: RoundResult) {
        match result {
            RoundResult::Win => self.wins += 1,
            RoundResult::Loss => self.losses += 1,
            RoundResult::Tie => self.ties += 1,
            RoundResult::InProgress => {}
        }
    }

    #[must_use]
    pub fn rounds(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Percentage of rounds won, `0.0` before any round finished.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        match self.rounds() {
            0 => 0.0,
            n => f64::from(self.wins) * 100.0 / f64::from(n),
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} wins, {} losses, {} ties ({} rounds)",
            self.wins,
            self.losses,
            self.ties,
            self.rounds()
        )
    }
}

//! # Blackjack
//!
//! A discoverable blackjack service: a server announces itself with UDP
//! broadcasts, admits a bounded number of concurrent TCP sessions, and plays
//! rounds against each client using a small fixed-layout binary protocol.
//!
//! ## Protocol
//!
//! Every message starts with the magic cookie `0xabcddcba` and a one byte
//! type, followed by a fixed body:
//!
//! - **Offer** (UDP, server to client): TCP port and server name
//! - **Request** (client to server): rounds to play and client name
//! - **ServerPayload** (server to client): round result and one revealed card
//! - **ClientDecision** (client to server): `Hittt` or `Stand`
//!
//! ## Rounds
//!
//! Each round is dealt from a fresh deck. The player sees both of their cards
//! and the dealer's up-card, hits or stands, and then the dealer reveals the
//! hole card and draws until reaching 17. Aces always count 11.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, decks, hand totals and the round state machine
//! - [`net`]: Codec, sessions, admission, discovery, server and client
//!
//! ## Example
//!
//! ```
//! use blackjack::game::{Card, Hand, Suit};
//!
//! let hand = Hand::from(vec![Card(1, Suit::Spade), Card(13, Suit::Heart)]);
//! assert_eq!(hand.total(), 21);
//! ```

/// Networking components for client-server communication.
pub mod net;
pub use net::{
    admission,
    client::{self, Client},
    discovery, errors, messages, server, session, utils,
};

/// Core game logic, entities, and the round state machine.
pub mod game;
pub use game::{
    Card, Deck, DeckSource, Hand, Round, RoundOutcome, ShuffledDecks, Suit, Tally,
    constants::{self, BLACKJACK, DEALER_STANDS_ON},
    entities, functional,
};

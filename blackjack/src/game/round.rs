//! One round of blackjack played over a byte stream.
//!
//! The round is a small state machine:
//!
//! - **Deal**: two cards each; the player's cards and the dealer's up-card are
//!   revealed, the dealer's hole card stays hidden
//! - **PlayerTurn**: wait for decisions while the player's total is below 21
//! - **DealerTurn**: reveal the hole card, then draw until 17 or more
//! - **Resolve**: send the single outcome message
//!
//! A player bust during **PlayerTurn** finishes the round immediately with a
//! loss carried on the busting card.

use std::time::Duration;

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite};

use super::{
    constants::INITIAL_HAND_SIZE,
    entities::{Card, Deck, Hand},
    functional,
};
use crate::net::{
    errors::SessionError,
    messages::{ClientDecision, Decision, RoundResult, ServerPayload},
    utils::{read_message, write_message},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Deal,
    PlayerTurn,
    DealerTurn,
    Resolve,
    Finished(RoundResult),
}

/// Final hands and result of a completed round.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundOutcome {
    pub result: RoundResult,
    pub player: Hand,
    pub dealer: Hand,
}

impl RoundOutcome {
    /// True when the round ended on the player's bust, before the dealer played.
    /// A two-ace opening is over 21 but never a bust.
    #[must_use]
    pub fn player_bust(&self) -> bool {
        self.player.is_bust() && self.player.len() > INITIAL_HAND_SIZE
    }
}

#[derive(Debug)]
pub struct Round {
    deck: Deck,
    player: Hand,
    dealer: Hand,
    phase: Phase,
}

impl Round {
    #[must_use]
    pub fn new(deck: Deck) -> Self {
        Self {
            deck,
            player: Hand::new(),
            dealer: Hand::new(),
            phase: Phase::Deal,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Plays the round to completion over `stream`.
    ///
    /// Any error aborts the round on the spot: nothing else is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream closes or fails, a decision is
    /// malformed or late, or the deck runs out.
    pub async fn play<S>(
        mut self,
        stream: &mut S,
        read_timeout: Option<Duration>,
    ) -> Result<RoundOutcome, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            self.phase = match self.phase {
                Phase::Deal => self.deal(stream).await?,
                Phase::PlayerTurn => self.player_turn(stream, read_timeout).await?,
                Phase::DealerTurn => self.dealer_turn(stream).await?,
                Phase::Resolve => self.resolve(stream).await?,
                Phase::Finished(result) => {
                    return Ok(RoundOutcome {
                        result,
                        player: self.player,
                        dealer: self.dealer,
                    });
                }
            };
        }
    }

    async fn deal<S>(&mut self, stream: &mut S) -> Result<Phase, SessionError>
    where
        S: AsyncWrite + Unpin,
    {
        for _ in 0..INITIAL_HAND_SIZE {
            self.player.push(self.deck.draw()?);
        }
        for _ in 0..INITIAL_HAND_SIZE {
            self.dealer.push(self.deck.draw()?);
        }

        let player_cards: Vec<Card> = self.player.cards().to_vec();
        for card in player_cards {
            reveal(stream, card).await?;
        }
        // Only the up-card; the hole card waits for the dealer's turn.
        reveal(stream, self.dealer.cards()[0]).await?;

        debug!("dealt player {}, dealer up-card {}", self.player, self.dealer.cards()[0]);
        Ok(Phase::PlayerTurn)
    }

    async fn player_turn<S>(
        &mut self,
        stream: &mut S,
        read_timeout: Option<Duration>,
    ) -> Result<Phase, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        while functional::player_may_act(self.player.total()) {
            let ClientDecision { decision } = read_message(stream, read_timeout).await?;
            match decision {
                Decision::Stand => break,
                Decision::Hit => {
                    let card = self.deck.draw()?;
                    self.player.push(card);
                    if self.player.is_bust() {
                        debug!("player bust with {}", self.player);
                        let payload = ServerPayload::reveal(RoundResult::Loss, card);
                        write_message(stream, &payload).await?;
                        return Ok(Phase::Finished(RoundResult::Loss));
                    }
                    reveal(stream, card).await?;
                }
                Decision::Other(_) => debug!("ignoring unknown decision {decision:?}"),
            }
        }
        Ok(Phase::DealerTurn)
    }

    async fn dealer_turn<S>(&mut self, stream: &mut S) -> Result<Phase, SessionError>
    where
        S: AsyncWrite + Unpin,
    {
        reveal(stream, self.dealer.cards()[1]).await?;
        while functional::dealer_must_draw(self.dealer.total()) {
            let card = self.deck.draw()?;
            self.dealer.push(card);
            reveal(stream, card).await?;
        }
        Ok(Phase::Resolve)
    }

    async fn resolve<S>(&mut self, stream: &mut S) -> Result<Phase, SessionError>
    where
        S: AsyncWrite + Unpin,
    {
        let result = functional::resolve(self.player.total(), self.dealer.total());
        debug!("player {} vs dealer {}: {result}", self.player, self.dealer);
        write_message(stream, &ServerPayload::outcome(result)).await?;
        Ok(Phase::Finished(result))
    }
}

async fn reveal<S>(stream: &mut S, card: Card) -> Result<(), SessionError>
where
    S: AsyncWrite + Unpin,
{
    write_message(stream, &ServerPayload::reveal(RoundResult::InProgress, card)).await
}

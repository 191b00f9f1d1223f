//! A TCP blackjack client.
//!
//! Used by the headless player binary and by the integration tests. The
//! client keeps its own view of both hands by attributing every revealed
//! card: the first two are the player's, the third is the dealer's up-card,
//! the card answering a hit is the player's, and everything after the
//! player's turn belongs to the dealer.

use anyhow::{Error, bail};
use std::{net::SocketAddr, time::Duration};
use tokio::{net::TcpStream, time};

use super::{
    messages::{ClientDecision, Decision, Request, RoundResult, ServerPayload},
    utils,
};
use crate::game::{
    constants::DEALER_STANDS_ON,
    entities::{Card, Hand, Tally},
    functional,
};

/// Default timeout for reading from the server.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the player has seen of the current round.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PlayerView {
    pub player: Hand,
    /// Up-card first, then whatever the dealer revealed.
    pub dealer: Hand,
}

impl PlayerView {
    #[must_use]
    pub fn dealer_up_card(&self) -> Option<Card> {
        self.dealer.cards().first().copied()
    }
}

/// A finished round as seen from the client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundRecord {
    pub result: RoundResult,
    pub player: Hand,
    pub dealer: Hand,
}

/// Hit below `stand_on`, stand otherwise.
pub fn stand_on(threshold: u32) -> impl Fn(&PlayerView) -> Decision + Copy {
    move |view| {
        if view.player.total() < threshold {
            Decision::Hit
        } else {
            Decision::Stand
        }
    }
}

/// Same threshold the dealer plays by.
pub fn mimic_dealer() -> impl Fn(&PlayerView) -> Decision + Copy {
    stand_on(DEALER_STANDS_ON)
}

/// An async TCP client for one blackjack session.
pub struct Client {
    /// The name sent in the Request.
    pub name: String,
    /// The underlying TCP stream.
    pub stream: TcpStream,
    read_timeout: Option<Duration>,
}

impl Client {
    /// Connect to a server and request `rounds` rounds.
    ///
    /// This method attempts to connect with backoff, trying three times with
    /// increasing timeouts (100ms, 500ms, 1s).
    ///
    /// # Errors
    ///
    /// Returns an error if unable to connect or send the Request.
    pub async fn connect(addr: &SocketAddr, name: &str, rounds: u8) -> Result<Self, Error> {
        let mut connect_timeouts = vec![
            Duration::from_secs(1),
            Duration::from_millis(500),
            Duration::from_millis(100),
        ];
        while let Some(connect_timeout) = connect_timeouts.pop() {
            match time::timeout(connect_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    stream.set_nodelay(true)?;
                    let mut client = Self {
                        name: name.to_string(),
                        stream,
                        read_timeout: Some(READ_TIMEOUT),
                    };
                    let request = Request {
                        rounds,
                        client_name: client.name.clone(),
                    };
                    utils::write_message(&mut client.stream, &request).await?;
                    return Ok(client);
                }
                _ => time::sleep(connect_timeout).await,
            }
        }
        bail!("couldn't connect to {addr} as {name}")
    }

    /// Replaces the read timeout. `None` waits forever.
    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub async fn recv_payload(&mut self) -> Result<ServerPayload, Error> {
        Ok(utils::read_message(&mut self.stream, self.read_timeout).await?)
    }

    pub async fn send_decision(&mut self, decision: Decision) -> Result<(), Error> {
        utils::write_message(&mut self.stream, &ClientDecision::new(decision)).await?;
        Ok(())
    }

    pub async fn hit(&mut self) -> Result<(), Error> {
        self.send_decision(Decision::Hit).await
    }

    pub async fn stand(&mut self) -> Result<(), Error> {
        self.send_decision(Decision::Stand).await
    }

    /// Receive a payload that must reveal a card while the round goes on.
    pub async fn recv_card(&mut self) -> Result<Card, Error> {
        match self.recv_payload().await? {
            ServerPayload {
                result: RoundResult::InProgress,
                card: Some(card),
            } => Ok(card),
            payload => bail!("expected a card, got {payload:?}"),
        }
    }

    /// Play one round, asking `strategy` for each decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or the server strays from
    /// the round's message order.
    pub async fn play_round<F>(&mut self, mut strategy: F) -> Result<RoundRecord, Error>
    where
        F: FnMut(&PlayerView) -> Decision,
    {
        let mut view = PlayerView::default();
        for _ in 0..2 {
            let card = self.recv_card().await?;
            view.player.push(card);
        }
        let up_card = self.recv_card().await?;
        view.dealer.push(up_card);

        while functional::player_may_act(view.player.total()) {
            let decision = strategy(&view);
            self.send_decision(decision).await?;
            match decision {
                Decision::Hit => {
                    let payload = self.recv_payload().await?;
                    if let Some(card) = payload.card {
                        view.player.push(card);
                    }
                    if payload.result.is_final() {
                        return Ok(finish(payload.result, view));
                    }
                }
                Decision::Stand => break,
                // Not a move; the server waits for another decision.
                Decision::Other(_) => {}
            }
        }

        loop {
            let payload = self.recv_payload().await?;
            if let Some(card) = payload.card {
                view.dealer.push(card);
            }
            if payload.result.is_final() {
                return Ok(finish(payload.result, view));
            }
        }
    }

    /// Play `rounds` rounds with the same strategy, calling `on_round` after each.
    ///
    /// # Errors
    ///
    /// Stops at the first failed round.
    pub async fn play_session<F, G>(
        &mut self,
        rounds: u8,
        mut strategy: F,
        mut on_round: G,
    ) -> Result<Tally, Error>
    where
        F: FnMut(&PlayerView) -> Decision,
        G: FnMut(u8, &RoundRecord),
    {
        let mut tally = Tally::default();
        for round in 1..=rounds {
            let record = self.play_round(&mut strategy).await?;
            tally.record(record.result);
            on_round(round, &record);
        }
        Ok(tally)
    }
}

fn finish(result: RoundResult, view: PlayerView) -> RoundRecord {
    RoundRecord {
        result,
        player: view.player,
        dealer: view.dealer,
    }
}

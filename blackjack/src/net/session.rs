//! One admitted connection: a Request followed by that many rounds.

use std::{net::SocketAddr, time::Duration};

use log::{debug, info};
use tokio::io::{AsyncRead, AsyncWrite};

use super::{errors::SessionError, messages::Request, utils::read_message};
use crate::game::{DeckSource, Round, RoundOutcome, Tally};

/// Generous idle limit on client reads.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3000);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SessionSettings {
    /// Limit on every read from the client. `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
        }
    }
}

/// What a completed session leaves behind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionSummary {
    pub player_name: String,
    pub tally: Tally,
}

/// State of one client session. Owned by the task serving the connection.
#[derive(Debug)]
pub struct Session {
    peer: SocketAddr,
    player_name: String,
    rounds_remaining: u8,
    tally: Tally,
}

impl Session {
    /// Reads the opening Request.
    ///
    /// # Errors
    ///
    /// Fails if the Request is malformed, late, or the peer hangs up first.
    pub async fn open<S>(
        stream: &mut S,
        peer: SocketAddr,
        settings: &SessionSettings,
    ) -> Result<Self, SessionError>
    where
        S: AsyncRead + Unpin,
    {
        let Request {
            rounds,
            client_name,
        } = read_message(stream, settings.read_timeout).await?;
        info!("{client_name} ({peer}) requested {rounds} rounds");
        Ok(Self {
            peer,
            player_name: client_name,
            rounds_remaining: rounds,
            tally: Tally::default(),
        })
    }

    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    #[must_use]
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    #[must_use]
    pub fn rounds_remaining(&self) -> u8 {
        self.rounds_remaining
    }

    #[must_use]
    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Plays one round on a fresh deck, or returns `None` when no rounds remain.
    ///
    /// # Errors
    ///
    /// Any round error. The aborted round is not counted.
    pub async fn play_next_round<S>(
        &mut self,
        stream: &mut S,
        decks: &dyn DeckSource,
        settings: &SessionSettings,
    ) -> Result<Option<RoundOutcome>, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if self.rounds_remaining == 0 {
            return Ok(None);
        }
        let outcome = Round::new(decks.new_deck())
            .play(stream, settings.read_timeout)
            .await?;
        self.rounds_remaining -= 1;
        self.tally.record(outcome.result);
        debug!(
            "{}: {} (player {}, dealer {})",
            self.player_name, outcome.result, outcome.player, outcome.dealer
        );
        Ok(Some(outcome))
    }

    /// Plays every remaining round back to back.
    ///
    /// # Errors
    ///
    /// The first round error ends the session.
    pub async fn run<S>(
        mut self,
        stream: &mut S,
        decks: &dyn DeckSource,
        settings: &SessionSettings,
    ) -> Result<SessionSummary, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        while self
            .play_next_round(stream, decks, settings)
            .await?
            .is_some()
        {}
        Ok(SessionSummary {
            player_name: self.player_name,
            tally: self.tally,
        })
    }
}

/// Serves one admitted connection from its Request to its last round.
///
/// The stream is dropped, and so closed, when this returns.
///
/// # Errors
///
/// Returns the error that ended the session early.
pub async fn serve_connection<S>(
    mut stream: S,
    peer: SocketAddr,
    settings: &SessionSettings,
    decks: &dyn DeckSource,
) -> Result<SessionSummary, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let session = Session::open(&mut stream, peer, settings).await?;
    let summary = session.run(&mut stream, decks, settings).await?;
    info!(
        "finished session with {}: {}",
        summary.player_name, summary.tally
    );
    Ok(summary)
}

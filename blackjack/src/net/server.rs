//! The blackjack TCP server.
//!
//! One accept loop admits connections through an [`AdmissionController`] and
//! spawns a task per admitted session. A [`Broadcaster`] task announces the
//! listening port over UDP. Both stop when the shutdown signal turns true;
//! sessions already running are left to finish on their own.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};

use log::{debug, info, warn};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::watch,
};

use super::{
    admission::{AdmissionController, DEFAULT_MAX_SESSIONS},
    discovery::{Broadcaster, DiscoverySettings},
    messages::Offer,
    session::{SessionSettings, serve_connection},
};
use crate::game::{DeckSource, ShuffledDecks};

pub const DEFAULT_SERVER_NAME: &str = "CyberCasino_7";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerSettings {
    /// Display name carried in every Offer.
    pub server_name: String,
    /// TCP listen address. Port 0 picks an ephemeral port.
    pub bind: SocketAddr,
    /// Admission capacity, clamped to `[1, 20]`.
    pub max_sessions: usize,
    pub session: SessionSettings,
    /// `None` disables broadcasting.
    pub discovery: Option<DiscoverySettings>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            max_sessions: DEFAULT_MAX_SESSIONS,
            session: SessionSettings::default(),
            discovery: Some(DiscoverySettings::default()),
        }
    }
}

pub struct Server {
    listener: TcpListener,
    settings: ServerSettings,
    admission: AdmissionController,
    decks: Arc<dyn DeckSource>,
}

impl Server {
    /// Binds the TCP listener. Nothing is accepted or broadcast until [`Server::run`].
    ///
    /// # Errors
    ///
    /// Fails if the listen address cannot be bound.
    pub async fn bind(settings: ServerSettings) -> io::Result<Self> {
        let listener = TcpListener::bind(settings.bind).await?;
        let admission = AdmissionController::new(settings.max_sessions);
        Ok(Self {
            listener,
            settings,
            admission,
            decks: Arc::new(ShuffledDecks),
        })
    }

    /// Replaces the shuffled decks used for every round.
    #[must_use]
    pub fn with_deck_source(mut self, decks: Arc<dyn DeckSource>) -> Self {
        self.decks = decks;
        self
    }

    /// # Errors
    ///
    /// Fails if the listener's address cannot be read.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// A handle on the session slots, shared with the running server.
    #[must_use]
    pub fn admission(&self) -> AdmissionController {
        self.admission.clone()
    }

    #[must_use]
    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// The Offer this server announces.
    ///
    /// # Errors
    ///
    /// Fails if the listener's address cannot be read.
    pub fn offer(&self) -> io::Result<Offer> {
        Ok(Offer {
            tcp_port: self.local_addr()?.port(),
            server_name: self.settings.server_name.clone(),
        })
    }

    /// Accepts and serves connections until `shutdown` turns true or its
    /// sender is dropped.
    ///
    /// # Errors
    ///
    /// Fails only if the listener's address cannot be read. A broadcaster
    /// that cannot be started is logged and the server keeps serving without
    /// discovery. Accept and session errors are logged and never stop the loop.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> io::Result<()> {
        let offer = self.offer()?;
        info!(
            "Server started, listening on port {}. Max players: {}",
            offer.tcp_port,
            self.admission.capacity()
        );

        let broadcaster = match self.settings.discovery {
            Some(discovery) => match Broadcaster::bind(discovery, &offer).await {
                Ok(broadcaster) => Some(tokio::spawn(broadcaster.run(shutdown.clone()))),
                Err(error) => {
                    warn!("offers disabled, failed to start broadcaster: {error}");
                    None
                }
            },
            None => None,
        };

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.admit(stream, peer),
                    Err(error) => warn!("failed to accept connection: {error}"),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("server on port {} shutting down", offer.tcp_port);
        if let Some(handle) = broadcaster {
            handle.abort();
            match handle.await {
                Err(error) if !error.is_cancelled() => warn!("broadcaster task failed: {error}"),
                _ => {}
            }
        }
        Ok(())
    }

    /// Starts a session task for `stream`, or drops it unanswered when every
    /// slot is taken. A rejected peer that already sent its Request sees a
    /// connection reset rather than EOF, since its bytes are never read.
    fn admit(&self, stream: TcpStream, peer: SocketAddr) {
        let Some(slot) = self.admission.try_admit() else {
            debug!(
                "rejecting {peer}: all {} sessions in use",
                self.admission.capacity()
            );
            return;
        };
        if let Err(error) = stream.set_nodelay(true) {
            debug!("failed to set TCP_NODELAY for {peer}: {error}");
        }

        let settings = self.settings.session;
        let decks = Arc::clone(&self.decks);
        tokio::spawn(async move {
            let _slot = slot;
            debug!("admitted {peer}");
            if let Err(error) = serve_connection(stream, peer, &settings, decks.as_ref()).await {
                warn!("session with {peer} ended early: {error}");
            }
        });
    }
}

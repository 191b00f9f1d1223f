//! UDP service discovery: the server broadcasts Offers, clients listen for them.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    time::Duration,
};

use log::{debug, info, warn};
use tokio::{
    net::UdpSocket,
    sync::watch,
    time::{self, MissedTickBehavior},
};

use super::messages::{Message, Offer};

/// Well-known port Offers are sent to.
pub const DISCOVERY_PORT: u16 = 13122;

pub const BROADCAST_INTERVAL: Duration = Duration::from_secs(1);

/// Largest datagram the listener reads; anything beyond an Offer is ignored.
const RECV_BUFFER_LEN: usize = 1024;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DiscoverySettings {
    /// Local address the broadcast socket binds to.
    pub source: SocketAddr,
    /// Destination of every Offer.
    pub target: SocketAddr,
    pub interval: Duration,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            source: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
            target: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::BROADCAST, DISCOVERY_PORT)),
            interval: BROADCAST_INTERVAL,
        }
    }
}

/// Periodically sends one fixed Offer until shut down.
#[derive(Debug)]
pub struct Broadcaster {
    socket: UdpSocket,
    settings: DiscoverySettings,
    datagram: Vec<u8>,
}

impl Broadcaster {
    /// Binds a broadcast-enabled socket on `settings.source`. The Offer is encoded once;
    /// it never changes while the server runs.
    ///
    /// # Errors
    ///
    /// Fails if the socket cannot be bound or configured.
    pub async fn bind(settings: DiscoverySettings, offer: &Offer) -> io::Result<Self> {
        let socket = UdpSocket::bind(settings.source).await?;
        socket.set_broadcast(true)?;
        Ok(Self {
            socket,
            settings,
            datagram: offer.encode(),
        })
    }

    /// Sends the Offer once.
    ///
    /// # Errors
    ///
    /// Any send failure.
    pub async fn send_once(&self) -> io::Result<()> {
        self.socket
            .send_to(&self.datagram, self.settings.target)
            .await?;
        Ok(())
    }

    /// Sends the Offer every interval until `shutdown` turns true or its
    /// sender is dropped. Send failures are logged and the loop continues.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "broadcasting offers to {} every {:?}",
            self.settings.target, self.settings.interval
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(error) = self.send_once().await {
                        warn!("failed to broadcast offer: {error}");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("broadcaster stopped");
    }
}

/// Receives Offers on the discovery port.
#[derive(Debug)]
pub struct OfferListener {
    socket: UdpSocket,
}

impl OfferListener {
    /// Binds `addr` with address reuse, so several clients on one host can
    /// listen to the same port.
    ///
    /// # Errors
    ///
    /// Fails if the socket cannot be created or bound.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let domain = if addr.is_ipv6() {
            socket2::Domain::IPV6
        } else {
            socket2::Domain::IPV4
        };
        let socket = socket2::Socket::new(
            domain,
            socket2::Type::DGRAM,
            Some(socket2::Protocol::UDP),
        )?;
        socket.set_reuse_address(true)?;
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        socket.set_reuse_port(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;

        let std_socket: std::net::UdpSocket = socket.into();
        Ok(Self {
            socket: UdpSocket::from_std(std_socket)?,
        })
    }

    /// # Errors
    ///
    /// Fails if the local address cannot be read.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Waits for the next valid Offer and returns it with its sender's address.
    /// Malformed datagrams are skipped.
    ///
    /// # Errors
    ///
    /// Any receive failure.
    pub async fn recv_offer(&self) -> io::Result<(Offer, SocketAddr)> {
        let mut buf = [0; RECV_BUFFER_LEN];
        loop {
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            match Offer::decode(&buf[..len]) {
                Ok(offer) => return Ok((offer, from)),
                Err(error) => debug!("ignoring datagram from {from}: {error}"),
            }
        }
    }
}

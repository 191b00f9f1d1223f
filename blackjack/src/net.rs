//! Networking: the wire codec, framing, discovery, and the TCP server and client.

/// Bounded admission of concurrent sessions.
pub mod admission;

/// Async TCP client for playing against a server.
pub mod client;

/// UDP Offer broadcaster and listener.
pub mod discovery;

/// Codec and session error types.
pub mod errors;

/// Fixed-layout wire messages.
pub mod messages;

/// TCP accept loop tying admission, sessions and discovery together.
pub mod server;

/// Per-connection session runner.
pub mod session;

/// Fixed-size message framing over async byte streams.
pub mod utils;

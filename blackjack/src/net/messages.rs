//! Fixed-layout, big-endian wire messages.
//!
//! Every message starts with [`MAGIC_COOKIE`] followed by a one byte type
//! discriminator. All messages are fixed length, so framing is "read exactly
//! [`Message::SIZE`] bytes" and decoding never looks past that prefix.

use std::fmt;

use super::errors::{ProtocolError, Result};
use crate::game::{
    constants::MAX_RANK,
    entities::{Card, Suit},
};

pub const MAGIC_COOKIE: u32 = 0xABCD_DCBA;

pub const OFFER_TYPE: u8 = 0x2;
pub const REQUEST_TYPE: u8 = 0x3;
/// Shared by [`ServerPayload`] and [`ClientDecision`]; the direction tells them apart.
pub const PAYLOAD_TYPE: u8 = 0x4;

/// Width of the zero-padded name fields.
pub const NAME_LEN: usize = 32;

/// Width of the decision token field.
pub const DECISION_LEN: usize = 5;

const HEADER_LEN: usize = 5;

/// A fixed-size protocol message.
pub trait Message: Sized {
    /// Encoded length in bytes.
    const SIZE: usize;
    /// Type discriminator following the magic cookie.
    const TYPE: u8;

    /// Appends the body (everything after the header) to `buf`.
    fn encode_body(&self, buf: &mut Vec<u8>);

    /// Decodes the body. `body` is exactly `SIZE - 5` bytes long.
    fn decode_body(body: &[u8]) -> Result<Self>;

    #[must_use]
    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&MAGIC_COOKIE.to_be_bytes());
        buf.push(Self::TYPE);
        self.encode_body(&mut buf);
        debug_assert_eq!(buf.len(), Self::SIZE);
        buf
    }

    /// Decodes the first `SIZE` bytes of `buf`. Trailing bytes are ignored.
    fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(ProtocolError::TooShort {
                expected: Self::SIZE,
                actual: buf.len(),
            });
        }
        let magic = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if magic != MAGIC_COOKIE {
            return Err(ProtocolError::BadMagic(magic));
        }
        if buf[4] != Self::TYPE {
            return Err(ProtocolError::UnexpectedType {
                expected: Self::TYPE,
                actual: buf[4],
            });
        }
        Self::decode_body(&buf[HEADER_LEN..Self::SIZE])
    }
}

/// Truncates `name` to at most [`NAME_LEN`] bytes on a char boundary and
/// zero-pads it.
#[must_use]
pub fn encode_name(name: &str) -> [u8; NAME_LEN] {
    let mut end = name.len().min(NAME_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    let mut field = [0; NAME_LEN];
    field[..end].copy_from_slice(&name.as_bytes()[..end]);
    field
}

/// Strips trailing zero padding and decodes lossily; names are display-only.
#[must_use]
pub fn decode_name(field: &[u8]) -> String {
    let end = field.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Server announcement broadcast over UDP.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Offer {
    pub tcp_port: u16,
    pub server_name: String,
}

impl Message for Offer {
    const SIZE: usize = 39;
    const TYPE: u8 = OFFER_TYPE;

    fn encode_body(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.tcp_port.to_be_bytes());
        buf.extend_from_slice(&encode_name(&self.server_name));
    }

    fn decode_body(body: &[u8]) -> Result<Self> {
        Ok(Self {
            tcp_port: u16::from_be_bytes([body[0], body[1]]),
            server_name: decode_name(&body[2..]),
        })
    }
}

/// The client's opening message on a new connection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    pub rounds: u8,
    pub client_name: String,
}

impl Message for Request {
    const SIZE: usize = 38;
    const TYPE: u8 = REQUEST_TYPE;

    fn encode_body(&self, buf: &mut Vec<u8>) {
        buf.push(self.rounds);
        buf.extend_from_slice(&encode_name(&self.client_name));
    }

    fn decode_body(body: &[u8]) -> Result<Self> {
        Ok(Self {
            rounds: body[0],
            client_name: decode_name(&body[1..]),
        })
    }
}

/// Round status carried by every [`ServerPayload`], from the player's side.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RoundResult {
    InProgress,
    Tie,
    Loss,
    Win,
}

impl RoundResult {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::InProgress => 0,
            Self::Tie => 1,
            Self::Loss => 2,
            Self::Win => 3,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::InProgress),
            1 => Some(Self::Tie),
            2 => Some(Self::Loss),
            3 => Some(Self::Win),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_final(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::InProgress => "in progress",
            Self::Tie => "tie",
            Self::Loss => "loss",
            Self::Win => "win",
        };
        write!(f, "{repr}")
    }
}

/// One revealed card and/or the round outcome.
///
/// `card` is `None` for the final outcome message, which carries rank `"00"`
/// and suit 0 on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ServerPayload {
    pub result: RoundResult,
    pub card: Option<Card>,
}

impl ServerPayload {
    #[must_use]
    pub const fn reveal(result: RoundResult, card: Card) -> Self {
        Self {
            result,
            card: Some(card),
        }
    }

    #[must_use]
    pub const fn outcome(result: RoundResult) -> Self {
        Self { result, card: None }
    }
}

impl Message for ServerPayload {
    const SIZE: usize = 9;
    const TYPE: u8 = PAYLOAD_TYPE;

    fn encode_body(&self, buf: &mut Vec<u8>) {
        buf.push(self.result.code());
        let (rank, suit) = match self.card {
            Some(card) => (card.rank(), card.suit().code()),
            None => (0, 0),
        };
        buf.push(b'0' + rank / 10);
        buf.push(b'0' + rank % 10);
        buf.push(suit);
    }

    fn decode_body(body: &[u8]) -> Result<Self> {
        let result = RoundResult::from_code(body[0]).ok_or(ProtocolError::InvalidField {
            field: "result",
            value: body[0],
        })?;
        let rank = decode_rank(body[1], body[2])?;
        let card = match rank {
            0 => None,
            rank => {
                let suit = Suit::from_code(body[3]).ok_or(ProtocolError::InvalidField {
                    field: "suit",
                    value: body[3],
                })?;
                Some(Card(rank, suit))
            }
        };
        Ok(Self { result, card })
    }
}

fn decode_rank(tens: u8, ones: u8) -> Result<u8> {
    let digit = |b: u8| {
        if b.is_ascii_digit() {
            Ok(b - b'0')
        } else {
            Err(ProtocolError::InvalidField {
                field: "rank",
                value: b,
            })
        }
    };
    let rank = digit(tens)? * 10 + digit(ones)?;
    if rank > MAX_RANK {
        return Err(ProtocolError::InvalidField {
            field: "rank",
            value: rank,
        });
    }
    Ok(rank)
}

/// A player's move. Tokens are matched by exact bytes; anything that is not
/// one of the recognised tokens is kept verbatim and ignored by the server.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Decision {
    Hit,
    Stand,
    Other([u8; DECISION_LEN]),
}

impl Decision {
    pub const HIT_TOKEN: &'static [u8; DECISION_LEN] = b"Hittt";
    pub const STAND_TOKEN: &'static [u8; DECISION_LEN] = b"Stand";

    /// Builds a decision from a textual token, padding short tokens with zeros
    /// and truncating long ones.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        let mut raw = [0; DECISION_LEN];
        let len = token.len().min(DECISION_LEN);
        raw[..len].copy_from_slice(&token.as_bytes()[..len]);
        Self::from_bytes(raw)
    }

    #[must_use]
    pub fn from_bytes(raw: [u8; DECISION_LEN]) -> Self {
        if &raw == Self::HIT_TOKEN {
            Self::Hit
        } else if &raw == Self::STAND_TOKEN {
            Self::Stand
        } else {
            Self::Other(raw)
        }
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; DECISION_LEN] {
        match self {
            Self::Hit => *Self::HIT_TOKEN,
            Self::Stand => *Self::STAND_TOKEN,
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = self.to_bytes();
        let token = String::from_utf8_lossy(&raw);
        write!(f, "{}", token.trim_end_matches(['\0', ' ']))
    }
}

/// A player's in-round move sent to the server.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClientDecision {
    pub decision: Decision,
}

impl ClientDecision {
    #[must_use]
    pub const fn new(decision: Decision) -> Self {
        Self { decision }
    }
}

impl Message for ClientDecision {
    const SIZE: usize = 10;
    const TYPE: u8 = PAYLOAD_TYPE;

    fn encode_body(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.decision.to_bytes());
    }

    fn decode_body(body: &[u8]) -> Result<Self> {
        let mut raw = [0; DECISION_LEN];
        raw.copy_from_slice(&body[..DECISION_LEN]);
        Ok(Self::new(Decision::from_bytes(raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Layout Tests ===

    #[test]
    fn test_offer_layout() {
        let offer = Offer {
            tcp_port: 0x1234,
            server_name: "TestName".to_string(),
        };
        let bytes = offer.encode();
        assert_eq!(bytes.len(), 39);
        assert_eq!(&bytes[..4], &[0xAB, 0xCD, 0xDC, 0xBA]);
        assert_eq!(bytes[4], 0x2);
        assert_eq!(&bytes[5..7], &[0x12, 0x34]);
        assert_eq!(&bytes[7..15], b"TestName");
        assert!(bytes[15..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_request_layout() {
        let request = Request {
            rounds: 3,
            client_name: "TeamA".to_string(),
        };
        let bytes = request.encode();
        assert_eq!(bytes.len(), 38);
        assert_eq!(bytes[4], 0x3);
        assert_eq!(bytes[5], 3);
        assert_eq!(&bytes[6..11], b"TeamA");
    }

    #[test]
    fn test_server_payload_layout() {
        let payload = ServerPayload::reveal(RoundResult::InProgress, Card(7, Suit::Diamond));
        assert_eq!(payload.encode(), [0xAB, 0xCD, 0xDC, 0xBA, 0x4, 0, b'0', b'7', 2]);

        let payload = ServerPayload::reveal(RoundResult::Loss, Card(12, Suit::Heart));
        assert_eq!(&payload.encode()[5..], &[2, b'1', b'2', 3]);
    }

    #[test]
    fn test_outcome_payload_has_no_card() {
        let bytes = ServerPayload::outcome(RoundResult::Win).encode();
        assert_eq!(&bytes[5..], &[3, b'0', b'0', 0]);
        let decoded = ServerPayload::decode(&bytes).unwrap();
        assert_eq!(decoded.card, None);
        assert_eq!(decoded.result, RoundResult::Win);
    }

    #[test]
    fn test_client_decision_layout() {
        let bytes = ClientDecision::new(Decision::Hit).encode();
        assert_eq!(bytes.len(), 10);
        assert_eq!(bytes[4], 0x4);
        assert_eq!(&bytes[5..], b"Hittt");
        assert_eq!(&ClientDecision::new(Decision::Stand).encode()[5..], b"Stand");
    }

    // === Malformed Input Tests ===

    #[test]
    fn test_decode_short_buffer() {
        assert_eq!(
            ServerPayload::decode(&[0xDE, 0xAD]),
            Err(ProtocolError::TooShort {
                expected: 9,
                actual: 2
            })
        );
    }

    #[test]
    fn test_decode_bad_magic() {
        let mut bytes = Request {
            rounds: 1,
            client_name: "Bad".to_string(),
        }
        .encode();
        bytes[..4].copy_from_slice(&0xDEAD_BEEF_u32.to_be_bytes());
        assert_eq!(Request::decode(&bytes), Err(ProtocolError::BadMagic(0xDEAD_BEEF)));
    }

    #[test]
    fn test_decode_wrong_type() {
        let mut bytes = Request {
            rounds: 1,
            client_name: "Bad".to_string(),
        }
        .encode();
        bytes[4] = OFFER_TYPE;
        assert_eq!(
            Request::decode(&bytes),
            Err(ProtocolError::UnexpectedType {
                expected: REQUEST_TYPE,
                actual: OFFER_TYPE
            })
        );
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut bytes = ClientDecision::new(Decision::Stand).encode();
        bytes.extend_from_slice(b"garbage");
        assert_eq!(
            ClientDecision::decode(&bytes),
            Ok(ClientDecision::new(Decision::Stand))
        );
    }

    #[test]
    fn test_decode_invalid_payload_fields() {
        let mut bytes = ServerPayload::outcome(RoundResult::Tie).encode();
        bytes[5] = 9;
        assert!(matches!(
            ServerPayload::decode(&bytes),
            Err(ProtocolError::InvalidField { field: "result", .. })
        ));

        let mut bytes = ServerPayload::outcome(RoundResult::Tie).encode();
        bytes[6] = b'x';
        assert!(matches!(
            ServerPayload::decode(&bytes),
            Err(ProtocolError::InvalidField { field: "rank", .. })
        ));

        let mut bytes = ServerPayload::outcome(RoundResult::Tie).encode();
        bytes[6] = b'1';
        bytes[7] = b'4';
        assert!(matches!(
            ServerPayload::decode(&bytes),
            Err(ProtocolError::InvalidField { field: "rank", value: 14 })
        ));

        let mut bytes = ServerPayload::reveal(RoundResult::InProgress, Card(2, Suit::Club)).encode();
        bytes[8] = 4;
        assert!(matches!(
            ServerPayload::decode(&bytes),
            Err(ProtocolError::InvalidField { field: "suit", value: 4 })
        ));
    }

    // === Name Field Tests ===

    #[test]
    fn test_long_name_is_truncated() {
        let name = "x".repeat(40);
        let request = Request {
            rounds: 1,
            client_name: name,
        };
        let decoded = Request::decode(&request.encode()).unwrap();
        assert_eq!(decoded.client_name, "x".repeat(32));
    }

    #[test]
    fn test_non_ascii_name() {
        let name = "צוות_מנצח";
        let field = encode_name(name);
        assert_eq!(decode_name(&field), name);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // 11 three-byte chars = 33 bytes; only 10 fit.
        let name = "€".repeat(11);
        let field = encode_name(&name);
        assert_eq!(decode_name(&field), "€".repeat(10));
        assert_eq!(&field[30..], &[0, 0]);
    }

    #[test]
    fn test_invalid_utf8_name_is_replaced() {
        let mut field = [0u8; NAME_LEN];
        field[0] = b'A';
        field[1] = 0xFF;
        assert_eq!(decode_name(&field), "A\u{FFFD}");
    }

    // === Decision Tests ===

    #[test]
    fn test_hit_requires_exact_token() {
        assert_eq!(Decision::from_token("Hittt"), Decision::Hit);
        assert_eq!(Decision::from_token("Stand"), Decision::Stand);
        assert!(matches!(Decision::from_token("Hit"), Decision::Other(_)));
        assert!(matches!(Decision::from_token("hittt"), Decision::Other(_)));
    }

    #[test]
    fn test_other_decision_display() {
        assert_eq!(Decision::from_token("Hit").to_string(), "Hit");
        assert_eq!(Decision::Hit.to_string(), "Hittt");
    }

    #[test]
    fn test_round_result_codes() {
        assert_eq!(RoundResult::InProgress.code(), 0);
        assert_eq!(RoundResult::Tie.code(), 1);
        assert_eq!(RoundResult::Loss.code(), 2);
        assert_eq!(RoundResult::Win.code(), 3);
        assert!(!RoundResult::InProgress.is_final());
        assert!(RoundResult::Tie.is_final());
    }
}

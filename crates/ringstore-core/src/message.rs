//! Fixed-layout binary wire messages.
//!
//! Every datagram is a 294-byte header followed by up to
//! [`MAX_PAYLOAD`] bytes of payload:
//!
//! ```text
//! offset  width  field
//! 0       1      version
//! 1       1      operation type
//! 2       1      sub-operation
//! 3       1      reserved (zero)
//! 4       16     args
//! 20      16     reserved (zero)
//! 36      256    reply-to identity, UTF-8, zero-padded
//! 292     2      payload length, big-endian
//! 294     len    payload
//! ```
//!
//! The first eight bytes of `args` carry a big-endian request id. Responders
//! echo `args` unchanged so the requester can correlate replies.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::error::WireError;

/// Wire protocol version written by this implementation.
pub const PROTOCOL_VERSION: u8 = 1;

/// Size of the fixed header.
pub const HEADER_SIZE: usize = 294;

/// Largest payload that keeps a message within a 16-bit datagram length.
pub const MAX_PAYLOAD: usize = 0xFFFF - HEADER_SIZE;

/// Width of the zero-padded reply-to field.
pub const MAX_REPLY_TO: usize = 256;

/// Width of the args field.
pub const ARGS_LEN: usize = 16;

/// Byte offsets of header fields.
mod offsets {
    pub const VERSION: usize = 0;
    pub const OP: usize = 1;
    pub const SUBOP: usize = 2;
    pub const ARGS: usize = 4;
    pub const REPLY_TO: usize = 36;
    pub const LENGTH: usize = 292;
}

/// Operation type code reserved for cluster join. Never sent.
pub const JOIN_RESERVED: u8 = 2;

/// Top-level operation carried by a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpType {
    Noop = 0,
    Ping = 1,
    Store = 3,
    Load = 4,
}

impl OpType {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Noop),
            1 => Some(Self::Ping),
            3 => Some(Self::Store),
            4 => Some(Self::Load),
            _ => None,
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Noop => "NOOP",
            Self::Ping => "PING",
            Self::Store => "STORE",
            Self::Load => "LOAD",
        };
        f.write_str(name)
    }
}

/// Sub-operation codes, scoped by operation type.
pub mod subop {
    pub mod ping {
        pub const PING: u8 = 0;
        pub const PONG: u8 = 1;
    }

    pub mod store {
        pub const PUT: u8 = 0;
        pub const ACK: u8 = 1;
    }

    pub mod load {
        pub const GET: u8 = 0;
        pub const ACK: u8 = 1;
        pub const NACK: u8 = 2;
    }
}

/// A decoded wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: u8,
    pub op: OpType,
    pub subop: u8,
    pub args: [u8; ARGS_LEN],
    /// Name of the peer that should receive the reply.
    pub reply_to: String,
    pub payload: Bytes,
}

impl Message {
    /// Create a message with zero args and an empty payload.
    pub fn new(op: OpType, subop: u8, reply_to: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            op,
            subop,
            args: [0u8; ARGS_LEN],
            reply_to: reply_to.into(),
            payload: Bytes::new(),
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_args(mut self, args: [u8; ARGS_LEN]) -> Self {
        self.args = args;
        self
    }

    /// Stamp a protocol version other than [`PROTOCOL_VERSION`].
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Write `id` into the first eight bytes of args.
    pub fn with_request_id(mut self, id: u64) -> Self {
        self.args[..8].copy_from_slice(&id.to_be_bytes());
        self
    }

    /// The request id carried in args.
    pub fn request_id(&self) -> u64 {
        let mut id = [0u8; 8];
        id.copy_from_slice(&self.args[..8]);
        u64::from_be_bytes(id)
    }

    /// Build a reply: same operation, echoed args, our identity as reply-to.
    pub fn reply(&self, subop: u8, reply_to: impl Into<String>) -> Self {
        Self {
            version: self.version,
            op: self.op,
            subop,
            args: self.args,
            reply_to: reply_to.into(),
            payload: Bytes::new(),
        }
    }

    /// Serialize to the fixed wire layout.
    pub fn encode(&self) -> Result<Bytes, WireError> {
        if self.payload.len() > MAX_PAYLOAD {
            return Err(WireError::PayloadTooLarge {
                len: self.payload.len(),
                max: MAX_PAYLOAD,
            });
        }

        let reply_to = self.reply_to.as_bytes();
        if reply_to.len() > MAX_REPLY_TO {
            return Err(WireError::ReplyToTooLong {
                len: reply_to.len(),
                max: MAX_REPLY_TO,
            });
        }
        if reply_to.contains(&0) {
            return Err(WireError::InvalidReplyTo("contains NUL byte".into()));
        }

        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());
        buf.put_u8(self.version);
        buf.put_u8(self.op.to_u8());
        buf.put_u8(self.subop);
        buf.put_u8(0);
        buf.put_slice(&self.args);
        buf.put_bytes(0, offsets::REPLY_TO - buf.len());
        buf.put_slice(reply_to);
        buf.put_bytes(0, MAX_REPLY_TO - reply_to.len());
        // Checked against MAX_PAYLOAD above.
        buf.put_u16(self.payload.len() as u16);
        buf.put_slice(&self.payload);

        debug_assert_eq!(buf.len(), HEADER_SIZE + self.payload.len());
        Ok(buf.freeze())
    }

    /// Parse a datagram. Bytes past the declared payload are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < HEADER_SIZE {
            return Err(WireError::PacketTooSmall {
                len: data.len(),
                needed: HEADER_SIZE,
            });
        }

        let op_code = data[offsets::OP];
        let op = OpType::from_u8(op_code).ok_or(WireError::UnknownOperation(op_code))?;

        let mut args = [0u8; ARGS_LEN];
        args.copy_from_slice(&data[offsets::ARGS..offsets::ARGS + ARGS_LEN]);

        let field = &data[offsets::REPLY_TO..offsets::REPLY_TO + MAX_REPLY_TO];
        let end = field.iter().position(|&b| b == 0).unwrap_or(MAX_REPLY_TO);
        let reply_to = std::str::from_utf8(&field[..end])
            .map_err(|e| WireError::InvalidReplyTo(e.to_string()))?
            .to_string();

        let declared =
            u16::from_be_bytes([data[offsets::LENGTH], data[offsets::LENGTH + 1]]) as usize;
        let available = data.len() - HEADER_SIZE;
        if available < declared {
            return Err(WireError::Truncated {
                declared,
                available,
            });
        }

        Ok(Self {
            version: data[offsets::VERSION],
            op,
            subop: data[offsets::SUBOP],
            args,
            reply_to,
            payload: Bytes::copy_from_slice(&data[HEADER_SIZE..HEADER_SIZE + declared]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_layout() {
        let msg = Message::new(OpType::Store, subop::store::PUT, "node1")
            .with_request_id(0x0102_0304_0506_0708)
            .with_payload(&b"abc"[..]);
        let bytes = msg.encode().unwrap();

        assert_eq!(bytes.len(), HEADER_SIZE + 3);
        assert_eq!(bytes[0], PROTOCOL_VERSION);
        assert_eq!(bytes[1], 3);
        assert_eq!(bytes[2], subop::store::PUT);
        assert_eq!(bytes[3], 0);
        assert_eq!(&bytes[4..12], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(bytes[12..36].iter().all(|&b| b == 0));
        assert_eq!(&bytes[36..41], b"node1");
        assert!(bytes[41..292].iter().all(|&b| b == 0));
        assert_eq!(&bytes[292..294], &[0, 3]);
        assert_eq!(&bytes[294..], b"abc");
    }

    #[test]
    fn test_roundtrip() {
        let msg = Message::new(OpType::Load, subop::load::NACK, "some-peer")
            .with_request_id(42)
            .with_payload(vec![7u8; 100]);
        let decoded = Message::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.request_id(), 42);
    }

    #[test]
    fn test_undersized_rejected() {
        let bytes = Message::new(OpType::Ping, subop::ping::PING, "a")
            .encode()
            .unwrap();
        assert_eq!(
            Message::decode(&bytes[..HEADER_SIZE - 1]),
            Err(WireError::PacketTooSmall {
                len: HEADER_SIZE - 1,
                needed: HEADER_SIZE
            })
        );
        assert!(Message::decode(&[]).is_err());
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let bytes = Message::new(OpType::Store, subop::store::PUT, "a")
            .with_payload(vec![1u8; 10])
            .encode()
            .unwrap();
        assert_eq!(
            Message::decode(&bytes[..HEADER_SIZE + 4]),
            Err(WireError::Truncated {
                declared: 10,
                available: 4
            })
        );
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let msg = Message::new(OpType::Ping, subop::ping::PONG, "b").with_payload(&b"xy"[..]);
        let mut bytes = msg.encode().unwrap().to_vec();
        bytes.extend_from_slice(b"garbage");
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let mut bytes = Message::new(OpType::Noop, 0, "a").encode().unwrap().to_vec();
        bytes[1] = JOIN_RESERVED;
        assert_eq!(
            Message::decode(&bytes),
            Err(WireError::UnknownOperation(JOIN_RESERVED))
        );
    }

    #[test]
    fn test_reply_to_limits() {
        let long = "x".repeat(MAX_REPLY_TO + 1);
        assert!(matches!(
            Message::new(OpType::Ping, 0, long).encode(),
            Err(WireError::ReplyToTooLong { .. })
        ));

        let exact = "y".repeat(MAX_REPLY_TO);
        let msg = Message::new(OpType::Ping, 0, exact);
        assert_eq!(Message::decode(&msg.encode().unwrap()).unwrap(), msg);

        assert!(matches!(
            Message::new(OpType::Ping, 0, "a\0b").encode(),
            Err(WireError::InvalidReplyTo(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_reply_to() {
        let mut bytes = Message::new(OpType::Ping, 0, "ab").encode().unwrap().to_vec();
        bytes[36] = 0xFF;
        assert!(matches!(
            Message::decode(&bytes),
            Err(WireError::InvalidReplyTo(_))
        ));
    }

    #[test]
    fn test_payload_limit() {
        let msg = Message::new(OpType::Store, 0, "a").with_payload(vec![0u8; MAX_PAYLOAD + 1]);
        assert!(matches!(
            msg.encode(),
            Err(WireError::PayloadTooLarge { .. })
        ));

        let msg = Message::new(OpType::Store, 0, "a").with_payload(vec![0u8; MAX_PAYLOAD]);
        assert_eq!(msg.encode().unwrap().len(), 0xFFFF);
    }

    #[test]
    fn test_reply_echoes_args() {
        let request = Message::new(OpType::Load, subop::load::GET, "asker").with_request_id(99);
        let reply = request.reply(subop::load::ACK, "answerer");
        assert_eq!(reply.args, request.args);
        assert_eq!(reply.op, OpType::Load);
        assert_eq!(reply.reply_to, "answerer");
    }

    #[test]
    fn test_version_survives_roundtrip() {
        let msg = Message::new(OpType::Ping, subop::ping::PING, "a").with_version(7);
        let bytes = msg.encode().unwrap();

        assert_eq!(bytes[0], 7);
        assert_eq!(Message::decode(&bytes).unwrap().version, 7);
        assert_eq!(msg.reply(subop::ping::PONG, "b").version, 7);
    }

    fn arb_op() -> impl Strategy<Value = OpType> {
        prop_oneof![
            Just(OpType::Noop),
            Just(OpType::Ping),
            Just(OpType::Store),
            Just(OpType::Load)
        ]
    }

    proptest! {
        #[test]
        fn prop_roundtrip(
            op in arb_op(),
            subop in any::<u8>(),
            args in any::<[u8; ARGS_LEN]>(),
            reply_to in "[a-z0-9:.-]{0,64}",
            payload in proptest::collection::vec(any::<u8>(), 0..2048)
        ) {
            let msg = Message::new(op, subop, reply_to)
                .with_args(args)
                .with_payload(payload);
            let bytes = msg.encode().unwrap();
            prop_assert_eq!(bytes.len(), HEADER_SIZE + msg.payload.len());
            prop_assert_eq!(Message::decode(&bytes).unwrap(), msg);
        }

        #[test]
        fn prop_short_packets_rejected(data in proptest::collection::vec(any::<u8>(), 0..HEADER_SIZE)) {
            let rejected = matches!(
                Message::decode(&data),
                Err(WireError::PacketTooSmall { .. })
            );
            prop_assert!(rejected);
        }
    }
}

//! Golden wire vectors.
//!
//! Each vector pairs a message with the bytes every implementation must put
//! on the wire for it. [`expected_bytes`] lays the datagram out field by
//! field at fixed offsets, independently of [`Message::encode`].

use ringstore_core::{subop, Message, OpType, HEADER_SIZE, PROTOCOL_VERSION};

/// A wire test vector.
#[derive(Debug, Clone)]
pub struct WireVector {
    pub name: &'static str,
    pub op: OpType,
    pub subop: u8,
    pub request_id: u64,
    pub reply_to: &'static str,
    pub payload: &'static [u8],
    /// Hex of the first twelve bytes: version, op, subop, pad, request id.
    pub expected_prefix: &'static str,
}

/// All wire vectors.
pub fn all_vectors() -> Vec<WireVector> {
    vec![
        WireVector {
            name: "ping_request",
            op: OpType::Ping,
            subop: subop::ping::PING,
            request_id: 1,
            reply_to: "node1",
            payload: b"",
            expected_prefix: "010100000000000000000001",
        },
        WireVector {
            name: "pong_reply",
            op: OpType::Ping,
            subop: subop::ping::PONG,
            request_id: 1,
            reply_to: "node2",
            payload: b"",
            expected_prefix: "010101000000000000000001",
        },
        WireVector {
            name: "store_put",
            op: OpType::Store,
            subop: subop::store::PUT,
            request_id: 0x0102_0304_0506_0708,
            reply_to: "node1",
            payload: b"hello",
            expected_prefix: "010300000102030405060708",
        },
        WireVector {
            name: "load_nack_max_id",
            op: OpType::Load,
            subop: subop::load::NACK,
            request_id: u64::MAX,
            reply_to: "node3",
            payload: b"",
            expected_prefix: "01040200ffffffffffffffff",
        },
        WireVector {
            name: "noop_anonymous",
            op: OpType::Noop,
            subop: 0,
            request_id: 0,
            reply_to: "",
            payload: b"\x00\x01\x02",
            expected_prefix: "010000000000000000000000",
        },
    ]
}

/// Build the message a vector describes.
pub fn message_from_vector(vector: &WireVector) -> Message {
    Message::new(vector.op, vector.subop, vector.reply_to)
        .with_request_id(vector.request_id)
        .with_payload(vector.payload)
}

/// The datagram a vector must encode to.
pub fn expected_bytes(vector: &WireVector) -> Vec<u8> {
    let mut out = vec![0u8; HEADER_SIZE + vector.payload.len()];
    out[0] = PROTOCOL_VERSION;
    out[1] = vector.op.to_u8();
    out[2] = vector.subop;
    out[4..12].copy_from_slice(&vector.request_id.to_be_bytes());
    out[36..36 + vector.reply_to.len()].copy_from_slice(vector.reply_to.as_bytes());
    out[292..294].copy_from_slice(&(vector.payload.len() as u16).to_be_bytes());
    out[294..].copy_from_slice(vector.payload);
    out
}

/// Encode every vector and compare against its expected bytes.
///
/// Returns `(name, matches, hex of the encoding)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| match message_from_vector(v).encode() {
            Ok(encoded) => {
                let matches = encoded[..] == expected_bytes(v)[..]
                    && hex::encode(&encoded[..12]) == v.expected_prefix;
                (v.name.to_string(), matches, hex::encode(&encoded))
            }
            Err(e) => (v.name.to_string(), false, e.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, hex) in verify_all_vectors() {
            assert!(matches, "vector '{}' encoded as {}", name, hex);
        }
    }

    #[test]
    fn test_vectors_decode_back() {
        for vector in all_vectors() {
            let decoded = Message::decode(&expected_bytes(&vector)).unwrap();

            assert_eq!(decoded, message_from_vector(&vector), "vector '{}'", vector.name);
            assert_eq!(decoded.request_id(), vector.request_id);
        }
    }

    #[test]
    fn test_prefixes_agree_with_layout() {
        for vector in all_vectors() {
            let bytes = expected_bytes(&vector);
            assert_eq!(hex::encode(&bytes[..12]), vector.expected_prefix, "vector '{}'", vector.name);
        }
    }

    #[test]
    fn test_vector_names_unique() {
        let mut names: Vec<_> = all_vectors().iter().map(|v| v.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all_vectors().len());
    }
}

//! Proptest generators for property-based testing.

use std::net::{Ipv4Addr, SocketAddr};

use bytes::Bytes;
use proptest::prelude::*;
use ringstore_core::message::ARGS_LEN;
use ringstore_core::{
    subop, ConsistencyLevel, KeyValue, Message, OpType, Peer, PeerSet, RingHash, MAX_REPLY_TO,
};

/// Generate an arbitrary operation type.
pub fn op_type() -> impl Strategy<Value = OpType> {
    prop_oneof![
        Just(OpType::Noop),
        Just(OpType::Ping),
        Just(OpType::Store),
        Just(OpType::Load),
    ]
}

/// Generate a sub-operation code that is meaningful for `op`.
pub fn subop_for(op: OpType) -> BoxedStrategy<u8> {
    match op {
        OpType::Noop => Just(0u8).boxed(),
        OpType::Ping => prop_oneof![Just(subop::ping::PING), Just(subop::ping::PONG)].boxed(),
        OpType::Store => prop_oneof![Just(subop::store::PUT), Just(subop::store::ACK)].boxed(),
        OpType::Load => prop_oneof![
            Just(subop::load::GET),
            Just(subop::load::ACK),
            Just(subop::load::NACK)
        ]
        .boxed(),
    }
}

/// Generate an arbitrary consistency level.
pub fn consistency_level() -> impl Strategy<Value = ConsistencyLevel> {
    prop_oneof![
        Just(ConsistencyLevel::Zero),
        Just(ConsistencyLevel::One),
        Just(ConsistencyLevel::Two),
        Just(ConsistencyLevel::Three),
        Just(ConsistencyLevel::Quorum),
        Just(ConsistencyLevel::All),
    ]
}

/// Generate an arbitrary ring position.
pub fn ring_hash() -> impl Strategy<Value = RingHash> {
    any::<u128>().prop_map(RingHash)
}

/// Generate a peer name usable as a reply-to identity.
pub fn peer_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}"
}

/// Generate a reply-to string up to the wire limit, without NUL bytes.
pub fn reply_to() -> impl Strategy<Value = String> {
    proptest::collection::vec(1u8..=0x7F, 0..=MAX_REPLY_TO)
        .prop_map(|bytes| bytes.into_iter().map(char::from).collect())
}

/// Generate a payload of up to `max_len` bytes.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a key/value envelope.
pub fn key_value() -> impl Strategy<Value = KeyValue> {
    (payload(64), payload(512))
        .prop_map(|(key, value)| KeyValue::new(Bytes::from(key), Bytes::from(value)))
}

/// Generate a peer set of 1 to `max_peers` members with distinct names.
pub fn peer_set(max_peers: usize) -> impl Strategy<Value = PeerSet> {
    (1..=max_peers, 1u32..=16).prop_map(|(count, partitions)| {
        (0..count)
            .map(|index| {
                let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 9991 + index as u16));
                Peer::new(format!("node{}", index + 1), addr).with_partitions(partitions)
            })
            .collect()
    })
}

/// Parameters for generating a wire message.
#[derive(Debug, Clone)]
pub struct MessageParams {
    pub op: OpType,
    pub subop: u8,
    pub args: [u8; ARGS_LEN],
    pub reply_to: String,
    pub payload: Vec<u8>,
}

impl Arbitrary for MessageParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        op_type()
            .prop_flat_map(|op| {
                (
                    Just(op),
                    subop_for(op),
                    any::<[u8; ARGS_LEN]>(),
                    reply_to(),
                    payload(2048),
                )
            })
            .prop_map(|(op, subop, args, reply_to, payload)| MessageParams {
                op,
                subop,
                args,
                reply_to,
                payload,
            })
            .boxed()
    }
}

/// Build a message from parameters.
pub fn message_from_params(params: &MessageParams) -> Message {
    Message::new(params.op, params.subop, params.reply_to.clone())
        .with_args(params.args)
        .with_payload(params.payload.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringstore_core::{Ring, HEADER_SIZE};

    proptest! {
        #[test]
        fn test_message_roundtrip(params: MessageParams) {
            let message = message_from_params(&params);
            let encoded = message.encode().unwrap();

            prop_assert_eq!(encoded.len(), HEADER_SIZE + params.payload.len());
            prop_assert_eq!(Message::decode(&encoded).unwrap(), message);
        }

        #[test]
        fn test_reply_keeps_request_id(params: MessageParams, id in any::<u64>()) {
            let request = message_from_params(&params).with_request_id(id);
            let reply = request.reply(params.subop, "replica");

            prop_assert_eq!(reply.request_id(), id);
            prop_assert!(reply.payload.is_empty());
        }

        #[test]
        fn test_hash_nodes_distinct_and_led_by_primary(
            peers in peer_set(6),
            key in ring_hash(),
            level in consistency_level()
        ) {
            let ring = Ring::build(&peers).unwrap();
            let copies = level.adjusted(peers.len()).copies(peers.len());
            let nodes = ring.hash_nodes(key, copies).unwrap();

            prop_assert_eq!(nodes.len(), copies.min(peers.len()));
            if let Some(first) = nodes.first() {
                prop_assert_eq!(first, &ring.primary(key).unwrap());
            }
            let mut names: Vec<_> = nodes.iter().map(|p| p.name.clone()).collect();
            names.sort();
            names.dedup();
            prop_assert_eq!(names.len(), nodes.len());
        }

        #[test]
        fn test_envelope_roundtrip(kv in key_value()) {
            let decoded = KeyValue::decode(&kv.encode().unwrap()).unwrap();
            prop_assert_eq!(decoded, kv);
        }
    }
}

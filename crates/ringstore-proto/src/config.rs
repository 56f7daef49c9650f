//! Protocol tuning knobs.

use std::time::Duration;

use ringstore_core::PROTOCOL_VERSION;

/// Configuration shared by every protocol instance on a node.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Version written into outgoing messages and required on incoming ones.
    pub protocol_version: u8,
    /// How long a ping waits for its pong.
    pub ping_timeout: Duration,
    /// How long a store or load waits for acknowledgements.
    pub ack_timeout: Duration,
    /// Largest value a client may store.
    pub max_value_size: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            ping_timeout: Duration::from_millis(500),
            ack_timeout: Duration::from_secs(1),
            max_value_size: 1024,
        }
    }
}

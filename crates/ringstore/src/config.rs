//! Node configuration.

use ringstore_core::{DEFAULT_PARTITIONS, MAX_PAYLOAD, MAX_REPLY_TO};
use ringstore_proto::ProtocolConfig;

use crate::error::{NodeError, Result};

/// Room left in a payload for the key and envelope framing.
pub const ENVELOPE_RESERVE: usize = 1024;

/// Configuration for blob paging.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Bytes per page. Each page is stored as one value.
    pub page_size: usize,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self { page_size: 512 }
    }
}

/// Configuration for a node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Member name; must match the name other peers know this node by.
    pub name: String,
    /// Ring positions this node owns.
    pub partitions: u32,
    /// Protocol configuration.
    pub protocol: ProtocolConfig,
    /// Blob configuration.
    pub blob: BlobConfig,
}

impl NodeConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partitions: DEFAULT_PARTITIONS,
            protocol: ProtocolConfig::default(),
            blob: BlobConfig::default(),
        }
    }

    /// Check that the settings can work together.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(NodeError::InvalidConfig("name is empty".into()));
        }
        if self.name.len() > MAX_REPLY_TO || self.name.contains('\0') {
            return Err(NodeError::InvalidConfig(format!(
                "name must be at most {} bytes without NUL",
                MAX_REPLY_TO
            )));
        }
        if self.partitions == 0 {
            return Err(NodeError::InvalidConfig("partitions must be positive".into()));
        }
        if self.protocol.max_value_size + ENVELOPE_RESERVE > MAX_PAYLOAD {
            return Err(NodeError::InvalidConfig(format!(
                "max_value_size {} leaves no room for the envelope in a {} byte payload",
                self.protocol.max_value_size, MAX_PAYLOAD
            )));
        }
        if self.blob.page_size == 0 || self.blob.page_size > self.protocol.max_value_size {
            return Err(NodeError::InvalidConfig(format!(
                "page_size {} must be between 1 and max_value_size {}",
                self.blob.page_size, self.protocol.max_value_size
            )));
        }
        Ok(())
    }
}

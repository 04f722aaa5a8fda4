//! Stream-level types: the ON/OFF gate flag and raw transport records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Config store key holding the producer's ON/OFF flag.
pub const STREAM_STATUS_KEY: &str = "stream_status";

/// Process-wide producer gate.
///
/// `Off` is the default: an absent or unrecognised value keeps the
/// producer idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamStatus {
    On,
    #[default]
    Off,
}

impl StreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }

    /// Parse a stored flag value. Anything other than `"ON"` reads as `Off`.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("ON") => Self::On,
            _ => Self::Off,
        }
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A record as delivered by the stream transport.
///
/// `data` holds the UTF-8 JSON encoding of a `VitalMessage`. Records with
/// the same `partition_key` are delivered in `sequence_number` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub partition_key: String,
    pub sequence_number: u64,
    pub data: Vec<u8>,
}

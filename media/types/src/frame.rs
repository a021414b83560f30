/*!
    Per-frame timing context and the metadata channel envelope.
*/

use std::time::Duration;

use serde::Serialize;

/// Label of the data channel stream descriptors are announced on.
pub const METADATA_CHANNEL_ID: &str = "metadata";

/**
    Timing attached to every dispatched frame.

    Live containers often omit per-packet durations, so `duration` is
    synthesized by the dispatcher rather than read from the demuxer.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaFrameContext {
    /// Presentation timestamp, in the emitting context's timebase.
    pub pts: i64,
    /// Decoding timestamp, in the emitting context's timebase.
    pub dts: i64,
    /// Synthesized frame duration.
    pub duration: Duration,
}

/**
    Kinds of messages sent over the metadata channel.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Metadata,
}

/**
    The envelope the signaling layer forwards to the browser.
*/
#[derive(Clone, Debug, Serialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub message: String,
}

impl Message {
    /**
        Wrap an already-serialized payload as a metadata message.
    */
    pub fn metadata(message: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Metadata,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_message_serializes_with_type_tag() {
        let msg = Message::metadata("{\"codec\":\"h264\"}");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.starts_with("{\"type\":\"metadata\""));
    }
}

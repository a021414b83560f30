/*!
    Contracts with the out-of-scope collaborators.

    The WebRTC peer machinery and the HTTP signaling surface live outside
    this crate family; these traits name exactly what the gateway expects
    of them.
*/

use std::time::Duration;

use media_types::{Message, Result, StreamDescriptor};

/**
    Where dispatched frames end up.

    Implemented over the WebRTC track pair. Called from the ingest task;
    a blocking implementation propagates back-pressure to the network
    read, which is intended. Payload slices must be copied if retained
    beyond the call.
*/
pub trait WebRtcTrackSink: Send + Sync {
    fn write_video_sample(&self, payload: &[u8], duration: Duration) -> Result<()>;
    fn write_audio_sample(&self, payload: &[u8], duration: Duration) -> Result<()>;
    fn send_metadata(&self, json: &str) -> Result<()>;
}

/**
    Peer-connection lifecycle hooks the gateway drives.
*/
pub trait PeerLifecycle: Send + Sync {
    /**
        Invoked once when a session exits, fatally or not.
    */
    fn on_close(&self);
}

/**
    The metadata-channel announcement for one discovered stream.

    Returns None only if serialization fails, which would be a bug in the
    descriptor types rather than a runtime condition.
*/
pub fn stream_announcement(descriptor: &StreamDescriptor) -> Option<String> {
    let payload = serde_json::to_string(descriptor).ok()?;
    serde_json::to_string(&Message::metadata(payload)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_types::{Codec, MediaType};

    #[test]
    fn announcement_nests_the_descriptor_as_metadata() {
        let descriptor = StreamDescriptor {
            id: 256,
            index: 0,
            media: MediaType::Video,
            codec: Codec::H264,
        };

        let json = stream_announcement(&descriptor).unwrap();
        assert!(json.contains("\"type\":\"metadata\""));
        assert!(json.contains("h264"));
    }
}

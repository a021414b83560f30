/*!
    Stream description types.

    Both the prober (looking at the upstream feed) and the SDP inspection
    (looking at the client offer) describe what they found with these types;
    the planner compares the two sides.
*/

use serde::Serialize;

/**
    Compressed media codecs the gateway can encounter.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Codec {
    H264,
    H265,
    Vp8,
    Vp9,
    Av1,
    Aac,
    Opus,
    /// Anything the gateway does not recognize.
    Unknown,
}

impl Codec {
    /**
        Returns true for video codecs.
    */
    pub const fn is_video(self) -> bool {
        matches!(
            self,
            Self::H264 | Self::H265 | Self::Vp8 | Self::Vp9 | Self::Av1
        )
    }

    /**
        Returns true for audio codecs.
    */
    pub const fn is_audio(self) -> bool {
        matches!(self, Self::Aac | Self::Opus)
    }
}

/**
    The broad media class of a stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
}

/**
    One audio or video stream, as seen by either side of the session.

    Serializes to the JSON announced to the browser over the metadata
    channel.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StreamDescriptor {
    /// Container-level stream id (PID for MPEG-TS).
    pub id: u16,
    /// Demuxer stream index.
    pub index: u16,
    /// Video or audio.
    pub media: MediaType,
    /// Compressed codec carried by the stream.
    pub codec: Codec,
}

/**
    The set of streams one side of the session offers.
*/
#[derive(Clone, Debug, Default)]
pub struct StreamInfo {
    pub streams: Vec<StreamDescriptor>,
}

impl StreamInfo {
    /**
        The video streams, in discovery order.
    */
    pub fn video_streams(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams
            .iter()
            .filter(|s| s.media == MediaType::Video)
    }

    /**
        The audio streams, in discovery order.
    */
    pub fn audio_streams(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams
            .iter()
            .filter(|s| s.media == MediaType::Audio)
    }

    /**
        True when any stream advertises the given codec.
    */
    pub fn has_codec(&self, codec: Codec) -> bool {
        self.streams.iter().any(|s| s.codec == codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(index: u16, media: MediaType, codec: Codec) -> StreamDescriptor {
        StreamDescriptor {
            id: index + 256,
            index,
            media,
            codec,
        }
    }

    #[test]
    fn stream_info_partitions_by_media_type() {
        let info = StreamInfo {
            streams: vec![
                descriptor(0, MediaType::Video, Codec::H264),
                descriptor(1, MediaType::Audio, Codec::Aac),
                descriptor(2, MediaType::Audio, Codec::Opus),
            ],
        };

        assert_eq!(info.video_streams().count(), 1);
        assert_eq!(info.audio_streams().count(), 2);
        assert!(info.has_codec(Codec::H264));
        assert!(!info.has_codec(Codec::Vp9));
    }

    #[test]
    fn descriptor_serializes_lowercase() {
        let st = descriptor(0, MediaType::Video, Codec::H264);
        let json = serde_json::to_string(&st).unwrap();
        assert!(json.contains("\"media\":\"video\""));
        assert!(json.contains("\"codec\":\"h264\""));
    }
}

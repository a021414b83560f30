/*!
    RTP packaging for the WebRTC track layer.

    Sequence numbers and SSRC stay zero: the track writer downstream
    rewrites them per receiver. Only the payload type and timestamp are
    meaningful here.
*/

use bytes::Bytes;
use webrtc::rtp::{header::Header, packet::Packet as RtpPacket};
use webrtc::util::Marshal;

use media_types::{Error, Result};

/// Dynamic payload type the gateway uses for video.
pub const VIDEO_PAYLOAD_TYPE: u8 = 96;
/// Dynamic payload type the gateway uses for Opus audio.
pub const AUDIO_PAYLOAD_TYPE: u8 = 111;

/**
    Wrap an encoded payload in an RTP packet and marshal it to wire form.

    `timestamp` is the encoder PTS rescaled to the encoder timebase,
    truncated to the 32-bit RTP clock.
*/
pub fn packetize(payload: &[u8], payload_type: u8, timestamp: u32) -> Result<Bytes> {
    let packet = RtpPacket {
        header: Header {
            version: 2,
            payload_type,
            timestamp,
            ..Default::default()
        },
        payload: Bytes::copy_from_slice(payload),
    };

    packet
        .marshal()
        .map_err(|e| Error::RtpMarshalFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use webrtc::rtp::packet::Packet as RtpPacket;
    use webrtc::util::Unmarshal;

    #[test]
    fn packetize_round_trips_header_and_payload() {
        let payload = [0x00, 0x00, 0x00, 0x01, 0x65, 0x88];
        let wire = packetize(&payload, VIDEO_PAYLOAD_TYPE, 90_000).unwrap();

        let mut buf = wire.clone();
        let parsed = RtpPacket::unmarshal(&mut buf).unwrap();
        assert_eq!(parsed.header.version, 2);
        assert_eq!(parsed.header.payload_type, VIDEO_PAYLOAD_TYPE);
        assert_eq!(parsed.header.timestamp, 90_000);
        assert_eq!(parsed.header.sequence_number, 0);
        assert_eq!(parsed.header.ssrc, 0);
        assert_eq!(parsed.payload.as_ref(), payload);
    }

    #[test]
    fn audio_uses_the_opus_payload_type() {
        let wire = packetize(&[0xfc], AUDIO_PAYLOAD_TYPE, 960).unwrap();
        let mut buf = wire.clone();
        let parsed = RtpPacket::unmarshal(&mut buf).unwrap();
        assert_eq!(parsed.header.payload_type, AUDIO_PAYLOAD_TYPE);
    }
}

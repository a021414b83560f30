/*!
    Client offer inspection.

    The browser's SDP offer is unmarshalled and reduced to the same
    [`StreamInfo`] shape the prober produces for the upstream feed, so
    the planner can compare both sides. Only the rtpmap codec names
    matter here; directions and fmtp details are ignored.
*/

use std::io::Cursor;

use webrtc::sdp::description::session::SessionDescription;

use media_types::{Codec, Error, MediaType, Result, StreamDescriptor, StreamInfo};

/**
    Reduce an SDP offer to the receivers it advertises.

    Each rtpmap entry becomes one descriptor; the payload type number is
    kept as the descriptor id.
*/
pub fn stream_info_from_offer(offer: &str) -> Result<StreamInfo> {
    if offer.trim().is_empty() {
        return Err(Error::MissingRequestParams);
    }

    let mut cursor = Cursor::new(offer.as_bytes());
    let description = SessionDescription::unmarshal(&mut cursor)
        .map_err(|_| Error::NoCompatibleStreams)?;

    let mut streams = Vec::new();
    for media in &description.media_descriptions {
        let Some(media_type) = media_type_from_name(&media.media_name.media) else {
            continue;
        };

        for attribute in &media.attributes {
            if attribute.key != "rtpmap" {
                continue;
            }
            let Some(value) = attribute.value.as_deref() else {
                continue;
            };
            let Some((payload_type, codec)) = parse_rtpmap(value) else {
                continue;
            };

            streams.push(StreamDescriptor {
                id: payload_type,
                index: streams.len() as u16,
                media: media_type,
                codec,
            });
        }
    }

    Ok(StreamInfo { streams })
}

fn media_type_from_name(name: &str) -> Option<MediaType> {
    match name {
        "video" => Some(MediaType::Video),
        "audio" => Some(MediaType::Audio),
        _ => None,
    }
}

/// An rtpmap value reads `<payload type> <codec>/<clock>[/<channels>]`.
fn parse_rtpmap(value: &str) -> Option<(u16, Codec)> {
    let (payload_type, encoding) = value.split_once(' ')?;
    let payload_type = payload_type.parse().ok()?;
    let name = encoding.split('/').next()?;
    Some((payload_type, codec_from_name(name)))
}

fn codec_from_name(name: &str) -> Codec {
    match name.to_lowercase().as_str() {
        "h264" => Codec::H264,
        "h265" | "hevc" => Codec::H265,
        "vp8" => Codec::Vp8,
        "vp9" => Codec::Vp9,
        "av1" => Codec::Av1,
        "aac" => Codec::Aac,
        "opus" => Codec::Opus,
        _ => Codec::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFER: &str = "v=0\r\n\
o=- 4611731400430051336 2 IN IP4 127.0.0.1\r\n\
s=-\r\n\
t=0 0\r\n\
a=group:BUNDLE 0 1\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96 98\r\n\
c=IN IP4 0.0.0.0\r\n\
a=mid:0\r\n\
a=recvonly\r\n\
a=rtpmap:96 H264/90000\r\n\
a=rtpmap:98 VP8/90000\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
c=IN IP4 0.0.0.0\r\n\
a=mid:1\r\n\
a=recvonly\r\n\
a=rtpmap:111 opus/48000/2\r\n";

    #[test]
    fn offer_reduces_to_advertised_receivers() {
        let info = stream_info_from_offer(OFFER).unwrap();

        let video: Vec<_> = info.video_streams().collect();
        assert_eq!(video.len(), 2);
        assert_eq!(video[0].codec, Codec::H264);
        assert_eq!(video[0].id, 96);
        assert_eq!(video[1].codec, Codec::Vp8);

        let audio: Vec<_> = info.audio_streams().collect();
        assert_eq!(audio.len(), 1);
        assert_eq!(audio[0].codec, Codec::Opus);
        assert_eq!(audio[0].id, 111);
    }

    #[test]
    fn empty_offer_is_a_missing_parameter() {
        assert!(matches!(
            stream_info_from_offer("  "),
            Err(Error::MissingRequestParams)
        ));
    }

    #[test]
    fn unknown_codecs_are_kept_as_unknown() {
        let offer = OFFER.replace("opus/48000/2", "G722/8000");
        let info = stream_info_from_offer(&offer).unwrap();
        let audio: Vec<_> = info.audio_streams().collect();
        assert_eq!(audio[0].codec, Codec::Unknown);
    }

    #[test]
    fn rtpmap_parser_handles_missing_fields() {
        assert!(parse_rtpmap("111").is_none());
        assert!(parse_rtpmap("notanumber opus/48000").is_none());
        assert_eq!(parse_rtpmap("96 H264/90000"), Some((96, Codec::H264)));
    }
}

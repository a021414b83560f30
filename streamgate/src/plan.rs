/*!
    The recipe planner.

    Deterministic and codec-fixed: H.264 video is bypassed through the
    Annex-B reformat, audio is unconditionally transcoded to 48 kHz Opus.
    The client offer is consulted only as a receiver-presence check;
    fmtp-level negotiation is a future concern.
*/

use media_types::{
    Appetizer, BitstreamFilterName, Codec, CodecOption, Error, MediaTask, Recipe, Result,
    SampleFormat, StreamFilter, StreamInfo, TaskAction,
};

const OPUS_SAMPLE_RATE: u32 = 48_000;
const OPUS_BIT_RATE: usize = 128_000;

/**
    Build the session recipe from what both sides offer.

    Pure: equal inputs yield equal recipes.
*/
pub(crate) fn plan(
    appetizer: Appetizer,
    server: &StreamInfo,
    client: &StreamInfo,
) -> Result<Recipe> {
    if let Some(video) = server.video_streams().next() {
        if video.codec != Codec::H264 {
            return Err(Error::UnsupportedCodec(format!("{:?}", video.codec)));
        }
        if !client
            .video_streams()
            .any(|s| s.codec == Codec::H264)
        {
            return Err(Error::NoCompatibleStreams);
        }
    }

    if server.audio_streams().next().is_some()
        && !client.audio_streams().any(|s| s.codec == Codec::Opus)
    {
        return Err(Error::NoCompatibleStreams);
    }

    let video = MediaTask {
        action: TaskAction::Bypass,
        codec: Codec::H264,
        bitstream_filter: Some(BitstreamFilterName::H264Mp4ToAnnexB),
        stream_filter: None,
        codec_options: Vec::new(),
    };

    let audio = MediaTask {
        action: TaskAction::Transcode,
        codec: Codec::Opus,
        bitstream_filter: None,
        stream_filter: Some(StreamFilter::audio_resampler(OPUS_SAMPLE_RATE)),
        codec_options: vec![
            CodecOption::SampleRate(OPUS_SAMPLE_RATE),
            CodecOption::BitRate(OPUS_BIT_RATE),
            CodecOption::SampleFormat(SampleFormat::S16),
        ],
    };

    Ok(Recipe {
        input: appetizer,
        video,
        audio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_types::{ContainerFormat, MediaType, StreamDescriptor};
    use std::collections::BTreeMap;

    fn appetizer() -> Appetizer {
        Appetizer {
            url: "srt://host:40053".to_string(),
            format: ContainerFormat::MpegTs,
            options: BTreeMap::new(),
        }
    }

    fn info(streams: &[(MediaType, Codec)]) -> StreamInfo {
        StreamInfo {
            streams: streams
                .iter()
                .enumerate()
                .map(|(i, (media, codec))| StreamDescriptor {
                    id: i as u16,
                    index: i as u16,
                    media: *media,
                    codec: *codec,
                })
                .collect(),
        }
    }

    fn browser_offer() -> StreamInfo {
        info(&[
            (MediaType::Video, Codec::H264),
            (MediaType::Video, Codec::Vp8),
            (MediaType::Audio, Codec::Opus),
        ])
    }

    #[test]
    fn canonical_live_path_bypasses_video_and_transcodes_audio() {
        let server = info(&[(MediaType::Video, Codec::H264), (MediaType::Audio, Codec::Aac)]);
        let recipe = plan(appetizer(), &server, &browser_offer()).unwrap();

        assert_eq!(recipe.video.action, TaskAction::Bypass);
        assert_eq!(recipe.video.codec, Codec::H264);
        assert_eq!(
            recipe.video.bitstream_filter,
            Some(BitstreamFilterName::H264Mp4ToAnnexB)
        );

        assert_eq!(recipe.audio.action, TaskAction::Transcode);
        assert_eq!(recipe.audio.codec, Codec::Opus);
        assert_eq!(
            recipe.audio.stream_filter.as_ref().unwrap().0,
            "aresample=48000"
        );
        assert!(recipe
            .audio
            .codec_options
            .contains(&CodecOption::SampleRate(48_000)));
        assert!(recipe
            .audio
            .codec_options
            .contains(&CodecOption::BitRate(128_000)));
        assert!(recipe
            .audio
            .codec_options
            .contains(&CodecOption::SampleFormat(SampleFormat::S16)));
    }

    #[test]
    fn planning_is_pure() {
        let server = info(&[(MediaType::Video, Codec::H264), (MediaType::Audio, Codec::Aac)]);
        let a = plan(appetizer(), &server, &browser_offer()).unwrap();
        let b = plan(appetizer(), &server, &browser_offer()).unwrap();
        assert_eq!(a.video, b.video);
        assert_eq!(a.audio, b.audio);
        assert_eq!(a.input, b.input);
    }

    #[test]
    fn non_h264_video_is_rejected() {
        let server = info(&[(MediaType::Video, Codec::H265)]);
        assert!(matches!(
            plan(appetizer(), &server, &browser_offer()),
            Err(Error::UnsupportedCodec(_))
        ));
    }

    #[test]
    fn incompatible_offer_is_rejected() {
        let server = info(&[(MediaType::Video, Codec::H264), (MediaType::Audio, Codec::Aac)]);

        let no_video = info(&[(MediaType::Audio, Codec::Opus)]);
        assert!(matches!(
            plan(appetizer(), &server, &no_video),
            Err(Error::NoCompatibleStreams)
        ));

        let no_opus = info(&[(MediaType::Video, Codec::H264), (MediaType::Audio, Codec::Aac)]);
        assert!(matches!(
            plan(appetizer(), &server, &no_opus),
            Err(Error::NoCompatibleStreams)
        ));
    }

    #[test]
    fn audio_only_feeds_plan_without_video_checks() {
        let server = info(&[(MediaType::Audio, Codec::Aac)]);
        let client = info(&[(MediaType::Audio, Codec::Opus)]);
        let recipe = plan(appetizer(), &server, &client).unwrap();
        assert_eq!(recipe.audio.action, TaskAction::Transcode);
    }
}

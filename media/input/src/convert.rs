/*!
    Conversions between FFmpeg types and the gateway vocabulary.
*/

use ffmpeg_next::{codec, format::Stream, media};

use media_types::{Codec, Error, MediaType, Result, SampleFormat, StreamDescriptor};

/**
    Map an FFmpeg codec id onto the gateway's codec vocabulary.
*/
pub fn codec_from_id(id: codec::Id) -> Codec {
    match id {
        codec::Id::H264 => Codec::H264,
        codec::Id::HEVC => Codec::H265,
        codec::Id::VP8 => Codec::Vp8,
        codec::Id::VP9 => Codec::Vp9,
        codec::Id::AV1 => Codec::Av1,
        codec::Id::AAC => Codec::Aac,
        codec::Id::OPUS => Codec::Opus,
        _ => Codec::Unknown,
    }
}

/**
    The FFmpeg codec id an encoder is looked up by.

    Only the codecs the planner can target are mapped; anything else is
    a planning bug surfaced as `UnsupportedCodec`.
*/
pub fn encoder_id_for(codec: Codec) -> Result<codec::Id> {
    match codec {
        Codec::H264 => Ok(codec::Id::H264),
        Codec::Opus => Ok(codec::Id::OPUS),
        Codec::Aac => Ok(codec::Id::AAC),
        other => Err(Error::UnsupportedCodec(format!("{other:?}"))),
    }
}

/**
    The media class of an input stream, if it is one the gateway handles.
*/
pub fn media_type_of(stream: &Stream) -> Option<MediaType> {
    // SAFETY: the parameters pointer is owned by the stream, which the
    // caller borrows for the duration of the read.
    let medium = unsafe { media::Type::from((*stream.parameters().as_ptr()).codec_type) };
    match medium {
        media::Type::Video => Some(MediaType::Video),
        media::Type::Audio => Some(MediaType::Audio),
        _ => None,
    }
}

/**
    Describe an input stream, or None for media types the gateway skips.
*/
pub fn descriptor_for(stream: &Stream) -> Option<StreamDescriptor> {
    let media = media_type_of(stream)?;
    // SAFETY: the stream pointer stays valid for the borrow; the id
    // field is a plain int the demuxer filled in (the PID for MPEG-TS).
    let container_id = unsafe { (*stream.as_ptr()).id };
    Some(StreamDescriptor {
        id: container_id.max(0) as u16,
        index: stream.index() as u16,
        media,
        codec: codec_from_id(stream.parameters().id()),
    })
}

/**
    The FFmpeg sample format a codec option names.
*/
pub fn sample_format_to_ffmpeg(format: SampleFormat) -> ffmpeg_next::format::Sample {
    use ffmpeg_next::format::sample::Type;
    use ffmpeg_next::format::Sample;

    match format {
        SampleFormat::S16 => Sample::I16(Type::Packed),
        SampleFormat::F32 => Sample::F32(Type::Packed),
        SampleFormat::F32Planar => Sample::F32(Type::Planar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codec_ids_map_to_vocabulary() {
        assert_eq!(codec_from_id(codec::Id::H264), Codec::H264);
        assert_eq!(codec_from_id(codec::Id::AAC), Codec::Aac);
        assert_eq!(codec_from_id(codec::Id::MP3), Codec::Unknown);
    }

    #[test]
    fn encoder_lookup_rejects_unplannable_codecs() {
        assert!(encoder_id_for(Codec::Opus).is_ok());
        assert!(matches!(
            encoder_id_for(Codec::Vp9),
            Err(Error::UnsupportedCodec(_))
        ));
    }
}

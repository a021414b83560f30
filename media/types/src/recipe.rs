/*!
    Ingest descriptors and per-session treatment plans.

    A [`Recipe`] is built once per session by the planner and is immutable
    afterwards: it names the container input ([`Appetizer`]) and how each
    media class is treated ([`MediaTask`]).
*/

use std::collections::BTreeMap;
use std::fmt;

use crate::Codec;

/**
    Container formats the gateway ingests.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerFormat {
    /// MPEG transport stream, carried over SRT.
    MpegTs,
    /// FLV, carried over RTMP.
    Flv,
}

impl ContainerFormat {
    /**
        The demuxer name FFmpeg resolves this format by.
    */
    pub const fn demuxer_name(self) -> &'static str {
        match self {
            Self::MpegTs => "mpegts",
            Self::Flv => "flv",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.demuxer_name())
    }
}

/**
    Input options the gateway sets on the container opener.

    A closed set rather than free-form strings so callers cannot smuggle
    arbitrary AVOptions into the opener.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum InputOption {
    /// SRT stream id the listener accepts.
    SrtStreamId,
    /// SRT transmission type (`live`).
    SrtTranstype,
    /// SRT smoother (`live`).
    SrtSmoother,
    /// SRT connection latency, microseconds.
    SrtLatency,
    /// Listener / caller mode for SRT.
    Mode,
    /// RTMP live flag.
    RtmpLive,
    /// Probe size hint, bytes.
    ProbeSize,
}

impl InputOption {
    /**
        The AVOption key this maps to.
    */
    pub const fn key(self) -> &'static str {
        match self {
            Self::SrtStreamId => "srt_streamid",
            Self::SrtTranstype => "transtype",
            Self::SrtSmoother => "smoother",
            Self::SrtLatency => "latency",
            Self::Mode => "mode",
            Self::RtmpLive => "rtmp_live",
            Self::ProbeSize => "probesize",
        }
    }
}

/**
    The ingest descriptor: where to read from and how to open it.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Appetizer {
    /// Input URL. For SRT the opener rebinds this to listener form.
    pub url: String,
    /// Forced container format.
    pub format: ContainerFormat,
    /// Options applied to the opener, in key order.
    pub options: BTreeMap<InputOption, String>,
}

/**
    How a media class is treated by the session.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskAction {
    /// Demux and forward compressed frames, optionally reformatted.
    Bypass,
    /// Decode, run through a filter graph, re-encode.
    Transcode,
}

/**
    Packet-level reformatters applied without decoding.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitstreamFilterName {
    /// MP4-style AVCC H.264 to Annex-B byte stream.
    H264Mp4ToAnnexB,
}

impl BitstreamFilterName {
    pub const fn name(self) -> &'static str {
        match self {
            Self::H264Mp4ToAnnexB => "h264_mp4toannexb",
        }
    }
}

/**
    A filter-graph chain description, e.g. `aresample=48000`.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamFilter(pub String);

impl StreamFilter {
    /**
        The audio resampler chain for a target rate.
    */
    pub fn audio_resampler(sample_rate: u32) -> Self {
        Self(format!("aresample={sample_rate}"))
    }
}

impl fmt::Display for StreamFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/**
    Audio sample formats an encoder can be asked for.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SampleFormat {
    /// Signed 16-bit integer, packed.
    S16,
    /// 32-bit float, packed.
    F32,
    /// 32-bit float, planar.
    F32Planar,
}

/**
    Encoder context settings applied after FFmpeg defaults.

    Expressed as data so this crate carries no FFmpeg dependency; the
    ingest layer translates each value onto the native context right
    before the encoder opens. User options win over derived defaults.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecOption {
    SampleRate(u32),
    BitRate(usize),
    SampleFormat(SampleFormat),
    GopSize(u32),
}

/**
    A transformation template for one media class.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaTask {
    /// Bypass or transcode.
    pub action: TaskAction,
    /// Target codec. For bypass this names what is forwarded.
    pub codec: Codec,
    /// Packet-level reformatter, if the treatment needs one.
    pub bitstream_filter: Option<BitstreamFilterName>,
    /// Filter-graph chain for transcoded streams.
    pub stream_filter: Option<StreamFilter>,
    /// Encoder settings applied after defaults.
    pub codec_options: Vec<CodecOption>,
}

impl MediaTask {
    /**
        A bypass task with no reformatting.
    */
    pub fn bypass(codec: Codec) -> Self {
        Self {
            action: TaskAction::Bypass,
            codec,
            bitstream_filter: None,
            stream_filter: None,
            codec_options: Vec::new(),
        }
    }
}

/**
    The per-session plan: input plus one task per media class.
*/
#[derive(Clone, Debug)]
pub struct Recipe {
    pub input: Appetizer,
    pub video: MediaTask,
    pub audio: MediaTask,
}

impl Recipe {
    /**
        The task covering the given media type.
    */
    pub fn task_for(&self, media: crate::MediaType) -> &MediaTask {
        match media {
            crate::MediaType::Video => &self.video,
            crate::MediaType::Audio => &self.audio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resampler_filter_formats_rate() {
        assert_eq!(StreamFilter::audio_resampler(48000).0, "aresample=48000");
    }

    #[test]
    fn input_options_iterate_in_key_order() {
        let mut options = BTreeMap::new();
        options.insert(InputOption::SrtTranstype, "live".to_string());
        options.insert(InputOption::SrtStreamId, "abc".to_string());
        options.insert(InputOption::Mode, "listener".to_string());

        let keys: Vec<_> = options.keys().map(|k| k.key()).collect();
        assert_eq!(keys, ["srt_streamid", "transtype", "mode"]);
    }
}

/*!
    streamgate — a live media gateway.

    Ingests a broadcast-style feed over SRT (MPEG-TS) or RTMP (FLV) and
    re-emits it to browser viewers over WebRTC: H.264 video is bypassed
    through an Annex-B reformat, AAC audio is transcoded to 48 kHz Opus.

    The signaling layer asks [`Engines::engine_for`] for an [`Engine`],
    probes both sides, plans a [`Recipe`](media_types::Recipe), and runs
    the blocking streaming call on a dedicated task with its sinks wired
    to the WebRTC tracks. HTTP, peer connections and ICE live outside
    this crate; the [`contract`] module names what it expects of them.
*/

pub mod contract;
mod engine;
mod plan;
mod sdp;
pub mod track;

pub use engine::{Engine, Engines};
pub use sdp::stream_info_from_offer;

pub use media_ingest::{FfmpegStreamer, SessionParams, Streamer};
pub use media_input::{FfmpegProber, Prober};
pub use media_types::{
    Codec, Config, Error, MediaFrameContext, MediaType, Recipe, Request, Result, Shutdown,
    StreamDescriptor, StreamInfo,
};

/*!
    The ingest session.

    Owns the demuxer and the per-stream pipelines for one viewer session:
    compressed packets are read from the container, routed per the
    session's recipe — bypass through a bitstream filter, or decode →
    filter graph → encode — and handed to the frame dispatcher, which
    synthesizes timing and delivers payloads to the caller's sinks.

    The whole chain is single-task sequential; `stream` blocks until the
    feed ends, the shutdown token fires, or a fatal error surfaces.
*/

mod bsf;
mod dispatch;
mod filter;
mod params;
mod pipeline;
mod rtp;
mod session;
mod timing;

pub use params::{
    CloseSink, ErrorSink, FfmpegStreamer, FrameSink, SessionParams, StreamSink, Streamer,
};
pub use rtp::{AUDIO_PAYLOAD_TYPE, VIDEO_PAYLOAD_TYPE};

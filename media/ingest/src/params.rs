/*!
    The streaming call surface.

    Sinks are injected push-style: the session invokes them from its own
    task, one frame at a time. A sink that blocks propagates back-pressure
    all the way to the network read, which is the intended behavior.
    Payload slices are only valid for the duration of the callback; sinks
    must copy what they keep.
*/

use media_types::{Error, MediaFrameContext, Recipe, Request, Result, Shutdown, StreamDescriptor};

use crate::session;

/// Receives one dispatched frame payload with its timing.
pub type FrameSink = Box<dyn FnMut(&[u8], MediaFrameContext) -> Result<()> + Send>;
/// Receives each discovered stream, exactly once per stream.
pub type StreamSink = Box<dyn FnMut(&StreamDescriptor) -> Result<()> + Send>;
/// Receives the single fatal error of a failed session.
pub type ErrorSink = Box<dyn FnMut(&Error) + Send>;
/// Runs once when the session is over, on every exit path.
pub type CloseSink = Box<dyn FnOnce() + Send>;

/**
    Everything a streaming session needs: the plan, the shutdown token,
    and the caller's sinks.
*/
pub struct SessionParams {
    pub shutdown: Shutdown,
    pub recipe: Recipe,
    pub on_stream: Option<StreamSink>,
    pub on_video_frame: Option<FrameSink>,
    pub on_audio_frame: Option<FrameSink>,
    pub on_close: Option<CloseSink>,
    pub on_error: Option<ErrorSink>,
}

impl SessionParams {
    /**
        Parameters with no sinks attached.
    */
    pub fn new(shutdown: Shutdown, recipe: Recipe) -> Self {
        Self {
            shutdown,
            recipe,
            on_stream: None,
            on_video_frame: None,
            on_audio_frame: None,
            on_close: None,
            on_error: None,
        }
    }

    pub fn on_stream(mut self, sink: StreamSink) -> Self {
        self.on_stream = Some(sink);
        self
    }

    pub fn on_video_frame(mut self, sink: FrameSink) -> Self {
        self.on_video_frame = Some(sink);
        self
    }

    pub fn on_audio_frame(mut self, sink: FrameSink) -> Self {
        self.on_audio_frame = Some(sink);
        self
    }

    pub fn on_close(mut self, sink: CloseSink) -> Self {
        self.on_close = Some(sink);
        self
    }

    pub fn on_error(mut self, sink: ErrorSink) -> Self {
        self.on_error = Some(sink);
        self
    }
}

/**
    Runs ingest sessions for an ingress protocol.

    `stream` blocks for the lifetime of the session; callers run it on a
    dedicated blocking task.
*/
pub trait Streamer: Send + Sync {
    /**
        True when this streamer understands the request's ingress
        protocol.
    */
    fn matches(&self, request: &Request) -> bool;

    /**
        Run the session described by `params` to completion.
    */
    fn stream(&self, params: SessionParams);
}

/**
    The libav-backed streamer for SRT and RTMP feeds.
*/
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegStreamer;

impl FfmpegStreamer {
    pub fn new() -> Self {
        Self
    }
}

impl Streamer for FfmpegStreamer {
    fn matches(&self, request: &Request) -> bool {
        request.is_srt() || request.is_rtmp()
    }

    fn stream(&self, params: SessionParams) {
        session::run(params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> Request {
        Request {
            stream_url: url.to_string(),
            stream_id: "live".to_string(),
            offer_sdp: String::new(),
        }
    }

    #[test]
    fn streamer_matches_supported_protocols() {
        let streamer = FfmpegStreamer::new();
        assert!(streamer.matches(&request("srt://host:40053")));
        assert!(streamer.matches(&request("rtmp://host/app")));
        assert!(!streamer.matches(&request("http://host/index.m3u8")));
    }
}

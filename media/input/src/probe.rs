/*!
    Stream probing.
*/

use tracing::{debug, info};

use media_types::{Appetizer, Request, Result, StreamInfo};

use crate::convert::descriptor_for;
use crate::open::open_appetizer;

/**
    Discovers what an upstream feed carries.

    Probing is synchronous and best-effort; timeouts are the caller's
    responsibility. Implementations open the input with the same
    parameters the streamer will use so the discovered streams match what
    the session sees later.
*/
pub trait Prober: Send + Sync {
    /**
        True when this prober understands the request's ingress protocol.
    */
    fn matches(&self, request: &Request) -> bool;

    /**
        Open the input briefly and return its audio/video streams.
    */
    fn probe(&self, appetizer: &Appetizer) -> Result<StreamInfo>;
}

/**
    The libav-backed prober for SRT and RTMP feeds.
*/
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegProber;

impl FfmpegProber {
    pub fn new() -> Self {
        Self
    }
}

impl Prober for FfmpegProber {
    fn matches(&self, request: &Request) -> bool {
        request.is_srt() || request.is_rtmp()
    }

    fn probe(&self, appetizer: &Appetizer) -> Result<StreamInfo> {
        info!(
            "probing {} as {} with {} option(s)",
            appetizer.url,
            appetizer.format,
            appetizer.options.len()
        );

        let input = open_appetizer(appetizer)?;

        let mut streams = Vec::new();
        for stream in input.streams() {
            let Some(descriptor) = descriptor_for(&stream) else {
                debug!("skipping stream #{}: unhandled media type", stream.index());
                continue;
            };

            info!(
                "stream #{}: type={:?} codec={:?} timebase={} avg_frame_rate={}",
                stream.index(),
                descriptor.media,
                descriptor.codec,
                stream.time_base(),
                stream.avg_frame_rate(),
            );
            streams.push(descriptor);
        }

        // Dropping the input closes it; nothing persists between probes.
        Ok(StreamInfo { streams })
    }
}

/*!
    Engine selection and the per-request facade.
*/

use std::collections::BTreeMap;
use std::sync::Arc;

use media_ingest::{FfmpegStreamer, SessionParams, Streamer};
use media_input::{FfmpegProber, Prober};
use media_types::{
    Appetizer, Config, ContainerFormat, Error, InputOption, Recipe, Request, Result, StreamInfo,
};

use crate::plan;
use crate::sdp;

/**
    The registry of prober and streamer implementations.

    One per process. [`Engines::engine_for`] scans the registrations in
    order and hands back the first matching pair bound to the request.
*/
pub struct Engines {
    config: Config,
    probers: Vec<Arc<dyn Prober>>,
    streamers: Vec<Arc<dyn Streamer>>,
}

impl Engines {
    /**
        A registry with the built-in SRT/RTMP implementations.
    */
    pub fn new(config: Config) -> Self {
        Self {
            config,
            probers: vec![Arc::new(FfmpegProber::new())],
            streamers: vec![Arc::new(FfmpegStreamer::new())],
        }
    }

    /**
        A registry with no built-ins. Mostly useful in tests.
    */
    pub fn empty(config: Config) -> Self {
        Self {
            config,
            probers: Vec::new(),
            streamers: Vec::new(),
        }
    }

    pub fn register_prober(&mut self, prober: Arc<dyn Prober>) {
        self.probers.push(prober);
    }

    pub fn register_streamer(&mut self, streamer: Arc<dyn Streamer>) {
        self.streamers.push(streamer);
    }

    /**
        Validate the request and pick the implementations serving it.
    */
    pub fn engine_for(&self, request: &Request) -> Result<Engine> {
        request.validate()?;

        let prober = self
            .probers
            .iter()
            .find(|p| p.matches(request))
            .cloned()
            .ok_or(Error::NoProber)?;
        let streamer = self
            .streamers
            .iter()
            .find(|s| s.matches(request))
            .cloned()
            .ok_or(Error::NoStreamer)?;

        Ok(Engine {
            config: self.config.clone(),
            prober,
            streamer,
            request: request.clone(),
        })
    }
}

/**
    One request's view of the gateway.

    Owns the matched prober/streamer pair and builds the ingest
    descriptors for both probing and streaming.
*/
pub struct Engine {
    config: Config,
    prober: Arc<dyn Prober>,
    streamer: Arc<dyn Streamer>,
    request: Request,
}

impl Engine {
    /**
        The ingest descriptor the streaming session will open.
    */
    pub fn appetizer(&self) -> Result<Appetizer> {
        if self.request.is_rtmp() {
            let mut options = BTreeMap::new();
            options.insert(InputOption::RtmpLive, "live".to_string());
            return Ok(Appetizer {
                url: format!("{}/{}", self.request.stream_url, self.request.stream_id),
                format: ContainerFormat::Flv,
                options,
            });
        }

        if self.request.is_srt() {
            let mut options = BTreeMap::new();
            options.insert(InputOption::SrtStreamId, self.request.stream_id.clone());
            options.insert(InputOption::SrtTranstype, "live".to_string());
            options.insert(InputOption::SrtSmoother, "live".to_string());
            // libsrt takes latency in microseconds.
            options.insert(
                InputOption::SrtLatency,
                (u64::from(self.config.srt_connection_latency_ms) * 1000).to_string(),
            );
            return Ok(Appetizer {
                url: self.request.stream_url.clone(),
                format: ContainerFormat::MpegTs,
                options,
            });
        }

        Err(Error::UnsupportedStreamUrl)
    }

    /**
        The streams the upstream feed carries, freshly probed.
    */
    pub fn server_streams(&self) -> Result<StreamInfo> {
        let mut appetizer = self.appetizer()?;
        appetizer.options.insert(
            InputOption::ProbeSize,
            self.config.probe_size_bytes().to_string(),
        );
        self.prober.probe(&appetizer)
    }

    /**
        The receivers the client's offer advertises.
    */
    pub fn client_streams(&self) -> Result<StreamInfo> {
        sdp::stream_info_from_offer(&self.request.offer_sdp)
    }

    /**
        Decide the per-media treatment for this session.
    */
    pub fn plan(&self, server: &StreamInfo, client: &StreamInfo) -> Result<Recipe> {
        plan::plan(self.appetizer()?, server, client)
    }

    /**
        Run the streaming session. Blocks until it ends; callers put it
        on a dedicated blocking task.
    */
    pub fn stream(&self, params: SessionParams) {
        self.streamer.stream(params);
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
    fn engine_for_rejects_invalid_requests_before_matching() {
        let engines = Engines::empty(Config::default());
        assert!(matches!(
            engines.engine_for(&request("http://example.com/stream")),
            Err(Error::UnsupportedStreamUrl)
        ));
    }

    #[test]
    fn engine_for_reports_missing_implementations() {
        let engines = Engines::empty(Config::default());
        assert!(matches!(
            engines.engine_for(&request("srt://host:40053")),
            Err(Error::NoProber)
        ));
    }

    #[test]
    fn engine_for_finds_the_builtin_pair() {
        let engines = Engines::new(Config::default());
        assert!(engines.engine_for(&request("srt://host:40053")).is_ok());
        assert!(engines.engine_for(&request("rtmp://host/app")).is_ok());
    }

    #[test]
    fn srt_appetizer_carries_listener_side_options() {
        let engines = Engines::new(Config::default());
        let engine = engines.engine_for(&request("srt://host:40053")).unwrap();
        let appetizer = engine.appetizer().unwrap();

        assert_eq!(appetizer.url, "srt://host:40053");
        assert_eq!(appetizer.format, ContainerFormat::MpegTs);
        assert_eq!(
            appetizer.options.get(&InputOption::SrtStreamId).unwrap(),
            "live"
        );
        assert_eq!(
            appetizer.options.get(&InputOption::SrtTranstype).unwrap(),
            "live"
        );
        assert_eq!(
            appetizer.options.get(&InputOption::SrtSmoother).unwrap(),
            "live"
        );
        // 300 ms default, expressed in microseconds.
        assert_eq!(
            appetizer.options.get(&InputOption::SrtLatency).unwrap(),
            "300000"
        );
    }

    #[test]
    fn rtmp_appetizer_appends_the_stream_id() {
        let engines = Engines::new(Config::default());
        let engine = engines.engine_for(&request("rtmp://host/app")).unwrap();
        let appetizer = engine.appetizer().unwrap();

        assert_eq!(appetizer.url, "rtmp://host/app/live");
        assert_eq!(appetizer.format, ContainerFormat::Flv);
        assert_eq!(
            appetizer.options.get(&InputOption::RtmpLive).unwrap(),
            "live"
        );
        assert!(!appetizer.options.contains_key(&InputOption::SrtStreamId));
    }
}

/*!
    Shared track fanout.

    A publisher session writes samples once; any number of viewer
    sessions read them. The [`TrackManager`] owns one fanout pair per
    stream id for the life of the process: handles are registered when
    the publisher appears and reused by every viewer after that.
*/

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::broadcast;
use tracing::debug;

/// How many samples a slow viewer may lag before losing the oldest.
const DEFAULT_TRACK_DEPTH: usize = 512;

/**
    One media sample as it travels between sessions.
*/
#[derive(Clone, Debug)]
pub struct TrackSample {
    pub payload: Bytes,
    pub duration: Duration,
}

/**
    The single-writer/multi-reader pair for one published stream.

    Cloning shares the underlying channels; writes are visible to every
    subscriber regardless of which clone performed them.
*/
#[derive(Clone, Debug)]
pub struct SharedTracks {
    video: broadcast::Sender<TrackSample>,
    audio: broadcast::Sender<TrackSample>,
}

impl SharedTracks {
    fn new(depth: usize) -> Self {
        let (video, _) = broadcast::channel(depth);
        let (audio, _) = broadcast::channel(depth);
        Self { video, audio }
    }

    /**
        Publish a video sample to every current viewer.
    */
    pub fn write_video_sample(&self, payload: Bytes, duration: Duration) {
        // A send with no receivers just means nobody is watching yet.
        let _ = self.video.send(TrackSample { payload, duration });
    }

    /**
        Publish an audio sample to every current viewer.
    */
    pub fn write_audio_sample(&self, payload: Bytes, duration: Duration) {
        let _ = self.audio.send(TrackSample { payload, duration });
    }

    pub fn subscribe_video(&self) -> broadcast::Receiver<TrackSample> {
        self.video.subscribe()
    }

    pub fn subscribe_audio(&self) -> broadcast::Receiver<TrackSample> {
        self.audio.subscribe()
    }

    /**
        How many viewers are currently subscribed to the video side.
    */
    pub fn viewer_count(&self) -> usize {
        self.video.receiver_count()
    }
}

/**
    Process-wide registry of published tracks, keyed by stream id.
*/
pub struct TrackManager {
    depth: usize,
    tracks: Mutex<HashMap<String, SharedTracks>>,
}

impl TrackManager {
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_TRACK_DEPTH)
    }

    pub fn with_depth(depth: usize) -> Self {
        Self {
            depth,
            tracks: Mutex::new(HashMap::new()),
        }
    }

    /**
        The track pair for a stream id, created on first use.
    */
    pub fn register(&self, stream_id: &str) -> SharedTracks {
        let mut tracks = self.tracks.lock().expect("track registry lock poisoned");
        tracks
            .entry(stream_id.to_string())
            .or_insert_with(|| {
                debug!("registering shared tracks for {stream_id}");
                SharedTracks::new(self.depth)
            })
            .clone()
    }

    /**
        The track pair for a stream id, if a publisher registered one.
    */
    pub fn get(&self, stream_id: &str) -> Option<SharedTracks> {
        self.tracks
            .lock()
            .expect("track registry lock poisoned")
            .get(stream_id)
            .cloned()
    }

    /**
        Drop the registration for a stream id.
    */
    pub fn remove(&self, stream_id: &str) {
        self.tracks
            .lock()
            .expect("track registry lock poisoned")
            .remove(stream_id);
    }
}

impl Default for TrackManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_returns_the_same_pair_per_stream_id() {
        let manager = TrackManager::new();
        let publisher = manager.register("live");
        let viewer = manager.get("live").unwrap();

        let mut rx = viewer.subscribe_video();
        publisher.write_video_sample(Bytes::from_static(&[1, 2, 3]), Duration::from_millis(33));

        let sample = rx.try_recv().unwrap();
        assert_eq!(sample.payload.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn samples_fan_out_to_every_viewer() {
        let manager = TrackManager::new();
        let tracks = manager.register("live");

        let mut a = tracks.subscribe_audio();
        let mut b = tracks.subscribe_audio();
        tracks.write_audio_sample(Bytes::from_static(&[0xfc]), Duration::from_millis(20));

        assert_eq!(a.try_recv().unwrap().payload.as_ref(), &[0xfc]);
        assert_eq!(b.try_recv().unwrap().payload.as_ref(), &[0xfc]);
    }

    #[test]
    fn writes_without_viewers_are_dropped_silently() {
        let manager = TrackManager::new();
        let tracks = manager.register("live");
        tracks.write_video_sample(Bytes::new(), Duration::ZERO);
        assert_eq!(tracks.viewer_count(), 0);
    }

    #[test]
    fn unknown_stream_ids_have_no_tracks() {
        let manager = TrackManager::new();
        assert!(manager.get("absent").is_none());
        manager.register("present");
        manager.remove("present");
        assert!(manager.get("present").is_none());
    }
}

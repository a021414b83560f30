/*!
    Frame duration synthesis.

    Live containers rarely carry per-packet durations, so the dispatcher
    derives them: video assumes a fixed frame rate, audio estimates the
    frame size from consecutive DTS deltas. Both heuristics have known
    limits (VFR sources, timestamp wraparound); negative deltas are
    clamped by reusing the previous estimate.
*/

use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Default)]
struct AudioTiming {
    last_dts: i64,
    current_frame_samples: f64,
}

/**
    Per-session timing state, tracked per stream index.
*/
#[derive(Debug, Default)]
pub(crate) struct TimingModel {
    audio: HashMap<usize, AudioTiming>,
}

impl TimingModel {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Fixed-rate video duration: one over the average frame rate
        numerator. VFR sources get incorrect values, a documented
        limitation.
    */
    pub fn video_duration(&self, avg_frame_rate_num: i32) -> Duration {
        if avg_frame_rate_num <= 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(1.0 / avg_frame_rate_num as f64)
    }

    /**
        Audio duration from the DTS delta to the previous packet of the
        same stream. A non-positive delta (reset, wraparound) reuses the
        previous frame-size estimate.
    */
    pub fn audio_duration(
        &mut self,
        stream_index: usize,
        dts: Option<i64>,
        sample_rate: u32,
    ) -> Duration {
        if sample_rate == 0 {
            return Duration::ZERO;
        }

        let timing = self.audio.entry(stream_index).or_default();
        if let Some(dts) = dts {
            let delta = dts - timing.last_dts;
            if delta > 0 {
                timing.current_frame_samples = delta as f64;
            }
            timing.last_dts = dts;
        }

        Duration::from_secs_f64(timing.current_frame_samples / sample_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_duration_is_frame_rate_reciprocal() {
        let timing = TimingModel::new();
        let d = timing.video_duration(30);
        assert!((d.as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn video_duration_handles_unknown_rate() {
        let timing = TimingModel::new();
        assert_eq!(timing.video_duration(0), Duration::ZERO);
    }

    #[test]
    fn audio_duration_tracks_dts_deltas() {
        let mut timing = TimingModel::new();

        // First packet establishes the baseline.
        let first = timing.audio_duration(1, Some(960), 48_000);
        assert!((first.as_secs_f64() - 0.02).abs() < 1e-9);

        let second = timing.audio_duration(1, Some(1920), 48_000);
        assert!((second.as_secs_f64() - 0.02).abs() < 1e-9);
    }

    #[test]
    fn audio_duration_clamps_negative_deltas() {
        let mut timing = TimingModel::new();
        timing.audio_duration(1, Some(960), 48_000);
        timing.audio_duration(1, Some(1920), 48_000);

        // DTS reset: the previous estimate is reused.
        let wrapped = timing.audio_duration(1, Some(100), 48_000);
        assert!((wrapped.as_secs_f64() - 0.02).abs() < 1e-9);

        // And the baseline moved to the reset value.
        let next = timing.audio_duration(1, Some(1060), 48_000);
        assert!((next.as_secs_f64() - 0.02).abs() < 1e-9);
    }

    #[test]
    fn audio_streams_are_tracked_independently() {
        let mut timing = TimingModel::new();
        timing.audio_duration(1, Some(960), 48_000);
        let other = timing.audio_duration(2, Some(480), 48_000);
        assert!((other.as_secs_f64() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn missing_dts_reuses_previous_estimate() {
        let mut timing = TimingModel::new();
        timing.audio_duration(1, Some(960), 48_000);
        let d = timing.audio_duration(1, None, 48_000);
        assert!((d.as_secs_f64() - 0.02).abs() < 1e-9);
    }
}

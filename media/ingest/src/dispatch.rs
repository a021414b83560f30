/*!
    The frame dispatcher.

    Terminal stage of every per-stream pipeline: synthesizes the frame
    duration, packages transcoded payloads as RTP, and invokes the
    caller's sinks. Bypass payloads are delivered raw — for H.264 that is
    the Annex-B byte stream the bitstream filter produced.
*/

use media_types::{MediaFrameContext, Result};

use crate::params::FrameSink;
use crate::rtp::{packetize, AUDIO_PAYLOAD_TYPE, VIDEO_PAYLOAD_TYPE};
use crate::timing::TimingModel;

pub(crate) struct Dispatcher {
    timing: TimingModel,
    on_video_frame: Option<FrameSink>,
    on_audio_frame: Option<FrameSink>,
}

impl Dispatcher {
    pub fn new(on_video_frame: Option<FrameSink>, on_audio_frame: Option<FrameSink>) -> Self {
        Self {
            timing: TimingModel::new(),
            on_video_frame,
            on_audio_frame,
        }
    }

    /**
        Deliver a bypassed video packet as-is.
    */
    pub fn bypass_video(
        &mut self,
        payload: &[u8],
        pts: i64,
        dts: i64,
        avg_frame_rate_num: i32,
    ) -> Result<()> {
        let duration = self.timing.video_duration(avg_frame_rate_num);
        deliver(
            &mut self.on_video_frame,
            payload,
            MediaFrameContext { pts, dts, duration },
        )
    }

    /**
        Deliver a bypassed audio packet as-is.
    */
    pub fn bypass_audio(
        &mut self,
        stream_index: usize,
        payload: &[u8],
        pts: i64,
        dts: Option<i64>,
        sample_rate: u32,
    ) -> Result<()> {
        let duration = self.timing.audio_duration(stream_index, dts, sample_rate);
        deliver(
            &mut self.on_audio_frame,
            payload,
            MediaFrameContext {
                pts,
                dts: dts.unwrap_or(0),
                duration,
            },
        )
    }

    /**
        Package an encoded video packet as RTP and deliver it.
    */
    pub fn encoded_video(
        &mut self,
        payload: &[u8],
        pts: i64,
        dts: i64,
        avg_frame_rate_num: i32,
    ) -> Result<()> {
        if self.on_video_frame.is_none() {
            return Ok(());
        }
        let wire = packetize(payload, VIDEO_PAYLOAD_TYPE, pts as u32)?;
        let duration = self.timing.video_duration(avg_frame_rate_num);
        deliver(
            &mut self.on_video_frame,
            &wire,
            MediaFrameContext { pts, dts, duration },
        )
    }

    /**
        Package an encoded audio packet as RTP and deliver it.
    */
    pub fn encoded_audio(
        &mut self,
        stream_index: usize,
        payload: &[u8],
        pts: i64,
        dts: Option<i64>,
        sample_rate: u32,
    ) -> Result<()> {
        if self.on_audio_frame.is_none() {
            return Ok(());
        }
        let wire = packetize(payload, AUDIO_PAYLOAD_TYPE, pts as u32)?;
        let duration = self.timing.audio_duration(stream_index, dts, sample_rate);
        deliver(
            &mut self.on_audio_frame,
            &wire,
            MediaFrameContext {
                pts,
                dts: dts.unwrap_or(0),
                duration,
            },
        )
    }
}

fn deliver(
    sink: &mut Option<FrameSink>,
    payload: &[u8],
    context: MediaFrameContext,
) -> Result<()> {
    match sink {
        Some(callback) => callback(payload, context),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn collecting_sink(store: Arc<Mutex<Vec<MediaFrameContext>>>) -> FrameSink {
        Box::new(move |_payload, ctx| {
            store.lock().unwrap().push(ctx);
            Ok(())
        })
    }

    #[test]
    fn bypass_video_keeps_payload_raw_and_times_by_frame_rate() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let payloads = Arc::new(Mutex::new(Vec::new()));
        let p2 = payloads.clone();
        let s2 = seen.clone();
        let sink: FrameSink = Box::new(move |payload, ctx| {
            p2.lock().unwrap().push(payload.to_vec());
            s2.lock().unwrap().push(ctx);
            Ok(())
        });

        let mut dispatcher = Dispatcher::new(Some(sink), None);
        let annexb = [0x00, 0x00, 0x00, 0x01, 0x67];
        dispatcher.bypass_video(&annexb, 3000, 3000, 30).unwrap();

        let payloads = payloads.lock().unwrap();
        assert_eq!(payloads[0], annexb);

        let seen = seen.lock().unwrap();
        assert!((seen[0].duration.as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn encoded_audio_wraps_rtp_with_opus_payload_type() {
        use webrtc::rtp::packet::Packet as RtpPacket;
        use webrtc::util::Unmarshal;

        let payloads = Arc::new(Mutex::new(Vec::new()));
        let p2 = payloads.clone();
        let sink: FrameSink = Box::new(move |payload, _ctx| {
            p2.lock().unwrap().push(payload.to_vec());
            Ok(())
        });

        let mut dispatcher = Dispatcher::new(None, Some(sink));
        dispatcher
            .encoded_audio(1, &[0xfc, 0x01], 960, Some(960), 48_000)
            .unwrap();

        let payloads = payloads.lock().unwrap();
        let mut buf = bytes::Bytes::from(payloads[0].clone());
        let parsed = RtpPacket::unmarshal(&mut buf).unwrap();
        assert_eq!(parsed.header.payload_type, AUDIO_PAYLOAD_TYPE);
        assert_eq!(parsed.header.timestamp, 960);
        assert_eq!(parsed.payload.as_ref(), &[0xfc, 0x01]);
    }

    #[test]
    fn missing_sinks_are_not_an_error() {
        let mut dispatcher = Dispatcher::new(None, None);
        assert!(dispatcher.bypass_video(&[0], 0, 0, 30).is_ok());
        assert!(dispatcher
            .encoded_audio(0, &[0], 0, Some(0), 48_000)
            .is_ok());
    }

    #[test]
    fn sink_errors_propagate() {
        let sink: FrameSink =
            Box::new(|_p, _c| Err(media_types::Error::EncodeFailed("sink closed".into())));
        let mut dispatcher = Dispatcher::new(Some(sink), None);
        assert!(dispatcher.bypass_video(&[0], 0, 0, 30).is_err());
    }

    #[test]
    fn collecting_sink_sees_monotonic_dts() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new(Some(collecting_sink(seen.clone())), None);
        for dts in [0i64, 3000, 6000, 9000] {
            dispatcher.bypass_video(&[0], dts, dts, 30).unwrap();
        }
        let seen = seen.lock().unwrap();
        for pair in seen.windows(2) {
            assert!(pair[1].dts >= pair[0].dts);
        }
    }
}

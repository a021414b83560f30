/*!
    Per-stream pipelines.

    One [`StreamPipeline`] exists per handled input stream. The route tag
    decides the treatment — bypass forwards compressed packets, transcode
    runs decode → filter graph → encode — and an optional bitstream
    filter reformats packets before either route sees them.
*/

use std::collections::HashMap;

use ffmpeg_next::{
    codec::{self, decoder, encoder},
    ffi,
    filter::Graph as FilterGraph,
    format::context::Input as InputContext,
    frame, picture, Packet, Rational,
};
use tracing::{debug, info, warn};

use media_input::{descriptor_for, encoder_id_for, sample_format_to_ffmpeg};
use media_types::{
    CodecOption, Error, MediaTask, MediaType, Recipe, Result, StreamDescriptor, TaskAction,
};

use crate::bsf::BitstreamFilter;
use crate::dispatch::Dispatcher;
use crate::filter::{audio_graph, video_graph};
use crate::params::StreamSink;

/**
    The opened decoder for one input stream.

    Allocated for every handled stream, bypass included: the decoder
    context carries the timebase and framerate the dispatcher rescales
    against.
*/
pub(crate) enum OpenedDecoder {
    Video(decoder::Video),
    Audio(decoder::Audio),
}

pub(crate) enum OpenedEncoder {
    Video(encoder::Video),
    Audio(encoder::Audio),
}

/**
    Decode → filter → encode state for a transcoded stream.
*/
pub(crate) struct TranscodeLane {
    pub graph: FilterGraph,
    pub encoder: OpenedEncoder,
    pub enc_time_base: Rational,
    /// Fixed encoder frame size in samples; 0 when variable or video.
    pub frame_size: usize,
    /// Encoder sample rate, for audio duration synthesis.
    pub enc_sample_rate: u32,
}

pub(crate) enum Route {
    Bypass,
    Transcode(Box<TranscodeLane>),
}

pub(crate) struct StreamPipeline {
    pub descriptor: StreamDescriptor,
    pub in_time_base: Rational,
    pub dec_time_base: Rational,
    pub frame_rate_num: i32,
    /// Decoder sample rate, for bypassed audio timing.
    pub sample_rate: u32,
    pub decoder: OpenedDecoder,
    pub bsf: Option<BitstreamFilter>,
    pub route: Route,
}

/**
    Open decoders, encoders, filter graphs and bitstream filters for
    every handled stream of the input, per the recipe, announcing each
    stream through `on_stream` exactly once.
*/
pub(crate) fn build_pipelines(
    input: &mut InputContext,
    recipe: &Recipe,
    on_stream: &mut Option<StreamSink>,
) -> Result<HashMap<usize, StreamPipeline>> {
    // SAFETY: the raw pointer is only handed to av_guess_frame_rate
    // while the input context is alive and borrowed by this call.
    let fmt_ptr = unsafe { input.as_mut_ptr() };

    let mut pipelines = HashMap::new();
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

        let task = recipe.task_for(descriptor.media);
        let in_time_base = stream.time_base();
        let decoder = open_decoder(fmt_ptr, &stream, descriptor.media)?;
        // The decoder context timebase was set from the input stream.
        let dec_time_base = in_time_base;

        let sample_rate = match &decoder {
            OpenedDecoder::Audio(dec) => dec.rate(),
            OpenedDecoder::Video(_) => 0,
        };

        let route = match task.action {
            TaskAction::Bypass => {
                info!("bypassing {:?} stream #{}", descriptor.media, stream.index());
                Route::Bypass
            }
            TaskAction::Transcode => {
                info!(
                    "transcoding {:?} stream #{} to {:?}",
                    descriptor.media,
                    stream.index(),
                    task.codec
                );
                Route::Transcode(Box::new(build_lane(task, &decoder, dec_time_base)?))
            }
        };

        let bsf = match task.bitstream_filter {
            Some(name) => Some(BitstreamFilter::new(name, &stream)?),
            None => None,
        };

        if let Some(callback) = on_stream {
            callback(&descriptor)?;
        }

        pipelines.insert(
            stream.index(),
            StreamPipeline {
                descriptor,
                in_time_base,
                dec_time_base,
                frame_rate_num: stream.avg_frame_rate().numerator(),
                sample_rate,
                decoder,
                bsf,
                route,
            },
        );
    }

    Ok(pipelines)
}

fn open_decoder(
    fmt_ptr: *mut ffi::AVFormatContext,
    stream: &ffmpeg_next::format::Stream,
    media: MediaType,
) -> Result<OpenedDecoder> {
    let mut ctx = codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| Error::ContextAllocFailed(e.to_string()))?;

    // SAFETY: ctx owns the codec context; the stream and format context
    // outlive this call. Timebase and framerate must land before open.
    unsafe {
        let raw = ctx.as_mut_ptr();
        (*raw).time_base = stream.time_base().into();
        if media == MediaType::Video {
            (*raw).framerate =
                ffi::av_guess_frame_rate(fmt_ptr, stream.as_ptr() as *mut _, std::ptr::null_mut());
        }
    }

    match media {
        MediaType::Video => ctx
            .decoder()
            .video()
            .map(OpenedDecoder::Video)
            .map_err(|e| Error::CodecMissing(e.to_string())),
        MediaType::Audio => ctx
            .decoder()
            .audio()
            .map(OpenedDecoder::Audio)
            .map_err(|e| Error::CodecMissing(e.to_string())),
    }
}

fn build_lane(
    task: &MediaTask,
    decoder: &OpenedDecoder,
    dec_time_base: Rational,
) -> Result<TranscodeLane> {
    match decoder {
        OpenedDecoder::Audio(dec) => {
            let enc = open_audio_encoder(task, dec, dec_time_base)?;
            let graph = audio_graph(
                dec,
                dec_time_base,
                task.stream_filter.as_ref(),
                enc.format(),
                enc.channel_layout(),
                enc.rate(),
            )?;
            let frame_size = enc.frame_size() as usize;
            let enc_sample_rate = enc.rate();
            Ok(TranscodeLane {
                graph,
                encoder: OpenedEncoder::Audio(enc),
                enc_time_base: dec_time_base,
                frame_size,
                enc_sample_rate,
            })
        }
        OpenedDecoder::Video(dec) => {
            let enc = open_video_encoder(task, dec, dec_time_base)?;
            let graph = video_graph(dec, dec_time_base, task.stream_filter.as_ref(), enc.format())?;
            Ok(TranscodeLane {
                graph,
                encoder: OpenedEncoder::Video(enc),
                enc_time_base: dec_time_base,
                frame_size: 0,
                enc_sample_rate: 0,
            })
        }
    }
}

fn open_audio_encoder(
    task: &MediaTask,
    decoder: &decoder::Audio,
    dec_time_base: Rational,
) -> Result<encoder::Audio> {
    let codec_id = encoder_id_for(task.codec)?;
    let codec = ffmpeg_next::encoder::find(codec_id)
        .ok_or_else(|| Error::EncoderNotFound(format!("{:?}", task.codec)))?;
    let caps = codec
        .audio()
        .map_err(|e| Error::EncoderNotFound(e.to_string()))?;

    let ctx = codec::context::Context::new_with_codec(codec);
    let mut enc = ctx
        .encoder()
        .audio()
        .map_err(|e| Error::ContextAllocFailed(e.to_string()))?;

    let layout = caps
        .channel_layouts()
        .and_then(|mut layouts| layouts.next())
        .unwrap_or_else(|| decoder.channel_layout());
    enc.set_channel_layout(layout);
    enc.set_rate(decoder.rate() as i32);
    let format = caps
        .formats()
        .and_then(|mut formats| formats.next())
        .unwrap_or_else(|| decoder.format());
    enc.set_format(format);
    enc.set_time_base(dec_time_base);

    // SAFETY: the decoder context pointer is valid for the borrow.
    if unsafe { has_global_header(decoder.as_ptr()) } {
        enc.set_flags(codec::flag::Flags::GLOBAL_HEADER);
    }

    // User options win over the derived defaults.
    for option in &task.codec_options {
        match option {
            CodecOption::SampleRate(rate) => enc.set_rate(*rate as i32),
            CodecOption::BitRate(rate) => enc.set_bit_rate(*rate),
            CodecOption::SampleFormat(fmt) => enc.set_format(sample_format_to_ffmpeg(*fmt)),
            CodecOption::GopSize(_) => {}
        }
    }

    enc.open()
        .map_err(|e| Error::EncodeFailed(format!("opening audio encoder: {e}")))
}

fn open_video_encoder(
    task: &MediaTask,
    decoder: &decoder::Video,
    dec_time_base: Rational,
) -> Result<encoder::Video> {
    let codec_id = encoder_id_for(task.codec)?;
    let codec = ffmpeg_next::encoder::find(codec_id)
        .ok_or_else(|| Error::EncoderNotFound(format!("{:?}", task.codec)))?;
    let caps = codec
        .video()
        .map_err(|e| Error::EncoderNotFound(e.to_string()))?;

    let ctx = codec::context::Context::new_with_codec(codec);
    let mut enc = ctx
        .encoder()
        .video()
        .map_err(|e| Error::ContextAllocFailed(e.to_string()))?;

    let format = caps
        .formats()
        .and_then(|mut formats| formats.next())
        .unwrap_or_else(|| decoder.format());
    enc.set_format(format);
    enc.set_width(decoder.width());
    enc.set_height(decoder.height());
    enc.set_aspect_ratio(decoder.aspect_ratio());
    enc.set_time_base(dec_time_base);

    // SAFETY: the decoder context pointer is valid for the borrow.
    if unsafe { has_global_header(decoder.as_ptr()) } {
        enc.set_flags(codec::flag::Flags::GLOBAL_HEADER);
    }

    for option in &task.codec_options {
        match option {
            CodecOption::BitRate(rate) => enc.set_bit_rate(*rate),
            CodecOption::GopSize(gop) => enc.set_gop(*gop),
            CodecOption::SampleRate(_) | CodecOption::SampleFormat(_) => {}
        }
    }

    enc.open()
        .map_err(|e| Error::EncodeFailed(format!("opening video encoder: {e}")))
}

/// # Safety
/// `ctx` must point at a live codec context.
unsafe fn has_global_header(ctx: *const ffi::AVCodecContext) -> bool {
    ((*ctx).flags & ffi::AV_CODEC_FLAG_GLOBAL_HEADER as i32) != 0
}

/// EAGAIN and EOF are drain signals on every receive loop, not errors.
fn is_drain(err: &ffmpeg_next::Error) -> bool {
    matches!(err, ffmpeg_next::Error::Eof)
        || matches!(err, ffmpeg_next::Error::Other { errno } if *errno == ffi::EAGAIN)
}

impl StreamPipeline {
    /**
        Feed one demuxed packet through this pipeline.
    */
    pub fn ingest(&mut self, packet: &mut Packet, dispatcher: &mut Dispatcher) -> Result<()> {
        if let Some(mut bsf) = self.bsf.take() {
            let result = self.ingest_filtered(&mut bsf, packet, dispatcher);
            self.bsf = Some(bsf);
            result
        } else {
            self.process(packet, dispatcher)
        }
    }

    fn ingest_filtered(
        &mut self,
        bsf: &mut BitstreamFilter,
        packet: &mut Packet,
        dispatcher: &mut Dispatcher,
    ) -> Result<()> {
        bsf.send(packet)?;
        loop {
            let mut reformatted = Packet::empty();
            if !bsf.receive(&mut reformatted)? {
                return Ok(());
            }
            self.process(&mut reformatted, dispatcher)?;
        }
    }

    fn process(&mut self, packet: &mut Packet, dispatcher: &mut Dispatcher) -> Result<()> {
        let Self {
            descriptor,
            in_time_base,
            dec_time_base,
            frame_rate_num,
            sample_rate,
            decoder,
            route,
            ..
        } = self;

        match route {
            Route::Bypass => {
                packet.rescale_ts(*in_time_base, *dec_time_base);
                let payload = packet.data().unwrap_or_default();
                let pts = packet.pts().unwrap_or(0);
                match descriptor.media {
                    MediaType::Video => dispatcher.bypass_video(
                        payload,
                        pts,
                        packet.dts().unwrap_or(0),
                        *frame_rate_num,
                    ),
                    MediaType::Audio => dispatcher.bypass_audio(
                        descriptor.index as usize,
                        payload,
                        pts,
                        packet.dts(),
                        *sample_rate,
                    ),
                }
            }
            Route::Transcode(lane) => {
                let lane = lane.as_mut();
                match (decoder, &mut lane.encoder) {
                    (OpenedDecoder::Audio(dec), OpenedEncoder::Audio(enc)) => transcode_audio(
                        dec,
                        &mut lane.graph,
                        enc,
                        lane.enc_time_base,
                        lane.frame_size,
                        lane.enc_sample_rate,
                        *in_time_base,
                        descriptor.index as usize,
                        packet,
                        dispatcher,
                    ),
                    (OpenedDecoder::Video(dec), OpenedEncoder::Video(enc)) => transcode_video(
                        dec,
                        &mut lane.graph,
                        enc,
                        lane.enc_time_base,
                        *in_time_base,
                        *frame_rate_num,
                        packet,
                        dispatcher,
                    ),
                    _ => {
                        warn!(
                            "stream #{}: decoder and encoder media types diverge",
                            descriptor.index
                        );
                        Ok(())
                    }
                }
            }
        }
    }

    /**
        Flush everything buffered: bitstream filter, decoder, filter
        graph and encoder, dispatching whatever comes out.
    */
    pub fn drain(&mut self, dispatcher: &mut Dispatcher) -> Result<()> {
        if let Some(mut bsf) = self.bsf.take() {
            let result = self.drain_filtered(&mut bsf, dispatcher);
            self.bsf = Some(bsf);
            result?;
        }

        let Self {
            descriptor,
            in_time_base,
            decoder,
            route,
            frame_rate_num,
            ..
        } = self;

        let Route::Transcode(lane) = route else {
            return Ok(());
        };
        let lane = lane.as_mut();

        match (decoder, &mut lane.encoder) {
            (OpenedDecoder::Audio(dec), OpenedEncoder::Audio(enc)) => drain_audio(
                dec,
                &mut lane.graph,
                enc,
                lane.enc_time_base,
                lane.frame_size,
                lane.enc_sample_rate,
                *in_time_base,
                descriptor.index as usize,
                dispatcher,
            ),
            (OpenedDecoder::Video(dec), OpenedEncoder::Video(enc)) => drain_video(
                dec,
                &mut lane.graph,
                enc,
                lane.enc_time_base,
                *in_time_base,
                *frame_rate_num,
                dispatcher,
            ),
            _ => Ok(()),
        }
    }

    fn drain_filtered(
        &mut self,
        bsf: &mut BitstreamFilter,
        dispatcher: &mut Dispatcher,
    ) -> Result<()> {
        bsf.send_eof()?;
        loop {
            let mut reformatted = Packet::empty();
            if !bsf.receive(&mut reformatted)? {
                return Ok(());
            }
            self.process(&mut reformatted, dispatcher)?;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn transcode_audio(
    dec: &mut decoder::Audio,
    graph: &mut FilterGraph,
    enc: &mut encoder::Audio,
    enc_time_base: Rational,
    frame_size: usize,
    enc_sample_rate: u32,
    in_time_base: Rational,
    stream_index: usize,
    packet: &Packet,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    dec.send_packet(packet)
        .map_err(|e| Error::SendPacketFailed(e.to_string()))?;

    let mut decoded = frame::Audio::empty();
    loop {
        match dec.receive_frame(&mut decoded) {
            Ok(()) => filter_encode_audio(
                graph,
                enc,
                enc_time_base,
                frame_size,
                enc_sample_rate,
                in_time_base,
                stream_index,
                &decoded,
                dispatcher,
            )?,
            Err(e) if is_drain(&e) => return Ok(()),
            Err(e) => return Err(Error::ReceiveFrameFailed(e.to_string())),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn filter_encode_audio(
    graph: &mut FilterGraph,
    enc: &mut encoder::Audio,
    enc_time_base: Rational,
    frame_size: usize,
    enc_sample_rate: u32,
    in_time_base: Rational,
    stream_index: usize,
    decoded: &frame::Audio,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    graph
        .get("in")
        .ok_or_else(|| Error::FilterFailed("abuffer missing".to_string()))?
        .source()
        .add(decoded)
        .map_err(|e| Error::FilterFailed(format!("adding frame: {e}")))?;

    loop {
        let mut filtered = frame::Audio::empty();
        let received = graph
            .get("out")
            .ok_or_else(|| Error::FilterFailed("abuffersink missing".to_string()))?
            .sink()
            .frame(&mut filtered);
        match received {
            Ok(()) => encode_audio(
                enc,
                enc_time_base,
                frame_size,
                enc_sample_rate,
                in_time_base,
                stream_index,
                &mut filtered,
                dispatcher,
            )?,
            Err(e) if is_drain(&e) => return Ok(()),
            Err(e) => return Err(Error::FilterFailed(e.to_string())),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn encode_audio(
    enc: &mut encoder::Audio,
    enc_time_base: Rational,
    frame_size: usize,
    enc_sample_rate: u32,
    in_time_base: Rational,
    stream_index: usize,
    frame: &mut frame::Audio,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    // Opus has a fixed frame size; the resampler can hand over larger
    // buffers than the encoder accepts per frame.
    if frame_size > 0 {
        // SAFETY: the frame is a live, exclusively owned AVFrame.
        unsafe { (*frame.as_mut_ptr()).nb_samples = frame_size as i32 };
    }

    enc.send_frame(frame)
        .map_err(|e| Error::EncodeFailed(format!("sending frame: {e}")))?;

    receive_audio_packets(
        enc,
        enc_time_base,
        enc_sample_rate,
        in_time_base,
        stream_index,
        dispatcher,
    )
}

fn receive_audio_packets(
    enc: &mut encoder::Audio,
    enc_time_base: Rational,
    enc_sample_rate: u32,
    in_time_base: Rational,
    stream_index: usize,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    loop {
        let mut encoded = Packet::empty();
        match enc.receive_packet(&mut encoded) {
            Ok(()) => {
                encoded.rescale_ts(in_time_base, enc_time_base);
                dispatcher.encoded_audio(
                    stream_index,
                    encoded.data().unwrap_or_default(),
                    encoded.pts().unwrap_or(0),
                    encoded.dts(),
                    enc_sample_rate,
                )?;
            }
            Err(e) if is_drain(&e) => return Ok(()),
            Err(e) => return Err(Error::EncodeFailed(format!("receiving packet: {e}"))),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn transcode_video(
    dec: &mut decoder::Video,
    graph: &mut FilterGraph,
    enc: &mut encoder::Video,
    enc_time_base: Rational,
    in_time_base: Rational,
    frame_rate_num: i32,
    packet: &Packet,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    dec.send_packet(packet)
        .map_err(|e| Error::SendPacketFailed(e.to_string()))?;

    let mut decoded = frame::Video::empty();
    loop {
        match dec.receive_frame(&mut decoded) {
            Ok(()) => filter_encode_video(
                graph,
                enc,
                enc_time_base,
                in_time_base,
                frame_rate_num,
                &decoded,
                dispatcher,
            )?,
            Err(e) if is_drain(&e) => return Ok(()),
            Err(e) => return Err(Error::ReceiveFrameFailed(e.to_string())),
        }
    }
}

fn filter_encode_video(
    graph: &mut FilterGraph,
    enc: &mut encoder::Video,
    enc_time_base: Rational,
    in_time_base: Rational,
    frame_rate_num: i32,
    decoded: &frame::Video,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    graph
        .get("in")
        .ok_or_else(|| Error::FilterFailed("buffer missing".to_string()))?
        .source()
        .add(decoded)
        .map_err(|e| Error::FilterFailed(format!("adding frame: {e}")))?;

    loop {
        let mut filtered = frame::Video::empty();
        let received = graph
            .get("out")
            .ok_or_else(|| Error::FilterFailed("buffersink missing".to_string()))?
            .sink()
            .frame(&mut filtered);
        match received {
            Ok(()) => {
                // The encoder picks frame types itself.
                filtered.set_kind(picture::Type::None);
                enc.send_frame(&filtered)
                    .map_err(|e| Error::EncodeFailed(format!("sending frame: {e}")))?;
                receive_video_packets(
                    enc,
                    enc_time_base,
                    in_time_base,
                    frame_rate_num,
                    dispatcher,
                )?;
            }
            Err(e) if is_drain(&e) => return Ok(()),
            Err(e) => return Err(Error::FilterFailed(e.to_string())),
        }
    }
}

fn receive_video_packets(
    enc: &mut encoder::Video,
    enc_time_base: Rational,
    in_time_base: Rational,
    frame_rate_num: i32,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    loop {
        let mut encoded = Packet::empty();
        match enc.receive_packet(&mut encoded) {
            Ok(()) => {
                encoded.rescale_ts(in_time_base, enc_time_base);
                dispatcher.encoded_video(
                    encoded.data().unwrap_or_default(),
                    encoded.pts().unwrap_or(0),
                    encoded.dts().unwrap_or(0),
                    frame_rate_num,
                )?;
            }
            Err(e) if is_drain(&e) => return Ok(()),
            Err(e) => return Err(Error::EncodeFailed(format!("receiving packet: {e}"))),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn drain_audio(
    dec: &mut decoder::Audio,
    graph: &mut FilterGraph,
    enc: &mut encoder::Audio,
    enc_time_base: Rational,
    frame_size: usize,
    enc_sample_rate: u32,
    in_time_base: Rational,
    stream_index: usize,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    // Decoder first: remaining frames still traverse the graph.
    if dec.send_eof().is_ok() {
        let mut decoded = frame::Audio::empty();
        loop {
            match dec.receive_frame(&mut decoded) {
                Ok(()) => filter_encode_audio(
                    graph,
                    enc,
                    enc_time_base,
                    frame_size,
                    enc_sample_rate,
                    in_time_base,
                    stream_index,
                    &decoded,
                    dispatcher,
                )?,
                Err(e) if is_drain(&e) => break,
                Err(e) => return Err(Error::ReceiveFrameFailed(e.to_string())),
            }
        }
    }

    // Then the graph itself.
    if let Some(mut source) = graph.get("in") {
        let _ = source.source().flush();
    }
    loop {
        let mut filtered = frame::Audio::empty();
        let received = match graph.get("out") {
            Some(mut sink) => sink.sink().frame(&mut filtered),
            None => break,
        };
        match received {
            Ok(()) => encode_audio(
                enc,
                enc_time_base,
                frame_size,
                enc_sample_rate,
                in_time_base,
                stream_index,
                &mut filtered,
                dispatcher,
            )?,
            Err(e) if is_drain(&e) => break,
            Err(e) => return Err(Error::FilterFailed(e.to_string())),
        }
    }

    // Finally the encoder.
    enc.send_eof()
        .map_err(|e| Error::EncodeFailed(format!("flushing encoder: {e}")))?;
    receive_audio_packets(
        enc,
        enc_time_base,
        enc_sample_rate,
        in_time_base,
        stream_index,
        dispatcher,
    )
}

fn drain_video(
    dec: &mut decoder::Video,
    graph: &mut FilterGraph,
    enc: &mut encoder::Video,
    enc_time_base: Rational,
    in_time_base: Rational,
    frame_rate_num: i32,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    if dec.send_eof().is_ok() {
        let mut decoded = frame::Video::empty();
        loop {
            match dec.receive_frame(&mut decoded) {
                Ok(()) => filter_encode_video(
                    graph,
                    enc,
                    enc_time_base,
                    in_time_base,
                    frame_rate_num,
                    &decoded,
                    dispatcher,
                )?,
                Err(e) if is_drain(&e) => break,
                Err(e) => return Err(Error::ReceiveFrameFailed(e.to_string())),
            }
        }
    }

    if let Some(mut source) = graph.get("in") {
        let _ = source.source().flush();
    }
    loop {
        let mut filtered = frame::Video::empty();
        let received = match graph.get("out") {
            Some(mut sink) => sink.sink().frame(&mut filtered),
            None => break,
        };
        match received {
            Ok(()) => {
                filtered.set_kind(picture::Type::None);
                enc.send_frame(&filtered)
                    .map_err(|e| Error::EncodeFailed(format!("sending frame: {e}")))?;
                receive_video_packets(
                    enc,
                    enc_time_base,
                    in_time_base,
                    frame_rate_num,
                    dispatcher,
                )?;
            }
            Err(e) if is_drain(&e) => break,
            Err(e) => return Err(Error::FilterFailed(e.to_string())),
        }
    }

    enc.send_eof()
        .map_err(|e| Error::EncodeFailed(format!("flushing encoder: {e}")))?;
    receive_video_packets(
        enc,
        enc_time_base,
        in_time_base,
        frame_rate_num,
        dispatcher,
    )
}

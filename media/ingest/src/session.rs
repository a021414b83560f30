/*!
    The session run loop.
*/

use ffmpeg_next::{ffi, Packet};
use tracing::{error, info, warn};

use media_input::open_appetizer;
use media_types::{Error, Result};

use crate::dispatch::Dispatcher;
use crate::params::SessionParams;
use crate::pipeline::{build_pipelines, StreamPipeline};

/**
    Run one ingest session to completion.

    Blocks until the feed ends, the shutdown token fires, or a fatal
    error surfaces. `on_error` is invoked at most once; `on_close` runs
    on every exit path.
*/
pub(crate) fn run(mut params: SessionParams) {
    let on_close = params.on_close.take();
    let mut on_error = params.on_error.take();

    if let Err(err) = run_session(params) {
        if err.is_clean_termination() {
            info!("session ended: {err}");
        } else {
            error!("session failed: {err}");
            if let Some(callback) = on_error.as_mut() {
                callback(&err);
            }
        }
    }

    if let Some(callback) = on_close {
        callback();
    }
}

fn run_session(params: SessionParams) -> Result<()> {
    let SessionParams {
        shutdown,
        recipe,
        mut on_stream,
        on_video_frame,
        on_audio_frame,
        ..
    } = params;

    info!("preparing input {}", recipe.input.url);
    let mut input = open_appetizer(&recipe.input)?;
    let mut pipelines = build_pipelines(&mut input, &recipe, &mut on_stream)?;
    let mut dispatcher = Dispatcher::new(on_video_frame, on_audio_frame);

    info!("streaming started");
    loop {
        if shutdown.is_fired() {
            // No draining here: callbacks after the token fires stay
            // bounded to the iteration that observed it.
            return match shutdown.cause() {
                Some(cause) => Err(cause),
                None => {
                    info!("streaming stopped by cancellation");
                    Ok(())
                }
            };
        }

        let mut packet = Packet::empty();
        match packet.read(&mut input) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Eof) => {
                info!("end of stream reached");
                drain_all(&mut pipelines, &mut dispatcher)?;
                return Ok(());
            }
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => continue,
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EPIPE => {
                info!("upstream pipe closed");
                drain_all(&mut pipelines, &mut dispatcher)?;
                return Ok(());
            }
            Err(e) => return Err(Error::ReadFrameFailed(e.to_string())),
        }

        let index = packet.stream();
        let Some(pipeline) = pipelines.get_mut(&index) else {
            warn!("skipping packet for unknown stream index {index}");
            continue;
        };

        pipeline.ingest(&mut packet, &mut dispatcher)?;
    }
}

fn drain_all(
    pipelines: &mut std::collections::HashMap<usize, StreamPipeline>,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    for pipeline in pipelines.values_mut() {
        pipeline.drain(dispatcher)?;
    }
    Ok(())
}

/*!
    Bitstream filtering.

    `ffmpeg-next` has no safe wrapper for the AVBSF API, so this module
    owns the context through the FFI directly. The wrapper follows the
    send/receive convention of the codec contexts: `EAGAIN` and `EOF` on
    the receive side are drain signals, not errors.
*/

use std::ffi::CString;
use std::ptr;

use ffmpeg_next::{ffi, format::Stream, packet::Mut as PacketMut, Packet};

use media_types::{BitstreamFilterName, Error, Result};

/**
    An initialized bitstream filter bound to one input stream.

    The input codec parameters and timebase are copied from the stream at
    construction; packets pushed in must come from that stream.
*/
pub(crate) struct BitstreamFilter {
    ctx: *mut ffi::AVBSFContext,
}

// The context is owned exclusively by one session task.
unsafe impl Send for BitstreamFilter {}

impl BitstreamFilter {
    pub fn new(name: BitstreamFilterName, stream: &Stream) -> Result<Self> {
        let c_name = CString::new(name.name())
            .map_err(|e| Error::BitstreamFilterNotFound(e.to_string()))?;

        // SAFETY: every pointer below is checked before use; on any
        // failure after allocation the context is freed before returning.
        unsafe {
            let filter = ffi::av_bsf_get_by_name(c_name.as_ptr());
            if filter.is_null() {
                return Err(Error::BitstreamFilterNotFound(name.name().to_string()));
            }

            let mut ctx: *mut ffi::AVBSFContext = ptr::null_mut();
            let ret = ffi::av_bsf_alloc(filter, &mut ctx);
            if ret < 0 {
                return Err(Error::ContextAllocFailed(format!(
                    "bitstream filter context: {}",
                    ffmpeg_next::Error::from(ret)
                )));
            }

            let ret = ffi::avcodec_parameters_copy((*ctx).par_in, stream.parameters().as_ptr());
            if ret < 0 {
                ffi::av_bsf_free(&mut ctx);
                return Err(Error::ContextAllocFailed(format!(
                    "copying codec parameters: {}",
                    ffmpeg_next::Error::from(ret)
                )));
            }

            (*ctx).time_base_in = stream.time_base().into();

            let ret = ffi::av_bsf_init(ctx);
            if ret < 0 {
                ffi::av_bsf_free(&mut ctx);
                return Err(Error::FilterSetupFailed(format!(
                    "initializing {}: {}",
                    name.name(),
                    ffmpeg_next::Error::from(ret)
                )));
            }

            Ok(Self { ctx })
        }
    }

    /**
        Push a packet in. The filter takes the packet's payload reference;
        the packet is left blank. `EAGAIN` is tolerated, as in the codec
        send path.
    */
    pub fn send(&mut self, packet: &mut Packet) -> Result<()> {
        // SAFETY: ctx is valid until drop; the packet pointer refers to a
        // live AVPacket owned by the caller.
        let ret = unsafe { ffi::av_bsf_send_packet(self.ctx, packet.as_mut_ptr()) };
        if ret < 0 && ret != ffi::AVERROR(ffi::EAGAIN) {
            return Err(Error::SendPacketFailed(format!(
                "bitstream filter: {}",
                ffmpeg_next::Error::from(ret)
            )));
        }
        Ok(())
    }

    /**
        Signal end of input so buffered packets flush out.
    */
    pub fn send_eof(&mut self) -> Result<()> {
        // SAFETY: a null packet is the documented EOF marker.
        let ret = unsafe { ffi::av_bsf_send_packet(self.ctx, ptr::null_mut()) };
        if ret < 0 && ret != ffi::AVERROR(ffi::EAGAIN) {
            return Err(Error::SendPacketFailed(format!(
                "bitstream filter flush: {}",
                ffmpeg_next::Error::from(ret)
            )));
        }
        Ok(())
    }

    /**
        Pull one reformatted packet out.

        Returns `Ok(true)` when `packet` was filled, `Ok(false)` when the
        filter is drained for now (`EAGAIN`) or for good (`EOF`).
    */
    pub fn receive(&mut self, packet: &mut Packet) -> Result<bool> {
        // SAFETY: ctx is valid until drop; packet is a live AVPacket the
        // call may overwrite.
        let ret = unsafe { ffi::av_bsf_receive_packet(self.ctx, packet.as_mut_ptr()) };
        if ret == 0 {
            return Ok(true);
        }
        if ret == ffi::AVERROR(ffi::EAGAIN) || ret == ffi::AVERROR_EOF {
            return Ok(false);
        }
        Err(Error::ReceiveFrameFailed(format!(
            "bitstream filter: {}",
            ffmpeg_next::Error::from(ret)
        )))
    }
}

impl Drop for BitstreamFilter {
    fn drop(&mut self) {
        // SAFETY: ctx came from av_bsf_alloc and is freed exactly once.
        unsafe { ffi::av_bsf_free(&mut self.ctx) };
    }
}

/*!
    Opening container inputs.
*/

use std::ffi::CString;
use std::ptr;

use ffmpeg_next::{ffi, format::context::Input as InputContext, Dictionary};

use media_types::{Appetizer, Error, InputOption, Result};

/**
    Rewrite an SRT URL into bind form.

    The gateway is always the passive side: `srt://host:port?query`
    becomes `srt://0.0.0.0:port` with the query stripped. Non-SRT URLs
    pass through untouched.
*/
pub fn rebind_srt_url(url: &str) -> String {
    if !url.to_lowercase().contains("srt://") {
        return url.to_string();
    }

    let Some((_, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let host_port = rest.split('?').next().unwrap_or(rest);
    match host_port.split_once(':') {
        Some((_, port)) if !port.is_empty() => format!("srt://0.0.0.0:{port}"),
        _ => url.to_string(),
    }
}

/**
    Open the input an appetizer describes.

    Applies the option dictionary, forces the demuxer named by the
    appetizer's container format, rebinds SRT URLs to listener mode, and
    runs stream discovery. The returned context closes the input when
    dropped.

    `ffmpeg-next` has no safe entry point that both forces the input
    format and passes a dictionary, so this drops to the FFI for the open
    itself and wraps the result for everything after.
*/
pub fn open_appetizer(appetizer: &Appetizer) -> Result<InputContext> {
    ffmpeg_next::init().map_err(|e| Error::ContextAllocFailed(e.to_string()))?;

    let url = rebind_srt_url(&appetizer.url);
    let is_srt = url.to_lowercase().contains("srt://");

    let mut options = Dictionary::new();
    for (key, value) in &appetizer.options {
        options.set(key.key(), value);
    }
    if is_srt && !appetizer.options.contains_key(&InputOption::Mode) {
        options.set(InputOption::Mode.key(), "listener");
    }

    let c_url = CString::new(url.as_str())
        .map_err(|e| Error::OpenInputFailed(format!("invalid input URL: {e}")))?;
    let c_format = CString::new(appetizer.format.demuxer_name())
        .map_err(|e| Error::OpenInputFailed(format!("invalid format name: {e}")))?;

    // SAFETY: the CStrings outlive every call below; avformat_open_input
    // owns the context on success and frees it itself on failure; the
    // dictionary pointer is reclaimed and freed on every path.
    unsafe {
        let input_format = ffi::av_find_input_format(c_format.as_ptr());
        if input_format.is_null() {
            return Err(Error::OpenInputFailed(format!(
                "could not find {} input format",
                appetizer.format
            )));
        }

        let mut format_ctx = ffi::avformat_alloc_context();
        if format_ctx.is_null() {
            return Err(Error::ContextAllocFailed(
                "input format context is null".to_string(),
            ));
        }

        let mut dict = options.disown();
        let ret = ffi::avformat_open_input(
            &mut format_ctx,
            c_url.as_ptr(),
            input_format,
            &mut dict,
        );
        ffi::av_dict_free(&mut dict);
        if ret < 0 {
            return Err(Error::OpenInputFailed(format!(
                "{url}: {}",
                ffmpeg_next::Error::from(ret)
            )));
        }

        let ret = ffi::avformat_find_stream_info(format_ctx, ptr::null_mut());
        if ret < 0 {
            ffi::avformat_close_input(&mut format_ctx);
            return Err(Error::FindStreamInfoFailed(
                ffmpeg_next::Error::from(ret).to_string(),
            ));
        }

        Ok(InputContext::wrap(format_ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebinds_srt_urls_to_listener_form() {
        assert_eq!(
            rebind_srt_url("srt://localhost:40053?streamid=live"),
            "srt://0.0.0.0:40053"
        );
        assert_eq!(rebind_srt_url("SRT://feed.example:9000"), "srt://0.0.0.0:9000");
    }

    #[test]
    fn leaves_non_srt_urls_untouched() {
        assert_eq!(
            rebind_srt_url("rtmp://host/app/key"),
            "rtmp://host/app/key"
        );
    }

    #[test]
    fn leaves_portless_srt_urls_untouched() {
        assert_eq!(rebind_srt_url("srt://hostonly"), "srt://hostonly");
    }
}

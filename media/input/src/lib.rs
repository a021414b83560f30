/*!
    Container opening and stream probing.

    The opener turns an [`media_types::Appetizer`] into an opened FFmpeg
    input with the gateway's ingress conventions applied (SRT listener
    rebind, forced demuxer, option dictionary). The prober opens an input
    briefly to discover its audio/video streams and closes it again; no
    state survives the call.
*/

mod convert;
mod open;
mod probe;

pub use convert::{codec_from_id, descriptor_for, encoder_id_for, media_type_of, sample_format_to_ffmpeg};
pub use open::{open_appetizer, rebind_srt_url};
pub use probe::{FfmpegProber, Prober};

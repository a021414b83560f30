/*!
    The gateway error taxonomy.

    Native FFmpeg causes are stringified at the boundary and carried in the
    variant payloads; the ingest crates never expose raw libav error codes.
*/

use thiserror::Error;

/// Type alias for results across the crate family.
pub type Result<T> = std::result::Result<T, Error>;

/**
    Everything that can go wrong between request validation and session
    teardown.

    `Cancelled` and `EndOfStream` drive clean termination and are never
    pushed through an error sink.
*/
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum Error {
    // ── Validation ────────────────────────────────────────────────────
    #[error("stream URL must name an SRT or RTMP source")]
    UnsupportedStreamUrl,
    #[error("stream id must not be empty")]
    MissingStreamId,
    #[error("stream URL must not be empty")]
    MissingStreamUrl,
    #[error("request parameters must be provided")]
    MissingRequestParams,

    // ── Routing ───────────────────────────────────────────────────────
    #[error("no prober matches the request")]
    NoProber,
    #[error("no streamer matches the request")]
    NoStreamer,
    #[error("client offer advertises no compatible streams")]
    NoCompatibleStreams,
    #[error("codec {0} is not supported for this treatment")]
    UnsupportedCodec(String),

    // ── Resource setup ────────────────────────────────────────────────
    #[error("allocating a native context failed: {0}")]
    ContextAllocFailed(String),
    #[error("no decoder for codec: {0}")]
    CodecMissing(String),
    #[error("no encoder for codec: {0}")]
    EncoderNotFound(String),
    #[error("filter graph setup failed: {0}")]
    FilterSetupFailed(String),
    #[error("bitstream filter not found: {0}")]
    BitstreamFilterNotFound(String),

    // ── Transport ─────────────────────────────────────────────────────
    #[error("opening input failed: {0}")]
    OpenInputFailed(String),
    #[error("finding stream info failed: {0}")]
    FindStreamInfoFailed(String),
    #[error("reading frame failed: {0}")]
    ReadFrameFailed(String),

    // ── Processing ────────────────────────────────────────────────────
    #[error("sending packet failed: {0}")]
    SendPacketFailed(String),
    #[error("receiving frame failed: {0}")]
    ReceiveFrameFailed(String),
    #[error("filtering failed: {0}")]
    FilterFailed(String),
    #[error("encoding failed: {0}")]
    EncodeFailed(String),
    #[error("marshalling RTP packet failed: {0}")]
    RtpMarshalFailed(String),

    // ── Lifecycle ─────────────────────────────────────────────────────
    #[error("session cancelled")]
    Cancelled,
    #[error("end of stream")]
    EndOfStream,
}

impl Error {
    /**
        True for the variants that end a session without being an error
        from the caller's point of view.
    */
    pub const fn is_clean_termination(&self) -> bool {
        matches!(self, Self::Cancelled | Self::EndOfStream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_variants_are_clean() {
        assert!(Error::Cancelled.is_clean_termination());
        assert!(Error::EndOfStream.is_clean_termination());
        assert!(!Error::NoProber.is_clean_termination());
    }

    #[test]
    fn causes_are_embedded_in_messages() {
        let err = Error::OpenInputFailed("Connection refused".to_string());
        assert!(err.to_string().contains("Connection refused"));
    }
}

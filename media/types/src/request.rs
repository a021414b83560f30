/*!
    Session request parameters.
*/

use crate::{Error, Result};

/**
    What the signaling layer hands the gateway for one viewer session.

    Validated once at the edge; immutable afterwards.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// Upstream feed URL. Must name an SRT or RTMP source.
    pub stream_url: String,
    /// Stream id within the feed (SRT streamid / RTMP stream key).
    pub stream_id: String,
    /// The client's SDP offer, verbatim.
    pub offer_sdp: String,
}

impl Request {
    /**
        Check the request against the supported ingress protocols.

        The URL scheme test is a case-insensitive substring match, the same
        predicate the classifier uses to pick implementations.
    */
    pub fn validate(&self) -> Result<()> {
        if self.stream_id.is_empty() {
            return Err(Error::MissingStreamId);
        }
        if self.stream_url.is_empty() {
            return Err(Error::MissingStreamUrl);
        }
        if !self.is_rtmp() && !self.is_srt() {
            return Err(Error::UnsupportedStreamUrl);
        }
        Ok(())
    }

    /**
        True when the URL names an RTMP source.
    */
    pub fn is_rtmp(&self) -> bool {
        self.stream_url.to_lowercase().contains("rtmp")
    }

    /**
        True when the URL names an SRT source.
    */
    pub fn is_srt(&self) -> bool {
        self.stream_url.to_lowercase().contains("srt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> Request {
        Request {
            stream_url: url.to_string(),
            stream_id: "live".to_string(),
            offer_sdp: "v=0".to_string(),
        }
    }

    #[test]
    fn accepts_srt_and_rtmp_urls() {
        assert!(request("srt://localhost:40053").validate().is_ok());
        assert!(request("SRT://host:1").validate().is_ok());
        assert!(request("rtmp://host/app").validate().is_ok());
    }

    #[test]
    fn rejects_unsupported_scheme_before_any_allocation() {
        assert!(matches!(
            request("http://example.com/stream").validate(),
            Err(Error::UnsupportedStreamUrl)
        ));
    }

    #[test]
    fn rejects_missing_fields() {
        let mut r = request("srt://h:1");
        r.stream_id.clear();
        assert!(matches!(r.validate(), Err(Error::MissingStreamId)));

        let mut r = request("");
        r.stream_url.clear();
        assert!(matches!(r.validate(), Err(Error::MissingStreamUrl)));
    }
}

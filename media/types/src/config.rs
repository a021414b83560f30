/*!
    Environment configuration.

    These knobs ride into the ingest layer through the appetizer options
    and the encoder settings; the core does not interpret them beyond
    that.
*/

use serde::Deserialize;

fn default_srt_latency_ms() -> u32 {
    300
}

// MPEG-TS consists of 188-byte units. 188 * 7 = 1316 is the largest
// multiple of 188 under the usual 1500-byte MTU.
fn default_srt_read_buffer_bytes() -> usize {
    1316
}

fn default_probing_size() -> usize {
    120
}

fn default_stream_url() -> String {
    "srt://localhost:40053".to_string()
}

fn default_stream_id() -> String {
    "stream-id".to_string()
}

/**
    Gateway configuration, loadable from the environment.
*/
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// SRT connection latency, milliseconds.
    #[serde(default = "default_srt_latency_ms")]
    pub srt_connection_latency_ms: u32,
    /// SRT receive buffer, bytes.
    #[serde(default = "default_srt_read_buffer_bytes")]
    pub srt_read_buffer_size_bytes: usize,
    /// Probe duration hint, packets.
    #[serde(default = "default_probing_size")]
    pub probing_size: usize,
    /// Feed URL used when the request omits one.
    #[serde(default = "default_stream_url")]
    pub default_stream_url: String,
    /// Stream id used when the request omits one.
    #[serde(default = "default_stream_id")]
    pub default_stream_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            srt_connection_latency_ms: default_srt_latency_ms(),
            srt_read_buffer_size_bytes: default_srt_read_buffer_bytes(),
            probing_size: default_probing_size(),
            default_stream_url: default_stream_url(),
            default_stream_id: default_stream_id(),
        }
    }
}

impl Config {
    /**
        Load from the process environment, falling back to defaults for
        unset or unparsable variables.
    */
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("SRT_CONNECTION_LATENCY_MS") {
            config.srt_connection_latency_ms = v;
        }
        if let Some(v) = env_parse("SRT_READ_BUFFER_SIZE_BYTES") {
            config.srt_read_buffer_size_bytes = v;
        }
        if let Some(v) = env_parse("PROBING_SIZE") {
            config.probing_size = v;
        }
        if let Ok(v) = std::env::var("DEFAULT_STREAM_URL") {
            if !v.is_empty() {
                config.default_stream_url = v;
            }
        }
        if let Ok(v) = std::env::var("DEFAULT_STREAM_ID") {
            if !v.is_empty() {
                config.default_stream_id = v;
            }
        }

        config
    }

    /**
        The probe-size hint in bytes, scaled by the receive unit size.
    */
    pub fn probe_size_bytes(&self) -> usize {
        self.probing_size * self.srt_read_buffer_size_bytes
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_surface() {
        let config = Config::default();
        assert_eq!(config.srt_connection_latency_ms, 300);
        assert_eq!(config.srt_read_buffer_size_bytes, 1316);
        assert_eq!(config.probing_size, 120);
        assert_eq!(config.default_stream_url, "srt://localhost:40053");
    }

    #[test]
    fn probe_size_scales_by_receive_unit() {
        let config = Config::default();
        assert_eq!(config.probe_size_bytes(), 120 * 1316);
    }
}

//! Unified error type for adapter operations.

use alloc::string::String;
use core::fmt;

use enough::StopReason;

/// Which half of the two-phase decode protocol failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodePhase {
    /// Header-only call (geometry and colorspace).
    Probe,
    /// Pixel-producing call.
    Full,
}

impl fmt::Display for DecodePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodePhase::Probe => f.write_str("probe"),
            DecodePhase::Full => f.write_str("full decode"),
        }
    }
}

/// Errors from decoding and encoding.
///
/// Codec-boundary failures are final for the call: nothing is retried and no
/// partial image or byte stream is ever returned alongside an error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum JpegError {
    /// The byte source failed to supply input.
    #[error("read: {0}")]
    Read(#[source] std::io::Error),

    /// The codec reported a colorspace id outside the descriptor table.
    #[error("unsupported colorspace {0}")]
    UnsupportedColorspace(u32),

    /// The codec reported a chroma subsampling id outside the ratio table.
    #[error("unsupported chroma subsampling ratio {0}")]
    UnsupportedSubsampling(u32),

    /// The codec signaled failure during probe or full decode.
    #[error("jpeg {phase} failed: {detail}")]
    DecodeFailure { phase: DecodePhase, detail: String },

    /// The codec signaled failure (zero output size) during compression.
    #[error("jpeg encode failed: {0}")]
    EncodeFailure(String),

    /// The byte sink refused the compressed output.
    #[error("write: {0}")]
    Write(#[source] std::io::Error),

    /// Caller-supplied image or option is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Resource limit exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Operation cancelled via stop token.
    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for JpegError {
    fn from(r: StopReason) -> Self {
        JpegError::Cancelled(r)
    }
}

impl JpegError {
    pub(crate) fn decode_failure(phase: DecodePhase, detail: impl Into<String>) -> Self {
        JpegError::DecodeFailure {
            phase,
            detail: detail.into(),
        }
    }

    /// Whether this error came from the codec itself rather than the
    /// collaborators or the caller's input.
    pub fn is_codec_failure(&self) -> bool {
        matches!(
            self,
            JpegError::DecodeFailure { .. } | JpegError::EncodeFailure(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_phase() {
        let err = JpegError::decode_failure(DecodePhase::Probe, "no SOF marker");
        assert_eq!(err.to_string(), "jpeg probe failed: no SOF marker");

        let err = JpegError::decode_failure(DecodePhase::Full, "truncated scan");
        assert_eq!(err.to_string(), "jpeg full decode failed: truncated scan");
    }

    #[test]
    fn stop_reason_converts() {
        let err: JpegError = StopReason::Cancelled.into();
        assert!(matches!(err, JpegError::Cancelled(StopReason::Cancelled)));
        assert!(!err.is_codec_failure());
    }

    #[test]
    fn read_error_keeps_source() {
        use core::error::Error as _;
        let err = JpegError::Read(std::io::Error::other("disk gone"));
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "read: disk gone");
    }
}

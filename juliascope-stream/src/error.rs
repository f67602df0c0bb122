use thiserror::Error;

/// Errors originating from the streaming engine.
///
/// None of these abort the session: transport errors trigger a reconnect,
/// everything else is logged and the offending message or tile dropped.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    #[error("tile payload is not valid base64: {0}")]
    PayloadEncoding(#[from] base64::DecodeError),

    #[error("tile image decode failed: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("payload length {got} does not match expected {expected} ({width}×{height} RGBA)")]
    PayloadLength {
        got: usize,
        expected: usize,
        width: u32,
        height: u32,
    },
}

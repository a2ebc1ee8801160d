//! HTTP transport shared by completion backends.

mod http;

pub use http::{HttpOptions, HttpReply, HttpTransport};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

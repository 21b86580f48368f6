//! Stream transport to the node-local debug agent.
//!
//! `StreamTransport` is the seam the session runner depends on; the
//! WebSocket implementation lives in [`websocket`] and the wire framing in
//! [`channel`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::DEFAULT_CONNECT_TIMEOUT_SECS;
use crate::error::DebugError;
use crate::request::DebugRequest;
use crate::terminal::SessionIo;

pub mod channel;
pub mod websocket;

pub use websocket::WebSocketTransport;

/// Opens the duplex stream for a request and relays the session over it.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Block until the remote closes the stream or any channel fails.
    async fn execute(&self, request: &DebugRequest, io: SessionIo) -> Result<(), DebugError>;
}

/// Connection parameters supplied by the credential provider.
#[derive(Clone)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    /// Sent as `Authorization: Bearer ...` on the upgrade request.
    pub bearer_token: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            bearer_token: None,
        }
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("connect_timeout", &self.connect_timeout)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

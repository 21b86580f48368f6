//! Channel framing for the multiplexed agent stream.
//!
//! The agent speaks the Kubernetes remote-command WebSocket subprotocols.
//! Every binary message carries one leading channel byte followed by the
//! payload for that channel.

use serde::Deserialize;

use crate::error::DebugError;
use crate::terminal::TerminalSize;

/// Negotiated subprotocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelProtocol {
    /// Adds the close channel so stdin EOF can be signalled.
    V5,
    V4,
}

impl ChannelProtocol {
    /// Offered protocols, most preferred first.
    pub const OFFERED: [ChannelProtocol; 2] = [ChannelProtocol::V5, ChannelProtocol::V4];

    pub fn name(self) -> &'static str {
        match self {
            Self::V5 => "v5.channel.k8s.io",
            Self::V4 => "v4.channel.k8s.io",
        }
    }

    /// Match the `Sec-WebSocket-Protocol` value the agent selected.
    pub fn from_header(value: &str) -> Option<Self> {
        Self::OFFERED
            .into_iter()
            .find(|p| p.name() == value.trim())
    }

    /// Offer for the upgrade request.
    ///
    /// No whitespace after the commas: the client matches the agent's choice
    /// against the untrimmed entries.
    pub fn offer_header() -> String {
        Self::OFFERED
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn supports_close(self) -> bool {
        matches!(self, Self::V5)
    }
}

/// Logical channels multiplexed over one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stdin,
    Stdout,
    Stderr,
    /// Out-of-band session status from the agent.
    Error,
    Resize,
    /// v5 only: half-close of another channel.
    Close,
}

impl Channel {
    pub fn id(self) -> u8 {
        match self {
            Self::Stdin => 0,
            Self::Stdout => 1,
            Self::Stderr => 2,
            Self::Error => 3,
            Self::Resize => 4,
            Self::Close => 255,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Stdin),
            1 => Some(Self::Stdout),
            2 => Some(Self::Stderr),
            3 => Some(Self::Error),
            4 => Some(Self::Resize),
            255 => Some(Self::Close),
            _ => None,
        }
    }
}

/// Prefix `payload` with its channel byte.
pub fn encode_frame(channel: Channel, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 1);
    frame.push(channel.id());
    frame.extend_from_slice(payload);
    frame
}

/// Split a binary message into its channel id and payload.
///
/// Unknown channel ids are returned raw so callers can skip them.
pub fn decode_frame(frame: &[u8]) -> Result<(u8, &[u8]), DebugError> {
    match frame.split_first() {
        Some((id, payload)) => Ok((*id, payload)),
        None => Err(DebugError::Stream("received empty frame from agent".into())),
    }
}

/// Resize-channel frame for `size`.
pub fn resize_frame(size: TerminalSize) -> Result<Vec<u8>, DebugError> {
    let payload = serde_json::to_vec(&size)
        .map_err(|e| DebugError::Stream(format!("failed to encode resize event: {e}")))?;
    Ok(encode_frame(Channel::Resize, &payload))
}

/// Close-channel frame half-closing `channel` (v5 only).
pub fn close_frame(channel: Channel) -> Vec<u8> {
    encode_frame(Channel::Close, &[channel.id()])
}

/// Status document sent by the agent on the error channel.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteStatus {
    pub status: Option<String>,
    pub message: Option<String>,
    pub reason: Option<String>,
    pub details: Option<RemoteStatusDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteStatusDetails {
    pub causes: Vec<RemoteStatusCause>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteStatusCause {
    pub reason: Option<String>,
    pub message: Option<String>,
}

const NON_ZERO_EXIT_REASON: &str = "NonZeroExitCode";
const EXIT_CODE_CAUSE: &str = "ExitCode";

impl RemoteStatus {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("Success")
    }

    /// Exit code of the remote process when it ended non-zero.
    pub fn exit_code(&self) -> Option<i32> {
        if self.reason.as_deref() != Some(NON_ZERO_EXIT_REASON) {
            return None;
        }
        self.details
            .as_ref()?
            .causes
            .iter()
            .find(|c| c.reason.as_deref() == Some(EXIT_CODE_CAUSE))
            .and_then(|c| c.message.as_deref())
            .and_then(|m| m.trim().parse().ok())
    }
}

/// Interpret an error-channel payload.
///
/// `Ok(())` for a success status; otherwise the agent's failure surfaced
/// verbatim. Non-JSON payloads are treated as a plain-text failure message.
pub fn parse_status(payload: &[u8]) -> Result<(), DebugError> {
    let text = String::from_utf8_lossy(payload);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    let Ok(status) = serde_json::from_str::<RemoteStatus>(trimmed) else {
        return Err(DebugError::RemoteSession {
            message: trimmed.to_string(),
            exit_code: None,
        });
    };
    if status.is_success() {
        return Ok(());
    }
    let exit_code = status.exit_code();
    let message = status
        .message
        .clone()
        .filter(|m| !m.trim().is_empty())
        .or_else(|| status.reason.clone())
        .unwrap_or_else(|| "debug agent reported an unspecified failure".to_string());
    Err(DebugError::RemoteSession { message, exit_code })
}

//! WebSocket transport: upgrade the agent request and relay every channel.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{
    AUTHORIZATION, SEC_WEBSOCKET_PROTOCOL, USER_AGENT,
};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use super::channel::{
    close_frame, decode_frame, encode_frame, parse_status, resize_frame, Channel, ChannelProtocol,
};
use super::{StreamTransport, TransportConfig};
use crate::build_info;
use crate::error::DebugError;
use crate::request::DebugRequest;
use crate::terminal::{BoxedReader, BoxedWriter, SessionIo, TerminalSize};

type AgentSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const FRAME_QUEUE_DEPTH: usize = 64;
const STDIN_CHUNK_BYTES: usize = 4096;
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Transport speaking the channel subprotocols over a WebSocket upgrade.
#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport {
    config: TransportConfig,
}

impl WebSocketTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    async fn connect(&self, url: &Url) -> Result<(AgentSocket, ChannelProtocol), DebugError> {
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| DebugError::Transport(format!("invalid upgrade request: {e}")))?;
        let headers = request.headers_mut();
        headers.insert(
            SEC_WEBSOCKET_PROTOCOL,
            header_value(&ChannelProtocol::offer_header())?,
        );
        headers.insert(USER_AGENT, header_value(&build_info::user_agent())?);
        if let Some(token) = self.config.bearer_token.as_deref() {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
        }

        let endpoint = format!(
            "{}:{}",
            url.host_str().unwrap_or_default(),
            url.port_or_known_default().unwrap_or_default()
        );
        tracing::debug!(%endpoint, path = url.path(), "connecting to debug agent");

        let (socket, response) =
            tokio::time::timeout(self.config.connect_timeout, connect_async(request))
                .await
                .map_err(|_| {
                    DebugError::Transport(format!(
                        "timed out after {:?} connecting to {endpoint}",
                        self.config.connect_timeout
                    ))
                })?
                .map_err(|e| DebugError::Transport(describe_handshake_error(&endpoint, e)))?;

        let protocol = response
            .headers()
            .get(SEC_WEBSOCKET_PROTOCOL)
            .and_then(|v| v.to_str().ok())
            .and_then(ChannelProtocol::from_header)
            .unwrap_or(ChannelProtocol::V4);
        tracing::debug!(protocol = protocol.name(), "debug agent upgraded connection");
        Ok((socket, protocol))
    }
}

#[async_trait]
impl StreamTransport for WebSocketTransport {
    async fn execute(&self, request: &DebugRequest, io: SessionIo) -> Result<(), DebugError> {
        let url = session_url(request, io.tty)?;
        let (socket, protocol) = self.connect(&url).await?;
        relay(socket, protocol, io).await
    }
}

/// Request URL with stream flags appended and the scheme switched to `ws`.
pub fn session_url(request: &DebugRequest, tty: bool) -> Result<Url, DebugError> {
    let mut url = request.url()?;
    url.query_pairs_mut()
        .append_pair("stdin", "true")
        .append_pair("stdout", "true")
        .append_pair("stderr", bool_flag(!tty))
        .append_pair("tty", bool_flag(tty));
    url.set_scheme("ws")
        .map_err(|_| DebugError::Transport(format!("cannot upgrade {url} to a websocket URL")))?;
    Ok(url)
}

fn bool_flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn header_value(value: &str) -> Result<HeaderValue, DebugError> {
    HeaderValue::from_str(value)
        .map_err(|e| DebugError::Transport(format!("invalid upgrade header: {e}")))
}

fn describe_handshake_error(endpoint: &str, err: WsError) -> String {
    match err {
        WsError::Http(response) => format!(
            "agent at {endpoint} refused the upgrade with HTTP {}",
            response.status()
        ),
        WsError::Io(e) => format!("cannot connect to agent at {endpoint}: {e}"),
        other => format!("handshake with agent at {endpoint} failed: {other}"),
    }
}

/// Run every relay channel until the remote closes or one channel fails.
async fn relay(
    socket: AgentSocket,
    protocol: ChannelProtocol,
    io: SessionIo,
) -> Result<(), DebugError> {
    let SessionIo {
        tty,
        stdin,
        mut stdout,
        mut stderr,
        resize,
    } = io;
    tracing::debug!(tty, protocol = protocol.name(), "relaying debug session");

    let (sink, stream) = socket.split();
    let (frames_tx, frames_rx) = mpsc::channel::<Vec<u8>>(FRAME_QUEUE_DEPTH);

    // The relay keeps one sender so the writer outlives an early stdin EOF.
    let mut writer = tokio::spawn(write_frames(sink, frames_rx));
    let input = tokio::spawn(pump_stdin(stdin, frames_tx.clone(), protocol));
    let resizer = resize.map(|events| tokio::spawn(pump_resize(events, frames_tx.clone())));

    let producers = [
        Some(input.abort_handle()),
        resizer.as_ref().map(JoinHandle::abort_handle),
    ];
    let resize_failure = async move {
        match resizer {
            Some(handle) => until_failure(handle, "resize").await,
            None => std::future::pending().await,
        }
    };

    let outcome = tokio::select! {
        result = read_frames(stream, &mut stdout, stderr.as_mut()) => result,
        err = until_failure(input, "stdin") => Err(err),
        err = until_failure(&mut writer, "writer") => Err(err),
        err = resize_failure => Err(err),
    };

    for handle in producers.into_iter().flatten() {
        handle.abort();
    }
    // With every sender gone the writer drains its queue, completes the
    // close handshake, and exits.
    drop(frames_tx);
    if !writer.is_finished() && tokio::time::timeout(CLOSE_GRACE, &mut writer).await.is_err() {
        tracing::debug!("debug agent did not finish the close handshake");
        writer.abort();
    }
    let _ = stdout.flush().await;
    match &outcome {
        Ok(()) => tracing::debug!("debug agent closed the stream"),
        Err(e) => tracing::debug!(error = %e, "debug session stream ended with error"),
    }
    outcome
}

/// Resolve only when the task fails; a clean finish keeps the session open.
async fn until_failure<H>(handle: H, task: &'static str) -> DebugError
where
    H: std::future::Future<Output = Result<Result<(), DebugError>, tokio::task::JoinError>>,
{
    match handle.await {
        Ok(Ok(())) => std::future::pending().await,
        Ok(Err(err)) => err,
        Err(e) => DebugError::Stream(format!("{task} relay ended abnormally: {e}")),
    }
}

async fn read_frames(
    mut stream: SplitStream<AgentSocket>,
    stdout: &mut BoxedWriter,
    mut stderr: Option<&mut BoxedWriter>,
) -> Result<(), DebugError> {
    while let Some(message) = stream.next().await {
        let message =
            message.map_err(|e| DebugError::Stream(format!("agent connection failed: {e}")))?;
        let data = match message {
            Message::Binary(data) => data,
            Message::Close(frame) => {
                tracing::debug!(?frame, "received close from debug agent");
                break;
            }
            Message::Text(_) => {
                tracing::debug!("ignoring text message from debug agent");
                continue;
            }
            _ => continue,
        };

        let (id, payload) = decode_frame(&data)?;
        match Channel::from_id(id) {
            Some(Channel::Stdout) => write_local(stdout, payload).await?,
            Some(Channel::Stderr) => match stderr.as_deref_mut() {
                Some(err_out) => write_local(err_out, payload).await?,
                None => write_local(stdout, payload).await?,
            },
            Some(Channel::Error) => parse_status(payload)?,
            _ => tracing::debug!(channel = id, "ignoring frame on unexpected channel"),
        }
    }
    Ok(())
}

async fn write_local(out: &mut BoxedWriter, payload: &[u8]) -> Result<(), DebugError> {
    out.write_all(payload)
        .await
        .map_err(|e| DebugError::Stream(format!("failed to write local output: {e}")))?;
    out.flush()
        .await
        .map_err(|e| DebugError::Stream(format!("failed to flush local output: {e}")))
}

async fn write_frames(
    mut sink: SplitSink<AgentSocket, Message>,
    mut frames: mpsc::Receiver<Vec<u8>>,
) -> Result<(), DebugError> {
    while let Some(frame) = frames.recv().await {
        sink.send(Message::Binary(frame))
            .await
            .map_err(|e| DebugError::Stream(format!("failed to send to agent: {e}")))?;
    }
    // Sends our close frame, or flushes the reply queued when the agent
    // closed first.
    if let Err(e) = sink.close().await {
        tracing::debug!(error = %e, "closing agent connection failed");
    }
    Ok(())
}

async fn pump_stdin(
    mut stdin: BoxedReader,
    frames: mpsc::Sender<Vec<u8>>,
    protocol: ChannelProtocol,
) -> Result<(), DebugError> {
    let mut buf = vec![0u8; STDIN_CHUNK_BYTES];
    loop {
        let n = stdin
            .read(&mut buf)
            .await
            .map_err(|e| DebugError::Stream(format!("failed to read local input: {e}")))?;
        if n == 0 {
            tracing::debug!("local input reached EOF");
            if protocol.supports_close() {
                let _ = frames.send(close_frame(Channel::Stdin)).await;
            }
            return Ok(());
        }
        if frames
            .send(encode_frame(Channel::Stdin, &buf[..n]))
            .await
            .is_err()
        {
            return Ok(());
        }
    }
}

async fn pump_resize(
    mut events: mpsc::Receiver<TerminalSize>,
    frames: mpsc::Sender<Vec<u8>>,
) -> Result<(), DebugError> {
    while let Some(size) = events.recv().await {
        tracing::trace!(width = size.width, height = size.height, "terminal resized");
        if frames.send(resize_frame(size)?).await.is_err() {
            break;
        }
    }
    Ok(())
}

//! In-process debug agent and fake local collaborators for session tests.
//!
//! The agent speaks the channel subprotocol over a real WebSocket on
//! `127.0.0.1`, so these tests exercise the same transport the binary uses.

#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWrite;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::{
    AUTHORIZATION, SEC_WEBSOCKET_PROTOCOL, USER_AGENT,
};
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

use kubectl_debug::cluster::PodLookup;
use kubectl_debug::config::SessionOptions;
use kubectl_debug::error::DebugError;
use kubectl_debug::terminal::{TerminalDevice, TerminalSize};
use kubectl_debug::types::{ContainerStatus, PodPhase, PodStatus};
use kubectl_debug::ui::RenderSink;

pub const V5: &str = "v5.channel.k8s.io";
pub const V4: &str = "v4.channel.k8s.io";

/// Error-channel frame reporting success.
pub fn success_status() -> Vec<u8> {
    frame(3, br#"{"metadata":{},"status":"Success"}"#)
}

/// Error-channel frame for a remote command that exited with `code`.
pub fn exit_status(code: i32) -> Vec<u8> {
    let body = format!(
        r#"{{"metadata":{{}},"status":"Failure","message":"command terminated with non-zero exit code: exit status {code}","reason":"NonZeroExitCode","details":{{"causes":[{{"reason":"ExitCode","message":"{code}"}}]}}}}"#
    );
    frame(3, body.as_bytes())
}

pub fn frame(channel: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![channel];
    out.extend_from_slice(payload);
    out
}

/// How the scripted agent drives a session after the upgrade.
#[derive(Debug, Clone)]
pub enum AgentBehavior {
    /// Echo stdin on stdout; succeed once stdin is half-closed (v5 only).
    Echo,
    /// Send these frames immediately, then close.
    Replay(Vec<Vec<u8>>),
    /// Wait for the first resize event, then succeed.
    AwaitResize,
    /// Upgrade, then drop the TCP connection without a close frame.
    Vanish,
    /// Refuse the upgrade with this HTTP status.
    Reject(u16),
}

/// What the agent observed during its single connection.
#[derive(Debug, Clone, Default)]
pub struct AgentLog {
    pub uri: Option<String>,
    pub offered_protocols: Option<String>,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
    pub received: Vec<Vec<u8>>,
    /// The client answered or sent a close frame.
    pub close_received: bool,
}

impl AgentLog {
    /// Decoded `(name, value)` query pairs of the upgrade request.
    pub fn query(&self) -> Vec<(String, String)> {
        let Some(uri) = self.uri.as_deref() else {
            return Vec::new();
        };
        url::Url::parse(&format!("ws://agent{uri}"))
            .map(|u| u.query_pairs().into_owned().collect())
            .unwrap_or_default()
    }

    pub fn query_value(&self, name: &str) -> Option<String> {
        self.query()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn frames_on(&self, channel: u8) -> Vec<Vec<u8>> {
        self.received
            .iter()
            .filter(|f| f.first() == Some(&channel))
            .map(|f| f[1..].to_vec())
            .collect()
    }
}

/// Single-connection scripted agent bound to a loopback port.
pub struct MockAgent {
    pub port: u16,
    log: Arc<Mutex<AgentLog>>,
    task: JoinHandle<()>,
}

impl MockAgent {
    pub async fn start(protocol: &'static str, behavior: AgentBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed binding mock agent");
        let port = listener.local_addr().expect("mock agent address").port();
        let log = Arc::new(Mutex::new(AgentLog::default()));
        let task_log = Arc::clone(&log);
        let task = tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                serve(stream, protocol, behavior, task_log).await;
            }
        });
        Self { port, log, task }
    }

    pub fn log(&self) -> AgentLog {
        self.log.lock().unwrap().clone()
    }

    pub fn was_contacted(&self) -> bool {
        self.log().uri.is_some()
    }

    /// Poll until the client's close frame arrives or `within` elapses.
    pub async fn saw_close_within(&self, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        while tokio::time::Instant::now() < deadline {
            if self.log().close_received {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.log().close_received
    }
}

impl Drop for MockAgent {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn header(req: &Request, name: tokio_tungstenite::tungstenite::http::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn serve(
    stream: TcpStream,
    protocol: &'static str,
    behavior: AgentBehavior,
    log: Arc<Mutex<AgentLog>>,
) {
    let reject = match behavior {
        AgentBehavior::Reject(code) => Some(code),
        _ => None,
    };
    let handshake_log = Arc::clone(&log);
    let callback = move |req: &Request, mut resp: Response| -> Result<Response, ErrorResponse> {
        {
            let mut log = handshake_log.lock().unwrap();
            log.uri = Some(req.uri().to_string());
            log.offered_protocols = header(req, SEC_WEBSOCKET_PROTOCOL);
            log.authorization = header(req, AUTHORIZATION);
            log.user_agent = header(req, USER_AGENT);
        }
        if let Some(code) = reject {
            let mut err = ErrorResponse::new(Some("upgrade refused".to_string()));
            *err.status_mut() = StatusCode::from_u16(code).unwrap_or(StatusCode::FORBIDDEN);
            return Err(err);
        }
        resp.headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(protocol));
        Ok(resp)
    };
    let Ok(mut ws) = accept_hdr_async(stream, callback).await else {
        return;
    };

    match behavior {
        AgentBehavior::Echo => {
            while let Some(Ok(msg)) = ws.next().await {
                let data = match msg {
                    Message::Binary(data) => data,
                    Message::Close(_) => {
                        log.lock().unwrap().close_received = true;
                        break;
                    }
                    _ => continue,
                };
                record(&log, &data);
                match data.first() {
                    Some(0) => {
                        let _ = ws.send(Message::Binary(frame(1, &data[1..]))).await;
                    }
                    Some(255) if data.get(1) == Some(&0) => {
                        let _ = ws.send(Message::Binary(success_status())).await;
                        let _ = ws.close(None).await;
                        break;
                    }
                    _ => {}
                }
            }
        }
        AgentBehavior::Replay(frames) => {
            for f in frames {
                let _ = ws.send(Message::Binary(f)).await;
            }
            let _ = ws.close(None).await;
        }
        AgentBehavior::AwaitResize => {
            while let Some(Ok(msg)) = ws.next().await {
                let Message::Binary(data) = msg else { continue };
                record(&log, &data);
                if data.first() == Some(&4) {
                    let _ = ws.send(Message::Binary(success_status())).await;
                    let _ = ws.close(None).await;
                    break;
                }
            }
        }
        AgentBehavior::Vanish => {
            drop(ws);
            return;
        }
        AgentBehavior::Reject(_) => {}
    }
    drain(&mut ws, &log).await;
}

async fn drain(ws: &mut WebSocketStream<TcpStream>, log: &Arc<Mutex<AgentLog>>) {
    let idle = Duration::from_secs(2);
    while let Ok(Some(Ok(msg))) = tokio::time::timeout(idle, ws.next()).await {
        match msg {
            Message::Binary(data) => record(log, &data),
            Message::Close(_) => log.lock().unwrap().close_received = true,
            _ => {}
        }
    }
}

fn record(log: &Arc<Mutex<AgentLog>>, data: &[u8]) {
    log.lock().unwrap().received.push(data.to_vec());
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Running pod on `127.0.0.1` with the given ready containers.
pub fn local_pod(containers: &[&str]) -> PodStatus {
    PodStatus {
        name: "web-0".to_string(),
        phase: PodPhase::Running,
        host_address: Some("127.0.0.1".to_string()),
        declared_containers: containers.iter().map(|c| c.to_string()).collect(),
        container_statuses: containers
            .iter()
            .map(|c| ContainerStatus {
                name: c.to_string(),
                ready: true,
                container_id: format!("containerd://{c}"),
            })
            .collect(),
    }
}

pub fn options(port: u16, container: Option<&str>, command: &[&str]) -> SessionOptions {
    SessionOptions {
        namespace: "default".to_string(),
        pod_name: "web-0".to_string(),
        container_name: container.map(str::to_string),
        image: "nicolaka/netshoot:latest".to_string(),
        command: command.iter().map(|c| c.to_string()).collect(),
        agent_port: port,
        connect_timeout: Duration::from_secs(5),
        resize_poll_interval: Duration::from_millis(10),
    }
}

pub struct OnePod(pub PodStatus);

#[async_trait]
impl PodLookup for OnePod {
    async fn pod_status(&self, namespace: &str, name: &str) -> Result<PodStatus, DebugError> {
        if name == self.0.name {
            Ok(self.0.clone())
        } else {
            Err(DebugError::Cluster(format!(
                "pods \"{name}\" not found in {namespace}"
            )))
        }
    }
}

/// Terminal fake with a fixed size.
#[derive(Debug, Default)]
pub struct FakeTerminal {
    interactive: bool,
    raw: AtomicBool,
    enables: AtomicUsize,
    disables: AtomicUsize,
}

impl FakeTerminal {
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            ..Self::default()
        }
    }

    pub fn piped() -> Self {
        Self::default()
    }

    pub fn is_raw(&self) -> bool {
        self.raw.load(Ordering::SeqCst)
    }

    pub fn transitions(&self) -> (usize, usize) {
        (
            self.enables.load(Ordering::SeqCst),
            self.disables.load(Ordering::SeqCst),
        )
    }
}

impl TerminalDevice for FakeTerminal {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn enable_raw_mode(&self) -> io::Result<()> {
        self.enables.fetch_add(1, Ordering::SeqCst);
        self.raw.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disable_raw_mode(&self) -> io::Result<()> {
        self.disables.fetch_add(1, Ordering::SeqCst);
        self.raw.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn size(&self) -> io::Result<TerminalSize> {
        Ok(TerminalSize {
            width: 132,
            height: 43,
        })
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub notices: Mutex<Vec<String>>,
}

impl RenderSink for RecordingSink {
    fn notice(&self, msg: &str) {
        self.notices.lock().unwrap().push(msg.to_string());
    }

    fn warn(&self, _msg: &str) {}

    fn error(&self, _msg: &str) {}
}

/// Cloneable in-memory writer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl AsyncWrite for SharedBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Local output that rejects every write.
#[derive(Debug, Default)]
pub struct BrokenPipe;

impl AsyncWrite for BrokenPipe {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

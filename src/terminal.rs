//! Local terminal adapter: raw/cooked negotiation, resize sampling, and
//! guaranteed restoration.
//!
//! The adapter owns the local terminal for the whole session. Other
//! components only see the streams handed out in [`SessionIo`].

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

use crossterm::terminal;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Terminal dimensions as sent on the resize channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TerminalSize {
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalMode {
    /// Keystrokes pass straight through; stdout and stderr share one stream.
    Raw,
    /// Local line editing preserved; stderr stays separate.
    Cooked,
}

/// Operations the adapter needs from the local terminal device.
pub trait TerminalDevice: Send + Sync {
    /// Whether local input is attached to an interactive terminal.
    fn is_interactive(&self) -> bool;
    fn enable_raw_mode(&self) -> io::Result<()>;
    fn disable_raw_mode(&self) -> io::Result<()>;
    fn size(&self) -> io::Result<TerminalSize>;
}

/// The process's own controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTerminal;

impl TerminalDevice for LocalTerminal {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn enable_raw_mode(&self) -> io::Result<()> {
        terminal::enable_raw_mode()
    }

    fn disable_raw_mode(&self) -> io::Result<()> {
        terminal::disable_raw_mode()
    }

    fn size(&self) -> io::Result<TerminalSize> {
        let (width, height) = terminal::size()?;
        Ok(TerminalSize { width, height })
    }
}

/// Process stdio before the adapter decides how to expose it.
pub struct LocalStreams {
    pub stdin: BoxedReader,
    pub stdout: BoxedWriter,
    pub stderr: BoxedWriter,
}

impl LocalStreams {
    /// Streams bound to the current process's stdio.
    pub fn stdio() -> Self {
        Self {
            stdin: Box::new(tokio::io::stdin()),
            stdout: Box::new(tokio::io::stdout()),
            stderr: Box::new(tokio::io::stderr()),
        }
    }
}

/// Streams and event source handed to the transport.
pub struct SessionIo {
    pub tty: bool,
    pub stdin: BoxedReader,
    pub stdout: BoxedWriter,
    /// `None` in raw mode: the remote merges stderr into stdout.
    pub stderr: Option<BoxedWriter>,
    /// Present only in raw mode.
    pub resize: Option<mpsc::Receiver<TerminalSize>>,
}

/// Scoped ownership of the local terminal for one session.
///
/// Dropping the session stops the resize sampler and then restores the
/// terminal mode, on every exit path including unwinding.
pub struct TerminalSession {
    mode: TerminalMode,
    // Field order matters: the sampler stops before the mode is restored.
    resize: Option<ResizeMonitor>,
    _raw: Option<RawModeGuard>,
}

impl TerminalSession {
    /// Probe the device and negotiate raw or cooked mode.
    ///
    /// Must be called inside a tokio runtime; raw mode spawns the resize
    /// sampler.
    pub fn setup(
        device: Arc<dyn TerminalDevice>,
        streams: LocalStreams,
        poll_interval: Duration,
    ) -> (Self, SessionIo) {
        let LocalStreams {
            stdin,
            stdout,
            stderr,
        } = streams;

        if !device.is_interactive() {
            tracing::debug!("stdin is not a terminal; using cooked mode");
            return Self::cooked(stdin, stdout, stderr);
        }

        let raw = match RawModeGuard::acquire(Arc::clone(&device)) {
            Ok(guard) => guard,
            Err(e) => {
                tracing::warn!(error = %e, "failed to enter raw mode; using cooked mode");
                return Self::cooked(stdin, stdout, stderr);
            }
        };
        let (monitor, resize) = ResizeMonitor::spawn(device, poll_interval);
        tracing::debug!("terminal switched to raw mode");

        (
            Self {
                mode: TerminalMode::Raw,
                resize: Some(monitor),
                _raw: Some(raw),
            },
            SessionIo {
                tty: true,
                stdin,
                stdout,
                stderr: None,
                resize: Some(resize),
            },
        )
    }

    fn cooked(stdin: BoxedReader, stdout: BoxedWriter, stderr: BoxedWriter) -> (Self, SessionIo) {
        (
            Self {
                mode: TerminalMode::Cooked,
                resize: None,
                _raw: None,
            },
            SessionIo {
                tty: false,
                stdin,
                stdout,
                stderr: Some(stderr),
                resize: None,
            },
        )
    }

    pub fn mode(&self) -> TerminalMode {
        self.mode
    }

    /// Whether a resize sampler task was started for this session.
    pub fn samples_resizes(&self) -> bool {
        self.resize.is_some()
    }

    /// Stop the sampler and restore the terminal now.
    pub fn restore(self) {
        drop(self);
    }
}

/// Restores cooked mode when dropped.
struct RawModeGuard {
    device: Arc<dyn TerminalDevice>,
}

impl RawModeGuard {
    fn acquire(device: Arc<dyn TerminalDevice>) -> io::Result<Self> {
        device.enable_raw_mode()?;
        Ok(Self { device })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = self.device.disable_raw_mode() {
            tracing::warn!(error = %e, "failed to restore terminal mode");
        } else {
            tracing::debug!("terminal mode restored");
        }
    }
}

/// Background task that reports terminal size changes, aborted on drop.
struct ResizeMonitor {
    handle: JoinHandle<()>,
}

impl ResizeMonitor {
    fn spawn(
        device: Arc<dyn TerminalDevice>,
        poll_interval: Duration,
    ) -> (Self, mpsc::Receiver<TerminalSize>) {
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(async move {
            let mut last: Option<TerminalSize> = None;
            loop {
                match device.size() {
                    Ok(size) if size.width == 0 || size.height == 0 => {}
                    Ok(size) if last != Some(size) => {
                        if tx.send(size).await.is_err() {
                            break;
                        }
                        last = Some(size);
                    }
                    Ok(_) => {}
                    Err(e) => tracing::debug!(error = %e, "failed to sample terminal size"),
                }
                tokio::time::sleep(poll_interval).await;
            }
        });
        (Self { handle }, rx)
    }
}

impl Drop for ResizeMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

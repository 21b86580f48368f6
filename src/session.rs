//! Session runner: one debug invocation from options to stream completion.
//!
//! The runner strictly sequences validate -> fetch pod -> resolve target ->
//! build request -> take the terminal -> stream. Every failure before
//! streaming happens without contacting the agent, and the terminal is always
//! restored before a result is returned.

use std::sync::Arc;

use tracing::Instrument;

use crate::cluster::PodLookup;
use crate::config::SessionOptions;
use crate::error::DebugError;
use crate::request::DebugRequest;
use crate::resolve::{resolve, ResolvedTarget};
use crate::terminal::{LocalStreams, TerminalDevice, TerminalMode, TerminalSession};
use crate::transport::StreamTransport;
use crate::ui::RenderSink;

/// Shown when local input cannot be put in raw mode.
pub const NO_TTY_NOTICE: &str =
    "Unable to use a TTY - input is not a terminal or the right kind of file";

/// Lifecycle of one invocation. `Closed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Validated,
    Resolved,
    Streaming,
    Closed,
    Failed,
}

/// Outcome of a session that ended cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub target: ResolvedTarget,
    pub mode: TerminalMode,
    pub state: SessionState,
}

/// Wires the collaborators of one debug invocation together.
pub struct DebugSession {
    pods: Arc<dyn PodLookup>,
    terminal: Arc<dyn TerminalDevice>,
    transport: Arc<dyn StreamTransport>,
    notices: Arc<dyn RenderSink>,
}

impl DebugSession {
    pub fn new(
        pods: Arc<dyn PodLookup>,
        terminal: Arc<dyn TerminalDevice>,
        transport: Arc<dyn StreamTransport>,
        notices: Arc<dyn RenderSink>,
    ) -> Self {
        Self {
            pods,
            terminal,
            transport,
            notices,
        }
    }

    /// Run one session against the local `streams`.
    pub async fn run(
        &self,
        options: &SessionOptions,
        streams: LocalStreams,
    ) -> Result<SessionSummary, DebugError> {
        let span = tracing::info_span!(
            "debug_session",
            namespace = %options.namespace,
            pod = %options.pod_name,
        );
        async {
            let mut state = SessionState::Init;
            let result = self.drive(options, streams, &mut state).await;
            match result {
                Ok(mut summary) => {
                    advance(&mut state, SessionState::Closed);
                    summary.state = state;
                    Ok(summary)
                }
                Err(err) => {
                    advance(&mut state, SessionState::Failed);
                    tracing::debug!(error = %err, pre_connect = err.is_pre_connect(), "session failed");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        options: &SessionOptions,
        streams: LocalStreams,
        state: &mut SessionState,
    ) -> Result<SessionSummary, DebugError> {
        options.validate()?;
        advance(state, SessionState::Validated);

        let pod = self
            .pods
            .pod_status(&options.namespace, &options.pod_name)
            .await?;
        let resolution = resolve(&pod, options.container_name.as_deref())?;
        if let Some(notice) = &resolution.notice {
            self.notices.notice(notice);
        }
        let target = resolution.target;
        advance(state, SessionState::Resolved);

        let request = DebugRequest::build(
            &options.namespace,
            &options.pod_name,
            &target,
            &options.image,
            &options.command,
            options.agent_port,
        )?;
        tracing::debug!(
            container = %target.container_name,
            container_id = %target.container_id,
            agent = %request.endpoint,
            image = %request.image,
            "built debug request"
        );

        let (terminal, io) = TerminalSession::setup(
            Arc::clone(&self.terminal),
            streams,
            options.resize_poll_interval,
        );
        let mode = terminal.mode();
        if mode == TerminalMode::Cooked {
            self.notices.notice(NO_TTY_NOTICE);
        }

        advance(state, SessionState::Streaming);
        let outcome = self.transport.execute(&request, io).await;
        terminal.restore();
        outcome?;

        Ok(SessionSummary {
            target,
            mode,
            state: *state,
        })
    }
}

fn advance(state: &mut SessionState, next: SessionState) {
    tracing::debug!(from = ?*state, to = ?next, "session state");
    *state = next;
}

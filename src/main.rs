//! CLI entry point for kubectl-debug.

mod cli;

use std::sync::Arc;

use clap::Parser;

use kubectl_debug::cluster::{ClusterConnection, KubePodLookup};
use kubectl_debug::config::{load_file_config, SessionOptions};
use kubectl_debug::error::DebugError;
use kubectl_debug::logging::init_logging;
use kubectl_debug::session::{DebugSession, SessionSummary};
use kubectl_debug::terminal::{LocalStreams, LocalTerminal};
use kubectl_debug::transport::WebSocketTransport;
use kubectl_debug::ui::{RenderSink, Renderer};

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    init_logging(args.verbose);
    let renderer: Arc<dyn RenderSink> = Arc::new(Renderer::new(!args.no_color));

    let code = match run(&args, Arc::clone(&renderer)).await {
        Ok(summary) => {
            tracing::debug!(
                container = %summary.target.container_name,
                mode = ?summary.mode,
                "debug session closed"
            );
            0
        }
        Err(err) => {
            renderer.error(&err.to_string());
            err.exit_code()
        }
    };
    // Exit explicitly: a pending stdin read would otherwise hold the runtime open.
    std::process::exit(code);
}

async fn run(args: &cli::Args, renderer: Arc<dyn RenderSink>) -> Result<SessionSummary, DebugError> {
    let overrides = args.overrides();
    overrides.require_pod()?;

    let loaded = load_file_config(args.debug_config.as_deref())?;
    for warning in &loaded.diagnostics.warnings {
        renderer.warn(warning);
    }

    let cluster = ClusterConnection::connect(&args.cluster_options()).await?;
    let options = SessionOptions::resolve(overrides, &loaded.file, &cluster.default_namespace)?;
    let transport = WebSocketTransport::new(cluster.transport_config(options.connect_timeout));

    let session = DebugSession::new(
        Arc::new(KubePodLookup::new(cluster.client.clone())),
        Arc::new(LocalTerminal),
        Arc::new(transport),
        renderer,
    );
    session.run(&options, LocalStreams::stdio()).await
}

//! kubectl-debug: run a throwaway debug container beside a live pod
//! container and attach the local terminal to it.
//!
//! The flow is: merge options ([`config`]), fetch the pod ([`cluster`]),
//! pick the target container ([`resolve`]), build the agent request
//! ([`request`]), take over the terminal ([`terminal`]), and relay the
//! session over the agent's channel stream ([`transport`]). [`session`]
//! sequences those steps.
//!
//! ```no_run
//! use std::sync::Arc;
//! use kubectl_debug::cluster::{ClusterConnection, ClusterOptions, KubePodLookup};
//! use kubectl_debug::config::{CliOverrides, FileConfig, SessionOptions};
//! use kubectl_debug::session::DebugSession;
//! use kubectl_debug::terminal::{LocalStreams, LocalTerminal};
//! use kubectl_debug::transport::WebSocketTransport;
//! use kubectl_debug::ui::Renderer;
//!
//! # async fn example() -> Result<(), kubectl_debug::error::DebugError> {
//! let cluster = ClusterConnection::connect(&ClusterOptions::default()).await?;
//! let overrides = CliOverrides { pod: Some("web-0".into()), ..Default::default() };
//! let options = SessionOptions::resolve(overrides, &FileConfig::default(), &cluster.default_namespace)?;
//! let session = DebugSession::new(
//!     Arc::new(KubePodLookup::new(cluster.client.clone())),
//!     Arc::new(LocalTerminal),
//!     Arc::new(WebSocketTransport::new(cluster.transport_config(options.connect_timeout))),
//!     Arc::new(Renderer::new(true)),
//! );
//! session.run(&options, LocalStreams::stdio()).await?;
//! # Ok(())
//! # }
//! ```

pub mod build_info;
pub mod cluster;
pub mod config;
pub mod error;
pub mod logging;
pub mod request;
pub mod resolve;
pub mod session;
pub mod terminal;
pub mod transport;
pub mod types;
pub mod ui;

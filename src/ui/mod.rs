//! User-facing status output on stderr.

pub mod render;

pub use render::{RenderSink, Renderer};

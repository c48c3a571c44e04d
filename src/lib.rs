//! Self-sustaining particle "firework" overlay for a host surface.
//!
//! An effect binds to one host, picks a canvas (immediate-mode) renderer
//! when it can and a per-element renderer otherwise, and keeps bursting
//! until stopped or destroyed. Time only moves when the embedder calls
//! [`Fireworks::advance_to`] / [`Fireworks::animation_frame`].
//!
//! ```no_run
//! use fireworks_overlay::{create, Document, HostSurface, PartialConfig};
//!
//! let doc = Document::new();
//! let host = HostSurface::new(doc, 640.0, 480.0).into_handle();
//! let mut fx = create(host, &PartialConfig::default());
//! fx.animation_frame(16.0);
//! fx.destroy();
//! ```

pub mod burst;
pub mod color;
pub mod composite;
pub mod config;
pub mod document;
pub mod error;
pub mod fireworks;
pub mod gamma;
pub mod host;
pub mod particle;
pub mod random;
pub mod renderer;
pub mod scheduler;
pub mod styles;
pub mod types;

pub use config::{Config, PartialConfig, PartialSpan, Span};
pub use document::Document;
pub use error::{Error, Result};
pub use fireworks::Fireworks;
pub use host::{HostHandle, HostSurface};
pub use renderer::RendererKind;
pub use types::FrameBuffer;

/// Build an effect on `host` and start it.
pub fn create(host: HostHandle, config: &PartialConfig) -> Fireworks {
    Fireworks::new(host, config)
}

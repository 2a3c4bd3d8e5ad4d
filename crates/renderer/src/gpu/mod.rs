//! wgpu frame target for the dither background.
//!
//! - `context` acquires the instance/adapter/device/surface for a window and
//!   reconfigures the swapchain on resize. Every failure on this path is a
//!   [`ContextError`](crate::ContextError) so the background can fall back.
//! - `pipeline` builds the full-screen-triangle pipeline, the uniform buffer
//!   and its bind group.
//! - `target` implements [`FrameTarget`](crate::FrameTarget): upload the
//!   per-frame uniforms, clear to the fallback colour, draw, present.

mod context;
mod pipeline;
mod target;

pub use target::GpuTarget;

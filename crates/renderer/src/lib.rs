//! Renderer crate for dithershade.
//!
//! Paints an animated, colour-quantized wave/noise pattern as a full-surface
//! background. The flow is:
//!
//! ```text
//!   CLI / dithershade
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ─────▶ winit loop ──▶ SurfaceEvents ──┐
//!          │                  │ RedrawRequested         │ drained per frame
//!          │                  ▼                         ▼
//!          │            DitherBackground<GpuTarget>::on_frame ─▶ DitherUniforms ─▶ GPU UBO
//!          │
//!   Renderer::export_still ─▶ DitherBackground<Canvas>::on_frame ─▶ PNG
//! ```
//!
//! [`DitherBackground`] owns the lifecycle (inactive, rendering, fallback) and
//! is generic over a [`FrameTarget`]. [`GpuTarget`] draws through wgpu with
//! a GLSL fragment shader; [`Canvas`] evaluates the same math on the CPU from
//! [`pattern`] and backs headless still export and the tests.

mod background;
mod canvas;
mod compile;
mod events;
mod gpu;
pub mod pattern;
mod pointer;
mod runtime;
mod types;
mod uniforms;
mod window;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

pub use background::{
    BackgroundStatus, ContextError, DitherBackground, FrameError, FrameOutcome, FrameTarget,
};
pub use canvas::Canvas;
pub use events::{Subscription, SurfaceEvent, SurfaceEvents};
pub use gpu::GpuTarget;
pub use pointer::PointerState;
pub use runtime::{
    BoxedTimeSource, FixedTimeSource, FrameClock, FramePacer, SystemTimeSource, TimeSample,
    TimeSource,
};
pub use types::{
    DitherParams, RendererConfig, SurfaceSize, FALLBACK_BACKGROUND, MIN_POINTER_RADIUS,
};
pub use uniforms::{DitherUniforms, Frame};

/// A single frame rendered on the CPU and written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct StillRequest {
    /// Frame clock value in seconds.
    pub time: f32,
    /// Pointer in client pixels (top-left origin); `None` keeps the centre.
    pub pointer: Option<[f64; 2]>,
    pub output: PathBuf,
}

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the preview window and blocks until it is closed.
    ///
    /// A missing GPU is not an error: the window stays open on the static
    /// background. Errors only come from the windowing system itself.
    pub fn run(&mut self) -> Result<()> {
        window::run_window(&self.config)
    }

    /// Renders one frame at `request.time` through the CPU canvas and writes
    /// it as PNG.
    pub fn export_still(&self, request: &StillRequest) -> Result<()> {
        self.export_with(request, |size| Ok(Canvas::new(size)))
    }

    /// A canvas that cannot be acquired still produces an image: the still is
    /// filled with the static fallback background, as the window would show.
    fn export_with<F>(&self, request: &StillRequest, acquire: F) -> Result<()>
    where
        F: FnOnce(SurfaceSize) -> std::result::Result<Canvas, ContextError>,
    {
        let size = self.config.surface_size;
        if size.is_empty() {
            bail!("cannot export a {}x{} frame", size.width, size.height);
        }
        let mut background =
            DitherBackground::new(self.config.params).with_frame_budget(self.config.frame_budget);
        background.initialize(size, acquire);

        if let Some([x, y]) = request.pointer {
            background.on_pointer_move(x, y, size.width as f64, size.height as f64);
        }

        let mut clock = FrameClock::fixed(request.time);
        let fallback;
        let canvas = match background.on_frame(clock.sample().seconds) {
            FrameOutcome::Submitted => match background.target() {
                Some(canvas) => canvas,
                None => bail!("canvas target is not active"),
            },
            FrameOutcome::Fallback => {
                tracing::warn!("canvas unavailable; exporting the fallback background");
                fallback = Canvas::new(size);
                &fallback
            }
            other => bail!("still frame was not rendered ({other:?})"),
        };

        canvas
            .save_png(&request.output)
            .with_context(|| format!("failed to export still frame at t={}s", request.time))?;
        tracing::info!(
            path = %request.output.display(),
            width = size.width,
            height = size.height,
            time = request.time,
            "still frame written"
        );
        Ok(())
    }
}

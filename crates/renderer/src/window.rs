use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use tracing::{info, warn};

use crate::background::{BackgroundStatus, DitherBackground, FrameOutcome, FrameTarget};
use crate::events::{SurfaceEvent, SurfaceEvents};
use crate::gpu::GpuTarget;
use crate::runtime::{FrameClock, FramePacer};
use crate::types::{RendererConfig, SurfaceSize};

/// Opens the preview window and drives the background from the `winit`
/// event loop until the window is closed.
///
/// Pointer and resize events are not handed to the background directly: they
/// are published on a [`SurfaceEvents`] hub the background subscribes to, and
/// drained at the start of each frame.
pub(crate) fn run_window(config: &RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let requested = config.surface_size;
    let window = WindowBuilder::new()
        .with_title("dithershade")
        .with_inner_size(PhysicalSize::new(requested.width.max(1), requested.height.max(1)))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let inner = window.inner_size();
    let surface = SurfaceSize::new(inner.width, inner.height);

    let mut events = SurfaceEvents::new();
    let mut background =
        DitherBackground::new(config.params).with_frame_budget(config.frame_budget);
    let target_window = window.clone();
    let status = background.initialize(surface, move |size| GpuTarget::new(target_window, size));
    background.subscribe(&mut events);

    if let Some(target) = background.target() {
        info!(adapter = %target.adapter_name(), "preview window rendering");
    }
    if status == BackgroundStatus::Fallback {
        let [r, g, b] = background.fallback_color();
        warn!(
            "no drawing context; the window keeps the static background ({:.3}, {:.3}, {:.3})",
            r, g, b
        );
    }

    let mut clock = FrameClock::system();
    let mut pacer = FramePacer::new(config.target_fps);
    window.request_redraw();

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                background.teardown();
                elwt.exit();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let size = window.inner_size();
                events.publish(SurfaceEvent::PointerMoved {
                    x: position.x,
                    y: position.y,
                    width: size.width as f64,
                    height: size.height as f64,
                });
            }
            WindowEvent::Resized(new_size) => {
                events.publish(SurfaceEvent::Resized(SurfaceSize::new(
                    new_size.width,
                    new_size.height,
                )));
                window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let sample = clock.sample();
                match background.on_frame(sample.seconds) {
                    FrameOutcome::Submitted | FrameOutcome::Skipped => pacer.mark_rendered(now),
                    FrameOutcome::Fallback | FrameOutcome::Inactive => {}
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            let now = Instant::now();
            match plan_redraw(&background, &pacer, now) {
                RedrawPlan::Now => {
                    tracing::trace!("pacer: issuing redraw now");
                    window.request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                }
                RedrawPlan::WaitUntil(deadline) => {
                    tracing::trace!(
                        deadline_ms = deadline.saturating_duration_since(now).as_millis(),
                        "pacer: waiting until next frame"
                    );
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                }
                RedrawPlan::Idle => elwt.set_control_flow(ControlFlow::Wait),
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RedrawPlan {
    Now,
    WaitUntil(Instant),
    /// Sleep until the OS delivers an event; a `Resized` requests its own redraw.
    Idle,
}

/// Decides whether the loop should ask for another frame. Nothing is
/// presented for a zero-sized or fallback surface, so vsync cannot throttle
/// those and the loop must idle instead.
fn plan_redraw<T: FrameTarget>(
    background: &DitherBackground<T>,
    pacer: &FramePacer,
    now: Instant,
) -> RedrawPlan {
    if !background.is_active() || background.is_fallback() || background.surface().is_empty() {
        return RedrawPlan::Idle;
    }
    if pacer.ready_for_frame(now) {
        RedrawPlan::Now
    } else if let Some(deadline) = pacer.next_deadline() {
        RedrawPlan::WaitUntil(deadline)
    } else {
        RedrawPlan::Idle
    }
}

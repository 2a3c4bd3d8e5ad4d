//! The dithered wave background component.
//!
//! ```text
//!            initialize(acquire)             teardown()
//!  Inactive ─────────────────────▶ Active ─────────────▶ Inactive
//!                                   │  ├─ Rendering(target)
//!                                   │  └─ Fallback (no context; frames are no-ops)
//!                                   └── on_frame / on_pointer_move / on_resize
//! ```
//!
//! The component never reports rendering failures to its host: a missing or
//! lost drawing context degrades to the static fallback background and stays
//! there until the next `initialize`.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::events::{Subscription, SurfaceEvent, SurfaceEvents};
use crate::pointer::PointerState;
use crate::types::{DitherParams, SurfaceSize, FALLBACK_BACKGROUND};
use crate::uniforms::Frame;

/// The drawing context could not be acquired.
#[derive(Debug, thiserror::Error)]
#[error("failed to acquire drawing context ({stage}): {message}")]
pub struct ContextError {
    pub stage: &'static str,
    pub message: String,
}

impl ContextError {
    pub fn new(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }
}

/// Why a single frame could not be submitted.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The surface must be reconfigured before the next frame.
    #[error("surface lost or outdated")]
    Reconfigure,
    /// The next frame was not ready in time; try again next frame.
    #[error("timed out acquiring the next frame")]
    Timeout,
    /// The context is unusable for the rest of this mount.
    #[error("drawing context lost: {0}")]
    ContextLost(String),
}

/// A place frames can be submitted to.
pub trait FrameTarget {
    /// Applies a new surface size. Zero-sized surfaces must be accepted.
    fn resize(&mut self, size: SurfaceSize);
    /// Draws and presents one frame.
    fn submit(&mut self, frame: &Frame) -> Result<(), FrameError>;
}

/// Lifecycle state reported after initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundStatus {
    Rendering,
    Fallback,
}

/// What happened to a call to [`DitherBackground::on_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Submitted,
    /// Zero-sized surface, timeout, or surface reconfiguration.
    Skipped,
    Fallback,
    Inactive,
}

enum Lifecycle<T> {
    Inactive,
    Rendering(T),
    Fallback,
}

#[derive(Debug)]
struct FrameStats {
    frames_since_report: u32,
    last_report: Instant,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            frames_since_report: 0,
            last_report: Instant::now(),
        }
    }
}

pub struct DitherBackground<T: FrameTarget> {
    params: DitherParams,
    lifecycle: Lifecycle<T>,
    surface: SurfaceSize,
    pointer: PointerState,
    subscription: Option<Subscription>,
    frame_budget: Duration,
    stats: FrameStats,
}

impl<T: FrameTarget> DitherBackground<T> {
    /// Creates an inactive background with fixed shader parameters.
    pub fn new(params: DitherParams) -> Self {
        Self {
            params,
            lifecycle: Lifecycle::Inactive,
            surface: SurfaceSize::default(),
            pointer: PointerState::default(),
            subscription: None,
            frame_budget: Duration::from_millis(4),
            stats: FrameStats::default(),
        }
    }

    pub fn with_frame_budget(mut self, budget: Duration) -> Self {
        self.frame_budget = budget;
        self
    }

    /// Acquires a drawing target for `surface` and becomes active.
    ///
    /// An active background is torn down first, so calling this again is a
    /// remount. An existing subscription survives a remount that renders, with
    /// events queued for the previous mount discarded. Acquisition failures
    /// are logged and leave the background in fallback mode, which holds no
    /// subscription.
    pub fn initialize<F>(&mut self, surface: SurfaceSize, acquire: F) -> BackgroundStatus
    where
        F: FnOnce(SurfaceSize) -> Result<T, ContextError>,
    {
        let subscription = self.subscription.take();
        if self.is_active() {
            self.teardown();
        }

        self.surface = surface;
        self.pointer.reset();
        self.stats = FrameStats::default();

        match acquire(surface) {
            Ok(target) => {
                info!(
                    width = surface.width,
                    height = surface.height,
                    "dither background active"
                );
                self.lifecycle = Lifecycle::Rendering(target);
                self.subscription = subscription.map(|subscription| {
                    subscription.drain().for_each(drop);
                    subscription
                });
                BackgroundStatus::Rendering
            }
            Err(err) => {
                warn!(error = %err, "drawing context unavailable; using static background");
                self.lifecycle = Lifecycle::Fallback;
                BackgroundStatus::Fallback
            }
        }
    }

    /// Registers this background with a host event hub, replacing any
    /// previous subscription. Only a rendering background subscribes; in
    /// fallback nothing would ever drain the queue.
    pub fn subscribe(&mut self, events: &mut SurfaceEvents) {
        if !matches!(self.lifecycle, Lifecycle::Rendering(_)) {
            debug!("background is not rendering; skipping event subscription");
            return;
        }
        self.subscription = Some(events.subscribe());
    }

    /// Evaluates and submits one frame at `elapsed_seconds`.
    pub fn on_frame(&mut self, elapsed_seconds: f32) -> FrameOutcome {
        self.drain_events();

        let started = Instant::now();
        let outcome = match &mut self.lifecycle {
            Lifecycle::Inactive => return FrameOutcome::Inactive,
            Lifecycle::Fallback => return FrameOutcome::Fallback,
            Lifecycle::Rendering(_) if self.surface.is_empty() => return FrameOutcome::Skipped,
            Lifecycle::Rendering(target) => {
                let time = if elapsed_seconds.is_finite() {
                    elapsed_seconds.max(0.0)
                } else {
                    0.0
                };
                let frame = Frame {
                    params: self.params,
                    time,
                    pointer: self.pointer.position(),
                    surface: self.surface,
                };
                match target.submit(&frame) {
                    Ok(()) => FrameOutcome::Submitted,
                    Err(FrameError::Reconfigure) => {
                        debug!("surface lost or outdated; reconfiguring");
                        target.resize(self.surface);
                        FrameOutcome::Skipped
                    }
                    Err(FrameError::Timeout) => {
                        debug!("surface timeout; retrying next frame");
                        FrameOutcome::Skipped
                    }
                    Err(FrameError::ContextLost(reason)) => {
                        warn!(%reason, "drawing context lost; switching to static background");
                        self.lifecycle = Lifecycle::Fallback;
                        self.subscription = None;
                        return FrameOutcome::Fallback;
                    }
                }
            }
        };

        self.record_frame(started, elapsed_seconds);
        outcome
    }

    /// Updates the pointer from client coordinates and the surface
    /// dimensions known at call time.
    pub fn on_pointer_move(&mut self, client_x: f64, client_y: f64, width: f64, height: f64) {
        self.pointer.handle_move(client_x, client_y, width, height);
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        let size = SurfaceSize::new(width, height);
        if size == self.surface {
            return;
        }
        self.surface = size;
        if let Lifecycle::Rendering(target) = &mut self.lifecycle {
            target.resize(size);
        }
    }

    /// Releases the target and the event subscription. Idempotent.
    pub fn teardown(&mut self) {
        let was_active = self.is_active();
        self.lifecycle = Lifecycle::Inactive;
        self.subscription = None;
        if was_active {
            info!("dither background torn down");
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.lifecycle, Lifecycle::Inactive)
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Fallback)
    }

    pub fn target(&self) -> Option<&T> {
        match &self.lifecycle {
            Lifecycle::Rendering(target) => Some(target),
            _ => None,
        }
    }

    pub fn params(&self) -> &DitherParams {
        &self.params
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn pointer(&self) -> [f32; 2] {
        self.pointer.position()
    }

    /// Colour the host should show behind (or instead of) the effect.
    pub fn fallback_color(&self) -> [f32; 3] {
        FALLBACK_BACKGROUND
    }

    fn drain_events(&mut self) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        for event in subscription.drain() {
            match event {
                SurfaceEvent::PointerMoved {
                    x,
                    y,
                    width,
                    height,
                } => self.on_pointer_move(x, y, width, height),
                SurfaceEvent::Resized(size) => self.on_resize(size.width, size.height),
            }
        }
        self.subscription = Some(subscription);
    }

    fn record_frame(&mut self, started: Instant, time: f32) {
        let now = Instant::now();
        let spent = now.saturating_duration_since(started);
        if spent > self.frame_budget {
            warn!(
                "frame took {}us, over the budget of {}us",
                spent.as_micros(),
                self.frame_budget.as_micros()
            );
        }

        self.stats.frames_since_report += 1;
        let since_report = now.saturating_duration_since(self.stats.last_report);
        if since_report >= Duration::from_secs(1) {
            let fps = self.stats.frames_since_report as f32 / since_report.as_secs_f32();
            debug!(
                fps = fps.round(),
                time,
                width = self.surface.width,
                height = self.surface.height,
                "render stats"
            );
            self.stats.frames_since_report = 0;
            self.stats.last_report = now;
        }
    }
}

impl<T: FrameTarget> Drop for DitherBackground<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingTarget {
        frames: Vec<Frame>,
        sizes: Vec<SurfaceSize>,
        fail_next: Option<FrameError>,
    }

    impl FrameTarget for RecordingTarget {
        fn resize(&mut self, size: SurfaceSize) {
            self.sizes.push(size);
        }

        fn submit(&mut self, frame: &Frame) -> Result<(), FrameError> {
            if let Some(err) = self.fail_next.take() {
                return Err(err);
            }
            self.frames.push(*frame);
            Ok(())
        }
    }

    fn active(surface: SurfaceSize) -> DitherBackground<RecordingTarget> {
        let mut background = DitherBackground::new(DitherParams::default());
        let status = background.initialize(surface, |_| Ok(RecordingTarget::default()));
        assert_eq!(status, BackgroundStatus::Rendering);
        background
    }

    #[test]
    fn inactive_background_ignores_frames() {
        let mut background = DitherBackground::<RecordingTarget>::new(DitherParams::default());
        assert!(!background.is_active());
        assert_eq!(background.on_frame(0.0), FrameOutcome::Inactive);
    }

    #[test]
    fn acquisition_failure_degrades_to_fallback() {
        let mut background = DitherBackground::<RecordingTarget>::new(DitherParams::default());
        let status = background.initialize(SurfaceSize::new(64, 64), |_| {
            Err(ContextError::new("adapter", "no hardware acceleration"))
        });
        assert_eq!(status, BackgroundStatus::Fallback);
        assert!(background.is_active());
        assert!(background.is_fallback());
        assert_eq!(background.on_frame(1.0), FrameOutcome::Fallback);
        assert_eq!(background.fallback_color(), FALLBACK_BACKGROUND);
    }

    #[test]
    fn frames_carry_time_pointer_and_surface() {
        let mut background = active(SurfaceSize::new(100, 50));
        background.on_pointer_move(25.0, 0.0, 100.0, 50.0);
        assert_eq!(background.on_frame(2.5), FrameOutcome::Submitted);

        let frame = background.target().unwrap().frames[0];
        assert_eq!(frame.time, 2.5);
        assert_eq!(frame.pointer, [0.25, 1.0]);
        assert_eq!(frame.surface, SurfaceSize::new(100, 50));
    }

    #[test]
    fn zero_resize_then_restore_keeps_rendering() {
        let mut background = active(SurfaceSize::new(320, 240));
        background.on_resize(0, 0);
        assert_eq!(background.on_frame(0.5), FrameOutcome::Skipped);
        background.on_resize(320, 240);
        assert_eq!(background.on_frame(0.6), FrameOutcome::Submitted);

        let target = background.target().unwrap();
        assert_eq!(
            target.sizes,
            vec![SurfaceSize::new(0, 0), SurfaceSize::new(320, 240)]
        );
    }

    #[test]
    fn teardown_twice_is_harmless() {
        let mut background = active(SurfaceSize::new(8, 8));
        background.teardown();
        background.teardown();
        assert!(!background.is_active());
        assert_eq!(background.on_frame(1.0), FrameOutcome::Inactive);
    }

    #[test]
    fn teardown_releases_subscription() {
        let mut events = SurfaceEvents::new();
        let mut background = active(SurfaceSize::new(8, 8));
        background.subscribe(&mut events);
        assert_eq!(events.subscriber_count(), 1);

        background.teardown();
        events.publish(SurfaceEvent::Resized(SurfaceSize::new(4, 4)));
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn subscribed_events_apply_before_the_frame() {
        let mut events = SurfaceEvents::new();
        let mut background = active(SurfaceSize::new(10, 10));
        background.subscribe(&mut events);

        events.publish(SurfaceEvent::Resized(SurfaceSize::new(200, 100)));
        events.publish(SurfaceEvent::PointerMoved {
            x: 50.0,
            y: 50.0,
            width: 200.0,
            height: 100.0,
        });
        background.on_frame(0.0);

        let frame = background.target().unwrap().frames[0];
        assert_eq!(frame.surface, SurfaceSize::new(200, 100));
        assert_eq!(frame.pointer, [0.25, 0.5]);
    }

    #[test]
    fn surface_errors_are_absorbed() {
        let mut background = DitherBackground::new(DitherParams::default());
        background.initialize(SurfaceSize::new(16, 16), |_| {
            Ok(RecordingTarget {
                fail_next: Some(FrameError::Reconfigure),
                ..RecordingTarget::default()
            })
        });
        assert_eq!(background.on_frame(0.0), FrameOutcome::Skipped);
        assert_eq!(
            background.target().unwrap().sizes,
            vec![SurfaceSize::new(16, 16)]
        );
        assert_eq!(background.on_frame(0.1), FrameOutcome::Submitted);
    }

    #[test]
    fn lost_context_switches_to_fallback() {
        let mut background = DitherBackground::new(DitherParams::default());
        background.initialize(SurfaceSize::new(16, 16), |_| {
            Ok(RecordingTarget {
                fail_next: Some(FrameError::ContextLost("out of memory".into())),
                ..RecordingTarget::default()
            })
        });
        assert_eq!(background.on_frame(0.0), FrameOutcome::Fallback);
        assert!(background.is_fallback());
        assert_eq!(background.on_frame(0.1), FrameOutcome::Fallback);
    }

    #[test]
    fn reinitialize_resets_pointer() {
        let mut background = active(SurfaceSize::new(10, 10));
        background.on_pointer_move(0.0, 0.0, 10.0, 10.0);
        assert_eq!(background.pointer(), [0.0, 1.0]);
        background.initialize(SurfaceSize::new(10, 10), |_| Ok(RecordingTarget::default()));
        assert_eq!(background.pointer(), [0.5, 0.5]);
    }

    #[test]
    fn remount_keeps_subscription_and_drops_stale_events() {
        let mut events = SurfaceEvents::new();
        let mut background = active(SurfaceSize::new(10, 10));
        background.subscribe(&mut events);

        events.publish(SurfaceEvent::PointerMoved {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        });
        background.initialize(SurfaceSize::new(20, 20), |_| Ok(RecordingTarget::default()));
        assert_eq!(events.subscriber_count(), 1);

        background.on_frame(0.0);
        let frame = background.target().unwrap().frames[0];
        assert_eq!(frame.pointer, [0.5, 0.5]);
        assert_eq!(frame.surface, SurfaceSize::new(20, 20));

        events.publish(SurfaceEvent::Resized(SurfaceSize::new(40, 30)));
        background.on_frame(0.1);
        assert_eq!(
            background.target().unwrap().frames[1].surface,
            SurfaceSize::new(40, 30)
        );
    }

    #[test]
    fn fallback_background_never_queues_events() {
        let mut events = SurfaceEvents::new();
        let mut background = DitherBackground::<RecordingTarget>::new(DitherParams::default());
        background.initialize(SurfaceSize::new(64, 64), |_| {
            Err(ContextError::new("adapter", "no hardware acceleration"))
        });
        background.subscribe(&mut events);
        assert_eq!(events.subscriber_count(), 0);

        for step in 0..10_000 {
            events.publish(SurfaceEvent::PointerMoved {
                x: step as f64,
                y: 1.0,
                width: 64.0,
                height: 64.0,
            });
        }
        assert_eq!(events.subscriber_count(), 0);
        assert_eq!(background.pointer(), [0.5, 0.5]);
    }

    #[test]
    fn lost_context_releases_subscription() {
        let mut events = SurfaceEvents::new();
        let mut background = DitherBackground::new(DitherParams::default());
        background.initialize(SurfaceSize::new(16, 16), |_| {
            Ok(RecordingTarget {
                fail_next: Some(FrameError::ContextLost("out of memory".into())),
                ..RecordingTarget::default()
            })
        });
        background.subscribe(&mut events);
        assert_eq!(events.subscriber_count(), 1);

        assert_eq!(background.on_frame(0.0), FrameOutcome::Fallback);
        events.publish(SurfaceEvent::Resized(SurfaceSize::new(8, 8)));
        assert_eq!(events.subscriber_count(), 0);
    }
}

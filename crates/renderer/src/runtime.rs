//! Frame timing: the elapsed-time clock fed to the background and the pacer
//! that turns an FPS cap into event loop deadlines.

use std::time::{Duration, Instant};

/// What the clock hands to one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    pub seconds: f32,
    /// Counts from zero since the clock was created or last reset.
    pub frame_index: u64,
}

/// Where elapsed seconds come from. Frame counting lives in [`FrameClock`].
pub trait TimeSource: Send {
    fn elapsed_seconds(&self) -> f32;
    fn restart(&mut self);
}

pub type BoxedTimeSource = Box<dyn TimeSource>;

/// Seconds since the source was created or restarted.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn elapsed_seconds(&self) -> f32 {
        self.origin.elapsed().as_secs_f32()
    }

    fn restart(&mut self) {
        self.origin = Instant::now();
    }
}

/// Stuck at one timestamp; restarting changes nothing.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource(pub f32);

impl TimeSource for FixedTimeSource {
    fn elapsed_seconds(&self) -> f32 {
        self.0
    }

    fn restart(&mut self) {}
}

/// Monotonic elapsed time handed to the background each frame.
///
/// The clock starts at zero when created and again after [`FrameClock::reset`],
/// which hosts call when the background is remounted.
pub struct FrameClock {
    source: BoxedTimeSource,
    frames: u64,
}

impl FrameClock {
    pub fn new(source: BoxedTimeSource) -> Self {
        Self { source, frames: 0 }
    }

    pub fn system() -> Self {
        Self::new(Box::<SystemTimeSource>::default())
    }

    /// Clock frozen at `seconds`, used for still frames.
    pub fn fixed(seconds: f32) -> Self {
        Self::new(Box::new(FixedTimeSource(seconds)))
    }

    pub fn sample(&mut self) -> TimeSample {
        let sample = TimeSample {
            seconds: self.source.elapsed_seconds(),
            frame_index: self.frames,
        };
        self.frames = self.frames.saturating_add(1);
        sample
    }

    pub fn reset(&mut self) {
        self.source.restart();
        self.frames = 0;
    }
}

/// Turns an optional FPS cap into redraw deadlines for the event loop.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Option<Duration>,
    last_frame: Option<Instant>,
}

impl FramePacer {
    /// Builds a pacer; `None`, zero, negative or non-finite caps mean uncapped.
    pub fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .map(|fps| Duration::from_secs_f32(1.0 / fps));
        Self {
            interval,
            last_frame: None,
        }
    }

    /// Whether a frame may be drawn at `now`.
    pub fn ready_for_frame(&self, now: Instant) -> bool {
        self.next_deadline().map_or(true, |deadline| now >= deadline)
    }

    /// When the next frame becomes due. `None` while uncapped or before the first frame.
    pub fn next_deadline(&self) -> Option<Instant> {
        Some(self.last_frame? + self.interval?)
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}

/// Background painted behind the effect and used when no GPU context exists
/// (slate-900, `#0f172a`).
pub const FALLBACK_BACKGROUND: [f32; 3] = [15.0 / 255.0, 23.0 / 255.0, 42.0 / 255.0];

/// Smallest pointer radius accepted before inverting it into a falloff intensity.
pub const MIN_POINTER_RADIUS: f32 = 1.0e-3;

/// Physical dimensions of a drawing surface.
///
/// Zero-sized surfaces are legal: layout can briefly report `0x0` while a
/// window is being mapped or minimised. Consumers skip rendering instead of
/// dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl From<(u32, u32)> for SurfaceSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

/// Immutable shader parameters for the dithered wave effect.
///
/// The value is set once when the background is initialised; each frame
/// derives a fresh [`DitherUniforms`](crate::DitherUniforms) from it rather
/// than mutating shared state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DitherParams {
    /// Base RGB tint, each channel in `0.0..=1.0`.
    pub wave_color: [f32; 3],
    /// Number of brightness bands per channel; values below 2 disable banding.
    pub color_num: u32,
    /// Edge length of the square pixel blocks the pattern is sampled on.
    pub pixel_size: u32,
    /// Time-scale multiplier for the sinusoidal term.
    pub wave_speed: f32,
    /// Spatial frequency of the sinusoidal term.
    pub wave_frequency: f32,
    /// Weight of the wave term against the noise term, `0.0..=1.0`.
    pub wave_amplitude: f32,
    /// Gates the pointer-proximity glow.
    pub pointer_enabled: bool,
    /// Spread of the pointer glow in normalized surface units.
    pub pointer_radius: f32,
}

impl DitherParams {
    /// Falloff intensity used by the pointer term; larger radius, wider glow.
    pub fn pointer_intensity(&self) -> f32 {
        1.0 / self.pointer_radius.max(MIN_POINTER_RADIUS)
    }

    /// Wave weight clamped into the blendable range.
    pub fn amplitude(&self) -> f32 {
        if self.wave_amplitude.is_finite() {
            self.wave_amplitude.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn block_size(&self) -> u32 {
        self.pixel_size.max(1)
    }
}

impl Default for DitherParams {
    fn default() -> Self {
        Self {
            wave_color: [0.0549, 0.6471, 0.9255],
            color_num: 4,
            pixel_size: 2,
            wave_speed: 1.0,
            wave_frequency: 10.0,
            wave_amplitude: 0.5,
            pointer_enabled: true,
            pointer_radius: 0.2,
        }
    }
}

/// Immutable configuration for the preview window host.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: SurfaceSize,
    /// Shader parameters handed to the background on start-up.
    pub params: DitherParams,
    /// Optional FPS cap; `None` renders on every redraw opportunity.
    pub target_fps: Option<f32>,
    /// Frames slower than this are reported at `warn`.
    pub frame_budget: std::time::Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: SurfaceSize::new(1280, 720),
            params: DitherParams::default(),
            target_fps: None,
            frame_budget: std::time::Duration::from_millis(4),
        }
    }
}

use bytemuck::{Pod, Zeroable};

use crate::types::{DitherParams, SurfaceSize};

/// Everything one frame needs, rebuilt by the background before each submit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub params: DitherParams,
    /// Elapsed seconds on the frame clock.
    pub time: f32,
    /// Normalized pointer position, bottom-left origin.
    pub pointer: [f32; 2],
    pub surface: SurfaceSize,
}

/// GPU mirror of [`Frame`], laid out to match the `DitherParams` std140 block
/// declared in the fragment shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DitherUniforms {
    pub resolution: [f32; 2],
    pub pointer: [f32; 2],
    pub time: f32,
    pub wave_speed: f32,
    pub wave_frequency: f32,
    pub wave_amplitude: f32,
    pub wave_color: [f32; 3],
    pub color_num: f32,
    pub pixel_size: f32,
    pub pointer_intensity: f32,
    pub pointer_enabled: f32,
    pub _padding: f32,
}

impl DitherUniforms {
    pub fn from_frame(frame: &Frame) -> Self {
        let params = &frame.params;
        Self {
            // Keep the resolution non-zero so the shader never divides by zero.
            resolution: [
                frame.surface.width.max(1) as f32,
                frame.surface.height.max(1) as f32,
            ],
            pointer: frame.pointer,
            time: frame.time,
            wave_speed: params.wave_speed,
            wave_frequency: params.wave_frequency,
            wave_amplitude: params.amplitude(),
            wave_color: params.wave_color,
            color_num: params.color_num as f32,
            pixel_size: params.block_size() as f32,
            pointer_intensity: params.pointer_intensity(),
            pointer_enabled: if params.pointer_enabled { 1.0 } else { 0.0 },
            _padding: 0.0,
        }
    }
}

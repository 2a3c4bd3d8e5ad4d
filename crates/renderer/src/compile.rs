use std::borrow::Cow;

use wgpu::naga::ShaderStage;

use crate::background::ContextError;

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(
    device: &wgpu::Device,
) -> Result<wgpu::ShaderModule, ContextError> {
    compile_glsl(device, "fullscreen triangle vertex", VERTEX_SHADER_GLSL, ShaderStage::Vertex)
}

/// Compiles the dithered wave fragment shader.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
) -> Result<wgpu::ShaderModule, ContextError> {
    compile_glsl(device, "dither fragment", FRAGMENT_SHADER_GLSL, ShaderStage::Fragment)
}

/// Runs naga's GLSL frontend inside a validation error scope so a rejected
/// shader surfaces as a [`ContextError`] instead of an uncaptured device error.
fn compile_glsl(
    device: &wgpu::Device,
    label: &'static str,
    source: &'static str,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule, ContextError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage,
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(ContextError::new("shader", err)),
        None => Ok(module),
    }
}

/// Fragment twin of `pattern.rs`. The uniform block layout must match
/// [`DitherUniforms`](crate::DitherUniforms).
pub(crate) const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform DitherParams {
    vec2 resolution;
    vec2 pointer;
    float time;
    float wave_speed;
    float wave_frequency;
    float wave_amplitude;
    vec3 wave_color;
    float color_num;
    float pixel_size;
    float pointer_intensity;
    float pointer_enabled;
    float padding0;
} params;

float lattice_hash(vec2 point) {
    return fract(sin(dot(point, vec2(12.9898, 78.233))) * 43758.5453123);
}

float value_noise(vec2 point) {
    vec2 cell = floor(point);
    vec2 offset = point - cell;
    float a = lattice_hash(cell);
    float b = lattice_hash(cell + vec2(1.0, 0.0));
    float c = lattice_hash(cell + vec2(0.0, 1.0));
    float d = lattice_hash(cell + vec2(1.0, 1.0));
    vec2 u = offset * offset * (3.0 - 2.0 * offset);
    return mix(a, b, u.x) + (c - a) * u.y * (1.0 - u.x) + (d - b) * u.x * u.y;
}

float quantize_channel(float value, float bands) {
    float clamped = clamp(value, 0.0, 1.0);
    if (bands < 2.0) {
        return clamped;
    }
    float steps = bands - 1.0;
    return floor(clamped * steps + 0.5) / steps;
}

void main() {
    float cell_size = max(params.pixel_size, 1.0);
    vec2 centre = (floor(gl_FragCoord.xy / cell_size) + 0.5) * cell_size;
    vec2 uv = vec2(centre.x / params.resolution.x, 1.0 - centre.y / params.resolution.y);

    float drift = params.time * 0.5;
    float noise_value = value_noise(uv * 5.0 + vec2(drift, drift));
    float phase = params.time * params.wave_speed;
    float wave_value = sin(uv.x * params.wave_frequency + phase)
        * cos(uv.y * params.wave_frequency + phase);

    float glow = 0.0;
    if (params.pointer_enabled > 0.5) {
        vec2 delta = uv - params.pointer;
        glow = exp(-dot(delta, delta) * params.pointer_intensity) * 0.5;
    }

    float amplitude = params.wave_amplitude;
    float level = noise_value * (1.0 - amplitude) + wave_value * amplitude + glow;

    vec3 tinted = clamp(params.wave_color * level, vec3(0.0), vec3(1.0));
    vec3 banded = vec3(
        quantize_channel(tinted.r, params.color_num),
        quantize_channel(tinted.g, params.color_num),
        quantize_channel(tinted.b, params.color_num)
    );
    outColor = vec4(banded, clamp(level * 0.8, 0.0, 1.0));
}
";

/// Minimal full-screen triangle vertex shader.
pub(crate) const VERTEX_SHADER_GLSL: &str = r"#version 450
const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    gl_Position = vec4(positions[vertex_index], 0.0, 1.0);
}
";

//! CPU reference of the dithered wave pattern.
//!
//! Every function here has a line-for-line twin in the GLSL fragment shader
//! (`compile.rs`). The canvas target renders with these directly; the GPU
//! path only relies on them for tests. All math is `f32` so both paths agree
//! on the hash, which amplifies rounding in `sin`.

use crate::types::{DitherParams, SurfaceSize};

/// Lattice scale applied to `uv` before sampling noise.
pub const NOISE_SCALE: f32 = 5.0;
/// How fast the noise field drifts, in lattice cells per second.
pub const NOISE_DRIFT: f32 = 0.5;
/// Peak contribution of the pointer glow.
pub const POINTER_GAIN: f32 = 0.5;
/// Alpha emitted per unit of pattern.
pub const ALPHA_GAIN: f32 = 0.8;

#[inline]
fn fract(value: f32) -> f32 {
    value - value.floor()
}

#[inline]
fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Pseudo-random value in `[0, 1)` for a lattice point.
#[inline]
pub fn lattice_hash(point: [f32; 2]) -> f32 {
    let dot = point[0] * 12.9898 + point[1] * 78.233;
    fract(dot.sin() * 43758.5453123)
}

/// Smootherstep weight `3t² − 2t³`.
#[inline]
pub fn smooth_weight(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Bilinear value noise over the hashed integer lattice.
pub fn value_noise(point: [f32; 2]) -> f32 {
    let cell = [point[0].floor(), point[1].floor()];
    let local = [point[0] - cell[0], point[1] - cell[1]];

    let a = lattice_hash(cell);
    let b = lattice_hash([cell[0] + 1.0, cell[1]]);
    let c = lattice_hash([cell[0], cell[1] + 1.0]);
    let d = lattice_hash([cell[0] + 1.0, cell[1] + 1.0]);

    let ux = smooth_weight(local[0]);
    let uy = smooth_weight(local[1]);
    mix(a, b, ux) + (c - a) * uy * (1.0 - ux) + (d - b) * ux * uy
}

/// Moving interference of two sinusoids; output in `[-1, 1]`.
#[inline]
pub fn wave(uv: [f32; 2], time: f32, frequency: f32, speed: f32) -> f32 {
    let phase = time * speed;
    (uv[0] * frequency + phase).sin() * (uv[1] * frequency + phase).cos()
}

/// Gaussian-like glow around the pointer, peaking at [`POINTER_GAIN`].
#[inline]
pub fn pointer_influence(uv: [f32; 2], pointer: [f32; 2], intensity: f32) -> f32 {
    let dx = uv[0] - pointer[0];
    let dy = uv[1] - pointer[1];
    (-(dx * dx + dy * dy) * intensity).exp() * POINTER_GAIN
}

/// Scalar pattern value before tinting. `pointer` is ignored when the
/// parameters disable pointer interaction.
pub fn pattern(uv: [f32; 2], time: f32, pointer: [f32; 2], params: &DitherParams) -> f32 {
    let drift = time * NOISE_DRIFT;
    let noise = value_noise([uv[0] * NOISE_SCALE + drift, uv[1] * NOISE_SCALE + drift]);
    let wave = wave(uv, time, params.wave_frequency, params.wave_speed);
    let glow = if params.pointer_enabled {
        pointer_influence(uv, pointer, params.pointer_intensity())
    } else {
        0.0
    };

    let amplitude = params.amplitude();
    noise * (1.0 - amplitude) + wave * amplitude + glow
}

/// Rounds a channel to the nearest of `bands` evenly spaced levels.
#[inline]
pub fn quantize_channel(value: f32, bands: u32) -> f32 {
    let clamped = value.clamp(0.0, 1.0);
    if bands < 2 {
        return clamped;
    }
    let steps = (bands - 1) as f32;
    (clamped * steps + 0.5).floor() / steps
}

pub fn quantize(color: [f32; 3], bands: u32) -> [f32; 3] {
    color.map(|channel| quantize_channel(channel, bands))
}

/// Final straight-alpha RGBA for one sample, every channel in `[0, 1]`.
pub fn shade(uv: [f32; 2], time: f32, pointer: [f32; 2], params: &DitherParams) -> [f32; 4] {
    let value = pattern(uv, time, pointer, params);
    let tinted = params
        .wave_color
        .map(|channel| (channel * value).clamp(0.0, 1.0));
    let [r, g, b] = quantize(tinted, params.color_num);
    let alpha = (value * ALPHA_GAIN).clamp(0.0, 1.0);
    [r, g, b, if alpha.is_nan() { 0.0 } else { alpha }]
}

/// Maps a pixel (top-left origin) to the `uv` of its block centre
/// (bottom-left origin), matching `gl_FragCoord` snapping on the GPU.
pub fn block_uv(x: u32, y: u32, surface: SurfaceSize, block: u32) -> [f32; 2] {
    let block = block.max(1);
    let width = surface.width.max(1) as f32;
    let height = surface.height.max(1) as f32;
    let centre_x = ((x / block) as f32 + 0.5) * block as f32;
    let centre_y = ((y / block) as f32 + 0.5) * block as f32;
    [centre_x / width, 1.0 - centre_y / height]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
        ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
    }

    #[test]
    fn pointer_influence_peaks_at_pointer_and_falls_off() {
        let intensity = DitherParams::default().pointer_intensity();
        for pointer in [[0.0, 0.0], [0.5, 0.5], [1.0, 0.25], [0.3, 1.0]] {
            let peak = pointer_influence(pointer, pointer, intensity);
            assert!((peak - POINTER_GAIN).abs() < 1e-6);

            let mut samples = Vec::new();
            for i in 0..=10 {
                for j in 0..=10 {
                    let uv = [i as f32 / 10.0, j as f32 / 10.0];
                    samples.push((distance(uv, pointer), pointer_influence(uv, pointer, intensity)));
                }
            }
            samples.sort_by(|a, b| a.0.total_cmp(&b.0));
            for pair in samples.windows(2) {
                assert!(pair[1].1 <= pair[0].1 + 1e-6);
                assert!(pair[1].1 <= peak + 1e-6);
            }
        }
    }

    #[test]
    fn noise_is_deterministic_and_bounded() {
        for step in 0..50 {
            let point = [step as f32 * 0.37, step as f32 * -0.91 + 3.0];
            let first = value_noise(point);
            let second = value_noise(point);
            assert_eq!(first.to_bits(), second.to_bits());
            assert!((-1e-4..=1.0 + 1e-4).contains(&first));
        }
    }

    #[test]
    fn noise_matches_corner_hashes_on_lattice() {
        let corner = [3.0, 7.0];
        assert!((value_noise(corner) - lattice_hash(corner)).abs() < 1e-6);
    }

    #[test]
    fn smooth_weight_hits_endpoints_and_midpoint() {
        assert_eq!(smooth_weight(0.0), 0.0);
        assert_eq!(smooth_weight(1.0), 1.0);
        assert!((smooth_weight(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn quantization_is_idempotent() {
        for bands in [0, 1, 2, 4, 7, 16] {
            for step in 0..=100 {
                let value = step as f32 / 100.0;
                let once = quantize_channel(value, bands);
                let twice = quantize_channel(once, bands);
                assert_eq!(once.to_bits(), twice.to_bits(), "bands={bands} value={value}");
            }
        }
    }

    #[test]
    fn quantization_uses_evenly_spaced_levels() {
        assert_eq!(quantize_channel(0.1, 4), 0.0);
        assert!((quantize_channel(0.3, 4) - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(quantize_channel(0.95, 4), 1.0);
        assert_eq!(quantize_channel(-2.0, 4), 0.0);
        assert_eq!(quantize_channel(3.0, 4), 1.0);
    }

    #[test]
    fn disabled_pointer_ignores_position() {
        let params = DitherParams {
            pointer_enabled: false,
            ..DitherParams::default()
        };
        let uv = [0.4, 0.6];
        let near = pattern(uv, 1.5, uv, &params);
        let far = pattern(uv, 1.5, [0.0, 0.0], &params);
        assert_eq!(near.to_bits(), far.to_bits());
    }

    #[test]
    fn shade_stays_in_unit_range() {
        let params = DitherParams::default();
        for step in 0..200 {
            let uv = [(step % 20) as f32 / 19.0, (step / 20) as f32 / 9.0];
            let color = shade(uv, step as f32 * 0.1, [0.5, 0.5], &params);
            for channel in color {
                assert!((0.0..=1.0).contains(&channel));
            }
        }
    }

    #[test]
    fn block_uv_snaps_to_block_centres() {
        let surface = SurfaceSize::new(12, 12);
        assert_eq!(block_uv(0, 0, surface, 3), block_uv(2, 2, surface, 3));
        assert_ne!(block_uv(2, 0, surface, 3), block_uv(3, 0, surface, 3));
        let [u, v] = block_uv(0, 0, surface, 3);
        assert!((u - 1.5 / 12.0).abs() < 1e-6);
        assert!((v - (1.0 - 1.5 / 12.0)).abs() < 1e-6);
    }
}

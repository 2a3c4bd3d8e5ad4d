use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;

use crate::background::{FrameError, FrameTarget};
use crate::pattern::{block_uv, shade};
use crate::types::{SurfaceSize, FALLBACK_BACKGROUND};
use crate::uniforms::Frame;

const CHANNELS: usize = 4;

/// CPU frame target writing opaque RGBA8 pixels.
///
/// The effect is composited over [`FALLBACK_BACKGROUND`] the same way the GPU
/// pipeline blends over its clear colour. The pixel buffer is sized on resize
/// only; submitting frames never allocates.
#[derive(Debug, Clone)]
pub struct Canvas {
    size: SurfaceSize,
    pixels: Vec<u8>,
    background: [f32; 3],
}

impl Canvas {
    pub fn new(size: SurfaceSize) -> Self {
        let mut canvas = Self {
            size: SurfaceSize::default(),
            pixels: Vec::new(),
            background: FALLBACK_BACKGROUND,
        };
        canvas.resize(size);
        canvas
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Row-major RGBA8 pixels, top row first.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn capacity(&self) -> usize {
        self.pixels.capacity()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let offset = (y as usize * self.size.width as usize + x as usize) * CHANNELS;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.pixels[offset..offset + CHANNELS]);
        Some(out)
    }

    /// Rasterizes `frame` one pixel block at a time.
    pub fn render(&mut self, frame: &Frame) {
        let SurfaceSize { width, height } = self.size;
        if self.size.is_empty() {
            return;
        }
        let block = frame.params.block_size();
        let row_stride = width as usize * CHANNELS;

        for block_y in (0..height).step_by(block as usize) {
            for block_x in (0..width).step_by(block as usize) {
                let uv = block_uv(block_x, block_y, self.size, block);
                let rgba = composite(
                    shade(uv, frame.time, frame.pointer, &frame.params),
                    self.background,
                );

                let x_end = (block_x + block).min(width);
                let y_end = (block_y + block).min(height);
                for y in block_y..y_end {
                    let row = y as usize * row_stride;
                    for x in block_x..x_end {
                        let offset = row + x as usize * CHANNELS;
                        self.pixels[offset..offset + CHANNELS].copy_from_slice(&rgba);
                    }
                }
            }
        }
    }

    /// Paints the static background colour over the whole canvas.
    pub fn clear(&mut self) {
        let rgba = composite([0.0; 4], self.background);
        for pixel in self.pixels.chunks_exact_mut(CHANNELS) {
            pixel.copy_from_slice(&rgba);
        }
    }

    pub fn to_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.size.width, self.size.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("canvas buffer does not match {}x{}", self.size.width, self.size.height))
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        if self.size.is_empty() {
            anyhow::bail!("cannot export an empty {}x{} canvas", self.size.width, self.size.height);
        }
        self.to_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("failed to write PNG to {}", path.display()))
    }
}

impl FrameTarget for Canvas {
    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        self.pixels.resize(size.area() * CHANNELS, 0);
        self.clear();
    }

    fn submit(&mut self, frame: &Frame) -> Result<(), FrameError> {
        if frame.surface != self.size {
            self.resize(frame.surface);
        }
        self.render(frame);
        Ok(())
    }
}

fn composite(color: [f32; 4], background: [f32; 3]) -> [u8; 4] {
    let alpha = color[3];
    let channel = |index: usize| {
        let value = color[index] * alpha + background[index] * (1.0 - alpha);
        (value.clamp(0.0, 1.0) * 255.0).round() as u8
    };
    [channel(0), channel(1), channel(2), 255]
}

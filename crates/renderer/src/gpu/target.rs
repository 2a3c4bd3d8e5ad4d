use bytemuck::Zeroable;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use super::context::GpuContext;
use super::pipeline::DitherPipeline;
use crate::background::{ContextError, FrameError, FrameTarget};
use crate::types::{SurfaceSize, FALLBACK_BACKGROUND};
use crate::uniforms::{DitherUniforms, Frame};

/// Presents frames to a window surface through wgpu.
pub struct GpuTarget {
    context: GpuContext,
    pipeline: DitherPipeline,
    clear_color: wgpu::Color,
}

impl GpuTarget {
    /// Acquires a GPU context for `window` and builds the dither pipeline.
    pub fn new<W>(window: W, size: SurfaceSize) -> Result<Self, ContextError>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let context = GpuContext::new(window, size)?;
        let pipeline = DitherPipeline::new(
            &context.device,
            context.surface_format,
            &DitherUniforms::zeroed(),
        )?;
        tracing::info!(adapter = %context.adapter_name, format = ?context.surface_format, "GPU target ready");

        let [r, g, b] = FALLBACK_BACKGROUND;
        Ok(Self {
            context,
            pipeline,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.context.adapter_name
    }
}

impl FrameTarget for GpuTarget {
    fn resize(&mut self, size: SurfaceSize) {
        if size == self.context.size() {
            self.context.reconfigure();
        } else {
            self.context.resize(size);
        }
    }

    fn submit(&mut self, frame: &Frame) -> Result<(), FrameError> {
        let output = self
            .context
            .surface
            .get_current_texture()
            .map_err(map_surface_error)?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.pipeline
            .upload(&self.context.queue, &DitherUniforms::from_frame(frame));

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("dither encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("dither pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline.pipeline);
            pass.set_bind_group(0, &self.pipeline.uniform_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.context.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn map_surface_error(err: wgpu::SurfaceError) -> FrameError {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => FrameError::Reconfigure,
        wgpu::SurfaceError::Timeout => FrameError::Timeout,
        wgpu::SurfaceError::OutOfMemory => FrameError::ContextLost("out of GPU memory".into()),
        wgpu::SurfaceError::Other => FrameError::Reconfigure,
    }
}

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::background::ContextError;
use crate::types::SurfaceSize;

pub(crate) struct GpuContext {
    _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub surface_format: wgpu::TextureFormat,
    pub adapter_name: String,
    size: SurfaceSize,
}

impl GpuContext {
    pub(crate) fn new<W>(window: W, initial_size: SurfaceSize) -> Result<Self, ContextError>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let surface = instance
            .create_surface(window)
            .map_err(|err| ContextError::new("surface", err))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|err| ContextError::new("adapter", err))?;

        let adapter_info = adapter.get_info();
        if adapter_info.device_type == wgpu::DeviceType::Cpu {
            return Err(ContextError::new(
                "adapter",
                format!("only a software rasterizer is available ({})", adapter_info.name),
            ));
        }
        tracing::debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "selected GPU adapter"
        );

        let limits = adapter.limits();
        let max_dimension = limits.max_texture_dimension_2d;
        let width = initial_size.width.clamp(1, max_dimension);
        let height = initial_size.height.clamp(1, max_dimension);
        if width != initial_size.width.max(1) || height != initial_size.height.max(1) {
            tracing::warn!(
                max_dimension,
                requested_width = initial_size.width,
                requested_height = initial_size.height,
                "surface larger than GPU max texture dimension; clamping"
            );
        }

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            return Err(ContextError::new(
                "surface",
                "surface is incompatible with the selected adapter",
            ));
        };
        // Colours are authored as gamma-encoded values, so prefer a non-sRGB swapchain.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or_else(|| {
                tracing::warn!(
                    fallback = ?first_format,
                    "no non-sRGB surface format available; colours will be re-encoded"
                );
                first_format
            });

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("dithershade device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .map_err(|err| ContextError::new("device", err))?;

        let present_mode = surface_caps
            .present_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::PresentMode::Fifo)
            .unwrap_or(wgpu::PresentMode::AutoVsync);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        if !initial_size.is_empty() {
            surface.configure(&device, &config);
        }

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            surface_format,
            adapter_name: adapter_info.name,
            size: initial_size,
        })
    }

    pub(crate) fn resize(&mut self, new_size: SurfaceSize) {
        self.size = new_size;
        if new_size.is_empty() {
            return;
        }

        let max_dimension = self.device.limits().max_texture_dimension_2d;
        self.config.width = new_size.width.min(max_dimension);
        self.config.height = new_size.height.min(max_dimension);
        self.surface.configure(&self.device, &self.config);
    }

    /// Reconfigures the swapchain at the current size, e.g. after `Lost`.
    pub(crate) fn reconfigure(&mut self) {
        self.resize(self.size);
    }

    pub(crate) fn size(&self) -> SurfaceSize {
        self.size
    }
}

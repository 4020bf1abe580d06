use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::compile::shader_capabilities;
use crate::error::ContextUnavailable;
use crate::types::ContextFlags;

pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    /// What gallery shaders may use on this device.
    pub capabilities: wgpu::naga::valid::Capabilities,
}

impl GpuContext {
    /// Creates a surface for `target` and configures it for single-sample,
    /// depth-less rendering.
    ///
    /// `target` must outlive the returned context.
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        flags: ContextFlags,
    ) -> Result<Self, ContextUnavailable>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target.window_handle().map_err(|err| {
            ContextUnavailable::new(format!("failed to acquire window handle: {err}"))
        })?;
        let display_handle = target.display_handle().map_err(|err| {
            ContextUnavailable::new(format!("failed to acquire display handle: {err}"))
        })?;

        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .map_err(|err| ContextUnavailable::new(format!("failed to create surface: {err}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|err| ContextUnavailable::new(format!("no suitable GPU adapter: {err}")))?;

        let adapter_info = adapter.get_info();
        tracing::debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "selected GPU adapter"
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("strandview device"),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .map_err(|err| ContextUnavailable::new(format!("failed to create GPU device: {err}")))?;

        let capabilities = shader_capabilities(
            device.features(),
            adapter.get_downlevel_capabilities().flags,
        );

        let surface_caps = surface.get_capabilities(&adapter);
        // Canvas-style output: colors are written as-is, without sRGB encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| ContextUnavailable::new("surface reports no supported formats"))?;
        if surface_format.is_srgb() {
            tracing::warn!(
                ?surface_format,
                "no non-sRGB surface format available; colors will be gamma encoded"
            );
        }

        let present_mode = if surface_caps
            .present_modes
            .contains(&wgpu::PresentMode::Fifo)
        {
            wgpu::PresentMode::Fifo
        } else {
            surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::AutoVsync)
        };
        let alpha_mode = choose_alpha_mode(&surface_caps.alpha_modes, flags);
        tracing::debug!(?surface_format, ?present_mode, ?alpha_mode, "configuring surface");

        let size = PhysicalSize::new(initial_size.width.max(1), initial_size.height.max(1));
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            capabilities,
        })
    }

    /// Zero-sized requests are ignored; wgpu cannot configure an empty surface.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Re-applies the current configuration after the surface was lost.
    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

fn choose_alpha_mode(
    offered: &[wgpu::CompositeAlphaMode],
    flags: ContextFlags,
) -> wgpu::CompositeAlphaMode {
    let preferred = match (flags.alpha, flags.premultiplied_alpha) {
        (true, true) => wgpu::CompositeAlphaMode::PreMultiplied,
        (true, false) => wgpu::CompositeAlphaMode::PostMultiplied,
        (false, _) => wgpu::CompositeAlphaMode::Opaque,
    };
    if offered.contains(&preferred) {
        preferred
    } else {
        offered
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto)
    }
}

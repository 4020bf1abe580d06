use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use winit::dpi::PhysicalSize;

use crate::backend::GraphicsBackend;
use crate::compile::{check_glsl, create_shader_module, reflect_uniforms, wrap_fragment, UniformSlot};
use crate::error::{ContextUnavailable, FrameError};
use crate::types::{ContextFlags, ShaderStage};

use super::context::GpuContext;
use super::pipeline::{create_program_resources, PipelineLayouts, ProgramResources};
use super::uniforms::UniformShadow;

pub(crate) struct WgpuStage {
    module: Option<wgpu::ShaderModule>,
    uniforms: Vec<UniformSlot>,
    log: Option<String>,
}

impl WgpuStage {
    fn failed(log: String) -> Self {
        Self {
            module: None,
            uniforms: Vec::new(),
            log: Some(log),
        }
    }
}

pub(crate) struct WgpuProgram {
    id: u64,
    resources: Option<ProgramResources>,
    uniforms: Vec<UniformSlot>,
    log: Option<String>,
}

/// Byte offset into the uniform block of one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WgpuLocation {
    program: u64,
    offset: u32,
}

/// The program bound by `use_program`, cloned out of its owner.
struct BoundProgram {
    id: u64,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    shadow: UniformShadow,
}

/// A surface texture being recorded into between `clear` and `present`.
struct PendingFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    /// Consumed by the first pass of the frame.
    clear: Option<wgpu::Color>,
}

pub(crate) struct WgpuBackend {
    context: GpuContext,
    layouts: PipelineLayouts,
    next_program_id: u64,
    bound: Option<BoundProgram>,
    viewport: (u32, u32, u32, u32),
    frame: Option<PendingFrame>,
}

impl WgpuBackend {
    /// Connects to the GPU for `target`; it must outlive the backend.
    pub(crate) fn new<T>(
        target: &T,
        size: PhysicalSize<u32>,
        flags: ContextFlags,
    ) -> Result<Self, ContextUnavailable>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size, flags)?;
        let layouts = PipelineLayouts::new(&context.device);
        let viewport = (0, 0, context.size.width, context.size.height);
        Ok(Self {
            context,
            layouts,
            next_program_id: 1,
            bound: None,
            viewport,
            frame: None,
        })
    }

    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, FrameError> {
        match self.context.surface.get_current_texture() {
            Ok(texture) => Ok(texture),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost or outdated; reconfiguring");
                self.context.reconfigure();
                self.context
                    .surface
                    .get_current_texture()
                    .map_err(frame_error)
            }
            Err(err) => Err(frame_error(err)),
        }
    }

    fn write_uniform(&mut self, location: WgpuLocation, values: &[f32]) {
        let Some(bound) = self.bound.as_mut() else {
            warn!(?location, "uniform set with no program bound");
            return;
        };
        if bound.id != location.program {
            warn!(
                ?location,
                bound = bound.id,
                "location belongs to a program that is not bound"
            );
            return;
        }
        if !bound.shadow.write(location.offset, values) {
            warn!(?location, "uniform write outside the block");
        }
    }
}

fn frame_error(err: wgpu::SurfaceError) -> FrameError {
    match err {
        wgpu::SurfaceError::OutOfMemory => FrameError::OutOfMemory,
        wgpu::SurfaceError::Timeout => FrameError::Timeout,
        other => FrameError::Other(format!("{other:?}")),
    }
}

impl GraphicsBackend for WgpuBackend {
    type Stage = WgpuStage;
    type Program = WgpuProgram;
    type Location = WgpuLocation;

    fn create_stage(&mut self, stage: ShaderStage, source: &str) -> WgpuStage {
        let glsl = match stage {
            ShaderStage::Vertex => source.to_string(),
            ShaderStage::Fragment => wrap_fragment(source),
        };
        let module = match check_glsl(stage, &glsl, self.context.capabilities) {
            Ok(module) => module,
            Err(log) => return WgpuStage::failed(log),
        };
        let uniforms = match stage {
            ShaderStage::Vertex => Vec::new(),
            ShaderStage::Fragment => reflect_uniforms(&module, source),
        };

        // Device-side rejections belong in the stage log.
        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = create_shader_module(device, stage, &glsl);
        match pollster::block_on(device.pop_error_scope()) {
            None => WgpuStage {
                module: Some(shader),
                uniforms,
                log: None,
            },
            Some(err) => {
                warn!(%stage, "shader module rejected by the device");
                WgpuStage::failed(err.to_string())
            }
        }
    }

    fn stage_status(&self, stage: &WgpuStage) -> Result<(), String> {
        match &stage.log {
            Some(log) => Err(log.clone()),
            None => Ok(()),
        }
    }

    fn release_stage(&mut self, stage: WgpuStage) {
        drop(stage);
    }

    fn create_program(&mut self, vertex: &WgpuStage, fragment: &WgpuStage) -> WgpuProgram {
        let id = self.next_program_id;
        self.next_program_id += 1;

        let (Some(vertex_module), Some(fragment_module)) = (&vertex.module, &fragment.module)
        else {
            return WgpuProgram {
                id,
                resources: None,
                uniforms: Vec::new(),
                log: Some("cannot link a stage that failed to compile".into()),
            };
        };

        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let resources = create_program_resources(
            device,
            &self.layouts,
            vertex_module,
            fragment_module,
            self.context.config.format,
        );
        match pollster::block_on(device.pop_error_scope()) {
            None => {
                debug!(program = id, "linked program");
                WgpuProgram {
                    id,
                    resources: Some(resources),
                    uniforms: fragment.uniforms.clone(),
                    log: None,
                }
            }
            Some(err) => WgpuProgram {
                id,
                resources: None,
                uniforms: Vec::new(),
                log: Some(err.to_string()),
            },
        }
    }

    fn program_status(&self, program: &WgpuProgram) -> Result<(), String> {
        match &program.log {
            Some(log) => Err(log.clone()),
            None => Ok(()),
        }
    }

    fn release_program(&mut self, program: WgpuProgram) {
        if self.bound.as_ref().is_some_and(|bound| bound.id == program.id) {
            self.bound = None;
        }
        if let Some(resources) = program.resources {
            resources.uniform_buffer.destroy();
        }
    }

    fn uniform_location(&self, program: &WgpuProgram, name: &str) -> Option<WgpuLocation> {
        program
            .uniforms
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| WgpuLocation {
                program: program.id,
                offset: slot.offset,
            })
    }

    fn backing_size(&self) -> (u32, u32) {
        (self.context.size.width, self.context.size.height)
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.context.resize(PhysicalSize::new(width, height));
    }

    fn clear(&mut self, color: [f64; 4]) -> Result<(), FrameError> {
        // A frame that was never presented is dropped unsubmitted.
        self.frame = None;
        let texture = self.acquire()?;
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        let [r, g, b, a] = color;
        self.frame = Some(PendingFrame {
            texture,
            view,
            encoder,
            clear: Some(wgpu::Color { r, g, b, a }),
        });
        Ok(())
    }

    fn use_program(&mut self, program: &WgpuProgram) {
        if self.bound.as_ref().is_some_and(|bound| bound.id == program.id) {
            return;
        }
        let Some(resources) = program.resources.as_ref() else {
            warn!(program = program.id, "cannot bind a program that failed to link");
            self.bound = None;
            return;
        };
        self.bound = Some(BoundProgram {
            id: program.id,
            pipeline: resources.pipeline.clone(),
            bind_group: resources.bind_group.clone(),
            uniform_buffer: resources.uniform_buffer.clone(),
            shadow: UniformShadow::default(),
        });
    }

    fn set_uniform_vec2(&mut self, location: WgpuLocation, value: [f32; 2]) {
        self.write_uniform(location, &value);
    }

    fn set_uniform_f32(&mut self, location: WgpuLocation, value: f32) {
        self.write_uniform(location, &[value]);
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
    }

    fn draw(&mut self, vertex_count: u32) -> Result<(), FrameError> {
        let Some(frame) = self.frame.as_mut() else {
            return Err(FrameError::Other("draw outside of a frame".into()));
        };
        let Some(bound) = self.bound.as_ref() else {
            return Err(FrameError::Other("draw with no program bound".into()));
        };

        self.context
            .queue
            .write_buffer(&bound.uniform_buffer, 0, bound.shadow.as_bytes());

        let load = match frame.clear.take() {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };
        // wgpu rejects viewports that leave the render target.
        let target_width = self.context.config.width;
        let target_height = self.context.config.height;
        let (x, y, width, height) = self.viewport;
        let x = x.min(target_width);
        let y = y.min(target_height);
        let width = width.min(target_width - x);
        let height = height.min(target_height - y);

        let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("render pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&bound.pipeline);
        render_pass.set_bind_group(0, &bound.bind_group, &[]);
        if width > 0 && height > 0 {
            render_pass.set_viewport(x as f32, y as f32, width as f32, height as f32, 0.0, 1.0);
            render_pass.draw(0..vertex_count, 0..1);
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), FrameError> {
        let Some(mut frame) = self.frame.take() else {
            return Err(FrameError::Other("present outside of a frame".into()));
        };
        if let Some(color) = frame.clear.take() {
            // Nothing was drawn; still honour the clear.
            frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }
        self.context.queue.submit(Some(frame.encoder.finish()));
        frame.texture.present();
        Ok(())
    }
}

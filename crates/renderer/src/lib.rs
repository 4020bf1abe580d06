//! Full-screen fragment shader renderer.
//!
//! One screen-covering triangle is drawn every tick and the active gallery
//! shader is evaluated over it, fed three uniforms (pointer position, surface
//! size, elapsed milliseconds). The overall flow is:
//!
//! ```text
//!   strandview CLI
//!          │ RendererConfig + ShaderRegistry
//!          ▼
//!   Renderer::run ──▶ winit event loop ──▶ RendererState::{resize, pointer_moved, tick, next, ...}
//!                                                │
//!                                                ├─▶ ProgramManager (compile ▸ link ▸ swap)
//!                                                └─▶ GraphicsBackend (wgpu in production)
//! ```
//!
//! Gallery shaders are written GLSL ES 3.0 style and wrapped at runtime so
//! wgpu can compile them as Vulkan GLSL with the uniforms in a std140 block.

mod backend;
mod compile;
mod error;
mod frame;
mod gpu;
mod program;
mod runtime;
#[cfg(test)]
mod testing;
mod types;
mod window;

use anyhow::Result;
use gallery::ShaderRegistry;

pub use backend::GraphicsBackend;
pub use error::{ContextUnavailable, FrameError, ProgramError, SwitchError};
pub use frame::{RendererState, UniformState};
pub use program::{compile, link, CompiledProgram, ProgramManager, UniformBindings};
pub use runtime::{
    clock_for, BoxedClock, Clock, FixedClock, SystemClock, TickSchedule, DEFAULT_TICK_INTERVAL,
};
pub use types::{
    ContextFlags, RendererConfig, ShaderStage, CLEAR_COLOR, FULLSCREEN_VERTEX_COUNT,
    UNIFORM_MOUSE_POS, UNIFORM_SURFACE_SIZE, UNIFORM_TIME_MS,
};

/// Entry point that opens the viewer window for a shader gallery.
pub struct Renderer {
    config: RendererConfig,
    registry: ShaderRegistry,
}

impl Renderer {
    pub fn new(config: RendererConfig, registry: ShaderRegistry) -> Self {
        Self { config, registry }
    }

    /// Runs until the window is closed.
    ///
    /// Fails when no graphics context can be created or the starting shader
    /// does not compile; later shader switches only log their errors.
    pub fn run(self) -> Result<()> {
        window::run(self.config, self.registry)
    }
}

use std::fmt;

use crate::error::FrameError;
use crate::types::ShaderStage;

/// The graphics operations the program manager and frame driver rely on.
///
/// Object creation never fails outright: like a GL driver, a backend hands
/// back a handle and reports problems through `stage_status` /
/// `program_status`, so callers decide when to release. Handles passed to a
/// `release_*` method are consumed and must not be used again.
///
/// Uniform locations belong to the program they were resolved against. A
/// backend must ignore (and log) a location whose program is not the one
/// currently bound by `use_program`.
pub trait GraphicsBackend {
    type Stage;
    type Program;
    type Location: Copy + fmt::Debug;

    fn create_stage(&mut self, stage: ShaderStage, source: &str) -> Self::Stage;
    /// `Err` carries the compile log.
    fn stage_status(&self, stage: &Self::Stage) -> Result<(), String>;
    fn release_stage(&mut self, stage: Self::Stage);

    fn create_program(&mut self, vertex: &Self::Stage, fragment: &Self::Stage) -> Self::Program;
    /// `Err` carries the link log.
    fn program_status(&self, program: &Self::Program) -> Result<(), String>;
    fn release_program(&mut self, program: Self::Program);

    /// `None` when the program does not use `name`.
    fn uniform_location(&self, program: &Self::Program, name: &str) -> Option<Self::Location>;

    /// Current drawing-buffer resolution in pixels.
    fn backing_size(&self) -> (u32, u32);
    fn set_backing_size(&mut self, width: u32, height: u32);

    /// Starts a frame cleared to `color` (RGBA).
    fn clear(&mut self, color: [f64; 4]) -> Result<(), FrameError>;
    fn use_program(&mut self, program: &Self::Program);
    fn set_uniform_vec2(&mut self, location: Self::Location, value: [f32; 2]);
    fn set_uniform_f32(&mut self, location: Self::Location, value: f32);
    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32);
    /// Draws `vertex_count` vertices with no vertex buffers bound.
    fn draw(&mut self, vertex_count: u32) -> Result<(), FrameError>;
    fn present(&mut self) -> Result<(), FrameError>;
}

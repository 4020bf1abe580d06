use std::fmt;
use std::time::Duration;

use crate::runtime::DEFAULT_TICK_INTERVAL;

/// Opaque black; every frame starts from it.
pub const CLEAR_COLOR: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// The screen-covering triangle is synthesized from the vertex index alone.
pub const FULLSCREEN_VERTEX_COUNT: u32 = 3;

/// Pointer position in pixels, top-left origin.
pub const UNIFORM_MOUSE_POS: &str = "mouse_pos";
/// Displayed surface size in pixels.
pub const UNIFORM_SURFACE_SIZE: &str = "surface_size";
/// Elapsed clock time in milliseconds.
pub const UNIFORM_TIME_MS: &str = "time_ms";

/// Pipeline stage a shader object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Drawing-surface creation flags.
///
/// No depth, stencil or multisample attachments are ever allocated and every
/// frame is cleared, so only the alpha handling is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextFlags {
    /// Surface carries an alpha channel the compositor may use.
    pub alpha: bool,
    /// Colors written to the surface are already multiplied by alpha.
    pub premultiplied_alpha: bool,
}

impl Default for ContextFlags {
    fn default() -> Self {
        Self {
            alpha: true,
            premultiplied_alpha: true,
        }
    }
}

/// Runtime configuration consumed by [`crate::Renderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Initial window inner size in physical pixels.
    pub window_size: (u32, u32),
    /// Window title prefix; the active shader name is appended.
    pub title: String,
    /// Nominal period between scheduled frames.
    pub tick_interval: Duration,
    /// Evaluate every frame at this timestamp instead of the running clock.
    pub still_time_ms: Option<f64>,
    pub context: ContextFlags,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_size: (1280, 720),
            title: "strandview".to_string(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            still_time_ms: None,
            context: ContextFlags::default(),
        }
    }
}

impl RendererConfig {
    /// Title shown while `shader` is active.
    pub fn window_title(&self, shader: &str) -> String {
        format!("{}: {}", self.title, shader)
    }
}

use gallery::RegistryError;

use crate::types::ShaderStage;

/// Compile or link failure, carrying the driver log verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
}

/// No adapter, device or surface could be obtained for the window.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("graphics context unavailable: {reason}")]
pub struct ContextUnavailable {
    pub reason: String,
}

impl ContextUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A frame could not be drawn or presented.
///
/// Lost and outdated surfaces never reach this type; the backend reconfigures
/// and retries them itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("surface is out of memory")]
    OutOfMemory,
    #[error("timed out waiting for the next surface texture")]
    Timeout,
    #[error("frame failed: {0}")]
    Other(String),
}

/// Switching to another shader variant failed; the previous one stays active.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwitchError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Program(#[from] ProgramError),
}

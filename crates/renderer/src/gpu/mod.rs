//! wgpu implementation of [`crate::backend::GraphicsBackend`].
//!
//! - `context` owns the wgpu instance, device and surface, and reconfigures
//!   the swapchain when the window resizes.
//! - `pipeline` turns a vertex and fragment module into a render pipeline
//!   with a single uniform bind group.
//! - `uniforms` mirrors the injected std140 block on the CPU side.
//! - `backend` maps the GL-style stage/program/location calls onto all of the
//!   above and records each frame into one render pass.

mod backend;
mod context;
mod pipeline;
mod uniforms;

pub(crate) use backend::WgpuBackend;

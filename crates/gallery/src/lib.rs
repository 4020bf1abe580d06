//! Shader gallery: the ordered list of fragment shaders a viewer cycles through.
//!
//! A [`ShaderRegistry`] is assembled once at startup, either from the
//! built-in shaders ([`default_registry`]) or from a gallery TOML file
//! ([`GalleryConfig`]), and afterwards only its active index moves.

mod builtin;
mod config;
mod registry;

pub use builtin::{builtin_source, default_registry, BUILTINS, SOLID, STRANDS};
pub use config::{ConfigError, GalleryConfig, ShaderEntry};
pub use registry::{RegistryBuilder, RegistryError, ShaderRegistry, ShaderVariant};

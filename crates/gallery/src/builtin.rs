use crate::registry::{ShaderRegistry, ShaderVariant};

/// Animated wavy strands.
pub const STRANDS: &str = include_str!("../shaders/strands.frag");
/// Flat red fill; handy for checking the harness itself.
pub const SOLID: &str = include_str!("../shaders/solid.frag");

/// `(key, display name, source)` for every shader compiled into the binary.
pub const BUILTINS: [(&str, &str, &str); 2] = [
    ("strands", "Strands", STRANDS),
    ("solid", "Solid", SOLID),
];

/// Looks up a built-in shader source by key (case-insensitive).
pub fn builtin_source(key: &str) -> Option<&'static str> {
    BUILTINS
        .iter()
        .find(|(candidate, _, _)| candidate.eq_ignore_ascii_case(key))
        .map(|(_, _, source)| *source)
}

/// Registry holding the built-in shaders, starting on "Strands".
pub fn default_registry() -> ShaderRegistry {
    let variants = BUILTINS
        .iter()
        .map(|(_, name, source)| ShaderVariant::new(*name, *source))
        .collect();
    ShaderRegistry::from_parts(variants, 0)
}

use std::borrow::Cow;

use wgpu::naga;
use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::types::{ShaderStage, UNIFORM_MOUSE_POS, UNIFORM_SURFACE_SIZE, UNIFORM_TIME_MS};

/// Screen-covering triangle synthesized from the vertex index.
pub(crate) const FULLSCREEN_VERTEX_GLSL: &str = r"#version 450

const vec2 positions[3] = vec2[3](
    vec2(-1.0, 3.0),
    vec2(3.0, -1.0),
    vec2(-1.0, -1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    gl_Position = vec4(positions[vertex_index], 0.0, 1.0);
}
";

/// Member offsets of a uniform block, as laid out by the shader compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformSlot {
    pub name: String,
    pub offset: u32,
}

/// Produces a Vulkan-flavoured GLSL fragment shader from GLSL ES 3.0 source.
///
/// Steps performed:
///
/// 1. Strip the `#version`, `precision`, contract uniform and `outColor`
///    declarations so we can inject our own.
/// 2. Prepend [`HEADER`], which declares the uniform block and aliases
///    `gl_FragCoord` and `main`.
/// 3. Append [`FOOTER`], which flips `gl_FragCoord` to a bottom-left origin
///    and calls the renamed entry point.
pub(crate) fn wrap_fragment(source: &str) -> String {
    format!("{HEADER}\n#line 1\n{body}{FOOTER}", body = sanitize(source))
}

fn sanitize(source: &str) -> String {
    let mut body = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim_start();
        let declares_contract = trimmed.starts_with("uniform ")
            && [UNIFORM_MOUSE_POS, UNIFORM_SURFACE_SIZE, UNIFORM_TIME_MS]
                .iter()
                .any(|name| references_identifier(trimmed, name));
        let skip = trimmed.starts_with("#version")
            || trimmed.starts_with("precision ")
            || declares_contract
            || (trimmed.starts_with("out ") && references_identifier(trimmed, "outColor"));
        if skip {
            // keep line numbers stable for error logs
            body.push('\n');
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }
    body
}

/// Whole-word match of `ident` inside `text`.
fn references_identifier(text: &str, ident: &str) -> bool {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    text.match_indices(ident).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + ident.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}

/// Shader capabilities a device with `features` and `downlevel` accepts.
pub(crate) fn shader_capabilities(
    features: wgpu::Features,
    downlevel: wgpu::DownlevelFlags,
) -> Capabilities {
    let mut caps = Capabilities::empty();
    caps.set(
        Capabilities::PUSH_CONSTANT,
        features.contains(wgpu::Features::PUSH_CONSTANTS),
    );
    caps.set(
        Capabilities::FLOAT64,
        features.contains(wgpu::Features::SHADER_F64),
    );
    caps.set(
        Capabilities::SHADER_FLOAT16,
        features.contains(wgpu::Features::SHADER_F16),
    );
    caps.set(
        Capabilities::SHADER_INT64,
        features.contains(wgpu::Features::SHADER_INT64),
    );
    caps.set(
        Capabilities::PRIMITIVE_INDEX,
        features.contains(wgpu::Features::SHADER_PRIMITIVE_INDEX),
    );
    caps.set(
        Capabilities::EARLY_DEPTH_TEST,
        features.contains(wgpu::Features::SHADER_EARLY_DEPTH_TEST),
    );
    caps.set(
        Capabilities::MULTISAMPLED_SHADING,
        downlevel.contains(wgpu::DownlevelFlags::MULTISAMPLED_SHADING),
    );
    caps.set(
        Capabilities::CUBE_ARRAY_TEXTURES,
        downlevel.contains(wgpu::DownlevelFlags::CUBE_ARRAY_TEXTURES),
    );
    caps
}

/// Parses and validates GLSL, returning a human-readable log on failure.
pub(crate) fn check_glsl(
    stage: ShaderStage,
    glsl: &str,
    capabilities: Capabilities,
) -> Result<naga::Module, String> {
    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let mut frontend = Frontend::default();
    let module = frontend
        .parse(&Options::from(naga_stage), glsl)
        .map_err(|errors| errors.emit_to_string(glsl))?;
    Validator::new(ValidationFlags::all(), capabilities)
        .validate(&module)
        .map_err(|error| error.emit_to_string(glsl))?;
    Ok(module)
}

/// Members of the block at set 0, binding 0 that `source` actually uses.
///
/// A uniform the author never references gets no slot, mirroring a GL
/// driver that optimises unused uniforms away. `surface_size` always gets
/// one since [`FOOTER`] reads it to flip `gl_FragCoord`.
pub(crate) fn reflect_uniforms(module: &naga::Module, source: &str) -> Vec<UniformSlot> {
    let body = format!("{}{FOOTER}", sanitize(source));
    let block = module.global_variables.iter().find_map(|(_, global)| {
        let binding = global.binding.as_ref()?;
        let is_block = global.space == naga::AddressSpace::Uniform
            && binding.group == 0
            && binding.binding == 0;
        is_block.then_some(global.ty)
    });
    let Some(ty) = block else {
        return Vec::new();
    };
    match &module.types[ty].inner {
        naga::TypeInner::Struct { members, .. } => members
            .iter()
            .filter_map(|member| {
                let name = member.name.as_deref()?;
                references_identifier(&body, name).then(|| UniformSlot {
                    name: name.to_string(),
                    offset: member.offset,
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Hands already-checked GLSL to wgpu.
pub(crate) fn create_shader_module(
    device: &wgpu::Device,
    stage: ShaderStage,
    glsl: &str,
) -> wgpu::ShaderModule {
    let (label, naga_stage) = match stage {
        ShaderStage::Vertex => ("fullscreen triangle vertex", naga::ShaderStage::Vertex),
        ShaderStage::Fragment => ("gallery fragment", naga::ShaderStage::Fragment),
    };
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(glsl.to_string()),
            stage: naga_stage,
            defines: &[],
        },
    })
}

/// GLSL prologue injected ahead of every gallery fragment shader.
///
/// The block layout must match `SurfaceUniforms` in `gpu/uniforms.rs`.
const HEADER: &str = r"#version 450
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform SurfaceUniforms {
    vec2 mouse_pos;
    vec2 surface_size;
    float time_ms;
};

vec4 strandview_frag_coord;
#define gl_FragCoord strandview_frag_coord
#define main strandview_main
";

/// GLSL epilogue that remaps coordinates and delegates to the renamed `main`.
const FOOTER: &str = r"
#undef main
#undef gl_FragCoord
void main() {
    strandview_frag_coord = vec4(gl_FragCoord.x, surface_size.y - gl_FragCoord.y, gl_FragCoord.z, gl_FragCoord.w);
    strandview_main();
}
";

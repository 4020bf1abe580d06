use bytemuck::{Pod, Zeroable};

/// CPU mirror of the std140 block injected by `compile::HEADER`.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct SurfaceUniforms {
    pub mouse_pos: [f32; 2],
    pub surface_size: [f32; 2],
    pub time_ms: f32,
    pub _padding: [f32; 3],
}

unsafe impl Zeroable for SurfaceUniforms {}
unsafe impl Pod for SurfaceUniforms {}

pub(crate) const UNIFORM_BLOCK_SIZE: u64 = std::mem::size_of::<SurfaceUniforms>() as u64;

/// Per-program staging copy of the block, written by location offset and
/// uploaded once per draw.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct UniformShadow {
    data: SurfaceUniforms,
}

impl UniformShadow {
    /// Copies `values` to byte `offset`; out-of-range writes are refused.
    pub(crate) fn write(&mut self, offset: u32, values: &[f32]) -> bool {
        let bytes = bytemuck::bytes_of_mut(&mut self.data);
        let source: &[u8] = bytemuck::cast_slice(values);
        let start = offset as usize;
        let Some(target) = bytes.get_mut(start..start + source.len()) else {
            return false;
        };
        target.copy_from_slice(source);
        true
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.data)
    }

    #[cfg(test)]
    pub(crate) fn uniforms(&self) -> &SurfaceUniforms {
        &self.data
    }
}

//! GPU-side materials
//!
//! A material owns up to one texture per [`TextureChannel`]. Its bind group
//! always binds all four slots; absent slots are bound to the shared null
//! texture and flagged off in the presence mask.

use bytemuck::{Pod, Zeroable};

use super::texture::GpuTexture;
use crate::backend::*;
use crate::scene::TextureChannel;

/// Number of texture slots per material
pub const MATERIAL_SLOTS: usize = 4;

/// Material uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct MaterialUniform {
    /// 1 where the slot holds a texture, in [`TextureChannel::slot`] order
    pub texture_mask: [u32; MATERIAL_SLOTS],
}

impl MaterialUniform {
    pub fn from_textures(textures: &[Option<GpuTexture>; MATERIAL_SLOTS]) -> Self {
        Self {
            texture_mask: std::array::from_fn(|i| textures[i].is_some() as u32),
        }
    }
}

#[derive(Debug)]
pub struct Material {
    pub name: String,
    textures: [Option<GpuTexture>; MATERIAL_SLOTS],
    uniform_buffer: BufferHandle,
    bind_group: BindGroupHandle,
}

impl Material {
    pub(crate) fn from_parts(
        name: String,
        textures: [Option<GpuTexture>; MATERIAL_SLOTS],
        uniform_buffer: BufferHandle,
        bind_group: BindGroupHandle,
    ) -> Self {
        Self {
            name,
            textures,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn texture(&self, channel: TextureChannel) -> Option<&GpuTexture> {
        self.textures[channel.slot()].as_ref()
    }

    pub fn has_texture(&self, channel: TextureChannel) -> bool {
        self.texture(channel).is_some()
    }

    /// Number of channels holding a texture
    pub fn texture_count(&self) -> usize {
        self.textures.iter().flatten().count()
    }

    pub fn bind_group(&self) -> BindGroupHandle {
        self.bind_group
    }

    pub fn uniform_buffer(&self) -> BufferHandle {
        self.uniform_buffer
    }

    /// Destroy the bind group, uniform buffer and every owned texture
    pub fn release<B: GraphicsBackend>(self, backend: &mut B) {
        backend.destroy_bind_group(self.bind_group);
        backend.destroy_buffer(self.uniform_buffer);
        for texture in self.textures.into_iter().flatten() {
            texture.release(backend);
        }
    }
}

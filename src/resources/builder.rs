//! GPU resource builder
//!
//! Creates the buffers and bind groups that back meshes, materials and
//! model placements. Buffer and bind-group allocation failures are fatal:
//! they indicate a device or driver condition the viewer cannot recover
//! from, and every later draw assumes the referenced objects exist. Texture
//! uploads stay soft and are resolved through [`super::resolve_texture`].

use glam::Vec3;

use super::material::{Material, MaterialUniform, MATERIAL_SLOTS};
use super::mesh::MeshBuffers;
use super::model::Placement;
use super::texture::GpuTexture;
use crate::backend::*;

/// Bind group layouts and the fallback texture every material binds against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingLayouts {
    pub object: BindGroupLayoutHandle,
    pub material: BindGroupLayoutHandle,
    /// 1x1 all-zero texture bound to absent material slots
    pub null_texture: TextureViewHandle,
}

/// Binding index of the material uniform, after the texture slots
pub const MATERIAL_UNIFORM_BINDING: u32 = MATERIAL_SLOTS as u32;

pub struct ResourceBuilder<'a, B: GraphicsBackend> {
    backend: &'a mut B,
    layouts: BindingLayouts,
}

impl<'a, B: GraphicsBackend> ResourceBuilder<'a, B> {
    pub fn new(backend: &'a mut B, layouts: BindingLayouts) -> Self {
        Self { backend, layouts }
    }

    pub fn backend(&mut self) -> &mut B {
        &mut *self.backend
    }

    /// Upload vertex and index data into two exactly-sized buffers.
    ///
    /// # Panics
    ///
    /// Panics if either buffer cannot be allocated.
    pub fn upload_mesh(&mut self, name: &str, vertices: &[Vertex], indices: &[u32]) -> MeshBuffers {
        let vertex_buffer = self
            .backend
            .create_buffer_init(
                &BufferDescriptor {
                    label: Some(format!("{name} vertices")),
                    size: std::mem::size_of_val(vertices) as u64,
                    usage: BufferUsage::VERTEX,
                },
                bytemuck::cast_slice(vertices),
            )
            .unwrap_or_else(|e| panic!("Failed to create vertex buffer for mesh '{name}': {e}"));

        let index_buffer = self
            .backend
            .create_buffer_init(
                &BufferDescriptor {
                    label: Some(format!("{name} indices")),
                    size: std::mem::size_of_val(indices) as u64,
                    usage: BufferUsage::INDEX,
                },
                bytemuck::cast_slice(indices),
            )
            .unwrap_or_else(|e| panic!("Failed to create index buffer for mesh '{name}': {e}"));

        MeshBuffers {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    /// Wrap resolved textures into a material with its uniform and bind group.
    ///
    /// # Panics
    ///
    /// Panics if the uniform buffer or bind group cannot be created.
    pub fn create_material(
        &mut self,
        name: &str,
        textures: [Option<GpuTexture>; MATERIAL_SLOTS],
    ) -> Material {
        let uniform = MaterialUniform::from_textures(&textures);
        let uniform_buffer = self
            .backend
            .create_buffer_init(
                &BufferDescriptor {
                    label: Some(format!("{name} material")),
                    size: std::mem::size_of::<MaterialUniform>() as u64,
                    usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
                },
                bytemuck::bytes_of(&uniform),
            )
            .unwrap_or_else(|e| panic!("Failed to create uniform for material '{name}': {e}"));

        let mut entries: Vec<(u32, BindGroupEntry)> = textures
            .iter()
            .enumerate()
            .map(|(slot, texture)| {
                let view = texture
                    .as_ref()
                    .map_or(self.layouts.null_texture, |t| t.view);
                (slot as u32, BindGroupEntry::Texture(view))
            })
            .collect();
        entries.push((MATERIAL_UNIFORM_BINDING, BindGroupEntry::Buffer(uniform_buffer)));

        let bind_group = self
            .backend
            .create_bind_group(self.layouts.material, &entries)
            .unwrap_or_else(|e| panic!("Failed to create bind group for material '{name}': {e}"));

        Material::from_parts(name.to_string(), textures, uniform_buffer, bind_group)
    }

    /// Placement uniform for a model at `position`.
    ///
    /// # Panics
    ///
    /// Panics if the uniform buffer or bind group cannot be created.
    pub fn create_placement(&mut self, name: &str, position: Vec3) -> Placement {
        let uniform = ObjectUniform::from_position(position);
        let buffer = self
            .backend
            .create_buffer_init(
                &BufferDescriptor {
                    label: Some(format!("{name} placement")),
                    size: std::mem::size_of::<ObjectUniform>() as u64,
                    usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
                },
                bytemuck::bytes_of(&uniform),
            )
            .unwrap_or_else(|e| panic!("Failed to create placement for model '{name}': {e}"));

        let bind_group = self
            .backend
            .create_bind_group(self.layouts.object, &[(0, BindGroupEntry::Buffer(buffer))])
            .unwrap_or_else(|e| panic!("Failed to create placement bind group for '{name}': {e}"));

        Placement { buffer, bind_group }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::TextureData;
    use crate::scene::TextureChannel;

    fn layouts(backend: &mut HeadlessBackend) -> BindingLayouts {
        let object = backend.create_bind_group_layout(&[]).unwrap();
        let material = backend.create_bind_group_layout(&[]).unwrap();
        let null = GpuTexture::create(backend, &TextureData::solid_color([0; 4], "null")).unwrap();
        BindingLayouts {
            object,
            material,
            null_texture: null.view,
        }
    }

    #[test]
    fn mesh_buffers_are_sized_to_data() {
        let mut backend = HeadlessBackend::default();
        let layouts = layouts(&mut backend);
        let vertices = [Vertex::new(Vec3::ZERO, Vec3::Z, glam::Vec2::ZERO); 3];

        let buffers =
            ResourceBuilder::new(&mut backend, layouts).upload_mesh("tri", &vertices, &[0, 1, 2]);

        assert_eq!(buffers.index_count, 3);
        assert_eq!(backend.buffer_data(buffers.vertex_buffer).unwrap().len(), 96);
        assert_eq!(backend.buffer_data(buffers.index_buffer).unwrap().len(), 12);
    }

    #[test]
    #[should_panic(expected = "Failed to create vertex buffer")]
    fn mesh_allocation_failure_is_fatal() {
        let mut backend = HeadlessBackend::default();
        let layouts = layouts(&mut backend);
        backend.set_fail_buffer_creation(true);

        ResourceBuilder::new(&mut backend, layouts).upload_mesh("tri", &[], &[]);
    }

    #[test]
    fn absent_slots_bind_the_null_texture() {
        let mut backend = HeadlessBackend::default();
        let layouts = layouts(&mut backend);
        let diffuse =
            GpuTexture::create(&mut backend, &TextureData::solid_color([255; 4], "d")).unwrap();
        let diffuse_view = diffuse.view;

        let material = ResourceBuilder::new(&mut backend, layouts)
            .create_material("m", [Some(diffuse), None, None, None]);

        assert!(material.has_texture(TextureChannel::Diffuse));
        assert!(!material.has_texture(TextureChannel::Normal));
        let entries = backend.bind_group_entries(material.bind_group()).unwrap();
        let views: Vec<_> = entries
            .iter()
            .filter_map(|(_, e)| match e {
                BindGroupEntry::Texture(view) => Some(*view),
                _ => None,
            })
            .collect();
        assert_eq!(
            views,
            vec![diffuse_view, layouts.null_texture, layouts.null_texture, layouts.null_texture]
        );

        let mask: MaterialUniform =
            bytemuck::pod_read_unaligned(backend.buffer_data(material.uniform_buffer()).unwrap());
        assert_eq!(mask.texture_mask, [1, 0, 0, 0]);

        let textures_before = backend.live_texture_count();
        material.release(&mut backend);
        assert_eq!(backend.live_texture_count(), textures_before - 1);
    }
}

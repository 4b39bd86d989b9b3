//! Loaded models

use glam::Vec3;

use super::{Material, Mesh};
use crate::backend::*;

/// World placement uniform and the bind group exposing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub buffer: BufferHandle,
    pub bind_group: BindGroupHandle,
}

/// An imported model: meshes, the materials they index and a placement.
///
/// A model exclusively owns every GPU resource it references; they are
/// destroyed by [`Model::release`].
#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    position: Vec3,
    placement: Placement,
}

impl Model {
    pub fn new(
        name: impl Into<String>,
        meshes: Vec<Mesh>,
        materials: Vec<Material>,
        position: Vec3,
        placement: Placement,
    ) -> Self {
        Self {
            name: name.into(),
            meshes,
            materials,
            position,
            placement,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the model and rewrite its placement uniform
    pub fn set_position<B: GraphicsBackend>(&mut self, backend: &mut B, position: Vec3) {
        self.position = position;
        let uniform = ObjectUniform::from_position(position);
        backend.write_buffer(self.placement.buffer, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Material used by `mesh`, if the model has one at its index
    pub fn material_for(&self, mesh: &Mesh) -> Option<&Material> {
        self.materials.get(mesh.material_index)
    }

    pub fn vertex_count(&self) -> u32 {
        self.meshes.iter().map(|m| m.vertex_count).sum()
    }

    pub fn triangle_count(&self) -> u32 {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }

    /// Destroy every GPU resource owned by this model
    pub fn release<B: GraphicsBackend>(self, backend: &mut B) {
        log::debug!("Releasing model '{}'", self.name);
        for mesh in self.meshes {
            mesh.release(backend);
        }
        for material in self.materials {
            material.release(backend);
        }
        backend.destroy_bind_group(self.placement.bind_group);
        backend.destroy_buffer(self.placement.buffer);
    }
}

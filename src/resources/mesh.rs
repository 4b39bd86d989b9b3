//! Mesh data structures

use crate::backend::*;

/// Vertex and index buffers of one uploaded mesh.
///
/// Buffers are sized exactly to the uploaded data and never written again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBuffers {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_count: u32,
}

/// A mesh owned by a [`Model`](super::Model)
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub buffers: MeshBuffers,
    pub vertex_count: u32,
    /// Index into the owning model's materials, 0 when it has none
    pub material_index: usize,
}

impl Mesh {
    pub fn index_count(&self) -> u32 {
        self.buffers.index_count
    }

    pub fn triangle_count(&self) -> u32 {
        self.buffers.index_count / 3
    }

    pub fn release<B: GraphicsBackend>(self, backend: &mut B) {
        backend.destroy_buffer(self.buffers.vertex_buffer);
        backend.destroy_buffer(self.buffers.index_buffer);
    }
}

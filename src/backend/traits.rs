//! The GPU device capability
//!
//! Everything the importer, the resource builder and the frame loop ask of
//! the GPU goes through [`GraphicsBackend`]. Objects live in tables owned by
//! the backend and are addressed by copyable handles; whoever creates a
//! handle releases it.

use std::ops::Range;

use crate::backend::types::*;

pub use crate::error::{BackendError, BackendResult};

macro_rules! handles {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct $name(pub(crate) u64);
        )*
    };
}

handles! {
    /// Vertex, index or uniform buffer
    BufferHandle;
    TextureHandle;
    /// Shader-resource view of a texture, as bound to material slots
    TextureViewHandle;
    SamplerHandle;
    RenderPipelineHandle;
    BindGroupHandle;
    BindGroupLayoutHandle;
}

/// A resource bound at one binding of a bind group
#[derive(Debug, Clone, PartialEq)]
pub enum BindGroupEntry {
    /// Whole-buffer uniform binding
    Buffer(BufferHandle),
    Texture(TextureViewHandle),
    Sampler(SamplerHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingType {
    UniformBuffer,
    /// Filterable float 2D texture
    Texture,
    /// Filtering sampler
    Sampler,
}

#[derive(Debug, Clone)]
pub struct BindGroupLayoutEntry {
    pub binding: u32,
    pub visibility: ShaderStages,
    pub ty: BindingType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStages {
    Vertex,
    Fragment,
    Both,
}

/// Depth test of a pipeline. The depth target uses `format`.
#[derive(Debug, Clone, Copy)]
pub struct DepthTest {
    pub format: TextureFormat,
    pub write: bool,
    pub compare: CompareFunction,
}

/// Triangle-list pipeline with counter-clockwise front faces and a single
/// opaque color target.
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor {
    pub label: Option<String>,
    /// WGSL module with `vs_main` and `fs_main` entry points
    pub shader: String,
    pub vertex_layout: VertexBufferLayout,
    pub bind_group_layouts: Vec<BindGroupLayoutHandle>,
    pub cull_mode: CullMode,
    pub depth: Option<DepthTest>,
    pub color_format: TextureFormat,
}

/// Color target of a pass. `None` keeps the previous contents.
#[derive(Debug, Clone)]
pub struct ColorAttachment {
    pub view: TextureViewHandle,
    pub clear: Option<[f32; 4]>,
}

#[derive(Debug, Clone)]
pub struct DepthAttachment {
    pub view: TextureViewHandle,
    pub clear: Option<f32>,
}

/// Both attachments are stored at the end of the pass.
#[derive(Debug, Clone)]
pub struct RenderPassDescriptor {
    pub label: Option<String>,
    pub color: ColorAttachment,
    pub depth: Option<DepthAttachment>,
}

/// The swapchain image acquired by [`GraphicsBackend::begin_frame`].
///
/// `swapchain_view` is only valid until the matching `end_frame`.
#[derive(Debug, Clone)]
pub struct FrameContext {
    pub swapchain_view: TextureViewHandle,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

/// GPU device capability.
///
/// Creation returns `Err` instead of aborting when the request exceeds device
/// limits or uses an unsupported format, so callers decide whether a failure
/// is fatal. Pass commands (`set_*`, `draw_indexed`) issued outside
/// `begin_render_pass`/`end_render_pass` are ignored.
pub trait GraphicsBackend {
    /// Reconfigure the swapchain; zero sizes are ignored
    fn resize(&mut self, width: u32, height: u32);

    /// Current swapchain size, possibly clamped below the requested size
    fn surface_size(&self) -> (u32, u32);

    fn begin_frame(&mut self) -> BackendResult<FrameContext>;

    /// Submit the frame's work and present
    fn end_frame(&mut self) -> BackendResult<()>;

    fn swapchain_format(&self) -> TextureFormat;

    /// Whether textures of `format` can be created and sampled
    fn supports_format(&self, format: TextureFormat) -> bool;

    /// Zero-initialized buffer
    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle>;

    /// Buffer holding `data`; `desc.size` is ignored
    fn create_buffer_init(&mut self, desc: &BufferDescriptor, data: &[u8])
        -> BackendResult<BufferHandle>;

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]);

    fn destroy_buffer(&mut self, buffer: BufferHandle);

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle>;

    /// 2D view of array layer 0 across every mip level
    fn create_texture_view(&mut self, texture: TextureHandle) -> BackendResult<TextureViewHandle>;

    /// Upload one mip level of one array layer
    fn write_texture(
        &mut self,
        texture: TextureHandle,
        data: &[u8],
        layout: TextureDataLayout,
    ) -> BackendResult<()>;

    fn destroy_texture(&mut self, texture: TextureHandle);

    fn destroy_texture_view(&mut self, view: TextureViewHandle);

    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> BackendResult<SamplerHandle>;

    fn create_bind_group_layout(
        &mut self,
        entries: &[BindGroupLayoutEntry],
    ) -> BackendResult<BindGroupLayoutHandle>;

    /// Entries are `(binding, resource)` pairs
    fn create_bind_group(
        &mut self,
        layout: BindGroupLayoutHandle,
        entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle>;

    fn destroy_bind_group(&mut self, bind_group: BindGroupHandle);

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle>;

    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor);

    fn end_render_pass(&mut self);

    fn set_render_pipeline(&mut self, pipeline: RenderPipelineHandle);

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupHandle);

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle);

    fn set_index_buffer(&mut self, buffer: BufferHandle, format: IndexFormat);

    /// Viewport at the origin covering the full depth range
    fn set_viewport(&mut self, width: f32, height: f32);

    /// Single-instance indexed draw
    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32);
}

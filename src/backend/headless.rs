//! Headless GPU backend.
//!
//! This backend doesn't talk to a GPU. It keeps a table per resource kind so
//! that lifetimes can be inspected, validates uploads the same way the wgpu
//! backend does, and records every render-pass command of the current frame.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use crate::backend::traits::*;
use crate::backend::types::*;

/// Largest texture edge accepted, matching wgpu's default limits.
const MAX_TEXTURE_DIMENSION: u32 = 8192;
const MAX_ARRAY_LAYERS: u32 = 256;

/// A command recorded inside a render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    BeginPass {
        label: Option<String>,
        clear_color: Option<[f32; 4]>,
        depth_clear: Option<f32>,
    },
    SetPipeline(RenderPipelineHandle),
    SetBindGroup { index: u32, bind_group: BindGroupHandle },
    SetVertexBuffer { slot: u32, buffer: BufferHandle },
    SetIndexBuffer { buffer: BufferHandle, format: IndexFormat },
    SetViewport { width: f32, height: f32 },
    DrawIndexed { indices: Range<u32>, base_vertex: i32 },
    EndPass,
}

#[derive(Debug, Clone)]
struct RecordedBuffer {
    label: Option<String>,
    data: Vec<u8>,
}

/// Recording backend used for tests and runs without a window.
#[derive(Debug)]
pub struct HeadlessBackend {
    width: u32,
    height: u32,
    next_id: u64,
    buffers: HashMap<u64, RecordedBuffer>,
    textures: HashMap<u64, TextureDescriptor>,
    texture_views: HashMap<u64, TextureHandle>,
    samplers: HashSet<u64>,
    bind_group_layouts: HashSet<u64>,
    bind_groups: HashMap<u64, Vec<(u32, BindGroupEntry)>>,
    render_pipelines: HashSet<u64>,
    texture_writes: Vec<(TextureHandle, TextureDataLayout)>,
    commands: Vec<RecordedCommand>,
    in_pass: bool,
    frame_open: bool,
    frames_presented: u64,
    unsupported_formats: HashSet<TextureFormat>,
    fail_buffer_creation: bool,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            next_id: 1,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            texture_views: HashMap::new(),
            samplers: HashSet::new(),
            bind_group_layouts: HashSet::new(),
            bind_groups: HashMap::new(),
            render_pipelines: HashSet::new(),
            texture_writes: Vec::new(),
            commands: Vec::new(),
            in_pass: false,
            frame_open: false,
            frames_presented: 0,
            unsupported_formats: HashSet::new(),
            fail_buffer_creation: false,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn record(&mut self, command: RecordedCommand) {
        if self.in_pass {
            self.commands.push(command);
        } else {
            log::warn!("HeadlessBackend: {:?} issued outside a render pass", command);
        }
    }

    /// Make every subsequent buffer creation fail with `OutOfMemory`.
    pub fn set_fail_buffer_creation(&mut self, fail: bool) {
        self.fail_buffer_creation = fail;
    }

    /// Mark a texture format as (un)available, as an adapter without the
    /// matching feature would report.
    pub fn set_format_supported(&mut self, format: TextureFormat, supported: bool) {
        if supported {
            self.unsupported_formats.remove(&format);
        } else {
            self.unsupported_formats.insert(format);
        }
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn live_texture_view_count(&self) -> usize {
        self.texture_views.len()
    }

    pub fn live_bind_group_count(&self) -> usize {
        self.bind_groups.len()
    }

    pub fn is_buffer_live(&self, buffer: BufferHandle) -> bool {
        self.buffers.contains_key(&buffer.0)
    }

    pub fn is_texture_live(&self, texture: TextureHandle) -> bool {
        self.textures.contains_key(&texture.0)
    }

    /// Contents of a buffer as last created or written.
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer.0).map(|b| b.data.as_slice())
    }

    pub fn buffer_label(&self, buffer: BufferHandle) -> Option<&str> {
        self.buffers.get(&buffer.0).and_then(|b| b.label.as_deref())
    }

    pub fn texture_descriptor(&self, texture: TextureHandle) -> Option<&TextureDescriptor> {
        self.textures.get(&texture.0)
    }

    /// Texture a view was created from.
    pub fn view_texture(&self, view: TextureViewHandle) -> Option<TextureHandle> {
        self.texture_views.get(&view.0).copied()
    }

    pub fn bind_group_entries(&self, bind_group: BindGroupHandle) -> Option<&[(u32, BindGroupEntry)]> {
        self.bind_groups.get(&bind_group.0).map(Vec::as_slice)
    }

    /// Every texture upload since creation, in order.
    pub fn texture_writes(&self) -> &[(TextureHandle, TextureDataLayout)] {
        &self.texture_writes
    }

    /// Commands recorded since the last `begin_frame`.
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Index ranges of the indexed draws recorded since the last `begin_frame`.
    pub fn draw_calls(&self) -> Vec<Range<u32>> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::DrawIndexed { indices, .. } => Some(indices.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width.min(MAX_TEXTURE_DIMENSION);
            self.height = height.min(MAX_TEXTURE_DIMENSION);
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn begin_frame(&mut self) -> BackendResult<FrameContext> {
        self.commands.clear();
        self.frame_open = true;
        let view_id = self.next_id();
        Ok(FrameContext {
            swapchain_view: TextureViewHandle(view_id),
            width: self.width,
            height: self.height,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        if self.frame_open {
            self.frame_open = false;
            self.frames_presented += 1;
        }
        Ok(())
    }

    fn swapchain_format(&self) -> TextureFormat {
        TextureFormat::Bgra8UnormSrgb
    }

    fn supports_format(&self, format: TextureFormat) -> bool {
        !self.unsupported_formats.contains(&format)
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        self.create_buffer_init(desc, &vec![0; desc.size as usize])
    }

    fn create_buffer_init(
        &mut self,
        desc: &BufferDescriptor,
        data: &[u8],
    ) -> BackendResult<BufferHandle> {
        if self.fail_buffer_creation {
            return Err(BackendError::OutOfMemory);
        }
        log::trace!(
            "HeadlessBackend: creating buffer {:?} (size: {})",
            desc.label,
            data.len()
        );
        let id = self.next_id();
        self.buffers.insert(
            id,
            RecordedBuffer {
                label: desc.label.clone(),
                data: data.to_vec(),
            },
        );
        Ok(BufferHandle(id))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        if let Some(buf) = self.buffers.get_mut(&buffer.0) {
            let start = offset as usize;
            let end = start + data.len();
            if end <= buf.data.len() {
                buf.data[start..end].copy_from_slice(data);
            }
        }
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        if desc.width == 0
            || desc.height == 0
            || desc.width > MAX_TEXTURE_DIMENSION
            || desc.height > MAX_TEXTURE_DIMENSION
        {
            return Err(BackendError::TextureCreationFailed(format!(
                "{}x{} is outside the supported texture size",
                desc.width, desc.height
            )));
        }
        if desc.array_layers == 0 || desc.array_layers > MAX_ARRAY_LAYERS {
            return Err(BackendError::TextureCreationFailed(format!(
                "{} array layers is outside the supported range",
                desc.array_layers
            )));
        }
        if !self.supports_format(desc.format) {
            return Err(BackendError::TextureCreationFailed(format!(
                "{:?} is not supported by this device",
                desc.format
            )));
        }
        let (bw, bh) = desc.format.block_dimensions();
        if desc.width % bw != 0 || desc.height % bh != 0 {
            return Err(BackendError::TextureCreationFailed(format!(
                "{}x{} is not a multiple of the {:?} block size",
                desc.width, desc.height, desc.format
            )));
        }

        log::trace!(
            "HeadlessBackend: creating texture {:?} ({}x{}, {} layers, {} mips)",
            desc.label,
            desc.width,
            desc.height,
            desc.array_layers,
            desc.mip_levels
        );
        let id = self.next_id();
        let mut desc = desc.clone();
        desc.mip_levels = desc.mip_levels.max(1);
        self.textures.insert(id, desc);
        Ok(TextureHandle(id))
    }

    fn create_texture_view(&mut self, texture: TextureHandle) -> BackendResult<TextureViewHandle> {
        if !self.textures.contains_key(&texture.0) {
            return Err(BackendError::TextureCreationFailed("Texture not found".into()));
        }
        let id = self.next_id();
        self.texture_views.insert(id, texture);
        Ok(TextureViewHandle(id))
    }

    fn write_texture(
        &mut self,
        texture: TextureHandle,
        data: &[u8],
        layout: TextureDataLayout,
    ) -> BackendResult<()> {
        let desc = self
            .textures
            .get(&texture.0)
            .ok_or_else(|| BackendError::TextureUploadFailed("Texture not found".into()))?;

        if layout.mip_level >= desc.mip_levels || layout.array_layer >= desc.array_layers {
            return Err(BackendError::TextureUploadFailed(format!(
                "mip {} layer {} is outside the texture",
                layout.mip_level, layout.array_layer
            )));
        }
        if data.len() < layout.byte_len() {
            return Err(BackendError::TextureUploadFailed(format!(
                "expected {} bytes, got {}",
                layout.byte_len(),
                data.len()
            )));
        }

        self.texture_writes.push((texture, layout));
        Ok(())
    }

    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> BackendResult<SamplerHandle> {
        log::trace!("HeadlessBackend: creating sampler {:?}", desc.label);
        let id = self.next_id();
        self.samplers.insert(id);
        Ok(SamplerHandle(id))
    }

    fn create_bind_group_layout(
        &mut self,
        _entries: &[BindGroupLayoutEntry],
    ) -> BackendResult<BindGroupLayoutHandle> {
        let id = self.next_id();
        self.bind_group_layouts.insert(id);
        Ok(BindGroupLayoutHandle(id))
    }

    fn create_bind_group(
        &mut self,
        layout: BindGroupLayoutHandle,
        entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle> {
        if !self.bind_group_layouts.contains(&layout.0) {
            return Err(BackendError::PipelineCreationFailed("Layout not found".into()));
        }
        let all_live = entries.iter().all(|(_, entry)| match entry {
            BindGroupEntry::Buffer(buffer) => self.buffers.contains_key(&buffer.0),
            BindGroupEntry::Texture(view) => self.texture_views.contains_key(&view.0),
            BindGroupEntry::Sampler(sampler) => self.samplers.contains(&sampler.0),
        });
        if !all_live {
            return Err(BackendError::PipelineCreationFailed(
                "Bind group references a destroyed resource".into(),
            ));
        }

        let id = self.next_id();
        self.bind_groups.insert(id, entries.to_vec());
        Ok(BindGroupHandle(id))
    }

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle> {
        if desc
            .bind_group_layouts
            .iter()
            .any(|h| !self.bind_group_layouts.contains(&h.0))
        {
            return Err(BackendError::PipelineCreationFailed("Layout not found".into()));
        }
        let id = self.next_id();
        self.render_pipelines.insert(id);
        Ok(RenderPipelineHandle(id))
    }

    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor) {
        self.in_pass = true;
        self.record(RecordedCommand::BeginPass {
            label: desc.label.clone(),
            clear_color: desc.color.clear,
            depth_clear: desc.depth.as_ref().and_then(|depth| depth.clear),
        });
    }

    fn end_render_pass(&mut self) {
        self.record(RecordedCommand::EndPass);
        self.in_pass = false;
    }

    fn set_render_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        self.record(RecordedCommand::SetPipeline(pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupHandle) {
        self.record(RecordedCommand::SetBindGroup { index, bind_group });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle) {
        self.record(RecordedCommand::SetVertexBuffer { slot, buffer });
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle, format: IndexFormat) {
        self.record(RecordedCommand::SetIndexBuffer { buffer, format });
    }

    fn set_viewport(&mut self, width: f32, height: f32) {
        self.record(RecordedCommand::SetViewport { width, height });
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32) {
        self.record(RecordedCommand::DrawIndexed {
            indices,
            base_vertex,
        });
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer.0);
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture.0);
    }

    fn destroy_texture_view(&mut self, view: TextureViewHandle) {
        self.texture_views.remove(&view.0);
    }

    fn destroy_bind_group(&mut self, bind_group: BindGroupHandle) {
        self.bind_groups.remove(&bind_group.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba_desc(width: u32, height: u32) -> TextureDescriptor {
        TextureDescriptor {
            width,
            height,
            ..Default::default()
        }
    }

    #[test]
    fn tracks_resource_lifetimes() {
        let mut backend = HeadlessBackend::default();
        let desc = BufferDescriptor {
            label: Some("test".into()),
            size: 16,
            usage: BufferUsage::VERTEX,
        };
        let a = backend.create_buffer(&desc).unwrap();
        let b = backend.create_buffer_init(&desc, &[1, 2, 3, 4]).unwrap();
        assert_eq!(backend.live_buffer_count(), 2);
        assert_eq!(backend.buffer_data(b), Some(&[1u8, 2, 3, 4][..]));

        backend.destroy_buffer(a);
        assert_eq!(backend.live_buffer_count(), 1);
        assert!(!backend.is_buffer_live(a));
    }

    #[test]
    fn buffer_failure_injection() {
        let mut backend = HeadlessBackend::default();
        backend.set_fail_buffer_creation(true);
        let result = backend.create_buffer_init(
            &BufferDescriptor {
                label: None,
                size: 4,
                usage: BufferUsage::INDEX,
                },
            &[0; 4],
        );
        assert!(matches!(result, Err(BackendError::OutOfMemory)));
    }

    #[test]
    fn rejects_short_texture_upload() {
        let mut backend = HeadlessBackend::default();
        let texture = backend.create_texture(&rgba_desc(4, 4)).unwrap();
        let layout = TextureDataLayout::packed(TextureFormat::Rgba8Unorm, 4, 4);
        assert!(backend.write_texture(texture, &[0; 63], layout).is_err());
        assert!(backend.write_texture(texture, &[0; 64], layout).is_ok());
        assert_eq!(backend.texture_writes().len(), 1);
    }

    #[test]
    fn rejects_unaligned_compressed_texture() {
        let mut backend = HeadlessBackend::default();
        let desc = TextureDescriptor {
            format: TextureFormat::Bc1RgbaUnorm,
            ..rgba_desc(6, 8)
        };
        assert!(backend.create_texture(&desc).is_err());

        backend.set_format_supported(TextureFormat::Bc1RgbaUnorm, false);
        let desc = TextureDescriptor {
            format: TextureFormat::Bc1RgbaUnorm,
            ..rgba_desc(8, 8)
        };
        assert!(backend.create_texture(&desc).is_err());
    }

    #[test]
    fn records_pass_commands_per_frame() {
        let mut backend = HeadlessBackend::default();
        let frame = backend.begin_frame().unwrap();
        backend.begin_render_pass(&RenderPassDescriptor {
            label: Some("main".into()),
            color: ColorAttachment {
                view: frame.swapchain_view,
                clear: Some([0.0, 0.0, 0.0, 1.0]),
            },
            depth: None,
        });
        backend.draw_indexed(0..6, 0);
        backend.end_render_pass();
        backend.end_frame().unwrap();

        assert_eq!(backend.draw_calls(), vec![0..6]);
        assert_eq!(
            backend.commands()[0],
            RecordedCommand::BeginPass {
                label: Some("main".into()),
                clear_color: Some([0.0, 0.0, 0.0, 1.0]),
                depth_clear: None,
            }
        );
        assert_eq!(backend.frames_presented(), 1);

        backend.begin_frame().unwrap();
        assert!(backend.commands().is_empty());
    }
}

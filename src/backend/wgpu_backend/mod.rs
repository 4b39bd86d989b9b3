//! wgpu implementation of [`GraphicsBackend`]
//!
//! GPU objects live in per-kind [`Table`]s keyed by handle id. Render-pass
//! commands are buffered between `begin_render_pass` and `end_render_pass`
//! and replayed into a `wgpu::RenderPass` at the end, since a wgpu pass
//! borrows every resource it touches.

mod convert;

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::backend::traits::*;
use crate::backend::types::*;

/// GPU objects of one kind
struct Table<T> {
    kind: &'static str,
    items: HashMap<u64, T>,
}

impl<T> Table<T> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            items: HashMap::new(),
        }
    }

    fn get(&self, id: u64) -> Option<&T> {
        self.items.get(&id)
    }

    /// Like `get`, for creation paths that report a missing dependency
    fn require(&self, id: u64) -> BackendResult<&T> {
        self.items.get(&id).ok_or_else(|| {
            BackendError::PipelineCreationFailed(format!("{} {} does not exist", self.kind, id))
        })
    }

    fn insert(&mut self, id: u64, item: T) {
        self.items.insert(id, item);
    }

    fn remove(&mut self, id: u64) -> Option<T> {
        self.items.remove(&id)
    }
}

#[derive(Clone)]
enum PassCommand {
    SetPipeline(RenderPipelineHandle),
    SetBindGroup(u32, BindGroupHandle),
    SetVertexBuffer(u32, BufferHandle),
    SetIndexBuffer(BufferHandle, IndexFormat),
    SetViewport(f32, f32),
    DrawIndexed(Range<u32>, i32),
}

struct PendingPass {
    descriptor: RenderPassDescriptor,
    commands: Vec<PassCommand>,
}

/// Swapchain image and encoder between `begin_frame` and `end_frame`
struct ActiveFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    view_id: u64,
    encoder: wgpu::CommandEncoder,
}

pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,

    next_id: u64,
    buffers: Table<wgpu::Buffer>,
    textures: Table<wgpu::Texture>,
    texture_views: Table<wgpu::TextureView>,
    samplers: Table<wgpu::Sampler>,
    bind_group_layouts: Table<wgpu::BindGroupLayout>,
    bind_groups: Table<wgpu::BindGroup>,
    pipelines: Table<wgpu::RenderPipeline>,

    frame: Option<ActiveFrame>,
    pass: Option<PendingPass>,
}

impl WgpuBackend {
    /// Create the backend for `window`, blocking on the adapter and device
    /// requests.
    pub fn new(window: Arc<Window>, vsync: bool) -> BackendResult<Self> {
        pollster::block_on(Self::new_async(window, vsync))
    }

    pub async fn new_async(window: Arc<Window>, vsync: bool) -> BackendResult<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| BackendError::SurfaceCreationFailed(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| BackendError::InitializationFailed("none compatible with the window surface".into()))?;

        let info = adapter.get_info();
        log::info!("Selected GPU: {} ({:?} backend)", info.name, info.backend);

        // BC formats are optional; DDS textures fall back to the image decoder
        let required_features = adapter.features() & wgpu::Features::TEXTURE_COMPRESSION_BC;
        if required_features.is_empty() {
            log::warn!("Adapter has no BC texture compression support");
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Viewer Device"),
                    required_features,
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|e| BackendError::DeviceCreationFailed(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| {
                BackendError::SurfaceCreationFailed("surface reports no formats".into())
            })?;

        let max = device.limits().max_texture_dimension_2d;
        let (width, height) = fit_to_limit(size.width, size.height, max);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            next_id: 1,
            buffers: Table::new("buffer"),
            textures: Table::new("texture"),
            texture_views: Table::new("texture view"),
            samplers: Table::new("sampler"),
            bind_group_layouts: Table::new("bind group layout"),
            bind_groups: Table::new("bind group"),
            pipelines: Table::new("render pipeline"),
            frame: None,
            pass: None,
        })
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn push_command(&mut self, command: PassCommand) {
        if let Some(pass) = &mut self.pass {
            pass.commands.push(command);
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn wgpu_surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Device, queue and the current frame's encoder, borrowed together for
    /// renderers that upload before recording.
    pub fn device_queue_encoder(
        &mut self,
    ) -> (&wgpu::Device, &wgpu::Queue, Option<&mut wgpu::CommandEncoder>) {
        (
            &self.device,
            &self.queue,
            self.frame.as_mut().map(|frame| &mut frame.encoder),
        )
    }

    /// Paint egui output over `target`, keeping what the model pass drew.
    pub fn render_egui(
        &mut self,
        renderer: &egui_wgpu::Renderer,
        paint_jobs: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        target: TextureViewHandle,
    ) {
        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        let Some(view) = resolve_view(&frame.view, frame.view_id, &self.texture_views, target)
        else {
            return;
        };

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("UI Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: convert::operations(None),
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        renderer.render(&mut pass, paint_jobs, screen_descriptor);
    }
}

/// Scale `width`x`height` down to fit `max` on both axes, keeping the aspect
/// ratio. Zero sizes become 1.
fn fit_to_limit(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width.max(1), height.max(1));
    }
    let scale = (max as f32 / width as f32).min(max as f32 / height as f32);
    (
        ((width as f32 * scale) as u32).clamp(1, max),
        ((height as f32 * scale) as u32).clamp(1, max),
    )
}

/// The swapchain view of the active frame, or a view from the table
fn resolve_view<'a>(
    swapchain: &'a wgpu::TextureView,
    swapchain_id: u64,
    views: &'a Table<wgpu::TextureView>,
    handle: TextureViewHandle,
) -> Option<&'a wgpu::TextureView> {
    if handle.0 == swapchain_id {
        Some(swapchain)
    } else {
        views.get(handle.0)
    }
}

impl GraphicsBackend for WgpuBackend {
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let max = self.device.limits().max_texture_dimension_2d;
        let (width, height) = fit_to_limit(width, height, max);
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    fn begin_frame(&mut self) -> BackendResult<FrameContext> {
        let surface_texture = self.surface.get_current_texture().map_err(|e| match e {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => BackendError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => BackendError::OutOfMemory,
            other => BackendError::AcquireImageFailed(other.to_string()),
        })?;

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let view_id = self.next_id();
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.frame = Some(ActiveFrame {
            surface_texture,
            view,
            view_id,
            encoder,
        });

        Ok(FrameContext {
            swapchain_view: TextureViewHandle(view_id),
            width: self.surface_config.width,
            height: self.surface_config.height,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        if let Some(frame) = self.frame.take() {
            self.queue.submit(std::iter::once(frame.encoder.finish()));
            frame.surface_texture.present();
        }
        Ok(())
    }

    fn swapchain_format(&self) -> TextureFormat {
        convert::swapchain_format(self.surface_config.format)
    }

    fn supports_format(&self, format: TextureFormat) -> bool {
        let required = wgpu::TextureFormat::from(format).required_features();
        self.device.features().contains(required)
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        if desc.size > self.device.limits().max_buffer_size {
            return Err(BackendError::BufferCreationFailed(format!(
                "{} bytes exceeds the device buffer limit",
                desc.size
            )));
        }

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: desc.label.as_deref(),
            size: desc.size,
            usage: convert::buffer_usages(desc.usage),
            mapped_at_creation: false,
        });
        let id = self.next_id();
        self.buffers.insert(id, buffer);
        Ok(BufferHandle(id))
    }

    fn create_buffer_init(
        &mut self,
        desc: &BufferDescriptor,
        data: &[u8],
    ) -> BackendResult<BufferHandle> {
        if data.len() as u64 > self.device.limits().max_buffer_size {
            return Err(BackendError::BufferCreationFailed(format!(
                "{} bytes exceeds the device buffer limit",
                data.len()
            )));
        }

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: desc.label.as_deref(),
                contents: data,
                usage: convert::buffer_usages(desc.usage),
            });
        let id = self.next_id();
        self.buffers.insert(id, buffer);
        Ok(BufferHandle(id))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        match self.buffers.get(buffer.0) {
            Some(target) => self.queue.write_buffer(target, offset, data),
            None => log::warn!("write to destroyed buffer {}", buffer.0),
        }
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buffer) = self.buffers.remove(buffer.0) {
            buffer.destroy();
        }
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        let limits = self.device.limits();
        let max = limits.max_texture_dimension_2d;
        let invalid = |reason: String| Err(BackendError::TextureCreationFailed(reason));

        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return invalid(format!("{}x{} is outside 1..={}", desc.width, desc.height, max));
        }
        if desc.array_layers == 0 || desc.array_layers > limits.max_texture_array_layers {
            return invalid(format!("{} array layers", desc.array_layers));
        }
        if !self.supports_format(desc.format) {
            return invalid(format!("{:?} is not supported by this device", desc.format));
        }
        let (bw, bh) = desc.format.block_dimensions();
        if desc.width % bw != 0 || desc.height % bh != 0 {
            return invalid(format!(
                "{}x{} is not a multiple of the {:?} block size",
                desc.width, desc.height, desc.format
            ));
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: desc.label.as_deref(),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: desc.array_layers,
            },
            mip_level_count: desc.mip_levels.max(1),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format.into(),
            usage: convert::texture_usages(desc.usage),
            view_formats: &[],
        });
        let id = self.next_id();
        self.textures.insert(id, texture);
        Ok(TextureHandle(id))
    }

    fn create_texture_view(&mut self, texture: TextureHandle) -> BackendResult<TextureViewHandle> {
        let view = self
            .textures
            .get(texture.0)
            .ok_or_else(|| BackendError::TextureCreationFailed("texture does not exist".into()))?
            .create_view(&wgpu::TextureViewDescriptor {
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_array_layer: 0,
                array_layer_count: Some(1),
                ..Default::default()
            });
        let id = self.next_id();
        self.texture_views.insert(id, view);
        Ok(TextureViewHandle(id))
    }

    fn write_texture(
        &mut self,
        texture: TextureHandle,
        data: &[u8],
        layout: TextureDataLayout,
    ) -> BackendResult<()> {
        let target = self
            .textures
            .get(texture.0)
            .ok_or_else(|| BackendError::TextureUploadFailed("texture does not exist".into()))?;

        if layout.mip_level >= target.mip_level_count()
            || layout.array_layer >= target.depth_or_array_layers()
        {
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

        // Copies of block-compressed mips cover whole blocks
        let (bw, bh) = target.format().block_dimensions();
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: target,
                mip_level: layout.mip_level,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layout.array_layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(layout.bytes_per_row),
                rows_per_image: Some(layout.rows),
            },
            wgpu::Extent3d {
                width: layout.width.div_ceil(bw) * bw,
                height: layout.height.div_ceil(bh) * bh,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if let Some(texture) = self.textures.remove(texture.0) {
            texture.destroy();
        }
    }

    fn destroy_texture_view(&mut self, view: TextureViewHandle) {
        self.texture_views.remove(view.0);
    }

    fn create_sampler(&mut self, desc: &SamplerDescriptor) -> BackendResult<SamplerHandle> {
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: desc.label.as_deref(),
            address_mode_u: desc.address_mode.into(),
            address_mode_v: desc.address_mode.into(),
            address_mode_w: desc.address_mode.into(),
            mag_filter: desc.filter.into(),
            min_filter: desc.filter.into(),
            mipmap_filter: desc.filter.into(),
            ..Default::default()
        });
        let id = self.next_id();
        self.samplers.insert(id, sampler);
        Ok(SamplerHandle(id))
    }

    fn create_bind_group_layout(
        &mut self,
        entries: &[BindGroupLayoutEntry],
    ) -> BackendResult<BindGroupLayoutHandle> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = entries
            .iter()
            .map(|entry| wgpu::BindGroupLayoutEntry {
                binding: entry.binding,
                visibility: entry.visibility.into(),
                ty: entry.ty.into(),
                count: None,
            })
            .collect();

        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: None,
                entries: &entries,
            });
        let id = self.next_id();
        self.bind_group_layouts.insert(id, layout);
        Ok(BindGroupLayoutHandle(id))
    }

    fn create_bind_group(
        &mut self,
        layout: BindGroupLayoutHandle,
        entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle> {
        let layout = self.bind_group_layouts.require(layout.0)?;

        let entries = entries
            .iter()
            .map(|(binding, entry)| {
                let resource = match entry {
                    BindGroupEntry::Buffer(buffer) => {
                        self.buffers.require(buffer.0)?.as_entire_binding()
                    }
                    BindGroupEntry::Texture(view) => {
                        wgpu::BindingResource::TextureView(self.texture_views.require(view.0)?)
                    }
                    BindGroupEntry::Sampler(sampler) => {
                        wgpu::BindingResource::Sampler(self.samplers.require(sampler.0)?)
                    }
                };
                Ok(wgpu::BindGroupEntry {
                    binding: *binding,
                    resource,
                })
            })
            .collect::<BackendResult<Vec<_>>>()?;

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout,
            entries: &entries,
        });
        let id = self.next_id();
        self.bind_groups.insert(id, bind_group);
        Ok(BindGroupHandle(id))
    }

    fn destroy_bind_group(&mut self, bind_group: BindGroupHandle) {
        self.bind_groups.remove(bind_group.0);
    }

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle> {
        let layouts = desc
            .bind_group_layouts
            .iter()
            .map(|handle| self.bind_group_layouts.require(handle.0))
            .collect::<BackendResult<Vec<_>>>()?;
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: desc.label.as_deref(),
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: desc.label.as_deref(),
                source: wgpu::ShaderSource::Wgsl(desc.shader.as_str().into()),
            });

        let attributes: Vec<wgpu::VertexAttribute> = desc
            .vertex_layout
            .attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: a.format.into(),
                offset: a.offset,
                shader_location: a.location,
            })
            .collect();
        let vertex_buffers = [wgpu::VertexBufferLayout {
            array_stride: desc.vertex_layout.array_stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        }];
        let targets = [Some(wgpu::ColorTargetState {
            format: desc.color_format.into(),
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: desc.label.as_deref(),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &vertex_buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &targets,
                    compilation_options: Default::default(),
                }),
                primitive: convert::primitive_state(desc.cull_mode),
                depth_stencil: desc.depth.map(|depth| wgpu::DepthStencilState {
                    format: depth.format.into(),
                    depth_write_enabled: depth.write,
                    depth_compare: depth.compare.into(),
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });
        let id = self.next_id();
        self.pipelines.insert(id, pipeline);
        Ok(RenderPipelineHandle(id))
    }

    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor) {
        if self.pass.is_some() {
            log::warn!("render pass {:?} begun inside another pass", desc.label);
        }
        self.pass = Some(PendingPass {
            descriptor: desc.clone(),
            commands: Vec::new(),
        });
    }

    fn end_render_pass(&mut self) {
        let Some(PendingPass {
            descriptor,
            commands,
        }) = self.pass.take()
        else {
            return;
        };
        let Some(frame) = self.frame.as_mut() else {
            log::warn!("render pass {:?} ended outside a frame", descriptor.label);
            return;
        };

        let Some(view) = resolve_view(
            &frame.view,
            frame.view_id,
            &self.texture_views,
            descriptor.color.view,
        ) else {
            log::warn!("render pass {:?} targets a destroyed view", descriptor.label);
            return;
        };
        let color_attachments = [Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: convert::operations(descriptor.color.clear.map(convert::color)),
        })];

        let depth_stencil_attachment = descriptor.depth.as_ref().and_then(|depth| {
            Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.texture_views.get(depth.view.0)?,
                depth_ops: Some(convert::operations(depth.clear)),
                stencil_ops: None,
            })
        });

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: descriptor.label.as_deref(),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        // Commands naming destroyed objects are skipped
        for command in commands {
            match command {
                PassCommand::SetPipeline(handle) => {
                    if let Some(pipeline) = self.pipelines.get(handle.0) {
                        pass.set_pipeline(pipeline);
                    }
                }
                PassCommand::SetBindGroup(index, handle) => {
                    if let Some(bind_group) = self.bind_groups.get(handle.0) {
                        pass.set_bind_group(index, bind_group, &[]);
                    }
                }
                PassCommand::SetVertexBuffer(slot, handle) => {
                    if let Some(buffer) = self.buffers.get(handle.0) {
                        pass.set_vertex_buffer(slot, buffer.slice(..));
                    }
                }
                PassCommand::SetIndexBuffer(handle, format) => {
                    if let Some(buffer) = self.buffers.get(handle.0) {
                        pass.set_index_buffer(buffer.slice(..), format.into());
                    }
                }
                PassCommand::SetViewport(width, height) => {
                    pass.set_viewport(0.0, 0.0, width, height, 0.0, 1.0);
                }
                PassCommand::DrawIndexed(indices, base_vertex) => {
                    pass.draw_indexed(indices, base_vertex, 0..1);
                }
            }
        }
    }

    fn set_render_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        self.push_command(PassCommand::SetPipeline(pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupHandle) {
        self.push_command(PassCommand::SetBindGroup(index, bind_group));
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle) {
        self.push_command(PassCommand::SetVertexBuffer(slot, buffer));
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle, format: IndexFormat) {
        self.push_command(PassCommand::SetIndexBuffer(buffer, format));
    }

    fn set_viewport(&mut self, width: f32, height: f32) {
        self.push_command(PassCommand::SetViewport(width, height));
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32) {
        self.push_command(PassCommand::DrawIndexed(indices, base_vertex));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case((800, 600), 8192, (800, 600))]
    #[case((0, 0), 8192, (1, 1))]
    #[case((16384, 8192), 8192, (8192, 4096))]
    fn surface_fits_device_limit(
        #[case] requested: (u32, u32),
        #[case] max: u32,
        #[case] expected: (u32, u32),
    ) {
        assert_eq!(fit_to_limit(requested.0, requested.1, max), expected);
    }

    #[test]
    fn usage_flags_map_bit_by_bit() {
        let usages = convert::buffer_usages(BufferUsage::UNIFORM | BufferUsage::COPY_DST);
        assert_eq!(usages, wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST);

        let usages = convert::texture_usages(TextureUsage::TEXTURE_BINDING);
        assert_eq!(usages, wgpu::TextureUsages::TEXTURE_BINDING);
    }

    #[test]
    fn block_formats_need_bc_feature() {
        let format = wgpu::TextureFormat::from(TextureFormat::Bc1RgbaUnorm);
        assert!(format
            .required_features()
            .contains(wgpu::Features::TEXTURE_COMPRESSION_BC));
        assert!(wgpu::TextureFormat::from(TextureFormat::Rgba8Unorm)
            .required_features()
            .is_empty());
    }
}

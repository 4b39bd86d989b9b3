//! Fixed pipeline objects
//!
//! Everything the frame loop binds that does not depend on loaded models:
//! shader and render pipeline, bind group layouts, sampler, camera uniform,
//! depth target, the null texture and the untextured default material.
//! These are created once and live as long as the viewer.

use super::shader::MODEL_SHADER;
use crate::backend::*;
use crate::resources::{
    BindingLayouts, GpuTexture, Material, ResourceBuilder, TextureData, MATERIAL_SLOTS,
    MATERIAL_UNIFORM_BINDING,
};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

pub struct PipelineObjects {
    pub pipeline: RenderPipelineHandle,
    pub frame_layout: BindGroupLayoutHandle,
    pub object_layout: BindGroupLayoutHandle,
    pub material_layout: BindGroupLayoutHandle,
    pub sampler: SamplerHandle,
    pub camera_buffer: BufferHandle,
    pub frame_bind_group: BindGroupHandle,
    pub depth_texture: TextureHandle,
    pub depth_view: TextureViewHandle,
    pub null_texture: GpuTexture,
    /// Bound to meshes whose model has no materials
    pub default_material: Material,
}

impl PipelineObjects {
    /// # Panics
    ///
    /// Panics if any object cannot be created: the viewer cannot draw
    /// without them.
    pub fn new<B: GraphicsBackend>(backend: &mut B) -> Self {
        fn fatal<T>(what: &str) -> impl FnOnce(BackendError) -> T + '_ {
            move |e: BackendError| -> T { panic!("Failed to create {what}: {e}") }
        }

        let frame_layout = backend
            .create_bind_group_layout(&[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::Both,
                    ty: BindingType::UniformBuffer,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::Fragment,
                    ty: BindingType::Sampler,
                },
            ])
            .unwrap_or_else(fatal("frame bind group layout"));

        let object_layout = backend
            .create_bind_group_layout(&[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::Vertex,
                ty: BindingType::UniformBuffer,
            }])
            .unwrap_or_else(fatal("object bind group layout"));

        let mut material_entries: Vec<BindGroupLayoutEntry> = (0..MATERIAL_SLOTS as u32)
            .map(|binding| BindGroupLayoutEntry {
                binding,
                visibility: ShaderStages::Fragment,
                ty: BindingType::Texture,
            })
            .collect();
        material_entries.push(BindGroupLayoutEntry {
            binding: MATERIAL_UNIFORM_BINDING,
            visibility: ShaderStages::Fragment,
            ty: BindingType::UniformBuffer,
        });
        let material_layout = backend
            .create_bind_group_layout(&material_entries)
            .unwrap_or_else(fatal("material bind group layout"));

        let sampler = backend
            .create_sampler(&SamplerDescriptor {
                label: Some("Material Sampler".into()),
                address_mode: AddressMode::Repeat,
                ..Default::default()
            })
            .unwrap_or_else(fatal("sampler"));

        let camera_buffer = backend
            .create_buffer(&BufferDescriptor {
                label: Some("Camera Buffer".into()),
                size: std::mem::size_of::<CameraUniform>() as u64,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            })
            .unwrap_or_else(fatal("camera buffer"));

        let frame_bind_group = backend
            .create_bind_group(
                frame_layout,
                &[
                    (0, BindGroupEntry::Buffer(camera_buffer)),
                    (1, BindGroupEntry::Sampler(sampler)),
                ],
            )
            .unwrap_or_else(fatal("frame bind group"));

        let (width, height) = backend.surface_size();
        let (depth_texture, depth_view) =
            create_depth_target(backend, width, height).unwrap_or_else(fatal("depth buffer"));

        let pipeline = backend
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some("Model Pipeline".into()),
                shader: MODEL_SHADER.into(),
                vertex_layout: Vertex::layout(),
                bind_group_layouts: vec![frame_layout, object_layout, material_layout],
                cull_mode: CullMode::Back,
                depth: Some(DepthTest {
                    format: DEPTH_FORMAT,
                    write: true,
                    compare: CompareFunction::Less,
                }),
                color_format: backend.swapchain_format(),
            })
            .unwrap_or_else(fatal("model pipeline"));

        // Samples read as zero, like an unbound shader resource
        let null_texture = GpuTexture::create(backend, &TextureData::solid_color([0; 4], "Null"))
            .unwrap_or_else(fatal("null texture"));

        let layouts = BindingLayouts {
            object: object_layout,
            material: material_layout,
            null_texture: null_texture.view,
        };
        let default_material =
            ResourceBuilder::new(backend, layouts).create_material("Default", Default::default());

        log::info!("Pipeline objects created");

        Self {
            pipeline,
            frame_layout,
            object_layout,
            material_layout,
            sampler,
            camera_buffer,
            frame_bind_group,
            depth_texture,
            depth_view,
            null_texture,
            default_material,
        }
    }

    pub fn layouts(&self) -> BindingLayouts {
        BindingLayouts {
            object: self.object_layout,
            material: self.material_layout,
            null_texture: self.null_texture.view,
        }
    }

    /// Replace the depth target with one of the new surface size. The old
    /// target is kept if the new one cannot be created.
    pub fn resize_depth<B: GraphicsBackend>(&mut self, backend: &mut B, width: u32, height: u32) {
        match create_depth_target(backend, width, height) {
            Ok((texture, view)) => {
                backend.destroy_texture_view(self.depth_view);
                backend.destroy_texture(self.depth_texture);
                self.depth_texture = texture;
                self.depth_view = view;
            }
            Err(e) => log::error!("Failed to recreate depth buffer at {}x{}: {}", width, height, e),
        }
    }
}

fn create_depth_target<B: GraphicsBackend>(
    backend: &mut B,
    width: u32,
    height: u32,
) -> BackendResult<(TextureHandle, TextureViewHandle)> {
    let texture = backend.create_texture(&TextureDescriptor {
        label: Some("Depth Buffer".into()),
        width: width.max(1),
        height: height.max(1),
        format: DEPTH_FORMAT,
        usage: TextureUsage::RENDER_ATTACHMENT,
        ..Default::default()
    })?;
    match backend.create_texture_view(texture) {
        Ok(view) => Ok((texture, view)),
        Err(e) => {
            backend.destroy_texture(texture);
            Err(e)
        }
    }
}

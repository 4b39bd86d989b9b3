//! Backend-neutral descriptors to wgpu types

use crate::backend::traits::*;
use crate::backend::types::*;

impl From<TextureFormat> for wgpu::TextureFormat {
    fn from(format: TextureFormat) -> Self {
        match format {
            TextureFormat::Rgba8Unorm => Self::Rgba8Unorm,
            TextureFormat::Rgba8UnormSrgb => Self::Rgba8UnormSrgb,
            TextureFormat::Bgra8Unorm => Self::Bgra8Unorm,
            TextureFormat::Bgra8UnormSrgb => Self::Bgra8UnormSrgb,
            TextureFormat::Depth32Float => Self::Depth32Float,
            TextureFormat::Bc1RgbaUnorm => Self::Bc1RgbaUnorm,
            TextureFormat::Bc2RgbaUnorm => Self::Bc2RgbaUnorm,
            TextureFormat::Bc3RgbaUnorm => Self::Bc3RgbaUnorm,
            TextureFormat::Bc4RUnorm => Self::Bc4RUnorm,
            TextureFormat::Bc5RgUnorm => Self::Bc5RgUnorm,
            TextureFormat::Bc7RgbaUnorm => Self::Bc7RgbaUnorm,
        }
    }
}

/// Swapchain formats the surface may report; anything else is treated as
/// sRGB BGRA for pipeline creation.
pub(super) fn swapchain_format(format: wgpu::TextureFormat) -> TextureFormat {
    match format {
        wgpu::TextureFormat::Rgba8Unorm => TextureFormat::Rgba8Unorm,
        wgpu::TextureFormat::Rgba8UnormSrgb => TextureFormat::Rgba8UnormSrgb,
        wgpu::TextureFormat::Bgra8Unorm => TextureFormat::Bgra8Unorm,
        _ => TextureFormat::Bgra8UnormSrgb,
    }
}

pub(super) fn buffer_usages(usage: BufferUsage) -> wgpu::BufferUsages {
    [
        (BufferUsage::COPY_DST, wgpu::BufferUsages::COPY_DST),
        (BufferUsage::INDEX, wgpu::BufferUsages::INDEX),
        (BufferUsage::VERTEX, wgpu::BufferUsages::VERTEX),
        (BufferUsage::UNIFORM, wgpu::BufferUsages::UNIFORM),
    ]
    .into_iter()
    .filter(|(ours, _)| usage.contains(*ours))
    .fold(wgpu::BufferUsages::empty(), |acc, (_, theirs)| acc | theirs)
}

pub(super) fn texture_usages(usage: TextureUsage) -> wgpu::TextureUsages {
    [
        (TextureUsage::COPY_DST, wgpu::TextureUsages::COPY_DST),
        (TextureUsage::TEXTURE_BINDING, wgpu::TextureUsages::TEXTURE_BINDING),
        (TextureUsage::RENDER_ATTACHMENT, wgpu::TextureUsages::RENDER_ATTACHMENT),
    ]
    .into_iter()
    .filter(|(ours, _)| usage.contains(*ours))
    .fold(wgpu::TextureUsages::empty(), |acc, (_, theirs)| acc | theirs)
}

impl From<ShaderStages> for wgpu::ShaderStages {
    fn from(stages: ShaderStages) -> Self {
        match stages {
            ShaderStages::Vertex => Self::VERTEX,
            ShaderStages::Fragment => Self::FRAGMENT,
            ShaderStages::Both => Self::VERTEX_FRAGMENT,
        }
    }
}

impl From<BindingType> for wgpu::BindingType {
    fn from(ty: BindingType) -> Self {
        match ty {
            BindingType::UniformBuffer => Self::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            BindingType::Texture => Self::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            BindingType::Sampler => Self::Sampler(wgpu::SamplerBindingType::Filtering),
        }
    }
}

impl From<VertexFormat> for wgpu::VertexFormat {
    fn from(format: VertexFormat) -> Self {
        match format {
            VertexFormat::Float32x2 => Self::Float32x2,
            VertexFormat::Float32x3 => Self::Float32x3,
        }
    }
}

impl From<CompareFunction> for wgpu::CompareFunction {
    fn from(func: CompareFunction) -> Self {
        match func {
            CompareFunction::Less => Self::Less,
            CompareFunction::LessEqual => Self::LessEqual,
            CompareFunction::Always => Self::Always,
        }
    }
}

impl From<FilterMode> for wgpu::FilterMode {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Nearest => Self::Nearest,
            FilterMode::Linear => Self::Linear,
        }
    }
}

impl From<AddressMode> for wgpu::AddressMode {
    fn from(mode: AddressMode) -> Self {
        match mode {
            AddressMode::ClampToEdge => Self::ClampToEdge,
            AddressMode::Repeat => Self::Repeat,
            AddressMode::MirrorRepeat => Self::MirrorRepeat,
        }
    }
}

impl From<IndexFormat> for wgpu::IndexFormat {
    fn from(format: IndexFormat) -> Self {
        match format {
            IndexFormat::Uint16 => Self::Uint16,
            IndexFormat::Uint32 => Self::Uint32,
        }
    }
}

/// Clear to `clear` if set, otherwise keep; always store
pub(super) fn operations<T: Copy>(clear: Option<T>) -> wgpu::Operations<T> {
    wgpu::Operations {
        load: clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
        store: wgpu::StoreOp::Store,
    }
}

pub(super) fn color(rgba: [f32; 4]) -> wgpu::Color {
    let [r, g, b, a] = rgba.map(f64::from);
    wgpu::Color { r, g, b, a }
}

pub(super) fn primitive_state(cull_mode: CullMode) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: match cull_mode {
            CullMode::None => None,
            CullMode::Back => Some(wgpu::Face::Back),
        },
        ..Default::default()
    }
}

//! Plain data passed to and from a [`GraphicsBackend`](super::GraphicsBackend)

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Depth32Float,
    /// DXT1
    Bc1RgbaUnorm,
    /// DXT2, DXT3
    Bc2RgbaUnorm,
    /// DXT4, DXT5
    Bc3RgbaUnorm,
    /// ATI1
    Bc4RUnorm,
    /// ATI2
    Bc5RgUnorm,
    Bc7RgbaUnorm,
}

impl TextureFormat {
    /// Texel footprint of one block; (1, 1) for uncompressed formats.
    pub fn block_dimensions(&self) -> (u32, u32) {
        use TextureFormat::*;
        match self {
            Bc1RgbaUnorm | Bc2RgbaUnorm | Bc3RgbaUnorm | Bc4RUnorm | Bc5RgUnorm | Bc7RgbaUnorm => {
                (4, 4)
            }
            Rgba8Unorm | Rgba8UnormSrgb | Bgra8Unorm | Bgra8UnormSrgb | Depth32Float => (1, 1),
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.block_dimensions() != (1, 1)
    }

    /// Bytes per block, or per texel when uncompressed.
    pub fn block_size(&self) -> u32 {
        use TextureFormat::*;
        match self {
            Bc1RgbaUnorm | Bc4RUnorm => 8,
            Bc2RgbaUnorm | Bc3RgbaUnorm | Bc5RgUnorm | Bc7RgbaUnorm => 16,
            Rgba8Unorm | Rgba8UnormSrgb | Bgra8Unorm | Bgra8UnormSrgb | Depth32Float => 4,
        }
    }

    /// Bytes in one row of blocks of a surface `width` texels wide,
    /// saturating at `u32::MAX`.
    pub fn row_pitch(&self, width: u32) -> u32 {
        width
            .div_ceil(self.block_dimensions().0)
            .max(1)
            .saturating_mul(self.block_size())
    }

    pub fn block_rows(&self, height: u32) -> u32 {
        height.div_ceil(self.block_dimensions().1).max(1)
    }

    /// Bytes in one mip level of one layer.
    pub fn surface_size(&self, width: u32, height: u32) -> usize {
        self.row_pitch(width) as usize * self.block_rows(height) as usize
    }
}

macro_rules! usage_flags {
    ($name:ident { $($flag:ident = $bit:expr),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(u8);

        impl $name {
            $(pub const $flag: Self = Self(1 << $bit);)*

            pub fn contains(&self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }
    };
}

usage_flags!(BufferUsage {
    COPY_DST = 0,
    INDEX = 1,
    VERTEX = 2,
    UNIFORM = 3,
});

usage_flags!(TextureUsage {
    COPY_DST = 0,
    TEXTURE_BINDING = 1,
    RENDER_ATTACHMENT = 2,
});

#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    pub label: Option<String>,
    pub size: u64,
    pub usage: BufferUsage,
}

/// A 2D texture, optionally with array layers (texture arrays, cube faces).
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub array_layers: u32,
    pub mip_levels: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            width: 1,
            height: 1,
            array_layers: 1,
            mip_levels: 1,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        }
    }
}

/// Destination and source layout of one texture upload.
///
/// `width`/`height` are the texel extent of the written mip level;
/// `bytes_per_row` and `rows` describe the source data in blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDataLayout {
    pub mip_level: u32,
    pub array_layer: u32,
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: u32,
    pub rows: u32,
}

impl TextureDataLayout {
    /// Tightly packed upload of a whole `width`x`height` surface
    pub fn packed(format: TextureFormat, width: u32, height: u32) -> Self {
        Self {
            mip_level: 0,
            array_layer: 0,
            width,
            height,
            bytes_per_row: format.row_pitch(width),
            rows: format.block_rows(height),
        }
    }

    pub fn at(self, mip_level: u32, array_layer: u32) -> Self {
        Self {
            mip_level,
            array_layer,
            ..self
        }
    }

    pub fn byte_len(&self) -> usize {
        self.bytes_per_row as usize * self.rows as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
}

impl VertexFormat {
    pub fn size(&self) -> u64 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u64,
}

/// Per-vertex buffer layout
#[derive(Debug, Clone)]
pub struct VertexBufferLayout {
    pub array_stride: u64,
    pub attributes: Vec<VertexAttribute>,
}

/// Imported vertex: position, normal, first texture coordinate set.
///
/// The same byte layout is used by the import path, the uploaded vertex
/// buffer and the pipeline input layout returned by [`Vertex::layout`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    pub fn layout() -> VertexBufferLayout {
        let formats = [
            VertexFormat::Float32x3,
            VertexFormat::Float32x3,
            VertexFormat::Float32x2,
        ];
        let mut offset = 0;
        let attributes = formats
            .into_iter()
            .zip(0..)
            .map(|(format, location)| {
                let attribute = VertexAttribute {
                    location,
                    format,
                    offset,
                };
                offset += format.size();
                attribute
            })
            .collect();
        VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            attributes,
        }
    }
}

/// Bound at group 0, binding 0 of the model pipeline
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: Mat4,
    pub proj: Mat4,
    pub view_proj: Mat4,
    /// Eye position, w = 1
    pub eye: Vec4,
}

/// Per-model placement, bound at group 1
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: Mat4,
    pub normal_matrix: Mat4,
}

impl ObjectUniform {
    pub fn from_position(position: Vec3) -> Self {
        let model = Mat4::from_translation(position);
        Self {
            model,
            normal_matrix: model.inverse().transpose(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunction {
    Less,
    LessEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

/// Filtering applies to magnification, minification and mip selection alike;
/// `address_mode` to all three axes.
#[derive(Debug, Clone)]
pub struct SamplerDescriptor {
    pub label: Option<String>,
    pub filter: FilterMode,
    pub address_mode: AddressMode,
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            filter: FilterMode::Linear,
            address_mode: AddressMode::ClampToEdge,
        }
    }
}

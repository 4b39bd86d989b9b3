//! Error types for the GPU device, import and texture decoding.

use std::path::PathBuf;

use thiserror::Error;

/// GPU device failure.
///
/// Startup and mesh-upload callers treat every variant as fatal; texture
/// uploads treat them as a per-channel [`TextureError`].
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("no suitable GPU adapter: {0}")]
    InitializationFailed(String),
    #[error("surface creation failed: {0}")]
    SurfaceCreationFailed(String),
    #[error("device request failed: {0}")]
    DeviceCreationFailed(String),
    #[error("could not acquire swapchain image: {0}")]
    AcquireImageFailed(String),
    #[error("buffer creation failed: {0}")]
    BufferCreationFailed(String),
    #[error("texture creation failed: {0}")]
    TextureCreationFailed(String),
    #[error("texture upload failed: {0}")]
    TextureUploadFailed(String),
    #[error("pipeline object creation failed: {0}")]
    PipelineCreationFailed(String),
    #[error("surface lost")]
    SurfaceLost,
    #[error("out of GPU memory")]
    OutOfMemory,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Failure reported by a scene decoder.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported scene format '{0}'")]
    UnsupportedFormat(String),
    #[error("OBJ parse error: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("glTF parse error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("invalid scene data: {0}")]
    Invalid(String),
}

/// Recoverable, file-level import failure.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to load model asset.\n\nPath: {path}\nError: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("Failed to load model asset.\n\nPath: {path}\nError: scene contains no meshes")]
    NoMeshes { path: PathBuf },
    #[error("Failed to load model asset.\n\nPath: {path}\nError: {source}")]
    Mesh {
        path: PathBuf,
        #[source]
        source: MeshError,
    },
}

/// A decoded mesh that cannot be converted to the vertex layout.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("mesh '{mesh}' has no {attribute} channel")]
    MissingAttribute { mesh: String, attribute: &'static str },
    #[error("mesh '{mesh}' has a face with {count} indices after triangulation")]
    MalformedFace { mesh: String, count: usize },
    #[error("mesh '{mesh}' references vertex {index} but has {vertex_count} vertices")]
    IndexOutOfRange {
        mesh: String,
        index: u32,
        vertex_count: usize,
    },
    #[error("mesh '{mesh}' references material {index} but the scene has {material_count}")]
    InvalidMaterialIndex {
        mesh: String,
        index: usize,
        material_count: usize,
    },
}

/// Per-channel texture failure; the channel resolves to no texture.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("invalid DDS container: {0}")]
    Dds(#[from] DdsError),
    #[error("texture upload failed: {0}")]
    Upload(#[from] BackendError),
    #[error("uncompressed embedded texture '{reference}' is not supported")]
    UncompressedEmbedded { reference: String },
    #[error("embedded texture '{reference}' not found in scene")]
    MissingEmbedded { reference: String },
}

/// DDS container parse failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DdsError {
    #[error("missing 'DDS ' magic")]
    BadMagic,
    #[error("file truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("bad header size {0}")]
    BadHeader(u32),
    #[error("unsupported pixel format {0}")]
    UnsupportedFormat(String),
    #[error("volume textures are not supported")]
    VolumeTexture,
    #[error("zero-sized surface")]
    ZeroSize,
    #[error("{what} {value} exceeds the supported limit")]
    TooLarge { what: &'static str, value: u32 },
}

//! Texture decoding and upload
//!
//! A material channel reference resolves through one of three paths, in
//! order: an encoded image embedded in the scene, a raw embedded texel buffer
//! (not supported, resolves to no texture), or a file next to the model.
//! Files ending in `.dds` go through the DDS container loader first and fall
//! back to the general image decoder if that fails.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};

use super::dds::DdsTexture;
use crate::backend::*;
use crate::diagnostics::{DiagnosticsSink, Severity};
use crate::error::TextureError;
use crate::scene::{SceneGraph, SceneMaterial, TextureChannel};

/// Decoded pixel data, always tightly packed RGBA8
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
    pub name: String,
}

impl TextureData {
    /// Decode an encoded image held in memory
    pub fn from_bytes(bytes: &[u8], name: &str) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_image(img, name))
    }

    /// Decode an image file, guessing the codec from its contents
    pub fn from_file(path: &Path) -> Result<Self, TextureError> {
        let io = |source| TextureError::Io {
            path: path.to_path_buf(),
            source,
        };
        let img = image::io::Reader::open(path)
            .map_err(io)?
            .with_guessed_format()
            .map_err(io)?
            .decode()?;
        Ok(Self::from_image(img, &display_name(path)))
    }

    /// Convert any source pixel format to RGBA8. Sample values pass through
    /// without gamma conversion.
    pub fn from_image(img: DynamicImage, name: &str) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            format: TextureFormat::Rgba8Unorm,
            data: img.to_rgba8().into_raw(),
            name: name.to_string(),
        }
    }

    pub fn solid_color(color: [u8; 4], name: &str) -> Self {
        Self {
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8Unorm,
            data: color.to_vec(),
            name: name.to_string(),
        }
    }

    /// Row stride in bytes
    pub fn stride(&self) -> u32 {
        self.width * 4
    }
}

/// GPU texture with the view bound to materials
#[derive(Debug)]
pub struct GpuTexture {
    pub handle: TextureHandle,
    pub view: TextureViewHandle,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub format: TextureFormat,
    pub name: String,
}

impl GpuTexture {
    /// Upload a single-mip 2D texture
    pub fn create<B: GraphicsBackend>(backend: &mut B, data: &TextureData) -> BackendResult<Self> {
        let handle = backend.create_texture(&TextureDescriptor {
            label: Some(data.name.clone()),
            width: data.width,
            height: data.height,
            format: data.format,
            ..Default::default()
        })?;

        let layout = TextureDataLayout::packed(data.format, data.width, data.height);
        let view = upload_or_destroy(backend, handle, |backend| {
            backend.write_texture(handle, &data.data, layout)
        })?;

        Ok(Self {
            handle,
            view,
            width: data.width,
            height: data.height,
            mip_levels: 1,
            format: data.format,
            name: data.name.clone(),
        })
    }

    /// Upload every mip level and array layer of a DDS container
    pub fn from_dds<B: GraphicsBackend>(
        backend: &mut B,
        dds: &DdsTexture<'_>,
        name: &str,
    ) -> BackendResult<Self> {
        let handle = backend.create_texture(&TextureDescriptor {
            label: Some(name.to_string()),
            width: dds.width,
            height: dds.height,
            array_layers: dds.array_layers,
            mip_levels: dds.mip_levels,
            format: dds.format,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        })?;

        let view = upload_or_destroy(backend, handle, |backend| {
            for surface in &dds.surfaces {
                let layout = TextureDataLayout::packed(dds.format, surface.width, surface.height)
                    .at(surface.mip_level, surface.array_layer);
                backend.write_texture(handle, surface.data, layout)?;
            }
            Ok(())
        })?;

        Ok(Self {
            handle,
            view,
            width: dds.width,
            height: dds.height,
            mip_levels: dds.mip_levels,
            format: dds.format,
            name: name.to_string(),
        })
    }

    pub fn release<B: GraphicsBackend>(self, backend: &mut B) {
        backend.destroy_texture_view(self.view);
        backend.destroy_texture(self.handle);
    }
}

/// Run the uploads and create the view; the texture is destroyed on failure.
fn upload_or_destroy<B: GraphicsBackend>(
    backend: &mut B,
    handle: TextureHandle,
    upload: impl FnOnce(&mut B) -> BackendResult<()>,
) -> BackendResult<TextureViewHandle> {
    let view = upload(backend).and_then(|()| backend.create_texture_view(handle));
    if view.is_err() {
        backend.destroy_texture(handle);
    }
    view
}

/// Where texture references of one scene are looked up
#[derive(Clone, Copy)]
pub struct TextureSource<'a> {
    /// Directory of the model file; relative references resolve against it
    pub base_dir: &'a Path,
    pub scene: &'a SceneGraph,
}

/// Resolve the first texture of `channel` in `material`.
///
/// Every failure is logged once and yields `None`; a channel with no
/// reference yields `None` silently.
pub fn resolve_texture<B: GraphicsBackend>(
    backend: &mut B,
    material: &SceneMaterial,
    channel: TextureChannel,
    source: TextureSource<'_>,
    diagnostics: &dyn DiagnosticsSink,
) -> Option<GpuTexture> {
    let reference = material.texture(channel, 0)?;

    match load_texture(backend, reference, source, diagnostics) {
        Ok(texture) => Some(texture),
        Err(e) => {
            diagnostics.record(
                Severity::Warning,
                &format!(
                    "Failed to load {} texture '{}' of material '{}': {}",
                    channel.name(),
                    reference,
                    material.name,
                    e
                ),
            );
            None
        }
    }
}

fn load_texture<B: GraphicsBackend>(
    backend: &mut B,
    reference: &str,
    source: TextureSource<'_>,
    diagnostics: &dyn DiagnosticsSink,
) -> Result<GpuTexture, TextureError> {
    if let Some(embedded) = source.scene.embedded_texture(reference) {
        if !embedded.is_compressed() {
            return Err(TextureError::UncompressedEmbedded {
                reference: reference.to_string(),
            });
        }
        let data = TextureData::from_bytes(&embedded.data, reference)?;
        return Ok(GpuTexture::create(backend, &data)?);
    }
    if reference.starts_with('*') {
        return Err(TextureError::MissingEmbedded {
            reference: reference.to_string(),
        });
    }

    let path = external_path(source.base_dir, reference);

    if is_dds(&path) {
        match load_dds(backend, &path) {
            Ok(texture) => return Ok(texture),
            Err(e) => diagnostics.record(
                Severity::Warning,
                &format!("Failed to load DDS texture: {} | {}", path.display(), e),
            ),
        }
    }

    let data = TextureData::from_file(&path)?;
    Ok(GpuTexture::create(backend, &data)?)
}

fn load_dds<B: GraphicsBackend>(backend: &mut B, path: &Path) -> Result<GpuTexture, TextureError> {
    let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dds = DdsTexture::parse(&bytes)?;
    Ok(GpuTexture::from_dds(backend, &dds, &display_name(path))?)
}

/// Join a material reference onto the model directory, normalizing
/// backslash separators.
pub fn external_path(base_dir: &Path, reference: &str) -> PathBuf {
    base_dir.join(reference.replace('\\', "/"))
}

fn is_dds(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("dds"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("texture")
        .to_string()
}

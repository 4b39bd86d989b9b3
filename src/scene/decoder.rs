//! Scene decoding entry point.

use std::path::Path;

use super::{gltf_file, obj_file, postprocess, stl_file, SceneGraph};
use crate::error::DecodeError;

/// Post-processing steps applied after a file is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostProcess(u32);

impl PostProcess {
    pub const NONE: Self = Self(0);
    /// Split polygons into triangles, drop point and line faces
    pub const TRIANGULATE: Self = Self(1 << 0);
    /// Generate per-vertex tangents and bitangents from normals and UV0
    pub const CALC_TANGENT_SPACE: Self = Self(1 << 1);
    /// Merge vertices whose every channel is bitwise identical
    pub const JOIN_IDENTICAL_VERTICES: Self = Self(1 << 2);

    /// The fixed set the importer requests
    pub const IMPORT: Self = Self(
        Self::TRIANGULATE.0 | Self::CALC_TANGENT_SPACE.0 | Self::JOIN_IDENTICAL_VERTICES.0,
    );

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for PostProcess {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Parses a model file into a [`SceneGraph`].
pub trait SceneDecoder {
    fn decode(&self, path: &Path, flags: PostProcess) -> Result<SceneGraph, DecodeError>;
}

/// Decoder dispatching on file extension: OBJ (+MTL), glTF/GLB and STL.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSceneDecoder;

impl FileSceneDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Lowercase extensions this decoder accepts
    pub const EXTENSIONS: [&'static str; 4] = ["obj", "gltf", "glb", "stl"];

    pub fn supports(path: &Path) -> bool {
        extension(path).is_some_and(|ext| Self::EXTENSIONS.contains(&ext.as_str()))
    }
}

impl SceneDecoder for FileSceneDecoder {
    fn decode(&self, path: &Path, flags: PostProcess) -> Result<SceneGraph, DecodeError> {
        let ext = extension(path).unwrap_or_default();
        let mut scene = match ext.as_str() {
            "obj" => obj_file::load(path)?,
            "gltf" | "glb" => gltf_file::load(path)?,
            "stl" => stl_file::load(path)?,
            _ => return Err(DecodeError::UnsupportedFormat(ext)),
        };

        log::debug!(
            "Decoded {}: {} meshes, {} materials, {} embedded textures",
            path.display(),
            scene.meshes.len(),
            scene.materials.len(),
            scene.textures.len()
        );

        postprocess::apply(&mut scene, flags);
        Ok(scene)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

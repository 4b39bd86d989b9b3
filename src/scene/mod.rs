//! Decoded scene graph
//!
//! The in-memory form every [`SceneDecoder`] produces: materials with texture
//! references per channel, meshes with per-vertex channels and polygon faces,
//! and the table of textures embedded in the source file.

mod decoder;
mod gltf_file;
mod obj_file;
pub mod postprocess;
mod stl_file;

pub use decoder::{FileSceneDecoder, PostProcess, SceneDecoder};

use std::collections::HashMap;
use std::path::Path;

use glam::{Vec2, Vec3};

/// Material texture slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureChannel {
    Diffuse,
    Specular,
    Normal,
    /// Roughness or ambient map, depending on the source format
    Roughness,
}

impl TextureChannel {
    /// All channels in binding order
    pub const ALL: [TextureChannel; 4] = [
        TextureChannel::Diffuse,
        TextureChannel::Specular,
        TextureChannel::Normal,
        TextureChannel::Roughness,
    ];

    /// Binding slot of this channel within a material
    pub fn slot(&self) -> usize {
        match self {
            TextureChannel::Diffuse => 0,
            TextureChannel::Specular => 1,
            TextureChannel::Normal => 2,
            TextureChannel::Roughness => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextureChannel::Diffuse => "diffuse",
            TextureChannel::Specular => "specular",
            TextureChannel::Normal => "normal",
            TextureChannel::Roughness => "roughness",
        }
    }
}

/// A decoded material: texture references grouped by channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneMaterial {
    pub name: String,
    textures: HashMap<TextureChannel, Vec<String>>,
}

impl SceneMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            textures: HashMap::new(),
        }
    }

    pub fn with_texture(mut self, channel: TextureChannel, reference: impl Into<String>) -> Self {
        self.add_texture(channel, reference);
        self
    }

    pub fn add_texture(&mut self, channel: TextureChannel, reference: impl Into<String>) {
        self.textures
            .entry(channel)
            .or_default()
            .push(reference.into());
    }

    /// Number of textures referenced for `channel`
    pub fn texture_count(&self, channel: TextureChannel) -> usize {
        self.textures.get(&channel).map_or(0, Vec::len)
    }

    /// Reference string of the `index`-th texture of `channel`
    pub fn texture(&self, channel: TextureChannel, index: usize) -> Option<&str> {
        self.textures
            .get(&channel)
            .and_then(|refs| refs.get(index))
            .map(String::as_str)
    }
}

/// One polygon of a mesh, as indices into the mesh's vertex arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    pub indices: Vec<u32>,
}

impl Face {
    pub fn new(indices: impl Into<Vec<u32>>) -> Self {
        Self {
            indices: indices.into(),
        }
    }

    pub fn triangle(a: u32, b: u32, c: u32) -> Self {
        Self {
            indices: vec![a, b, c],
        }
    }
}

/// A decoded mesh. Every per-vertex channel present has `positions.len()`
/// entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    /// Texture coordinate sets; index 0 is the first UV channel
    pub tex_coords: Vec<Vec<Vec2>>,
    pub tangents: Option<Vec<Vec3>>,
    pub bitangents: Option<Vec<Vec3>>,
    pub faces: Vec<Face>,
    pub material_index: usize,
}

impl SceneMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn has_tex_coords(&self, channel: usize) -> bool {
        self.tex_coords.get(channel).is_some()
    }
}

/// Texture stored inside the scene file.
///
/// A `height` of zero marks `data` as a still-encoded image container
/// (PNG, JPEG, ...), with `width` holding its byte length. Any other height
/// means `data` is a raw `width * height` texel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedTexture {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// File extension or mime subtype of the encoded data, if known
    pub format_hint: String,
    /// Original file name, if the source recorded one
    pub filename: Option<String>,
}

impl EmbeddedTexture {
    /// Embedded encoded container
    pub fn compressed(data: Vec<u8>, format_hint: impl Into<String>) -> Self {
        Self {
            width: data.len() as u32,
            height: 0,
            data,
            format_hint: format_hint.into(),
            filename: None,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.height == 0
    }
}

/// Everything a scene decoder produced for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGraph {
    pub materials: Vec<SceneMaterial>,
    pub meshes: Vec<SceneMesh>,
    pub textures: Vec<EmbeddedTexture>,
}

impl SceneGraph {
    pub fn has_meshes(&self) -> bool {
        !self.meshes.is_empty()
    }

    /// Look up an embedded texture by reference: `*N` addresses the N-th
    /// embedded texture, anything else is matched against recorded file names.
    pub fn embedded_texture(&self, reference: &str) -> Option<&EmbeddedTexture> {
        if let Some(index) = reference.strip_prefix('*') {
            return index
                .parse::<usize>()
                .ok()
                .and_then(|i| self.textures.get(i));
        }

        let wanted = file_name(reference);
        self.textures.iter().find(|t| {
            t.filename
                .as_deref()
                .is_some_and(|name| file_name(name) == wanted)
        })
    }
}

fn file_name(reference: &str) -> &str {
    let normalized = reference.rsplit(['/', '\\']).next().unwrap_or(reference);
    Path::new(normalized)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_channels_are_independent() {
        let material = SceneMaterial::new("m")
            .with_texture(TextureChannel::Diffuse, "a.png")
            .with_texture(TextureChannel::Diffuse, "b.png")
            .with_texture(TextureChannel::Normal, "n.png");

        assert_eq!(material.texture_count(TextureChannel::Diffuse), 2);
        assert_eq!(material.texture(TextureChannel::Diffuse, 1), Some("b.png"));
        assert_eq!(material.texture_count(TextureChannel::Specular), 0);
        assert_eq!(material.texture(TextureChannel::Specular, 0), None);
    }

    #[test]
    fn embedded_lookup_by_index_and_name() {
        let mut named = EmbeddedTexture::compressed(vec![1, 2, 3], "png");
        named.filename = Some("textures/wood.png".into());
        let scene = SceneGraph {
            textures: vec![EmbeddedTexture::compressed(vec![0], "jpg"), named],
            ..Default::default()
        };

        assert_eq!(scene.embedded_texture("*0").map(|t| t.data.len()), Some(1));
        assert_eq!(scene.embedded_texture("*1").map(|t| t.data.len()), Some(3));
        assert!(scene.embedded_texture("*7").is_none());
        assert!(scene.embedded_texture("*x").is_none());
        assert_eq!(
            scene.embedded_texture("C:\\art\\wood.png").map(|t| t.data.len()),
            Some(3)
        );
        assert!(scene.embedded_texture("stone.png").is_none());
    }

    #[test]
    fn channel_slots_are_distinct() {
        let slots: Vec<usize> = TextureChannel::ALL.iter().map(|c| c.slot()).collect();
        assert_eq!(slots, vec![0, 1, 2, 3]);
    }
}

//! Shared fixtures for the integration tests: model and texture files
//! written into a temporary directory, and a headless viewer to load them.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use model_viewer::backend::FrameContext;
use model_viewer::command::{Command, CommandQueue};
use model_viewer::scene::{PostProcess, SceneDecoder, SceneGraph};
use model_viewer::ui::{EditorMetadata, EditorUi, UiState};
use model_viewer::{DecodeError, HeadlessBackend, LogBuffer, Viewer, ViewerConfig};
use tempfile::TempDir;

/// A quad with normals and UVs using material `textured`
pub const QUAD_OBJ: &str = "\
mtllib quad.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
usemtl textured
f 1/1/1 2/2/1 3/3/1 4/4/1
";

/// All four channels set
pub const TEXTURED_MTL: &str = "\
newmtl textured
Kd 1 1 1
map_Kd diffuse.png
map_Ks specular.png
map_Bump normal.png
map_Ka rough.png
";

/// No texture channels at all
pub const PLAIN_MTL: &str = "\
newmtl textured
Kd 0.8 0.8 0.8
";

pub const TEXTURE_FILES: [&str; 4] = ["diffuse.png", "specular.png", "normal.png", "rough.png"];

pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn write_png(&self, name: &str, width: u32, height: u32) -> PathBuf {
        self.write(name, png_bytes(width, height))
    }

    /// `quad.obj` with its material library and every referenced texture
    pub fn textured_quad(&self) -> PathBuf {
        self.write("quad.mtl", TEXTURED_MTL);
        for name in TEXTURE_FILES {
            self.write_png(name, 4, 4);
        }
        self.write("quad.obj", QUAD_OBJ)
    }

    /// `quad.obj` whose material has no textures
    pub fn plain_quad(&self) -> PathBuf {
        self.write("quad.mtl", PLAIN_MTL);
        self.write("quad.obj", QUAD_OBJ)
    }

    /// `quad.obj` whose diffuse channel references `texture`
    pub fn quad_with_diffuse(&self, texture: &str) -> PathBuf {
        self.write(
            "quad.mtl",
            format!("newmtl textured\nKd 1 1 1\nmap_Kd {texture}\n"),
        );
        self.write("quad.obj", QUAD_OBJ)
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

/// A BC1 DDS file with `mips` levels of zeroed blocks
pub fn bc1_dds(width: u32, height: u32, mips: u32) -> Vec<u8> {
    let mut file = vec![0u8; 128];
    file[..4].copy_from_slice(b"DDS ");
    let mut put = |at: usize, v: u32| file[4 + at..8 + at].copy_from_slice(&v.to_le_bytes());
    put(0, 124);
    put(4, 0x1007 | if mips > 1 { 0x20000 } else { 0 });
    put(8, height);
    put(12, width);
    put(24, mips);
    put(72, 32);
    put(76, 0x4);
    put(80, u32::from_le_bytes(*b"DXT1"));
    put(104, 0x1000);

    for mip in 0..mips.max(1) {
        let w = (width >> mip).max(1);
        let h = (height >> mip).max(1);
        let blocks = w.div_ceil(4) as usize * h.div_ceil(4) as usize;
        file.resize(file.len() + blocks * 8, 0);
    }
    file
}

/// Minimal glTF with one triangle and an embedded PNG as base color
pub fn embedded_gltf() -> String {
    use base64::Engine as _;

    let mut buffer = Vec::new();
    for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        for c in v {
            buffer.extend_from_slice(&c.to_le_bytes());
        }
    }
    for _ in 0..3 {
        for c in [0.0f32, 0.0, 1.0] {
            buffer.extend_from_slice(&c.to_le_bytes());
        }
    }
    for uv in [[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]] {
        for c in uv {
            buffer.extend_from_slice(&c.to_le_bytes());
        }
    }
    let engine = base64::engine::general_purpose::STANDARD;
    let buffer_uri = format!(
        "data:application/octet-stream;base64,{}",
        engine.encode(&buffer)
    );
    let image_uri = format!("data:image/png;base64,{}", engine.encode(png_bytes(2, 2)));

    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "mesh": 0 }}],
  "meshes": [{{ "name": "tri", "primitives": [{{
    "attributes": {{ "POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2 }},
    "material": 0
  }}] }}],
  "materials": [{{ "name": "embedded", "pbrMetallicRoughness": {{ "baseColorTexture": {{ "index": 0 }} }} }}],
  "textures": [{{ "source": 0 }}],
  "images": [{{ "uri": "{image_uri}" }}],
  "buffers": [{{ "byteLength": {len}, "uri": "{buffer_uri}" }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 72, "byteLength": 24 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
       "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" }},
    {{ "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2" }}
  ]
}}"#,
        len = buffer.len()
    )
}

pub fn headless_viewer() -> Viewer<HeadlessBackend> {
    Viewer::new(
        HeadlessBackend::new(640, 480),
        ViewerConfig::default(),
        Arc::new(LogBuffer::new()),
    )
}

/// UI that issues a fixed list of commands on its next update and records
/// the metadata it was shown.
#[derive(Default)]
pub struct ScriptedUi {
    pub pending: Vec<Command>,
    pub seen: Vec<EditorMetadata>,
    pub renders: usize,
}

impl ScriptedUi {
    pub fn loading<P: AsRef<Path>>(paths: &[P]) -> Self {
        Self {
            pending: paths
                .iter()
                .map(|p| Command::LoadModel {
                    path: p.as_ref().to_path_buf(),
                })
                .collect(),
            ..Default::default()
        }
    }
}

impl EditorUi<HeadlessBackend> for ScriptedUi {
    fn update(&mut self, state: UiState<'_>, commands: &mut CommandQueue) {
        self.seen.push(state.metadata.clone());
        for command in self.pending.drain(..) {
            commands.push(command);
        }
    }

    fn render(&mut self, _backend: &mut HeadlessBackend, _frame: &FrameContext) {
        self.renders += 1;
    }
}

/// Decoder returning a prepared scene for every path
pub struct StaticDecoder(pub SceneGraph);

impl SceneDecoder for StaticDecoder {
    fn decode(&self, _path: &Path, _flags: PostProcess) -> Result<SceneGraph, DecodeError> {
        Ok(self.0.clone())
    }
}

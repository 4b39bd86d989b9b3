//! glTF 2.0 reader (`.gltf` and `.glb`).
//!
//! Each primitive becomes one mesh. Images stored in buffer views or data
//! URIs become embedded textures addressed as `*N`; images with a file URI
//! stay external references resolved against the model directory.

use std::path::Path;

use base64::Engine as _;
use glam::{Vec2, Vec3};

use super::{EmbeddedTexture, Face, SceneGraph, SceneMaterial, SceneMesh, TextureChannel};
use crate::error::DecodeError;

pub(super) fn load(path: &Path) -> Result<SceneGraph, DecodeError> {
    let bytes = std::fs::read(path)?;
    let ::gltf::Gltf { document, blob } = ::gltf::Gltf::from_slice(&bytes)?;
    let buffers = ::gltf::import_buffers(&document, path.parent(), blob)?;

    let (textures, image_refs) = load_images(&document, &buffers)?;

    let mut materials: Vec<SceneMaterial> = document
        .materials()
        .map(|m| convert_material(&m, &image_refs))
        .collect();

    // Primitives without a material use the glTF default material
    let mut default_material = None;
    let mut meshes = Vec::new();
    for mesh in document.meshes() {
        let primitive_count = mesh.primitives().count();
        for (prim_idx, primitive) in mesh.primitives().enumerate() {
            let name = match mesh.name() {
                Some(name) if primitive_count > 1 => format!("{name}_prim{prim_idx}"),
                Some(name) => name.to_string(),
                None => format!("mesh{}_prim{prim_idx}", mesh.index()),
            };

            let Some(faces) = primitive_faces(&primitive, &buffers)? else {
                log::debug!("{}: skipping non-triangle primitive '{}'", path.display(), name);
                continue;
            };

            let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| &d.0[..]));
            let positions: Vec<Vec3> = reader
                .read_positions()
                .ok_or_else(|| DecodeError::Invalid(format!("primitive '{name}' has no positions")))?
                .map(Vec3::from)
                .collect();
            let normals = reader
                .read_normals()
                .map(|it| it.map(Vec3::from).collect::<Vec<_>>());
            let tex_coords: Vec<Vec<Vec2>> = (0..)
                .map_while(|set| reader.read_tex_coords(set))
                .map(|tc| tc.into_f32().map(Vec2::from).collect())
                .collect();

            // Every attribute accessor of a primitive must have the same count
            let mismatched = normals
                .iter()
                .map(Vec::len)
                .chain(tex_coords.iter().map(Vec::len))
                .find(|&len| len != positions.len());
            if let Some(len) = mismatched {
                return Err(DecodeError::Invalid(format!(
                    "primitive '{name}' has {len} attribute values for {} positions",
                    positions.len()
                )));
            }

            let material_index = match primitive.material().index() {
                Some(index) => index,
                None => *default_material.get_or_insert_with(|| {
                    materials.push(SceneMaterial::new("default"));
                    materials.len() - 1
                }),
            };

            meshes.push(SceneMesh {
                name,
                positions,
                normals,
                tex_coords,
                tangents: None,
                bitangents: None,
                faces,
                material_index,
            });
        }
    }

    Ok(SceneGraph {
        materials,
        meshes,
        textures,
    })
}

/// Collect embedded images and the reference string for every image index.
fn load_images(
    document: &::gltf::Document,
    buffers: &[::gltf::buffer::Data],
) -> Result<(Vec<EmbeddedTexture>, Vec<String>), DecodeError> {
    let mut embedded = Vec::new();
    let mut refs = Vec::new();

    for image in document.images() {
        let (data, hint) = match image.source() {
            ::gltf::image::Source::View { view, mime_type } => {
                let buffer = buffers.get(view.buffer().index()).ok_or_else(|| {
                    DecodeError::Invalid(format!("image {} buffer out of range", image.index()))
                })?;
                let bytes = buffer
                    .get(view.offset()..view.offset() + view.length())
                    .ok_or_else(|| {
                        DecodeError::Invalid(format!("image {} view out of range", image.index()))
                    })?;
                (bytes.to_vec(), mime_subtype(mime_type))
            }
            ::gltf::image::Source::Uri { uri, mime_type } => match parse_data_uri(uri) {
                Some((bytes, mime)) => (bytes, mime_subtype(mime_type.unwrap_or(mime.as_str()))),
                None => {
                    refs.push(uri.to_string());
                    continue;
                }
            },
        };

        let mut texture = EmbeddedTexture::compressed(data, hint);
        texture.filename = image.name().map(String::from);
        refs.push(format!("*{}", embedded.len()));
        embedded.push(texture);
    }

    Ok((embedded, refs))
}

fn convert_material(material: &::gltf::Material, image_refs: &[String]) -> SceneMaterial {
    let mut out = SceneMaterial::new(material.name().unwrap_or("material"));
    let reference = |texture: ::gltf::Texture| image_refs.get(texture.source().index()).cloned();

    let pbr = material.pbr_metallic_roughness();
    if let Some(r) = pbr.base_color_texture().and_then(|t| reference(t.texture())) {
        out.add_texture(TextureChannel::Diffuse, r);
    }
    if let Some(r) = material.normal_texture().and_then(|t| reference(t.texture())) {
        out.add_texture(TextureChannel::Normal, r);
    }
    let roughness = pbr
        .metallic_roughness_texture()
        .and_then(|t| reference(t.texture()))
        .or_else(|| material.occlusion_texture().and_then(|t| reference(t.texture())));
    if let Some(r) = roughness {
        out.add_texture(TextureChannel::Roughness, r);
    }
    out
}

/// Faces of a primitive, or `None` for point and line topologies.
fn primitive_faces(
    primitive: &::gltf::Primitive,
    buffers: &[::gltf::buffer::Data],
) -> Result<Option<Vec<Face>>, DecodeError> {
    use ::gltf::mesh::Mode;

    let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| &d.0[..]));
    let vertex_count = primitive
        .get(&::gltf::Semantic::Positions)
        .map_or(0, |a| a.count() as u32);
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertex_count).collect(),
    };

    let faces = match primitive.mode() {
        Mode::Triangles => indices
            .chunks_exact(3)
            .map(|t| Face::triangle(t[0], t[1], t[2]))
            .collect(),
        Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                if i % 2 == 0 {
                    Face::triangle(w[0], w[1], w[2])
                } else {
                    Face::triangle(w[1], w[0], w[2])
                }
            })
            .collect(),
        Mode::TriangleFan => match indices.split_first() {
            Some((&center, rest)) => rest
                .windows(2)
                .map(|w| Face::triangle(center, w[0], w[1]))
                .collect(),
            None => Vec::new(),
        },
        Mode::Points | Mode::Lines | Mode::LineLoop | Mode::LineStrip => return Ok(None),
    };
    Ok(Some(faces))
}

/// Decode `data:<mime>;base64,<payload>`.
fn parse_data_uri(uri: &str) -> Option<(Vec<u8>, String)> {
    let rest = uri.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()?;
    Some((bytes, mime.to_string()))
}

fn mime_subtype(mime: &str) -> String {
    mime.rsplit('/').next().unwrap_or(mime).to_ascii_lowercase()
}

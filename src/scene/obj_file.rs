//! Wavefront OBJ reader (via `tobj`), including the MTL material library.

use std::path::Path;

use glam::{Vec2, Vec3};

use super::{Face, SceneGraph, SceneMaterial, SceneMesh, TextureChannel};
use crate::error::DecodeError;

pub(super) fn load(path: &Path) -> Result<SceneGraph, DecodeError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: false,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        },
    )?;

    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            log::warn!("{}: material library not loaded: {}", path.display(), e);
            Vec::new()
        }
    };

    let materials: Vec<SceneMaterial> = materials.iter().map(convert_material).collect();
    let material_count = materials.len();

    let meshes = models
        .into_iter()
        .map(|model| convert_mesh(model, material_count))
        .collect();

    Ok(SceneGraph {
        materials,
        meshes,
        textures: Vec::new(),
    })
}

fn convert_material(material: &tobj::Material) -> SceneMaterial {
    let mut out = SceneMaterial::new(material.name.clone());
    // Spellings tobj does not map end up in the unknown parameters
    let normal = material.normal_texture.as_deref().or_else(|| {
        ["map_Bump", "map_bump", "bump", "norm"]
            .iter()
            .find_map(|key| material.unknown_param.get(*key).map(String::as_str))
    });
    let channels = [
        (TextureChannel::Diffuse, material.diffuse_texture.as_deref()),
        (TextureChannel::Specular, material.specular_texture.as_deref()),
        (TextureChannel::Normal, normal),
        (TextureChannel::Roughness, material.ambient_texture.as_deref()),
    ];
    for (channel, texture) in channels {
        if let Some(reference) = texture.map(str::trim).filter(|t| !t.is_empty()) {
            out.add_texture(channel, reference);
        }
    }
    out
}

fn convert_mesh(model: tobj::Model, material_count: usize) -> SceneMesh {
    let mesh = model.mesh;
    let vertex_count = mesh.positions.len() / 3;

    let positions: Vec<Vec3> = mesh
        .positions
        .chunks_exact(3)
        .map(|v| Vec3::new(v[0], v[1], v[2]))
        .collect();

    let normals = (mesh.normals.len() == vertex_count * 3 && vertex_count > 0).then(|| {
        mesh.normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
            .collect()
    });

    let tex_coords = if mesh.texcoords.len() == vertex_count * 2 && vertex_count > 0 {
        vec![mesh
            .texcoords
            .chunks_exact(2)
            .map(|t| Vec2::new(t[0], t[1]))
            .collect()]
    } else {
        Vec::new()
    };

    // Without face arities every face is a triangle
    let faces = if mesh.face_arities.is_empty() {
        mesh.indices
            .chunks_exact(3)
            .map(|f| Face::triangle(f[0], f[1], f[2]))
            .collect()
    } else {
        let mut faces = Vec::with_capacity(mesh.face_arities.len());
        let mut start = 0usize;
        for &arity in &mesh.face_arities {
            let end = (start + arity as usize).min(mesh.indices.len());
            faces.push(Face::new(&mesh.indices[start..end]));
            start = end;
        }
        faces
    };

    let material_index = match mesh.material_id {
        Some(id) if material_count > 0 => id,
        _ => 0,
    };

    SceneMesh {
        name: model.name,
        positions,
        normals,
        tex_coords,
        tangents: None,
        bitangents: None,
        faces,
        material_index,
    }
}

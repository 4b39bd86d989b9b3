//! Mesh post-processing run after decoding.
//!
//! Steps run in a fixed order: triangulation, tangent generation, then
//! vertex joining, so that joined vertices also agree on their tangents.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use super::{Face, PostProcess, SceneGraph, SceneMesh};

/// Apply every step selected in `flags` to all meshes of `scene`.
pub fn apply(scene: &mut SceneGraph, flags: PostProcess) {
    for mesh in &mut scene.meshes {
        if flags.contains(PostProcess::TRIANGULATE) {
            triangulate(mesh);
        }
        if flags.contains(PostProcess::CALC_TANGENT_SPACE) {
            calc_tangent_space(mesh);
        }
        if flags.contains(PostProcess::JOIN_IDENTICAL_VERTICES) {
            join_identical_vertices(mesh);
        }
    }
}

/// Fan-split polygons into triangles and drop point and line faces.
pub fn triangulate(mesh: &mut SceneMesh) {
    let mut faces = Vec::with_capacity(mesh.faces.len());
    for face in mesh.faces.drain(..) {
        match face.indices.len() {
            0..=2 => {}
            3 => faces.push(face),
            _ => {
                let first = face.indices[0];
                faces.extend(
                    face.indices[1..]
                        .windows(2)
                        .map(|w| Face::triangle(first, w[0], w[1])),
                );
            }
        }
    }
    mesh.faces = faces;
}

/// Per-vertex tangents and bitangents from positions, normals and UV set 0.
///
/// Meshes without normals or UVs are left untouched.
pub fn calc_tangent_space(mesh: &mut SceneMesh) {
    let (Some(normals), Some(uvs)) = (mesh.normals.as_ref(), mesh.tex_coords.first()) else {
        return;
    };
    let count = mesh.positions.len();
    if normals.len() != count || uvs.len() != count {
        return;
    }

    let mut tan = vec![Vec3::ZERO; count];
    let mut bitan = vec![Vec3::ZERO; count];

    for face in mesh.faces.iter().filter(|f| f.indices.len() == 3) {
        let [i0, i1, i2] = [0, 1, 2].map(|k| face.indices[k] as usize);
        if i0 >= count || i1 >= count || i2 >= count {
            continue;
        }

        let e1 = mesh.positions[i1] - mesh.positions[i0];
        let e2 = mesh.positions[i2] - mesh.positions[i0];
        let d1: Vec2 = uvs[i1] - uvs[i0];
        let d2: Vec2 = uvs[i2] - uvs[i0];

        let det = d1.x * d2.y - d2.x * d1.y;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let t = (e1 * d2.y - e2 * d1.y) * r;
        let b = (e2 * d1.x - e1 * d2.x) * r;

        for i in [i0, i1, i2] {
            tan[i] += t;
            bitan[i] += b;
        }
    }

    for i in 0..count {
        let n = normals[i];
        // Gram-Schmidt against the normal
        let t = (tan[i] - n * n.dot(tan[i])).normalize_or_zero();
        let t = if t == Vec3::ZERO { n.any_orthonormal_vector() } else { t };
        let handedness = if n.cross(t).dot(bitan[i]) < 0.0 { -1.0 } else { 1.0 };
        tan[i] = t;
        bitan[i] = n.cross(t) * handedness;
    }

    mesh.tangents = Some(tan);
    mesh.bitangents = Some(bitan);
}

/// Merge vertices whose every channel matches bit for bit and remap faces.
///
/// Meshes whose channels disagree on the vertex count are left untouched.
pub fn join_identical_vertices(mesh: &mut SceneMesh) {
    let count = mesh.positions.len();
    let channels_match = [&mesh.normals, &mesh.tangents, &mesh.bitangents]
        .into_iter()
        .flatten()
        .map(Vec::len)
        .chain(mesh.tex_coords.iter().map(Vec::len))
        .all(|len| len == count);
    if !channels_match {
        return;
    }
    let mut remap = vec![0u32; count];
    let mut keep = Vec::with_capacity(count);
    let mut seen: HashMap<Vec<u32>, u32> = HashMap::with_capacity(count);

    for (i, slot) in remap.iter_mut().enumerate() {
        let key = vertex_key(mesh, i);
        *slot = *seen.entry(key).or_insert_with(|| {
            keep.push(i);
            (keep.len() - 1) as u32
        });
    }

    if keep.len() == count {
        return;
    }

    let pick3 = |v: &[Vec3]| keep.iter().map(|&i| v[i]).collect::<Vec<_>>();
    mesh.positions = pick3(&mesh.positions);
    mesh.normals = mesh.normals.as_deref().map(pick3);
    mesh.tangents = mesh.tangents.as_deref().map(pick3);
    mesh.bitangents = mesh.bitangents.as_deref().map(pick3);
    for set in &mut mesh.tex_coords {
        *set = keep.iter().map(|&i| set[i]).collect();
    }

    for face in &mut mesh.faces {
        for index in &mut face.indices {
            if let Some(&new) = remap.get(*index as usize) {
                *index = new;
            }
        }
    }
}

fn vertex_key(mesh: &SceneMesh, i: usize) -> Vec<u32> {
    let mut key = Vec::with_capacity(16);
    let mut push3 = |v: Option<&Vec3>| {
        if let Some(v) = v {
            key.extend(v.to_array().map(f32::to_bits));
        }
    };
    push3(mesh.positions.get(i));
    push3(mesh.normals.as_ref().and_then(|n| n.get(i)));
    push3(mesh.tangents.as_ref().and_then(|t| t.get(i)));
    push3(mesh.bitangents.as_ref().and_then(|b| b.get(i)));
    for set in &mesh.tex_coords {
        if let Some(uv) = set.get(i) {
            key.extend(uv.to_array().map(f32::to_bits));
        }
    }
    key
}

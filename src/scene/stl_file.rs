//! STL reader, binary and ASCII.
//!
//! STL has no materials, indices or texture coordinates: each facet yields
//! three vertices carrying the facet normal.

use std::path::Path;

use glam::{Vec2, Vec3};

use super::{Face, SceneGraph, SceneMaterial, SceneMesh};
use crate::error::DecodeError;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

pub(super) fn load(path: &Path) -> Result<SceneGraph, DecodeError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("stl")
        .to_string();

    let facets = if is_binary(&bytes) {
        parse_binary(&bytes)?
    } else {
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| DecodeError::Invalid("STL is neither binary nor ASCII".into()))?;
        parse_ascii(text)?
    };

    Ok(SceneGraph {
        materials: vec![SceneMaterial::new("default")],
        meshes: vec![facets_to_mesh(name, &facets)],
        textures: Vec::new(),
    })
}

struct Facet {
    normal: Vec3,
    vertices: [Vec3; 3],
}

/// Binary files whose header happens to start with "solid" are detected by
/// their exact size.
fn is_binary(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    let expected = HEADER_LEN + 4 + count * FACET_LEN;
    bytes.len() == expected || !bytes.starts_with(b"solid")
}

fn parse_binary(bytes: &[u8]) -> Result<Vec<Facet>, DecodeError> {
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    let body = &bytes[HEADER_LEN + 4..];
    if body.len() < count * FACET_LEN {
        return Err(DecodeError::Invalid(format!(
            "binary STL declares {count} facets but holds {} bytes",
            body.len()
        )));
    }

    let read_vec3 = |chunk: &[u8]| -> Vec3 {
        let f = |i: usize| {
            f32::from_le_bytes([chunk[i], chunk[i + 1], chunk[i + 2], chunk[i + 3]])
        };
        Vec3::new(f(0), f(4), f(8))
    };

    Ok(body
        .chunks_exact(FACET_LEN)
        .take(count)
        .map(|facet| Facet {
            normal: read_vec3(&facet[0..12]),
            vertices: [
                read_vec3(&facet[12..24]),
                read_vec3(&facet[24..36]),
                read_vec3(&facet[36..48]),
            ],
        })
        .collect())
}

fn parse_ascii(text: &str) -> Result<Vec<Facet>, DecodeError> {
    let mut facets = Vec::new();
    let mut normal = Vec3::ZERO;
    let mut vertices = Vec::with_capacity(3);

    for (line_no, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("facet") => {
                // "facet normal nx ny nz"
                tokens.next();
                normal = parse_vec3(&mut tokens, line_no)?;
                vertices.clear();
            }
            Some("vertex") => vertices.push(parse_vec3(&mut tokens, line_no)?),
            Some("endfacet") => {
                let [a, b, c]: [Vec3; 3] = vertices.as_slice().try_into().map_err(|_| {
                    DecodeError::Invalid(format!(
                        "line {}: facet with {} vertices",
                        line_no + 1,
                        vertices.len()
                    ))
                })?;
                facets.push(Facet {
                    normal,
                    vertices: [a, b, c],
                });
                vertices.clear();
            }
            _ => {}
        }
    }

    Ok(facets)
}

fn parse_vec3<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
) -> Result<Vec3, DecodeError> {
    let mut out = [0.0f32; 3];
    for value in &mut out {
        *value = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| DecodeError::Invalid(format!("line {}: bad number", line_no + 1)))?;
    }
    Ok(Vec3::from(out))
}

fn facets_to_mesh(name: String, facets: &[Facet]) -> SceneMesh {
    let mut positions = Vec::with_capacity(facets.len() * 3);
    let mut normals = Vec::with_capacity(facets.len() * 3);
    let mut faces = Vec::with_capacity(facets.len());

    for facet in facets {
        // Zero normals in the file are recomputed from the winding
        let normal = if facet.normal.length_squared() > 0.0 {
            facet.normal.normalize()
        } else {
            let [a, b, c] = facet.vertices;
            (b - a).cross(c - a).normalize_or_zero()
        };
        let base = positions.len() as u32;
        positions.extend_from_slice(&facet.vertices);
        normals.extend_from_slice(&[normal; 3]);
        faces.push(Face::triangle(base, base + 1, base + 2));
    }

    // STL carries no texture coordinates at all
    let uvs = vec![Vec2::ZERO; positions.len()];
    SceneMesh {
        name,
        positions,
        normals: Some(normals),
        tex_coords: vec![uvs],
        tangents: None,
        bitangents: None,
        faces,
        material_index: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_stl(facets: &[[[f32; 3]; 4]]) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes.extend_from_slice(&(facets.len() as u32).to_le_bytes());
        for facet in facets {
            for v in facet {
                for c in v {
                    bytes.extend_from_slice(&c.to_le_bytes());
                }
            }
            bytes.extend_from_slice(&0u16.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn reads_binary_facets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.stl");
        let bytes = binary_stl(&[[
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ]]);
        std::fs::write(&path, bytes).unwrap();

        let scene = load(&path).unwrap();
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.name, "tri");
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.faces, vec![Face::triangle(0, 1, 2)]);
        assert_eq!(mesh.normals.as_ref().unwrap()[0], Vec3::Z);
        assert!(mesh.tex_coords[0].iter().all(|uv| *uv == Vec2::ZERO));
        assert_eq!(scene.materials.len(), 1);
    }

    #[test]
    fn reads_ascii_facets() {
        let text = "solid part
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
  facet normal 0 0 1
    outer loop
      vertex 1 0 0
      vertex 1 1 0
      vertex 0 1 0
    endloop
  endfacet
endsolid part
";
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.stl");
        std::fs::write(&path, text).unwrap();

        let scene = load(&path).unwrap();
        assert_eq!(scene.meshes[0].faces.len(), 2);
        assert_eq!(scene.meshes[0].positions[4], Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn truncated_binary_is_invalid() {
        let mut bytes = binary_stl(&[[[0.0; 3]; 4]]);
        bytes[80] = 5;
        assert!(matches!(parse_binary(&bytes), Err(DecodeError::Invalid(_))));
    }

    #[test]
    fn ascii_facet_needs_three_vertices() {
        let text = "solid x\nfacet normal 0 0 1\nvertex 0 0 0\nendfacet\nendsolid\n";
        assert!(parse_ascii(text).is_err());
    }
}

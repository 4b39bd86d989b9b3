//! Scene-to-model import
//!
//! Import runs in two phases over a decoded scene. Phase 1 turns every
//! material into a GPU [`Material`], resolving its texture channels against
//! the model directory and the scene's embedded textures. Phase 2 uploads
//! every mesh and records the index of the phase-1 material it uses.
//!
//! All CPU-side validation happens before phase 1, so a file that fails to
//! import allocates no GPU resources.

use std::path::Path;

use glam::{Vec2, Vec3};

use crate::backend::{GraphicsBackend, Vertex};
use crate::diagnostics::{DiagnosticsSink, Severity};
use crate::error::{ImportError, MeshError};
use crate::resources::{resolve_texture, Mesh, Model, ResourceBuilder, TextureSource};
use crate::scene::{FileSceneDecoder, PostProcess, SceneDecoder, SceneMesh, TextureChannel};

/// What to do with a mesh lacking normals or a first UV set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingAttributePolicy {
    /// Fail the whole import with [`MeshError::MissingAttribute`]
    #[default]
    Reject,
    /// Substitute zero vectors for the missing channel
    ZeroFill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportOptions {
    pub missing_attributes: MissingAttributePolicy,
}

/// CPU-side mesh ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    /// Flattened triangle list
    pub indices: Vec<u32>,
    pub material_index: usize,
}

impl MeshData {
    /// Copy the channels of `mesh` into the fixed vertex layout and flatten
    /// its faces into a triangle list.
    pub fn extract(
        mesh: &SceneMesh,
        material_count: usize,
        policy: MissingAttributePolicy,
    ) -> Result<Self, MeshError> {
        let vertex_count = mesh.vertex_count();

        let normals = channel(mesh, mesh.normals.as_deref(), "normal", policy)?;
        let first_uvs = mesh.tex_coords.first().map(Vec::as_slice);
        let uvs = channel(mesh, first_uvs, "texture coordinate", policy)?;

        let vertices = mesh
            .positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                Vertex::new(
                    position,
                    normals.map_or(Vec3::ZERO, |n| n[i]),
                    uvs.map_or(Vec2::ZERO, |t| t[i]),
                )
            })
            .collect();

        let mut indices = Vec::with_capacity(mesh.faces.len() * 3);
        for face in &mesh.faces {
            if face.indices.len() != 3 {
                return Err(MeshError::MalformedFace {
                    mesh: mesh.name.clone(),
                    count: face.indices.len(),
                });
            }
            if let Some(&index) = face.indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(MeshError::IndexOutOfRange {
                    mesh: mesh.name.clone(),
                    index,
                    vertex_count,
                });
            }
            indices.extend_from_slice(&face.indices);
        }

        let material_index = if material_count == 0 {
            0
        } else if mesh.material_index < material_count {
            mesh.material_index
        } else {
            return Err(MeshError::InvalidMaterialIndex {
                mesh: mesh.name.clone(),
                index: mesh.material_index,
                material_count,
            });
        };

        Ok(Self {
            name: mesh.name.clone(),
            vertices,
            indices,
            material_index,
        })
    }
}

/// A per-vertex channel, `None` meaning zero-filled.
fn channel<'a, T>(
    mesh: &SceneMesh,
    data: Option<&'a [T]>,
    attribute: &'static str,
    policy: MissingAttributePolicy,
) -> Result<Option<&'a [T]>, MeshError> {
    match data {
        Some(values) if values.len() == mesh.vertex_count() => Ok(Some(values)),
        _ => match policy {
            MissingAttributePolicy::Reject => Err(MeshError::MissingAttribute {
                mesh: mesh.name.clone(),
                attribute,
            }),
            MissingAttributePolicy::ZeroFill => {
                log::debug!("Mesh '{}' has no {} channel, zero-filling", mesh.name, attribute);
                Ok(None)
            }
        },
    }
}

/// Loads model files into GPU-resident [`Model`]s.
pub struct ModelImporter {
    decoder: Box<dyn SceneDecoder>,
    options: ImportOptions,
}

impl Default for ModelImporter {
    fn default() -> Self {
        Self::new(ImportOptions::default())
    }
}

impl ModelImporter {
    /// Importer reading files through [`FileSceneDecoder`]
    pub fn new(options: ImportOptions) -> Self {
        Self::with_decoder(Box::new(FileSceneDecoder::new()), options)
    }

    pub fn with_decoder(decoder: Box<dyn SceneDecoder>, options: ImportOptions) -> Self {
        Self { decoder, options }
    }

    pub fn options(&self) -> ImportOptions {
        self.options
    }

    /// Import `path` into a new model.
    ///
    /// A failed import records exactly one error entry in `diagnostics`.
    /// Individual texture channels that fail to resolve are logged and left
    /// empty without failing the import.
    pub fn load_model<B: GraphicsBackend>(
        &self,
        builder: &mut ResourceBuilder<'_, B>,
        path: &Path,
        diagnostics: &dyn DiagnosticsSink,
    ) -> Result<Model, ImportError> {
        let result = self.import(builder, path, diagnostics);
        if let Err(e) = &result {
            diagnostics.record(Severity::Error, &e.to_string());
        }
        result
    }

    fn import<B: GraphicsBackend>(
        &self,
        builder: &mut ResourceBuilder<'_, B>,
        path: &Path,
        diagnostics: &dyn DiagnosticsSink,
    ) -> Result<Model, ImportError> {
        let scene = self
            .decoder
            .decode(path, PostProcess::IMPORT)
            .map_err(|e| ImportError::Decode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if !scene.has_meshes() {
            return Err(ImportError::NoMeshes {
                path: path.to_path_buf(),
            });
        }

        let policy = self.options.missing_attributes;
        let mesh_data = scene
            .meshes
            .iter()
            .map(|mesh| MeshData::extract(mesh, scene.materials.len(), policy))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ImportError::Mesh {
                path: path.to_path_buf(),
                source,
            })?;

        let source = TextureSource {
            base_dir: path.parent().unwrap_or(Path::new("")),
            scene: &scene,
        };

        // Phase 1: materials
        let materials = scene
            .materials
            .iter()
            .map(|material| {
                let textures = TextureChannel::ALL.map(|channel| {
                    resolve_texture(builder.backend(), material, channel, source, diagnostics)
                });
                builder.create_material(&material.name, textures)
            })
            .collect::<Vec<_>>();

        // Phase 2: meshes
        let meshes = mesh_data
            .into_iter()
            .map(|data| {
                let buffers = builder.upload_mesh(&data.name, &data.vertices, &data.indices);
                Mesh {
                    name: data.name,
                    buffers,
                    vertex_count: data.vertices.len() as u32,
                    material_index: data.material_index,
                }
            })
            .collect::<Vec<_>>();

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let placement = builder.create_placement(&name, Vec3::ZERO);

        log::info!(
            "Loaded model '{}': {} meshes, {} materials",
            name,
            meshes.len(),
            materials.len()
        );

        Ok(Model::new(name, meshes, materials, Vec3::ZERO, placement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Face;
    use rstest::rstest;

    fn triangle(normals: bool, uvs: bool) -> SceneMesh {
        SceneMesh {
            name: "tri".into(),
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: normals.then(|| vec![Vec3::Z; 3]),
            tex_coords: if uvs {
                vec![vec![Vec2::ZERO, Vec2::X, Vec2::Y]]
            } else {
                Vec::new()
            },
            faces: vec![Face::triangle(0, 1, 2)],
            ..Default::default()
        }
    }

    #[test]
    fn extracts_fixed_vertex_layout() {
        let data = MeshData::extract(&triangle(true, true), 1, MissingAttributePolicy::Reject)
            .unwrap();
        assert_eq!(data.indices, vec![0, 1, 2]);
        assert_eq!(data.vertices[1], Vertex::new(Vec3::X, Vec3::Z, Vec2::X));
        assert_eq!(data.material_index, 0);
    }

    #[rstest]
    #[case(false, true, "normal")]
    #[case(true, false, "texture coordinate")]
    fn reject_policy_names_missing_channel(
        #[case] normals: bool,
        #[case] uvs: bool,
        #[case] expected: &str,
    ) {
        let err = MeshData::extract(&triangle(normals, uvs), 1, MissingAttributePolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, MeshError::MissingAttribute { attribute, .. } if attribute == expected));
    }

    #[test]
    fn zero_fill_policy_substitutes_zeros() {
        let data = MeshData::extract(&triangle(false, false), 1, MissingAttributePolicy::ZeroFill)
            .unwrap();
        assert!(data
            .vertices
            .iter()
            .all(|v| v.normal == Vec3::ZERO && v.uv == Vec2::ZERO));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut mesh = triangle(true, true);
        mesh.faces.push(Face::triangle(0, 2, 3));
        let err = MeshData::extract(&mesh, 1, MissingAttributePolicy::Reject).unwrap_err();
        assert!(matches!(err, MeshError::IndexOutOfRange { index: 3, vertex_count: 3, .. }));
    }

    #[test]
    fn material_index_rules() {
        let mut mesh = triangle(true, true);
        mesh.material_index = 4;
        // No materials: always 0
        let data = MeshData::extract(&mesh, 0, MissingAttributePolicy::Reject).unwrap();
        assert_eq!(data.material_index, 0);
        // Out of range with materials present
        assert!(matches!(
            MeshData::extract(&mesh, 2, MissingAttributePolicy::Reject),
            Err(MeshError::InvalidMaterialIndex { index: 4, material_count: 2, .. })
        ));
    }

    #[test]
    fn polygon_faces_must_be_triangulated() {
        let mut mesh = triangle(true, true);
        mesh.faces = vec![Face::new([0, 1, 2, 0])];
        assert!(matches!(
            MeshData::extract(&mesh, 0, MissingAttributePolicy::Reject),
            Err(MeshError::MalformedFace { count: 4, .. })
        ));
    }
}

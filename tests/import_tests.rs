//! Model import through the viewer: counts, failure handling, replace
//! semantics and resource ownership.

mod common;

use std::sync::Arc;

use common::*;
use glam::{Vec2, Vec3};
use model_viewer::backend::GraphicsBackend;
use model_viewer::scene::{EmbeddedTexture, Face, SceneGraph, SceneMaterial, SceneMesh, TextureChannel};
use model_viewer::{
    HeadlessBackend, ImportOptions, LogBuffer, MissingAttributePolicy, ModelImporter, Severity,
    Viewer, ViewerConfig,
};
use rstest::rstest;

fn index_data(viewer: &Viewer<HeadlessBackend>, mesh: usize) -> Vec<u32> {
    let buffer = viewer.models()[0].meshes[mesh].buffers.index_buffer;
    viewer
        .backend()
        .buffer_data(buffer)
        .unwrap()
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn static_viewer(scene: SceneGraph) -> Viewer<HeadlessBackend> {
    Viewer::with_importer(
        HeadlessBackend::default(),
        ViewerConfig::default(),
        Arc::new(LogBuffer::new()),
        ModelImporter::with_decoder(Box::new(StaticDecoder(scene)), ImportOptions::default()),
    )
}

fn triangle_mesh() -> SceneMesh {
    SceneMesh {
        name: "tri".into(),
        positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        normals: Some(vec![Vec3::Z; 3]),
        tex_coords: vec![vec![Vec2::ZERO, Vec2::X, Vec2::Y]],
        faces: vec![Face::triangle(0, 1, 2)],
        ..Default::default()
    }
}

#[test]
fn textured_quad_imports_with_all_channels() {
    let fixture = Fixture::new();
    let path = fixture.textured_quad();
    let mut viewer = headless_viewer();

    assert!(viewer.load_model(&path));

    let model = &viewer.models()[0];
    assert_eq!(model.name, "quad.obj");
    assert_eq!(model.meshes.len(), 1);
    assert_eq!(model.vertex_count(), 4);
    assert_eq!(model.triangle_count(), 2);
    assert_eq!(model.materials.len(), 1);
    for channel in TextureChannel::ALL {
        assert!(
            model.materials[0].has_texture(channel),
            "{} channel missing",
            channel.name()
        );
    }
    assert!(viewer.diagnostics().is_empty());
    assert_eq!(viewer.metadata().assets.len(), 1);
    assert_eq!(viewer.metadata().assets[0].name, "quad.obj");
}

#[test]
fn flattened_indices_reference_existing_vertices() {
    let fixture = Fixture::new();
    let path = fixture.plain_quad();
    let mut viewer = headless_viewer();
    assert!(viewer.load_model(&path));

    let indices = index_data(&viewer, 0);
    let mesh = &viewer.models()[0].meshes[0];
    assert_eq!(indices.len(), 3 * mesh.triangle_count() as usize);
    assert_eq!(indices.len() as u32, mesh.index_count());
    assert!(indices.iter().all(|&i| i < mesh.vertex_count));
}

#[rstest]
#[case::empty_file("empty.obj", "")]
#[case::garbage_gltf("broken.gltf", "{ not json")]
#[case::unsupported_extension("model.fbx", "Kaydara FBX Binary")]
fn undecodable_file_keeps_previous_model(#[case] name: &str, #[case] contents: &str) {
    let fixture = Fixture::new();
    let good = fixture.textured_quad();
    let bad = fixture.write(name, contents);
    let mut viewer = headless_viewer();
    assert!(viewer.load_model(&good));

    let buffers = viewer.backend().live_buffer_count();
    let textures = viewer.backend().live_texture_count();

    assert!(!viewer.load_model(&bad));

    assert_eq!(viewer.models().len(), 1);
    assert_eq!(viewer.models()[0].name, "quad.obj");
    assert_eq!(viewer.backend().live_buffer_count(), buffers);
    assert_eq!(viewer.backend().live_texture_count(), textures);

    let entries = viewer.diagnostics().snapshot();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Error);
    assert!(entries[0].message.contains(name));
}

#[test]
fn missing_file_logs_one_error() {
    let fixture = Fixture::new();
    let mut viewer = headless_viewer();

    assert!(!viewer.load_model(&fixture.path("nowhere.obj")));
    assert!(viewer.models().is_empty());
    assert_eq!(viewer.diagnostics().len(), 1);
}

#[test]
fn untextured_material_imports_with_no_textures() {
    let fixture = Fixture::new();
    let path = fixture.plain_quad();
    let mut viewer = headless_viewer();

    assert!(viewer.load_model(&path));

    let material = &viewer.models()[0].materials[0];
    assert_eq!(material.texture_count(), 0);
    assert!(viewer.diagnostics().is_empty());
}

#[test]
fn importing_twice_gives_equal_models_with_new_handles() {
    let fixture = Fixture::new();
    let path = fixture.textured_quad();
    let mut viewer = headless_viewer();

    assert!(viewer.load_model(&path));
    let first = &viewer.models()[0];
    let first_counts = (
        first.meshes.len(),
        first.materials.len(),
        first.vertex_count(),
        first.meshes[0].index_count(),
    );
    let first_buffer = first.meshes[0].buffers.vertex_buffer;

    assert!(viewer.load_model(&path));
    let second = &viewer.models()[0];
    let second_counts = (
        second.meshes.len(),
        second.materials.len(),
        second.vertex_count(),
        second.meshes[0].index_count(),
    );

    assert_eq!(first_counts, second_counts);
    assert_ne!(second.meshes[0].buffers.vertex_buffer, first_buffer);
    assert!(!viewer.backend().is_buffer_live(first_buffer));
}

#[test]
fn replacing_a_model_releases_its_resources() {
    let fixture = Fixture::new();
    let path = fixture.textured_quad();
    let mut viewer = headless_viewer();

    let base_buffers = viewer.backend().live_buffer_count();
    let base_textures = viewer.backend().live_texture_count();
    let base_views = viewer.backend().live_texture_view_count();
    let base_groups = viewer.backend().live_bind_group_count();

    assert!(viewer.load_model(&path));
    let model_buffers = viewer.backend().live_buffer_count() - base_buffers;
    let model_textures = viewer.backend().live_texture_count() - base_textures;
    // vertex + index, material uniform, placement uniform
    assert_eq!(model_buffers, 4);
    assert_eq!(model_textures, 4);

    for _ in 0..3 {
        assert!(viewer.load_model(&path));
    }

    assert_eq!(viewer.models().len(), 1);
    assert_eq!(viewer.backend().live_buffer_count(), base_buffers + model_buffers);
    assert_eq!(viewer.backend().live_texture_count(), base_textures + model_textures);
    assert_eq!(viewer.backend().live_texture_view_count(), base_views + 4);
    // material + placement
    assert_eq!(viewer.backend().live_bind_group_count(), base_groups + 2);
}

#[test]
fn missing_normals_follow_import_policy() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "flat.obj",
        "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n",
    );

    let mut strict = headless_viewer();
    let buffers = strict.backend().live_buffer_count();
    assert!(!strict.load_model(&path));
    let entries = strict.diagnostics().snapshot();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].message.contains("normal"));
    assert!(entries[0].message.contains(&path.display().to_string()));
    assert_eq!(strict.backend().live_buffer_count(), buffers);

    let config = ViewerConfig {
        import: ImportOptions {
            missing_attributes: MissingAttributePolicy::ZeroFill,
        },
        ..Default::default()
    };
    let mut lenient = Viewer::new(HeadlessBackend::default(), config, Arc::new(LogBuffer::new()));
    assert!(lenient.load_model(&path));
    assert_eq!(lenient.models()[0].vertex_count(), 3);
}

#[test]
fn stl_imports_under_default_policy() {
    let fixture = Fixture::new();
    let path = fixture.write(
        "part.stl",
        "solid part\n\
         facet normal 0 0 1\n\
         outer loop\n\
         vertex 0 0 0\n\
         vertex 1 0 0\n\
         vertex 0 1 0\n\
         endloop\n\
         endfacet\n\
         endsolid part\n",
    );
    let mut viewer = headless_viewer();

    assert!(viewer.load_model(&path));

    let model = &viewer.models()[0];
    assert_eq!(model.name, "part.stl");
    assert_eq!(model.triangle_count(), 1);
    assert!(viewer.diagnostics().is_empty());
}

#[test]
fn mesh_level_failure_names_the_file() {
    let mut mesh = triangle_mesh();
    mesh.faces = vec![Face::triangle(0, 1, 7)];
    let scene = SceneGraph {
        meshes: vec![mesh],
        ..Default::default()
    };
    let mut viewer = static_viewer(scene);

    assert!(!viewer.load_model("broken_indices.obj".as_ref()));

    let entries = viewer.diagnostics().snapshot();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].message.starts_with("Failed to load model asset."));
    assert!(entries[0].message.contains("Path: broken_indices.obj"));
    assert!(entries[0].message.contains("references vertex 7"));
}

#[test]
fn gltf_embedded_png_resolves_to_texture() {
    let fixture = Fixture::new();
    let path = fixture.write("tri.gltf", embedded_gltf());
    let mut viewer = headless_viewer();

    assert!(viewer.load_model(&path));

    let model = &viewer.models()[0];
    assert_eq!(model.triangle_count(), 1);
    let diffuse = model.materials[0]
        .texture(TextureChannel::Diffuse)
        .expect("embedded diffuse texture");
    assert_eq!((diffuse.width, diffuse.height), (2, 2));
    assert!(viewer.diagnostics().is_empty());
}

#[test]
fn uncompressed_embedded_texture_resolves_to_none() {
    let scene = SceneGraph {
        materials: vec![SceneMaterial::new("raw").with_texture(TextureChannel::Diffuse, "*0")],
        meshes: vec![triangle_mesh()],
        textures: vec![EmbeddedTexture {
            data: vec![255; 2 * 2 * 4],
            width: 2,
            height: 2,
            format_hint: "rgba8888".into(),
            filename: None,
        }],
    };
    let mut viewer = static_viewer(scene);
    let textures = viewer.backend().live_texture_count();

    assert!(viewer.load_model("raw.bin".as_ref()));

    let material = &viewer.models()[0].materials[0];
    assert!(!material.has_texture(TextureChannel::Diffuse));
    assert_eq!(viewer.backend().live_texture_count(), textures);
    let entries = viewer.diagnostics().snapshot();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, Severity::Warning);
}

#[test]
fn scene_without_meshes_is_rejected() {
    let scene = SceneGraph {
        materials: vec![SceneMaterial::new("lonely")],
        ..Default::default()
    };
    let mut viewer = static_viewer(scene);
    let buffers = viewer.backend().live_buffer_count();

    assert!(!viewer.load_model("nothing.obj".as_ref()));
    assert_eq!(viewer.backend().live_buffer_count(), buffers);
    assert_eq!(viewer.diagnostics().len(), 1);
}

#[test]
fn scene_without_materials_draws_with_default_material() {
    let scene = SceneGraph {
        meshes: vec![triangle_mesh()],
        ..Default::default()
    };
    let mut viewer = static_viewer(scene);

    assert!(viewer.load_model("bare.obj".as_ref()));
    let model = &viewer.models()[0];
    assert!(model.materials.is_empty());
    assert!(model.material_for(&model.meshes[0]).is_none());
}

#[test]
#[should_panic(expected = "Failed to create vertex buffer")]
fn buffer_allocation_failure_during_mesh_upload_panics() {
    let scene = SceneGraph {
        meshes: vec![triangle_mesh()],
        ..Default::default()
    };
    let mut viewer = static_viewer(scene);
    viewer.backend_mut().set_fail_buffer_creation(true);

    viewer.load_model("bare.obj".as_ref());
}

#[test]
fn surface_size_is_unaffected_by_import() {
    let fixture = Fixture::new();
    let mut viewer = headless_viewer();
    viewer.load_model(&fixture.textured_quad());
    assert_eq!(viewer.backend().surface_size(), (640, 480));
}

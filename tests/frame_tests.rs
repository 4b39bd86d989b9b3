//! Frame loop ordering: update before render, deferred command drain, and
//! the draw sequence recorded by the model pass.

mod common;

use common::*;
use model_viewer::backend::{BindGroupEntry, GraphicsBackend, IndexFormat, RecordedCommand};
use model_viewer::{Command, FrameState};

#[test]
fn empty_frame_renders_ui_once_and_presents() {
    let mut viewer = headless_viewer();
    let mut ui = ScriptedUi::default();

    viewer.frame(&mut ui);

    assert_eq!(ui.renders, 1);
    assert_eq!(ui.seen.len(), 1);
    assert!(ui.seen[0].assets.is_empty());
    assert_eq!(viewer.backend().frames_presented(), 1);
    assert_eq!(viewer.state(), FrameState::Idle);
    assert_eq!(viewer.backend().commands().last(), Some(&RecordedCommand::EndPass));
}

#[test]
fn model_is_drawn_in_the_frame_that_loads_it() {
    let fixture = Fixture::new();
    let path = fixture.plain_quad();
    let mut viewer = headless_viewer();
    let mut ui = ScriptedUi::loading(&[&path]);

    viewer.frame(&mut ui);

    assert_eq!(viewer.backend().draw_calls(), vec![0..6]);

    let mesh = &viewer.models()[0].meshes[0];
    let material = viewer.models()[0].materials[0].bind_group();
    let commands = viewer.backend().commands();
    let draw = commands
        .iter()
        .position(|c| matches!(c, RecordedCommand::DrawIndexed { .. }))
        .unwrap();
    assert_eq!(
        &commands[draw - 3..=draw],
        &[
            RecordedCommand::SetBindGroup {
                index: 2,
                bind_group: material,
            },
            RecordedCommand::SetVertexBuffer {
                slot: 0,
                buffer: mesh.buffers.vertex_buffer,
            },
            RecordedCommand::SetIndexBuffer {
                buffer: mesh.buffers.index_buffer,
                format: IndexFormat::Uint32,
            },
            RecordedCommand::DrawIndexed {
                indices: 0..6,
                base_vertex: 0,
            },
        ]
    );
}

#[test]
fn frame_bind_groups_precede_mesh_draws() {
    let fixture = Fixture::new();
    let path = fixture.plain_quad();
    let mut viewer = headless_viewer();
    assert!(viewer.load_model(&path));

    viewer.frame(&mut ScriptedUi::default());

    let frame_group = viewer.pipeline().frame_bind_group;
    let placement = viewer.models()[0].placement().bind_group;
    let groups: Vec<(u32, _)> = viewer
        .backend()
        .commands()
        .iter()
        .filter_map(|c| match c {
            RecordedCommand::SetBindGroup { index, bind_group } => Some((*index, *bind_group)),
            _ => None,
        })
        .collect();
    assert_eq!(groups[0], (0, frame_group));
    assert_eq!(groups[1], (1, placement));
    assert_eq!(groups.len(), 3);
}

#[test]
fn absent_channels_bind_the_null_texture() {
    let fixture = Fixture::new();
    let path = fixture.plain_quad();
    let mut viewer = headless_viewer();
    assert!(viewer.load_model(&path));

    let null_view = viewer.pipeline().null_texture.view;
    let bind_group = viewer.models()[0].materials[0].bind_group();
    let entries = viewer.backend().bind_group_entries(bind_group).unwrap();

    for slot in 0..4 {
        let (_, entry) = entries.iter().find(|(b, _)| *b == slot).unwrap();
        assert!(
            matches!(entry, BindGroupEntry::Texture(view) if *view == null_view),
            "slot {slot} is not the null texture"
        );
    }
}

#[test]
fn last_successful_load_in_a_frame_wins() {
    let fixture = Fixture::new();
    let first = fixture.plain_quad();
    let second = fixture.write("tri.gltf", embedded_gltf());
    let mut viewer = headless_viewer();
    let mut ui = ScriptedUi::loading(&[&first, &second]);

    viewer.frame(&mut ui);

    assert_eq!(viewer.models().len(), 1);
    assert_eq!(viewer.models()[0].name, "tri.gltf");
    assert_eq!(viewer.backend().draw_calls(), vec![0..3]);
    assert!(viewer.queue_mut().is_empty());
}

#[test]
fn failed_load_after_success_keeps_the_first_model() {
    let fixture = Fixture::new();
    let good = fixture.plain_quad();
    let bad = fixture.write("broken.obj", "");
    let mut viewer = headless_viewer();
    let mut ui = ScriptedUi::loading(&[&good, &bad]);

    viewer.frame(&mut ui);

    assert_eq!(viewer.models().len(), 1);
    assert_eq!(viewer.models()[0].name, "quad.obj");
    assert_eq!(viewer.diagnostics().len(), 1);
    assert!(viewer.queue_mut().is_empty());
}

#[test]
fn ui_sees_new_metadata_on_the_next_frame() {
    let fixture = Fixture::new();
    let path = fixture.plain_quad();
    let mut viewer = headless_viewer();
    let mut ui = ScriptedUi::loading(&[&path]);

    viewer.frame(&mut ui);
    viewer.frame(&mut ui);

    assert_eq!(ui.seen.len(), 2);
    assert!(ui.seen[0].assets.is_empty());
    assert_eq!(ui.seen[1].assets.len(), 1);
    assert_eq!(ui.seen[1].assets[0].name, "quad.obj");
    assert_eq!(ui.renders, 2);
}

#[test]
fn commands_queued_outside_a_frame_run_in_the_next_update() {
    let fixture = Fixture::new();
    let path = fixture.plain_quad();
    let mut viewer = headless_viewer();

    viewer.queue_mut().push(Command::LoadModel { path });
    assert!(viewer.models().is_empty());

    viewer.frame(&mut ScriptedUi::default());
    assert_eq!(viewer.models().len(), 1);
}

#[test]
fn resize_updates_the_viewport() {
    let mut viewer = headless_viewer();
    viewer.resize(320, 200);
    viewer.frame(&mut ScriptedUi::default());

    assert!(viewer
        .backend()
        .commands()
        .contains(&RecordedCommand::SetViewport {
            width: 320.0,
            height: 200.0
        }));
}

#[test]
fn zero_size_resize_is_ignored() {
    let mut viewer = headless_viewer();
    viewer.resize(0, 0);
    assert_eq!(viewer.backend().surface_size(), (640, 480));
}

//! Renderer state and frame loop
//!
//! A [`Viewer`] owns the backend, the fixed pipeline objects and the loaded
//! models. Each call to [`Viewer::frame`] runs one update phase (camera, UI,
//! command drain) followed by one render phase (model pass, UI, present).

mod pipeline;
mod shader;

pub use pipeline::{PipelineObjects, DEPTH_FORMAT};

use std::path::Path;
use std::sync::Arc;

use crate::backend::*;
use crate::camera::{CameraInput, OrbitCamera};
use crate::command::{Command, CommandQueue};
use crate::diagnostics::LogBuffer;
use crate::import::ModelImporter;
use crate::resources::{Model, ResourceBuilder};
use crate::ui::{EditorMetadata, EditorUi, UiState};
use crate::ViewerConfig;

/// Frame loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Waiting for the next redraw
    Idle,
    /// Inside [`Viewer::frame`]
    InProgress,
}

pub struct Viewer<B: GraphicsBackend> {
    backend: B,
    config: ViewerConfig,
    pipeline: PipelineObjects,
    importer: ModelImporter,
    diagnostics: Arc<LogBuffer>,
    models: Vec<Model>,
    queue: CommandQueue,
    camera: OrbitCamera,
    camera_input: CameraInput,
    metadata: EditorMetadata,
    state: FrameState,
}

impl<B: GraphicsBackend> Viewer<B> {
    /// Create the viewer and its fixed pipeline objects.
    ///
    /// # Panics
    ///
    /// Panics if the pipeline objects cannot be created.
    pub fn new(backend: B, config: ViewerConfig, diagnostics: Arc<LogBuffer>) -> Self {
        let importer = ModelImporter::new(config.import);
        Self::with_importer(backend, config, diagnostics, importer)
    }

    pub fn with_importer(
        mut backend: B,
        config: ViewerConfig,
        diagnostics: Arc<LogBuffer>,
        importer: ModelImporter,
    ) -> Self {
        let pipeline = PipelineObjects::new(&mut backend);
        let (width, height) = backend.surface_size();

        log::info!("Viewer initialized at {}x{}", width, height);

        Self {
            backend,
            config,
            pipeline,
            importer,
            diagnostics,
            models: Vec::new(),
            queue: CommandQueue::new(),
            camera: OrbitCamera::new(width, height),
            camera_input: CameraInput::default(),
            metadata: EditorMetadata::default(),
            state: FrameState::Idle,
        }
    }

    /// Run one frame: update, then render and present.
    ///
    /// Soft failures in either phase are logged; the viewer is back in
    /// [`FrameState::Idle`] when this returns.
    pub fn frame(&mut self, ui: &mut dyn EditorUi<B>) {
        self.state = FrameState::InProgress;
        self.update(ui);
        self.render(ui);
        self.state = FrameState::Idle;
    }

    fn update(&mut self, ui: &mut dyn EditorUi<B>) {
        self.camera.update(&self.camera_input);
        self.camera_input.reset_deltas();

        ui.update(
            UiState {
                metadata: &self.metadata,
                log: &self.diagnostics,
            },
            &mut self.queue,
        );

        self.process_commands();
    }

    /// Apply every queued command in order. The queue is empty afterwards
    /// whatever the outcome of each command.
    pub fn process_commands(&mut self) {
        for command in self.queue.take() {
            match command {
                Command::LoadModel { path } => {
                    self.load_model(&path);
                }
            }
        }
    }

    /// Import `path` and, on success, replace every loaded model with it.
    ///
    /// Returns whether the model was loaded. On failure the loaded models are
    /// left untouched and the error is in the diagnostics log.
    pub fn load_model(&mut self, path: &Path) -> bool {
        let layouts = self.pipeline.layouts();
        let mut builder = ResourceBuilder::new(&mut self.backend, layouts);

        match self
            .importer
            .load_model(&mut builder, path, self.diagnostics.as_ref())
        {
            Ok(model) => {
                for old in self.models.drain(..) {
                    old.release(&mut self.backend);
                }
                self.models.push(model);
                self.metadata = EditorMetadata::from_models(&self.models);
                true
            }
            Err(_) => false,
        }
    }

    fn render(&mut self, ui: &mut dyn EditorUi<B>) {
        let frame = match self.backend.begin_frame() {
            Ok(frame) => frame,
            Err(BackendError::SurfaceLost) => {
                let (width, height) = self.backend.surface_size();
                log::warn!("Surface lost, reconfiguring at {}x{}", width, height);
                self.resize(width, height);
                return;
            }
            Err(e) => {
                log::error!("Failed to begin frame: {}", e);
                return;
            }
        };

        let camera = self.camera.uniform();
        self.backend
            .write_buffer(self.pipeline.camera_buffer, 0, bytemuck::bytes_of(&camera));

        self.backend.begin_render_pass(&RenderPassDescriptor {
            label: Some("Model Pass".into()),
            color: ColorAttachment {
                view: frame.swapchain_view,
                clear: Some(self.config.clear_color),
            },
            depth: Some(DepthAttachment {
                view: self.pipeline.depth_view,
                clear: Some(1.0),
            }),
        });
        self.backend.set_viewport(frame.width as f32, frame.height as f32);
        self.backend.set_render_pipeline(self.pipeline.pipeline);
        self.backend.set_bind_group(0, self.pipeline.frame_bind_group);

        for model in &self.models {
            self.backend.set_bind_group(1, model.placement().bind_group);

            for mesh in &model.meshes {
                let material = model
                    .material_for(mesh)
                    .unwrap_or(&self.pipeline.default_material);
                self.backend.set_bind_group(2, material.bind_group());
                self.backend.set_vertex_buffer(0, mesh.buffers.vertex_buffer);
                self.backend
                    .set_index_buffer(mesh.buffers.index_buffer, IndexFormat::Uint32);
                self.backend.draw_indexed(0..mesh.index_count(), 0);
            }
        }

        self.backend.end_render_pass();

        ui.render(&mut self.backend, &frame);

        if let Err(e) = self.backend.end_frame() {
            log::error!("Failed to present frame: {}", e);
        }
    }

    /// Resize the swapchain and the depth target
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.backend.resize(width, height);
        let (width, height) = self.backend.surface_size();
        self.pipeline.resize_depth(&mut self.backend, width, height);
        self.camera.set_viewport(width, height);
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &PipelineObjects {
        &self.pipeline
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn metadata(&self) -> &EditorMetadata {
        &self.metadata
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn diagnostics(&self) -> &Arc<LogBuffer> {
        &self.diagnostics
    }

    /// Queue read by the next update phase
    pub fn queue_mut(&mut self) -> &mut CommandQueue {
        &mut self.queue
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    /// Input accumulated by the window layer until the next update
    pub fn camera_input_mut(&mut self) -> &mut CameraInput {
        &mut self.camera_input
    }
}

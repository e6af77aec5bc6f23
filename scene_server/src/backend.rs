use std::sync::Arc;

use scene_common::{
    scene::{CompiledScene, PoseSnapshot},
    transform::Transform,
};

use crate::{
    config::{BackendKind, ServerConfig},
    web::WebBackend,
    ServerError,
};

/// What the simulation driver talks to. Exactly one backend is active per run.
pub trait RenderBackend: Send {
    fn name(&self) -> &'static str;

    /// Publishes a freshly compiled scene. May be called again after a
    /// recompile.
    fn init_scene(&mut self, scene: Arc<CompiledScene>) -> Result<(), ServerError>;

    /// `transform` is relative to the object's parent, in the engine frame.
    fn update_transform(&mut self, name: &str, transform: Transform) -> Result<(), ServerError>;

    fn update_scene(&mut self, poses: &PoseSnapshot) -> Result<(), ServerError> {
        for (name, transform) in poses.iter() {
            self.update_transform(name, *transform)?;
        }
        Ok(())
    }

    fn is_running(&self) -> bool;

    fn close(&mut self);
}

/// Accepts everything and shows nothing.
#[derive(Debug)]
pub struct NullBackend {
    running: bool,
}

impl NullBackend {
    pub fn new() -> Self {
        Self { running: true }
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for NullBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    fn init_scene(&mut self, scene: Arc<CompiledScene>) -> Result<(), ServerError> {
        log::debug!("Null backend ignores scene {}", scene.id);
        Ok(())
    }

    fn update_transform(&mut self, _name: &str, _transform: Transform) -> Result<(), ServerError> {
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn close(&mut self) {
        self.running = false;
    }
}

/// Builds the backend selected in the configuration. Starting the web backend
/// binds its listeners right away, so a taken port fails here.
pub fn create_backend(
    kind: BackendKind,
    config: &ServerConfig,
) -> Result<Box<dyn RenderBackend>, ServerError> {
    config.validate()?;
    log::info!("Starting {kind} backend");
    let backend: Box<dyn RenderBackend> = match kind {
        BackendKind::Web => Box::new(WebBackend::start(config.clone())?),
        BackendKind::Null => Box::new(NullBackend::new()),
    };
    Ok(backend)
}

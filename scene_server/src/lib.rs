pub mod backend;
pub mod config;
mod error;
pub mod scene_builder;
pub mod web;

pub use backend::{create_backend, NullBackend, RenderBackend};
pub use config::{BackendKind, ServerConfig};
pub use error::*;
pub use scene_builder::build_scene;

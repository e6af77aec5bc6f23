use scene_common::SceneError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start the runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("unknown object {0}")]
    UnknownObject(String),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

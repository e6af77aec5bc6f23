use thiserror::Error;

/// Fatal problems while turning an engine model into a scene graph.
/// A failed build never yields a partial scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("geometry {geom} uses unsupported primitive {kind}")]
    UnsupportedPrimitive { geom: String, kind: String },

    #[error("malformed model: {0}")]
    MalformedModel(String),

    #[error("unknown body {0}")]
    UnknownBody(String),

    #[error("{owner} references missing {what} {name}")]
    DanglingReference {
        owner: String,
        what: &'static str,
        name: String,
    },

    #[error("failed to serialize scene: {0}")]
    Serialization(#[from] bincode::Error),
}

use serde::{Deserialize, Serialize};

use crate::ContentHash;

/// A texture whose RGB8 pixels live in the asset store.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TextureEntry {
    pub name: String,
    pub hash: ContentHash,
    pub width: usize,
    pub height: usize,
    #[serde(rename = "textureType")]
    pub texture_type: String,
}

impl TextureEntry {
    pub fn new_2d(name: String, hash: ContentHash, width: usize, height: usize) -> Self {
        Self {
            name,
            hash,
            width,
            height,
            texture_type: "2D".into(),
        }
    }
}

mod asset;
pub mod coordinates;
pub mod engine;
mod error;
pub mod protocol;
pub mod scene;
pub mod transform;

pub use asset::*;
pub use error::*;

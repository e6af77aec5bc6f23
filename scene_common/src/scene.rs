mod compiled;
mod material;
mod mesh;
mod node;
mod pose;
mod texture;

pub use compiled::*;
pub use material::*;
pub use mesh::*;
pub use node::*;
pub use pose::*;
pub use texture::*;

use serde::{Deserialize, Serialize};

use crate::ContentHash;

/// Where one section of a mesh blob lives: byte offset and element count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BufferLayout(pub usize, pub usize);

impl BufferLayout {
    pub fn offset(&self) -> usize {
        self.0
    }

    pub fn count(&self) -> usize {
        self.1
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MeshEntry {
    pub name: String,
    pub hash: ContentHash,
    pub vertex_layout: BufferLayout,
    pub normal_layout: BufferLayout,
    pub index_layout: BufferLayout,
    /// `(0, 0)` when the mesh has no texture coordinates.
    pub uv_layout: BufferLayout,
}

/// Geometry of one mesh, borrowed from wherever it is stored.
pub struct MeshData<'a> {
    pub vertices: &'a [[f32; 3]],
    pub normals: &'a [[f32; 3]],
    pub faces: &'a [[i32; 3]],
    pub uvs: Option<&'a [[f32; 2]]>,
}

/// The blob layout: f32 positions, f32 normals, i32 indices, optional f32
/// uvs, all little-endian and back to back.
pub struct EncodedMesh {
    pub bytes: Vec<u8>,
    pub vertex_layout: BufferLayout,
    pub normal_layout: BufferLayout,
    pub index_layout: BufferLayout,
    pub uv_layout: BufferLayout,
}

impl MeshData<'_> {
    pub fn encode(&self) -> EncodedMesh {
        let uv_floats = self.uvs.map_or(0, |uvs| uvs.len() * 2);
        let capacity = 4 * (self.vertices.len() * 3
            + self.normals.len() * 3
            + self.faces.len() * 3
            + uv_floats);
        let mut bytes = Vec::with_capacity(capacity);

        let vertex_layout = write_section(&mut bytes, self.vertices.iter().flatten(), |v| {
            v.to_le_bytes()
        });
        let normal_layout = write_section(&mut bytes, self.normals.iter().flatten(), |v| {
            v.to_le_bytes()
        });
        let index_layout = write_section(&mut bytes, self.faces.iter().flatten(), |v| {
            v.to_le_bytes()
        });
        let uv_layout = match self.uvs {
            Some(uvs) => write_section(&mut bytes, uvs.iter().flatten(), |v| v.to_le_bytes()),
            None => BufferLayout::default(),
        };

        EncodedMesh {
            bytes,
            vertex_layout,
            normal_layout,
            index_layout,
            uv_layout,
        }
    }
}

fn write_section<'a, T: Copy + 'a>(
    bytes: &mut Vec<u8>,
    values: impl Iterator<Item = &'a T>,
    to_bytes: impl Fn(T) -> [u8; 4],
) -> BufferLayout {
    let offset = bytes.len();
    let mut count = 0;
    for value in values {
        bytes.extend_from_slice(&to_bytes(*value));
        count += 1;
    }
    BufferLayout(offset, count)
}

/// Owned geometry of an axis-aligned cube with unit edge length, centered at
/// the origin.
pub struct CubeGeometry {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub faces: Vec<[i32; 3]>,
    pub uvs: Vec<[f32; 2]>,
}

impl CubeGeometry {
    pub fn new() -> Self {
        struct CubeFace {
            position_indices: [usize; 4],
            normal: [f32; 3],
        }

        let positions: [[f32; 3]; 8] = [
            // top
            [-0.5, -0.5, 0.5],
            [0.5, -0.5, 0.5],
            [0.5, 0.5, 0.5],
            [-0.5, 0.5, 0.5],
            // bottom
            [-0.5, -0.5, -0.5],
            [0.5, -0.5, -0.5],
            [0.5, 0.5, -0.5],
            [-0.5, 0.5, -0.5],
        ];

        let faces = [
            CubeFace {
                position_indices: [0, 1, 2, 3],
                normal: [0.0, 0.0, 1.0],
            },
            CubeFace {
                position_indices: [5, 4, 7, 6],
                normal: [0.0, 0.0, -1.0],
            },
            CubeFace {
                position_indices: [1, 5, 6, 2],
                normal: [1.0, 0.0, 0.0],
            },
            CubeFace {
                position_indices: [4, 0, 3, 7],
                normal: [-1.0, 0.0, 0.0],
            },
            CubeFace {
                position_indices: [3, 2, 6, 7],
                normal: [0.0, 1.0, 0.0],
            },
            CubeFace {
                position_indices: [1, 0, 4, 5],
                normal: [0.0, -1.0, 0.0],
            },
        ];

        let uvs_face: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

        let mut geometry = CubeGeometry {
            vertices: Vec::with_capacity(24),
            normals: Vec::with_capacity(24),
            faces: Vec::with_capacity(12),
            uvs: Vec::with_capacity(24),
        };
        for (face_index, face) in faces.iter().enumerate() {
            for (corner, position_index) in face.position_indices.iter().enumerate() {
                geometry.vertices.push(positions[*position_index]);
                geometry.normals.push(face.normal);
                geometry.uvs.push(uvs_face[corner]);
            }
            let offset = 4 * face_index as i32;
            geometry.faces.push([offset, offset + 1, offset + 2]);
            geometry.faces.push([offset + 2, offset + 3, offset]);
        }
        geometry
    }

    pub fn as_mesh_data(&self) -> MeshData<'_> {
        MeshData {
            vertices: &self.vertices,
            normals: &self.normals,
            faces: &self.faces,
            uvs: Some(&self.uvs),
        }
    }
}

impl Default for CubeGeometry {
    fn default() -> Self {
        Self::new()
    }
}

//! Compiled model tables as handed over by the physics engine.
//!
//! The layout mirrors how the engine stores a compiled model: flat per-kind
//! tables that reference each other by index, and shared data arrays that the
//! mesh and texture tables address by offset and count.

use std::ops::Range;

use crate::SceneError;

#[derive(Clone, Debug, Default)]
pub struct EngineModel {
    /// Body 0 is the world body. Every other body comes after its parent.
    pub bodies: Vec<EngineBody>,
    pub joints: Vec<EngineJoint>,
    pub geoms: Vec<EngineGeom>,
    pub meshes: Vec<EngineMesh>,
    pub materials: Vec<EngineMaterial>,
    pub textures: Vec<EngineTexture>,

    pub mesh_vert: Vec<[f32; 3]>,
    pub mesh_normal: Vec<[f32; 3]>,
    pub mesh_face: Vec<[i32; 3]>,
    pub mesh_texcoord: Vec<[f32; 2]>,
    /// RGB8 pixels of all textures, back to back.
    pub tex_data: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct EngineBody {
    pub name: String,
    pub parent_id: usize,
    /// Relative to the parent body.
    pub position: [f32; 3],
    /// Scalar first, relative to the parent body.
    pub quaternion: [f32; 4],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JointKind {
    Free,
    Ball,
    Slide,
    Hinge,
}

impl JointKind {
    pub fn degrees_of_freedom(&self) -> usize {
        match self {
            JointKind::Free => 6,
            JointKind::Ball => 3,
            JointKind::Slide | JointKind::Hinge => 1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EngineJoint {
    pub name: String,
    pub body_id: usize,
    pub kind: JointKind,
}

/// Geometry type codes as the engine numbers them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineGeomType {
    Plane,
    HeightField,
    Sphere,
    Capsule,
    Ellipsoid,
    Cylinder,
    Box,
    Mesh,
    Sdf,
    Other(i32),
}

impl EngineGeomType {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => EngineGeomType::Plane,
            1 => EngineGeomType::HeightField,
            2 => EngineGeomType::Sphere,
            3 => EngineGeomType::Capsule,
            4 => EngineGeomType::Ellipsoid,
            5 => EngineGeomType::Cylinder,
            6 => EngineGeomType::Box,
            7 => EngineGeomType::Mesh,
            8 => EngineGeomType::Sdf,
            other => EngineGeomType::Other(other),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EngineGeom {
    pub name: String,
    pub body_id: usize,
    pub kind: EngineGeomType,
    pub position: [f32; 3],
    /// Scalar first.
    pub quaternion: [f32; 4],
    /// Primitive size parameters, meaning depends on `kind`.
    pub size: [f32; 3],
    pub rgba: [f32; 4],
    pub group: i32,
    pub material_id: Option<usize>,
    pub mesh_id: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct EngineMesh {
    pub name: String,
    pub vert_adr: usize,
    pub vert_num: usize,
    pub face_adr: usize,
    pub face_num: usize,
    pub texcoord_adr: Option<usize>,
    pub texcoord_num: usize,
}

#[derive(Clone, Debug)]
pub struct EngineMaterial {
    pub name: String,
    pub rgba: [f32; 4],
    pub emission: f32,
    pub specular: f32,
    pub shininess: f32,
    pub reflectance: f32,
    pub texture_id: Option<usize>,
    pub texrepeat: [f32; 2],
}

#[derive(Clone, Debug)]
pub struct EngineTexture {
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// Byte offset into [`EngineModel::tex_data`].
    pub adr: usize,
}

impl EngineTexture {
    pub const CHANNELS: usize = 3;

    pub fn byte_len(&self) -> usize {
        self.width * self.height * Self::CHANNELS
    }
}

impl EngineModel {
    pub fn mesh_vertices(&self, mesh: &EngineMesh) -> Result<&[[f32; 3]], SceneError> {
        region(&self.mesh_vert, mesh.vert_adr, mesh.vert_num, &mesh.name, "vertex")
    }

    pub fn mesh_normals(&self, mesh: &EngineMesh) -> Result<&[[f32; 3]], SceneError> {
        region(&self.mesh_normal, mesh.vert_adr, mesh.vert_num, &mesh.name, "normal")
    }

    pub fn mesh_faces(&self, mesh: &EngineMesh) -> Result<&[[i32; 3]], SceneError> {
        region(&self.mesh_face, mesh.face_adr, mesh.face_num, &mesh.name, "face")
    }

    pub fn mesh_texcoords(&self, mesh: &EngineMesh) -> Result<Option<&[[f32; 2]]>, SceneError> {
        match mesh.texcoord_adr {
            Some(adr) => {
                region(&self.mesh_texcoord, adr, mesh.texcoord_num, &mesh.name, "texcoord")
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    pub fn texture_pixels(&self, texture: &EngineTexture) -> Result<&[u8], SceneError> {
        region(&self.tex_data, texture.adr, texture.byte_len(), &texture.name, "pixel")
    }

    /// Total degrees of freedom of the joints attached to `body_id`.
    pub fn body_dofs(&self, body_id: usize) -> usize {
        self.joints
            .iter()
            .filter(|joint| joint.body_id == body_id)
            .map(|joint| joint.kind.degrees_of_freedom())
            .sum()
    }
}

fn region<'a, T>(
    data: &'a [T],
    start: usize,
    count: usize,
    owner: &str,
    what: &str,
) -> Result<&'a [T], SceneError> {
    let range: Range<usize> = start..start.saturating_add(count);
    data.get(range.clone()).ok_or_else(|| {
        SceneError::MalformedModel(format!(
            "{what} data of {owner} spans {range:?}, but only {} entries exist",
            data.len()
        ))
    })
}

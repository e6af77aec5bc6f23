//! A stand-in for the physics engine: a compiled model with a hinged arm, and
//! the world poses of its bodies as the arm swings.

use scene_common::{
    engine::{
        EngineBody, EngineGeom, EngineGeomType, EngineJoint, EngineMaterial, EngineMesh,
        EngineModel, EngineTexture, JointKind,
    },
    scene::{CubeGeometry, SceneGraph},
    transform::{axis_rotation, Transform},
};
use ultraviolet::Vec3;

const GRAVITY: f32 = 9.81;
const ARM_LENGTH: f32 = 0.8;
const ARM_BODY: &str = "arm";

const IDENTITY: [f32; 4] = [1.0, 0.0, 0.0, 0.0];

pub fn model() -> EngineModel {
    let cube = CubeGeometry::new();
    let mut model = EngineModel {
        bodies: vec![
            EngineBody {
                name: "world".into(),
                parent_id: 0,
                position: [0.0; 3],
                quaternion: IDENTITY,
            },
            EngineBody {
                name: "stand".into(),
                parent_id: 0,
                position: [0.0, 0.0, 1.0],
                quaternion: IDENTITY,
            },
            EngineBody {
                name: ARM_BODY.into(),
                parent_id: 1,
                position: [0.0, 0.0, 1.0],
                quaternion: IDENTITY,
            },
            // Welded to the arm, so it moves without being movable itself.
            EngineBody {
                name: "bob".into(),
                parent_id: 2,
                position: [0.0, 0.0, -ARM_LENGTH],
                quaternion: IDENTITY,
            },
        ],
        joints: vec![EngineJoint {
            name: "pivot".into(),
            body_id: 2,
            kind: JointKind::Hinge,
        }],
        meshes: vec![EngineMesh {
            name: "bob_cube".into(),
            vert_adr: 0,
            vert_num: cube.vertices.len(),
            face_adr: 0,
            face_num: cube.faces.len(),
            texcoord_adr: Some(0),
            texcoord_num: cube.uvs.len(),
        }],
        textures: vec![EngineTexture {
            name: "checker".into(),
            width: 2,
            height: 2,
            adr: 0,
        }],
        materials: vec![EngineMaterial {
            name: "ground".into(),
            rgba: [1.0; 4],
            emission: 0.0,
            specular: 0.2,
            shininess: 0.1,
            reflectance: 0.0,
            texture_id: Some(0),
            texrepeat: [10.0, 10.0],
        }],
        tex_data: [[230u8, 230, 230], [60, 60, 70], [60, 60, 70], [230, 230, 230]]
            .into_iter()
            .flatten()
            .collect(),
        ..Default::default()
    };
    model.mesh_vert = cube.vertices;
    model.mesh_normal = cube.normals;
    model.mesh_face = cube.faces;
    model.mesh_texcoord = cube.uvs;

    let geom = |name: &str, body_id: usize, kind: EngineGeomType, size: [f32; 3], rgba: [f32; 4]| {
        EngineGeom {
            name: name.into(),
            body_id,
            kind,
            position: [0.0; 3],
            quaternion: IDENTITY,
            size,
            rgba,
            group: 0,
            material_id: None,
            mesh_id: None,
        }
    };

    let mut ground = geom("ground", 0, EngineGeomType::Plane, [5.0, 5.0, 0.1], [1.0; 4]);
    ground.material_id = Some(0);
    let mut rod = geom(
        "rod",
        2,
        EngineGeomType::Cylinder,
        [0.02, ARM_LENGTH / 2.0, 0.0],
        [0.7, 0.7, 0.7, 1.0],
    );
    rod.position = [0.0, 0.0, -ARM_LENGTH / 2.0];
    let mut bob = geom("bob", 3, EngineGeomType::Mesh, [0.0; 3], [0.9, 0.3, 0.1, 1.0]);
    bob.mesh_id = Some(0);
    let mut collision = geom(
        "bob_collision",
        3,
        EngineGeomType::Sphere,
        [0.1, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.3],
    );
    collision.group = 3;

    model.geoms = vec![
        ground,
        geom("stand", 1, EngineGeomType::Box, [0.05, 0.05, 0.5], [0.3, 0.3, 0.35, 1.0]),
        rod,
        bob,
        collision,
    ];
    model
}

/// Swings the arm around the hinge's y axis.
pub struct Pendulum {
    angle: f32,
    velocity: f32,
}

impl Pendulum {
    pub fn new(angle: f32) -> Self {
        Self {
            angle,
            velocity: 0.0,
        }
    }

    pub fn step(&mut self, dt: f32) {
        let acceleration = -GRAVITY / ARM_LENGTH * self.angle.sin();
        self.velocity += acceleration * dt;
        self.angle += self.velocity * dt;
    }

    /// World poses by node id, in the same order as the graph.
    pub fn world_poses(&self, graph: &SceneGraph) -> Vec<Transform> {
        let mut world: Vec<Transform> = Vec::with_capacity(graph.len());
        for node in graph.iter() {
            let mut local = node.transform;
            if node.name == ARM_BODY {
                local.orientation = local.orientation * axis_rotation(Vec3::unit_y(), self.angle);
            }
            let pose = match node.parent {
                Some(parent) => world[parent].compose(&local),
                None => local,
            };
            world.push(pose);
        }
        world
    }
}

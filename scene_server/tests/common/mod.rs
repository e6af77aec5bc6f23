#![allow(dead_code)]

use scene_common::{
    engine::{
        EngineBody, EngineGeom, EngineGeomType, EngineJoint, EngineMaterial, EngineMesh,
        EngineModel, EngineTexture, JointKind,
    },
    scene::CubeGeometry,
};

pub const COLLISION_GROUP: i32 = 3;

fn body(name: &str, parent_id: usize, position: [f32; 3]) -> EngineBody {
    EngineBody {
        name: name.into(),
        parent_id,
        position,
        quaternion: [1.0, 0.0, 0.0, 0.0],
    }
}

fn geom(name: &str, body_id: usize, kind: EngineGeomType, size: [f32; 3]) -> EngineGeom {
    EngineGeom {
        name: name.into(),
        body_id,
        kind,
        position: [0.0; 3],
        quaternion: [1.0, 0.0, 0.0, 0.0],
        size,
        rgba: [0.8, 0.8, 0.8, 1.0],
        group: 0,
        material_id: None,
        mesh_id: None,
    }
}

fn push_cube(model: &mut EngineModel, name: &str) -> usize {
    let cube = CubeGeometry::new();
    let mesh = EngineMesh {
        name: name.into(),
        vert_adr: model.mesh_vert.len(),
        vert_num: cube.vertices.len(),
        face_adr: model.mesh_face.len(),
        face_num: cube.faces.len(),
        texcoord_adr: Some(model.mesh_texcoord.len()),
        texcoord_num: cube.uvs.len(),
    };
    model.mesh_vert.extend_from_slice(&cube.vertices);
    model.mesh_normal.extend_from_slice(&cube.normals);
    model.mesh_face.extend_from_slice(&cube.faces);
    model.mesh_texcoord.extend_from_slice(&cube.uvs);
    model.meshes.push(mesh);
    model.meshes.len() - 1
}

/// A world with a floor, a fixed base, a hinged arm and a tip welded to the
/// arm. The arm and the tip each carry a cube mesh; both meshes have the same
/// bytes.
pub fn arm_model() -> EngineModel {
    let mut model = EngineModel {
        bodies: vec![
            body("world", 0, [0.0; 3]),
            body("base", 0, [0.0, 0.0, 0.5]),
            body("arm", 1, [0.0, 0.0, 0.5]),
            body("tip", 2, [0.0, 0.0, 1.0]),
        ],
        joints: vec![EngineJoint {
            name: "shoulder".into(),
            body_id: 2,
            kind: JointKind::Hinge,
        }],
        ..Default::default()
    };

    let arm_mesh = push_cube(&mut model, "arm_cube");
    let tip_mesh = push_cube(&mut model, "tip_cube");

    model.tex_data = [[255u8, 255, 255], [40, 40, 40], [40, 40, 40], [255, 255, 255]]
        .into_iter()
        .flatten()
        .collect();
    model.textures.push(EngineTexture {
        name: "checker".into(),
        width: 2,
        height: 2,
        adr: 0,
    });
    model.materials.push(EngineMaterial {
        name: "floor".into(),
        rgba: [1.0; 4],
        emission: 0.0,
        specular: 0.3,
        shininess: 0.2,
        reflectance: 0.1,
        texture_id: Some(0),
        texrepeat: [8.0, 8.0],
    });

    let mut floor = geom("floor", 0, EngineGeomType::Plane, [5.0, 5.0, 0.1]);
    floor.material_id = Some(0);
    let mut arm_visual = geom("arm_visual", 2, EngineGeomType::Mesh, [0.0; 3]);
    arm_visual.mesh_id = Some(arm_mesh);
    let mut tip_visual = geom("tip_visual", 3, EngineGeomType::Mesh, [0.0; 3]);
    tip_visual.mesh_id = Some(tip_mesh);
    let mut arm_collision = geom("arm_collision", 2, EngineGeomType::Capsule, [0.05, 0.5, 0.0]);
    arm_collision.group = COLLISION_GROUP;

    model.geoms = vec![
        floor,
        geom("base_box", 1, EngineGeomType::Box, [0.2, 0.2, 0.25]),
        geom("arm_rod", 2, EngineGeomType::Cylinder, [0.05, 0.5, 0.0]),
        arm_visual,
        tip_visual,
        arm_collision,
    ];
    model
}

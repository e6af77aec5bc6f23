use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use bytes::Bytes;
use scene_common::{
    engine::{EngineGeom, EngineGeomType, EngineMesh, EngineModel},
    scene::{
        CompiledScene, GeometryKind, MaterialEntry, MeshData, MeshEntry, SceneGraph,
        TextureEntry, Visual,
    },
    transform::Transform,
    AssetStore, ContentHash, SceneError,
};
use ultraviolet::Vec3;

struct SceneBuildingData<'a> {
    model: &'a EngineModel,
    graph: SceneGraph,
    assets: AssetStore,
    meshes: Vec<MeshEntry>,
    materials: Vec<MaterialEntry>,
    textures: Vec<TextureEntry>,
    /// Catalog names by engine id.
    mesh_names: Vec<String>,
    material_names: Vec<String>,
    texture_names: Vec<String>,
    used_material_names: HashSet<String>,
    /// Catalog name of each plain color material, keyed by its color name.
    color_materials: HashMap<String, String>,
}

impl<'a> SceneBuildingData<'a> {
    fn new(model: &'a EngineModel) -> Self {
        Self {
            model,
            graph: SceneGraph::new(),
            assets: AssetStore::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
            mesh_names: Vec::new(),
            material_names: Vec::new(),
            texture_names: Vec::new(),
            used_material_names: HashSet::new(),
            color_materials: HashMap::new(),
        }
    }
}

/// Turns a compiled engine model into a scene graph plus catalogs, with every
/// binary payload registered in a fresh asset store.
///
/// Either the whole scene is built or an error is returned.
pub fn build_scene(model: &EngineModel) -> Result<CompiledScene, SceneError> {
    let mut data = SceneBuildingData::new(model);

    load_textures(&mut data)?;
    load_materials(&mut data)?;
    load_meshes(&mut data)?;
    load_bodies(&mut data)?;
    for (geom_id, geom) in model.geoms.iter().enumerate() {
        load_geom(&mut data, geom_id, geom)?;
    }
    for joint in model.joints.iter() {
        if joint.body_id >= model.bodies.len() {
            return Err(SceneError::UnknownBody(format!(
                "{} (joint {})",
                joint.body_id, joint.name
            )));
        }
    }

    let id = ContentHash::of(&bincode::serialize(&data.graph)?);
    let scene = CompiledScene {
        id,
        graph: data.graph,
        meshes: data.meshes,
        materials: data.materials,
        textures: data.textures,
        assets: Arc::new(data.assets),
    };
    scene.validate_references()?;

    log::info!(
        "Compiled scene {}: {} bodies, {} meshes, {} materials, {} textures, {} unique assets ({} bytes)",
        scene.id,
        scene.graph.len(),
        scene.meshes.len(),
        scene.materials.len(),
        scene.textures.len(),
        scene.assets.len(),
        scene.assets.total_bytes()
    );
    Ok(scene)
}

fn load_textures(data: &mut SceneBuildingData) -> Result<(), SceneError> {
    let model = data.model;
    let mut names = HashSet::new();
    for (texture_id, texture) in model.textures.iter().enumerate() {
        let name = unique_name(&mut names, &texture.name, || format!("texture_{texture_id}"))?;
        let pixels = model.texture_pixels(texture)?;
        let hash = data.assets.insert(Bytes::copy_from_slice(pixels));
        data.textures.push(TextureEntry::new_2d(
            name.clone(),
            hash,
            texture.width,
            texture.height,
        ));
        data.texture_names.push(name);
    }
    Ok(())
}

fn load_materials(data: &mut SceneBuildingData) -> Result<(), SceneError> {
    let model = data.model;
    for (material_id, material) in model.materials.iter().enumerate() {
        let name = unique_name(&mut data.used_material_names, &material.name, || {
            format!("material_{material_id}")
        })?;
        let texture = match material.texture_id {
            Some(texture_id) => Some(
                data.texture_names
                    .get(texture_id)
                    .cloned()
                    .ok_or_else(|| {
                        SceneError::MalformedModel(format!(
                            "material {name} uses texture {texture_id}, but only {} exist",
                            data.texture_names.len()
                        ))
                    })?,
            ),
            None => None,
        };
        data.materials.push(MaterialEntry {
            name: name.clone(),
            color: material.rgba,
            emission: material.emission,
            specular: material.specular,
            shininess: material.shininess,
            reflectance: material.reflectance,
            texture,
            texrepeat: material.texrepeat,
        });
        data.material_names.push(name);
    }
    Ok(())
}

fn load_meshes(data: &mut SceneBuildingData) -> Result<(), SceneError> {
    let model = data.model;
    let mut names = HashSet::new();
    for (mesh_id, mesh) in model.meshes.iter().enumerate() {
        let name = unique_name(&mut names, &mesh.name, || format!("mesh_{mesh_id}"))?;
        let mesh_data = MeshData {
            vertices: model.mesh_vertices(mesh)?,
            normals: model.mesh_normals(mesh)?,
            faces: model.mesh_faces(mesh)?,
            uvs: model.mesh_texcoords(mesh)?,
        };
        check_faces(mesh, &mesh_data)?;

        let encoded = mesh_data.encode();
        let hash = data.assets.insert(encoded.bytes);
        log::debug!("Mesh {name} stored as {hash}");
        data.meshes.push(MeshEntry {
            name: name.clone(),
            hash,
            vertex_layout: encoded.vertex_layout,
            normal_layout: encoded.normal_layout,
            index_layout: encoded.index_layout,
            uv_layout: encoded.uv_layout,
        });
        data.mesh_names.push(name);
    }
    Ok(())
}

fn check_faces(mesh: &EngineMesh, mesh_data: &MeshData) -> Result<(), SceneError> {
    let vertex_count = mesh_data.vertices.len();
    let out_of_range = mesh_data
        .faces
        .iter()
        .flatten()
        .find(|index| usize::try_from(**index).map_or(true, |index| index >= vertex_count));
    match out_of_range {
        Some(index) => Err(SceneError::MalformedModel(format!(
            "mesh {} references vertex {index}, but has {vertex_count}",
            mesh.name
        ))),
        None => Ok(()),
    }
}

fn load_bodies(data: &mut SceneBuildingData) -> Result<(), SceneError> {
    let model = data.model;
    if model.bodies.is_empty() {
        return Err(SceneError::MalformedModel("model has no bodies".into()));
    }

    let mut names = HashSet::new();
    for (body_id, body) in model.bodies.iter().enumerate() {
        let name = unique_name(&mut names, &body.name, || format!("body_{body_id}"))?;
        // Body 0 is the world and has no parent of its own.
        let parent = if body_id == 0 {
            None
        } else if body.parent_id < body_id {
            Some(body.parent_id)
        } else {
            return Err(SceneError::MalformedModel(format!(
                "body {name} comes before its parent {}",
                body.parent_id
            )));
        };
        let transform = Transform::from_engine(body.position, body.quaternion);
        let movable = body_id != 0 && model.body_dofs(body_id) > 0;
        data.graph.push(name, parent, transform, movable);
    }
    Ok(())
}

fn load_geom(data: &mut SceneBuildingData, geom_id: usize, geom: &EngineGeom) -> Result<(), SceneError> {
    let name = if geom.name.is_empty() {
        format!("geom_{geom_id}")
    } else {
        geom.name.clone()
    };
    if geom.body_id >= data.graph.len() {
        return Err(SceneError::UnknownBody(format!(
            "{} (geometry {name})",
            geom.body_id
        )));
    }

    let kind = geometry_kind(&name, geom.kind)?;
    let mesh = if kind == GeometryKind::Mesh {
        let mesh_name = geom
            .mesh_id
            .and_then(|mesh_id| data.mesh_names.get(mesh_id))
            .cloned()
            .ok_or_else(|| {
                SceneError::MalformedModel(format!(
                    "mesh geometry {name} references mesh {:?}, but only {} exist",
                    geom.mesh_id,
                    data.mesh_names.len()
                ))
            })?;
        Some(mesh_name)
    } else {
        None
    };

    let material = match geom.material_id {
        Some(material_id) => data.material_names.get(material_id).cloned().ok_or_else(|| {
            SceneError::MalformedModel(format!(
                "geometry {name} uses material {material_id}, but only {} exist",
                data.material_names.len()
            ))
        })?,
        None => color_material(data, geom.rgba),
    };

    let scale = if kind == GeometryKind::Mesh {
        Vec3::one()
    } else {
        Vec3::from(geom.size)
    };
    let transform = Transform::from_engine(geom.position, geom.quaternion).with_scale(scale);

    data.graph.attach_visual(
        geom.body_id,
        Visual {
            name,
            kind,
            mesh,
            material: Some(material),
            transform,
            group: geom.group,
        },
    );
    Ok(())
}

/// Registers a material for a plain color the first time it shows up. Colors
/// that are equal at 8 bits per channel share it. A name already taken by an
/// engine material gets a numeric suffix.
fn color_material(data: &mut SceneBuildingData, rgba: [f32; 4]) -> String {
    let color_name = MaterialEntry::color_name(rgba);
    if let Some(name) = data.color_materials.get(&color_name) {
        return name.clone();
    }

    let mut name = color_name.clone();
    let mut suffix = 1;
    while !data.used_material_names.insert(name.clone()) {
        name = format!("{color_name}_{suffix}");
        suffix += 1;
    }
    data.materials.push(MaterialEntry {
        name: name.clone(),
        ..MaterialEntry::from_color(rgba)
    });
    data.color_materials.insert(color_name, name.clone());
    name
}

fn geometry_kind(name: &str, kind: EngineGeomType) -> Result<GeometryKind, SceneError> {
    match kind {
        EngineGeomType::Plane => Ok(GeometryKind::Plane),
        EngineGeomType::Sphere => Ok(GeometryKind::Sphere),
        EngineGeomType::Capsule | EngineGeomType::Ellipsoid => Ok(GeometryKind::Capsule),
        EngineGeomType::Cylinder => Ok(GeometryKind::Cylinder),
        EngineGeomType::Box => Ok(GeometryKind::Cube),
        EngineGeomType::Mesh => Ok(GeometryKind::Mesh),
        EngineGeomType::HeightField | EngineGeomType::Sdf | EngineGeomType::Other(_) => {
            Err(SceneError::UnsupportedPrimitive {
                geom: name.to_string(),
                kind: format!("{kind:?}"),
            })
        }
    }
}

fn unique_name(
    names: &mut HashSet<String>,
    name: &str,
    fallback: impl FnOnce() -> String,
) -> Result<String, SceneError> {
    let name = if name.is_empty() {
        fallback()
    } else {
        name.to_string()
    };
    if !names.insert(name.clone()) {
        return Err(SceneError::MalformedModel(format!("duplicate name {name}")));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use scene_common::engine::{EngineBody, EngineJoint, EngineMaterial, EngineTexture, JointKind};

    use super::*;

    fn body(name: &str, parent_id: usize) -> EngineBody {
        EngineBody {
            name: name.into(),
            parent_id,
            position: [0.0; 3],
            quaternion: [1.0, 0.0, 0.0, 0.0],
        }
    }

    fn geom(name: &str, body_id: usize, kind: EngineGeomType) -> EngineGeom {
        EngineGeom {
            name: name.into(),
            body_id,
            kind,
            position: [0.0; 3],
            quaternion: [1.0, 0.0, 0.0, 0.0],
            size: [0.1, 0.2, 0.3],
            rgba: [1.0, 0.0, 0.0, 1.0],
            group: 0,
            material_id: None,
            mesh_id: None,
        }
    }

    fn two_body_model() -> EngineModel {
        EngineModel {
            bodies: vec![body("world", 0), body("arm", 0)],
            joints: vec![EngineJoint {
                name: "hinge".into(),
                body_id: 1,
                kind: JointKind::Hinge,
            }],
            geoms: vec![
                geom("floor", 0, EngineGeomType::Plane),
                geom("", 1, EngineGeomType::Box),
                geom("tip", 1, EngineGeomType::Sphere),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn bodies_and_visuals() {
        let scene = build_scene(&two_body_model()).unwrap();
        assert_eq!(scene.graph.len(), 2);
        let arm = scene.graph.find("arm").unwrap();
        assert!(arm.movable);
        assert!(!scene.graph.root().unwrap().movable);
        assert_eq!(arm.visuals[0].name, "geom_1");
        assert_eq!(arm.visuals[0].kind, GeometryKind::Cube);
        assert_eq!(arm.visuals[0].transform.scale, Vec3::new(0.1, 0.2, 0.3));
        // All three geoms share one color.
        assert_eq!(scene.materials.len(), 1);
        assert_eq!(scene.materials[0].name, "color_ff0000ff");
    }

    #[test]
    fn scene_id_is_stable() {
        let a = build_scene(&two_body_model()).unwrap();
        let b = build_scene(&two_body_model()).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn materials_resolve_textures() {
        let mut model = two_body_model();
        model.tex_data = vec![255; 2 * 2 * 3];
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
            specular: 0.5,
            shininess: 0.5,
            reflectance: 0.0,
            texture_id: Some(0),
            texrepeat: [4.0, 4.0],
        });
        model.geoms[0].material_id = Some(0);

        let scene = build_scene(&model).unwrap();
        assert_eq!(scene.material("floor").unwrap().texture.as_deref(), Some("checker"));
        let texture = scene.texture("checker").unwrap();
        assert_eq!(scene.assets.get(&texture.hash).unwrap().len(), 12);
        let floor = &scene.graph.root().unwrap().visuals[0];
        assert_eq!(floor.material.as_deref(), Some("floor"));
    }

    #[test]
    fn color_materials_do_not_take_over_engine_materials() {
        let mut model = two_body_model();
        model.materials.push(EngineMaterial {
            name: "color_ff0000ff".into(),
            rgba: [0.0, 0.0, 1.0, 1.0],
            emission: 1.0,
            specular: 0.0,
            shininess: 0.0,
            reflectance: 0.0,
            texture_id: None,
            texrepeat: [1.0, 1.0],
        });
        model.geoms[0].material_id = Some(0);

        let scene = build_scene(&model).unwrap();
        assert_eq!(scene.materials.len(), 2);
        let engine = scene.material("color_ff0000ff").unwrap();
        assert_eq!(engine.emission, 1.0);
        let color = scene.material("color_ff0000ff_1").unwrap();
        assert_eq!(color.color, [1.0, 0.0, 0.0, 1.0]);

        let arm = scene.graph.find("arm").unwrap();
        assert!(arm
            .visuals
            .iter()
            .all(|visual| visual.material.as_deref() == Some("color_ff0000ff_1")));
        assert_eq!(
            scene.graph.root().unwrap().visuals[0].material.as_deref(),
            Some("color_ff0000ff")
        );
    }

    #[test]
    fn unsupported_primitives_fail() {
        let mut model = two_body_model();
        model.geoms.push(geom("terrain", 0, EngineGeomType::HeightField));
        assert!(matches!(
            build_scene(&model),
            Err(SceneError::UnsupportedPrimitive { geom, .. }) if geom == "terrain"
        ));
    }

    #[test]
    fn forward_parents_are_malformed() {
        let mut model = two_body_model();
        model.bodies.push(body("late", 5));
        assert!(matches!(build_scene(&model), Err(SceneError::MalformedModel(_))));
    }

    #[test]
    fn geoms_on_missing_bodies_fail() {
        let mut model = two_body_model();
        model.geoms.push(geom("ghost", 9, EngineGeomType::Sphere));
        assert!(matches!(build_scene(&model), Err(SceneError::UnknownBody(_))));
    }

    #[test]
    fn out_of_range_faces_are_malformed() {
        let mut model = two_body_model();
        model.mesh_vert = vec![[0.0; 3]; 3];
        model.mesh_normal = vec![[0.0, 0.0, 1.0]; 3];
        model.mesh_face = vec![[0, 1, 3]];
        model.meshes.push(EngineMesh {
            name: "broken".into(),
            vert_adr: 0,
            vert_num: 3,
            face_adr: 0,
            face_num: 1,
            texcoord_adr: None,
            texcoord_num: 0,
        });
        assert!(matches!(build_scene(&model), Err(SceneError::MalformedModel(_))));
    }
}

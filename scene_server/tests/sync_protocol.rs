mod common;

use std::{collections::HashSet, sync::Arc, time::Duration};

use common::{arm_model, COLLISION_GROUP};
use scene_common::{
    coordinates::AxisConvention,
    protocol::{frame_topic, ServerMessage},
    scene::{CompiledScene, GeometryKind},
    transform::Transform,
};
use scene_server::{
    build_scene,
    web::{ClientSession, SyncState},
};
use tokio::time::timeout;
use ultraviolet::Vec3;

fn compiled() -> Arc<CompiledScene> {
    Arc::new(build_scene(&arm_model()).unwrap())
}

fn published_state() -> Arc<SyncState> {
    let state = Arc::new(SyncState::new(AxisConvention::Y_UP, vec![COLLISION_GROUP]));
    state.publish(compiled()).unwrap();
    state
}

fn drain(session: &mut ClientSession) -> Vec<String> {
    let mut frames = Vec::new();
    while let Some(frame) = session.try_recv() {
        frames.push(frame.to_string());
    }
    frames
}

fn topics(frames: &[String]) -> Vec<&str> {
    frames.iter().filter_map(|frame| frame_topic(frame)).collect()
}

async fn connect(state: &SyncState) -> ClientSession {
    timeout(Duration::from_secs(1), state.connect())
        .await
        .expect("handshake timed out")
        .unwrap()
}

#[tokio::test]
async fn client_waits_for_first_compile() {
    let state = Arc::new(SyncState::new(AxisConvention::Y_UP, vec![COLLISION_GROUP]));
    let waiting = tokio::spawn({
        let state = state.clone();
        async move { state.connect().await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiting.is_finished());
    assert_eq!(state.client_count(), 0);

    state.publish(compiled()).unwrap();
    let mut session = timeout(Duration::from_secs(1), waiting)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let frames = drain(&mut session);
    assert_eq!(topics(&frames)[0], "RESET");
    assert_eq!(state.client_count(), 1);
}

#[tokio::test]
async fn handshake_sends_catalogs_before_objects() {
    let state = published_state();
    let mut session = connect(&state).await;
    let frames = drain(&mut session);
    let topics = topics(&frames);

    assert_eq!(topics[0], "RESET");
    assert_eq!(topics.iter().filter(|topic| **topic == "RESET").count(), 1);
    let first_object = topics
        .iter()
        .position(|topic| *topic == "CREATE_OBJECT")
        .unwrap();
    assert!(topics[1..first_object]
        .iter()
        .all(|topic| topic.starts_with("LOAD_")));
    assert!(topics[first_object..]
        .iter()
        .all(|topic| *topic == "CREATE_OBJECT"));
    assert_eq!(
        topics.iter().filter(|topic| **topic == "LOAD_MESH").count(),
        2
    );
    assert_eq!(
        topics.iter().filter(|topic| **topic == "LOAD_TEXTURE").count(),
        1
    );
    // A body and its axis node for each of the four bodies.
    assert_eq!(topics.len() - first_object, 8);
}

#[tokio::test]
async fn objects_are_created_after_their_parents() {
    let state = published_state();
    let mut session = connect(&state).await;

    let mut created = HashSet::new();
    for frame in drain(&mut session) {
        if let ServerMessage::CreateObject(object) = ServerMessage::decode(&frame).unwrap() {
            if let Some(parent) = &object.parent {
                assert!(created.contains(parent), "{} before {parent}", object.name);
            }
            created.insert(object.name);
        }
    }
    assert!(created.contains("arm/visuals"));
}

#[tokio::test]
async fn mesh_visuals_hang_off_the_axis_node() {
    let state = published_state();
    let mut session = connect(&state).await;

    let objects: Vec<_> = drain(&mut session)
        .iter()
        .filter_map(|frame| match ServerMessage::decode(frame).unwrap() {
            ServerMessage::CreateObject(object) => Some(object),
            _ => None,
        })
        .collect();
    let arm_index = objects.iter().position(|object| object.name == "arm").unwrap();
    let arm = &objects[arm_index];
    let axis = &objects[arm_index + 1];

    assert_eq!(axis.name, "arm/visuals");
    assert_eq!(axis.parent.as_deref(), Some("arm"));
    assert_eq!(axis.visuals.len(), 1);
    assert_eq!(axis.visuals[0].kind, GeometryKind::Mesh);
    assert_eq!(axis.visuals[0].mesh.as_deref(), Some("arm_cube"));

    // The collision capsule is hidden, only the rod remains.
    assert_eq!(arm.visuals.len(), 1);
    assert_eq!(arm.visuals[0].kind, GeometryKind::Cylinder);
    // Radius 0.05 and half height 0.5 become a unit cylinder scaled to
    // (0.05, 0.05, 1.0), with the height along the viewer's y axis.
    let scale = arm.visuals[0].transform.scale;
    assert!((scale[0] - 0.05).abs() < 1e-6);
    assert!((scale[1] - 1.0).abs() < 1e-6);
    assert!((scale[2] - 0.05).abs() < 1e-6);
}

#[tokio::test]
async fn rapid_updates_coalesce_into_one_entry() {
    let state = published_state();
    let mut session = connect(&state).await;
    drain(&mut session);

    state
        .update_transform("arm", Transform::from_position(Vec3::new(0.0, 0.0, 0.5)))
        .unwrap();
    state
        .update_transform("arm", Transform::from_position(Vec3::new(1.0, 2.0, 3.0)))
        .unwrap();
    assert_eq!(state.flush().unwrap(), 1);

    let frames = drain(&mut session);
    assert_eq!(frames.len(), 1);
    match ServerMessage::decode(&frames[0]).unwrap() {
        ServerMessage::UpdateTransform(updates) => {
            assert_eq!(updates.len(), 1);
            // Engine z-up (1, 2, 3) is viewer y-up (1, 3, -2).
            assert_eq!(updates["arm"].position, [1.0, 3.0, -2.0]);
        }
        other => panic!("unexpected {other:?}"),
    }

    // Nothing new, nothing sent.
    assert_eq!(state.flush().unwrap(), 0);
    assert!(drain(&mut session).is_empty());
}

#[tokio::test]
async fn disconnected_client_is_dropped_on_next_flush() {
    let state = published_state();
    let mut staying = connect(&state).await;
    let leaving = connect(&state).await;
    drain(&mut staying);
    assert_eq!(state.client_count(), 2);

    // The handler marks the session closed when a send on its socket fails.
    leaving.close();
    state.update_transform("arm", Transform::default()).unwrap();
    state.flush().unwrap();

    assert_eq!(state.client_count(), 1);
    assert_eq!(state.client_ids(), vec![staying.id()]);
    assert_eq!(topics(&drain(&mut staying)), ["UPDATE_TRANSFORM"]);
}

#[tokio::test]
async fn dropped_session_is_pruned_even_without_updates() {
    let state = published_state();
    let session = connect(&state).await;
    drop(session);
    state.flush().unwrap();
    assert_eq!(state.client_count(), 0);
}

#[tokio::test]
async fn late_clients_see_the_same_handshake() {
    let state = published_state();
    let mut first = connect(&state).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    let mut second = connect(&state).await;
    assert_eq!(drain(&mut first), drain(&mut second));
}

#[tokio::test]
async fn late_clients_start_from_the_latest_pose() {
    let state = published_state();
    let mut first = connect(&state).await;
    let first_handshake = drain(&mut first);

    let moved = Transform::from_position(Vec3::new(0.0, 0.0, 2.0));
    state.update_transform("arm", moved).unwrap();
    state.flush().unwrap();

    let mut second = connect(&state).await;
    let second_handshake = drain(&mut second);
    assert_eq!(topics(&first_handshake), topics(&second_handshake));

    let arm = second_handshake
        .iter()
        .find_map(|frame| match ServerMessage::decode(frame).unwrap() {
            ServerMessage::CreateObject(object) if object.name == "arm" => Some(object),
            _ => None,
        })
        .unwrap();
    assert_eq!(arm.transform.position, [0.0, 2.0, 0.0]);
}

#[tokio::test]
async fn recompile_resets_every_client() {
    let state = published_state();
    let mut session = connect(&state).await;
    let handshake = drain(&mut session);

    state.update_transform("arm", Transform::default()).unwrap();
    state.publish(compiled()).unwrap();
    assert_eq!(state.pending_updates(), 0);
    assert_eq!(drain(&mut session), handshake);
}

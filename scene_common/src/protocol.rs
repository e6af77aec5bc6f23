//! Messages on the control channel.
//!
//! Every frame is a text frame `TOPIC:payload`, where the payload is JSON
//! (empty for `RESET`). The server only ever sends; clients do not need to
//! talk back beyond closing the connection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    scene::{GeometryKind, MaterialEntry, MeshEntry, TextureEntry},
    transform::Transform,
};

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("frame has no topic separator")]
    MissingTopic,
    #[error("unknown topic {0}")]
    UnknownTopic(String),
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// A transform as the viewer reads it. The quaternion is `[x, y, z, w]`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct WireTransform {
    pub position: [f32; 3],
    pub quaternion: [f32; 4],
    pub scale: [f32; 3],
}

impl From<&Transform> for WireTransform {
    fn from(transform: &Transform) -> Self {
        Self {
            position: transform.position.into(),
            quaternion: transform.quaternion(),
            scale: transform.scale.into(),
        }
    }
}

impl From<Transform> for WireTransform {
    fn from(transform: Transform) -> Self {
        Self::from(&transform)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct VisualRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GeometryKind,
    pub mesh: Option<String>,
    pub material: Option<String>,
    pub transform: WireTransform,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ObjectRecord {
    pub name: String,
    pub parent: Option<String>,
    pub transform: WireTransform,
    pub visuals: Vec<VisualRecord>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ServerMessage {
    Reset,
    LoadMesh(MeshEntry),
    LoadTexture(TextureEntry),
    LoadMaterial(MaterialEntry),
    CreateObject(ObjectRecord),
    UpdateTransform(BTreeMap<String, WireTransform>),
}

impl ServerMessage {
    pub fn topic(&self) -> &'static str {
        match self {
            ServerMessage::Reset => "RESET",
            ServerMessage::LoadMesh(_) => "LOAD_MESH",
            ServerMessage::LoadTexture(_) => "LOAD_TEXTURE",
            ServerMessage::LoadMaterial(_) => "LOAD_MATERIAL",
            ServerMessage::CreateObject(_) => "CREATE_OBJECT",
            ServerMessage::UpdateTransform(_) => "UPDATE_TRANSFORM",
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let payload = match self {
            ServerMessage::Reset => String::new(),
            ServerMessage::LoadMesh(mesh) => serde_json::to_string(mesh)?,
            ServerMessage::LoadTexture(texture) => serde_json::to_string(texture)?,
            ServerMessage::LoadMaterial(material) => serde_json::to_string(material)?,
            ServerMessage::CreateObject(object) => serde_json::to_string(object)?,
            ServerMessage::UpdateTransform(transforms) => serde_json::to_string(transforms)?,
        };
        Ok(format!("{}:{}", self.topic(), payload))
    }

    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let (topic, payload) = frame.split_once(':').ok_or(ProtocolError::MissingTopic)?;
        let message = match topic {
            "RESET" => ServerMessage::Reset,
            "LOAD_MESH" => ServerMessage::LoadMesh(serde_json::from_str(payload)?),
            "LOAD_TEXTURE" => ServerMessage::LoadTexture(serde_json::from_str(payload)?),
            "LOAD_MATERIAL" => ServerMessage::LoadMaterial(serde_json::from_str(payload)?),
            "CREATE_OBJECT" => ServerMessage::CreateObject(serde_json::from_str(payload)?),
            "UPDATE_TRANSFORM" => ServerMessage::UpdateTransform(serde_json::from_str(payload)?),
            other => return Err(ProtocolError::UnknownTopic(other.to_string())),
        };
        Ok(message)
    }
}

/// Topic of an encoded frame, without parsing the payload.
pub fn frame_topic(frame: &str) -> Option<&str> {
    frame.split_once(':').map(|(topic, _)| topic)
}

#[cfg(test)]
mod tests {
    use ultraviolet::Vec3;

    use super::*;

    #[test]
    fn reset_has_empty_payload() {
        assert_eq!(ServerMessage::Reset.encode().unwrap(), "RESET:");
        assert_eq!(ServerMessage::decode("RESET:").unwrap(), ServerMessage::Reset);
    }

    #[test]
    fn update_frame_layout() {
        let mut transforms = BTreeMap::new();
        transforms.insert(
            "arm".to_string(),
            WireTransform::from(Transform::from_position(Vec3::new(1.0, 2.0, 3.0))),
        );
        let frame = ServerMessage::UpdateTransform(transforms.clone())
            .encode()
            .unwrap();
        let (topic, payload) = frame.split_once(':').unwrap();
        assert_eq!(topic, "UPDATE_TRANSFORM");
        let json: serde_json::Value = serde_json::from_str(payload).unwrap();
        assert_eq!(json["arm"]["position"], serde_json::json!([1.0, 2.0, 3.0]));
        assert_eq!(json["arm"]["quaternion"][3], 1.0);
        assert_eq!(json["arm"]["scale"], serde_json::json!([1.0, 1.0, 1.0]));
        assert_eq!(frame_topic(&frame), Some("UPDATE_TRANSFORM"));
        assert_eq!(
            ServerMessage::decode(&frame).unwrap(),
            ServerMessage::UpdateTransform(transforms)
        );
    }

    #[test]
    fn visuals_carry_their_kind_as_type() {
        let record = VisualRecord {
            name: "box".into(),
            kind: GeometryKind::Cube,
            mesh: None,
            material: Some("color_ff0000ff".into()),
            transform: WireTransform::from(Transform::default()),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "CUBE");
        assert!(json["mesh"].is_null());
    }

    #[test]
    fn malformed_frames() {
        assert!(matches!(
            ServerMessage::decode("no separator"),
            Err(ProtocolError::MissingTopic)
        ));
        assert!(matches!(
            ServerMessage::decode("HELLO:{}"),
            Err(ProtocolError::UnknownTopic(topic)) if topic == "HELLO"
        ));
        assert!(matches!(
            ServerMessage::decode("LOAD_MATERIAL:{"),
            Err(ProtocolError::Payload(_))
        ));
    }
}

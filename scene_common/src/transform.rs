use std::ops::Mul;

use serde::{Deserialize, Serialize};
use ultraviolet::{Rotor3, Vec3};

/// Position, orientation and scale of a scene node relative to its parent.
///
/// Values are kept in the canonical engine frame (right-handed, Z-up).
/// Conversion into a viewer's frame happens in [`crate::coordinates`] and never
/// writes back into a `Transform`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Transform {
    pub position: Vec3,
    pub orientation: Rotor3,
    pub scale: Vec3,
}

impl Transform {
    pub fn new(position: Vec3, orientation: Rotor3, scale: Vec3) -> Self {
        Self {
            position,
            orientation: normalized_or_identity(orientation),
            scale,
        }
    }

    /// Quaternion in `[x, y, z, w]` order.
    pub fn from_arrays(position: [f32; 3], orientation: [f32; 4], scale: [f32; 3]) -> Self {
        Self::new(
            Vec3::from(position),
            Rotor3::from_quaternion_array(orientation),
            Vec3::from(scale),
        )
    }

    /// The physics engine hands out scalar-first quaternions (`[w, x, y, z]`).
    pub fn from_engine(position: [f32; 3], quaternion: [f32; 4]) -> Self {
        let [w, x, y, z] = quaternion;
        Self::from_arrays(position, [x, y, z, w], [1.0; 3])
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Scales, rotates and then translates a point.
    pub fn apply(&self, point: Vec3) -> Vec3 {
        self.position + (self.orientation * (point * self.scale))
    }

    /// `self ∘ child`: the child expressed in the frame that `self` is expressed in.
    pub fn compose(&self, child: &Transform) -> Transform {
        Transform {
            position: self.apply(child.position),
            orientation: normalized_or_identity(self.orientation * child.orientation),
            scale: self.scale * child.scale,
        }
    }

    /// Exact for rigid transforms and uniform scales.
    pub fn inverse(&self) -> Transform {
        let orientation = self.orientation.reversed();
        let scale = Vec3::new(
            reciprocal(self.scale.x),
            reciprocal(self.scale.y),
            reciprocal(self.scale.z),
        );
        Transform {
            position: -((orientation * self.position) * scale),
            orientation,
            scale,
        }
    }

    /// Quaternion in `[x, y, z, w]` order.
    pub fn quaternion(&self) -> [f32; 4] {
        self.orientation.into_quaternion_array()
    }

    /// Compares the effect of both transforms on the unit basis and the origin.
    pub fn approx_eq(&self, other: &Transform, epsilon: f32) -> bool {
        [Vec3::zero(), Vec3::unit_x(), Vec3::unit_y(), Vec3::unit_z()]
            .into_iter()
            .all(|point| (self.apply(point) - other.apply(point)).mag() <= epsilon)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zero(),
            orientation: Rotor3::identity(),
            scale: Vec3::one(),
        }
    }
}

impl Mul<Transform> for &Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Self::Output {
        self.compose(&rhs)
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Self::Output {
        self.compose(&rhs)
    }
}

/// Rotation of `angle` radians around a unit `axis`, right-handed.
pub fn axis_rotation(axis: Vec3, angle: f32) -> Rotor3 {
    let (sin, cos) = (angle * 0.5).sin_cos();
    Rotor3::from_quaternion_array([axis.x * sin, axis.y * sin, axis.z * sin, cos])
}

fn normalized_or_identity(rotor: Rotor3) -> Rotor3 {
    let [x, y, z, w] = rotor.into_quaternion_array();
    let magnitude_sq = x * x + y * y + z * z + w * w;
    if magnitude_sq <= f32::EPSILON || !magnitude_sq.is_finite() {
        Rotor3::identity()
    } else {
        rotor.normalized()
    }
}

fn reciprocal(value: f32) -> f32 {
    if value.abs() <= f32::EPSILON {
        0.0
    } else {
        1.0 / value
    }
}

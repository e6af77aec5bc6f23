//! Conversion from the canonical engine frame (right-handed, Z-up) into the
//! coordinate convention of a consuming backend.
//!
//! Everything in here is a pure function of its inputs. Conversions only run
//! at serialization boundaries; the canonical values stay untouched.

use ultraviolet::{Rotor3, Vec3};

use crate::{
    scene::GeometryKind,
    transform::{axis_rotation, Transform},
};

/// One target axis: which canonical axis feeds it and with what sign.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisSource {
    pub axis: usize,
    pub negate: bool,
}

/// A signed permutation of the canonical axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisConvention {
    targets: [AxisSource; 3],
}

impl AxisConvention {
    /// The canonical frame itself.
    pub const Z_UP: AxisConvention = AxisConvention {
        targets: [
            AxisSource { axis: 0, negate: false },
            AxisSource { axis: 1, negate: false },
            AxisSource { axis: 2, negate: false },
        ],
    };

    /// Right-handed, Y-up (three.js and most web viewers): `(x, y, z) -> (x, z, -y)`.
    pub const Y_UP: AxisConvention = AxisConvention {
        targets: [
            AxisSource { axis: 0, negate: false },
            AxisSource { axis: 2, negate: false },
            AxisSource { axis: 1, negate: true },
        ],
    };

    /// Returns `None` unless every canonical axis is used exactly once.
    pub fn new(targets: [AxisSource; 3]) -> Option<Self> {
        let mut seen = [false; 3];
        for target in targets.iter() {
            if target.axis > 2 || seen[target.axis] {
                return None;
            }
            seen[target.axis] = true;
        }
        Some(Self { targets })
    }

    pub fn convert_vector(&self, vector: Vec3) -> Vec3 {
        let source: [f32; 3] = vector.into();
        let pick = |target: AxisSource| {
            let value = source[target.axis];
            if target.negate {
                -value
            } else {
                value
            }
        };
        Vec3::new(
            pick(self.targets[0]),
            pick(self.targets[1]),
            pick(self.targets[2]),
        )
    }

    /// Scales are magnitudes, so only the axis order changes.
    pub fn convert_scale(&self, scale: Vec3) -> Vec3 {
        let source: [f32; 3] = scale.into();
        Vec3::new(
            source[self.targets[0].axis],
            source[self.targets[1].axis],
            source[self.targets[2].axis],
        )
    }

    /// Re-expresses a rotation in the target frame through an Euler round trip:
    /// the rotation is split into extrinsic x, y, z angles, every angle is moved
    /// onto the target axis its canonical axis maps to, and the rotation is
    /// rebuilt in the same application order.
    pub fn convert_rotation(&self, rotation: Rotor3) -> Rotor3 {
        let angles = euler_xyz(rotation);
        let handedness = self.handedness();
        let mut result = Rotor3::identity();
        for (source_axis, angle) in angles.into_iter().enumerate() {
            let (target_axis, sign) = self.target_of(source_axis);
            let axis = unit_axis(target_axis);
            result = axis_rotation(axis, angle * sign * handedness) * result;
        }
        result.normalized()
    }

    pub fn convert(&self, transform: &Transform) -> Transform {
        Transform {
            position: self.convert_vector(transform.position),
            orientation: self.convert_rotation(transform.orientation),
            scale: self.convert_scale(transform.scale),
        }
    }

    /// Like [`AxisConvention::convert`], but first turns the engine's size
    /// vector of a primitive into the per-axis scale of a unit-sized viewer
    /// primitive.
    pub fn convert_primitive(&self, transform: &Transform, kind: GeometryKind) -> Transform {
        let mut canonical = *transform;
        canonical.scale = primitive_scale(kind, transform.scale);
        self.convert(&canonical)
    }

    /// Rotation that maps canonical coordinates onto this convention's axes.
    /// Used for the node that holds geometry authored in the canonical frame.
    /// Only defined for handedness-preserving conventions.
    pub fn basis_rotation(&self) -> Option<Rotor3> {
        if self.handedness() < 0.0 {
            return None;
        }
        let columns = [
            self.convert_vector(Vec3::unit_x()),
            self.convert_vector(Vec3::unit_y()),
            self.convert_vector(Vec3::unit_z()),
        ];
        Some(rotation_from_euler(euler_from_columns(columns)))
    }

    fn target_of(&self, source_axis: usize) -> (usize, f32) {
        self.targets
            .iter()
            .position(|target| target.axis == source_axis)
            .map(|index| {
                let sign = if self.targets[index].negate { -1.0 } else { 1.0 };
                (index, sign)
            })
            .unwrap_or((source_axis, 1.0))
    }

    /// Determinant of the signed permutation matrix.
    fn handedness(&self) -> f32 {
        let [a, b, c] = self.targets.map(|target| target.axis);
        // Parity of the permutation: even permutations are cyclic shifts of (0, 1, 2).
        let even = (a + 1) % 3 == b && (b + 1) % 3 == c;
        let mut sign = if even { 1.0 } else { -1.0 };
        for target in self.targets.iter() {
            if target.negate {
                sign = -sign;
            }
        }
        sign
    }
}

impl Default for AxisConvention {
    fn default() -> Self {
        Self::Y_UP
    }
}

/// Engine primitives are sized in half extents (boxes) or radius and
/// half-height (cylinders); viewer primitives are unit sized.
pub fn primitive_scale(kind: GeometryKind, size: Vec3) -> Vec3 {
    match kind {
        GeometryKind::Cube => size * 2.0,
        GeometryKind::Cylinder => Vec3::new(size.x, size.x, size.y * 2.0),
        _ => size,
    }
}

/// Extrinsic x, then y, then z angles (roll, pitch, yaw).
pub fn euler_xyz(rotation: Rotor3) -> [f32; 3] {
    euler_from_columns([
        rotation * Vec3::unit_x(),
        rotation * Vec3::unit_y(),
        rotation * Vec3::unit_z(),
    ])
}

pub fn rotation_from_euler(angles: [f32; 3]) -> Rotor3 {
    let [roll, pitch, yaw] = angles;
    axis_rotation(Vec3::unit_z(), yaw)
        * axis_rotation(Vec3::unit_y(), pitch)
        * axis_rotation(Vec3::unit_x(), roll)
}

/// Yaw comes first and roll is solved against it, so the angles always
/// rebuild the same rotation, including at and near ±90° pitch where roll and
/// yaw share one degree of freedom.
fn euler_from_columns(columns: [Vec3; 3]) -> [f32; 3] {
    let [x, y, z] = columns;
    let yaw = x.y.atan2(x.x);
    let pitch = (-x.z).atan2(x.x.hypot(x.y));
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    let roll = (sin_yaw * z.x - cos_yaw * z.y).atan2(cos_yaw * y.y - sin_yaw * y.x);
    [roll, pitch, yaw]
}

fn unit_axis(axis: usize) -> Vec3 {
    match axis {
        0 => Vec3::unit_x(),
        1 => Vec3::unit_y(),
        _ => Vec3::unit_z(),
    }
}

//! Rigid 3D transforms between named frames.
//!
//! Transforms arrive from the bus in 3D (translation + quaternion) even though
//! the console only ever shows their planar projection. Composition stays in
//! 3D so chains through tilted intermediate frames resolve correctly.

use serde::{Deserialize, Serialize};

use super::pose::Pose2D;

/// 3D vector in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn add(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

/// Rotation quaternion `(x, y, z, w)`.
///
/// Every quaternion produced by this module is normalized, so repeated
/// composition cannot drift away from unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Create a quaternion from raw components (not normalized).
    #[inline]
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Pure rotation about +Z by `yaw` radians.
    #[inline]
    pub fn from_yaw(yaw: f64) -> Self {
        let (s, c) = (yaw / 2.0).sin_cos();
        Self::new(0.0, 0.0, s, c)
    }

    /// Euclidean norm of the four components.
    #[inline]
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Scale to unit length.
    ///
    /// A zero (or NaN) norm divides by 1 instead, leaving the components as
    /// they are rather than producing NaNs.
    pub fn normalized(&self) -> Self {
        let n = self.norm();
        let n = if n == 0.0 || n.is_nan() { 1.0 } else { n };
        Self::new(self.x / n, self.y / n, self.z / n, self.w / n)
    }

    /// Hamilton product `self * other` (apply `other`, then `self`).
    #[inline]
    pub fn mul(&self, other: &Quaternion) -> Quaternion {
        let (a, b) = (self, other);
        Quaternion {
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        }
    }

    /// Conjugate (inverse for unit quaternions).
    #[inline]
    pub fn conjugate(&self) -> Quaternion {
        Quaternion::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotate a vector: `q * (0, v) * q⁻¹`.
    pub fn rotate(&self, v: &Vec3) -> Vec3 {
        let q = self.normalized();
        let p = Quaternion::new(v.x, v.y, v.z, 0.0);
        let out = q.mul(&p).mul(&q.conjugate());
        Vec3::new(out.x, out.y, out.z)
    }

    /// Planar heading of the rotation.
    ///
    /// ```text
    /// yaw = atan2(2(wz + xy), 1 - 2(y² + z²))
    /// ```
    #[inline]
    pub fn yaw(&self) -> f64 {
        let siny = 2.0 * (self.w * self.z + self.x * self.y);
        let cosy = 1.0 - 2.0 * (self.y * self.y + self.z * self.z);
        siny.atan2(cosy)
    }
}

/// Rigid transform from a parent frame to a child frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quaternion,
}

impl Transform {
    /// Create a transform; the rotation is normalized on the way in.
    #[inline]
    pub fn new(translation: Vec3, rotation: Quaternion) -> Self {
        Self {
            translation,
            rotation: rotation.normalized(),
        }
    }

    #[inline]
    pub fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quaternion::IDENTITY,
        }
    }

    /// Planar transform: translation `(x, y, 0)` and rotation about +Z.
    #[inline]
    pub fn planar(x: f64, y: f64, yaw: f64) -> Self {
        Self::new(Vec3::new(x, y, 0.0), Quaternion::from_yaw(yaw))
    }

    /// Compose `self ∘ other`: apply `self`, then `other` in `self`'s child frame.
    ///
    /// ```text
    /// T_ac = T_ab ∘ T_bc:
    ///   t_ac = t_ab + R_ab · t_bc
    ///   q_ac = normalize(q_ab * q_bc)
    /// ```
    pub fn compose(&self, other: &Transform) -> Transform {
        let rotated = self.rotation.rotate(&other.translation);
        Transform {
            translation: self.translation.add(&rotated),
            rotation: self.rotation.mul(&other.rotation).normalized(),
        }
    }

    /// Project onto the map plane.
    #[inline]
    pub fn to_pose2d(&self) -> Pose2D {
        Pose2D::new(self.translation.x, self.translation.y, self.rotation.yaw())
    }
}

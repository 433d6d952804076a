//! Pose values - what a keyframe sets on a rig target
//!
//! A rig target is either a joint (rotation, scale) or a blendshape (weight).
//! Every value has a rest form the rig returns to when a performance stops.

/// Joint rotation (quaternion representation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation3D {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Rotation3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Rotation3D {
    pub fn identity() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    pub fn from_euler(yaw: f32, pitch: f32, roll: f32) -> Self {
        let cy = (yaw * 0.5).cos();
        let sy = (yaw * 0.5).sin();
        let cp = (pitch * 0.5).cos();
        let sp = (pitch * 0.5).sin();
        let cr = (roll * 0.5).cos();
        let sr = (roll * 0.5).sin();

        Self {
            w: cr * cp * cy + sr * sp * sy,
            x: sr * cp * cy - cr * sp * sy,
            y: cr * sp * cy + sr * cp * sy,
            z: cr * cp * sy - sr * sp * cy,
        }
    }

    fn dot(&self, other: &Rotation3D) -> f32 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Spherical linear interpolation
    pub fn slerp(&self, other: &Rotation3D, t: f32) -> Rotation3D {
        let t = t.clamp(0.0, 1.0);
        let mut dot = self.dot(other);

        // Take the short way round
        let other = if dot < 0.0 {
            dot = -dot;
            Rotation3D {
                w: -other.w,
                x: -other.x,
                y: -other.y,
                z: -other.z,
            }
        } else {
            *other
        };

        if dot > 0.9995 {
            // Linear interpolation for very close quaternions
            let result = Rotation3D {
                w: self.w + (other.w - self.w) * t,
                x: self.x + (other.x - self.x) * t,
                y: self.y + (other.y - self.y) * t,
                z: self.z + (other.z - self.z) * t,
            };
            return result.normalize();
        }

        let theta_0 = dot.acos();
        let sin_theta_0 = theta_0.sin();
        let s0 = ((1.0 - t) * theta_0).sin() / sin_theta_0;
        let s1 = (t * theta_0).sin() / sin_theta_0;

        Rotation3D {
            w: self.w * s0 + other.w * s1,
            x: self.x * s0 + other.x * s1,
            y: self.y * s0 + other.y * s1,
            z: self.z * s0 + other.z * s1,
        }
    }

    pub fn normalize(&self) -> Rotation3D {
        let len = self.dot(self).sqrt();
        if len < 0.0001 {
            return Rotation3D::identity();
        }
        Rotation3D {
            w: self.w / len,
            x: self.x / len,
            y: self.y / len,
            z: self.z / len,
        }
    }

    /// Angular closeness, sign-insensitive (q and -q are the same rotation)
    pub fn approx_eq(&self, other: &Rotation3D, eps: f32) -> bool {
        1.0 - self.dot(other).abs() < eps
    }
}

/// Joint scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Scale3D {
    fn default() -> Self {
        Self::one()
    }
}

impl Scale3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn one() -> Self {
        Self::uniform(1.0)
    }

    pub fn uniform(s: f32) -> Self {
        Self { x: s, y: s, z: s }
    }

    /// Linear interpolation
    pub fn lerp(&self, other: &Scale3D, t: f32) -> Scale3D {
        Scale3D {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }
}

/// Value applied to a single rig target
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoseValue {
    /// Joint rotation
    Rotation(Rotation3D),
    /// Joint scale
    Scale(Scale3D),
    /// Blendshape weight [0.0 - 1.0]
    BlendWeight(f32),
}

impl PoseValue {
    pub fn weight(w: f32) -> Self {
        PoseValue::BlendWeight(w.clamp(0.0, 1.0))
    }

    /// Rest form of the same kind of value
    pub fn rest(&self) -> PoseValue {
        match self {
            PoseValue::Rotation(_) => PoseValue::Rotation(Rotation3D::identity()),
            PoseValue::Scale(_) => PoseValue::Scale(Scale3D::one()),
            PoseValue::BlendWeight(_) => PoseValue::BlendWeight(0.0),
        }
    }

    pub fn is_rest(&self) -> bool {
        self.approx_eq(&self.rest())
    }

    pub fn same_kind(&self, other: &PoseValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Interpolate towards `other`. Values of different kinds cannot be
    /// blended and switch over at the halfway point.
    pub fn lerp(&self, other: &PoseValue, t: f32) -> PoseValue {
        let t = t.clamp(0.0, 1.0);
        match (self, other) {
            (PoseValue::Rotation(a), PoseValue::Rotation(b)) => PoseValue::Rotation(a.slerp(b, t)),
            (PoseValue::Scale(a), PoseValue::Scale(b)) => PoseValue::Scale(a.lerp(b, t)),
            (PoseValue::BlendWeight(a), PoseValue::BlendWeight(b)) => {
                PoseValue::BlendWeight(a + (b - a) * t)
            }
            _ => {
                if t < 0.5 {
                    *self
                } else {
                    *other
                }
            }
        }
    }

    /// The value at `intensity` of the way from rest (1.0 = unchanged)
    pub fn at_intensity(&self, intensity: f32) -> PoseValue {
        self.rest().lerp(self, intensity)
    }

    pub fn approx_eq(&self, other: &PoseValue) -> bool {
        const EPS: f32 = 1e-4;
        match (self, other) {
            (PoseValue::Rotation(a), PoseValue::Rotation(b)) => a.approx_eq(b, EPS),
            (PoseValue::Scale(a), PoseValue::Scale(b)) => {
                (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS && (a.z - b.z).abs() < EPS
            }
            (PoseValue::BlendWeight(a), PoseValue::BlendWeight(b)) => (a - b).abs() < EPS,
            _ => false,
        }
    }
}

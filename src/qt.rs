use super::vec3::{Mat3, Vec3};
use std::ops;

fn float_equals(x: f64, y: f64) -> bool {
    (x - y).abs() < f64::EPSILON
}

/// Unit quaternion representing a rigid-body orientation.
#[derive(Debug, Copy, Clone)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Multiplicative identity, i.e. the null rotation.
pub const QTN4ID: Quaternion = Quaternion {
    w: 1.0,
    x: 0.0,
    y: 0.0,
    z: 0.0,
};

impl Quaternion {
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Quaternion {
        Quaternion { w, x, y, z }
    }

    /// Rotation about v/|v| by |v| radians. The zero vector maps to the
    /// identity, which is what makes it usable as a tangent-space step.
    pub fn from_rotation_vector(v: Vec3) -> Quaternion {
        let norm_sqr = v.norm_sqr();
        if norm_sqr < f64::EPSILON {
            return QTN4ID;
        }
        let angle = norm_sqr.sqrt();
        let half = 0.5 * angle;
        let s = half.sin() / angle;
        Quaternion::new(half.cos(), s * v.x, s * v.y, s * v.z)
    }

    pub fn conjugate(&self) -> Quaternion {
        Quaternion::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn norm_sqr(&self) -> f64 {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn norm(&self) -> f64 {
        self.norm_sqr().sqrt()
    }

    /// Within 1e-3 of unit length.
    pub fn is_normalized(&self) -> bool {
        (self.norm_sqr() - 1.0).abs() < 1e-3
    }

    pub fn normalize(&mut self) {
        let norm = self.norm();
        self.w /= norm;
        self.x /= norm;
        self.y /= norm;
        self.z /= norm;
    }

    /// Normalizing a raw 4-tuple can fail; normalizing a product of unit
    /// quaternions cannot, so the hot path uses `normalize` instead.
    pub fn normalized(&self) -> crate::error::Result<Quaternion> {
        let norm = self.norm();
        if !norm.is_finite() || norm < f64::EPSILON {
            return Err(crate::error::Error::Domain(format!(
                "cannot normalize quaternion of norm {}",
                norm
            )));
        }
        Ok(Quaternion::new(
            self.w / norm,
            self.x / norm,
            self.y / norm,
            self.z / norm,
        ))
    }

    /// Equivalent rotation matrix. Assumes unit length.
    pub fn to_mat3(&self) -> Mat3 {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);
        Mat3([
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - w * z),
            2.0 * (x * z + w * y),
            2.0 * (x * y + w * z),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - w * x),
            2.0 * (x * z - w * y),
            2.0 * (y * z + w * x),
            1.0 - 2.0 * (x * x + y * y),
        ])
    }

    /// Rotate a vector. Assumes unit length, so the inverse is the conjugate.
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let p = Quaternion::new(0.0, v.x, v.y, v.z);
        let r = *self * p * self.conjugate();
        Vec3::new(r.x, r.y, r.z)
    }
}

impl Default for Quaternion {
    fn default() -> Quaternion {
        QTN4ID
    }
}

impl ops::Mul for Quaternion {
    type Output = Self;

    fn mul(self, other: Quaternion) -> Self::Output {
        Quaternion::new(
            self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        )
    }
}

impl PartialEq for Quaternion {
    fn eq(&self, other: &Self) -> bool {
        float_equals(self.w, other.w)
            && float_equals(self.x, other.x)
            && float_equals(self.y, other.y)
            && float_equals(self.z, other.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn quaternion_default_is_identity() {
        let q: Quaternion = Default::default();
        assert_eq!(QTN4ID, q);
    }

    #[test]
    fn zero_rotation_vector_is_identity() {
        assert_eq!(QTN4ID, Quaternion::from_rotation_vector(crate::vec3::ZERO3));
    }

    #[test]
    fn quaternion_mul() {
        let q1 = Quaternion::new(1.0, 0.0, 0.0, 2.0);
        let q2 = Quaternion::new(3.0, -1.0, 4.0, 3.0);
        let expected = Quaternion::new(-3.0, -9.0, 2.0, 9.0);
        assert!(expected == q1 * q2);
        let expected = Quaternion::new(-3.0, 7.0, 6.0, 9.0);
        assert!(expected == q2 * q1);
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut q = Quaternion::new(1.0, -3.0, 4.0, 3.0);
        q.normalize();
        assert!(q.is_normalized());
        let once = q;
        q.normalize();
        assert!((q.w - once.w).abs() < 1e-15);
        assert!((q.x - once.x).abs() < 1e-15);
        assert!((q.y - once.y).abs() < 1e-15);
        assert!((q.z - once.z).abs() < 1e-15);
    }

    #[test]
    fn normalized_rejects_zero() {
        assert!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized().is_err());
    }

    #[test]
    fn quarter_turn_about_z() {
        let q = Quaternion::from_rotation_vector(Vec3::new(0.0, 0.0, PI / 2.0));
        let v = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!((v.x - 0.0).abs() < 1e-12);
        assert!((v.y - 1.0).abs() < 1e-12);
        assert!((v.z - 0.0).abs() < 1e-12);
    }

    #[test]
    fn to_mat3_agrees_with_rotate() {
        let q = Quaternion::from_rotation_vector(Vec3::new(0.4, -1.1, 0.7));
        let m = q.to_mat3();
        let v = Vec3::new(1.0, 2.0, -3.0);
        let a = q.rotate(v);
        let b = m * v;
        assert!((a.x - b.x).abs() < 1e-12);
        assert!((a.y - b.y).abs() < 1e-12);
        assert!((a.z - b.z).abs() < 1e-12);
    }

    #[test]
    fn composition_preserves_unit_length() {
        let q1 = Quaternion::from_rotation_vector(Vec3::new(0.3, 0.2, -0.9));
        let q2 = Quaternion::from_rotation_vector(Vec3::new(-1.2, 0.5, 0.1));
        assert!((q1 * q2).is_normalized());
    }
}

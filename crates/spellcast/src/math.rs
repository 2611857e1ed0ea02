//! Math types and glam re-exports.
//!
//! The simulation plays out on the `z = 0` plane with `+z` toward the camera.
//! [`Transform`] carries an actor's position, rotation and scale; the free
//! functions cover the few geometric helpers behaviors and scripts share.

use std::f32::consts::TAU;

pub use glam::{Mat4, Quat, Vec2, Vec3};
use rand::Rng;

/// A 3D transform: position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a transform at the given position.
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            ..Self::IDENTITY
        }
    }

    /// Rotate to face `target`, keeping `up` as the up direction. Leaves the
    /// rotation untouched when `target` coincides with the translation.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        if target.distance_squared(self.translation) <= f32::EPSILON {
            return;
        }
        let look = Mat4::look_at_rh(self.translation, target, up);
        let (_, rotation, _) = look.inverse().to_scale_rotation_translation();
        self.rotation = rotation;
    }

    /// Return a copy with uniform scale applied.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Convert spherical coordinates to a vector.
///
/// `phi` is the polar angle measured from `+y`, `theta` the azimuth around
/// `+y` measured from `+z`.
pub fn from_spherical(radius: f32, phi: f32, theta: f32) -> Vec3 {
    let sin_phi_radius = phi.sin() * radius;
    Vec3::new(
        sin_phi_radius * theta.sin(),
        phi.cos() * radius,
        sin_phi_radius * theta.cos(),
    )
}

/// A uniformly-angled random point on the play plane whose distance from
/// `origin` lies in `[inner_radius, radius)`. The result has `z = 0`.
pub fn random_point_near(
    rng: &mut impl Rng,
    origin: Vec3,
    radius: f32,
    inner_radius: f32,
) -> Vec3 {
    let distance = if radius > inner_radius {
        rng.gen_range(inner_radius..radius)
    } else {
        inner_radius
    };
    let angle = rng.gen_range(0.0..TAU);
    let offset = Vec3::new(angle.cos(), angle.sin(), 0.0) * distance;
    (origin + offset).with_z(0.0)
}

/// Flatten onto the play plane.
pub fn flat(v: Vec3) -> Vec3 {
    v.with_z(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-5
    }

    #[test]
    fn spherical_axes() {
        use std::f32::consts::FRAC_PI_2;
        assert!(approx(from_spherical(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)));
        assert!(approx(from_spherical(1.0, FRAC_PI_2, 0.0), Vec3::Z));
        assert!(approx(from_spherical(1.0, FRAC_PI_2, FRAC_PI_2), Vec3::X));
    }

    #[test]
    fn random_point_stays_in_annulus() {
        let mut rng = StdRng::seed_from_u64(3);
        let origin = Vec3::new(5.0, -2.0, 4.0);
        for _ in 0..200 {
            let p = random_point_near(&mut rng, origin, 3.0, 1.0);
            let d = p.distance(origin.with_z(0.0));
            assert!((1.0 - 1e-4..3.0 + 1e-4).contains(&d), "distance {d}");
            assert_eq!(p.z, 0.0);
        }
    }

    #[test]
    fn degenerate_annulus_uses_inner_radius() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = random_point_near(&mut rng, Vec3::ZERO, 2.0, 2.0);
        assert!((p.length() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn look_at_same_point_keeps_rotation() {
        let mut t = Transform::from_xyz(1.0, 1.0, 0.0);
        t.look_at(Vec3::new(1.0, 1.0, 0.0), Vec3::Z);
        assert_eq!(t.rotation, Quat::IDENTITY);
    }

    #[test]
    fn look_at_faces_target_along_negative_z() {
        let mut t = Transform::from_xyz(0.0, 0.0, 0.0).with_scale(2.0);
        t.look_at(Vec3::new(3.0, 0.0, 0.0), Vec3::Z);
        assert!(approx(t.rotation * Vec3::NEG_Z, Vec3::X));
        assert_eq!(t.scale, Vec3::splat(2.0));
    }
}

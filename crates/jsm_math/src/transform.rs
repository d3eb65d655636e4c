// Transform utilities for Mat4
//
// Extends glam::Mat4 with bounds transformation used for scene bounds.
// Note: glam::Mat4 already provides transform_point3() and transform_vector3()

use glam::Mat4;
use crate::Aabb;

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    /// An empty box stays empty.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::empty();
        }

        aabb.corners()
            .iter()
            .fold(Aabb::empty(), |acc, &corner| acc.grow(self.transform_point3(corner)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn test_transform_aabb_identity() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let transformed = Mat4::IDENTITY.transform_aabb(&aabb);

        assert!((transformed.min - aabb.min).length() < 0.001);
        assert!((transformed.max - aabb.max).length() < 0.001);
    }

    #[test]
    fn test_transform_aabb_translation_and_scale() {
        let mat = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::IDENTITY,
            Vec3::new(5.0, 5.0, 5.0),
        );
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let transformed = mat.transform_aabb(&aabb);

        assert!((transformed.min - Vec3::new(5.0, 5.0, 5.0)).length() < 0.001);
        assert!((transformed.max - Vec3::new(7.0, 7.0, 7.0)).length() < 0.001);
    }

    #[test]
    fn test_transform_aabb_rotation() {
        use std::f32::consts::FRAC_PI_2;

        // 90 degrees around Z maps +X extent onto +Y
        let mat = Mat4::from_rotation_z(FRAC_PI_2);
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0));
        let transformed = mat.transform_aabb(&aabb);

        assert!((transformed.min - Vec3::new(-1.0, 0.0, 0.0)).length() < 0.001);
        assert!((transformed.max - Vec3::new(0.0, 2.0, 1.0)).length() < 0.001);
    }

    #[test]
    fn test_transform_empty_aabb() {
        let mat = Mat4::from_translation(Vec3::ONE);
        assert!(mat.transform_aabb(&Aabb::empty()).is_empty());
    }
}

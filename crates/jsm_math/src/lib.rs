// Re-export glam for convenience
pub use glam::*;

// JSM math types
mod aabb;
mod transform;
pub use aabb::Aabb;
pub use transform::Mat4Ext;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quat_from_array_keeps_components() {
        // Document quaternions are x, y, z, w and are taken as-is.
        let q = Quat::from_array([0.0, 0.0, 0.0, 2.0]);
        assert_eq!(q.w, 2.0);
        assert_eq!(q.to_array(), [0.0, 0.0, 0.0, 2.0]);
    }
}

//! View frustum culling

use glam::{Mat4, Vec3, Vec4};

use crate::math::Aabb;

/// A plane `dot(normal, p) + distance = 0`, normal pointing into the frustum
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// Normalized plane from an unnormalized `(a, b, c, d)` row combination
    fn from_row(v: Vec4) -> Self {
        let normal = v.truncate();
        let len = normal.length();
        if len > 0.0 {
            Self {
                normal: normal / len,
                distance: v.w / len,
            }
        } else {
            Self {
                normal,
                distance: v.w,
            }
        }
    }

    /// Signed distance of a point; negative is outside
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Six clip planes extracted from a view-projection matrix
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far
    pub planes: [Plane; 6],
}

impl Frustum {
    pub fn from_matrix(view_projection: &Mat4) -> Self {
        let mut frustum = Self::default();
        frustum.define(view_projection);
        frustum
    }

    /// Re-extract the planes (Gribb–Hartmann) for a new view-projection matrix
    pub fn define(&mut self, view_projection: &Mat4) {
        let m = view_projection;
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        self.planes = [
            Plane::from_row(r3 + r0),
            Plane::from_row(r3 - r0),
            Plane::from_row(r3 + r1),
            Plane::from_row(r3 - r1),
            Plane::from_row(r3 + r2),
            Plane::from_row(r3 - r2),
        ];
    }

    /// Conservative box test: false only if the box lies entirely outside one plane
    pub fn is_box_visible(&self, min: Vec3, max: Vec3) -> bool {
        for plane in &self.planes {
            let n = plane.normal;
            let positive = Vec3::new(
                if n.x >= 0.0 { max.x } else { min.x },
                if n.y >= 0.0 { max.y } else { min.y },
                if n.z >= 0.0 { max.z } else { min.z },
            );
            if plane.signed_distance(positive) < 0.0 {
                return false;
            }
        }
        true
    }

    pub fn is_aabb_visible(&self, aabb: &Aabb) -> bool {
        self.is_box_visible(aabb.min, aabb.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_frustum() -> Frustum {
        let proj = Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        Frustum::from_matrix(&(proj * view))
    }

    #[test]
    fn test_planes_are_normalized() {
        for plane in camera_frustum().planes {
            assert!((plane.normal.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_box_at_origin_visible() {
        let f = camera_frustum();
        assert!(f.is_box_visible(Vec3::splat(-0.5), Vec3::splat(0.5)));
    }

    #[test]
    fn test_box_behind_camera_culled() {
        let f = camera_frustum();
        assert!(!f.is_box_visible(Vec3::new(-1.0, -1.0, 20.0), Vec3::new(1.0, 1.0, 22.0)));
    }

    #[test]
    fn test_box_beyond_far_culled() {
        let f = camera_frustum();
        assert!(!f.is_box_visible(Vec3::new(-1.0, -1.0, -200.0), Vec3::new(1.0, 1.0, -195.0)));
    }

    #[test]
    fn test_box_straddling_plane_visible() {
        let f = camera_frustum();
        // Crosses the near plane
        assert!(f.is_box_visible(Vec3::new(-1.0, -1.0, 9.0), Vec3::new(1.0, 1.0, 11.0)));
    }
}

//! Camera system
//!
//! Projections use OpenGL clip conventions (depth in `[-1, 1]`), which the
//! frustum extraction and cascade fitting both rely on.

use glam::{Mat4, Vec3};

/// Camera projection type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        size: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective {
            fov_y: std::f32::consts::FRAC_PI_4, // 45 degrees
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Projection::Perspective {
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    /// Orthographic projection `size` units tall
    pub fn orthographic(size: f32, aspect: f32, near: f32, far: f32) -> Self {
        Projection::Orthographic {
            size,
            aspect,
            near,
            far,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        self.slice(self.near(), self.far())
    }

    /// Same projection clipped to a different depth range
    pub fn slice(&self, near: f32, far: f32) -> Mat4 {
        match *self {
            Projection::Perspective { fov_y, aspect, .. } => {
                Mat4::perspective_rh_gl(fov_y, aspect, near, far)
            }
            Projection::Orthographic { size, aspect, .. } => {
                let half_h = size * 0.5;
                let half_w = half_h * aspect;
                Mat4::orthographic_rh_gl(-half_w, half_w, -half_h, half_h, near, far)
            }
        }
    }

    pub fn near(&self) -> f32 {
        match self {
            Projection::Perspective { near, .. } | Projection::Orthographic { near, .. } => *near,
        }
    }

    pub fn far(&self) -> f32 {
        match self {
            Projection::Perspective { far, .. } | Projection::Orthographic { far, .. } => *far,
        }
    }

    pub fn set_aspect(&mut self, new_aspect: f32) {
        match self {
            Projection::Perspective { aspect, .. } | Projection::Orthographic { aspect, .. } => {
                *aspect = new_aspect
            }
        }
    }
}

/// A projection placed in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub projection: Projection,
    /// Camera-to-world matrix
    pub transform: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::look_at(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Projection::default())
    }
}

impl Camera {
    pub fn new(projection: Projection, transform: Mat4) -> Self {
        Self {
            projection,
            transform,
        }
    }

    /// Camera at `eye` facing `target` with +Y up (editor cameras)
    pub fn look_at(eye: Vec3, target: Vec3, projection: Projection) -> Self {
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        Self {
            projection,
            transform: view.inverse(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.transform.inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update aspect ratio for a new viewport
    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.projection.set_aspect(width / height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_look_at_position_roundtrip() {
        let camera = Camera::look_at(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Projection::default());
        assert!((camera.position() - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
        let origin_in_view = camera.view_matrix().transform_point3(Vec3::ZERO);
        // Target lies straight ahead on -Z
        assert!(origin_in_view.x.abs() < 1e-5 && origin_in_view.y.abs() < 1e-5);
        assert!(origin_in_view.z < 0.0);
    }

    #[test]
    fn test_gl_depth_range() {
        let proj = Projection::perspective(60.0, 1.0, 0.5, 50.0).matrix();
        let near = proj.project_point3(Vec3::new(0.0, 0.0, -0.5));
        let far = proj.project_point3(Vec3::new(0.0, 0.0, -50.0));
        assert!((near.z + 1.0).abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_set_viewport_size_updates_aspect() {
        let mut camera = Camera::default();
        camera.set_viewport_size(800.0, 400.0);
        match camera.projection {
            Projection::Perspective { aspect, .. } => assert_eq!(aspect, 2.0),
            _ => unreachable!(),
        }
    }
}

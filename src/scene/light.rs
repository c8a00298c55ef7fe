//! Light types and their GPU uniform block

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Capacity of the point light array in the shader's uniform block
pub const MAX_POINT_LIGHTS: usize = 100;

/// Default sun direction
pub const DEFAULT_LIGHT_DIRECTION: Vec3 = Vec3::new(-0.5, -1.0, -0.5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub radius: f32,
    pub falloff: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Vec3::ONE,
            intensity: 1.0,
            radius: 10.0,
            falloff: 1.0,
        }
    }
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            position,
            color,
            intensity,
            ..Default::default()
        }
    }

    pub fn to_gpu_data(&self) -> GpuPointLight {
        GpuPointLight {
            position: self.position.to_array(),
            intensity: self.intensity,
            color: self.color.to_array(),
            radius: self.radius,
            falloff: self.falloff,
            _padding: [0.0; 3],
        }
    }
}

/// Directional light (like the sun)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels; not required to be normalized
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: DEFAULT_LIGHT_DIRECTION,
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction,
            color,
            intensity,
        }
    }

    pub fn to_gpu_data(&self) -> GpuDirectionalLight {
        GpuDirectionalLight {
            direction: self.direction.to_array(),
            intensity: self.intensity,
            color: self.color.to_array(),
            _padding: 0.0,
        }
    }
}

/// Lights gathered from the scene for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightEnvironment {
    pub directional: DirectionalLight,
    pub point_lights: Vec<PointLight>,
}

impl LightEnvironment {
    pub fn new(directional: DirectionalLight) -> Self {
        Self {
            directional,
            point_lights: Vec::new(),
        }
    }

    pub fn with_point_light(mut self, light: PointLight) -> Self {
        self.point_lights.push(light);
        self
    }

    /// GPU block; point lights past [`MAX_POINT_LIGHTS`] are dropped
    pub fn to_gpu(&self) -> GpuLightBuffer {
        let mut buffer = GpuLightBuffer::zeroed();
        buffer.directional = self.directional.to_gpu_data();

        let count = self.point_lights.len().min(MAX_POINT_LIGHTS);
        if self.point_lights.len() > MAX_POINT_LIGHTS {
            log::trace!(
                "Dropping {} point lights over capacity",
                self.point_lights.len() - MAX_POINT_LIGHTS
            );
        }
        for (slot, light) in buffer.point_lights.iter_mut().zip(&self.point_lights) {
            *slot = light.to_gpu_data();
        }
        buffer.point_light_count = count as i32;
        buffer
    }
}

/// std140 point light record
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuPointLight {
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub radius: f32,
    pub falloff: f32,
    pub _padding: [f32; 3],
}

/// std140 directional light record
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuDirectionalLight {
    pub direction: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub _padding: f32,
}

/// Light uniform block
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuLightBuffer {
    pub directional: GpuDirectionalLight,
    pub point_lights: [GpuPointLight; MAX_POINT_LIGHTS],
    pub point_light_count: i32,
    pub _padding: [i32; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_layout_sizes() {
        assert_eq!(std::mem::size_of::<GpuPointLight>(), 48);
        assert_eq!(std::mem::size_of::<GpuDirectionalLight>(), 32);
        assert_eq!(
            std::mem::size_of::<GpuLightBuffer>(),
            32 + 48 * MAX_POINT_LIGHTS + 16
        );
    }

    #[test]
    fn test_point_lights_truncated() {
        let mut env = LightEnvironment::default();
        for i in 0..150 {
            env.point_lights
                .push(PointLight::new(Vec3::splat(i as f32), Vec3::ONE, 1.0));
        }
        let gpu = env.to_gpu();
        assert_eq!(gpu.point_light_count, 100);
        assert_eq!(gpu.point_lights[99].position, [99.0; 3]);
    }

    #[test]
    fn test_unused_slots_zeroed() {
        let env = LightEnvironment::default().with_point_light(PointLight::default());
        let gpu = env.to_gpu();
        assert_eq!(gpu.point_light_count, 1);
        assert_eq!(gpu.point_lights[1], GpuPointLight::zeroed());
    }
}

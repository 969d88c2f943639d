//! 粒子数据与 GPU 记录

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::core::transform::{to_gpu_matrix, Transform3};
use crate::render::backend::PipelineKind;
use crate::render::instance_batch::InstancePayload;
use crate::render::material::UvTransform;

/// 单个粒子（CPU 侧模拟状态）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub transform: Transform3,
    pub velocity: Vec3,
    pub color: Vec4,
    /// 已存活时间（秒）
    pub elapsed: f32,
    /// 寿命（秒）
    pub lifetime: f32,
}

impl Particle {
    pub fn from_emit(param: &EmitParameter) -> Self {
        Self {
            transform: Transform3::new(param.scale, param.rotate, param.position),
            velocity: param.velocity,
            color: param.color,
            elapsed: 0.0,
            lifetime: param.lifetime,
        }
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.lifetime
    }

    /// 不透明度随存活时间线性衰减，限制在 [0, 1]
    #[inline]
    pub fn alpha(&self) -> f32 {
        (1.0 - self.elapsed / self.lifetime).clamp(0.0, 1.0)
    }

    pub fn to_instance(&self) -> ParticleInstance {
        ParticleInstance {
            world: to_gpu_matrix(self.transform.world_matrix()),
            color: [self.color.x, self.color.y, self.color.z, self.alpha()],
        }
    }
}

/// 生成一个粒子所需的参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitParameter {
    pub position: Vec3,
    pub rotate: Vec3,
    pub scale: Vec3,
    pub velocity: Vec3,
    pub color: Vec4,
    pub lifetime: f32,
}

impl Default for EmitParameter {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotate: Vec3::ZERO,
            scale: Vec3::ONE,
            velocity: Vec3::ZERO,
            color: Vec4::ONE,
            lifetime: 1.0,
        }
    }
}

/// 每个存活粒子每帧写入一条
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    pub world: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl ParticleInstance {
    pub const WHITE: Self = Self {
        world: [[0.0; 4]; 4],
        color: [1.0; 4],
    };
}

impl InstancePayload for ParticleInstance {
    const PIPELINE: PipelineKind = PipelineKind::Particle;
    const LABEL: &'static str = "Particle Instances";
}

/// 粒子组材质
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleMaterial {
    pub color: Vec4,
    pub enable_lighting: bool,
    pub enable_specular: bool,
    pub shininess: f32,
    #[serde(default)]
    pub uv: UvTransform,
}

impl Default for ParticleMaterial {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            enable_lighting: false,
            enable_specular: false,
            shininess: 20.0,
            uv: UvTransform::default(),
        }
    }
}

impl ParticleMaterial {
    pub fn to_gpu(&self) -> ParticleMaterialGpu {
        ParticleMaterialGpu {
            color: self.color.to_array(),
            uv_matrix: to_gpu_matrix(self.uv.matrix()),
            enable_lighting: self.enable_lighting as u32,
            enable_specular: self.enable_specular as u32,
            shininess: self.shininess,
            _pad: 0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleMaterialGpu {
    pub color: [f32; 4],
    pub uv_matrix: [[f32; 4]; 4],
    pub enable_lighting: u32,
    pub enable_specular: u32,
    pub shininess: f32,
    pub _pad: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 80);
        assert_eq!(std::mem::size_of::<ParticleMaterialGpu>(), 96);
    }

    #[test]
    fn test_alpha_fades_with_age() {
        let mut particle = Particle::from_emit(&EmitParameter {
            lifetime: 2.0,
            ..Default::default()
        });
        assert_eq!(particle.alpha(), 1.0);
        particle.elapsed = 0.5;
        assert_eq!(particle.alpha(), 0.75);
        particle.elapsed = 2.0;
        assert!(particle.is_expired());
    }

    #[test]
    fn test_instance_keeps_rgb() {
        let particle = Particle::from_emit(&EmitParameter {
            color: Vec4::new(0.2, 0.4, 0.6, 0.1),
            position: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        });
        let instance = particle.to_instance();
        assert_eq!(instance.color, [0.2, 0.4, 0.6, 1.0]);
        assert_eq!(instance.world[3], [1.0, 2.0, 3.0, 1.0]);
    }
}

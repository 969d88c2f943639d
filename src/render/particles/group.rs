//! 粒子组
//!
//! 一组共享形状、材质与混合模式的粒子。每帧 `update` 推进模拟并把存活粒子
//! 重新打包进实例缓冲区，`draw` 以一次实例化绘制提交。

use serde::{Deserialize, Serialize};

use crate::core::error::RenderResult;
use crate::render::backend::{Geometry, InstancedDraw, PrimitiveKind, RenderBackend};
use crate::render::blend::BlendMode;
use crate::render::gpu_buffer::GpuBuffer;
use crate::render::instance_batch::{DrawGeometry, InstancePayload};
use crate::render::material::TextureTable;
use crate::render::view_slot::ViewSlotAllocator;

use super::particle::{
    EmitParameter, Particle, ParticleInstance, ParticleMaterial, ParticleMaterialGpu,
};

/// 粒子形状
#[derive(Debug, Clone, PartialEq)]
pub enum ParticleShape {
    /// 程序化基础形状
    Primitive {
        kind: PrimitiveKind,
        texture: String,
    },
    /// 模型的网格列表
    Model(Vec<DrawGeometry>),
}

/// 粒子组容量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleGroupConfig {
    /// CPU 粒子池上限
    pub capacity: u32,
    /// 每帧最多绘制的实例数
    pub max_instances: u32,
}

impl Default for ParticleGroupConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            max_instances: 1024,
        }
    }
}

#[derive(Debug)]
pub struct ParticleGroup {
    name: String,
    config: ParticleGroupConfig,
    particles: Vec<Particle>,
    instances: GpuBuffer<ParticleInstance>,
    instance_count: u32,
    material: ParticleMaterial,
    material_buffer: GpuBuffer<ParticleMaterialGpu>,
    geometries: Vec<DrawGeometry>,
    blend_mode: BlendMode,
    is_visible: bool,
    is_rotating: bool,
}

impl ParticleGroup {
    pub fn new(
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
        name: impl Into<String>,
        shape: ParticleShape,
        textures: &TextureTable,
        config: ParticleGroupConfig,
    ) -> RenderResult<Self> {
        let name = name.into();

        let mut instances =
            GpuBuffer::structured(backend, views, ParticleInstance::LABEL, config.max_instances)?;
        instances.fill(ParticleInstance::WHITE);

        let material = ParticleMaterial::default();
        let mut material_buffer = GpuBuffer::constant(backend, "Particle Material")?;
        material_buffer.write(0, material.to_gpu());

        let geometries = match shape {
            ParticleShape::Primitive { kind, texture } => vec![DrawGeometry {
                geometry: Geometry::Primitive(kind),
                material: Some(material_buffer.id()),
                texture: Some(textures.resolve(&texture)),
            }],
            ParticleShape::Model(geometries) => geometries,
        };

        tracing::debug!(
            target: "particles",
            group = %name,
            capacity = config.capacity,
            max_instances = config.max_instances,
            "Particle group created"
        );

        Ok(Self {
            name,
            config,
            particles: Vec::with_capacity(config.capacity as usize),
            instances,
            instance_count: 0,
            material,
            material_buffer,
            geometries,
            blend_mode: BlendMode::Normal,
            is_visible: true,
            is_rotating: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> ParticleGroupConfig {
        self.config
    }

    /// 追加一个粒子，池已满时忽略
    pub fn add_particle(&mut self, param: &EmitParameter) {
        if self.particles.len() >= self.config.capacity as usize {
            tracing::trace!(target: "particles", group = %self.name, "Particle pool full, emission dropped");
            return;
        }
        self.particles.push(Particle::from_emit(param));
    }

    /// 推进模拟并重新打包实例数据
    ///
    /// 上一帧已到寿命的粒子在这里移除，其余粒子保持插入顺序。
    pub fn update(&mut self, dt: f32) {
        let max_instances = self.config.max_instances.min(self.instances.capacity());
        let rotating = self.is_rotating;
        let instances = &mut self.instances;
        let mut count = 0u32;

        self.particles.retain_mut(|particle| {
            if particle.is_expired() {
                return false;
            }

            particle.elapsed += dt;
            particle.transform.translate += particle.velocity * dt;
            if rotating {
                particle.transform.rotate.z += dt;
            }

            if count < max_instances {
                instances.write(count, particle.to_instance());
                count += 1;
            }
            true
        });

        self.instance_count = count;
        self.material_buffer.write(0, self.material.to_gpu());
    }

    /// 上传本帧实例与材质并提交绘制
    pub fn draw(&self, backend: &mut dyn RenderBackend) {
        if !self.is_visible || self.instance_count == 0 {
            return;
        }
        let Some(instance_view) = self.instances.view_slot() else {
            return;
        };

        self.instances.flush(backend, self.instance_count);
        self.material_buffer.flush_all(backend);

        for geometry in &self.geometries {
            backend.submit_instanced_draw(&InstancedDraw {
                pipeline: ParticleInstance::PIPELINE,
                blend_mode: self.blend_mode,
                geometry: geometry.geometry,
                instance_view,
                material: geometry.material,
                texture: geometry.texture,
                instance_count: self.instance_count,
            });
        }
    }

    /// 存活粒子数
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// 本帧写入实例缓冲区的数量
    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn instance(&self, index: u32) -> Option<&ParticleInstance> {
        if index >= self.instance_count {
            return None;
        }
        self.instances.get(index)
    }

    pub fn instance_view(&self) -> Option<crate::render::view_slot::ViewSlot> {
        self.instances.view_slot()
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.blend_mode = blend_mode;
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.is_visible = visible;
    }

    pub fn set_rotating(&mut self, rotating: bool) {
        self.is_rotating = rotating;
    }

    pub fn material(&self) -> &ParticleMaterial {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut ParticleMaterial {
        &mut self.material
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.instance_count = 0;
    }

    pub fn release(
        self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
    ) -> RenderResult<()> {
        tracing::debug!(target: "particles", group = %self.name, "Particle group released");
        self.instances.release(backend, views)?;
        self.material_buffer.release(backend, views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::{HeadlessBackend, PipelineKind};
    use glam::{Vec3, Vec4};
    use proptest::prelude::*;

    fn group(
        backend: &mut HeadlessBackend,
        views: &mut ViewSlotAllocator,
        capacity: u32,
        max_instances: u32,
    ) -> ParticleGroup {
        ParticleGroup::new(
            backend,
            views,
            "Test",
            ParticleShape::Primitive {
                kind: PrimitiveKind::Plane,
                texture: "circle.png".to_string(),
            },
            &TextureTable::new(),
            ParticleGroupConfig {
                capacity,
                max_instances,
            },
        )
        .unwrap()
    }

    fn emit(lifetime: f32) -> EmitParameter {
        EmitParameter {
            lifetime,
            ..Default::default()
        }
    }

    #[test]
    fn test_pool_capacity_is_enforced() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(4, 32);
        let mut group = group(&mut backend, &mut views, 5, 3);
        for _ in 0..7 {
            group.add_particle(&emit(10.0));
        }
        assert_eq!(group.len(), 5);

        group.update(0.016);
        assert_eq!(group.len(), 5);
        assert_eq!(group.instance_count(), 3);
    }

    #[test]
    fn test_update_integrates_and_ages() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(4, 32);
        let mut group = group(&mut backend, &mut views, 8, 8);
        group.add_particle(&EmitParameter {
            velocity: Vec3::new(2.0, 0.0, 0.0),
            color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            lifetime: 2.0,
            ..Default::default()
        });

        group.update(0.5);
        let particle = group.particles()[0];
        assert_eq!(particle.elapsed, 0.5);
        assert_eq!(particle.transform.translate, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(particle.transform.rotate.z, 0.0);

        let instance = group.instance(0).unwrap();
        assert_eq!(instance.color, [1.0, 0.0, 0.0, 0.75]);
        assert_eq!(instance.world[3], [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_rotating_group_spins_z() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(4, 32);
        let mut group = group(&mut backend, &mut views, 8, 8);
        group.set_rotating(true);
        group.add_particle(&emit(5.0));
        group.update(0.25);
        group.update(0.25);
        assert_eq!(group.particles()[0].transform.rotate.z, 0.5);
    }

    #[test]
    fn test_expired_particles_removed_in_order() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(4, 32);
        let mut group = group(&mut backend, &mut views, 8, 8);
        group.add_particle(&emit(1.0));
        group.add_particle(&emit(0.5));
        group.add_particle(&emit(1.0));

        // 第一次更新后第二个粒子到寿命，但本帧仍被保留
        group.update(0.5);
        assert_eq!(group.len(), 3);

        group.update(0.1);
        assert_eq!(group.len(), 2);
        assert!(group.particles().iter().all(|p| p.lifetime == 1.0));
        assert_eq!(group.instance_count(), 2);
    }

    #[test]
    fn test_draw_submits_instance_count() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(4, 32);
        let mut group = group(&mut backend, &mut views, 5, 3);
        group.set_blend_mode(BlendMode::Add);
        for _ in 0..5 {
            group.add_particle(&emit(10.0));
        }
        group.update(0.016);
        group.draw(&mut backend);

        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].pipeline, PipelineKind::Particle);
        assert_eq!(draws[0].blend_mode, BlendMode::Add);
        assert_eq!(draws[0].instance_count, 3);
        assert_eq!(Some(draws[0].instance_view), group.instance_view());
    }

    #[test]
    fn test_hidden_or_empty_group_draws_nothing() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(4, 32);
        let mut group = group(&mut backend, &mut views, 5, 3);
        group.update(0.016);
        group.draw(&mut backend);
        assert!(backend.draws().is_empty());

        group.add_particle(&emit(1.0));
        group.update(0.016);
        group.set_visible(false);
        group.draw(&mut backend);
        assert!(backend.draws().is_empty());
    }

    #[test]
    fn test_release_frees_slot() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(4, 32);
        let group = group(&mut backend, &mut views, 5, 3);
        assert_eq!(views.allocated_count(), 1);
        group.release(&mut backend, &mut views).unwrap();
        assert_eq!(views.allocated_count(), 0);
        assert_eq!(backend.buffer_count(), 0);
    }

    #[test]
    fn test_overshooting_step_keeps_alpha_in_range() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(4, 32);
        let mut group = group(&mut backend, &mut views, 4, 4);
        group.add_particle(&emit(1.0));

        group.update(0.6);
        group.update(0.6);
        // 本帧跨过寿命，仍被打包但不透明度为 0
        assert_eq!(group.instance_count(), 1);
        assert_eq!(group.instance(0).unwrap().color[3], 0.0);

        group.update(0.6);
        assert!(group.is_empty());
        assert_eq!(group.instance_count(), 0);
    }

    proptest! {
        #[test]
        fn pool_and_instance_caps_hold(
            spawns in 0u32..64,
            capacity in 1u32..32,
            max_instances in 1u32..32,
            lifetimes in prop::collection::vec(0.05f32..2.0, 64),
            steps in prop::collection::vec(0.001f32..0.5, 1..8),
        ) {
            let mut backend = HeadlessBackend::new();
            let mut views = ViewSlotAllocator::new(4, 32);
            let mut group = group(&mut backend, &mut views, capacity, max_instances);
            for i in 0..spawns {
                group.add_particle(&emit(lifetimes[i as usize]));
            }
            prop_assert_eq!(group.len(), spawns.min(capacity) as usize);

            for dt in steps {
                group.update(dt);
                prop_assert!(group.len() <= capacity as usize);
                prop_assert_eq!(group.instance_count(), (group.len() as u32).min(max_instances));
                for i in 0..group.instance_count() {
                    let alpha = group.instance(i).unwrap().color[3];
                    prop_assert!((0.0..=1.0).contains(&alpha));
                }
            }
        }

        #[test]
        fn alpha_strictly_decreases_until_removal(
            lifetime in 0.5f32..5.0,
            steps in prop::collection::vec(0.001f32..0.5, 1..40),
        ) {
            let mut backend = HeadlessBackend::new();
            let mut views = ViewSlotAllocator::new(4, 32);
            let mut group = group(&mut backend, &mut views, 1, 1);
            group.add_particle(&emit(lifetime));

            let mut previous = 1.0f32;
            for dt in steps {
                group.update(dt);
                let Some(instance) = group.instance(0) else {
                    prop_assert!(group.is_empty());
                    break;
                };
                prop_assert!(instance.color[3] < previous);
                previous = instance.color[3];
            }
        }
    }
}

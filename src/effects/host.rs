//! 特效宿主
//!
//! 特效状态机只通过 [`EffectHost`] 访问帧时间、发射器 / 粒子组查找、
//! 后处理参数与相机震动。[`FxWorld`] 是库内自带的实现。

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::render::backend::RenderBackend;
use crate::render::camera::CameraShake;
use crate::render::particles::{
    Emitter, EmitterManager, ParticleGroup, ParticleGroupConfig, ParticleGroupManager,
};
use crate::render::postprocess::PostEffectParams;

pub trait EffectHost {
    /// 本帧时间步长（秒）
    fn delta_time(&self) -> f32;

    fn find_emitter(&mut self, name: &str) -> Option<&mut Emitter>;

    fn find_particle_group(&mut self, name: &str) -> Option<&mut ParticleGroup>;

    /// 设置集中模糊的中心与强度
    fn apply_radial_blur(&mut self, center: Vec2, intensity: f32);

    fn shake_camera(&mut self, intensity: f32, duration: f32);
}

/// 粒子组、发射器与帧级服务的持有者
///
/// 每帧顺序：`begin_frame` → 特效 `update` → `update` → `draw`。
#[derive(Debug)]
pub struct FxWorld {
    groups: ParticleGroupManager,
    emitters: EmitterManager,
    post_effects: PostEffectParams,
    camera_shake: CameraShake,
    rng: StdRng,
    delta_time: f32,
    frame: u64,
}

impl FxWorld {
    pub fn new(group_config: ParticleGroupConfig, seed: u64) -> Self {
        Self {
            groups: ParticleGroupManager::new(group_config),
            emitters: EmitterManager::new(),
            post_effects: PostEffectParams::default(),
            camera_shake: CameraShake::new(),
            rng: StdRng::seed_from_u64(seed),
            delta_time: 0.0,
            frame: 0,
        }
    }

    pub fn groups(&self) -> &ParticleGroupManager {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut ParticleGroupManager {
        &mut self.groups
    }

    pub fn emitters(&self) -> &EmitterManager {
        &self.emitters
    }

    pub fn emitters_mut(&mut self) -> &mut EmitterManager {
        &mut self.emitters
    }

    pub fn post_effects(&self) -> &PostEffectParams {
        &self.post_effects
    }

    pub fn camera_shake(&self) -> &CameraShake {
        &self.camera_shake
    }

    /// 当前相机偏移
    pub fn camera_offset(&self) -> Vec3 {
        self.camera_shake.offset()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn begin_frame(&mut self, dt: f32) {
        self.delta_time = dt;
        self.post_effects.begin_frame();
    }

    /// 发射、模拟与相机震动
    pub fn update(&mut self) {
        let dt = self.delta_time;
        self.emitters.update_all(dt, &mut self.groups, &mut self.rng);
        self.groups.update_all(dt);
        self.camera_shake.update(dt, &mut self.rng);
        self.frame += 1;
    }

    pub fn draw(&self, backend: &mut dyn RenderBackend) {
        self.groups.draw_all(backend);
    }
}

impl EffectHost for FxWorld {
    fn delta_time(&self) -> f32 {
        self.delta_time
    }

    fn find_emitter(&mut self, name: &str) -> Option<&mut Emitter> {
        self.emitters.find_mut(name)
    }

    fn find_particle_group(&mut self, name: &str) -> Option<&mut ParticleGroup> {
        self.groups.find_mut(name)
    }

    fn apply_radial_blur(&mut self, center: Vec2, intensity: f32) {
        self.post_effects.set_radial_blur(center, intensity);
    }

    fn shake_camera(&mut self, intensity: f32, duration: f32) {
        self.camera_shake.start(intensity, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::{HeadlessBackend, PrimitiveKind};
    use crate::render::material::TextureTable;
    use crate::render::postprocess::PostEffectKind;
    use crate::render::view_slot::ViewSlotAllocator;

    #[test]
    fn test_world_frame_cycle() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(8, 32);
        let mut world = FxWorld::new(ParticleGroupConfig::default(), 1);
        world
            .groups_mut()
            .create_primitive(
                &mut backend,
                &mut views,
                "Dust",
                PrimitiveKind::Plane,
                "",
                &TextureTable::new(),
            )
            .unwrap();
        let emitter = world.emitters_mut().create("Dust", Vec3::ZERO).unwrap();
        emitter.add_particle_group("Dust");
        emitter.setting_mut().count = 4;
        emitter.emit_all();

        world.begin_frame(0.016);
        world.update();
        world.draw(&mut backend);

        assert_eq!(world.groups().total_particles(), 4);
        assert_eq!(backend.draws().len(), 1);
        assert_eq!(world.frame(), 1);
    }

    #[test]
    fn test_host_services() {
        let mut world = FxWorld::new(ParticleGroupConfig::default(), 1);
        world.begin_frame(0.1);
        assert_eq!(world.delta_time(), 0.1);

        world.apply_radial_blur(Vec2::new(0.5, 0.5), 0.01);
        assert_eq!(world.post_effects().requested(), &[PostEffectKind::RadialBlur]);

        world.shake_camera(0.5, 0.8);
        assert!(world.camera_shake().is_active());

        world.begin_frame(0.1);
        assert!(world.post_effects().requested().is_empty());
        assert!(world.find_emitter("Nope").is_none());
    }
}

//! 破坏特效
//!
//! ```text
//! Electric ──electric_time──▶ Haze ──electric_time──▶ Explosion ──explosion_time──▶ Finish ──finish_time──▶ (finished)
//!                             靄重复发射开启          星屑一次性发射 / 靄停止 / 相机震动        环淡出
//! ```
//!
//! 爆炸阶段按 `t = timer / explosion_time` 采样集中模糊、环半径与闪光曲线。
//! 完成后不再更新，也不会自行销毁，由持有者决定何时丢弃。

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::animation::{Easing, LoopMode, SimpleAnimation};
use crate::core::error::{ParticleError, ParticleResult};
use crate::core::transform::make_affine;
use crate::impl_default;
use crate::render::blend::BlendMode;
use crate::render::particles::{EmitType, EmitterSetting};
use crate::render::primitives::{PlaneData, PrimitiveDrawers, PrimitiveMaterial, RingData};

use super::host::EffectHost;

/// 靄的发射器 / 粒子组名称
pub const HAZE: &str = "Haze";
/// 星屑的发射器 / 粒子组名称
pub const STAR: &str = "Star";

const DARK_ORANGE: Vec4 = Vec4::new(1.0, 0.549, 0.0, 1.0);
const SKY_BLUE: Vec4 = Vec4::new(0.529, 0.808, 0.922, 1.0);
const BLUE: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

const RADIAL_BLUR_CENTER: Vec2 = Vec2::new(0.5, 0.5);
const SHAKE_INTENSITY: f32 = 0.5;
const SHAKE_DURATION: f32 = 0.8;

pub const RING_COUNT: usize = 4;

const DEFAULT_RING_ROTATES: [Vec3; RING_COUNT] = [
    Vec3::new(0.7, 1.2, -0.43),
    Vec3::new(1.11, 0.0, 0.0),
    Vec3::new(0.0, 1.4, -0.9),
    Vec3::new(0.0, -1.17, 0.92),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakPhase {
    Electric,
    Haze,
    Explosion,
    Finish,
}

/// 阶段时长与贴图
///
/// 时长必须为正，这里不做校验。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakEffectConfig {
    /// Electric 与 Haze 阶段各自的时长
    pub electric_time: f32,
    pub explosion_time: f32,
    pub finish_time: f32,
    pub flash_texture: String,
    pub ring_texture: String,
}

impl_default!(BreakEffectConfig {
    electric_time: 1.0,
    explosion_time: 1.0,
    finish_time: 1.0,
    flash_texture: "Circle2.png".to_string(),
    ring_texture: "gradation.png".to_string(),
});

/// 靄的发射设置
pub fn haze_setting() -> EmitterSetting {
    EmitterSetting {
        emit_type: EmitType::Random,
        min_color: DARK_ORANGE,
        max_color: DARK_ORANGE,
        min_scale: 3.0,
        max_scale: 3.0,
        min_lifetime: 1.0,
        max_lifetime: 2.0,
        count: 20,
        frequency: 0.1,
        min_velocity: Vec3::new(-3.5, -2.5, -2.5),
        max_velocity: Vec3::new(3.5, 2.5, 2.5),
        ..Default::default()
    }
}

/// 星屑的发射设置
pub fn star_setting() -> EmitterSetting {
    EmitterSetting {
        emit_type: EmitType::Random,
        min_color: SKY_BLUE,
        max_color: SKY_BLUE,
        min_lifetime: 2.5,
        max_lifetime: 3.0,
        count: 1000,
        min_translate: Vec3::splat(-2.0),
        max_translate: Vec3::splat(2.0),
        min_velocity: Vec3::splat(-1.0),
        max_velocity: Vec3::splat(1.0),
        ..Default::default()
    }
}

#[derive(Debug, Clone)]
pub struct BreakEffect {
    config: BreakEffectConfig,
    core_position: Vec3,
    phase: BreakPhase,
    timer: f32,
    is_finished: bool,

    flash_plane: PlaneData,
    flash_material: PrimitiveMaterial,
    flash_scale: f32,
    flash_scale_animation: SimpleAnimation<f32>,
    flash_alpha_animation: SimpleAnimation<f32>,

    rings: [RingData; RING_COUNT],
    ring_rotates: [Vec3; RING_COUNT],
    ring_material: PrimitiveMaterial,
    /// [0] 用于前两个环，[1] 用于后两个环
    ring_outer_animations: [SimpleAnimation<f32>; 2],
    ring_inner_animations: [SimpleAnimation<f32>; 2],

    radial_blur_animation: SimpleAnimation<f32>,
    radial_blur: f32,
}

impl BreakEffect {
    /// 在 `position` 处创建特效并配置 "Haze" / "Star" 发射器与粒子组
    ///
    /// 宿主中必须已注册同名的发射器和粒子组。
    pub fn new(
        host: &mut dyn EffectHost,
        position: Vec3,
        config: BreakEffectConfig,
    ) -> ParticleResult<Self> {
        Self::configure_emitter(host, HAZE, position, haze_setting(), BlendMode::Add)?;
        Self::configure_emitter(host, STAR, position, star_setting(), BlendMode::Normal)?;

        tracing::info!(target: "effects", ?position, "Break effect started");

        Ok(Self {
            core_position: position,
            phase: BreakPhase::Electric,
            timer: 0.0,
            is_finished: false,

            flash_plane: PlaneData::default(),
            flash_material: PrimitiveMaterial {
                color: BLUE,
                texture: config.flash_texture.clone(),
                blend_mode: BlendMode::Add,
            },
            flash_scale: 1.0,
            flash_scale_animation: SimpleAnimation::new(1.0, 30.0, Easing::EaseOutQuart),
            flash_alpha_animation: SimpleAnimation::new(1.0, 0.0, Easing::EaseInQuart),

            rings: [RingData::default(); RING_COUNT],
            ring_rotates: DEFAULT_RING_ROTATES,
            ring_material: PrimitiveMaterial {
                color: Vec4::new(1.0, 0.5, 0.0, 1.0),
                texture: config.ring_texture.clone(),
                blend_mode: BlendMode::Normal,
            },
            ring_outer_animations: [
                SimpleAnimation::new(1.0, 3.0, Easing::EaseOutQuart),
                SimpleAnimation::new(1.0, 5.0, Easing::EaseOutQuart),
            ],
            ring_inner_animations: [
                SimpleAnimation::new(0.8, 2.0, Easing::EaseOutQuart),
                SimpleAnimation::new(0.8, 4.0, Easing::EaseOutQuart),
            ],

            radial_blur_animation: SimpleAnimation::new(0.0, 0.01, Easing::EaseInOutSine)
                .with_loop(LoopMode::PingPong),
            radial_blur: 0.0,

            config,
        })
    }

    fn configure_emitter(
        host: &mut dyn EffectHost,
        name: &str,
        position: Vec3,
        setting: EmitterSetting,
        blend_mode: BlendMode,
    ) -> ParticleResult<()> {
        let emitter = host
            .find_emitter(name)
            .ok_or_else(|| ParticleError::EmitterNotFound(name.to_string()))?;
        emitter.set_emit_position(position);
        emitter.add_particle_group(name);
        emitter.set_setting(setting);

        let group = host
            .find_particle_group(name)
            .ok_or_else(|| ParticleError::GroupNotFound(name.to_string()))?;
        group.set_blend_mode(blend_mode);
        Ok(())
    }

    pub fn phase(&self) -> BreakPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn core_position(&self) -> Vec3 {
        self.core_position
    }

    pub fn config(&self) -> &BreakEffectConfig {
        &self.config
    }

    pub fn set_ring_rotates(&mut self, rotates: [Vec3; RING_COUNT]) {
        self.ring_rotates = rotates;
    }

    pub fn set_ring_color(&mut self, color: Vec4) {
        self.ring_material.color = color;
    }

    pub fn rings(&self) -> &[RingData; RING_COUNT] {
        &self.rings
    }

    pub fn ring_material(&self) -> &PrimitiveMaterial {
        &self.ring_material
    }

    pub fn flash_scale(&self) -> f32 {
        self.flash_scale
    }

    pub fn flash_material(&self) -> &PrimitiveMaterial {
        &self.flash_material
    }

    /// 最近一次采样的集中模糊强度
    pub fn radial_blur(&self) -> f32 {
        self.radial_blur
    }

    pub fn update(&mut self, host: &mut dyn EffectHost) {
        if self.is_finished {
            return;
        }

        self.timer += host.delta_time();
        match self.phase {
            BreakPhase::Electric => self.update_electric(host),
            BreakPhase::Haze => self.update_haze(host),
            BreakPhase::Explosion => self.update_explosion(host),
            BreakPhase::Finish => self.update_finish(),
        }
    }

    fn enter(&mut self, phase: BreakPhase) {
        tracing::debug!(target: "effects", from = ?self.phase, to = ?phase, "Break effect phase change");
        self.timer = 0.0;
        self.phase = phase;
    }

    fn update_electric(&mut self, host: &mut dyn EffectHost) {
        if self.timer >= self.config.electric_time {
            self.enter(BreakPhase::Haze);
            if let Some(haze) = host.find_emitter(HAZE) {
                haze.set_repeat(true);
            }
        }
    }

    fn update_haze(&mut self, host: &mut dyn EffectHost) {
        if self.timer >= self.config.electric_time {
            self.enter(BreakPhase::Explosion);
            if let Some(star) = host.find_emitter(STAR) {
                star.emit_all();
            }
            if let Some(haze) = host.find_emitter(HAZE) {
                haze.set_repeat(false);
            }
            host.shake_camera(SHAKE_INTENSITY, SHAKE_DURATION);
        }
    }

    fn update_explosion(&mut self, host: &mut dyn EffectHost) {
        let t = self.timer / self.config.explosion_time;

        self.radial_blur = self.radial_blur_animation.value(t * 2.0);
        host.apply_radial_blur(RADIAL_BLUR_CENTER, self.radial_blur);

        for (i, ring) in self.rings.iter_mut().enumerate() {
            let set = i / 2;
            ring.outer_radius = self.ring_outer_animations[set].value(t);
            ring.inner_radius = self.ring_inner_animations[set].value(t);
        }

        self.flash_scale = self.flash_scale_animation.value(t);
        self.flash_material.color.w = self.flash_alpha_animation.value(t);

        if self.timer >= self.config.explosion_time {
            self.enter(BreakPhase::Finish);
        }
    }

    fn update_finish(&mut self) {
        self.ring_material.color.w = 1.0 - self.timer / self.config.finish_time;
        if self.timer >= self.config.finish_time {
            self.timer = 0.0;
            self.is_finished = true;
            tracing::info!(target: "effects", "Break effect finished");
        }
    }

    /// 提交本帧的闪光平面与环
    pub fn draw(&self, drawers: &mut PrimitiveDrawers) {
        match self.phase {
            BreakPhase::Electric | BreakPhase::Haze => {}
            BreakPhase::Explosion => {
                let world = make_affine(
                    Vec3::new(self.flash_scale, self.flash_scale, 1.0),
                    Vec3::ZERO,
                    self.core_position,
                );
                drawers.add_plane(world, &self.flash_plane, &self.flash_material);
                self.draw_rings(drawers);
            }
            BreakPhase::Finish => self.draw_rings(drawers),
        }
    }

    fn draw_rings(&self, drawers: &mut PrimitiveDrawers) {
        for (ring, rotate) in self.rings.iter().zip(self.ring_rotates.iter()) {
            let world = make_affine(Vec3::ONE, *rotate, self.core_position);
            drawers.add_ring(world, ring, &self.ring_material);
        }
    }
}

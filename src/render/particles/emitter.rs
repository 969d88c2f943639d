//! 粒子发射器
//!
//! 发射器本身不持有粒子，只按设置生成 [`EmitParameter`] 并投放到
//! 关联的粒子组（按名称查找）。

use glam::{Vec3, Vec4};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::manager::ParticleGroupManager;
use super::particle::EmitParameter;

/// 参数取值方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmitType {
    /// 固定取各范围的最小值
    Fixed,
    /// 在 [min, max] 内逐分量均匀随机
    Random,
}

/// 发射设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterSetting {
    pub emit_type: EmitType,
    pub min_color: Vec4,
    pub max_color: Vec4,
    /// 均匀缩放
    pub min_scale: f32,
    pub max_scale: f32,
    pub min_lifetime: f32,
    pub max_lifetime: f32,
    pub min_velocity: Vec3,
    pub max_velocity: Vec3,
    /// 相对发射位置的偏移
    pub min_translate: Vec3,
    pub max_translate: Vec3,
    /// 每次发射的粒子数
    pub count: u32,
    /// 重复发射间隔（秒）
    pub frequency: f32,
    pub is_repeat: bool,
}

impl Default for EmitterSetting {
    fn default() -> Self {
        Self {
            emit_type: EmitType::Random,
            min_color: Vec4::ONE,
            max_color: Vec4::ONE,
            min_scale: 1.0,
            max_scale: 1.0,
            min_lifetime: 1.0,
            max_lifetime: 1.0,
            min_velocity: Vec3::ZERO,
            max_velocity: Vec3::ZERO,
            min_translate: Vec3::ZERO,
            max_translate: Vec3::ZERO,
            count: 1,
            frequency: 1.0,
            is_repeat: false,
        }
    }
}

#[inline]
fn sample_f32<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + (max - min) * rng.gen::<f32>()
}

#[inline]
fn sample_vec3<R: Rng>(rng: &mut R, min: Vec3, max: Vec3) -> Vec3 {
    Vec3::new(
        sample_f32(rng, min.x, max.x),
        sample_f32(rng, min.y, max.y),
        sample_f32(rng, min.z, max.z),
    )
}

#[inline]
fn sample_vec4<R: Rng>(rng: &mut R, min: Vec4, max: Vec4) -> Vec4 {
    Vec4::new(
        sample_f32(rng, min.x, max.x),
        sample_f32(rng, min.y, max.y),
        sample_f32(rng, min.z, max.z),
        sample_f32(rng, min.w, max.w),
    )
}

impl EmitterSetting {
    /// 以 `origin` 为发射中心生成一个粒子参数
    pub fn sample<R: Rng>(&self, origin: Vec3, rng: &mut R) -> EmitParameter {
        match self.emit_type {
            EmitType::Fixed => EmitParameter {
                position: origin + self.min_translate,
                rotate: Vec3::ZERO,
                scale: Vec3::splat(self.min_scale),
                velocity: self.min_velocity,
                color: self.min_color,
                lifetime: self.min_lifetime,
            },
            EmitType::Random => EmitParameter {
                position: origin + sample_vec3(rng, self.min_translate, self.max_translate),
                rotate: Vec3::ZERO,
                scale: Vec3::splat(sample_f32(rng, self.min_scale, self.max_scale)),
                velocity: sample_vec3(rng, self.min_velocity, self.max_velocity),
                color: sample_vec4(rng, self.min_color, self.max_color),
                lifetime: sample_f32(rng, self.min_lifetime, self.max_lifetime),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Emitter {
    name: String,
    position: Vec3,
    setting: EmitterSetting,
    groups: Vec<String>,
    timer: f32,
    pending_bursts: u32,
}

impl Emitter {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            setting: EmitterSetting::default(),
            groups: Vec::new(),
            timer: 0.0,
            pending_bursts: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_emit_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn setting(&self) -> &EmitterSetting {
        &self.setting
    }

    pub fn setting_mut(&mut self) -> &mut EmitterSetting {
        &mut self.setting
    }

    pub fn set_setting(&mut self, setting: EmitterSetting) {
        self.setting = setting;
    }

    /// 关联粒子组，重复关联同名组无效
    pub fn add_particle_group(&mut self, group: impl Into<String>) {
        let group = group.into();
        if !self.groups.contains(&group) {
            self.groups.push(group);
        }
    }

    pub fn particle_groups(&self) -> &[String] {
        &self.groups
    }

    pub fn is_repeat(&self) -> bool {
        self.setting.is_repeat
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.setting.is_repeat = repeat;
    }

    /// 在下一次 `update` 时发射一轮 `count` 个粒子
    pub fn emit_all(&mut self) {
        self.pending_bursts += 1;
    }

    pub fn update<R: Rng>(&mut self, dt: f32, groups: &mut ParticleGroupManager, rng: &mut R) {
        for _ in 0..std::mem::take(&mut self.pending_bursts) {
            self.emit(groups, rng);
        }

        if !self.setting.is_repeat {
            self.timer = 0.0;
            return;
        }

        if self.setting.frequency <= 0.0 {
            // 间隔非正时每帧发射一次
            self.timer = 0.0;
            self.emit(groups, rng);
            return;
        }

        self.timer += dt;
        while self.timer >= self.setting.frequency {
            self.timer -= self.setting.frequency;
            self.emit(groups, rng);
        }
    }

    fn emit<R: Rng>(&self, groups: &mut ParticleGroupManager, rng: &mut R) {
        for name in &self.groups {
            let Some(group) = groups.find_mut(name) else {
                tracing::debug!(target: "particles", emitter = %self.name, group = %name, "Linked group missing, burst skipped");
                continue;
            };
            for _ in 0..self.setting.count {
                group.add_particle(&self.setting.sample(self.position, rng));
            }
        }
    }
}

//! 相机震动

use glam::Vec3;
use rand::Rng;

/// 随机偏移按剩余时间线性衰减到零
#[derive(Debug, Clone, Default)]
pub struct CameraShake {
    intensity: f32,
    duration: f32,
    remaining: f32,
    offset: Vec3,
}

impl CameraShake {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始震动，覆盖正在进行的震动
    pub fn start(&mut self, intensity: f32, duration: f32) {
        tracing::debug!(target: "render", intensity, duration, "Camera shake started");
        self.intensity = intensity;
        self.duration = duration;
        self.remaining = duration;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    /// 当前帧的相机偏移
    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn update<R: Rng>(&mut self, dt: f32, rng: &mut R) -> Vec3 {
        if !self.is_active() || self.duration <= 0.0 {
            self.remaining = 0.0;
            self.offset = Vec3::ZERO;
            return self.offset;
        }

        self.remaining = (self.remaining - dt).max(0.0);
        let amplitude = self.intensity * (self.remaining / self.duration);
        let mut sample = || (rng.gen::<f32>() * 2.0 - 1.0) * amplitude;
        self.offset = Vec3::new(sample(), sample(), sample());
        self.offset
    }
}

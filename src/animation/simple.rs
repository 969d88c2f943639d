//! 两端点插值动画
//!
//! 进度不要求调用方截断到 [0, 1]，超出部分按循环模式处理。

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::easing::Easing;

/// 可插值的值类型
pub trait Interpolate: Copy {
    /// `t == 0` 精确返回 `a`，`t == 1` 精确返回 `b`
    fn interpolate(a: Self, b: Self, t: f32) -> Self;
}

macro_rules! impl_interpolate {
    ($($ty:ty),*) => {
        $(
            impl Interpolate for $ty {
                #[inline]
                fn interpolate(a: Self, b: Self, t: f32) -> Self {
                    a * (1.0 - t) + b * t
                }
            }
        )*
    };
}

impl_interpolate!(f32, Vec2, Vec3, Vec4);

/// 超出 [0, 1] 的进度如何处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopMode {
    /// 截断并保持端点值
    #[default]
    None,
    /// 周期 1 循环
    Restart,
    /// 周期 2 往返
    PingPong,
}

impl LoopMode {
    /// 把任意进度映射到 [0, 1]
    pub fn wrap(self, progress: f32) -> f32 {
        match self {
            LoopMode::None => progress.clamp(0.0, 1.0),
            LoopMode::Restart => {
                let q = progress.rem_euclid(1.0);
                if q == 0.0 && progress > 0.0 {
                    1.0
                } else {
                    q
                }
            }
            LoopMode::PingPong => {
                let q = progress.rem_euclid(2.0);
                if q > 1.0 {
                    2.0 - q
                } else {
                    q
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleAnimation<T: Interpolate> {
    start: T,
    end: T,
    easing: Easing,
    loop_mode: LoopMode,
}

impl<T: Interpolate> SimpleAnimation<T> {
    pub fn new(start: T, end: T, easing: Easing) -> Self {
        Self {
            start,
            end,
            easing,
            loop_mode: LoopMode::None,
        }
    }

    pub fn with_loop(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }

    pub fn start(&self) -> T {
        self.start
    }

    pub fn end(&self) -> T {
        self.end
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn value(&self, progress: f32) -> T {
        let t = self.easing.apply(self.loop_mode.wrap(progress));
        T::interpolate(self.start, self.end, t)
    }
}

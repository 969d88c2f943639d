//! CPU 模拟 + GPU 实例化绘制的粒子系统
//!
//! ## 架构设计
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Particle Pipeline                     │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Emission (Emitter)                                   │
//! │     - 按设置采样位置 / 速度 / 颜色 / 寿命                  │
//! │     - 一次性发射或按间隔重复发射                           │
//! │                                                          │
//! │  2. Simulation (ParticleGroup::update)                   │
//! │     - 移除到寿命的粒子（保持顺序）                          │
//! │     - 积分位移、累计存活时间                               │
//! │     - 重新打包实例数据（世界矩阵 + 颜色）                   │
//! │                                                          │
//! │  3. Rendering (ParticleGroup::draw)                      │
//! │     - 上传实例缓冲区，一次实例化绘制                        │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod emitter;
pub mod group;
pub mod manager;
pub mod particle;

pub use emitter::{EmitType, Emitter, EmitterSetting};
pub use group::{ParticleGroup, ParticleGroupConfig, ParticleShape};
pub use manager::{EmitterManager, ParticleGroupManager};
pub use particle::{
    EmitParameter, Particle, ParticleInstance, ParticleMaterial, ParticleMaterialGpu,
};

//! 统一错误处理模块
//!
//! 提供特效核心范围内的错误类型定义
//!
//! ## 错误类型分层
//!
//! - **渲染资源错误** (`RenderError`): 缓冲区创建失败、描述符槽耗尽等，属于不可恢复错误
//! - **粒子/发射器错误** (`ParticleError`): 名称重复、查找失败
//!
//! 容量溢出（粒子池或 GPU 实例上限）不是错误，直接静默丢弃。

use thiserror::Error;

use crate::config::ConfigError;

/// 引擎核心错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Initialization error: {0}")]
    Init(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Particle error: {0}")]
    Particle(#[from] ParticleError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 渲染资源错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Failed to request adapter: no compatible GPU found")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    DeviceRequest(String),

    #[error("Failed to create buffer '{label}' ({size} bytes): {reason}")]
    BufferCreation {
        label: String,
        size: u64,
        reason: String,
    },

    #[error("View slot table exhausted (capacity {capacity})")]
    ViewSlotsExhausted { capacity: u32 },

    #[error("View slot {0} is not allocated")]
    InvalidViewSlot(u32),
}

/// 粒子组 / 发射器错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParticleError {
    #[error("Name already registered: {0}")]
    DuplicateName(String),

    #[error("Particle group not found: {0}")]
    GroupNotFound(String),

    #[error("Emitter not found: {0}")]
    EmitterNotFound(String),
}

/// 引擎结果类型别名
pub type EngineResult<T> = Result<T, EngineError>;
pub type RenderResult<T> = Result<T, RenderError>;
pub type ParticleResult<T> = Result<T, ParticleError>;

//! 核心模块
//!
//! - `error` - 错误类型定义
//! - `transform` - 变换与矩阵工具
//! - `logging` - 日志初始化

pub mod error;
pub mod logging;
pub mod transform;
#[macro_use]
pub mod macros;

// 重新导出错误类型
pub use error::{
    EngineError, EngineResult, ParticleError, ParticleResult, RenderError, RenderResult,
};
pub use logging::init_logging;
pub use transform::{make_affine, make_rotate_xyz, make_uv_matrix, Transform3};

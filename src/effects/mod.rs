//! 特效状态机
//!
//! - `host` - 特效访问引擎服务的接口与库内实现
//! - `break_effect` - 四阶段破坏特效

pub mod break_effect;
pub mod host;

pub use break_effect::{BreakEffect, BreakEffectConfig, BreakPhase};
pub use host::{EffectHost, FxWorld};

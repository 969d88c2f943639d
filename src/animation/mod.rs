//! 动画曲线模块
//!
//! 提供缓动函数和两端点插值动画。
//!
//! ## 使用示例
//!
//! ```rust
//! use fx_engine::animation::{Easing, LoopMode, SimpleAnimation};
//!
//! // 0 → 0.01 往返
//! let blur = SimpleAnimation::new(0.0f32, 0.01, Easing::EaseInOutSine)
//!     .with_loop(LoopMode::PingPong);
//! assert_eq!(blur.value(1.0), 0.01);
//! assert_eq!(blur.value(2.0), 0.0);
//! ```

pub mod easing;
pub mod simple;

pub use easing::Easing;
pub use simple::{Interpolate, LoopMode, SimpleAnimation};

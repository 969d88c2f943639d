//! 音频模块
//!
//! 音频解码与混音不在本 crate 内，这里只提供语音生命周期的追踪。

pub mod voices;

pub use voices::{Voice, VoiceRegistry};

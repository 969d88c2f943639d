//! 播放中语音的注册表
//!
//! 播放与混音由外部音频后端完成；这里只按名称追踪仍在播放的语音，
//! 负责在停止、清理或注册表销毁时让它们停下。

use std::collections::HashMap;

/// 一个由外部音频后端创建的语音
pub trait Voice {
    fn stop(&mut self);

    /// 缓冲区已播完
    fn is_finished(&self) -> bool;
}

#[derive(Debug)]
pub struct VoiceRegistry<V: Voice> {
    playing: HashMap<String, Vec<V>>,
    looping: HashMap<String, V>,
}

impl<V: Voice> Default for VoiceRegistry<V> {
    fn default() -> Self {
        Self {
            playing: HashMap::new(),
            looping: HashMap::new(),
        }
    }
}

impl<V: Voice> VoiceRegistry<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追踪一次性播放的语音，同名可以同时存在多个
    pub fn play(&mut self, name: &str, voice: V) {
        self.playing.entry(name.to_string()).or_default().push(voice);
    }

    /// 开始循环播放；同名已在循环时不创建新语音并返回 `false`
    pub fn play_looping<F>(&mut self, name: &str, create: F) -> bool
    where
        F: FnOnce() -> V,
    {
        if self.looping.contains_key(name) {
            tracing::debug!(target: "audio", sound = name, "Already looping, request ignored");
            return false;
        }
        self.looping.insert(name.to_string(), create());
        true
    }

    pub fn stop(&mut self, name: &str) {
        if let Some(voices) = self.playing.remove(name) {
            for mut voice in voices {
                voice.stop();
            }
        }
    }

    pub fn stop_looping(&mut self, name: &str) {
        if let Some(mut voice) = self.looping.remove(name) {
            voice.stop();
        }
    }

    /// 同时停止一次性与循环播放
    pub fn stop_all(&mut self, name: &str) {
        self.stop(name);
        self.stop_looping(name);
    }

    /// 移除已播完的一次性语音
    pub fn cleanup_finished(&mut self) {
        self.playing.retain(|_, voices| {
            voices.retain(|voice| !voice.is_finished());
            !voices.is_empty()
        });
    }

    pub fn playing_count(&self, name: &str) -> usize {
        self.playing.get(name).map_or(0, Vec::len)
    }

    pub fn is_looping(&self, name: &str) -> bool {
        self.looping.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.playing.is_empty() && self.looping.is_empty()
    }

    /// 停止并移除所有语音
    pub fn drain(&mut self) {
        let count = self.playing.values().map(Vec::len).sum::<usize>() + self.looping.len();
        for (_, voices) in self.playing.drain() {
            for mut voice in voices {
                voice.stop();
            }
        }
        for (_, mut voice) in self.looping.drain() {
            voice.stop();
        }
        if count > 0 {
            tracing::debug!(target: "audio", count, "Voices drained");
        }
    }
}

impl<V: Voice> Drop for VoiceRegistry<V> {
    fn drop(&mut self) {
        self.drain();
    }
}

/// 统一配置系统
///
/// 提供TOML/JSON配置文件与环境变量覆盖
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub mod render;

pub use render::RenderConfig;

use crate::effects::BreakEffectConfig;
use crate::impl_default;
use crate::render::particles::ParticleGroupConfig;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 特效核心主配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxConfig {
    /// 渲染资源配置
    pub render: RenderConfig,

    /// 粒子组默认容量
    pub particles: ParticleGroupConfig,

    /// 破坏特效
    pub break_effect: BreakEffectConfig,

    /// 日志配置
    pub logging: LoggingConfig,
}

impl FxConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    ///
    /// 无法解析的值保留原配置并输出警告。
    pub fn apply_env_overrides(&mut self) {
        // 渲染配置
        env_override("FX_VIEW_SLOT_CAPACITY", &mut self.render.view_slot_capacity);
        env_override("FX_RING_MAX_INSTANCES", &mut self.render.ring_max_instances);
        env_override("FX_PLANE_MAX_INSTANCES", &mut self.render.plane_max_instances);
        env_override("FX_LINE_MAX_INSTANCES", &mut self.render.line_max_instances);
        env_override("FX_MODEL_MAX_INSTANCES", &mut self.render.model_max_instances);

        // 粒子配置
        env_override("FX_PARTICLE_CAPACITY", &mut self.particles.capacity);
        env_override("FX_PARTICLE_MAX_INSTANCES", &mut self.particles.max_instances);

        // 破坏特效
        env_override("FX_ELECTRIC_TIME", &mut self.break_effect.electric_time);
        env_override("FX_EXPLOSION_TIME", &mut self.break_effect.explosion_time);
        env_override("FX_FINISH_TIME", &mut self.break_effect.finish_time);

        env_override("FX_LOG_LEVEL", &mut self.logging.level);
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.render.validate()?;
        if self.particles.capacity == 0 || self.particles.max_instances == 0 {
            return Err(ConfigError::ValidationError(
                "Particle group capacities must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./fx.toml
    /// 2. ./fx.json
    /// 3. 用户配置目录下的 fx_engine/fx.toml
    /// 4. 使用默认配置
    pub fn load_or_default() -> Self {
        let mut candidates = vec![PathBuf::from("fx.toml"), PathBuf::from("fx.json")];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("fx_engine").join("fx.toml"));
        }
        Self::load_first(&candidates)
    }

    /// 按顺序尝试候选路径，`.json` 后缀按JSON解析，其余按TOML
    pub fn load_first(candidates: &[PathBuf]) -> Self {
        for path in candidates {
            if !path.exists() {
                continue;
            }
            let loaded = if path.extension().is_some_and(|ext| ext == "json") {
                Self::from_json_file(path)
            } else {
                Self::from_toml_file(path)
            };
            match loaded {
                Ok(config) => {
                    tracing::info!(target: "config", path = %path.display(), "Loaded config");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(target: "config", path = %path.display(), error = %e, "Skipping config file");
                }
            }
        }

        tracing::info!(target: "config", "Using default configuration");
        Self::default()
    }
}

fn env_override<T: FromStr>(key: &str, target: &mut T) {
    if let Ok(val) = env::var(key) {
        match val.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => {
                tracing::warn!(target: "config", key, value = %val, "Ignoring unparsable override")
            }
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,

    /// 是否输出到控制台
    pub log_to_console: bool,
}

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    log_to_console: true,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::ParseError(format!("Unknown log level: {other}"))),
        }
    }
}

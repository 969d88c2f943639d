use super::{ConfigError, ConfigResult};
use crate::impl_default;
use crate::render::primitives::PrimitiveLimits;
use serde::{Deserialize, Serialize};

/// 渲染资源配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// 描述符表的槽数
    pub view_slot_capacity: u32,

    /// 单个描述符的字节步长
    pub descriptor_size: u32,

    /// 每种混合模式下的实例上限
    pub ring_max_instances: u32,
    pub plane_max_instances: u32,
    pub line_max_instances: u32,
    pub model_max_instances: u32,
}

impl_default!(RenderConfig {
    view_slot_capacity: 512,
    descriptor_size: 32,
    ring_max_instances: 256,
    plane_max_instances: 256,
    line_max_instances: 1024,
    model_max_instances: 256,
});

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.view_slot_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "view_slot_capacity must be non-zero".to_string(),
            ));
        }
        if self.descriptor_size == 0 {
            return Err(ConfigError::ValidationError(
                "descriptor_size must be non-zero".to_string(),
            ));
        }
        let limits = [
            ("ring_max_instances", self.ring_max_instances),
            ("plane_max_instances", self.plane_max_instances),
            ("line_max_instances", self.line_max_instances),
            ("model_max_instances", self.model_max_instances),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ValidationError(format!(
                "{name} must be non-zero"
            )));
        }
        Ok(())
    }

    pub fn limits(&self) -> PrimitiveLimits {
        PrimitiveLimits {
            rings: self.ring_max_instances,
            planes: self.plane_max_instances,
            lines: self.line_max_instances,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RenderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = RenderConfig {
            line_max_instances: 0,
            ..RenderConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("line_max_instances"));
    }

    #[test]
    fn test_limits() {
        let config = RenderConfig {
            ring_max_instances: 4,
            ..RenderConfig::default()
        };
        let limits = config.limits();
        assert_eq!(limits.rings, 4);
        assert_eq!(limits.lines, 1024);
    }
}

//! 混合模式

use serde::{Deserialize, Serialize};

/// 像素混合模式
///
/// 派生 `Ord`，实例桶按此顺序遍历。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    /// 不混合（不透明）
    None,
    /// 常规 alpha 混合
    Normal,
    /// 加算
    Add,
    /// 减算
    Subtract,
    /// 乘算
    Multiply,
    /// 滤色
    Screen,
}

impl Default for BlendMode {
    fn default() -> Self {
        Self::Normal
    }
}

impl BlendMode {
    /// 全部混合模式
    pub const ALL: [BlendMode; 6] = [
        BlendMode::None,
        BlendMode::Normal,
        BlendMode::Add,
        BlendMode::Subtract,
        BlendMode::Multiply,
        BlendMode::Screen,
    ];

    /// 是否需要按透明物体处理（不写深度）
    pub fn is_transparent(self) -> bool {
        !matches!(self, BlendMode::None)
    }

    /// 对应的 wgpu 混合状态
    pub fn to_wgpu(self) -> Option<wgpu::BlendState> {
        use wgpu::{BlendComponent, BlendFactor, BlendOperation, BlendState};

        let color = match self {
            BlendMode::None => return None,
            BlendMode::Normal => return Some(BlendState::ALPHA_BLENDING),
            BlendMode::Add => BlendComponent {
                src_factor: BlendFactor::SrcAlpha,
                dst_factor: BlendFactor::One,
                operation: BlendOperation::Add,
            },
            BlendMode::Subtract => BlendComponent {
                src_factor: BlendFactor::SrcAlpha,
                dst_factor: BlendFactor::One,
                operation: BlendOperation::ReverseSubtract,
            },
            BlendMode::Multiply => BlendComponent {
                src_factor: BlendFactor::Zero,
                dst_factor: BlendFactor::Src,
                operation: BlendOperation::Add,
            },
            BlendMode::Screen => BlendComponent {
                src_factor: BlendFactor::OneMinusDst,
                dst_factor: BlendFactor::One,
                operation: BlendOperation::Add,
            },
        };

        Some(BlendState {
            color,
            alpha: BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::Zero,
                operation: BlendOperation::Add,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_order_is_opaque_first() {
        let mut modes = BlendMode::ALL.to_vec();
        modes.reverse();
        modes.sort();
        assert_eq!(modes[0], BlendMode::None);
        assert_eq!(modes[1], BlendMode::Normal);
    }

    #[test]
    fn test_wgpu_blend_state() {
        assert!(BlendMode::None.to_wgpu().is_none());
        assert_eq!(
            BlendMode::Normal.to_wgpu(),
            Some(wgpu::BlendState::ALPHA_BLENDING)
        );
        let add = BlendMode::Add.to_wgpu().unwrap();
        assert_eq!(add.color.dst_factor, wgpu::BlendFactor::One);
    }
}

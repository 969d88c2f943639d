//! 材质与纹理槽位表

use std::collections::HashMap;

use glam::{Mat4, Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::core::transform::{make_uv_matrix, to_gpu_matrix};

/// 未指定纹理时使用的默认纹理
pub const DEFAULT_TEXTURE: &str = "EngineAssets/Images/uvChecker.png";

/// UV 变换
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvTransform {
    pub scale: Vec2,
    pub rotate: f32,
    pub translate: Vec2,
}

impl Default for UvTransform {
    fn default() -> Self {
        Self {
            scale: Vec2::ONE,
            rotate: 0.0,
            translate: Vec2::ZERO,
        }
    }
}

impl UvTransform {
    pub fn matrix(&self) -> Mat4 {
        make_uv_matrix(self.scale, self.rotate, self.translate)
    }
}

/// 网格材质（CPU 侧）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshMaterial {
    pub color: Vec4,
    pub texture: String,
    #[serde(default)]
    pub normal_map: Option<String>,
    #[serde(default)]
    pub uv: UvTransform,
}

impl Default for MeshMaterial {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            texture: DEFAULT_TEXTURE.to_string(),
            normal_map: None,
            uv: UvTransform::default(),
        }
    }
}

impl MeshMaterial {
    pub fn to_gpu(&self) -> MeshMaterialGpu {
        MeshMaterialGpu {
            color: self.color.to_array(),
            uv_matrix: to_gpu_matrix(self.uv.matrix()),
            enable_normal_map: self.normal_map.is_some() as u32,
            _pad: [0; 3],
        }
    }
}

/// 网格材质常量缓冲区布局
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshMaterialGpu {
    pub color: [f32; 4],
    pub uv_matrix: [[f32; 4]; 4],
    pub enable_normal_map: u32,
    pub _pad: [u32; 3],
}

/// 纹理名称到视图槽索引的映射
///
/// 未注册的名称解析为回退槽位（默认 0）。
#[derive(Debug, Clone, Default)]
pub struct TextureTable {
    slots: HashMap<String, u32>,
    fallback: u32,
}

impl TextureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: u32) -> Self {
        Self {
            slots: HashMap::new(),
            fallback,
        }
    }

    pub fn register(&mut self, name: impl Into<String>, slot: u32) {
        self.slots.insert(name.into(), slot);
    }

    pub fn resolve(&self, name: &str) -> u32 {
        match self.slots.get(name) {
            Some(slot) => *slot,
            None => {
                tracing::trace!(target: "render", texture = name, "Unknown texture, using fallback slot");
                self.fallback
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_gpu_layout() {
        assert_eq!(std::mem::size_of::<MeshMaterialGpu>(), 96);
        let mut material = MeshMaterial::default();
        assert_eq!(material.to_gpu().enable_normal_map, 0);
        material.normal_map = Some("normal.png".to_string());
        assert_eq!(material.to_gpu().enable_normal_map, 1);
    }

    #[test]
    fn test_texture_fallback() {
        let mut table = TextureTable::new();
        table.register("gradation.png", 3);
        assert_eq!(table.resolve("gradation.png"), 3);
        assert_eq!(table.resolve("missing.png"), 0);

        let table = TextureTable::with_fallback(7);
        assert_eq!(table.resolve("missing.png"), 7);
    }
}

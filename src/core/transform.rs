//! 变换与矩阵工具
//!
//! 旋转采用 XYZ 欧拉角（弧度），先绕 X 再绕 Y 最后绕 Z。
//! 世界矩阵按 缩放 → 旋转 → 平移 的顺序合成（列向量约定：`T * R * S`）。

use glam::{Mat4, Vec2, Vec3};

/// 缩放 / 旋转 / 平移 三元组
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3 {
    pub scale: Vec3,
    /// XYZ 欧拉角（弧度）
    pub rotate: Vec3,
    pub translate: Vec3,
}

impl Default for Transform3 {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            rotate: Vec3::ZERO,
            translate: Vec3::ZERO,
        }
    }
}

impl Transform3 {
    pub fn new(scale: Vec3, rotate: Vec3, translate: Vec3) -> Self {
        Self {
            scale,
            rotate,
            translate,
        }
    }

    /// 每帧重新计算，不缓存
    #[inline]
    pub fn world_matrix(&self) -> Mat4 {
        make_affine(self.scale, self.rotate, self.translate)
    }
}

/// XYZ 欧拉角旋转矩阵
#[inline]
pub fn make_rotate_xyz(rotate: Vec3) -> Mat4 {
    Mat4::from_rotation_z(rotate.z) * Mat4::from_rotation_y(rotate.y) * Mat4::from_rotation_x(rotate.x)
}

/// 仿射矩阵：缩放 → XYZ 旋转 → 平移
#[inline]
pub fn make_affine(scale: Vec3, rotate: Vec3, translate: Vec3) -> Mat4 {
    Mat4::from_translation(translate) * make_rotate_xyz(rotate) * Mat4::from_scale(scale)
}

/// UV 变换矩阵（缩放 → Z 旋转 → 平移）
#[inline]
pub fn make_uv_matrix(scale: Vec2, rotate_z: f32, translate: Vec2) -> Mat4 {
    Mat4::from_translation(translate.extend(0.0))
        * Mat4::from_rotation_z(rotate_z)
        * Mat4::from_scale(scale.extend(1.0))
}

/// 转为 GPU 端使用的列主序数组
#[inline]
pub fn to_gpu_matrix(m: Mat4) -> [[f32; 4]; 4] {
    m.to_cols_array_2d()
}

//! 后处理参数
//!
//! 全屏后处理通道本身由外部渲染器执行，这里只维护每帧请求的效果列表
//! 和集中模糊参数，并把参数上传到常量缓冲区。
//!
//! # 示例
//!
//! ```
//! use fx_engine::render::postprocess::{PostEffectKind, PostEffectParams};
//!
//! let mut params = PostEffectParams::default();
//! params.set_radial_blur(glam::Vec2::new(0.5, 0.5), 0.01);
//! assert_eq!(params.requested(), &[PostEffectKind::RadialBlur]);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::error::RenderResult;
use crate::render::backend::{BufferId, RenderBackend};
use crate::render::gpu_buffer::GpuBuffer;
use crate::render::view_slot::ViewSlotAllocator;

/// 后处理效果种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostEffectKind {
    /// 直接拷贝（无效果）
    Copy,
    Grayscale,
    Vignette,
    /// X 方向高斯模糊
    GaussianX,
    /// Y 方向高斯模糊
    GaussianY,
    /// 集中（径向）模糊
    RadialBlur,
}

/// 集中模糊参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialBlurParams {
    /// 屏幕空间中心（0..1）
    pub center: Vec2,
    pub intensity: f32,
    pub sample_count: u32,
}

impl Default for RadialBlurParams {
    fn default() -> Self {
        Self {
            center: Vec2::new(0.5, 0.5),
            intensity: 0.0,
            sample_count: 10,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RadialBlurUniform {
    pub center: [f32; 2],
    pub intensity: f32,
    pub sample_count: u32,
}

/// 每帧的后处理请求
#[derive(Debug, Clone, Default)]
pub struct PostEffectParams {
    requested: Vec<PostEffectKind>,
    radial_blur: RadialBlurParams,
}

impl PostEffectParams {
    /// 帧开始时清空请求
    pub fn begin_frame(&mut self) {
        self.requested.clear();
    }

    /// 请求一个效果，同一帧内重复请求只保留第一次
    pub fn request(&mut self, kind: PostEffectKind) {
        if !self.requested.contains(&kind) {
            self.requested.push(kind);
        }
    }

    pub fn requested(&self) -> &[PostEffectKind] {
        &self.requested
    }

    pub fn set_radial_blur(&mut self, center: Vec2, intensity: f32) {
        self.radial_blur.center = center;
        self.radial_blur.intensity = intensity;
        self.request(PostEffectKind::RadialBlur);
    }

    pub fn radial_blur(&self) -> &RadialBlurParams {
        &self.radial_blur
    }

    pub fn radial_blur_uniform(&self) -> RadialBlurUniform {
        RadialBlurUniform {
            center: self.radial_blur.center.to_array(),
            intensity: self.radial_blur.intensity,
            sample_count: self.radial_blur.sample_count,
        }
    }
}

/// 后处理常量缓冲区
#[derive(Debug)]
pub struct PostEffectUniforms {
    radial_blur: GpuBuffer<RadialBlurUniform>,
}

impl PostEffectUniforms {
    pub fn new(backend: &mut dyn RenderBackend) -> RenderResult<Self> {
        Ok(Self {
            radial_blur: GpuBuffer::constant(backend, "Radial Blur Uniform")?,
        })
    }

    pub fn radial_blur_buffer(&self) -> BufferId {
        self.radial_blur.id()
    }

    pub fn upload(&mut self, backend: &mut dyn RenderBackend, params: &PostEffectParams) {
        self.radial_blur.write(0, params.radial_blur_uniform());
        self.radial_blur.flush_all(backend);
    }

    pub fn release(
        self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
    ) -> RenderResult<()> {
        self.radial_blur.release(backend, views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::HeadlessBackend;

    #[test]
    fn test_requests_are_deduplicated() {
        let mut params = PostEffectParams::default();
        params.request(PostEffectKind::Vignette);
        params.set_radial_blur(Vec2::new(0.5, 0.5), 0.005);
        params.set_radial_blur(Vec2::new(0.5, 0.5), 0.01);
        assert_eq!(
            params.requested(),
            &[PostEffectKind::Vignette, PostEffectKind::RadialBlur]
        );
        assert_eq!(params.radial_blur().intensity, 0.01);

        params.begin_frame();
        assert!(params.requested().is_empty());
    }

    #[test]
    fn test_uniform_upload() {
        let mut backend = HeadlessBackend::new();
        let mut uniforms = PostEffectUniforms::new(&mut backend).unwrap();
        let mut params = PostEffectParams::default();
        params.set_radial_blur(Vec2::new(0.25, 0.75), 0.01);
        uniforms.upload(&mut backend, &params);

        let uploaded: RadialBlurUniform = backend
            .read_constant(uniforms.radial_blur_buffer())
            .unwrap();
        assert_eq!(uploaded.center, [0.25, 0.75]);
        assert_eq!(uploaded.intensity, 0.01);
        assert_eq!(uploaded.sample_count, 10);
    }
}

//! 渲染后端抽象
//!
//! 特效核心只通过 [`RenderBackend`] 接触 GPU：创建缓冲区、写入数据、
//! 在视图槽上创建结构化缓冲区视图、提交实例化绘制。
//!
//! - [`HeadlessBackend`]: 记录所有资源与绘制命令，用于测试、基准与无窗口演示
//! - [`super::wgpu_backend::WgpuBackend`]: 基于 wgpu 的真实实现

use std::collections::HashMap;

use crate::core::error::{RenderError, RenderResult};
use crate::render::blend::BlendMode;
use crate::render::view_slot::ViewSlot;

/// 后端缓冲区句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// 缓冲区用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferUsage(pub u32);

impl BufferUsage {
    pub const VERTEX: Self = Self(1);
    pub const INDEX: Self = Self(2);
    pub const UNIFORM: Self = Self(4);
    pub const STORAGE: Self = Self(8);

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for BufferUsage {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// 缓冲区描述符
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// 标签
    pub label: &'a str,
    /// 大小（字节）
    pub size: u64,
    /// 用途
    pub usage: BufferUsage,
}

/// 管线种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Particle,
    Model,
    Ring,
    Plane,
    Line,
}

/// 程序化基础形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Plane,
    Box,
    Sphere,
    Ring,
    Line,
}

impl PrimitiveKind {
    /// 着色器内生成的顶点数
    pub fn vertex_count(self) -> u32 {
        match self {
            PrimitiveKind::Plane => 6,
            PrimitiveKind::Box => 36,
            // 16 × 16 分段，每段两个三角形
            PrimitiveKind::Sphere => 16 * 16 * 6,
            // 顶点数由实例数据中的分段数决定，这里给出上限
            PrimitiveKind::Ring => 64 * 6,
            PrimitiveKind::Line => 2,
        }
    }
}

/// 绘制所用的几何体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// 着色器内程序化生成
    Primitive(PrimitiveKind),
    /// 顶点 / 索引缓冲区
    Indexed {
        vertex_buffer: BufferId,
        index_buffer: BufferId,
        index_count: u32,
    },
}

/// 一次实例化绘制
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstancedDraw {
    pub pipeline: PipelineKind,
    pub blend_mode: BlendMode,
    pub geometry: Geometry,
    /// 实例数据（结构化缓冲区）所在的视图槽
    pub instance_view: ViewSlot,
    /// 材质常量缓冲区
    pub material: Option<BufferId>,
    /// 纹理视图槽索引
    pub texture: Option<u32>,
    pub instance_count: u32,
}

/// 渲染后端能力接口
pub trait RenderBackend {
    /// 创建上传堆缓冲区
    fn create_buffer(&mut self, desc: &BufferDescriptor<'_>) -> RenderResult<BufferId>;

    /// 写入缓冲区（CPU → GPU）
    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]);

    /// 在视图槽上创建结构化缓冲区视图
    fn create_structured_view(
        &mut self,
        slot: ViewSlot,
        buffer: BufferId,
        element_count: u32,
        stride: u32,
    );

    fn destroy_buffer(&mut self, buffer: BufferId);

    /// 提交一次实例化绘制
    fn submit_instanced_draw(&mut self, draw: &InstancedDraw);
}

/// 结构化缓冲区视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuredView {
    pub buffer: BufferId,
    pub element_count: u32,
    pub stride: u32,
}

#[derive(Debug)]
struct HeadlessBuffer {
    label: String,
    usage: BufferUsage,
    data: Vec<u8>,
}

/// 无 GPU 的记录型后端
///
/// 缓冲区内容保存在内存中，绘制命令按提交顺序记录。
#[derive(Debug)]
pub struct HeadlessBackend {
    buffers: HashMap<BufferId, HeadlessBuffer>,
    views: HashMap<ViewSlot, StructuredView>,
    draws: Vec<InstancedDraw>,
    next_id: u64,
    max_buffer_size: u64,
    bytes_written: u64,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// 默认单个缓冲区上限 256 MiB
    pub const DEFAULT_MAX_BUFFER_SIZE: u64 = 256 << 20;

    pub fn new() -> Self {
        Self::with_max_buffer_size(Self::DEFAULT_MAX_BUFFER_SIZE)
    }

    pub fn with_max_buffer_size(max_buffer_size: u64) -> Self {
        Self {
            buffers: HashMap::new(),
            views: HashMap::new(),
            draws: Vec::new(),
            next_id: 1,
            max_buffer_size,
            bytes_written: 0,
        }
    }

    /// 已提交的绘制
    pub fn draws(&self) -> &[InstancedDraw] {
        &self.draws
    }

    /// 取出并清空已提交的绘制（帧结束时调用）
    pub fn take_draws(&mut self) -> Vec<InstancedDraw> {
        std::mem::take(&mut self.draws)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_data(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|b| b.data.as_slice())
    }

    pub fn buffer_label(&self, buffer: BufferId) -> Option<&str> {
        self.buffers.get(&buffer).map(|b| b.label.as_str())
    }

    pub fn buffer_usage(&self, buffer: BufferId) -> Option<BufferUsage> {
        self.buffers.get(&buffer).map(|b| b.usage)
    }

    pub fn view(&self, slot: ViewSlot) -> Option<StructuredView> {
        self.views.get(&slot).copied()
    }

    /// 累计写入字节数
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// 通过视图槽读回第 `index` 个元素
    pub fn read_element<T: bytemuck::Pod>(&self, slot: ViewSlot, index: u32) -> Option<T> {
        let view = self.views.get(&slot)?;
        if index >= view.element_count || view.stride as usize != std::mem::size_of::<T>() {
            return None;
        }
        let data = self.buffer_data(view.buffer)?;
        let start = index as usize * view.stride as usize;
        let bytes = data.get(start..start + view.stride as usize)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    /// 读回常量缓冲区开头的一个元素
    pub fn read_constant<T: bytemuck::Pod>(&self, buffer: BufferId) -> Option<T> {
        let data = self.buffer_data(buffer)?;
        let bytes = data.get(..std::mem::size_of::<T>())?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_buffer(&mut self, desc: &BufferDescriptor<'_>) -> RenderResult<BufferId> {
        if desc.size == 0 || desc.size > self.max_buffer_size {
            tracing::error!(
                target: "render",
                label = desc.label,
                size = desc.size,
                "Buffer creation failed"
            );
            return Err(RenderError::BufferCreation {
                label: desc.label.to_string(),
                size: desc.size,
                reason: format!("size must be in 1..={}", self.max_buffer_size),
            });
        }

        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(
            id,
            HeadlessBuffer {
                label: desc.label.to_string(),
                usage: desc.usage,
                data: vec![0; desc.size as usize],
            },
        );
        Ok(id)
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) {
        let Some(target) = self.buffers.get_mut(&buffer) else {
            tracing::warn!(target: "render", ?buffer, "Write to unknown buffer ignored");
            return;
        };
        let start = offset as usize;
        if start >= target.data.len() {
            return;
        }
        let end = (start + data.len()).min(target.data.len());
        target.data[start..end].copy_from_slice(&data[..end - start]);
        self.bytes_written += (end - start) as u64;
    }

    fn create_structured_view(
        &mut self,
        slot: ViewSlot,
        buffer: BufferId,
        element_count: u32,
        stride: u32,
    ) {
        self.views.insert(
            slot,
            StructuredView {
                buffer,
                element_count,
                stride,
            },
        );
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.views.retain(|_, view| view.buffer != buffer);
    }

    fn submit_instanced_draw(&mut self, draw: &InstancedDraw) {
        self.draws.push(*draw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::view_slot::ViewSlotAllocator;

    #[test]
    fn test_buffer_usage_flags() {
        let usage = BufferUsage::STORAGE | BufferUsage::UNIFORM;
        assert!(usage.contains(BufferUsage::STORAGE));
        assert!(!usage.contains(BufferUsage::VERTEX));
    }

    #[test]
    fn test_headless_write_and_read_back() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(4, 32);
        let buffer = backend
            .create_buffer(&BufferDescriptor {
                label: "Test",
                size: 16,
                usage: BufferUsage::STORAGE,
            })
            .unwrap();
        let slot = views.allocate().unwrap();
        backend.create_structured_view(slot, buffer, 4, 4);

        backend.write_buffer(buffer, 4, bytemuck::bytes_of(&7u32));
        assert_eq!(backend.read_element::<u32>(slot, 1), Some(7));
        assert_eq!(backend.read_element::<u32>(slot, 4), None);
        assert_eq!(backend.bytes_written(), 4);
    }

    #[test]
    fn test_headless_write_is_truncated() {
        let mut backend = HeadlessBackend::new();
        let buffer = backend
            .create_buffer(&BufferDescriptor {
                label: "Small",
                size: 4,
                usage: BufferUsage::UNIFORM,
            })
            .unwrap();
        backend.write_buffer(buffer, 0, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(backend.buffer_data(buffer), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_oversized_buffer_fails() {
        let mut backend = HeadlessBackend::with_max_buffer_size(64);
        let result = backend.create_buffer(&BufferDescriptor {
            label: "Huge",
            size: 65,
            usage: BufferUsage::STORAGE,
        });
        assert!(matches!(result, Err(RenderError::BufferCreation { .. })));
    }

    #[test]
    fn test_destroy_drops_views() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(4, 32);
        let buffer = backend
            .create_buffer(&BufferDescriptor {
                label: "Gone",
                size: 8,
                usage: BufferUsage::STORAGE,
            })
            .unwrap();
        let slot = views.allocate().unwrap();
        backend.create_structured_view(slot, buffer, 2, 4);
        backend.destroy_buffer(buffer);
        assert!(backend.view(slot).is_none());
        assert_eq!(backend.buffer_count(), 0);
    }
}

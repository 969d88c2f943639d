//! 持久映射的 GPU 缓冲区
//!
//! CPU 侧镜像在缓冲区整个生命周期内保持有效，写入只修改镜像；
//! 提交引用该缓冲区的绘制之前调用 [`GpuBuffer::flush`] 上传到 GPU。

use bytemuck::{Pod, Zeroable};

use crate::core::error::RenderResult;
use crate::render::backend::{BufferDescriptor, BufferId, BufferUsage, RenderBackend};
use crate::render::view_slot::{ViewSlot, ViewSlotAllocator};

/// 固定容量的类型化 GPU 缓冲区
#[derive(Debug)]
pub struct GpuBuffer<T: Pod> {
    label: String,
    id: BufferId,
    usage: BufferUsage,
    slot: Option<ViewSlot>,
    mapped: Box<[T]>,
}

impl<T: Pod> GpuBuffer<T> {
    /// 元素步长（字节）
    pub const STRIDE: usize = std::mem::size_of::<T>();

    /// 创建结构化缓冲区并在视图槽上注册视图
    pub fn structured(
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
        label: &str,
        capacity: u32,
    ) -> RenderResult<Self> {
        let mut buffer = Self::create(backend, label, capacity, BufferUsage::STORAGE)?;
        let slot = match views.allocate() {
            Ok(slot) => slot,
            Err(err) => {
                backend.destroy_buffer(buffer.id);
                return Err(err);
            }
        };
        backend.create_structured_view(slot, buffer.id, capacity, Self::STRIDE as u32);
        buffer.slot = Some(slot);
        Ok(buffer)
    }

    /// 创建单元素常量缓冲区（材质、后处理参数）
    pub fn constant(backend: &mut dyn RenderBackend, label: &str) -> RenderResult<Self> {
        Self::create(backend, label, 1, BufferUsage::UNIFORM)
    }

    /// 创建顶点 / 索引等不需要视图槽的缓冲区
    pub fn with_usage(
        backend: &mut dyn RenderBackend,
        label: &str,
        capacity: u32,
        usage: BufferUsage,
    ) -> RenderResult<Self> {
        Self::create(backend, label, capacity, usage)
    }

    fn create(
        backend: &mut dyn RenderBackend,
        label: &str,
        capacity: u32,
        usage: BufferUsage,
    ) -> RenderResult<Self> {
        let size = (capacity.max(1) as usize * Self::STRIDE) as u64;
        let id = backend.create_buffer(&BufferDescriptor { label, size, usage })?;

        tracing::debug!(target: "render", label, capacity, size, "GPU buffer created");

        Ok(Self {
            label: label.to_string(),
            id,
            usage,
            slot: None,
            mapped: vec![T::zeroed(); capacity as usize].into_boxed_slice(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// 结构化视图所在槽位（常量缓冲区为 `None`）
    pub fn view_slot(&self) -> Option<ViewSlot> {
        self.slot
    }

    pub fn capacity(&self) -> u32 {
        self.mapped.len() as u32
    }

    /// 写入第 `index` 个元素，越界写入被静默丢弃
    #[inline]
    pub fn write(&mut self, index: u32, value: T) {
        if let Some(slot) = self.mapped.get_mut(index as usize) {
            *slot = value;
        }
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.mapped.get(index as usize)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.mapped.get_mut(index as usize)
    }

    pub fn fill(&mut self, value: T) {
        self.mapped.fill(value);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.mapped
    }

    /// 上传前 `count` 个元素（超出容量部分截断）
    pub fn flush(&self, backend: &mut dyn RenderBackend, count: u32) {
        let count = (count as usize).min(self.mapped.len());
        if count == 0 {
            return;
        }
        backend.write_buffer(self.id, 0, bytemuck::cast_slice(&self.mapped[..count]));
    }

    /// 上传整个镜像
    pub fn flush_all(&self, backend: &mut dyn RenderBackend) {
        self.flush(backend, self.capacity());
    }

    /// 归还视图槽并销毁 GPU 缓冲区
    pub fn release(
        self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
    ) -> RenderResult<()> {
        backend.destroy_buffer(self.id);
        if let Some(slot) = self.slot {
            views.free(slot)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::HeadlessBackend;

    #[test]
    fn test_structured_buffer_registers_view() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(4, 32);
        let buffer = GpuBuffer::<[f32; 4]>::structured(&mut backend, &mut views, "Colors", 8).unwrap();

        let slot = buffer.view_slot().unwrap();
        let view = backend.view(slot).unwrap();
        assert_eq!(view.element_count, 8);
        assert_eq!(view.stride, 16);
        assert_eq!(views.allocated_count(), 1);
    }

    #[test]
    fn test_out_of_range_write_is_dropped() {
        let mut backend = HeadlessBackend::new();
        let mut buffer = GpuBuffer::<u32>::with_usage(&mut backend, "Ints", 2, BufferUsage::STORAGE).unwrap();
        buffer.write(0, 1);
        buffer.write(1, 2);
        buffer.write(2, 3);
        assert_eq!(buffer.as_slice(), &[1, 2]);
        assert!(buffer.get(2).is_none());
    }

    #[test]
    fn test_flush_uploads_prefix() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(4, 32);
        let mut buffer = GpuBuffer::<u32>::structured(&mut backend, &mut views, "Ints", 4).unwrap();
        buffer.fill(9);
        buffer.flush(&mut backend, 2);

        let slot = buffer.view_slot().unwrap();
        assert_eq!(backend.read_element::<u32>(slot, 0), Some(9));
        assert_eq!(backend.read_element::<u32>(slot, 1), Some(9));
        assert_eq!(backend.read_element::<u32>(slot, 2), Some(0));
    }

    #[test]
    fn test_release_recycles_slot() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(1, 32);
        let buffer = GpuBuffer::<u32>::structured(&mut backend, &mut views, "A", 4).unwrap();
        buffer.release(&mut backend, &mut views).unwrap();
        assert_eq!(backend.buffer_count(), 0);

        let again = GpuBuffer::<u32>::structured(&mut backend, &mut views, "B", 4);
        assert!(again.is_ok());
    }

    #[test]
    fn test_slot_exhaustion_destroys_buffer() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(0, 32);
        let result = GpuBuffer::<u32>::structured(&mut backend, &mut views, "A", 4);
        assert!(result.is_err());
        assert_eq!(backend.buffer_count(), 0);
    }
}

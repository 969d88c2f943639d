//! 基于 wgpu 的渲染后端
//!
//! 缓冲区是真实的 `wgpu::Buffer`，通过 `queue.write_buffer` 上传。
//! 实例化绘制先排队，由外部的渲染通道在帧末取出并录制。

use std::collections::HashMap;

use crate::core::error::{RenderError, RenderResult};
use crate::render::backend::{
    BufferDescriptor, BufferId, BufferUsage, InstancedDraw, RenderBackend, StructuredView,
};
use crate::render::view_slot::ViewSlot;

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    buffers: HashMap<BufferId, wgpu::Buffer>,
    views: HashMap<ViewSlot, StructuredView>,
    pending: Vec<InstancedDraw>,
    next_id: u64,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            buffers: HashMap::new(),
            views: HashMap::new(),
            pending: Vec::new(),
            next_id: 1,
        }
    }

    /// 不依赖窗口表面请求设备
    pub fn new_headless() -> RenderResult<Self> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let info = adapter.get_info();
        tracing::info!(target: "render", adapter = %info.name, backend = ?info.backend, "Adapter selected");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("FX Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::DeviceRequest(e.to_string()))?;

        Ok(Self::new(device, queue))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(&id)
    }

    pub fn view(&self, slot: ViewSlot) -> Option<StructuredView> {
        self.views.get(&slot).copied()
    }

    /// 取出本帧排队的绘制
    pub fn take_draws(&mut self) -> Vec<InstancedDraw> {
        std::mem::take(&mut self.pending)
    }

    fn to_wgpu_usage(usage: BufferUsage) -> wgpu::BufferUsages {
        let mut out = wgpu::BufferUsages::COPY_DST;
        if usage.contains(BufferUsage::VERTEX) {
            out |= wgpu::BufferUsages::VERTEX;
        }
        if usage.contains(BufferUsage::INDEX) {
            out |= wgpu::BufferUsages::INDEX;
        }
        if usage.contains(BufferUsage::UNIFORM) {
            out |= wgpu::BufferUsages::UNIFORM;
        }
        if usage.contains(BufferUsage::STORAGE) {
            out |= wgpu::BufferUsages::STORAGE;
        }
        out
    }
}

impl RenderBackend for WgpuBackend {
    fn create_buffer(&mut self, desc: &BufferDescriptor<'_>) -> RenderResult<BufferId> {
        let max_size = self.device.limits().max_buffer_size;
        // write_buffer 要求 4 字节对齐
        let size = desc.size.div_ceil(wgpu::COPY_BUFFER_ALIGNMENT) * wgpu::COPY_BUFFER_ALIGNMENT;
        if size == 0 || size > max_size {
            tracing::error!(target: "render", label = desc.label, size, "Buffer creation failed");
            return Err(RenderError::BufferCreation {
                label: desc.label.to_string(),
                size: desc.size,
                reason: format!("size must be in 1..={}", max_size),
            });
        }

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(desc.label),
            size,
            usage: Self::to_wgpu_usage(desc.usage),
            mapped_at_creation: false,
        });

        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(id, buffer);
        Ok(id)
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) {
        let Some(target) = self.buffers.get(&buffer) else {
            tracing::warn!(target: "render", ?buffer, "Write to unknown buffer ignored");
            return;
        };
        let available = target.size().saturating_sub(offset) as usize;
        let len = data.len().min(available);
        let len = len - len % wgpu::COPY_BUFFER_ALIGNMENT as usize;
        if len == 0 {
            return;
        }
        self.queue.write_buffer(target, offset, &data[..len]);
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
        if let Some(buf) = self.buffers.remove(&buffer) {
            buf.destroy();
        }
        self.views.retain(|_, view| view.buffer != buffer);
    }

    fn submit_instanced_draw(&mut self, draw: &InstancedDraw) {
        self.pending.push(*draw);
    }
}

//! 实例化批处理
//!
//! 同一几何体、同一混合模式的对象合并为一次绘制。
//!
//! ## 架构设计
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                InstancedDrawer<P>                     │
//! ├──────────────────────────────────────────────────────┤
//! │  begin_frame   每个混合桶计数清零                       │
//! │  push          按混合模式追加实例（超出容量静默丢弃）     │
//! │  draw          上传实例数据，每个几何体一次实例化绘制     │
//! └──────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use bytemuck::Pod;

use crate::core::error::RenderResult;
use crate::render::backend::{
    BufferId, Geometry, InstancedDraw, PipelineKind, RenderBackend,
};
use crate::render::blend::BlendMode;
use crate::render::gpu_buffer::GpuBuffer;
use crate::render::view_slot::{ViewSlot, ViewSlotAllocator};

/// 可实例化绘制的 GPU 记录
pub trait InstancePayload: Pod {
    /// 使用的管线
    const PIPELINE: PipelineKind;
    /// 缓冲区标签
    const LABEL: &'static str;
}

/// 一个绘制目标：几何体 + 可选材质 / 纹理
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawGeometry {
    pub geometry: Geometry,
    pub material: Option<BufferId>,
    pub texture: Option<u32>,
}

impl DrawGeometry {
    pub fn primitive(geometry: Geometry) -> Self {
        Self {
            geometry,
            material: None,
            texture: None,
        }
    }
}

#[derive(Debug)]
struct Bucket<P: Pod> {
    buffer: GpuBuffer<P>,
    count: u32,
}

/// 按混合模式分桶的实例化绘制器
#[derive(Debug)]
pub struct InstancedDrawer<P: InstancePayload> {
    geometries: Vec<DrawGeometry>,
    buckets: BTreeMap<BlendMode, Bucket<P>>,
    max_instances: u32,
}

impl<P: InstancePayload> InstancedDrawer<P> {
    /// 为每个混合模式分配一个容量为 `max_instances` 的实例缓冲区
    pub fn new(
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
        geometries: Vec<DrawGeometry>,
        blend_modes: &[BlendMode],
        max_instances: u32,
    ) -> RenderResult<Self> {
        let mut buckets = BTreeMap::new();
        for &blend in blend_modes {
            if buckets.contains_key(&blend) {
                continue;
            }
            let label = format!("{} ({:?})", P::LABEL, blend);
            let buffer = GpuBuffer::structured(backend, views, &label, max_instances)?;
            buckets.insert(blend, Bucket { buffer, count: 0 });
        }

        tracing::debug!(
            target: "render",
            label = P::LABEL,
            buckets = buckets.len(),
            max_instances,
            "Instanced drawer created"
        );

        Ok(Self {
            geometries,
            buckets,
            max_instances,
        })
    }

    /// 全部混合模式各一个桶
    pub fn with_all_blend_modes(
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
        geometries: Vec<DrawGeometry>,
        max_instances: u32,
    ) -> RenderResult<Self> {
        Self::new(backend, views, geometries, &BlendMode::ALL, max_instances)
    }

    pub fn geometries(&self) -> &[DrawGeometry] {
        &self.geometries
    }

    pub fn max_instances(&self) -> u32 {
        self.max_instances
    }

    /// 已配置的混合模式（升序）
    pub fn blend_modes(&self) -> impl Iterator<Item = BlendMode> + '_ {
        self.buckets.keys().copied()
    }

    /// 帧开始：所有桶计数清零
    pub fn begin_frame(&mut self) {
        for bucket in self.buckets.values_mut() {
            bucket.count = 0;
        }
    }

    /// 追加一个实例
    pub fn push(&mut self, blend: BlendMode, payload: P) {
        let Some(bucket) = self.buckets.get_mut(&blend) else {
            tracing::debug!(target: "render", label = P::LABEL, ?blend, "Blend mode not configured, instance dropped");
            return;
        };
        if bucket.count >= self.max_instances {
            return;
        }
        bucket.buffer.write(bucket.count, payload);
        bucket.count += 1;
    }

    pub fn count(&self, blend: BlendMode) -> u32 {
        self.buckets.get(&blend).map_or(0, |b| b.count)
    }

    pub fn total_count(&self) -> u32 {
        self.buckets.values().map(|b| b.count).sum()
    }

    pub fn instance(&self, blend: BlendMode, index: u32) -> Option<&P> {
        let bucket = self.buckets.get(&blend)?;
        if index >= bucket.count {
            return None;
        }
        bucket.buffer.get(index)
    }

    pub fn view_slot(&self, blend: BlendMode) -> Option<ViewSlot> {
        self.buckets.get(&blend).and_then(|b| b.buffer.view_slot())
    }

    /// 绘制指定混合模式的桶；空桶不提交
    pub fn draw(&self, backend: &mut dyn RenderBackend, blend: BlendMode) {
        let Some(bucket) = self.buckets.get(&blend) else {
            return;
        };
        if bucket.count == 0 {
            return;
        }
        let Some(instance_view) = bucket.buffer.view_slot() else {
            return;
        };

        bucket.buffer.flush(backend, bucket.count);
        for geometry in &self.geometries {
            backend.submit_instanced_draw(&InstancedDraw {
                pipeline: P::PIPELINE,
                blend_mode: blend,
                geometry: geometry.geometry,
                instance_view,
                material: geometry.material,
                texture: geometry.texture,
                instance_count: bucket.count,
            });
        }
    }

    /// 按混合模式顺序绘制全部桶
    pub fn draw_all(&self, backend: &mut dyn RenderBackend) {
        for blend in self.buckets.keys() {
            self.draw(backend, *blend);
        }
    }

    pub fn release(
        self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
    ) -> RenderResult<()> {
        for (_, bucket) in self.buckets {
            bucket.buffer.release(backend, views)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::{HeadlessBackend, PrimitiveKind};
    use bytemuck::Zeroable;

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    struct Dot {
        value: [f32; 4],
    }

    impl InstancePayload for Dot {
        const PIPELINE: PipelineKind = PipelineKind::Plane;
        const LABEL: &'static str = "Dot Instances";
    }

    fn make_drawer(
        backend: &mut HeadlessBackend,
        views: &mut ViewSlotAllocator,
        max: u32,
    ) -> InstancedDrawer<Dot> {
        InstancedDrawer::new(
            backend,
            views,
            vec![DrawGeometry::primitive(Geometry::Primitive(PrimitiveKind::Plane))],
            &[BlendMode::Normal, BlendMode::Add],
            max,
        )
        .unwrap()
    }

    #[test]
    fn test_one_slot_per_bucket() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(8, 32);
        let drawer = make_drawer(&mut backend, &mut views, 4);
        assert_eq!(views.allocated_count(), 2);
        assert_eq!(
            drawer.blend_modes().collect::<Vec<_>>(),
            vec![BlendMode::Normal, BlendMode::Add]
        );
    }

    #[test]
    fn test_push_past_capacity_is_dropped() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(8, 32);
        let mut drawer = make_drawer(&mut backend, &mut views, 2);
        for i in 0..5 {
            drawer.push(BlendMode::Add, Dot { value: [i as f32; 4] });
        }
        assert_eq!(drawer.count(BlendMode::Add), 2);
        assert_eq!(drawer.instance(BlendMode::Add, 1).unwrap().value, [1.0; 4]);
    }

    #[test]
    fn test_empty_bucket_submits_nothing() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(8, 32);
        let mut drawer = make_drawer(&mut backend, &mut views, 4);
        drawer.push(BlendMode::Normal, Dot::zeroed());
        drawer.draw_all(&mut backend);

        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].blend_mode, BlendMode::Normal);
        assert_eq!(draws[0].instance_count, 1);
        assert_eq!(draws[0].pipeline, PipelineKind::Plane);
    }

    #[test]
    fn test_begin_frame_resets_counts() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(8, 32);
        let mut drawer = make_drawer(&mut backend, &mut views, 4);
        drawer.push(BlendMode::Normal, Dot::zeroed());
        drawer.push(BlendMode::Add, Dot::zeroed());
        assert_eq!(drawer.total_count(), 2);
        drawer.begin_frame();
        assert_eq!(drawer.total_count(), 0);
        drawer.draw_all(&mut backend);
        assert!(backend.draws().is_empty());
    }

    #[test]
    fn test_unconfigured_blend_is_dropped() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(8, 32);
        let mut drawer = make_drawer(&mut backend, &mut views, 4);
        drawer.push(BlendMode::Screen, Dot::zeroed());
        assert_eq!(drawer.total_count(), 0);
    }

    #[test]
    fn test_draw_uploads_instances() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(8, 32);
        let mut drawer = make_drawer(&mut backend, &mut views, 4);
        drawer.push(BlendMode::Add, Dot { value: [0.5; 4] });
        drawer.draw(&mut backend, BlendMode::Add);

        let slot = drawer.view_slot(BlendMode::Add).unwrap();
        let uploaded: Dot = backend.read_element(slot, 0).unwrap();
        assert_eq!(uploaded.value, [0.5; 4]);
    }
}

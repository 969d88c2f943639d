//! 基础形状（环 / 平面 / 线段）的实例化绘制
//!
//! 几何体在着色器中程序化生成，实例记录只携带变换、颜色与形状参数。
//! 线段只有一个 Normal 混合桶。

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::core::error::RenderResult;
use crate::core::transform::to_gpu_matrix;
use crate::render::backend::{Geometry, PipelineKind, PrimitiveKind, RenderBackend};
use crate::render::blend::BlendMode;
use crate::render::instance_batch::{DrawGeometry, InstancePayload, InstancedDrawer};
use crate::render::material::{TextureTable, DEFAULT_TEXTURE};
use crate::render::view_slot::ViewSlotAllocator;

/// 环形参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingData {
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// 圆周分段数
    pub divide: u32,
}

impl Default for RingData {
    fn default() -> Self {
        Self {
            inner_radius: 0.5,
            outer_radius: 1.0,
            divide: 32,
        }
    }
}

/// 平面参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneData {
    pub size: Vec2,
}

impl Default for PlaneData {
    fn default() -> Self {
        Self { size: Vec2::ONE }
    }
}

/// 基础形状材质
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveMaterial {
    pub color: Vec4,
    pub texture: String,
    pub blend_mode: BlendMode,
}

impl Default for PrimitiveMaterial {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            texture: DEFAULT_TEXTURE.to_string(),
            blend_mode: BlendMode::Normal,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RingInstance {
    pub world: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub divide: u32,
    pub texture_index: u32,
}

impl InstancePayload for RingInstance {
    const PIPELINE: PipelineKind = PipelineKind::Ring;
    const LABEL: &'static str = "Ring Instances";
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PlaneInstance {
    pub world: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub size: [f32; 2],
    pub texture_index: u32,
    pub _pad: u32,
}

impl InstancePayload for PlaneInstance {
    const PIPELINE: PipelineKind = PipelineKind::Plane;
    const LABEL: &'static str = "Plane Instances";
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineInstance {
    pub start: [f32; 3],
    pub _pad0: f32,
    pub end: [f32; 3],
    pub _pad1: f32,
    pub color: [f32; 4],
}

impl InstancePayload for LineInstance {
    const PIPELINE: PipelineKind = PipelineKind::Line;
    const LABEL: &'static str = "Line Instances";
}

/// 各基础形状绘制器的实例上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveLimits {
    pub rings: u32,
    pub planes: u32,
    pub lines: u32,
}

/// 环 / 平面 / 线段绘制器集合
#[derive(Debug)]
pub struct PrimitiveDrawers {
    rings: InstancedDrawer<RingInstance>,
    planes: InstancedDrawer<PlaneInstance>,
    lines: InstancedDrawer<LineInstance>,
    textures: TextureTable,
}

impl PrimitiveDrawers {
    pub fn new(
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
        limits: PrimitiveLimits,
        textures: TextureTable,
    ) -> RenderResult<Self> {
        let rings = InstancedDrawer::with_all_blend_modes(
            backend,
            views,
            vec![DrawGeometry::primitive(Geometry::Primitive(PrimitiveKind::Ring))],
            limits.rings,
        )?;
        let planes = InstancedDrawer::with_all_blend_modes(
            backend,
            views,
            vec![DrawGeometry::primitive(Geometry::Primitive(PrimitiveKind::Plane))],
            limits.planes,
        )?;
        let lines = InstancedDrawer::new(
            backend,
            views,
            vec![DrawGeometry::primitive(Geometry::Primitive(PrimitiveKind::Line))],
            &[BlendMode::Normal],
            limits.lines,
        )?;

        Ok(Self {
            rings,
            planes,
            lines,
            textures,
        })
    }

    pub fn textures(&self) -> &TextureTable {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureTable {
        &mut self.textures
    }

    pub fn rings(&self) -> &InstancedDrawer<RingInstance> {
        &self.rings
    }

    pub fn planes(&self) -> &InstancedDrawer<PlaneInstance> {
        &self.planes
    }

    pub fn lines(&self) -> &InstancedDrawer<LineInstance> {
        &self.lines
    }

    pub fn begin_frame(&mut self) {
        self.rings.begin_frame();
        self.planes.begin_frame();
        self.lines.begin_frame();
    }

    pub fn add_ring(&mut self, world: Mat4, ring: &RingData, material: &PrimitiveMaterial) {
        let instance = RingInstance {
            world: to_gpu_matrix(world),
            color: material.color.to_array(),
            inner_radius: ring.inner_radius,
            outer_radius: ring.outer_radius,
            divide: ring.divide,
            texture_index: self.textures.resolve(&material.texture),
        };
        self.rings.push(material.blend_mode, instance);
    }

    pub fn add_plane(&mut self, world: Mat4, plane: &PlaneData, material: &PrimitiveMaterial) {
        let instance = PlaneInstance {
            world: to_gpu_matrix(world),
            color: material.color.to_array(),
            size: plane.size.to_array(),
            texture_index: self.textures.resolve(&material.texture),
            _pad: 0,
        };
        self.planes.push(material.blend_mode, instance);
    }

    pub fn add_line(&mut self, start: Vec3, end: Vec3, color: Vec4) {
        self.lines.push(
            BlendMode::Normal,
            LineInstance {
                start: start.to_array(),
                _pad0: 0.0,
                end: end.to_array(),
                _pad1: 0.0,
                color: color.to_array(),
            },
        );
    }

    /// 绘制某一混合模式下的环与平面
    pub fn draw(&self, backend: &mut dyn RenderBackend, blend: BlendMode) {
        self.rings.draw(backend, blend);
        self.planes.draw(backend, blend);
    }

    /// 按混合模式顺序绘制全部，线段最后
    pub fn draw_all(&self, backend: &mut dyn RenderBackend) {
        for blend in BlendMode::ALL {
            self.draw(backend, blend);
        }
        self.lines.draw_all(backend);
    }

    pub fn release(
        self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
    ) -> RenderResult<()> {
        self.rings.release(backend, views)?;
        self.planes.release(backend, views)?;
        self.lines.release(backend, views)
    }
}

//! 渲染模块
//!
//! - `backend` / `wgpu_backend` - 渲染后端能力接口与实现
//! - `view_slot` - 着色器可见视图槽分配
//! - `gpu_buffer` - 持久映射的类型化缓冲区
//! - `instance_batch` - 按混合模式分桶的实例化绘制
//! - `particles` - 粒子模拟与绘制
//! - `mesh` / `primitives` - 模型与基础形状绘制器
//! - `postprocess` / `camera` - 后处理参数与相机震动

pub mod backend;
pub mod blend;
pub mod camera;
pub mod gpu_buffer;
pub mod instance_batch;
pub mod material;
pub mod mesh;
pub mod particles;
pub mod postprocess;
pub mod primitives;
pub mod view_slot;
pub mod wgpu_backend;

pub use backend::{
    BufferDescriptor, BufferId, BufferUsage, Geometry, HeadlessBackend, InstancedDraw,
    PipelineKind, PrimitiveKind, RenderBackend,
};
pub use blend::BlendMode;
pub use camera::CameraShake;
pub use gpu_buffer::GpuBuffer;
pub use instance_batch::{DrawGeometry, InstancePayload, InstancedDrawer};
pub use material::{MeshMaterial, TextureTable, UvTransform};
pub use mesh::{Mesh, MeshData, Model, ModelDrawer, ModelInstance, Vertex3D};
pub use primitives::{PlaneData, PrimitiveDrawers, PrimitiveLimits, PrimitiveMaterial, RingData};
pub use view_slot::{DescriptorHandle, ViewSlot, ViewSlotAllocator};
pub use wgpu_backend::WgpuBackend;

//! 网格、模型与模型实例化绘制器

use glam::{Mat4, Vec4};

use crate::core::error::RenderResult;
use crate::core::transform::to_gpu_matrix;
use crate::render::backend::{BufferUsage, Geometry, PipelineKind, RenderBackend};
use crate::render::blend::BlendMode;
use crate::render::gpu_buffer::GpuBuffer;
use crate::render::instance_batch::{DrawGeometry, InstancePayload, InstancedDrawer};
use crate::render::material::{MeshMaterial, MeshMaterialGpu, TextureTable};
use crate::render::view_slot::ViewSlotAllocator;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    pub position: [f32; 4],
    pub texcoord: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex3D {
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: 16,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// 网格数据（导入器的输出）
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
    pub material: MeshMaterial,
}

impl MeshData {
    /// XY 平面上的单位四边形，朝向 -Z
    pub fn quad() -> Self {
        let v = |x: f32, y: f32, u: f32, w: f32| Vertex3D {
            position: [x, y, 0.0, 1.0],
            texcoord: [u, w],
            normal: [0.0, 0.0, -1.0],
        };
        Self {
            vertices: vec![
                v(-0.5, 0.5, 0.0, 0.0),
                v(0.5, 0.5, 1.0, 0.0),
                v(-0.5, -0.5, 0.0, 1.0),
                v(0.5, -0.5, 1.0, 1.0),
            ],
            indices: vec![0, 1, 2, 1, 3, 2],
            material: MeshMaterial::default(),
        }
    }
}

/// 已上传到 GPU 的网格
///
/// 顶点 / 索引只在创建时上传一次，材质每次 `update` 刷新。
#[derive(Debug)]
pub struct Mesh {
    data: MeshData,
    vertices: GpuBuffer<Vertex3D>,
    indices: GpuBuffer<u32>,
    material: GpuBuffer<MeshMaterialGpu>,
}

impl Mesh {
    pub fn new(backend: &mut dyn RenderBackend, data: MeshData) -> RenderResult<Self> {
        let mut vertices = GpuBuffer::with_usage(
            backend,
            "Mesh Vertex Buffer",
            data.vertices.len() as u32,
            BufferUsage::VERTEX,
        )?;
        for (i, vertex) in data.vertices.iter().enumerate() {
            vertices.write(i as u32, *vertex);
        }
        vertices.flush_all(backend);

        let mut indices = GpuBuffer::with_usage(
            backend,
            "Mesh Index Buffer",
            data.indices.len() as u32,
            BufferUsage::INDEX,
        )?;
        for (i, index) in data.indices.iter().enumerate() {
            indices.write(i as u32, *index);
        }
        indices.flush_all(backend);

        let mut material = GpuBuffer::constant(backend, "Mesh Material")?;
        material.write(0, data.material.to_gpu());
        material.flush_all(backend);

        Ok(Self {
            data,
            vertices,
            indices,
            material,
        })
    }

    pub fn material(&self) -> &MeshMaterial {
        &self.data.material
    }

    pub fn material_mut(&mut self) -> &mut MeshMaterial {
        &mut self.data.material
    }

    pub fn index_count(&self) -> u32 {
        self.data.indices.len() as u32
    }

    /// 刷新材质常量缓冲区
    pub fn update(&mut self, backend: &mut dyn RenderBackend) {
        self.material.write(0, self.data.material.to_gpu());
        self.material.flush_all(backend);
    }

    pub fn draw_geometry(&self, textures: &TextureTable) -> DrawGeometry {
        DrawGeometry {
            geometry: Geometry::Indexed {
                vertex_buffer: self.vertices.id(),
                index_buffer: self.indices.id(),
                index_count: self.index_count(),
            },
            material: Some(self.material.id()),
            texture: Some(textures.resolve(&self.data.material.texture)),
        }
    }

    pub fn release(
        self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
    ) -> RenderResult<()> {
        self.vertices.release(backend, views)?;
        self.indices.release(backend, views)?;
        self.material.release(backend, views)
    }
}

/// 由若干网格组成的模型
#[derive(Debug)]
pub struct Model {
    name: String,
    meshes: Vec<Mesh>,
}

impl Model {
    pub fn new(
        backend: &mut dyn RenderBackend,
        name: impl Into<String>,
        meshes: Vec<MeshData>,
    ) -> RenderResult<Self> {
        let meshes = meshes
            .into_iter()
            .map(|data| Mesh::new(backend, data))
            .collect::<RenderResult<Vec<_>>>()?;
        Ok(Self {
            name: name.into(),
            meshes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut [Mesh] {
        &mut self.meshes
    }

    pub fn update(&mut self, backend: &mut dyn RenderBackend) {
        for mesh in &mut self.meshes {
            mesh.update(backend);
        }
    }

    pub fn geometries(&self, textures: &TextureTable) -> Vec<DrawGeometry> {
        self.meshes.iter().map(|m| m.draw_geometry(textures)).collect()
    }

    pub fn release(
        self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
    ) -> RenderResult<()> {
        for mesh in self.meshes {
            mesh.release(backend, views)?;
        }
        Ok(())
    }
}

/// 模型实例记录
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelInstance {
    pub world: [[f32; 4]; 4],
    pub world_inverse_transpose: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub uv_matrix: [[f32; 4]; 4],
    pub texture_index: u32,
    pub enable_lighting: u32,
    pub shininess: f32,
    pub _pad: u32,
}

impl InstancePayload for ModelInstance {
    const PIPELINE: PipelineKind = PipelineKind::Model;
    const LABEL: &'static str = "Model Instances";
}

impl ModelInstance {
    pub fn new(world: Mat4, color: Vec4) -> Self {
        Self {
            world: to_gpu_matrix(world),
            world_inverse_transpose: to_gpu_matrix(world.inverse().transpose()),
            color: color.to_array(),
            uv_matrix: to_gpu_matrix(Mat4::IDENTITY),
            texture_index: 0,
            enable_lighting: 1,
            shininess: 20.0,
            _pad: 0,
        }
    }

    pub fn with_uv(mut self, uv: Mat4) -> Self {
        self.uv_matrix = to_gpu_matrix(uv);
        self
    }

    pub fn with_texture(mut self, texture_index: u32) -> Self {
        self.texture_index = texture_index;
        self
    }

    pub fn with_lighting(mut self, enabled: bool, shininess: f32) -> Self {
        self.enable_lighting = enabled as u32;
        self.shininess = shininess;
        self
    }
}

/// 一个模型的实例化绘制器
#[derive(Debug)]
pub struct ModelDrawer {
    model_name: String,
    drawer: InstancedDrawer<ModelInstance>,
}

impl ModelDrawer {
    pub fn new(
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
        model: &Model,
        textures: &TextureTable,
        max_instances: u32,
    ) -> RenderResult<Self> {
        let drawer = InstancedDrawer::with_all_blend_modes(
            backend,
            views,
            model.geometries(textures),
            max_instances,
        )?;
        Ok(Self {
            model_name: model.name().to_string(),
            drawer,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn begin_frame(&mut self) {
        self.drawer.begin_frame();
    }

    pub fn push(&mut self, blend: BlendMode, instance: ModelInstance) {
        self.drawer.push(blend, instance);
    }

    pub fn draw(&self, backend: &mut dyn RenderBackend, blend: BlendMode) {
        self.drawer.draw(backend, blend);
    }

    pub fn draw_all(&self, backend: &mut dyn RenderBackend) {
        self.drawer.draw_all(backend);
    }

    pub fn inner(&self) -> &InstancedDrawer<ModelInstance> {
        &self.drawer
    }

    pub fn release(
        self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
    ) -> RenderResult<()> {
        self.drawer.release(backend, views)
    }
}

//! 粒子组与发射器的按名称注册表

use glam::Vec3;
use rand::Rng;

use crate::core::error::{EngineResult, ParticleError, ParticleResult};
use crate::render::backend::{PrimitiveKind, RenderBackend};
use crate::render::material::TextureTable;
use crate::render::mesh::Model;
use crate::render::view_slot::ViewSlotAllocator;

use super::emitter::Emitter;
use super::group::{ParticleGroup, ParticleGroupConfig, ParticleShape};

/// 粒子组管理器
///
/// 保持创建顺序，更新与绘制均按此顺序进行。
#[derive(Debug, Default)]
pub struct ParticleGroupManager {
    default_config: ParticleGroupConfig,
    groups: Vec<ParticleGroup>,
}

impl ParticleGroupManager {
    pub fn new(default_config: ParticleGroupConfig) -> Self {
        Self {
            default_config,
            groups: Vec::new(),
        }
    }

    pub fn default_config(&self) -> ParticleGroupConfig {
        self.default_config
    }

    /// 以默认容量创建粒子组
    pub fn create(
        &mut self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
        name: &str,
        shape: ParticleShape,
        textures: &TextureTable,
    ) -> EngineResult<&mut ParticleGroup> {
        let config = self.default_config;
        self.create_with_config(backend, views, name, shape, textures, config)
    }

    pub fn create_with_config(
        &mut self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
        name: &str,
        shape: ParticleShape,
        textures: &TextureTable,
        config: ParticleGroupConfig,
    ) -> EngineResult<&mut ParticleGroup> {
        if self.contains(name) {
            return Err(ParticleError::DuplicateName(name.to_string()).into());
        }
        let group = ParticleGroup::new(backend, views, name, shape, textures, config)?;
        self.groups.push(group);
        let index = self.groups.len() - 1;
        Ok(&mut self.groups[index])
    }

    pub fn create_primitive(
        &mut self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
        name: &str,
        kind: PrimitiveKind,
        texture: &str,
        textures: &TextureTable,
    ) -> EngineResult<&mut ParticleGroup> {
        let shape = ParticleShape::Primitive {
            kind,
            texture: texture.to_string(),
        };
        self.create(backend, views, name, shape, textures)
    }

    /// 以模型的网格作为粒子形状
    pub fn create_model(
        &mut self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
        name: &str,
        model: &Model,
        textures: &TextureTable,
    ) -> EngineResult<&mut ParticleGroup> {
        let shape = ParticleShape::Model(model.geometries(textures));
        self.create(backend, views, name, shape, textures)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g.name() == name)
    }

    pub fn find(&self, name: &str) -> Option<&ParticleGroup> {
        self.groups.iter().find(|g| g.name() == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut ParticleGroup> {
        self.groups.iter_mut().find(|g| g.name() == name)
    }

    /// 移除并释放 GPU 资源与视图槽
    pub fn remove(
        &mut self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
        name: &str,
    ) -> EngineResult<()> {
        let index = self
            .groups
            .iter()
            .position(|g| g.name() == name)
            .ok_or_else(|| ParticleError::GroupNotFound(name.to_string()))?;
        let group = self.groups.remove(index);
        group.release(backend, views)?;
        Ok(())
    }

    pub fn update_all(&mut self, dt: f32) {
        for group in &mut self.groups {
            group.update(dt);
        }
    }

    pub fn draw_all(&self, backend: &mut dyn RenderBackend) {
        for group in &self.groups {
            group.draw(backend);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParticleGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 所有组的存活粒子总数
    pub fn total_particles(&self) -> usize {
        self.groups.iter().map(ParticleGroup::len).sum()
    }

    pub fn release_all(
        &mut self,
        backend: &mut dyn RenderBackend,
        views: &mut ViewSlotAllocator,
    ) -> EngineResult<()> {
        for group in self.groups.drain(..) {
            group.release(backend, views)?;
        }
        Ok(())
    }
}

/// 发射器管理器
#[derive(Debug, Default)]
pub struct EmitterManager {
    emitters: Vec<Emitter>,
}

impl EmitterManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: &str, position: Vec3) -> ParticleResult<&mut Emitter> {
        if self.find(name).is_some() {
            return Err(ParticleError::DuplicateName(name.to_string()));
        }
        self.emitters.push(Emitter::new(name, position));
        let index = self.emitters.len() - 1;
        Ok(&mut self.emitters[index])
    }

    pub fn find(&self, name: &str) -> Option<&Emitter> {
        self.emitters.iter().find(|e| e.name() == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Emitter> {
        self.emitters.iter_mut().find(|e| e.name() == name)
    }

    pub fn remove(&mut self, name: &str) -> ParticleResult<Emitter> {
        let index = self
            .emitters
            .iter()
            .position(|e| e.name() == name)
            .ok_or_else(|| ParticleError::EmitterNotFound(name.to_string()))?;
        Ok(self.emitters.remove(index))
    }

    pub fn update_all<R: Rng>(&mut self, dt: f32, groups: &mut ParticleGroupManager, rng: &mut R) {
        for emitter in &mut self.emitters {
            emitter.update(dt, groups, rng);
        }
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::EngineError;
    use crate::render::backend::HeadlessBackend;

    #[test]
    fn test_duplicate_group_rejected() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(8, 32);
        let textures = TextureTable::new();
        let mut groups = ParticleGroupManager::new(ParticleGroupConfig::default());
        groups
            .create_primitive(&mut backend, &mut views, "Haze", PrimitiveKind::Plane, "", &textures)
            .unwrap();
        let err = groups
            .create_primitive(&mut backend, &mut views, "Haze", PrimitiveKind::Plane, "", &textures)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Particle(ParticleError::DuplicateName(_))
        ));
        assert_eq!(views.allocated_count(), 1);
    }

    #[test]
    fn test_remove_recycles_view_slot() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(1, 32);
        let textures = TextureTable::new();
        let mut groups = ParticleGroupManager::new(ParticleGroupConfig::default());
        groups
            .create_primitive(&mut backend, &mut views, "A", PrimitiveKind::Box, "", &textures)
            .unwrap();
        groups.remove(&mut backend, &mut views, "A").unwrap();
        assert!(groups.is_empty());
        groups
            .create_primitive(&mut backend, &mut views, "B", PrimitiveKind::Box, "", &textures)
            .unwrap();

        let err = groups.remove(&mut backend, &mut views, "A").unwrap_err();
        assert!(matches!(
            err,
            EngineError::Particle(ParticleError::GroupNotFound(_))
        ));
    }

    #[test]
    fn test_view_slot_exhaustion_propagates() {
        let mut backend = HeadlessBackend::new();
        let mut views = ViewSlotAllocator::new(1, 32);
        let textures = TextureTable::new();
        let mut groups = ParticleGroupManager::new(ParticleGroupConfig::default());
        groups
            .create_primitive(&mut backend, &mut views, "A", PrimitiveKind::Box, "", &textures)
            .unwrap();
        let err = groups
            .create_primitive(&mut backend, &mut views, "B", PrimitiveKind::Box, "", &textures)
            .unwrap_err();
        assert!(matches!(err, EngineError::Render(_)));
    }

    #[test]
    fn test_emitter_registry() {
        let mut emitters = EmitterManager::new();
        emitters.create("Haze", Vec3::ZERO).unwrap();
        assert_eq!(
            emitters.create("Haze", Vec3::ZERO).unwrap_err(),
            ParticleError::DuplicateName("Haze".to_string())
        );
        emitters.find_mut("Haze").unwrap().set_emit_position(Vec3::ONE);
        assert_eq!(emitters.find("Haze").unwrap().position(), Vec3::ONE);
        assert!(emitters.remove("Haze").is_ok());
        assert!(emitters.remove("Haze").is_err());
    }
}

use std::env;

use fx_engine::config::FxConfig;
use fx_engine::core::logging::with_bootstrap_logging;
use fx_engine::core::{init_logging, EngineResult};
use fx_engine::effects::break_effect::{HAZE, STAR};
use fx_engine::effects::{BreakEffect, FxWorld};
use fx_engine::render::material::DEFAULT_TEXTURE;
use fx_engine::render::postprocess::PostEffectUniforms;
use fx_engine::render::{
    HeadlessBackend, InstancedDraw, PrimitiveDrawers, PrimitiveKind, RenderBackend, TextureTable,
    ViewSlotAllocator, WgpuBackend,
};
use glam::Vec3;

const FRAME_DT: f32 = 1.0 / 60.0;
const MAX_FRAMES: u32 = 60 * 60;
const PARTICLE_TEXTURE: &str = "circle.png";

/// 可取回本帧绘制命令的后端
trait DemoBackend: RenderBackend {
    fn drain_draws(&mut self) -> Vec<InstancedDraw>;
}

impl DemoBackend for HeadlessBackend {
    fn drain_draws(&mut self) -> Vec<InstancedDraw> {
        self.take_draws()
    }
}

impl DemoBackend for WgpuBackend {
    fn drain_draws(&mut self) -> Vec<InstancedDraw> {
        self.take_draws()
    }
}

fn main() {
    let config = with_bootstrap_logging(|| {
        let mut config = FxConfig::load_or_default();
        config.apply_env_overrides();
        config
    });
    init_logging(&config.logging);

    let result = match env::var("FX_BACKEND").as_deref() {
        Ok("wgpu") => WgpuBackend::new_headless()
            .map_err(Into::into)
            .and_then(|mut backend| run(&config, &mut backend)),
        _ => run(&config, &mut HeadlessBackend::new()),
    };

    if let Err(e) = result {
        tracing::error!(target: "engine", error = %e, "Break effect demo failed");
        std::process::exit(1);
    }
}

fn run<B: DemoBackend>(config: &FxConfig, backend: &mut B) -> EngineResult<()> {
    config.validate()?;

    let mut views = ViewSlotAllocator::new(
        config.render.view_slot_capacity,
        config.render.descriptor_size,
    );

    let mut textures = TextureTable::new();
    textures.register(DEFAULT_TEXTURE, 0);
    textures.register(PARTICLE_TEXTURE, 1);
    textures.register(config.break_effect.flash_texture.clone(), 2);
    textures.register(config.break_effect.ring_texture.clone(), 3);

    let mut world = FxWorld::new(config.particles, 0x5eed);
    for name in [HAZE, STAR] {
        world.groups_mut().create_primitive(
            backend,
            &mut views,
            name,
            PrimitiveKind::Plane,
            PARTICLE_TEXTURE,
            &textures,
        )?;
        world.emitters_mut().create(name, Vec3::ZERO)?;
    }

    let mut drawers = PrimitiveDrawers::new(backend, &mut views, config.render.limits(), textures)?;
    let mut post_uniforms = PostEffectUniforms::new(backend)?;
    let mut effect = BreakEffect::new(&mut world, Vec3::ZERO, config.break_effect.clone())?;

    tracing::info!(
        target: "engine",
        view_slots = views.allocated_count(),
        "Resources ready, playing break effect"
    );

    let mut total_draws = 0usize;
    let mut peak_particles = 0usize;
    let mut frames = 0u32;
    while !effect.is_finished() && frames < MAX_FRAMES {
        world.begin_frame(FRAME_DT);
        drawers.begin_frame();

        effect.update(&mut world);
        world.update();

        effect.draw(&mut drawers);
        world.draw(backend);
        drawers.draw_all(backend);
        post_uniforms.upload(backend, world.post_effects());

        let draws = backend.drain_draws();
        total_draws += draws.len();
        let particles = world.groups().total_particles();
        peak_particles = peak_particles.max(particles);
        frames += 1;

        if frames % 30 == 0 {
            tracing::info!(
                target: "engine",
                frame = frames,
                phase = ?effect.phase(),
                particles,
                draws = draws.len(),
                radial_blur = world.post_effects().radial_blur().intensity,
                camera_offset = ?world.camera_offset(),
                "Frame stats"
            );
        }
    }

    if !effect.is_finished() {
        tracing::warn!(target: "engine", frames, "Break effect did not finish within the frame limit");
    }
    tracing::info!(
        target: "engine",
        frames,
        total_draws,
        peak_particles,
        "Break effect demo complete"
    );

    world.groups_mut().release_all(backend, &mut views)?;
    drawers.release(backend, &mut views)?;
    post_uniforms.release(backend, &mut views)?;
    Ok(())
}

//! # FX Engine
//!
//! Real-time particle simulation and GPU-instanced effect rendering core.
//!
//! ## Features
//!
//! - **Particles**: CPU-simulated particle groups with bounded pools, drawn in one instanced call
//! - **Instancing**: Per-blend-mode instance buckets over shader-visible structured buffers
//! - **Effects**: Time-phased effect state machines driven by easing curves
//! - **Backends**: A recording headless backend and a wgpu backend behind one trait
//!
//! ## Frame Order
//!
//! ```text
//! world.begin_frame(dt) → effect.update(&mut world) → world.update() → draw
//! ```
//!
//! ### Example
//!
//! ```rust
//! use fx_engine::effects::FxWorld;
//! use fx_engine::render::particles::ParticleGroupConfig;
//!
//! let mut world = FxWorld::new(ParticleGroupConfig::default(), 7);
//! world.begin_frame(1.0 / 60.0);
//! world.update();
//! assert_eq!(world.frame(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Errors, transforms, logging
//! - [`config`]: TOML/JSON configuration
//! - [`render`]: Backends, buffers, instancing, particles
//! - [`animation`]: Easing curves and endpoint animations
//! - [`effects`]: Effect host and the break effect
//! - [`audio`]: Voice lifetime tracking

/// Error types, transform helpers and logging setup
#[macro_use]
pub mod core;
/// Configuration system
pub mod config;
/// Rendering backends, GPU buffers and instanced drawing
pub mod render;
/// Easing curves and endpoint animations
pub mod animation;
/// Effect state machines
pub mod effects;
/// Voice lifetime tracking
pub mod audio;

pub use crate::config::FxConfig;
pub use crate::core::{EngineError, EngineResult, ParticleError, RenderError};
pub use crate::effects::{BreakEffect, EffectHost, FxWorld};

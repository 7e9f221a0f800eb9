pub mod config;
pub mod constants;
pub mod control_points;
pub mod curves;
pub mod error;
pub mod overlay;
pub mod particles;
pub mod spline;
pub mod state;
pub mod texture;
pub static PARTICLES_WGSL: &str = include_str!("../shaders/particles.wgsl");

pub use config::*;
pub use constants::*;
pub use control_points::ControlPointMap;
pub use curves::CurveField;
pub use error::{Result, VizError};
pub use overlay::{connection_lines, ConnectionLine};
pub use particles::{particle_vertices, ParticleUniforms, ParticleVertex, RandomTexture};
pub use state::*;
pub use texture::{PackedTexture, Texel};

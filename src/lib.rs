//! Procedural star field that blends between a jittered uniform grid and
//! power-law galaxy clusters, rendered as additive point sprites with wgpu.

pub mod camera;
pub mod config;
pub mod context;
pub mod controls;
pub mod error;
pub mod frame;
pub mod particles;
pub mod quality;
pub mod starfield;
pub mod telemetry;

pub use config::StarfieldConfig;
pub use error::{ConfigError, GpuError, StarfieldError};
pub use starfield::Starfield;

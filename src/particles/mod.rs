pub mod config;
pub mod field;
pub mod gpu;
pub mod layout;
pub mod store;

pub use config::{GenerationParams, RenderParams};
pub use field::{cluster_center, sample_cluster_star, ClusterStar, GridLayout, ParticleField};
pub use gpu::{GpuFrame, GpuUploader, StarfieldGpu};
pub use layout::{StarAttribute, StarBufferLayout};
pub use store::FieldStore;

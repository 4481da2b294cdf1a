use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures while bringing up or talking to the GPU.
///
/// A missing adapter at startup is fatal; nothing renders without it.
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    AdapterUnavailable,
    #[error("failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("failed to create surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    #[error("surface not supported by adapter")]
    SurfaceUnsupported,
    #[error("GPU ran out of memory acquiring the next frame")]
    OutOfMemory,
    #[error("failed to map GPU staging buffer")]
    MapFailed,
    #[error("staging-map channel closed before completion")]
    ChannelClosed,
}

#[derive(Error, Debug)]
pub enum StarfieldError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StarfieldError};

    #[test]
    fn validation_message_is_descriptive() {
        let err: StarfieldError =
            ConfigError::Validation("cluster_count must be >= 1".into()).into();
        assert_eq!(
            err.to_string(),
            "invalid configuration: cluster_count must be >= 1"
        );
    }
}

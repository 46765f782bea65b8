use thiserror::Error;

/// Failures while setting up the GPU or presenting a frame
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to open graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface does not support the adapter")]
    UnsupportedSurface,
    #[error("shader '{0}' was not loaded")]
    MissingShader(String),
    #[error("failed to create pipelines: {0}")]
    Pipeline(String),
    #[error("out of GPU memory while acquiring the next frame")]
    OutOfMemory,
    #[error("surface error: {0}")]
    Surface(wgpu::SurfaceError),
}

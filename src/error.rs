//! Platform bootstrap errors
//!
//! Gameplay has no error paths (a crash is an event, not an error). These
//! cover getting a window, a canvas and a GPU device.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("no global window")]
    NoWindow,

    #[error("no document on window")]
    NoDocument,

    #[error("element #{0} missing or not a canvas")]
    NoCanvas(String),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("no supported surface format")]
    NoSurfaceFormat,
}

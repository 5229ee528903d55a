//! Graphics backends.
//!
//! The engine talks to the driver only through [`GraphicsApi`]. Two
//! implementations ship:
//! - [`GlowDevice`]: OpenGL through `glow`, for a host-provided context
//! - [`HeadlessDevice`]: an in-memory model of the GL object table

mod api;
mod error;
mod glow_device;
mod headless;

pub use api::{BufferTarget, BufferUsage, GraphicsApi};
pub use error::{GlError, ObjectKind, ShaderStage};
pub use glow_device::GlowDevice;
pub use headless::{DeviceCounters, DrawCall, HeadlessDevice, HeadlessHandle, InvalidOperation};

//! GPU buffer management for quad geometry.
//!
//! A [`BufferManager`] owns the vertex array and both buffers of one
//! surface. Each frame the caller builds a [`Geometry`](crate::geometry::Geometry),
//! syncs it, then draws; the manager decides whether the upload reuses the
//! current allocation or needs a new one.
//!
//! Convention:
//! - CPU geometry is in panel pixels (bottom-left origin, +Y up).
//! - The vertex shader maps to NDC through a `projection` uniform.

mod buffers;
mod config;
mod validate;

pub use buffers::{BufferManager, GpuBuffer, GpuVertexArray, SyncStats};
pub use config::{BufferMode, RenderConfig};
pub use validate::{BufferCheck, UploadReport};

//! Gauge engine crate.
//!
//! Quad geometry, GPU buffer management and the panel frame driver, on top of
//! a narrow OpenGL seam.

pub mod coords;
pub mod geometry;
pub mod gl;
pub mod logging;
pub mod paint;
pub mod panel;
pub mod render;
pub mod resources;
pub mod time;

//! Frame driver for a single textured panel surface.

mod config;
mod renderer;

pub use config::{FrameReport, GeometryMode, PanelConfig};
pub use renderer::PanelRenderer;

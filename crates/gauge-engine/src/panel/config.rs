use std::path::PathBuf;
use std::str::FromStr;

use crate::coords::Viewport;
use crate::render::RenderConfig;

/// When the panel rebuilds its geometry.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum GeometryMode {
    /// Clear, rebuild and sync every frame.
    #[default]
    PerFrame,
    /// Build and sync on the first frame only; later frames redraw it.
    Once,
}

impl FromStr for GeometryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-frame" | "perframe" | "frame" => Ok(GeometryMode::PerFrame),
            "once" => Ok(GeometryMode::Once),
            other => Err(format!("unknown geometry mode `{other}` (expected per-frame or once)")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PanelConfig {
    pub render: RenderConfig,
    pub geometry_mode: GeometryMode,
    pub viewport: Viewport,
    /// Texture file name, resolved through a
    /// [`ResourceLocator`](crate::resources::ResourceLocator). `None` draws
    /// with plain white.
    pub texture: Option<PathBuf>,
}

/// What one `draw_frame` call did.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Indices drawn.
    pub elements: usize,
    pub vertex_capacity: usize,
    pub index_capacity: usize,
    /// Whether this frame uploaded geometry.
    pub synced: bool,
    /// The upload was refused by the driver; nothing was drawn.
    pub upload_failed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_geometry_modes() {
        assert_eq!("once".parse::<GeometryMode>(), Ok(GeometryMode::Once));
        assert_eq!("Per-Frame".parse::<GeometryMode>(), Ok(GeometryMode::PerFrame));
        assert!("sometimes".parse::<GeometryMode>().is_err());
    }
}

use std::str::FromStr;

use crate::geometry::Winding;
use crate::gl::BufferUsage;

/// GPU buffer policy of a [`BufferManager`](super::BufferManager).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum BufferMode {
    /// Allocated on the first sync, sized to that geometry, never
    /// reallocated. For geometry that never outgrows its first frame.
    Static,
    /// Reused while the geometry fits, reallocated when it grows. For
    /// geometry rebuilt every frame.
    #[default]
    Streaming,
}

impl BufferMode {
    /// Usage hint passed with a full allocation.
    pub const fn usage(self) -> BufferUsage {
        match self {
            BufferMode::Static => BufferUsage::Static,
            BufferMode::Streaming => BufferUsage::Stream,
        }
    }
}

impl FromStr for BufferMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(BufferMode::Static),
            "streaming" | "stream" | "dynamic" => Ok(BufferMode::Streaming),
            other => Err(format!("unknown buffer mode `{other}` (expected static or streaming)")),
        }
    }
}

/// Drawing configuration fixed when a surface is set up.
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    pub buffer_mode: BufferMode,

    /// Winding used by the quad builder and set as the front face while the
    /// surface draws.
    pub winding: Winding,

    /// Pad allocations with one zeroed element and read uploads back after
    /// every sync. Diagnostic only: costs a GPU read-back per sync.
    pub validate_uploads: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_buffer_modes() {
        assert_eq!("Static".parse::<BufferMode>(), Ok(BufferMode::Static));
        assert_eq!("stream".parse::<BufferMode>(), Ok(BufferMode::Streaming));
        assert!("triple".parse::<BufferMode>().is_err());
    }

    #[test]
    fn usage_hint_follows_mode() {
        assert_eq!(BufferMode::Static.usage(), BufferUsage::Static);
        assert_eq!(BufferMode::Streaming.usage(), BufferUsage::Stream);
    }
}

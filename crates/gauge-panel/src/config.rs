use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use gauge_engine::panel::PanelConfig;

/// Texture drawn when `GAUGE_TEXTURE` is not set.
pub const DEFAULT_TEXTURE: &str = "uvgrid.jpg";

/// Frames rendered when `GAUGE_FRAMES` is not set.
pub const DEFAULT_FRAMES: u64 = 120;

/// Everything the binary reads from its environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub panel: PanelConfig,
    pub frames: u64,
    /// Extra resource root searched before the built-in ones.
    pub resource_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from a key lookup. Unset keys keep their defaults;
    /// set but unparsable keys are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut panel = PanelConfig { texture: Some(DEFAULT_TEXTURE.into()), ..PanelConfig::default() };

        if let Some(v) = lookup("GAUGE_BUFFER_MODE") {
            panel.render.buffer_mode = v.parse().map_err(|e| anyhow!("GAUGE_BUFFER_MODE: {e}"))?;
        }
        if let Some(v) = lookup("GAUGE_WINDING") {
            panel.render.winding = v.parse().map_err(|e| anyhow!("GAUGE_WINDING: {e}"))?;
        }
        if let Some(v) = lookup("GAUGE_GEOMETRY") {
            panel.geometry_mode = v.parse().map_err(|e| anyhow!("GAUGE_GEOMETRY: {e}"))?;
        }
        if let Some(v) = lookup("GAUGE_VALIDATE") {
            panel.render.validate_uploads = parse_flag(&v).context("GAUGE_VALIDATE")?;
        }
        if let Some(v) = lookup("GAUGE_TEXTURE") {
            panel.texture = (!v.is_empty()).then(|| PathBuf::from(v));
        }

        let frames = match lookup("GAUGE_FRAMES") {
            Some(v) => v.trim().parse().with_context(|| format!("GAUGE_FRAMES: `{v}` is not a frame count"))?,
            None => DEFAULT_FRAMES,
        };

        let resource_dir = lookup("GAUGE_RESOURCE_DIR").map(PathBuf::from);

        Ok(Self { panel, frames, resource_dir })
    }
}

fn parse_flag(v: &str) -> Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(anyhow!("`{other}` is not a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use gauge_engine::geometry::Winding;
    use gauge_engine::panel::GeometryMode;
    use gauge_engine::render::BufferMode;

    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.frames, DEFAULT_FRAMES);
        assert_eq!(s.panel.render.buffer_mode, BufferMode::Streaming);
        assert_eq!(s.panel.render.winding, Winding::Clockwise);
        assert_eq!(s.panel.texture, Some(PathBuf::from(DEFAULT_TEXTURE)));
        assert!(!s.panel.render.validate_uploads);
    }

    #[test]
    fn overrides_are_applied() {
        let s = settings(&[
            ("GAUGE_BUFFER_MODE", "static"),
            ("GAUGE_WINDING", "ccw"),
            ("GAUGE_GEOMETRY", "once"),
            ("GAUGE_VALIDATE", "1"),
            ("GAUGE_FRAMES", "3"),
            ("GAUGE_TEXTURE", ""),
        ])
        .unwrap();
        assert_eq!(s.panel.render.buffer_mode, BufferMode::Static);
        assert_eq!(s.panel.render.winding, Winding::CounterClockwise);
        assert_eq!(s.panel.geometry_mode, GeometryMode::Once);
        assert!(s.panel.render.validate_uploads);
        assert_eq!(s.frames, 3);
        assert_eq!(s.panel.texture, None);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = settings(&[("GAUGE_FRAMES", "lots")]).unwrap_err();
        assert!(format!("{err:#}").contains("GAUGE_FRAMES"));
        let err = settings(&[("GAUGE_WINDING", "up")]).unwrap_err();
        assert!(err.to_string().contains("GAUGE_WINDING"));
    }
}

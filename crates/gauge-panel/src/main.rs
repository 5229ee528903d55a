//! Replays the avionics panel frame loop without a display.
//!
//! Every frame draws one full-surface textured quad through the gauge-engine
//! core against the headless GL device, then reports what the buffer manager
//! did. Behaviour is configured through `GAUGE_*` environment variables.

mod config;

use anyhow::{Context, Result};
use gauge_engine::coords::Rect;
use gauge_engine::gl::HeadlessDevice;
use gauge_engine::logging::{LoggingConfig, init_logging};
use gauge_engine::panel::PanelRenderer;
use gauge_engine::resources::ResourceLocator;
use gauge_engine::time::FrameClock;

use config::Settings;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let settings = Settings::from_env().context("invalid GAUGE_* configuration")?;
    log::debug!("settings: {settings:?}");

    let mut locator = ResourceLocator::new();
    if let Some(dir) = &settings.resource_dir {
        locator = locator.with_tree(dir);
    }
    locator = locator.with_dir(".").with_tree("resources");

    let gl = HeadlessDevice::new();
    let viewport = settings.panel.viewport;
    let mut panel = PanelRenderer::new(&gl, settings.panel.clone(), &locator)?;

    let surface = Rect::new(0.0, 0.0, viewport.width, viewport.height);
    let mut clock = FrameClock::new();
    for _ in 0..settings.frames {
        clock.tick();
        let report = panel.draw_frame(|g| g.add_quad(surface));
        log::trace!("{report:?}");
    }

    let stats = panel.buffers().stats();
    log::info!(
        "{} frames in {:?} (mean {:?}, slowest {:?})",
        clock.frames(),
        clock.elapsed(),
        clock.mean_frame_time(),
        clock.slowest_frame()
    );
    log::info!(
        "syncs={} vertex_reallocations={} index_reallocations={} static_overflows={} failed_allocations={} elements={}",
        stats.syncs,
        stats.vertex_reallocations,
        stats.index_reallocations,
        stats.static_overflows,
        stats.failed_allocations,
        panel.buffers().element_count()
    );
    if let Some(report) = panel.buffers().last_upload_report() {
        log::info!("last upload read-back: {report:?}");
    }

    drop(panel);
    let invalid = gl.invalid_operations();
    anyhow::ensure!(invalid.is_empty(), "GL rejected {} operations: {invalid:?}", invalid.len());
    Ok(())
}

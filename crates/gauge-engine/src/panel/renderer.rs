use anyhow::{Context, Result};
use glam::Mat4;

use crate::geometry::{ColoredVertex, Geometry, Winding};
use crate::gl::GraphicsApi;
use crate::resources::{ColoredVertexShader, ResourceLocator, ShaderProgram, Texture, TextureImage};
use crate::render::BufferManager;

use super::{FrameReport, GeometryMode, PanelConfig};

/// Texture unit the panel samples from.
const TEXTURE_UNIT: u32 = 0;

/// Draws one textured panel surface.
///
/// Owns every GL object it uses. Dropping the renderer deletes them, so it
/// must not outlive the context behind `gl`.
pub struct PanelRenderer<'g, G: GraphicsApi> {
    gl: &'g G,
    config: PanelConfig,
    program: ShaderProgram<'g, G>,
    texture: Texture<'g, G>,
    buffers: BufferManager<'g, G, ColoredVertex>,
    geometry: Geometry<ColoredVertex>,
    frames: u64,
    // The GPU buffers hold the current geometry.
    uploaded: bool,
}

impl<'g, G: GraphicsApi> PanelRenderer<'g, G> {
    pub fn new(gl: &'g G, config: PanelConfig, locator: &ResourceLocator) -> Result<Self> {
        anyhow::ensure!(config.viewport.is_valid(), "invalid viewport {:?}", config.viewport);

        let program = ColoredVertexShader::compile(gl).context("failed to build panel shader")?;
        let texture = load_texture(gl, config.texture.as_deref(), locator)?;
        let buffers = BufferManager::new(gl, &config.render).context("failed to create panel buffers")?;
        let geometry = Geometry::with_quad_capacity(1, config.render.winding);

        log::info!(
            "panel ready: {}x{} {:?} {:?} {:?}",
            config.viewport.width,
            config.viewport.height,
            config.render.buffer_mode,
            config.render.winding,
            config.geometry_mode
        );

        Ok(Self { gl, config, program, texture, buffers, geometry, frames: 0, uploaded: false })
    }

    /// Renders one frame.
    ///
    /// `scene` adds quads to an empty geometry. In [`GeometryMode::Once`] it
    /// runs until one upload succeeds; later frames redraw what it built.
    /// A failed upload is logged by the buffer manager and the frame draws
    /// nothing.
    pub fn draw_frame<F>(&mut self, scene: F) -> FrameReport
    where
        F: FnOnce(&mut Geometry<ColoredVertex>),
    {
        let frame_index = self.frames;
        let rebuild = match self.config.geometry_mode {
            GeometryMode::PerFrame => true,
            GeometryMode::Once => !self.uploaded,
        };
        let mut upload_failed = false;

        if rebuild {
            self.geometry.clear();
            scene(&mut self.geometry);
            if let Err(e) = self.geometry.validate_indices() {
                log::error!("frame {frame_index}: {e}");
            }
            upload_failed = self.buffers.sync_geometry(&self.geometry).is_err();
            self.uploaded = !upload_failed;
        }

        let gl = self.gl;
        let winding = self.config.render.winding;
        let saved_front_face = gl.front_face();
        if winding == Winding::CounterClockwise {
            gl.set_front_face(Winding::CounterClockwise);
        }

        self.program.bind();
        let program = self.program.raw();
        gl.set_uniform_i32(program, ColoredVertexShader::TEXTURE, TEXTURE_UNIT as i32);
        gl.set_uniform_mat4(program, ColoredVertexShader::PROJECTION, &self.config.viewport.ortho());
        gl.set_uniform_mat4(program, ColoredVertexShader::MODEL, &Mat4::IDENTITY);
        self.texture.bind(TEXTURE_UNIT);

        self.buffers.draw();

        if winding == Winding::CounterClockwise {
            gl.set_front_face(saved_front_face);
        }

        self.frames += 1;
        FrameReport {
            frame_index,
            elements: self.buffers.element_count(),
            vertex_capacity: self.buffers.committed_vertex_capacity(),
            index_capacity: self.buffers.committed_index_capacity(),
            synced: rebuild,
            upload_failed,
        }
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn buffers(&self) -> &BufferManager<'g, G, ColoredVertex> {
        &self.buffers
    }

    pub fn geometry(&self) -> &Geometry<ColoredVertex> {
        &self.geometry
    }

    pub fn texture(&self) -> &Texture<'g, G> {
        &self.texture
    }

    pub fn program(&self) -> &ShaderProgram<'g, G> {
        &self.program
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// The configured texture, or white when it cannot be found, decoded or
/// uploaded.
fn load_texture<'g, G: GraphicsApi>(
    gl: &'g G,
    name: Option<&std::path::Path>,
    locator: &ResourceLocator,
) -> Result<Texture<'g, G>> {
    if let Some(name) = name {
        let image = locator.locate(name).and_then(TextureImage::open);
        match image {
            Ok(image) => match Texture::upload(gl, &image) {
                Ok(texture) => return Ok(texture),
                Err(e) => log::warn!("texture {}: {e}; drawing untextured", name.display()),
            },
            Err(e) => log::warn!("{e:#}; drawing untextured"),
        }
    }
    Texture::white(gl).context("failed to create fallback texture")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rect, Viewport};
    use crate::gl::HeadlessDevice;
    use crate::paint::Color8;
    use crate::render::BufferMode;

    fn full_screen(g: &mut Geometry<ColoredVertex>) {
        g.add_quad(Rect::new(0.0, 0.0, 1024.0, 768.0));
    }

    fn renderer(gl: &HeadlessDevice, config: PanelConfig) -> PanelRenderer<'_, HeadlessDevice> {
        PanelRenderer::new(gl, config, &ResourceLocator::new()).unwrap()
    }

    // ── setup ─────────────────────────────────────────────────────────────

    #[test]
    fn missing_texture_falls_back_to_white() {
        let gl = HeadlessDevice::new();
        let config = PanelConfig { texture: Some("uvgrid.jpg".into()), ..PanelConfig::default() };
        let panel = renderer(&gl, config);
        assert_eq!(panel.texture().size(), (1, 1));
    }

    #[test]
    fn invalid_viewport_is_rejected() {
        let gl = HeadlessDevice::new();
        let config = PanelConfig { viewport: Viewport::new(0.0, 768.0), ..PanelConfig::default() };
        assert!(PanelRenderer::new(&gl, config, &ResourceLocator::new()).is_err());
        assert_eq!(gl.counters().live_objects(), 0);
    }

    #[test]
    fn drop_releases_every_object() {
        let gl = HeadlessDevice::new();
        {
            let mut panel = renderer(&gl, PanelConfig::default());
            panel.draw_frame(full_screen);
        }
        assert_eq!(gl.counters().live_objects(), 0);
        assert!(gl.invalid_operations().is_empty());
    }

    // ── frames ────────────────────────────────────────────────────────────

    #[test]
    fn per_frame_rebuilds_and_reuses_buffers() {
        let gl = HeadlessDevice::new();
        let mut panel = renderer(&gl, PanelConfig::default());

        for i in 0..3 {
            let report = panel.draw_frame(full_screen);
            assert_eq!(report.frame_index, i);
            assert!(report.synced);
            assert_eq!((report.elements, report.vertex_capacity, report.index_capacity), (6, 4, 6));
        }
        assert_eq!(panel.buffers().stats().vertex_reallocations, 1);
        assert_eq!(panel.buffers().stats().syncs, 3);
        assert_eq!(gl.draw_calls().len(), 3);
    }

    #[test]
    fn once_mode_builds_on_first_frame_only() {
        let gl = HeadlessDevice::new();
        let config = PanelConfig { geometry_mode: GeometryMode::Once, ..PanelConfig::default() };
        let mut panel = renderer(&gl, config);

        let mut calls = 0;
        for _ in 0..4 {
            panel.draw_frame(|g| {
                calls += 1;
                full_screen(g);
            });
        }
        assert_eq!(calls, 1);
        assert_eq!(panel.buffers().stats().syncs, 1);
        assert!(gl.draw_calls().iter().all(|d| d.element_count == 6));
    }

    #[test]
    fn growing_scene_reallocates() {
        let gl = HeadlessDevice::new();
        let mut panel = renderer(&gl, PanelConfig::default());
        panel.draw_frame(full_screen);
        let report = panel.draw_frame(|g| {
            full_screen(g);
            g.add_colored_quad(Rect::new(10.0, 10.0, 100.0, 50.0), Color8::RED);
        });
        assert_eq!((report.elements, report.vertex_capacity, report.index_capacity), (12, 8, 12));
    }

    #[test]
    fn static_buffers_clamp_growth() {
        let gl = HeadlessDevice::new();
        let mut config = PanelConfig::default();
        config.render.buffer_mode = BufferMode::Static;
        let mut panel = renderer(&gl, config);

        panel.draw_frame(full_screen);
        let report = panel.draw_frame(|g| {
            full_screen(g);
            full_screen(g);
        });
        assert_eq!((report.elements, report.vertex_capacity), (6, 4));
        assert!(gl.invalid_operations().is_empty());
    }

    #[test]
    fn failed_upload_draws_nothing_and_once_mode_retries() {
        let gl = HeadlessDevice::new();
        let config = PanelConfig { geometry_mode: GeometryMode::Once, ..PanelConfig::default() };
        let mut panel = renderer(&gl, config);

        gl.fail_buffer_data(1);
        let first = panel.draw_frame(full_screen);
        assert!(first.upload_failed);
        assert_eq!(first.elements, 0);
        assert!(gl.draw_calls().is_empty());

        let second = panel.draw_frame(full_screen);
        assert!(second.synced && !second.upload_failed);
        assert_eq!(second.elements, 6);

        let third = panel.draw_frame(full_screen);
        assert!(!third.synced);
        assert_eq!(gl.draw_calls().len(), 2);
    }

    // ── GL state ──────────────────────────────────────────────────────────

    #[test]
    fn uniforms_and_texture_are_set_for_the_draw() {
        let gl = HeadlessDevice::new();
        let mut panel = renderer(&gl, PanelConfig::default());
        panel.draw_frame(full_screen);

        let program = panel.program().raw();
        assert_eq!(gl.uniform_i32(program, "our_texture"), Some(0));
        assert_eq!(gl.uniform_mat4(program, "model"), Some(Mat4::IDENTITY));
        assert_eq!(gl.uniform_mat4(program, "projection"), Some(Viewport::default().ortho()));

        let draw = &gl.draw_calls()[0];
        assert_eq!(draw.program, Some(program));
        assert_eq!(draw.texture, Some(panel.texture().raw()));
    }

    #[test]
    fn counter_clockwise_sets_and_restores_front_face() {
        let gl = HeadlessDevice::new();
        gl.set_front_face(Winding::Clockwise);
        let mut config = PanelConfig::default();
        config.render.winding = Winding::CounterClockwise;
        let mut panel = renderer(&gl, config);

        panel.draw_frame(full_screen);
        assert_eq!(gl.draw_calls()[0].front_face, Winding::CounterClockwise);
        assert_eq!(gl.front_face(), Winding::Clockwise);
        assert_eq!(panel.geometry().indices(), &[0, 3, 1, 1, 3, 2]);
    }

    #[test]
    fn clockwise_leaves_host_front_face_alone() {
        let gl = HeadlessDevice::new();
        let mut panel = renderer(&gl, PanelConfig::default());
        panel.draw_frame(full_screen);
        assert_eq!(gl.draw_calls()[0].front_face, Winding::CounterClockwise);
        assert_eq!(gl.front_face(), Winding::CounterClockwise);
    }
}

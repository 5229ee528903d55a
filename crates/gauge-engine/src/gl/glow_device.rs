use std::ffi::c_void;

use glam::Mat4;
use glow::HasContext;

use crate::geometry::{AttribKind, VertexAttribute, Winding};
use crate::resources::TextureImage;

use super::{BufferTarget, BufferUsage, GlError, GraphicsApi, ObjectKind, ShaderStage};

type GlowShader = <glow::Context as HasContext>::Shader;

/// OpenGL backend over a `glow` context.
///
/// The device does not own the window or the context's current-ness; the
/// host does. Every call assumes the host made the context current on the
/// calling thread, which is why construction is `unsafe`.
///
/// Wiring it up from a host that hands out a `get_proc_address`:
///
/// ```no_run
/// use std::ffi::{CString, c_void};
///
/// use gauge_engine::coords::Rect;
/// use gauge_engine::gl::GlowDevice;
/// use gauge_engine::panel::{PanelConfig, PanelRenderer};
/// use gauge_engine::resources::ResourceLocator;
///
/// fn attach(get_proc_address: impl Fn(&CString) -> *const c_void) -> anyhow::Result<()> {
///     // SAFETY: the host keeps its context current on this thread for as
///     // long as the device and the renderer exist.
///     let mut gl = unsafe {
///         GlowDevice::from_loader_function(|name| {
///             CString::new(name).map_or(std::ptr::null(), |name| get_proc_address(&name))
///         })
///     }
///     .with_error_checks(cfg!(debug_assertions));
///     gl.enable_debug_output();
///
///     let locator = ResourceLocator::new().with_tree("Resources");
///     let mut panel = PanelRenderer::new(&gl, PanelConfig::default(), &locator)?;
///     panel.draw_frame(|g| g.add_quad(Rect::new(0.0, 0.0, 1024.0, 768.0)));
///     Ok(())
/// }
/// ```
pub struct GlowDevice {
    gl: glow::Context,
    check_errors: bool,
    debug_output: bool,
}

impl GlowDevice {
    /// Wraps an existing `glow` context.
    ///
    /// # Safety
    ///
    /// The GL context behind `gl` must be current on the calling thread for
    /// every method call made through the returned device, and must stay
    /// alive for as long as the device.
    pub unsafe fn new(gl: glow::Context) -> Self {
        log::debug!("GL version: {:?}", gl.version());
        Self { gl, check_errors: false, debug_output: false }
    }

    /// Loads GL entry points through `loader` (e.g. the host's
    /// `get_proc_address`).
    ///
    /// # Safety
    ///
    /// Same contract as [`GlowDevice::new`]; `loader` must return valid
    /// function pointers for the current context.
    pub unsafe fn from_loader_function<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        // SAFETY: forwarded to the caller.
        unsafe { Self::new(glow::Context::from_loader_function(loader)) }
    }

    /// Escape hatch for host code that needs GL calls the engine does not model.
    pub fn raw(&self) -> &glow::Context {
        &self.gl
    }

    /// Polls `glGetError` after every buffer, draw and state call and logs
    /// anything raised. Costs a driver round-trip per call.
    pub fn with_error_checks(mut self, enabled: bool) -> Self {
        self.check_errors = enabled;
        self
    }

    /// Routes driver debug messages to `log`, at a level matching their
    /// severity. Returns `false` when the context has no debug output
    /// (neither GL 4.3 nor `KHR_debug`). Calling it again is a no-op.
    pub fn enable_debug_output(&mut self) -> bool {
        if self.debug_output {
            return true;
        }
        if !self.gl.supports_debug() {
            log::warn!("GL debug output unavailable on this context");
            return false;
        }
        // SAFETY: see `GlowDevice::new`.
        unsafe {
            self.gl.enable(glow::DEBUG_OUTPUT);
            self.gl.enable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
            self.gl.debug_message_callback(|source, kind, id, severity, message| {
                log::log!(
                    debug_level(severity),
                    "GL {} {} #{id}: {message}",
                    debug_source_name(source),
                    debug_type_name(kind)
                );
            });
        }
        self.debug_output = true;
        log::debug!("GL debug output enabled");
        true
    }

    // SAFETY (all `unsafe` blocks below): `GlowDevice::new` requires the
    // context to be current on this thread for the lifetime of the device.

    /// Pops the oldest pending GL error and discards the rest.
    fn take_error(&self) -> Option<u32> {
        let first = unsafe { self.gl.get_error() };
        if first == glow::NO_ERROR {
            return None;
        }
        // Some drivers queue one flag per error kind; bounded in case the
        // context is lost and keeps reporting.
        for _ in 0..8 {
            if unsafe { self.gl.get_error() } == glow::NO_ERROR {
                break;
            }
        }
        Some(first)
    }

    fn check(&self, call: &str) {
        if !self.check_errors {
            return;
        }
        if let Some(code) = self.take_error() {
            log::error!("{} (0x{code:04x}) raised by {call}", error_name(code));
        }
    }

    fn compile_stage(&self, stage: ShaderStage, src: &str) -> Result<GlowShader, GlError> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self
                .gl
                .create_shader(kind)
                .map_err(|log| GlError::ShaderCompile { stage, log })?;
            self.gl.shader_source(shader, src);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(GlError::ShaderCompile { stage, log });
            }
            Ok(shader)
        }
    }
}

fn target_enum(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn usage_enum(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Static => glow::STATIC_DRAW,
        BufferUsage::Stream => glow::STREAM_DRAW,
    }
}

/// GL sizes and offsets are `GLsizei`/`GLintptr` on the wire that glow
/// exposes as `i32`. Anything larger is refused rather than truncated.
fn gl_size(n: usize, what: &str) -> Option<i32> {
    match i32::try_from(n) {
        Ok(v) => Some(v),
        Err(_) => {
            log::error!("{what} of {n} exceeds the GL i32 range; call skipped");
            None
        }
    }
}

fn error_name(code: u32) -> &'static str {
    match code {
        glow::NO_ERROR => "GL_NO_ERROR",
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown GL error",
    }
}

fn debug_level(severity: u32) -> log::Level {
    match severity {
        glow::DEBUG_SEVERITY_HIGH => log::Level::Error,
        glow::DEBUG_SEVERITY_MEDIUM => log::Level::Warn,
        glow::DEBUG_SEVERITY_LOW => log::Level::Info,
        _ => log::Level::Debug,
    }
}

fn debug_source_name(source: u32) -> &'static str {
    match source {
        glow::DEBUG_SOURCE_API => "api",
        glow::DEBUG_SOURCE_WINDOW_SYSTEM => "window-system",
        glow::DEBUG_SOURCE_SHADER_COMPILER => "shader-compiler",
        glow::DEBUG_SOURCE_THIRD_PARTY => "third-party",
        glow::DEBUG_SOURCE_APPLICATION => "application",
        _ => "other",
    }
}

fn debug_type_name(kind: u32) -> &'static str {
    match kind {
        glow::DEBUG_TYPE_ERROR => "error",
        glow::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "deprecated",
        glow::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "undefined-behavior",
        glow::DEBUG_TYPE_PORTABILITY => "portability",
        glow::DEBUG_TYPE_PERFORMANCE => "performance",
        glow::DEBUG_TYPE_MARKER => "marker",
        _ => "other",
    }
}

impl GraphicsApi for GlowDevice {
    type VertexArray = <glow::Context as HasContext>::VertexArray;
    type Buffer = <glow::Context as HasContext>::Buffer;
    type Program = <glow::Context as HasContext>::Program;
    type Texture = <glow::Context as HasContext>::Texture;

    fn create_vertex_array(&self) -> Result<Self::VertexArray, GlError> {
        unsafe { self.gl.create_vertex_array() }
            .map_err(|reason| GlError::allocation(ObjectKind::VertexArray, reason))
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array) }
        self.check("glBindVertexArray");
    }

    fn create_buffer(&self) -> Result<Self::Buffer, GlError> {
        unsafe { self.gl.create_buffer() }
            .map_err(|reason| GlError::allocation(ObjectKind::Buffer, reason))
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>) {
        unsafe { self.gl.bind_buffer(target_enum(target), buffer) }
        self.check("glBindBuffer");
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) -> Result<(), GlError> {
        let refused = |reason: String| GlError::BufferAllocation { target, bytes: data.len(), reason };
        if gl_size(data.len(), "buffer size").is_none() {
            return Err(refused("size exceeds the GL range".to_string()));
        }

        // Errors left by the host would otherwise be blamed on this call.
        if let Some(stale) = self.take_error() {
            log::warn!("{} (0x{stale:04x}) pending before buffer allocation", error_name(stale));
        }
        unsafe {
            self.gl
                .buffer_data_u8_slice(target_enum(target), data, usage_enum(usage))
        }
        match self.take_error() {
            None => Ok(()),
            Some(code) => Err(refused(format!("{} (0x{code:04x})", error_name(code)))),
        }
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let Some(offset) = gl_size(offset, "buffer offset") else { return };
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(target_enum(target), offset, data)
        }
        self.check("glBufferSubData");
    }

    fn read_buffer(&self, target: BufferTarget, offset: usize, len: usize) -> Option<Vec<u8>> {
        let offset = gl_size(offset, "read-back offset")?;
        let mut out = vec![0u8; len];
        unsafe {
            self.gl
                .get_buffer_sub_data(target_enum(target), offset, &mut out);
        }
        // A rejected range leaves GL_INVALID_VALUE behind instead of data.
        match self.take_error() {
            None => Some(out),
            Some(_) => None,
        }
    }

    fn vertex_attrib_pointer(&self, attribute: &VertexAttribute, stride: usize) {
        let data_type = match attribute.kind {
            AttribKind::F32 => glow::FLOAT,
            AttribKind::U8 => glow::UNSIGNED_BYTE,
        };
        let stride = gl_size(stride, "vertex stride");
        let offset = gl_size(attribute.offset, "attribute offset");
        let (Some(stride), Some(offset)) = (stride, offset) else { return };
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                attribute.location,
                attribute.components as i32,
                data_type,
                attribute.normalized,
                stride,
                offset,
            )
        }
        self.check("glVertexAttribPointer");
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) }
    }

    fn create_program(&self, vertex_src: &str, fragment_src: &str) -> Result<Self::Program, GlError> {
        let vs = self.compile_stage(ShaderStage::Vertex, vertex_src)?;
        let fs = match self.compile_stage(ShaderStage::Fragment, fragment_src) {
            Ok(fs) => fs,
            Err(e) => {
                unsafe { self.gl.delete_shader(vs) };
                return Err(e);
            }
        };

        unsafe {
            let program = match self.gl.create_program() {
                Ok(p) => p,
                Err(reason) => {
                    self.gl.delete_shader(vs);
                    self.gl.delete_shader(fs);
                    return Err(GlError::allocation(ObjectKind::Program, reason));
                }
            };
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.link_program(program);
            let linked = self.gl.get_program_link_status(program);

            // The stages are no longer needed once linking was attempted.
            self.gl.detach_shader(program, vs);
            self.gl.detach_shader(program, fs);
            self.gl.delete_shader(vs);
            self.gl.delete_shader(fs);

            if !linked {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(GlError::ProgramLink { log });
            }
            Ok(program)
        }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn set_uniform_i32(&self, program: Self::Program, name: &str, value: i32) {
        unsafe {
            let loc = self.gl.get_uniform_location(program, name);
            self.gl.uniform_1_i32(loc.as_ref(), value);
        }
    }

    fn set_uniform_mat4(&self, program: Self::Program, name: &str, value: &Mat4) {
        unsafe {
            let loc = self.gl.get_uniform_location(program, name);
            self.gl
                .uniform_matrix_4_f32_slice(loc.as_ref(), false, &value.to_cols_array());
        }
    }

    fn create_texture_rgba(&self, image: &TextureImage) -> Result<Self::Texture, GlError> {
        let (Ok(width), Ok(height)) = (i32::try_from(image.width()), i32::try_from(image.height())) else {
            return Err(GlError::Texture { reason: "image dimensions exceed GL limits".into() });
        };

        unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(|reason| GlError::allocation(ObjectKind::Texture, reason))?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));

            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);

            if self.gl.supported_extensions().contains("GL_EXT_texture_filter_anisotropic") {
                let max_aniso = self.gl.get_parameter_f32(glow::MAX_TEXTURE_MAX_ANISOTROPY_EXT);
                self.gl
                    .tex_parameter_f32(glow::TEXTURE_2D, glow::TEXTURE_MAX_ANISOTROPY_EXT, max_aniso);
            }

            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(image.pixels())),
            );
            self.gl.generate_mipmap(glow::TEXTURE_2D);

            if let Some(code) = self.take_error() {
                self.gl.delete_texture(texture);
                return Err(GlError::Texture {
                    reason: format!("glTexImage2D raised {} (0x{code:04x})", error_name(code)),
                });
            }
            Ok(texture)
        }
    }

    fn delete_texture(&self, texture: Self::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }

    fn bind_texture(&self, unit: u32, texture: Option<Self::Texture>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, texture);
        }
    }

    fn front_face(&self) -> Winding {
        let face = unsafe { self.gl.get_parameter_i32(glow::FRONT_FACE) };
        if face == glow::CW as i32 {
            Winding::Clockwise
        } else {
            Winding::CounterClockwise
        }
    }

    fn set_front_face(&self, winding: Winding) {
        let face = match winding {
            Winding::Clockwise => glow::CW,
            Winding::CounterClockwise => glow::CCW,
        };
        unsafe { self.gl.front_face(face) }
        self.check("glFrontFace");
    }

    fn draw_elements_u32(&self, count: usize) {
        let Some(count) = gl_size(count, "draw count") else { return };
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_INT, 0)
        }
        self.check("glDrawElements");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_beyond_i32_are_refused() {
        assert_eq!(gl_size(24, "stride"), Some(24));
        assert_eq!(gl_size(i32::MAX as usize, "count"), Some(i32::MAX));
        assert_eq!(gl_size(i32::MAX as usize + 1, "count"), None);
    }

    #[test]
    fn debug_severity_maps_to_log_level() {
        assert_eq!(debug_level(glow::DEBUG_SEVERITY_HIGH), log::Level::Error);
        assert_eq!(debug_level(glow::DEBUG_SEVERITY_MEDIUM), log::Level::Warn);
        assert_eq!(debug_level(glow::DEBUG_SEVERITY_LOW), log::Level::Info);
        assert_eq!(debug_level(glow::DEBUG_SEVERITY_NOTIFICATION), log::Level::Debug);
    }

    #[test]
    fn error_codes_have_names() {
        assert_eq!(error_name(glow::OUT_OF_MEMORY), "GL_OUT_OF_MEMORY");
        assert_eq!(error_name(glow::INVALID_VALUE), "GL_INVALID_VALUE");
        assert_eq!(error_name(0xdead), "unknown GL error");
        assert_eq!(debug_type_name(glow::DEBUG_TYPE_PERFORMANCE), "performance");
        assert_eq!(debug_source_name(glow::DEBUG_SOURCE_SHADER_COMPILER), "shader-compiler");
    }

    #[test]
    fn targets_and_usages_map_to_gl_enums() {
        assert_eq!(target_enum(BufferTarget::ElementArray), glow::ELEMENT_ARRAY_BUFFER);
        assert_eq!(usage_enum(BufferUsage::Static), glow::STATIC_DRAW);
        assert_eq!(usage_enum(BufferUsage::Stream), glow::STREAM_DRAW);
    }
}

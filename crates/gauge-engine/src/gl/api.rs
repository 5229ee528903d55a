use std::fmt::Debug;

use glam::Mat4;

use crate::geometry::{VertexAttribute, Winding};
use crate::resources::TextureImage;

use super::GlError;

/// Buffer binding points used by the engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferTarget {
    /// Vertex data (`GL_ARRAY_BUFFER`).
    Array,
    /// Index data (`GL_ELEMENT_ARRAY_BUFFER`).
    ElementArray,
}

/// Allocation usage hint passed with a full buffer (re)allocation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferUsage {
    /// Written once, drawn many times (`GL_STATIC_DRAW`).
    Static,
    /// Rewritten every frame (`GL_STREAM_DRAW`).
    Stream,
}

/// The slice of a GL context the engine talks to.
///
/// All calls happen on the thread that owns the context. Methods take
/// `&self` like the underlying driver API; implementations that track state
/// use interior mutability.
///
/// Handles are opaque `Copy` values. Deleting a handle twice is a bug in the
/// caller; the RAII owners in `render` and `resources` make sure it does not
/// happen.
pub trait GraphicsApi {
    type VertexArray: Copy + Debug + PartialEq;
    type Buffer: Copy + Debug + PartialEq;
    type Program: Copy + Debug + PartialEq;
    type Texture: Copy + Debug + PartialEq;

    // ── vertex arrays ─────────────────────────────────────────────────────

    fn create_vertex_array(&self) -> Result<Self::VertexArray, GlError>;
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);

    // ── buffers ───────────────────────────────────────────────────────────

    fn create_buffer(&self) -> Result<Self::Buffer, GlError>;
    fn delete_buffer(&self, buffer: Self::Buffer);
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>);

    /// Replaces the storage of the buffer bound to `target` with `data`.
    ///
    /// On error (out of memory, nothing bound) the buffer's previous storage
    /// must be treated as gone.
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) -> Result<(), GlError>;

    /// Overwrites `data.len()` bytes of the bound buffer starting at `offset`.
    /// The range must lie inside the current allocation.
    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]);

    /// Reads back `len` bytes of the bound buffer. `None` when the backend
    /// cannot read GPU memory or the range is outside the allocation.
    fn read_buffer(&self, target: BufferTarget, offset: usize, len: usize) -> Option<Vec<u8>>;

    // ── attributes ────────────────────────────────────────────────────────

    /// Describes `attribute` for the buffer bound to `BufferTarget::Array`.
    fn vertex_attrib_pointer(&self, attribute: &VertexAttribute, stride: usize);
    fn enable_vertex_attrib_array(&self, location: u32);

    // ── shaders ───────────────────────────────────────────────────────────

    fn create_program(&self, vertex_src: &str, fragment_src: &str) -> Result<Self::Program, GlError>;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);
    fn set_uniform_i32(&self, program: Self::Program, name: &str, value: i32);
    fn set_uniform_mat4(&self, program: Self::Program, name: &str, value: &Mat4);

    // ── textures ──────────────────────────────────────────────────────────

    /// Uploads an RGBA8 image as a clamped, linearly filtered, mipmapped 2D texture.
    fn create_texture_rgba(&self, image: &TextureImage) -> Result<Self::Texture, GlError>;
    fn delete_texture(&self, texture: Self::Texture);
    fn bind_texture(&self, unit: u32, texture: Option<Self::Texture>);

    // ── fixed-function state ──────────────────────────────────────────────

    fn front_face(&self) -> Winding;
    fn set_front_face(&self, winding: Winding);

    /// Indexed triangle draw of `count` `u32` indices from offset 0 of the
    /// element buffer attached to the bound vertex array.
    fn draw_elements_u32(&self, count: usize);
}

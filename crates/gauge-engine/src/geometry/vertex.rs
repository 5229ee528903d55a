use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::coords::Vec2;
use crate::gl::GraphicsApi;
use crate::paint::Color8;

/// Component type of a vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttribKind {
    F32,
    U8,
}

impl AttribKind {
    /// Size of one component in bytes.
    pub const fn size(self) -> usize {
        match self {
            AttribKind::F32 => 4,
            AttribKind::U8 => 1,
        }
    }
}

/// How one field of a vertex record maps to a shader input.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    /// Shader `layout(location = N)`.
    pub location: u32,
    pub components: u32,
    pub kind: AttribKind,
    /// Integer components are mapped to `[0, 1]` when set.
    pub normalized: bool,
    /// Byte offset of the field inside the record.
    pub offset: usize,
}

impl VertexAttribute {
    /// Bytes covered by this attribute inside one record.
    pub const fn byte_len(&self) -> usize {
        self.components as usize * self.kind.size()
    }
}

/// A record that can be memcopied into a vertex buffer.
///
/// `Pod` guarantees there is no padding and no pointer inside, so
/// `bytemuck::cast_slice` of a `&[Self]` is exactly what the GPU reads.
pub trait Vertex: Pod {
    /// One entry per shader input, in location order.
    const ATTRIBUTES: &'static [VertexAttribute];

    /// Distance in bytes between consecutive records.
    fn stride() -> usize {
        size_of::<Self>()
    }

    /// Describes every attribute against the currently bound vertex buffer
    /// and enables it on the currently bound vertex array.
    fn map_attributes<G: GraphicsApi>(gl: &G) {
        for attribute in Self::ATTRIBUTES {
            gl.vertex_attrib_pointer(attribute, Self::stride());
            gl.enable_vertex_attrib_array(attribute.location);
        }
    }
}

/// Vertex types the quad builder can emit.
pub trait QuadVertex: Vertex {
    fn quad_corner(position: Vec2, uv: Vec2, color: Color8) -> Self;
}

/// Position + texture coordinate + packed color.
///
/// Matches a shader declaring:
/// ```glsl
/// layout (location = 0) in vec3 aPos;
/// layout (location = 1) in vec2 aTexCoord;
/// layout (location = 2) in vec4 aForeColor;
/// ```
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ColoredVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: Color8,
}

impl ColoredVertex {
    #[inline]
    pub const fn new(position: [f32; 3], uv: [f32; 2], color: Color8) -> Self {
        Self { position, uv, color }
    }

    /// Transforms the position as a homogeneous point (divides by w).
    pub fn apply_transform(&mut self, transform: &Mat4) -> &mut Self {
        self.position = transform
            .project_point3(Vec3::from_array(self.position))
            .to_array();
        self
    }
}

impl Vertex for ColoredVertex {
    const ATTRIBUTES: &'static [VertexAttribute] = &[
        VertexAttribute {
            location: 0,
            components: 3,
            kind: AttribKind::F32,
            normalized: false,
            offset: offset_of!(ColoredVertex, position),
        },
        VertexAttribute {
            location: 1,
            components: 2,
            kind: AttribKind::F32,
            normalized: false,
            offset: offset_of!(ColoredVertex, uv),
        },
        VertexAttribute {
            location: 2,
            components: 4,
            kind: AttribKind::U8,
            normalized: true,
            offset: offset_of!(ColoredVertex, color),
        },
    ];
}

impl QuadVertex for ColoredVertex {
    #[inline]
    fn quad_corner(position: Vec2, uv: Vec2, color: Color8) -> Self {
        Self::new([position.x, position.y, 0.0], uv.to_array(), color)
    }
}

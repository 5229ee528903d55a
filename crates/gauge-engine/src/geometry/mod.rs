//! CPU-side geometry: the vertex record contract and the quad builder.

mod quad;
mod vertex;

pub use quad::{Geometry, IndexOutOfRange};
pub use vertex::{AttribKind, ColoredVertex, QuadVertex, Vertex, VertexAttribute};

use std::str::FromStr;

/// Triangle winding emitted by the quad builder.
///
/// Chosen once when the geometry (and the surface drawing it) is set up.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Winding {
    /// Triangles (0,1,3) and (1,2,3) per quad. X-Plane's panel convention.
    #[default]
    Clockwise,
    /// Triangles (0,3,1) and (1,3,2) per quad. OpenGL's default front face.
    CounterClockwise,
}

impl Winding {
    /// The six indices of a quad whose first vertex is `base`.
    #[inline]
    pub const fn quad_indices(self, base: u32) -> [u32; 6] {
        match self {
            Winding::Clockwise => [base, base + 1, base + 3, base + 1, base + 2, base + 3],
            Winding::CounterClockwise => [base, base + 3, base + 1, base + 1, base + 3, base + 2],
        }
    }
}

impl FromStr for Winding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cw" | "clockwise" => Ok(Winding::Clockwise),
            "ccw" | "counter-clockwise" | "counterclockwise" => Ok(Winding::CounterClockwise),
            other => Err(format!("unknown winding `{other}` (expected cw or ccw)")),
        }
    }
}

use std::fmt;

use crate::coords::{Rect, Vec2};
use crate::paint::Color8;

use super::{QuadVertex, Winding};

/// Texture coordinates of the four quad corners, in emission order
/// (bottom-left, top-left, top-right, bottom-right).
const CORNER_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
];

/// An index that points past the vertex list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOutOfRange {
    /// Position of the offending entry in the index list.
    pub position: usize,
    pub index: u32,
    pub vertex_count: usize,
}

impl fmt::Display for IndexOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index {} at position {} is out of range for {} vertices",
            self.index, self.position, self.vertex_count
        )
    }
}

impl std::error::Error for IndexOutOfRange {}

/// CPU-side vertex and index lists, filled one quad at a time.
///
/// Invariant: when built only through `add_quad*`, every index is smaller
/// than `vertex_count()`. Each quad appends exactly 4 vertices at the tail
/// and 6 indices.
///
/// The winding is fixed at construction; every quad in the list uses it.
#[derive(Debug, Clone)]
pub struct Geometry<V> {
    vertices: Vec<V>,
    indices: Vec<u32>,
    winding: Winding,
}

impl<V> Geometry<V> {
    pub fn new(winding: Winding) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            winding,
        }
    }

    /// Pre-sizes both lists for `quads` quads.
    pub fn with_quad_capacity(quads: usize, winding: Winding) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * 4),
            indices: Vec::with_capacity(quads * 6),
            winding,
        }
    }

    #[inline]
    pub fn winding(&self) -> Winding {
        self.winding
    }

    #[inline]
    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of indices; this is the count a draw call renders.
    #[inline]
    pub fn element_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Empties both lists, keeping their allocations. GPU buffers are not touched.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Appends arbitrary indexed geometry. `local_indices` are relative to
    /// the first vertex of `vertices` and are rebased onto the tail.
    ///
    /// Nothing is checked here; call [`validate_indices`](Self::validate_indices)
    /// before syncing geometry built this way.
    pub fn extend_indexed(&mut self, vertices: &[V], local_indices: &[u32])
    where
        V: Copy,
    {
        let base = self.next_base(0);
        self.vertices.extend_from_slice(vertices);
        self.indices
            .extend(local_indices.iter().map(|&i| base.wrapping_add(i)));
    }

    /// Returns the first index that references a missing vertex.
    pub fn validate_indices(&self) -> Result<(), IndexOutOfRange> {
        let vertex_count = self.vertices.len();
        match self
            .indices
            .iter()
            .position(|&i| i as usize >= vertex_count)
        {
            None => Ok(()),
            Some(position) => Err(IndexOutOfRange {
                position,
                index: self.indices[position],
                vertex_count,
            }),
        }
    }

    /// Index of the next vertex to be appended, checked so that `extra` more
    /// vertices still fit in a `u32` index.
    fn next_base(&self, extra: u32) -> u32 {
        u32::try_from(self.vertices.len())
            .ok()
            .filter(|base| base.checked_add(extra).is_some())
            .expect("geometry exceeds the u32 index range")
    }
}

impl<V: QuadVertex> Geometry<V> {
    /// Appends a white quad.
    pub fn add_quad(&mut self, rect: Rect) {
        self.add_quad_with(rect, Color8::WHITE, |_| {});
    }

    /// Appends a quad with a uniform color.
    pub fn add_colored_quad(&mut self, rect: Rect, color: Color8) {
        self.add_quad_with(rect, color, |_| {});
    }

    /// Appends a quad and lets `per_vertex` adjust each new vertex.
    ///
    /// Corners are emitted bottom-left, top-left, top-right, bottom-right with
    /// UVs (0,0), (0,1), (1,1), (1,0). `per_vertex` runs once per corner in
    /// that order, after the vertex is stored and before the indices are
    /// written. It can change position, UV or color; indices are positional
    /// and unaffected.
    pub fn add_quad_with<F>(&mut self, rect: Rect, color: Color8, mut per_vertex: F)
    where
        F: FnMut(&mut V),
    {
        let base = self.next_base(3);

        let corners = [rect.bottom_left(), rect.top_left(), rect.top_right(), rect.bottom_right()];
        for (pos, uv) in corners.into_iter().zip(CORNER_UVS) {
            self.vertices.push(V::quad_corner(pos, uv, color));
        }

        let start = self.vertices.len() - 4;
        for vertex in &mut self.vertices[start..] {
            per_vertex(vertex);
        }

        self.indices.extend_from_slice(&self.winding.quad_indices(base));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ColoredVertex;

    fn geometry() -> Geometry<ColoredVertex> {
        Geometry::new(Winding::Clockwise)
    }

    fn screen() -> Rect {
        Rect::new(0.0, 0.0, 1024.0, 768.0)
    }

    // ── corners ───────────────────────────────────────────────────────────

    #[test]
    fn corners_emitted_bl_tl_tr_br() {
        let mut g = geometry();
        g.add_quad(Rect::new(10.0, 20.0, 30.0, 40.0));

        let pos: Vec<[f32; 3]> = g.vertices().iter().map(|v| v.position).collect();
        assert_eq!(
            pos,
            vec![[10.0, 20.0, 0.0], [10.0, 60.0, 0.0], [40.0, 60.0, 0.0], [40.0, 20.0, 0.0]]
        );
        let uvs: Vec<[f32; 2]> = g.vertices().iter().map(|v| v.uv).collect();
        assert_eq!(uvs, vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);
    }

    #[test]
    fn default_color_is_white() {
        let mut g = geometry();
        g.add_quad(screen());
        assert!(g.vertices().iter().all(|v| v.color == Color8::WHITE));
    }

    #[test]
    fn colored_quad_shares_color() {
        let mut g = geometry();
        g.add_colored_quad(screen(), Color8::YELLOW);
        assert!(g.vertices().iter().all(|v| v.color == Color8::YELLOW));
    }

    // ── atomicity ─────────────────────────────────────────────────────────

    #[test]
    fn each_quad_adds_four_vertices_and_six_indices() {
        let mut g = geometry();
        for n in 1..=5 {
            g.add_quad(Rect::new(n as f32, 0.0, 1.0, 1.0));
            assert_eq!(g.vertex_count(), 4 * n);
            assert_eq!(g.element_count(), 6 * n);
            // The newest vertices sit at the tail.
            assert_eq!(g.vertices()[4 * n - 4].position[0], n as f32);
        }
    }

    #[test]
    fn indices_stay_in_bounds() {
        let mut g = geometry();
        for n in 0..50 {
            g.add_quad(Rect::new(n as f32, n as f32, 2.0, 2.0));
        }
        assert!(g.validate_indices().is_ok());
        assert!(g.indices().iter().all(|&i| (i as usize) < g.vertex_count()));
    }

    // ── winding ───────────────────────────────────────────────────────────

    #[test]
    fn clockwise_winding_indices() {
        let mut g = geometry();
        g.add_quad(screen());
        assert_eq!(g.indices(), &[0, 1, 3, 1, 2, 3]);
        g.add_quad(screen());
        assert_eq!(&g.indices()[6..], &[4, 5, 7, 5, 6, 7]);
    }

    #[test]
    fn counter_clockwise_winding_indices() {
        let mut g: Geometry<ColoredVertex> = Geometry::new(Winding::CounterClockwise);
        g.add_quad(screen());
        g.add_quad(screen());
        assert_eq!(g.indices(), &[0, 3, 1, 1, 3, 2, 4, 7, 5, 5, 7, 6]);
    }

    // ── per-vertex callback ───────────────────────────────────────────────

    #[test]
    fn callback_runs_once_per_vertex_in_order() {
        let mut g = geometry();
        g.add_quad(screen());

        let mut seen = Vec::new();
        g.add_quad_with(Rect::new(0.0, 0.0, 2.0, 2.0), Color8::RED, |v| seen.push(v.uv));
        assert_eq!(seen, vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);
    }

    #[test]
    fn callback_mutation_is_kept_and_indices_unchanged() {
        let mut g = geometry();
        let shift = glam::Mat4::from_translation(glam::Vec3::new(5.0, 5.0, 0.0));
        g.add_quad_with(Rect::new(0.0, 0.0, 1.0, 1.0), Color8::WHITE, |v| {
            v.apply_transform(&shift);
            v.color = Color8::GREEN;
        });

        assert_eq!(g.vertices()[0].position, [5.0, 5.0, 0.0]);
        assert_eq!(g.vertices()[2].position, [6.0, 6.0, 0.0]);
        assert!(g.vertices().iter().all(|v| v.color == Color8::GREEN));
        assert_eq!(g.indices(), &[0, 1, 3, 1, 2, 3]);
    }

    // ── clear / scenario ──────────────────────────────────────────────────

    #[test]
    fn clear_then_two_quads() {
        let mut g = geometry();
        g.add_quad(screen());
        assert_eq!((g.vertex_count(), g.element_count()), (4, 6));

        g.clear();
        assert!(g.is_empty());
        g.add_quad(screen());
        g.add_quad(screen());
        assert_eq!((g.vertex_count(), g.element_count()), (8, 12));
        assert_eq!(g.indices(), &[0, 1, 3, 1, 2, 3, 4, 5, 7, 5, 6, 7]);
    }

    // ── raw geometry ──────────────────────────────────────────────────────

    #[test]
    fn extend_indexed_rebases_onto_tail() {
        let mut g = geometry();
        g.add_quad(screen());
        let tri = [ColoredVertex::default(); 3];
        g.extend_indexed(&tri, &[0, 1, 2]);
        assert_eq!(&g.indices()[6..], &[4, 5, 6]);
        assert!(g.validate_indices().is_ok());
    }

    #[test]
    fn validate_reports_first_bad_index() {
        let mut g = geometry();
        g.extend_indexed(&[ColoredVertex::default(); 2], &[0, 1, 2, 7]);
        assert_eq!(
            g.validate_indices(),
            Err(IndexOutOfRange { position: 2, index: 2, vertex_count: 2 })
        );
    }
}

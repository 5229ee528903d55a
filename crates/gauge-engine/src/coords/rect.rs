use super::Vec2;

/// Axis-aligned rectangle in surface pixels.
///
/// `pos` is the bottom-left corner (GL convention, +Y up); `size` extends
/// right and up from it.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn bottom_left(self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn top_left(self) -> Vec2 {
        self.pos + Vec2::new(0.0, self.size.y)
    }

    #[inline]
    pub fn top_right(self) -> Vec2 {
        self.pos + self.size
    }

    #[inline]
    pub fn bottom_right(self) -> Vec2 {
        self.pos + Vec2::new(self.size.x, 0.0)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Closed containment: points on any edge are inside.
    #[inline]
    pub fn contains_point(self, p: Vec2) -> bool {
        let d = p - self.pos;
        d.x >= 0.0 && d.x <= self.size.x && d.y >= 0.0 && d.y <= self.size.y
    }

    /// Grows the rectangle by `x` on the left and right and `y` on the top
    /// and bottom. Negative values shrink it.
    #[inline]
    pub fn inflate(self, x: f32, y: f32) -> Rect {
        Rect::new(
            self.pos.x - x,
            self.pos.y - y,
            self.size.x + 2.0 * x,
            self.size.y + 2.0 * y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── corners ───────────────────────────────────────────────────────────

    #[test]
    fn corners_follow_y_up() {
        let rect = r(10.0, 20.0, 4.0, 2.0);
        assert_eq!(rect.bottom_left(), Vec2::new(10.0, 20.0));
        assert_eq!(rect.top_left(), Vec2::new(10.0, 22.0));
        assert_eq!(rect.top_right(), Vec2::new(14.0, 22.0));
        assert_eq!(rect.bottom_right(), Vec2::new(14.0, 20.0));
    }

    // ── contains_point ────────────────────────────────────────────────────

    #[test]
    fn contains_interior_point() {
        assert!(r(0.0, 0.0, 10.0, 10.0).contains_point(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn contains_edges_inclusive() {
        let rect = r(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains_point(Vec2::new(0.0, 0.0)));
        assert!(rect.contains_point(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn contains_outside() {
        assert!(!r(0.0, 0.0, 10.0, 10.0).contains_point(Vec2::new(-1.0, 5.0)));
        assert!(!r(0.0, 0.0, 10.0, 10.0).contains_point(Vec2::new(5.0, 10.5)));
    }

    // ── inflate ───────────────────────────────────────────────────────────

    #[test]
    fn inflate_grows_both_sides() {
        assert_eq!(r(10.0, 10.0, 4.0, 6.0).inflate(1.0, 2.0), r(9.0, 8.0, 6.0, 10.0));
    }

    #[test]
    fn inflate_negative_shrinks() {
        assert_eq!(r(0.0, 0.0, 10.0, 10.0).inflate(-2.0, -2.0), r(2.0, 2.0, 6.0, 6.0));
    }

    #[test]
    fn is_empty_zero_size() {
        assert!(r(0.0, 0.0, 0.0, 5.0).is_empty());
        assert!(!r(0.0, 0.0, 1.0, 1.0).is_empty());
    }
}

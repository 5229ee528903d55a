use bytemuck::{Pod, Zeroable};

/// Packed 8-bit RGBA color, straight alpha.
///
/// Laid out exactly as the vertex shader reads it: four unsigned bytes,
/// normalized to `[0, 1]` by the attribute binding.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Color8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color8 {
    pub const WHITE: Color8 = Color8::new(255, 255, 255, 255);
    pub const BLACK: Color8 = Color8::new(0, 0, 0, 255);
    pub const RED: Color8 = Color8::new(255, 0, 0, 255);
    pub const GREEN: Color8 = Color8::new(0, 255, 0, 255);
    pub const BLUE: Color8 = Color8::new(0, 0, 255, 255);
    pub const YELLOW: Color8 = Color8::new(255, 255, 0, 255);
    pub const TRANSPARENT: Color8 = Color8::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from `f32` channels in `[0, 1]`.
    ///
    /// Channels are clamped before scaling, so out-of-range input saturates
    /// instead of wrapping.
    #[inline]
    pub fn from_floats(r: f32, g: f32, b: f32, a: f32) -> Self {
        fn channel(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        Self::new(channel(r), channel(g), channel(b), channel(a))
    }

    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_floats_scales_to_bytes() {
        assert_eq!(Color8::from_floats(1.0, 0.0, 0.5, 1.0), Color8::new(255, 0, 128, 255));
    }

    #[test]
    fn from_floats_saturates_out_of_range() {
        assert_eq!(Color8::from_floats(2.0, -1.0, 0.0, 1.5), Color8::new(255, 0, 0, 255));
    }

    #[test]
    fn layout_is_four_bytes_in_rgba_order() {
        assert_eq!(std::mem::size_of::<Color8>(), 4);
        assert_eq!(bytemuck::bytes_of(&Color8::YELLOW), &[255, 255, 0, 255]);
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use image::DynamicImage;

use crate::gl::{GlError, GraphicsApi};

/// Decoded RGBA8 pixels, rows bottom-up as GL expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureImage {
    /// Decodes an image file. Any format the `image` features enable is
    /// accepted; the result is converted to RGBA8 and flipped vertically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).with_context(|| format!("failed to decode texture {}", path.display()))?;
        Ok(Self::from_image(img))
    }

    /// Decodes an in-memory encoded image.
    pub fn from_memory(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes).context("failed to decode texture bytes")?;
        Ok(Self::from_image(img))
    }

    fn from_image(img: DynamicImage) -> Self {
        let rgba = img.flipv().to_rgba8();
        let (width, height) = rgba.dimensions();
        Self { width, height, pixels: rgba.into_raw() }
    }

    /// Wraps raw RGBA8 pixels, already bottom-up.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        anyhow::ensure!(
            pixels.len() == expected,
            "{width}x{height} RGBA8 image needs {expected} bytes, got {}",
            pixels.len()
        );
        Ok(Self { width, height, pixels })
    }

    /// Opaque white. Multiplies vertex colors through unchanged.
    pub fn white_1x1() -> Self {
        Self { width: 1, height: 1, pixels: vec![0xFF; 4] }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// A GPU texture deleted on drop.
pub struct Texture<'g, G: GraphicsApi> {
    gl: &'g G,
    raw: G::Texture,
    size: (u32, u32),
}

impl<'g, G: GraphicsApi> Texture<'g, G> {
    /// Uploads `image` with clamp-to-edge wrapping, linear filtering and
    /// mipmaps.
    pub fn upload(gl: &'g G, image: &TextureImage) -> Result<Self, GlError> {
        let raw = gl.create_texture_rgba(image)?;
        log::debug!("texture uploaded: {raw:?} {}x{}", image.width(), image.height());
        Ok(Self { gl, raw, size: (image.width(), image.height()) })
    }

    pub fn white(gl: &'g G) -> Result<Self, GlError> {
        Self::upload(gl, &TextureImage::white_1x1())
    }

    #[inline]
    pub fn raw(&self) -> G::Texture {
        self.raw
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn bind(&self, unit: u32) {
        self.gl.bind_texture(unit, Some(self.raw));
    }
}

impl<G: GraphicsApi> Drop for Texture<'_, G> {
    fn drop(&mut self) {
        self.gl.delete_texture(self.raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::HeadlessDevice;

    fn two_row_png() -> Vec<u8> {
        // Top row red, bottom row blue.
        let img = image::RgbaImage::from_fn(1, 2, |_, y| {
            if y == 0 { image::Rgba([255, 0, 0, 255]) } else { image::Rgba([0, 0, 255, 255]) }
        });
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decoded_rows_are_flipped() {
        let tex = TextureImage::from_memory(&two_row_png()).unwrap();
        assert_eq!((tex.width(), tex.height()), (1, 2));
        assert_eq!(&tex.pixels()[..4], &[0, 0, 255, 255]);
        assert_eq!(&tex.pixels()[4..], &[255, 0, 0, 255]);
    }

    #[test]
    fn open_reports_path_on_failure() {
        let err = TextureImage::open("/nonexistent/gauge.png").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/gauge.png"));
    }

    #[test]
    fn raw_pixels_must_match_size() {
        assert!(TextureImage::from_rgba8(2, 2, vec![0; 16]).is_ok());
        assert!(TextureImage::from_rgba8(2, 2, vec![0; 12]).is_err());
    }

    #[test]
    fn upload_and_drop() {
        let gl = HeadlessDevice::new();
        {
            let tex = Texture::white(&gl).unwrap();
            assert_eq!(gl.texture_size(tex.raw()), Some((1, 1)));
            assert_eq!(tex.size(), (1, 1));
        }
        assert_eq!(gl.counters().textures_deleted, 1);
        assert_eq!(gl.counters().live_objects(), 0);
    }
}

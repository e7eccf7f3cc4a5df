//! In-memory RGB bitmaps with provenance.

use std::io::Cursor;

use image::{ImageFormat, RgbImage};

use crate::types::GarmentId;

/// Where a bitmap came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// The person image of a request.
    Subject,
    /// A garment image, or a rendered result attributed to that garment.
    Garment(GarmentId),
}

/// A decoded RGB bitmap owned by one pipeline run.
#[derive(Clone)]
pub struct DecodedImage {
    source: ImageSource,
    pixels: RgbImage,
}

impl DecodedImage {
    pub fn new(source: ImageSource, pixels: RgbImage) -> Self {
        Self { source, pixels }
    }

    /// Decode any supported encoded image (PNG, JPEG, WebP) into RGB.
    pub fn decode(bytes: &[u8], source: ImageSource) -> Result<Self, image::ImageError> {
        let pixels = image::load_from_memory(bytes)?.to_rgb8();
        Ok(Self { source, pixels })
    }

    /// Lossless PNG encoding of the bitmap.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }

    /// Copy of this bitmap relabelled with a different provenance.
    pub fn relabelled(&self, source: ImageSource) -> Self {
        Self {
            source,
            pixels: self.pixels.clone(),
        }
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (width, height) = self.dimensions();
        f.debug_struct("DecodedImage")
            .field("source", &self.source)
            .field("width", &width)
            .field("height", &height)
            .finish()
    }
}

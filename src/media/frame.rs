use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::error::MediaError;

/// A single captured video frame (RGB8, row-major, no padding)
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Milliseconds since the stream was acquired
    pub timestamp_ms: u64,
}

impl VideoFrame {
    /// Build a solid-color frame (used by the synthetic backend and tests)
    pub fn solid(width: u32, height: u32, rgb: [u8; 3], timestamp_ms: u64) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&rgb);
        }
        Self {
            pixels,
            width,
            height,
            timestamp_ms,
        }
    }

    /// Encode the frame as JPEG at the given quality (0-100)
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>, MediaError> {
        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        encoder
            .write_image(&self.pixels, self.width, self.height, ExtendedColorType::Rgb8)
            .map_err(|e| MediaError::Encode(e.to_string()))?;
        Ok(buf)
    }

    /// Encode as a `data:image/jpeg;base64,...` URL, the payload format the
    /// analysis endpoint expects
    pub fn to_data_url(&self, quality: u8) -> Result<String, MediaError> {
        let jpeg = self.to_jpeg(quality)?;
        Ok(format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(jpeg)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    #[test]
    fn solid_frame_has_expected_dimensions() {
        let frame = VideoFrame::solid(8, 4, [10, 20, 30], 0);
        assert_eq!(frame.pixels.len(), 8 * 4 * 3);
        assert_eq!(&frame.pixels[..3], &[10, 20, 30]);
    }

    #[test]
    fn data_url_is_base64_jpeg() {
        let frame = VideoFrame::solid(16, 16, [200, 100, 50], 0);
        let url = frame.to_data_url(80).unwrap();

        let payload = url
            .strip_prefix("data:image/jpeg;base64,")
            .expect("data URL should carry the jpeg mime prefix");

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .unwrap();
        // JPEG SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}

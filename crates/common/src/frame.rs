use image::RgbImage;
use std::sync::Arc;

use crate::{GuardianError, Result, Timestamp};

/// Handle to one frame of the stream.
///
/// The engine never inspects pixels itself; the image is passed through to the
/// pose extractor, the whitelist gate and the snapshot sink. Recorded streams
/// may carry no pixels at all.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub timestamp: Timestamp,
    pub image: Option<Arc<RgbImage>>,
}

impl Frame {
    pub fn new(index: u64, timestamp: Timestamp, image: RgbImage) -> Self {
        Self {
            index,
            timestamp,
            image: Some(Arc::new(image)),
        }
    }

    /// Frame that carries only its position in the stream
    pub fn without_image(index: u64, timestamp: Timestamp) -> Self {
        Self {
            index,
            timestamp,
            image: None,
        }
    }

    /// Decode an encoded (JPEG/PNG) frame received from the transport
    pub fn decode(index: u64, timestamp: Timestamp, data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(GuardianError::UndecodableFrame("empty payload".to_string()));
        }
        let image = image::load_from_memory(data)
            .map_err(|e| GuardianError::UndecodableFrame(e.to_string()))?
            .to_rgb8();
        Ok(Self::new(index, timestamp, image))
    }

    /// Pixel dimensions, if the frame carries an image
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| img.dimensions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    #[test]
    fn test_decode_png() {
        let img: RgbImage = ImageBuffer::from_fn(8, 6, |x, y| Rgb([x as u8, y as u8, 0]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let frame = Frame::decode(3, 1.5, &bytes).unwrap();
        assert_eq!(frame.index, 3);
        assert_eq!(frame.dimensions(), Some((8, 6)));
    }

    #[test]
    fn test_decode_garbage() {
        let err = Frame::decode(0, 0.0, b"\x00\x01garbage").unwrap_err();
        assert!(matches!(err, GuardianError::UndecodableFrame(_)));
        assert!(Frame::decode(0, 0.0, &[]).is_err());
    }

    #[test]
    fn test_without_image() {
        let frame = Frame::without_image(7, 2.0);
        assert!(frame.dimensions().is_none());
    }
}

//! Borrowed and owned views of interleaved 8-bit image buffers.

use crate::tracker::Rect;

/// Borrowed interleaved 8-bit image, row-major, `channels` bytes per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    channels: u32,
}

impl<'a> Frame<'a> {
    /// Returns `None` unless `data` holds exactly `width * height * channels` bytes.
    pub fn new(data: &'a [u8], width: u32, height: u32, channels: u32) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(channels as usize)?;
        if channels == 0 || data.len() != expected {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            channels,
        })
    }

    pub fn gray(data: &'a [u8], width: u32, height: u32) -> Option<Self> {
        Self::new(data, width, height, 1)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn same_shape(&self, other: &Frame<'_>) -> bool {
        self.width == other.width && self.height == other.height && self.channels == other.channels
    }

    /// Copy the region under `rect`, clamped to the image.
    ///
    /// Returns `None` when the clamped region is empty.
    pub fn crop(&self, rect: &Rect) -> Option<OwnedFrame> {
        let [x1, y1, x2, y2] = rect.pixel_bounds(self.width, self.height)?;

        let channels = self.channels as usize;
        let stride = self.width as usize * channels;
        let row_len = (x2 - x1) * channels;
        let mut data = Vec::with_capacity(row_len * (y2 - y1));
        for y in y1..y2 {
            let start = y * stride + x1 * channels;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }

        Some(OwnedFrame {
            data,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
            channels: self.channels,
        })
    }
}

/// Owned counterpart of [`Frame`], used for crops and retained frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u32,
}

impl OwnedFrame {
    pub fn view(&self) -> Frame<'_> {
        Frame {
            data: &self.data,
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }
}

impl From<&Frame<'_>> for OwnedFrame {
    fn from(frame: &Frame<'_>) -> Self {
        Self {
            data: frame.data.to_vec(),
            width: frame.width,
            height: frame.height,
            channels: frame.channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        assert!(Frame::new(&[0; 12], 2, 2, 3).is_some());
        assert!(Frame::new(&[0; 11], 2, 2, 3).is_none());
        assert!(Frame::new(&[], 0, 0, 0).is_none());
    }

    #[test]
    fn test_crop() {
        // 4x3 gray image with value = y * 10 + x
        let data: Vec<u8> = (0..3).flat_map(|y| (0..4).map(move |x| y * 10 + x)).collect();
        let frame = Frame::gray(&data, 4, 3).unwrap();

        let crop = frame.crop(&Rect::new(1.0, 1.0, 2.0, 2.0)).unwrap();
        let view = crop.view();
        assert_eq!((view.width(), view.height()), (2, 2));
        assert_eq!(view.data(), &[11, 12, 21, 22]);
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let data = vec![7u8; 4 * 3 * 3];
        let frame = Frame::new(&data, 4, 3, 3).unwrap();

        let crop = frame.crop(&Rect::new(-5.0, 2.0, 100.0, 100.0)).unwrap();
        assert_eq!((crop.view().width(), crop.view().height()), (4, 1));
        assert_eq!(crop.view().data().len(), 12);

        assert!(frame.crop(&Rect::new(10.0, 10.0, 5.0, 5.0)).is_none());
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! A single captured frame.
//!
//! Frames are RGBA8, tightly packed, and cheap to clone (the pixel data is
//! reference-counted). A frame is owned by the in-flight pipeline call until
//! it is rendered or discarded; it is never queued beyond the single
//! "latest wins" slot held by the render surface.

use std::sync::Arc;
use std::time::Instant;

/// One captured image plus its capture timestamp.
#[derive(Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixel data, row-major, stride = width * 4
    pub data: Arc<[u8]>,
    /// When the frame left the capture device
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Arc<[u8]>) -> Self {
        Self {
            width,
            height,
            data,
            captured_at: Instant::now(),
        }
    }

    /// Frame dimensions as floating-point extent, for scale math
    pub fn extent(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }

    /// Expected byte length for the frame dimensions
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_and_len() {
        let frame = Frame::new(4, 2, Arc::from(vec![0u8; 32]));
        assert_eq!(frame.extent(), (4.0, 2.0));
        assert_eq!(frame.expected_len(), 32);
        assert_eq!(frame.data.len(), frame.expected_len());
    }

    #[test]
    fn test_clone_shares_data() {
        let frame = Frame::new(2, 2, Arc::from(vec![7u8; 16]));
        let copy = frame.clone();
        assert!(Arc::ptr_eq(&frame.data, &copy.data));
    }
}

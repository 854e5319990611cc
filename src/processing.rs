// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame processing stage.
//!
//! Holds the single optional transform applied to every captured frame
//! before presentation. The transform is hot-swappable while the pipeline
//! runs: each frame observes exactly one transform, the one installed when
//! its processing began.

use crate::frame::Frame;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Frame transform invoked on the delivery thread, one frame at a time
pub type FrameTransform = dyn Fn(Frame) -> Frame + Send + Sync;

/// The processing slot between capture and presentation
#[derive(Default)]
pub struct ProcessingStage {
    transform: RwLock<Option<Arc<FrameTransform>>>,
}

impl ProcessingStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `transform` for all subsequent frames. Frames already in
    /// flight finish with the transform they started with.
    pub fn set_transform(&self, transform: Arc<FrameTransform>) {
        *self.transform.write().unwrap() = Some(transform);
        debug!("Frame transform installed");
    }

    /// Remove the transform; subsequent frames pass through unmodified
    pub fn clear_transform(&self) {
        *self.transform.write().unwrap() = None;
        debug!("Frame transform cleared");
    }

    pub fn has_transform(&self) -> bool {
        self.transform.read().unwrap().is_some()
    }

    /// Run `frame` through the installed transform, if any.
    ///
    /// The transform handle is cloned under the read lock and invoked
    /// outside it, so a swap never blocks on a long-running transform.
    pub fn apply(&self, frame: Frame) -> Frame {
        let transform = self.transform.read().unwrap().clone();
        match transform {
            Some(transform) => transform(frame),
            None => frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_frame(value: u8) -> Frame {
        Frame::new(2, 2, Arc::from(vec![value; 16]))
    }

    #[test]
    fn test_identity_without_transform() {
        let stage = ProcessingStage::new();
        let frame = uniform_frame(42);
        let out = stage.apply(frame.clone());
        assert!(Arc::ptr_eq(&frame.data, &out.data));
    }

    #[test]
    fn test_transform_applies() {
        let stage = ProcessingStage::new();
        stage.set_transform(Arc::new(|frame: Frame| {
            let data: Vec<u8> = frame.data.iter().map(|b| b.wrapping_add(1)).collect();
            Frame::new(frame.width, frame.height, Arc::from(data))
        }));
        let out = stage.apply(uniform_frame(9));
        assert!(out.data.iter().all(|&b| b == 10));
    }

    #[test]
    fn test_clear_restores_passthrough() {
        let stage = ProcessingStage::new();
        stage.set_transform(Arc::new(|_| uniform_frame(0)));
        assert!(stage.has_transform());
        stage.clear_transform();
        assert!(!stage.has_transform());
        let out = stage.apply(uniform_frame(5));
        assert!(out.data.iter().all(|&b| b == 5));
    }

    #[test]
    fn test_swap_replaces_previous() {
        let stage = ProcessingStage::new();
        stage.set_transform(Arc::new(|frame: Frame| {
            Frame::new(frame.width, frame.height, Arc::from(vec![7u8; 16]))
        }));
        stage.set_transform(Arc::new(|frame: Frame| {
            Frame::new(frame.width, frame.height, Arc::from(vec![9u8; 16]))
        }));
        let out = stage.apply(uniform_frame(0));
        assert!(out.data.iter().all(|&b| b == 9));
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Frame presentation.
//!
//! [`RenderSurface`] owns the single "latest wins" frame slot and the
//! placement math; the actual pixels go to a [`PresentTarget`], which is
//! either the GPU-backed [`wgpu_target::WgpuTarget`] or a test double.

pub mod wgpu_target;

use crate::errors::RenderError;
use crate::frame::Frame;
use crate::orientation::{AffineTransform, OrientationState};
use tracing::trace;

/// Per-axis stretch scale mapping the frame extent onto the drawable.
/// The orientation transform is sticky on the target layer and set
/// separately via [`PresentTarget::set_layer_transform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlacement {
    pub scale_x: f32,
    pub scale_y: f32,
}

/// Something frames can be presented onto.
///
/// `present_frame` returns `Ok(true)` when the frame reached the drawable
/// and `Ok(false)` when no drawable was available; the latter is expected
/// backpressure, not an error.
pub trait PresentTarget: Send {
    fn drawable_size(&self) -> (u32, u32);

    fn set_layer_transform(&mut self, transform: AffineTransform);

    fn resize(&mut self, width: u32, height: u32);

    fn present_frame(
        &mut self,
        frame: &Frame,
        placement: &FramePlacement,
    ) -> Result<bool, RenderError>;
}

/// The presentation end of the pipeline.
///
/// Frames are stretched to fill the drawable independently per axis; aspect
/// ratio is not preserved. `view_scaling` exposes twice the last applied
/// per-axis scale and is only updated when a frame actually presents.
pub struct RenderSurface {
    target: Box<dyn PresentTarget>,
    orientation: OrientationState,
    last_frame: Option<Frame>,
    view_scaling: (f32, f32),
    presented: u64,
    dropped: u64,
}

impl RenderSurface {
    pub fn new(mut target: Box<dyn PresentTarget>) -> Self {
        let orientation = OrientationState::default();
        target.set_layer_transform(orientation.transform);
        Self {
            target,
            orientation,
            last_frame: None,
            view_scaling: (1.0, 1.0),
            presented: 0,
            dropped: 0,
        }
    }

    /// Store `frame` in the latest-wins slot and draw it
    pub fn present(&mut self, frame: Frame) -> Result<(), RenderError> {
        self.last_frame = Some(frame);
        self.draw_latest()
    }

    /// Redraw the most recent frame, e.g. after a resize or orientation
    /// change. No-op when nothing has been presented yet.
    pub fn refresh(&mut self) -> Result<(), RenderError> {
        if self.last_frame.is_some() {
            self.draw_latest()
        } else {
            Ok(())
        }
    }

    fn draw_latest(&mut self) -> Result<(), RenderError> {
        let Some(frame) = self.last_frame.clone() else {
            return Ok(());
        };

        let (draw_w, draw_h) = self.target.drawable_size();
        let (frame_w, frame_h) = frame.extent();
        let placement = FramePlacement {
            scale_x: draw_w as f32 / frame_w,
            scale_y: draw_h as f32 / frame_h,
        };

        if self.target.present_frame(&frame, &placement)? {
            self.presented += 1;
            self.view_scaling = (2.0 * placement.scale_x, 2.0 * placement.scale_y);
            trace!(
                scale_x = placement.scale_x,
                scale_y = placement.scale_y,
                "Frame presented"
            );
        } else {
            // No drawable; the frame stays in the slot for the next refresh
            self.dropped += 1;
            trace!("No drawable available, frame dropped");
        }
        Ok(())
    }

    pub fn set_orientation(&mut self, orientation: OrientationState) {
        self.orientation = orientation;
        self.target.set_layer_transform(orientation.transform);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.target.resize(width, height);
    }

    pub fn orientation(&self) -> OrientationState {
        self.orientation
    }

    /// Twice the per-axis stretch scale of the last presented frame
    pub fn view_scaling(&self) -> (f32, f32) {
        self.view_scaling
    }

    pub fn frames_presented(&self) -> u64 {
        self.presented
    }

    pub fn frames_dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct FakeTarget {
        size: (u32, u32),
        available: bool,
        presented: Vec<FramePlacement>,
        transform: AffineTransform,
    }

    impl FakeTarget {
        fn new(width: u32, height: u32) -> Self {
            Self {
                size: (width, height),
                available: true,
                presented: Vec::new(),
                transform: AffineTransform::IDENTITY,
            }
        }
    }

    impl PresentTarget for FakeTarget {
        fn drawable_size(&self) -> (u32, u32) {
            self.size
        }

        fn set_layer_transform(&mut self, transform: AffineTransform) {
            self.transform = transform;
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }

        fn present_frame(
            &mut self,
            _frame: &Frame,
            placement: &FramePlacement,
        ) -> Result<bool, RenderError> {
            if !self.available {
                return Ok(false);
            }
            self.presented.push(*placement);
            Ok(true)
        }
    }

    fn frame(width: u32, height: u32) -> Frame {
        Frame::new(
            width,
            height,
            Arc::from(vec![0u8; (width * height * 4) as usize]),
        )
    }

    #[test]
    fn test_stretch_to_fill_scale() {
        let mut surface = RenderSurface::new(Box::new(FakeTarget::new(960, 720)));
        surface.present(frame(480, 360)).unwrap();
        assert_eq!(surface.frames_presented(), 1);
        assert_eq!(surface.view_scaling(), (4.0, 4.0));
    }

    #[test]
    fn test_anisotropic_stretch() {
        let mut surface = RenderSurface::new(Box::new(FakeTarget::new(1000, 360)));
        surface.present(frame(500, 720)).unwrap();
        // scale_x = 2.0, scale_y = 0.5, view_scaling doubles both
        assert_eq!(surface.view_scaling(), (4.0, 1.0));
    }

    #[test]
    fn test_no_drawable_leaves_state_unchanged() {
        let mut target = FakeTarget::new(640, 480);
        target.available = false;
        let mut surface = RenderSurface::new(Box::new(target));
        let before = surface.view_scaling();
        surface.present(frame(320, 240)).unwrap();
        assert_eq!(surface.frames_presented(), 0);
        assert_eq!(surface.frames_dropped(), 1);
        assert_eq!(surface.view_scaling(), before);
    }

    #[test]
    fn test_refresh_without_frame_is_noop() {
        let mut surface = RenderSurface::new(Box::new(FakeTarget::new(640, 480)));
        surface.refresh().unwrap();
        assert_eq!(surface.frames_presented(), 0);
    }

    #[test]
    fn test_refresh_redraws_last_frame() {
        let mut surface = RenderSurface::new(Box::new(FakeTarget::new(640, 480)));
        surface.present(frame(640, 480)).unwrap();
        surface.resize(1280, 960);
        surface.refresh().unwrap();
        assert_eq!(surface.frames_presented(), 2);
        assert_eq!(surface.view_scaling(), (4.0, 4.0));
    }
}

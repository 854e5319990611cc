// SPDX-License-Identifier: GPL-3.0-only

//! Capture device backends.
//!
//! A backend exposes camera hardware through the [`DeviceProvider`] and
//! [`CaptureDevice`] traits. The session layer is backend-agnostic: it
//! enumerates devices, negotiates a stream format, and receives frames
//! through a [`FrameSink`] callback on the device's capture thread.

pub mod capture_loop;
pub mod simulated;

use crate::config::{DevicePosition, ResolutionPreset};
use crate::errors::{CameraError, ControlError};
use crate::frame::Frame;
use std::sync::Arc;

/// Callback invoked with each captured frame, on the capture thread
pub type FrameSink = Arc<dyn Fn(Frame) + Send + Sync>;

/// Negotiated stream parameters for one binding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamFormat {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

/// One supported frame-rate range advertised by a device format
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRateRange {
    pub min: f64,
    pub max: f64,
}

impl FrameRateRange {
    /// Whether `fps` falls inside the range, widened by `epsilon` at both ends
    pub fn contains(&self, fps: f64, epsilon: f64) -> bool {
        fps >= self.min - epsilon && fps <= self.max + epsilon
    }
}

/// Marker error: the device refused the torch request (typically thermal
/// throttling). The caller reports it as an overheating condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorchRejected;

/// Enumerates the capture devices a backend knows about
pub trait DeviceProvider: Send + Sync {
    fn devices(&self) -> Vec<Arc<dyn CaptureDevice>>;
}

/// A single camera the session can bind to.
///
/// Capability queries (`position`, `supports_preset`, `has_torch`,
/// `frame_rate_ranges`) are lock-free. Mutations go through
/// [`CaptureDevice::lock_configuration`], which acquires the device's
/// exclusive configuration lock or fails with `ConfigurationLockFailed`.
pub trait CaptureDevice: Send + Sync {
    /// Stable identifier, for logs and error messages
    fn id(&self) -> String;

    fn position(&self) -> DevicePosition;

    fn supports_preset(&self, preset: ResolutionPreset) -> bool;

    /// Whether the device carries a torch (back cameras, usually)
    fn has_torch(&self) -> bool;

    /// Supported frame-rate ranges for the active format
    fn frame_rate_ranges(&self) -> Vec<FrameRateRange>;

    /// Acquire the exclusive configuration lock.
    ///
    /// The returned guard holds the lock for its lifetime; mutations are
    /// applied through it. A contended lock fails immediately rather than
    /// blocking the caller.
    fn lock_configuration(&self)
    -> Result<Box<dyn DeviceConfiguration + '_>, ControlError>;

    /// Start streaming frames in `format` into `sink`.
    ///
    /// The device spawns its own capture thread and invokes `sink` once per
    /// frame until the returned binding is stopped or dropped.
    fn bind(
        &self,
        format: StreamFormat,
        sink: FrameSink,
    ) -> Result<Box<dyn DeviceBinding>, CameraError>;
}

/// Mutation handle held while the device configuration lock is owned
pub trait DeviceConfiguration {
    fn torch_is_on(&self) -> bool;

    /// Light the torch at `level` in (0, 1]. `TorchRejected` means the
    /// hardware refused, which the pipeline reports as overheating.
    fn set_torch_level(&mut self, level: f32) -> Result<(), TorchRejected>;

    fn set_torch_off(&mut self);

    /// Set both minimum and maximum frame duration to `seconds` per frame
    fn set_frame_duration(&mut self, seconds: f64);
}

/// An active stream. Stopping joins the capture thread; after `stop`
/// returns, the sink receives no further frames.
pub trait DeviceBinding: Send {
    fn stop(self: Box<Self>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rate_range_contains() {
        let range = FrameRateRange {
            min: 15.0,
            max: 30.0,
        };
        assert!(range.contains(15.0, 1e-4));
        assert!(range.contains(30.0, 1e-4));
        assert!(range.contains(24.0, 1e-4));
        assert!(!range.contains(30.01, 1e-4));
        assert!(!range.contains(14.99, 1e-4));
        // Epsilon widens the boundary
        assert!(range.contains(30.00005, 1e-4));
    }
}

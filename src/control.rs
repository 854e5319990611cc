// SPDX-License-Identifier: GPL-3.0-only

//! Runtime device controls: torch and frame rate.
//!
//! All controls act on the device bound by the running session. Requests
//! the hardware cannot honor (front camera torch, out-of-range level or
//! frame rate, no bound device) are silent no-ops; only a contended
//! configuration lock surfaces as an error, so the caller knows the
//! mutation was never attempted.

use crate::config::DevicePosition;
use crate::errors::ControlError;
use crate::session::CaptureSession;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tolerance when matching a requested frame rate against a device range
pub const FRAME_RATE_EPSILON: f64 = 1e-4;

/// Torch and frame-rate controls over the session's bound device
#[derive(Clone)]
pub struct DeviceControl {
    session: Arc<CaptureSession>,
}

impl DeviceControl {
    pub fn new(session: Arc<CaptureSession>) -> Self {
        Self { session }
    }

    /// Light the torch at `level` in (0, 1].
    ///
    /// Returns `Ok(true)` when the device refused the request, which
    /// indicates thermal throttling; the torch is not lit in that case.
    /// Conditions under which the torch cannot exist (front camera, no
    /// torch hardware, out-of-range level, no bound device) return
    /// `Ok(false)` without touching the device.
    pub fn set_torch(&self, level: f32) -> Result<bool, ControlError> {
        let Some(device) = self.session.current_device() else {
            return Ok(false);
        };
        if device.position() != DevicePosition::Back
            || !device.has_torch()
            || level <= 0.0
            || level > 1.0
        {
            debug!(level, "Torch request not applicable, ignoring");
            return Ok(false);
        }

        let mut config = device.lock_configuration()?;
        match config.set_torch_level(level) {
            Ok(()) => {
                info!(level, "Torch on");
                Ok(false)
            }
            Err(_) => {
                warn!("Torch request rejected, device overheating");
                Ok(true)
            }
        }
    }

    /// Toggle the torch: off when lit, full level when dark.
    ///
    /// Same overheating convention as [`DeviceControl::set_torch`].
    pub fn toggle_torch(&self) -> Result<bool, ControlError> {
        let Some(device) = self.session.current_device() else {
            return Ok(false);
        };
        if device.position() != DevicePosition::Back || !device.has_torch() {
            return Ok(false);
        }

        let mut config = device.lock_configuration()?;
        if config.torch_is_on() {
            config.set_torch_off();
            info!("Torch off");
            Ok(false)
        } else {
            match config.set_torch_level(1.0) {
                Ok(()) => {
                    info!("Torch on");
                    Ok(false)
                }
                Err(_) => {
                    warn!("Torch request rejected, device overheating");
                    Ok(true)
                }
            }
        }
    }

    /// Extinguish the torch. Best-effort: a missing device, torchless
    /// hardware or a contended lock all leave the torch as it is.
    pub fn set_torch_off(&self) {
        let Some(device) = self.session.current_device() else {
            return;
        };
        if !device.has_torch() {
            return;
        }
        match device.lock_configuration() {
            Ok(mut config) => {
                if config.torch_is_on() {
                    config.set_torch_off();
                    info!("Torch off");
                }
            }
            Err(e) => warn!(error = %e, "Could not acquire lock to extinguish torch"),
        }
    }

    /// Pin the device to `fps` frames per second.
    ///
    /// The first advertised range containing `fps` (within
    /// [`FRAME_RATE_EPSILON`]) wins; both minimum and maximum frame
    /// duration are set to `1/fps`. A rate no range contains is ignored.
    pub fn set_frame_rate(&self, fps: f64) -> Result<(), ControlError> {
        let Some(device) = self.session.current_device() else {
            return Ok(());
        };
        if fps <= 0.0 {
            debug!(fps, "Non-positive frame rate ignored");
            return Ok(());
        }

        let supported = device
            .frame_rate_ranges()
            .iter()
            .any(|range| range.contains(fps, FRAME_RATE_EPSILON));
        if !supported {
            debug!(fps, "Frame rate outside all supported ranges, ignoring");
            return Ok(());
        }

        let mut config = device.lock_configuration()?;
        config.set_frame_duration(1.0 / fps);
        info!(fps, "Frame rate set");
        Ok(())
    }
}

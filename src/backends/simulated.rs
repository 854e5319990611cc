// SPDX-License-Identifier: GPL-3.0-only

//! Simulated camera backend.
//!
//! Generates synthetic frames on a capture thread at the negotiated frame
//! rate. Used by the test suite and as the default backend on machines
//! without camera hardware. Devices are fully configurable: position,
//! accepted presets, torch presence, torch rejection (to model thermal
//! throttling), and advertised frame-rate ranges.

use crate::backends::capture_loop::{CaptureLoopController, LoopAction};
use crate::backends::{
    CaptureDevice, DeviceBinding, DeviceConfiguration, DeviceProvider, FrameRateRange, FrameSink,
    StreamFormat, TorchRejected,
};
use crate::config::{DevicePosition, ResolutionPreset};
use crate::errors::{CameraError, ControlError};
use crate::frame::Frame;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Mutable device state guarded by the configuration lock
#[derive(Debug, Clone)]
struct DeviceState {
    torch_on: bool,
    torch_level: f32,
    /// Last frame duration applied via the configuration lock, in seconds
    frame_duration: Option<f64>,
}

/// A configurable fake camera
pub struct SimulatedCamera {
    id: String,
    position: DevicePosition,
    presets: Vec<ResolutionPreset>,
    has_torch: bool,
    /// When set, torch requests fail with `TorchRejected`
    reject_torch: bool,
    ranges: Vec<FrameRateRange>,
    state: Mutex<DeviceState>,
    active_bindings: Arc<AtomicUsize>,
    max_concurrent_bindings: Arc<AtomicUsize>,
}

impl SimulatedCamera {
    pub fn new(id: impl Into<String>, position: DevicePosition) -> Self {
        Self {
            id: id.into(),
            position,
            presets: ResolutionPreset::ALL.to_vec(),
            has_torch: position == DevicePosition::Back,
            reject_torch: false,
            ranges: vec![FrameRateRange {
                min: 15.0,
                max: 60.0,
            }],
            state: Mutex::new(DeviceState {
                torch_on: false,
                torch_level: 0.0,
                frame_duration: None,
            }),
            active_bindings: Arc::new(AtomicUsize::new(0)),
            max_concurrent_bindings: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_presets(mut self, presets: Vec<ResolutionPreset>) -> Self {
        self.presets = presets;
        self
    }

    pub fn with_torch(mut self, has_torch: bool) -> Self {
        self.has_torch = has_torch;
        self
    }

    /// Model a device that refuses torch requests (thermal throttling)
    pub fn with_torch_rejection(mut self) -> Self {
        self.reject_torch = true;
        self
    }

    pub fn with_frame_rate_ranges(mut self, ranges: Vec<FrameRateRange>) -> Self {
        self.ranges = ranges;
        self
    }

    /// Current torch state, for assertions
    pub fn torch_state(&self) -> (bool, f32) {
        let state = self.state.lock().unwrap();
        (state.torch_on, state.torch_level)
    }

    /// Last frame duration applied through the configuration lock, if any
    pub fn last_frame_duration(&self) -> Option<f64> {
        self.state.lock().unwrap().frame_duration
    }

    /// Highest number of simultaneously active bindings observed
    pub fn max_concurrent_bindings(&self) -> usize {
        self.max_concurrent_bindings.load(Ordering::SeqCst)
    }

    /// Number of currently active bindings
    pub fn active_bindings(&self) -> usize {
        self.active_bindings.load(Ordering::SeqCst)
    }
}

impl CaptureDevice for SimulatedCamera {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn position(&self) -> DevicePosition {
        self.position
    }

    fn supports_preset(&self, preset: ResolutionPreset) -> bool {
        self.presets.contains(&preset)
    }

    fn has_torch(&self) -> bool {
        self.has_torch
    }

    fn frame_rate_ranges(&self) -> Vec<FrameRateRange> {
        self.ranges.clone()
    }

    fn lock_configuration(
        &self,
    ) -> Result<Box<dyn DeviceConfiguration + '_>, ControlError> {
        match self.state.try_lock() {
            Ok(guard) => Ok(Box::new(SimulatedConfiguration {
                guard,
                reject_torch: self.reject_torch,
            })),
            Err(TryLockError::WouldBlock) => Err(ControlError::ConfigurationLockFailed(
                format!("device {} configuration is held elsewhere", self.id),
            )),
            Err(TryLockError::Poisoned(e)) => Err(ControlError::ConfigurationLockFailed(
                format!("device {} configuration lock poisoned: {}", self.id, e),
            )),
        }
    }

    fn bind(
        &self,
        format: StreamFormat,
        sink: FrameSink,
    ) -> Result<Box<dyn DeviceBinding>, CameraError> {
        if format.width == 0 || format.height == 0 || format.frame_rate <= 0.0 {
            return Err(CameraError::DeviceBindFailed(format!(
                "invalid stream format {:?}",
                format
            )));
        }

        let now_active = self.active_bindings.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_bindings
            .fetch_max(now_active, Ordering::SeqCst);

        info!(
            device = %self.id,
            width = format.width,
            height = format.height,
            fps = format.frame_rate,
            "Binding simulated camera"
        );

        let interval = Duration::from_secs_f64(1.0 / format.frame_rate);
        let pixel_count = format.width as usize * format.height as usize * 4;
        let mut next_deadline = Instant::now();
        let loop_name = format!("sim-capture-{}", self.id);

        let controller = CaptureLoopController::start(&loop_name, move || {
            let now = Instant::now();
            if now < next_deadline {
                std::thread::sleep(next_deadline - now);
            }
            next_deadline += interval;

            let data: Arc<[u8]> = Arc::from(vec![128u8; pixel_count]);
            sink(Frame::new(format.width, format.height, data));
            LoopAction::Continue
        });

        Ok(Box::new(SimulatedBinding {
            controller,
            active: Arc::clone(&self.active_bindings),
        }))
    }
}

struct SimulatedConfiguration<'a> {
    guard: MutexGuard<'a, DeviceState>,
    reject_torch: bool,
}

impl DeviceConfiguration for SimulatedConfiguration<'_> {
    fn torch_is_on(&self) -> bool {
        self.guard.torch_on
    }

    fn set_torch_level(&mut self, level: f32) -> Result<(), TorchRejected> {
        if self.reject_torch {
            return Err(TorchRejected);
        }
        self.guard.torch_on = true;
        self.guard.torch_level = level;
        Ok(())
    }

    fn set_torch_off(&mut self) {
        self.guard.torch_on = false;
        self.guard.torch_level = 0.0;
    }

    fn set_frame_duration(&mut self, seconds: f64) {
        self.guard.frame_duration = Some(seconds);
    }
}

struct SimulatedBinding {
    controller: CaptureLoopController,
    active: Arc<AtomicUsize>,
}

impl DeviceBinding for SimulatedBinding {
    fn stop(mut self: Box<Self>) {
        self.controller.stop();
    }
}

impl Drop for SimulatedBinding {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        debug!("Simulated binding released");
    }
}

/// Provider over a fixed set of simulated cameras
pub struct SimulatedProvider {
    devices: Vec<Arc<SimulatedCamera>>,
}

impl SimulatedProvider {
    pub fn new(devices: Vec<Arc<SimulatedCamera>>) -> Self {
        Self { devices }
    }

    /// No devices at all, to exercise the missing-hardware path
    pub fn empty() -> Self {
        Self {
            devices: Vec::new(),
        }
    }
}

impl Default for SimulatedProvider {
    /// One back camera with a torch and one front camera without
    fn default() -> Self {
        Self::new(vec![
            Arc::new(SimulatedCamera::new("sim-back", DevicePosition::Back)),
            Arc::new(SimulatedCamera::new("sim-front", DevicePosition::Front)),
        ])
    }
}

impl DeviceProvider for SimulatedProvider {
    fn devices(&self) -> Vec<Arc<dyn CaptureDevice>> {
        self.devices
            .iter()
            .map(|d| Arc::clone(d) as Arc<dyn CaptureDevice>)
            .collect()
    }
}

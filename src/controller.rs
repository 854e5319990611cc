// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline controller: the public face of the crate.
//!
//! Wires capture, processing and presentation together and owns the
//! configuration. Frames flow capture thread -> gate -> delivery thread,
//! where the processing transform runs and the result is presented; the
//! controller itself only handles lifecycle and reconfiguration.

use crate::config::{CaptureConfiguration, DevicePosition, ResolutionPreset};
use crate::control::DeviceControl;
use crate::errors::{CameraError, PipelineResult};
use crate::orientation::{self, InterfaceOrientation};
use crate::processing::ProcessingStage;
use crate::registry::DeviceRegistry;
use crate::render::{PresentTarget, RenderSurface};
use crate::session::{CaptureSession, SessionPhase};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

/// Owns one capture -> process -> present pipeline.
///
/// `shutdown` is terminal; a shut-down controller refuses to start again.
/// All other lifecycle transitions are reversible.
pub struct PipelineController {
    config: Mutex<CaptureConfiguration>,
    orientation: Mutex<InterfaceOrientation>,
    session: Arc<CaptureSession>,
    stage: Arc<ProcessingStage>,
    surface: Arc<Mutex<RenderSurface>>,
    control: DeviceControl,
    terminated: AtomicBool,
}

impl PipelineController {
    pub fn new(
        registry: Arc<DeviceRegistry>,
        target: Box<dyn PresentTarget>,
        config: CaptureConfiguration,
    ) -> Self {
        let stage = Arc::new(ProcessingStage::new());
        let mut surface = RenderSurface::new(target);
        surface.set_orientation(orientation::resolve(
            config.position,
            InterfaceOrientation::Portrait,
        ));
        let surface = Arc::new(Mutex::new(surface));

        let sink_stage = Arc::clone(&stage);
        let sink_surface = Arc::clone(&surface);
        let session = Arc::new(CaptureSession::new(
            registry,
            Arc::new(move |frame| {
                let frame = sink_stage.apply(frame);
                if let Err(e) = sink_surface.lock().unwrap().present(frame) {
                    error!(error = %e, "Frame presentation failed");
                }
            }),
        ));

        let control = DeviceControl::new(Arc::clone(&session));

        Self {
            config: Mutex::new(config),
            orientation: Mutex::new(InterfaceOrientation::Portrait),
            session,
            stage,
            surface,
            control,
            terminated: AtomicBool::new(false),
        }
    }

    /// Begin capture with the current configuration
    pub fn start(&self) -> PipelineResult<()> {
        if self.terminated.load(Ordering::SeqCst) {
            return Err(CameraError::Terminated.into());
        }
        let config = self.config.lock().unwrap().clone();
        self.session.start(&config)?;
        Ok(())
    }

    /// Stop capture; the pipeline can be started again afterwards
    pub fn stop(&self) {
        self.session.stop();
    }

    /// Tear the pipeline down for good: clear the transform, extinguish
    /// the torch, stop capture. Subsequent starts fail with `Terminated`.
    pub fn shutdown(&self) {
        info!("Shutting down pipeline");
        self.stage.clear_transform();
        self.control.set_torch_off();
        self.session.stop();
        self.terminated.store(true, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    pub fn configuration(&self) -> CaptureConfiguration {
        self.config.lock().unwrap().clone()
    }

    /// The processing slot; install or clear the frame transform here
    pub fn processing(&self) -> &Arc<ProcessingStage> {
        &self.stage
    }

    /// Torch and frame-rate controls for the bound device
    pub fn device_control(&self) -> &DeviceControl {
        &self.control
    }

    /// The session, for phase and drop-count introspection
    pub fn session(&self) -> &Arc<CaptureSession> {
        &self.session
    }

    /// Switch to the camera at `position`. A running session is rebound;
    /// an idle one just records the new configuration.
    pub fn set_position(&self, position: DevicePosition) -> PipelineResult<()> {
        {
            let mut config = self.config.lock().unwrap();
            if config.position == position {
                return Ok(());
            }
            config.position = position;
        }
        info!(position = %position, "Switching camera position");

        // The mirror half of the layer transform depends on the position
        let interface = *self.orientation.lock().unwrap();
        {
            let mut surface = self.surface.lock().unwrap();
            surface.set_orientation(orientation::resolve(position, interface));
            surface.refresh()?;
        }

        let config = self.config.lock().unwrap().clone();
        self.session.reset(&config)?;
        Ok(())
    }

    /// Swap between the back and front cameras
    pub fn toggle_position(&self) -> PipelineResult<()> {
        let position = self.config.lock().unwrap().position.toggled();
        self.set_position(position)
    }

    /// Change the resolution preset, rebinding a running session
    pub fn set_preset(&self, preset: ResolutionPreset) -> PipelineResult<()> {
        {
            let mut config = self.config.lock().unwrap();
            if config.preset == preset {
                return Ok(());
            }
            config.preset = preset;
        }
        info!(preset = %preset, "Changing resolution preset");
        let config = self.config.lock().unwrap().clone();
        self.session.reset(&config)?;
        Ok(())
    }

    /// Change the frame rate, applying it to the bound device immediately
    /// and recording it for future sessions
    pub fn set_frame_rate(&self, fps: f64) -> PipelineResult<()> {
        self.config.lock().unwrap().frame_rate = fps;
        self.control.set_frame_rate(fps)?;
        Ok(())
    }

    /// Entry point for the embedding application's orientation updates.
    /// Re-resolves the layer transform and redraws the last frame.
    pub fn orientation_changed(&self, interface: InterfaceOrientation) -> PipelineResult<()> {
        *self.orientation.lock().unwrap() = interface;
        let position = self.config.lock().unwrap().position;
        let mut surface = self.surface.lock().unwrap();
        surface.set_orientation(orientation::resolve(position, interface));
        surface.refresh()?;
        Ok(())
    }

    /// Propagate a drawable resize and redraw the last frame
    pub fn resize(&self, width: u32, height: u32) -> PipelineResult<()> {
        let mut surface = self.surface.lock().unwrap();
        surface.resize(width, height);
        surface.refresh()?;
        Ok(())
    }

    /// Twice the per-axis stretch scale of the last presented frame
    pub fn view_scaling(&self) -> (f32, f32) {
        self.surface.lock().unwrap().view_scaling()
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        self.session.stop();
    }
}

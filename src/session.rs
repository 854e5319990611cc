// SPDX-License-Identifier: GPL-3.0-only

//! Capture session lifecycle.
//!
//! A session binds one device at a time and feeds its frames through a
//! single-slot gate into a delivery thread, which invokes the downstream
//! sink. The gate never blocks the capture thread: when the downstream is
//! busy, the incoming frame is dropped and counted.
//!
//! Setup runs on its own thread because device discovery and binding can
//! take hundreds of milliseconds. `stop` is synchronous: once it returns,
//! the sink receives no further frames.

use crate::backends::{CaptureDevice, DeviceBinding, FrameSink, StreamFormat};
use crate::config::CaptureConfiguration;
use crate::errors::CameraError;
use crate::frame::Frame;
use crate::registry::DeviceRegistry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle phase of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No device bound
    Idle,
    /// Setup thread is discovering and binding a device
    Starting,
    /// Frames are flowing
    Running,
    /// Teardown in progress
    Stopping,
    /// The last start attempt failed; see `last_error`
    Failed,
}

struct Inner {
    phase: SessionPhase,
    /// Incremented on every start; stale setup threads detect it and bail
    generation: u64,
    stop_requested: bool,
    device: Option<Arc<dyn CaptureDevice>>,
    binding: Option<Box<dyn DeviceBinding>>,
    delivery: Option<JoinHandle<()>>,
    setup: Option<JoinHandle<()>>,
    last_error: Option<CameraError>,
    dropped_frames: Arc<AtomicU64>,
}

/// Owns the device binding and the capture-to-delivery frame gate
pub struct CaptureSession {
    registry: Arc<DeviceRegistry>,
    sink: FrameSink,
    inner: Arc<Mutex<Inner>>,
}

impl CaptureSession {
    /// `sink` receives every delivered frame, on the delivery thread
    pub fn new(registry: Arc<DeviceRegistry>, sink: FrameSink) -> Self {
        Self {
            registry,
            sink,
            inner: Arc::new(Mutex::new(Inner {
                phase: SessionPhase::Idle,
                generation: 0,
                stop_requested: false,
                device: None,
                binding: None,
                delivery: None,
                setup: None,
                last_error: None,
                dropped_frames: Arc::new(AtomicU64::new(0)),
            })),
        }
    }

    /// Begin capture with `config`.
    ///
    /// The missing-hardware check runs synchronously on the caller's thread
    /// so a machine without any camera fails fast. Device resolution and
    /// binding then proceed on the setup thread; failures there surface via
    /// `phase()` and `last_error()`.
    pub fn start(&self, config: &CaptureConfiguration) -> Result<(), CameraError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.phase {
            SessionPhase::Idle | SessionPhase::Failed => {}
            _ => return Err(CameraError::AlreadyRunning),
        }

        if !self.registry.any_hardware() {
            inner.phase = SessionPhase::Failed;
            inner.last_error = Some(CameraError::NoHardware);
            return Err(CameraError::NoHardware);
        }

        inner.generation += 1;
        inner.stop_requested = false;
        inner.last_error = None;
        inner.phase = SessionPhase::Starting;
        inner.dropped_frames = Arc::new(AtomicU64::new(0));

        let generation = inner.generation;
        let registry = Arc::clone(&self.registry);
        let downstream = Arc::clone(&self.sink);
        let shared = Arc::clone(&self.inner);
        let config = config.clone();
        let dropped = Arc::clone(&inner.dropped_frames);

        info!(
            position = %config.position,
            preset = %config.preset,
            fps = config.frame_rate,
            "Starting capture session"
        );

        let setup = std::thread::Builder::new()
            .name("capture-session".to_string())
            .spawn(move || {
                run_setup(registry, config, downstream, shared, generation, dropped);
            })
            .map_err(|e| CameraError::DeviceBindFailed(format!("setup thread: {}", e)))?;

        inner.setup = Some(setup);
        Ok(())
    }

    /// Stop capture and wait for in-flight frames to drain.
    ///
    /// Synchronous: after this returns the sink is not invoked again until
    /// the next start. Stopping an idle session is a no-op.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.phase {
            SessionPhase::Starting => {
                debug!("Stop requested during setup");
                inner.stop_requested = true;
                let setup = inner.setup.take();
                drop(inner);
                if let Some(handle) = setup {
                    let _ = handle.join();
                }
            }
            SessionPhase::Running => {
                inner.phase = SessionPhase::Stopping;
                let binding = inner.binding.take();
                let delivery = inner.delivery.take();
                let setup = inner.setup.take();
                inner.device = None;
                drop(inner);

                // Stopping the binding joins the capture thread and drops
                // the gate sender, which ends the delivery thread.
                if let Some(binding) = binding {
                    binding.stop();
                }
                if let Some(handle) = delivery {
                    let _ = handle.join();
                }
                if let Some(handle) = setup {
                    let _ = handle.join();
                }

                let mut inner = self.inner.lock().unwrap();
                inner.phase = SessionPhase::Idle;
                info!("Capture session stopped");
            }
            _ => {}
        }
    }

    /// Stop (if running) and start again with `config`. A session that is
    /// neither running nor starting is left untouched.
    pub fn reset(&self, config: &CaptureConfiguration) -> Result<(), CameraError> {
        let phase = self.phase();
        if phase == SessionPhase::Running || phase == SessionPhase::Starting {
            self.stop();
            self.start(config)?;
        }
        Ok(())
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.lock().unwrap().phase
    }

    pub fn is_running(&self) -> bool {
        self.phase() == SessionPhase::Running
    }

    /// The device bound by the running session, if any
    pub fn current_device(&self) -> Option<Arc<dyn CaptureDevice>> {
        self.inner.lock().unwrap().device.clone()
    }

    pub fn last_error(&self) -> Option<CameraError> {
        self.inner.lock().unwrap().last_error.clone()
    }

    /// Frames discarded at the gate because the downstream was busy
    pub fn dropped_frames(&self) -> u64 {
        self.inner
            .lock()
            .unwrap()
            .dropped_frames
            .load(Ordering::SeqCst)
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_setup(
    registry: Arc<DeviceRegistry>,
    config: CaptureConfiguration,
    downstream: FrameSink,
    shared: Arc<Mutex<Inner>>,
    generation: u64,
    dropped: Arc<AtomicU64>,
) {
    let fail = |err: CameraError| {
        let mut inner = shared.lock().unwrap();
        if inner.generation == generation {
            warn!(error = %err, "Capture session setup failed");
            inner.phase = SessionPhase::Failed;
            inner.last_error = Some(err);
            inner.setup = None;
        }
    };

    let device = match registry.find_device(config.position) {
        Ok(device) => device,
        Err(err) => return fail(err),
    };

    if !device.supports_preset(config.preset) {
        return fail(CameraError::UnsupportedPreset {
            preset: config.preset,
            device: device.id(),
        });
    }

    // Single-slot gate between the capture thread and the delivery thread.
    // try_send never blocks; a full slot means the downstream is still busy
    // with the previous frame, so the new one is dropped and counted.
    let (tx, mut rx) = tokio::sync::mpsc::channel::<Frame>(1);
    let gate: FrameSink = Arc::new(move |frame: Frame| {
        if tx.try_send(frame).is_err() {
            dropped.fetch_add(1, Ordering::SeqCst);
        }
    });

    let delivery = match std::thread::Builder::new()
        .name("frame-delivery".to_string())
        .spawn(move || {
            while let Some(frame) = rx.blocking_recv() {
                downstream(frame);
            }
            debug!("Delivery thread exiting");
        }) {
        Ok(handle) => handle,
        Err(e) => {
            return fail(CameraError::DeviceBindFailed(format!(
                "delivery thread: {}",
                e
            )));
        }
    };

    let (width, height) = config.preset.dimensions();
    let format = StreamFormat {
        width,
        height,
        frame_rate: config.frame_rate,
    };

    let binding = match device.bind(format, gate) {
        Ok(binding) => binding,
        Err(err) => {
            // The gate sender died with the failed bind; the delivery
            // thread sees the closed channel and exits.
            let _ = delivery.join();
            return fail(err);
        }
    };

    let mut inner = shared.lock().unwrap();
    if inner.generation != generation || inner.stop_requested {
        // A stop or a newer start raced the setup; tear down immediately
        debug!("Setup superseded, releasing binding");
        drop(inner);
        binding.stop();
        let _ = delivery.join();
        let mut inner = shared.lock().unwrap();
        if inner.generation == generation {
            inner.phase = SessionPhase::Idle;
        }
        return;
    }

    info!(device = %device.id(), "Capture session running");
    inner.device = Some(device);
    inner.binding = Some(binding);
    inner.delivery = Some(delivery);
    inner.phase = SessionPhase::Running;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::simulated::{SimulatedCamera, SimulatedProvider};
    use crate::config::{DevicePosition, ResolutionPreset};
    use std::sync::atomic::AtomicU32;
    use std::time::{Duration, Instant};

    fn wait_for<F: Fn() -> bool>(what: &str, predicate: F) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !predicate() {
            assert!(Instant::now() < deadline, "timed out waiting for {}", what);
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn counting_session(provider: SimulatedProvider) -> (CaptureSession, Arc<AtomicU32>) {
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = Arc::clone(&count);
        let registry = Arc::new(DeviceRegistry::new(Arc::new(provider)));
        let session = CaptureSession::new(
            registry,
            Arc::new(move |_frame| {
                count_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (session, count)
    }

    fn fast_config() -> CaptureConfiguration {
        CaptureConfiguration {
            position: DevicePosition::Back,
            preset: ResolutionPreset::Low,
            frame_rate: 120.0,
        }
    }

    #[test]
    fn test_start_delivers_and_stop_is_final() {
        let (session, count) = counting_session(SimulatedProvider::default());
        session.start(&fast_config()).unwrap();
        wait_for("running", || session.is_running());
        wait_for("frames", || count.load(Ordering::SeqCst) >= 3);

        session.stop();
        assert_eq!(session.phase(), SessionPhase::Idle);
        let after = count.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(count.load(Ordering::SeqCst), after);
    }

    #[test]
    fn test_no_hardware_fails_synchronously() {
        let (session, _) = counting_session(SimulatedProvider::empty());
        let err = session.start(&fast_config()).unwrap_err();
        assert_eq!(err, CameraError::NoHardware);
        assert_eq!(session.phase(), SessionPhase::Failed);
    }

    #[test]
    fn test_unsupported_preset_fails_setup() {
        let camera = SimulatedCamera::new("limited", DevicePosition::Back)
            .with_presets(vec![ResolutionPreset::Low]);
        let provider = SimulatedProvider::new(vec![Arc::new(camera)]);
        let (session, _) = counting_session(provider);

        let mut config = fast_config();
        config.preset = ResolutionPreset::Photo;
        session.start(&config).unwrap();

        wait_for("failure", || session.phase() == SessionPhase::Failed);
        assert!(matches!(
            session.last_error(),
            Some(CameraError::UnsupportedPreset { .. })
        ));
    }

    #[test]
    fn test_start_while_running_rejected() {
        let (session, _) = counting_session(SimulatedProvider::default());
        session.start(&fast_config()).unwrap();
        wait_for("running", || session.is_running());
        assert_eq!(
            session.start(&fast_config()).unwrap_err(),
            CameraError::AlreadyRunning
        );
        session.stop();
    }

    #[test]
    fn test_restart_after_failure() {
        let camera = SimulatedCamera::new("limited", DevicePosition::Back)
            .with_presets(vec![ResolutionPreset::Low]);
        let provider = SimulatedProvider::new(vec![Arc::new(camera)]);
        let (session, count) = counting_session(provider);

        let mut bad = fast_config();
        bad.preset = ResolutionPreset::Photo;
        session.start(&bad).unwrap();
        wait_for("failure", || session.phase() == SessionPhase::Failed);

        session.start(&fast_config()).unwrap();
        wait_for("running", || session.is_running());
        wait_for("frames", || count.load(Ordering::SeqCst) >= 1);
        session.stop();
    }

    #[test]
    fn test_stop_during_setup() {
        let (session, _) = counting_session(SimulatedProvider::default());
        // Stop immediately after start; whichever way the race goes the
        // session must settle without a live binding.
        session.start(&fast_config()).unwrap();
        session.stop();
        wait_for("settled", || {
            matches!(session.phase(), SessionPhase::Idle | SessionPhase::Failed)
        });
        assert!(session.current_device().is_none());
    }

    #[test]
    fn test_reset_rebinds_device() {
        let (session, _) = counting_session(SimulatedProvider::default());

        session.start(&fast_config()).unwrap();
        wait_for("running", || session.is_running());
        let first = session.current_device().map(|d| d.id());

        let mut config = fast_config();
        config.position = DevicePosition::Front;
        session.reset(&config).unwrap();
        wait_for("running again", || session.is_running());
        let second = session.current_device().map(|d| d.id());

        assert_ne!(first, second);
        session.stop();
    }

    #[test]
    fn test_reset_when_idle_is_noop() {
        let (session, _) = counting_session(SimulatedProvider::default());
        session.reset(&fast_config()).unwrap();
        assert_eq!(session.phase(), SessionPhase::Idle);
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Real-time camera capture, processing and GPU preview pipeline.
//!
//! The pipeline runs capture -> transform -> present: a backend device
//! streams frames on its capture thread, a single-slot gate drops late
//! frames instead of queueing them, the hot-swappable processing transform
//! runs on the delivery thread, and the result is stretched onto a GPU
//! surface.
//!
//! [`PipelineController`] is the entry point; it owns the configuration
//! and every lifecycle transition. Backends implement the traits in
//! [`backends`]; the [`backends::simulated`] backend generates synthetic
//! frames for tests and camera-less machines.

pub mod backends;
pub mod config;
pub mod control;
pub mod controller;
pub mod errors;
pub mod frame;
pub mod orientation;
pub mod processing;
pub mod registry;
pub mod render;
pub mod session;

pub use config::{CaptureConfiguration, DevicePosition, ResolutionPreset};
pub use control::DeviceControl;
pub use controller::PipelineController;
pub use errors::{CameraError, ControlError, PipelineError, PipelineResult, RenderError};
pub use frame::Frame;
pub use orientation::{AffineTransform, InterfaceOrientation, OrientationState, RotationCode};
pub use processing::ProcessingStage;
pub use registry::DeviceRegistry;
pub use render::{PresentTarget, RenderSurface};
pub use session::{CaptureSession, SessionPhase};

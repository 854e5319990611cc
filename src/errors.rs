// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture pipeline

use crate::config::{DevicePosition, ResolutionPreset};
use std::fmt;

/// Result type alias using PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Umbrella error type for pipeline operations
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Device discovery / session lifecycle errors
    Camera(CameraError),
    /// Device configuration (torch, frame rate) errors
    Control(ControlError),
    /// GPU presentation errors
    Render(RenderError),
}

/// Device discovery and session lifecycle errors
#[derive(Debug, Clone, PartialEq)]
pub enum CameraError {
    /// The platform reports no camera hardware at all.
    /// Fatal for the pipeline; reported to the caller for decision.
    NoHardware,
    /// No enumerated device matches the requested position
    NotFound(DevicePosition),
    /// The resolved device rejected the requested resolution preset
    UnsupportedPreset {
        preset: ResolutionPreset,
        device: String,
    },
    /// Device input construction failed
    DeviceBindFailed(String),
    /// `start` called while the session is not Idle
    AlreadyRunning,
    /// The controller was shut down and must be re-initialized
    Terminated,
}

/// Device configuration mutation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ControlError {
    /// The exclusive device-configuration lock could not be acquired.
    /// Non-fatal; the mutation was not attempted.
    ConfigurationLockFailed(String),
}

/// GPU presentation errors.
///
/// Note that "no drawable available" is not an error; it is an expected
/// backpressure outcome and the frame is silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The surface or adapter could not be created
    InitializationFailed(String),
    /// The surface is permanently unusable (device loss, out of memory)
    SurfaceLost(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Camera(e) => write!(f, "Camera error: {}", e),
            PipelineError::Control(e) => write!(f, "Control error: {}", e),
            PipelineError::Render(e) => write!(f, "Render error: {}", e),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoHardware => write!(f, "No camera hardware present"),
            CameraError::NotFound(position) => {
                write!(f, "No camera found at position: {}", position)
            }
            CameraError::UnsupportedPreset { preset, device } => {
                write!(f, "Preset {} not supported by device {}", preset, device)
            }
            CameraError::DeviceBindFailed(msg) => write!(f, "Device bind failed: {}", msg),
            CameraError::AlreadyRunning => write!(f, "Session already running"),
            CameraError::Terminated => write!(f, "Pipeline has been shut down"),
        }
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::ConfigurationLockFailed(msg) => {
                write!(f, "Configuration lock failed: {}", msg)
            }
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InitializationFailed(msg) => {
                write!(f, "Render initialization failed: {}", msg)
            }
            RenderError::SurfaceLost(msg) => write!(f, "Render surface lost: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}
impl std::error::Error for CameraError {}
impl std::error::Error for ControlError {}
impl std::error::Error for RenderError {}

impl From<CameraError> for PipelineError {
    fn from(err: CameraError) -> Self {
        PipelineError::Camera(err)
    }
}

impl From<ControlError> for PipelineError {
    fn from(err: ControlError) -> Self {
        PipelineError::Control(err)
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        PipelineError::Render(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages_nonempty() {
        let errors: Vec<PipelineError> = vec![
            CameraError::NoHardware.into(),
            CameraError::NotFound(DevicePosition::Front).into(),
            CameraError::UnsupportedPreset {
                preset: ResolutionPreset::Photo,
                device: "sim-back".to_string(),
            }
            .into(),
            CameraError::DeviceBindFailed("busy".to_string()).into(),
            ControlError::ConfigurationLockFailed("held".to_string()).into(),
            RenderError::SurfaceLost("device lost".to_string()).into(),
        ];
        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}

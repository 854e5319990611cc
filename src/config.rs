// SPDX-License-Identifier: GPL-3.0-only

//! Capture configuration: camera position, resolution preset, frame rate.
//!
//! The configuration is owned by the pipeline controller and replaced
//! wholesale on reconfiguration; it is never mutated field-by-field while a
//! session is active.

use serde::{Deserialize, Serialize};

/// Logical position of a camera on the device.
///
/// Exactly two positions exist. There is deliberately no "unspecified"
/// variant; a device that cannot report its position is not enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DevicePosition {
    /// World-facing camera (supports torch on most hardware)
    #[default]
    Back,
    /// User-facing camera
    Front,
}

impl DevicePosition {
    /// The opposite position (Back <-> Front)
    pub fn toggled(self) -> Self {
        match self {
            DevicePosition::Back => DevicePosition::Front,
            DevicePosition::Front => DevicePosition::Back,
        }
    }
}

impl std::fmt::Display for DevicePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DevicePosition::Back => write!(f, "back"),
            DevicePosition::Front => write!(f, "front"),
        }
    }
}

/// Named resolution/quality tier negotiated with the capture device.
///
/// Devices advertise which presets they accept; starting a session with an
/// unsupported preset fails with `UnsupportedPreset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ResolutionPreset {
    /// Lowest-bandwidth tier
    Low,
    /// Balanced tier, suitable for most real-time processing
    #[default]
    Medium,
    /// Highest video tier the device offers
    High,
    /// Full-sensor stills tier
    Photo,
    Qvga320x240,
    Cif352x288,
    Vga640x480,
    Hd960x540,
    Hd1280x720,
}

impl ResolutionPreset {
    /// All presets, for enumeration in tests and capability listings
    pub const ALL: [ResolutionPreset; 9] = [
        ResolutionPreset::Low,
        ResolutionPreset::Medium,
        ResolutionPreset::High,
        ResolutionPreset::Photo,
        ResolutionPreset::Qvga320x240,
        ResolutionPreset::Cif352x288,
        ResolutionPreset::Vga640x480,
        ResolutionPreset::Hd960x540,
        ResolutionPreset::Hd1280x720,
    ];

    /// Nominal frame dimensions for this tier
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ResolutionPreset::Low => (192, 144),
            ResolutionPreset::Medium => (480, 360),
            ResolutionPreset::High => (1920, 1080),
            ResolutionPreset::Photo => (4032, 3024),
            ResolutionPreset::Qvga320x240 => (320, 240),
            ResolutionPreset::Cif352x288 => (352, 288),
            ResolutionPreset::Vga640x480 => (640, 480),
            ResolutionPreset::Hd960x540 => (960, 540),
            ResolutionPreset::Hd1280x720 => (1280, 720),
        }
    }
}

impl std::fmt::Display for ResolutionPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (w, h) = self.dimensions();
        match self {
            ResolutionPreset::Low => write!(f, "low"),
            ResolutionPreset::Medium => write!(f, "medium"),
            ResolutionPreset::High => write!(f, "high"),
            ResolutionPreset::Photo => write!(f, "photo"),
            _ => write!(f, "{}x{}", w, h),
        }
    }
}

/// Complete capture configuration for one session.
///
/// Replaced as a whole when position, preset or frame rate change; the
/// session is then reset with the new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfiguration {
    /// Which camera to bind
    pub position: DevicePosition,
    /// Resolution tier to negotiate
    pub preset: ResolutionPreset,
    /// Desired frame rate (frames per second)
    pub frame_rate: f64,
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            position: DevicePosition::Back,
            preset: ResolutionPreset::Medium,
            frame_rate: 30.0,
        }
    }
}

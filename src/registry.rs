// SPDX-License-Identifier: GPL-3.0-only

//! Device discovery over a backend provider.

use crate::backends::{CaptureDevice, DeviceProvider};
use crate::config::DevicePosition;
use crate::errors::CameraError;
use std::sync::Arc;
use tracing::{info, warn};

/// Resolves capture devices by position.
///
/// Discovery distinguishes two failure modes: the platform having no camera
/// hardware at all (`NoHardware`, fatal for the pipeline) and no device at
/// the requested position (`NotFound`, recoverable by picking the other
/// position).
pub struct DeviceRegistry {
    provider: Arc<dyn DeviceProvider>,
}

impl DeviceRegistry {
    pub fn new(provider: Arc<dyn DeviceProvider>) -> Self {
        Self { provider }
    }

    /// Whether any camera hardware is present
    pub fn any_hardware(&self) -> bool {
        !self.provider.devices().is_empty()
    }

    /// Find the first device at `position`.
    pub fn find_device(
        &self,
        position: DevicePosition,
    ) -> Result<Arc<dyn CaptureDevice>, CameraError> {
        let devices = self.provider.devices();
        if devices.is_empty() {
            warn!("No camera hardware present");
            return Err(CameraError::NoHardware);
        }

        match devices.into_iter().find(|d| d.position() == position) {
            Some(device) => {
                info!(device = %device.id(), position = %position, "Resolved capture device");
                Ok(device)
            }
            None => {
                warn!(position = %position, "No camera at requested position");
                Err(CameraError::NotFound(position))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::simulated::{SimulatedCamera, SimulatedProvider};

    #[test]
    fn test_find_by_position() {
        let registry = DeviceRegistry::new(Arc::new(SimulatedProvider::default()));
        let back = registry.find_device(DevicePosition::Back).unwrap();
        assert_eq!(back.position(), DevicePosition::Back);
        let front = registry.find_device(DevicePosition::Front).unwrap();
        assert_eq!(front.position(), DevicePosition::Front);
    }

    #[test]
    fn test_no_hardware() {
        let registry = DeviceRegistry::new(Arc::new(SimulatedProvider::empty()));
        assert!(!registry.any_hardware());
        let err = registry.find_device(DevicePosition::Back).err().unwrap();
        assert_eq!(err, CameraError::NoHardware);
    }

    #[test]
    fn test_position_not_found() {
        let provider = SimulatedProvider::new(vec![Arc::new(SimulatedCamera::new(
            "only-back",
            DevicePosition::Back,
        ))]);
        let registry = DeviceRegistry::new(Arc::new(provider));
        assert!(registry.any_hardware());
        let err = registry.find_device(DevicePosition::Front).err().unwrap();
        assert_eq!(err, CameraError::NotFound(DevicePosition::Front));
    }
}

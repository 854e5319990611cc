// SPDX-License-Identifier: GPL-3.0-only

//! Orientation resolution for the render surface.
//!
//! Maps (device position, interface orientation) to an output-image rotation
//! code and the 2D affine transform applied to the surface layer. The
//! resolver is a pure function: it holds no state and does not subscribe to
//! any notification source. The pipeline controller invokes it whenever the
//! embedding application reports an orientation change.

use crate::config::DevicePosition;

/// Interface orientation reported by the embedding application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// Physical rotation applied to the output image.
///
/// The four codes correspond to 0/90/180/270 degree rotations. `exif_code`
/// gives the equivalent EXIF/CoreImage orientation value used by image
/// pipelines that consume the frames downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationCode {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl RotationCode {
    pub fn degrees(&self) -> u32 {
        match self {
            RotationCode::Deg0 => 0,
            RotationCode::Deg90 => 90,
            RotationCode::Deg180 => 180,
            RotationCode::Deg270 => 270,
        }
    }

    /// EXIF orientation code (1 = upright landscape, 5 = 90cw, 3 = 180, 7 = 270cw)
    pub fn exif_code(&self) -> u8 {
        match self {
            RotationCode::Deg0 => 1,
            RotationCode::Deg90 => 5,
            RotationCode::Deg180 => 3,
            RotationCode::Deg270 => 7,
        }
    }
}

/// 2D affine transform in the row-vector convention:
/// `x' = a*x + c*y + tx`, `y' = b*x + d*y + ty`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Counter-clockwise rotation by `radians`
    pub fn rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Compose: apply `self` first, then `other`
    pub fn concat(&self, other: &AffineTransform) -> Self {
        Self {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            tx: self.tx * other.a + self.ty * other.c + other.tx,
            ty: self.tx * other.b + self.ty * other.d + other.ty,
        }
    }

    pub fn apply(&self, point: (f32, f32)) -> (f32, f32) {
        let (x, y) = point;
        (
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }
}

/// Resolved orientation: rotation code plus the surface-layer transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationState {
    pub rotation: RotationCode,
    pub transform: AffineTransform,
}

impl Default for OrientationState {
    /// Portrait with the back camera, the common startup case
    fn default() -> Self {
        resolve(DevicePosition::Back, InterfaceOrientation::Portrait)
    }
}

/// Resolve the rotation code and layer transform for a camera position and
/// interface orientation.
///
/// The native sensor image is landscape; portrait orientations therefore
/// rotate by a quarter turn. Front-camera cases additionally mirror
/// horizontally so the user sees themselves as in a mirror.
pub fn resolve(position: DevicePosition, orientation: InterfaceOrientation) -> OrientationState {
    use std::f32::consts::PI;

    let mirror = AffineTransform::scale(-1.0, 1.0);

    let (rotation, transform) = match (orientation, position) {
        (InterfaceOrientation::LandscapeLeft, DevicePosition::Back) => {
            (RotationCode::Deg0, AffineTransform::IDENTITY)
        }
        (InterfaceOrientation::LandscapeRight, DevicePosition::Back) => {
            (RotationCode::Deg180, AffineTransform::rotation(PI))
        }
        (InterfaceOrientation::LandscapeLeft, DevicePosition::Front) => (
            RotationCode::Deg180,
            AffineTransform::rotation(PI).concat(&mirror),
        ),
        (InterfaceOrientation::LandscapeRight, DevicePosition::Front) => {
            (RotationCode::Deg0, AffineTransform::IDENTITY.concat(&mirror))
        }
        (InterfaceOrientation::Portrait, DevicePosition::Back) => {
            (RotationCode::Deg90, AffineTransform::rotation(PI / 2.0))
        }
        (InterfaceOrientation::Portrait, DevicePosition::Front) => (
            RotationCode::Deg90,
            AffineTransform::rotation(PI / 2.0).concat(&mirror),
        ),
        (InterfaceOrientation::PortraitUpsideDown, DevicePosition::Back) => (
            RotationCode::Deg270,
            AffineTransform::rotation(3.0 * PI / 2.0),
        ),
        (InterfaceOrientation::PortraitUpsideDown, DevicePosition::Front) => (
            RotationCode::Deg270,
            AffineTransform::rotation(3.0 * PI / 2.0).concat(&mirror),
        ),
    };

    OrientationState {
        rotation,
        transform,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(left: (f32, f32), right: (f32, f32)) {
        assert!(
            (left.0 - right.0).abs() < 1e-5 && (left.1 - right.1).abs() < 1e-5,
            "{:?} != {:?}",
            left,
            right
        );
    }

    #[test]
    fn test_resolution_is_pure() {
        for orientation in [
            InterfaceOrientation::Portrait,
            InterfaceOrientation::PortraitUpsideDown,
            InterfaceOrientation::LandscapeLeft,
            InterfaceOrientation::LandscapeRight,
        ] {
            for position in [DevicePosition::Back, DevicePosition::Front] {
                let first = resolve(position, orientation);
                let second = resolve(position, orientation);
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn test_rotation_codes() {
        let back = DevicePosition::Back;
        assert_eq!(
            resolve(back, InterfaceOrientation::LandscapeLeft).rotation,
            RotationCode::Deg0
        );
        assert_eq!(
            resolve(back, InterfaceOrientation::Portrait).rotation,
            RotationCode::Deg90
        );
        assert_eq!(
            resolve(back, InterfaceOrientation::LandscapeRight).rotation,
            RotationCode::Deg180
        );
        assert_eq!(
            resolve(back, InterfaceOrientation::PortraitUpsideDown).rotation,
            RotationCode::Deg270
        );
    }

    #[test]
    fn test_exif_codes() {
        assert_eq!(RotationCode::Deg0.exif_code(), 1);
        assert_eq!(RotationCode::Deg90.exif_code(), 5);
        assert_eq!(RotationCode::Deg180.exif_code(), 3);
        assert_eq!(RotationCode::Deg270.exif_code(), 7);
    }

    #[test]
    fn test_rotation_transform_quarter_turn() {
        let t = AffineTransform::rotation(std::f32::consts::PI / 2.0);
        assert_close(t.apply((1.0, 0.0)), (0.0, 1.0));
        assert_close(t.apply((0.0, 1.0)), (-1.0, 0.0));
    }

    #[test]
    fn test_front_camera_mirrors_horizontally() {
        let state = resolve(DevicePosition::Front, InterfaceOrientation::LandscapeRight);
        // Identity followed by scale(-1, 1): x flips, y is preserved
        assert_close(state.transform.apply((1.0, 0.5)), (-1.0, 0.5));
    }

    #[test]
    fn test_every_front_orientation_mirrors() {
        // A mirror flips handedness, so every front transform must have a
        // negative determinant; back transforms are pure rotations.
        for orientation in [
            InterfaceOrientation::Portrait,
            InterfaceOrientation::PortraitUpsideDown,
            InterfaceOrientation::LandscapeLeft,
            InterfaceOrientation::LandscapeRight,
        ] {
            let front = resolve(DevicePosition::Front, orientation).transform;
            let back = resolve(DevicePosition::Back, orientation).transform;
            let det = |t: AffineTransform| t.a * t.d - t.b * t.c;
            assert!(
                det(front) < 0.0,
                "{:?}: front transform does not mirror (det = {})",
                orientation,
                det(front)
            );
            assert!(
                det(back) > 0.0,
                "{:?}: back transform must not mirror",
                orientation
            );
        }
    }

    #[test]
    fn test_front_portrait_mirrors_after_rotation() {
        let state = resolve(DevicePosition::Front, InterfaceOrientation::Portrait);
        // Rotate 90 ccw then mirror x: (1,0) -> (0,1) -> (0,1), (0,1) -> (-1,0) -> (1,0)
        assert_close(state.transform.apply((1.0, 0.0)), (0.0, 1.0));
        assert_close(state.transform.apply((0.0, 1.0)), (1.0, 0.0));
    }

    #[test]
    fn test_concat_order() {
        // Rotate 90 ccw then mirror x: (1,0) -> (0,1) -> (0,1)
        let t = AffineTransform::rotation(std::f32::consts::PI / 2.0)
            .concat(&AffineTransform::scale(-1.0, 1.0));
        assert_close(t.apply((1.0, 0.0)), (0.0, 1.0));
        // Mirror x then rotate 90 ccw: (1,0) -> (-1,0) -> (0,-1)
        let t = AffineTransform::scale(-1.0, 1.0)
            .concat(&AffineTransform::rotation(std::f32::consts::PI / 2.0));
        assert_close(t.apply((1.0, 0.0)), (0.0, -1.0));
    }

    #[test]
    fn test_identity_apply() {
        assert_close(AffineTransform::IDENTITY.apply((3.0, -2.0)), (3.0, -2.0));
    }
}

use bevy_math::Affine2;
use bevy_math::Mat4;
use bevy_math::Vec2;
use std::f32::consts::FRAC_PI_2;
use std::f32::consts::PI;

use crate::device_resources::Size;

/// Rotation between the display's native orientation and the current one.
///
/// Desktop windows never rotate, but the swap chain transforms are still
/// computed from this so that rotated outputs only need a new value here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayOrientation {
    #[default]
    Identity,
    Rotate90,
    Rotate180,
    Rotate270,
}

// 0-degree Z-rotation
const ROTATION_0: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

// 90-degree Z-rotation
const ROTATION_90: [f32; 16] = [
    0.0, 1.0, 0.0, 0.0, //
    -1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

// 180-degree Z-rotation
const ROTATION_180: [f32; 16] = [
    -1.0, 0.0, 0.0, 0.0, //
    0.0, -1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

// 270-degree Z-rotation
const ROTATION_270: [f32; 16] = [
    0.0, -1.0, 0.0, 0.0, //
    1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

impl DisplayOrientation {
    /// 3-D rotation applied on top of every projection that targets the swap chain.
    ///
    /// The tables above are written row-vector style, one row per line; loading them as
    /// columns gives the equivalent column-vector matrix.
    pub fn transform_3d(self) -> Mat4 {
        let rows = match self {
            Self::Identity => &ROTATION_0,
            Self::Rotate90 => &ROTATION_90,
            Self::Rotate180 => &ROTATION_180,
            Self::Rotate270 => &ROTATION_270,
        };
        Mat4::from_cols_array(rows)
    }

    /// 2-D transform for Direct2D content: rotate, then move back into the visible area.
    pub fn transform_2d(self, logical_size: Size) -> Affine2 {
        match self {
            Self::Identity => Affine2::IDENTITY,
            Self::Rotate90 => {
                Affine2::from_angle_translation(FRAC_PI_2, Vec2::new(logical_size.height, 0.0))
            }
            Self::Rotate180 => Affine2::from_angle_translation(
                PI,
                Vec2::new(logical_size.width, logical_size.height),
            ),
            Self::Rotate270 => {
                Affine2::from_angle_translation(3.0 * FRAC_PI_2, Vec2::new(0.0, logical_size.width))
            }
        }
    }
}

use bevy_math::Mat4;
use bevy_math::Vec3;

use crate::device_resources::Size;

pub const FIELD_OF_VIEW_Y_DEGREES: f32 = 70.0;
pub const NEAR_PLANE: f32 = 0.01;
pub const FAR_PLANE: f32 = 100.0;

const EYE: Vec3 = Vec3::new(-1.0, -1.0, -1.0);
const AT: Vec3 = Vec3::new(0.0, -0.1, 0.0);
const UP: Vec3 = Vec3::Y;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerspectiveParams {
    pub fov_angle_y: f32,
    pub aspect_ratio: f32,
}

pub fn perspective_params(output_size: Size) -> PerspectiveParams {
    let aspect_ratio = output_size.aspect_ratio();
    let mut fov_angle_y = FIELD_OF_VIEW_Y_DEGREES.to_radians();

    // Portrait and snapped views are narrow, widen the field of view for them.
    if aspect_ratio < 1.0 {
        fov_angle_y *= 2.0;
    }

    PerspectiveParams {
        fov_angle_y,
        aspect_ratio,
    }
}

/// Right-handed perspective followed by the swap chain orientation.
///
/// Row-vector `perspective * orientation` is `orientation * perspective` with
/// column vectors.
pub fn projection_matrix(output_size: Size, orientation: Mat4) -> Mat4 {
    let params = perspective_params(output_size);
    let perspective =
        Mat4::perspective_rh(params.fov_angle_y, params.aspect_ratio, NEAR_PLANE, FAR_PLANE);
    orientation * perspective
}

pub fn view_matrix() -> Mat4 {
    Mat4::look_at_rh(EYE, AT, UP)
}

/// Layout expected by HLSL's default column-major packing.
pub fn to_shader_layout(matrix: Mat4) -> [[f32; 4]; 4] {
    matrix.transpose().to_cols_array_2d()
}

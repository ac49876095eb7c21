pub mod config;
pub mod device_resources;
pub mod engine_main;
pub mod logging;
pub mod orientation;
pub mod render_fps;
pub mod render_scene;
pub mod shader_source;
pub mod step_timer;
pub mod windy_error;

#[cfg(windows)]
pub mod d3d11;
#[cfg(windows)]
pub mod win32;

#[cfg(test)]
mod test_device;

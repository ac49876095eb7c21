//! Window creation and the message loop.

pub mod app_runner;
pub mod create_window;
pub mod window_class;
pub mod windy_window_class_id;

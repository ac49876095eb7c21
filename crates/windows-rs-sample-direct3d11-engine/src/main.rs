use sample_direct3d11_engine::config::build_command_line;
use sample_direct3d11_engine::logging::init_tracing;
use sample_direct3d11_engine::windy_error::MyResult;
use tracing::info;

pub fn main() -> MyResult<()> {
    color_eyre::install()?;
    let config = build_command_line();
    init_tracing(config.verbose);
    info!(?config, "Ahoy, world!");

    run(config)
}

#[cfg(windows)]
fn run(config: sample_direct3d11_engine::config::EngineConfig) -> MyResult<()> {
    sample_direct3d11_engine::win32::app_runner::run(config)
}

#[cfg(not(windows))]
fn run(_config: sample_direct3d11_engine::config::EngineConfig) -> MyResult<()> {
    Err(sample_direct3d11_engine::windy_error::MyReport::msg(
        "Direct3D 11 is only available on Windows",
    ))
}

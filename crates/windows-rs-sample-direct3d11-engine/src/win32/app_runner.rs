use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::error;
use tracing::info;
use tracing::warn;
use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::System::LibraryLoader::*;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::config::EngineConfig;
use crate::d3d11::compile_shader::HlslShaderSource;
use crate::d3d11::D3D11DeviceResources;
use crate::d3d11::DeviceOptions;
use crate::d3d11::Resize;
use crate::device_resources::Present;
use crate::device_resources::Size;
use crate::engine_main::EngineMain;
use crate::shader_source::AssetDirectory;
use crate::win32::create_window::create_window;
use crate::win32::window_class::create_window_class_struct;
use crate::win32::window_class::WindowClass;
use crate::win32::windy_window_class_id::register_window_class;
use crate::windy_error::MyResult;

/// What the window procedure tells the message loop.
#[derive(Default)]
struct WindowEvents {
    resized: Cell<Option<Size>>,
    minimized: Cell<bool>,
}

impl WindowClass for WindowEvents {
    const ID: PCWSTR = w!("Direct3D11EngineWindow");

    fn handle(&self, message: u32, wparam: WPARAM, lparam: LPARAM) -> bool {
        match message {
            WM_SIZE => {
                let minimized = wparam.0 as u32 == SIZE_MINIMIZED;
                self.minimized.set(minimized);
                if !minimized {
                    let width = (lparam.0 & 0xFFFF) as u16;
                    let height = ((lparam.0 >> 16) & 0xFFFF) as u16;
                    self.resized.set(Some(Size::new(width as f32, height as f32)));
                }
                true
            }
            WM_DESTROY => {
                unsafe { PostQuitMessage(0) };
                true
            }
            _ => false,
        }
    }
}

/// Opens the window and runs the engine until the window is closed.
pub fn run(config: EngineConfig) -> MyResult<()> {
    let our_module = get_handle_to_file_used_to_create_the_calling_process()?;

    let window_class = create_window_class_struct::<WindowEvents>(our_module)?;
    let class_id = register_window_class(&window_class)?;

    let mut window_rect = RECT {
        left: 0,
        top: 0,
        right: config.window_size.0 as i32,
        bottom: config.window_size.1 as i32,
    };
    // Calculates the required size of the window rectangle, based on the desired size of the client rectangle.
    unsafe { AdjustWindowRect(&mut window_rect, WS_OVERLAPPEDWINDOW, false)? };

    // Must outlive the window, which points at it.
    let window_events = WindowEvents::default();
    let title = HSTRING::from(config.title());
    let hwnd = create_window(our_module, &class_id, window_rect, &title, &window_events)?;

    let result = run_window(&config, hwnd, &window_events);
    if let Err(e) = &result {
        error!("Engine stopped: {e}");
    }
    // Fails harmlessly when WM_DESTROY already ran.
    unsafe { _ = DestroyWindow(hwnd) };
    result
}

fn run_window(config: &EngineConfig, hwnd: HWND, window_events: &WindowEvents) -> MyResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("asset-loader")
        .enable_all()
        .build()?;

    let next_to_executable = AssetDirectory::next_to_executable()?;
    let binaries = match &config.shader_directory {
        Some(dir) => AssetDirectory::new(dir),
        None => next_to_executable.clone(),
    };
    let sources = config.hlsl_source_directory(next_to_executable.root());
    let shaders = Arc::new(HlslShaderSource::new(binaries, sources));

    let device_resources = Rc::new(D3D11DeviceResources::new(hwnd, DeviceOptions::from(config))?);
    let mut engine = EngineMain::new(device_resources.clone(), shaders, runtime.handle().clone())?;

    unsafe { _ = ShowWindow(hwnd, SW_SHOW) };
    info!("Window shown, entering message loop");

    let result = message_loop(&device_resources, &mut engine, window_events);
    if result.is_err() {
        device_resources.print_debug_messages();
    }
    result
}

fn message_loop(
    device_resources: &D3D11DeviceResources,
    engine: &mut EngineMain<D3D11DeviceResources>,
    window_events: &WindowEvents,
) -> MyResult<()> {
    loop {
        let mut message = MSG::default();
        if unsafe { PeekMessageW(&mut message, None, 0, 0, PM_REMOVE) }.into() {
            if message.message == WM_QUIT {
                return Ok(());
            }
            unsafe {
                _ = TranslateMessage(&message);
                DispatchMessageW(&message);
            }
            continue;
        }

        if window_events.minimized.get() {
            unsafe { WaitMessage()? };
            continue;
        }

        if let Some(size) = window_events.resized.take() {
            match device_resources.set_logical_size(size)? {
                Resize::Unchanged => {}
                Resize::Resized => engine.create_window_size_dependent_resources(),
                Resize::DeviceLost => device_resources.handle_device_lost(engine)?,
            }
        }

        engine.update()?;
        if engine.render()? && engine.present()? == Present::DeviceLost {
            warn!("Recovering from device loss");
            device_resources.handle_device_lost(engine)?;
        }
    }
}

fn get_handle_to_file_used_to_create_the_calling_process() -> MyResult<HMODULE> {
    let mut out = Default::default();
    unsafe { GetModuleHandleExW(Default::default(), None, &mut out)? };
    Ok(out)
}
